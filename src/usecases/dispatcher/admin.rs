//! Admin flows: publishing, editing and deleting assignments, and the student roster.

use super::{cancel_keyboard, main_keyboard, BotDispatcher};
use crate::domain::entities::features;
use crate::domain::format::{assignment_card, student_list};
use crate::domain::texts::{self, buttons};
use crate::domain::time::{now_in, parse_datetime};
use crate::domain::validation::{
    validate_assignment_title, validate_deadline, validate_description,
};
use crate::domain::{
    AssignmentChanges, AssignmentDraft, CallbackAction, DialogState, DomainError, EditField,
    IncomingCallback, InlineButton, Keyboard, NotificationType, Section, User, UserType,
};
use crate::usecases::assignment_service::PublishRequest;
use crate::usecases::notification_worker::NotificationJob;

const ASK_TITLE: &str = "📌 أرسل عنوان الواجب:";
const ASK_DESCRIPTION: &str = "📝 أرسل تفاصيل الواجب (أو اضغط تخطي):";
const ASK_DATE: &str = "📅 أرسل تاريخ التسليم بالصيغة YYYY-MM-DD:";
const ASK_TIME: &str = "⏰ أرسل وقت التسليم بالصيغة HH:MM (مثال 23:59):";

fn assignment_keyboard(assignment_id: i64) -> Keyboard {
    Keyboard::Inline(vec![vec![
        InlineButton::new(buttons::EDIT, &CallbackAction::Edit { assignment_id }),
        InlineButton::new(buttons::DELETE, &CallbackAction::Delete { assignment_id }),
    ]])
}

fn edit_field(text: &str) -> Option<EditField> {
    match text {
        buttons::FIELD_TITLE => Some(EditField::Title),
        buttons::FIELD_DESCRIPTION => Some(EditField::Description),
        buttons::FIELD_DEADLINE => Some(EditField::Deadline),
        _ => None,
    }
}

/// `YYYY-MM-DD HH:MM` in one line.
fn split_deadline(text: &str) -> Option<(&str, &str)> {
    let mut parts = text.split_whitespace();
    let date = parts.next()?;
    let time = parts.next()?;
    parts.next().is_none().then_some((date, time))
}

impl BotDispatcher {
    pub(super) async fn start_publish(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        let user = self.require(user.telegram_id, UserType::Admin).await?;
        let sections = self.services.sections.sections_for(&user).await?;
        match sections.as_slice() {
            [] => Err(DomainError::NotFound("ليس لديك شعب لنشر الواجبات فيها".into())),
            [only] => self.ask_subject(chat_id, only).await,
            _ => {
                self.send(
                    chat_id,
                    "📚 اختر الشعبة:",
                    Some(&Keyboard::choices(
                        sections.iter().map(|s| s.section_name.clone()),
                        buttons::CANCEL,
                    )),
                )
                .await?;
                self.set_state(chat_id, DialogState::PublishSection).await
            }
        }
    }

    async fn ask_subject(&self, chat_id: i64, section: &Section) -> Result<(), DomainError> {
        let subjects = self
            .services
            .catalog
            .subjects_for_stage(section.level_id)
            .await?;
        let keyboard = if subjects.is_empty() {
            cancel_keyboard()
        } else {
            Keyboard::choices(subjects.into_iter().map(|s| s.subject_name), buttons::CANCEL)
        };
        self.send(
            chat_id,
            &format!("📚 {}\n\n📖 اختر المادة أو اكتب اسمها:", section.section_name),
            Some(&keyboard),
        )
        .await?;
        self.set_state(
            chat_id,
            DialogState::PublishSubject {
                draft: AssignmentDraft {
                    section_id: section.section_id,
                    ..Default::default()
                },
            },
        )
        .await
    }

    pub(super) async fn publish_step(
        &self,
        chat_id: i64,
        user: &User,
        state: DialogState,
        text: &str,
    ) -> Result<(), DomainError> {
        match state {
            DialogState::PublishSection => {
                let sections = self.services.sections.sections_for(user).await?;
                let Some(section) = sections.iter().find(|s| s.section_name == text) else {
                    return self.send(chat_id, "❌ اختر شعبة من القائمة", None).await;
                };
                self.ask_subject(chat_id, section).await
            }
            DialogState::PublishSubject { mut draft } => {
                if text.is_empty() || text.chars().count() > 100 {
                    return self.send(chat_id, "❌ اسم المادة غير صحيح", None).await;
                }
                draft.subject_name = Some(text.to_string());
                self.send(chat_id, ASK_TITLE, Some(&cancel_keyboard())).await?;
                self.set_state(chat_id, DialogState::PublishTitle { draft }).await
            }
            DialogState::PublishTitle { mut draft } => {
                if let Err(e) = validate_assignment_title(text) {
                    return self.send(chat_id, &format!("❌ {}", e), None).await;
                }
                draft.title = Some(text.to_string());
                self.send(
                    chat_id,
                    ASK_DESCRIPTION,
                    Some(&Keyboard::reply(&[&[buttons::SKIP], &[buttons::CANCEL]])),
                )
                .await?;
                self.set_state(chat_id, DialogState::PublishDescription { draft })
                    .await
            }
            DialogState::PublishDescription { mut draft } => {
                if text != buttons::SKIP {
                    if let Err(e) = validate_description(text) {
                        return self.send(chat_id, &format!("❌ {}", e), None).await;
                    }
                    draft.description = Some(text.to_string());
                }
                self.send(chat_id, ASK_DATE, Some(&cancel_keyboard())).await?;
                self.set_state(chat_id, DialogState::PublishDate { draft }).await
            }
            DialogState::PublishDate { mut draft } => {
                if parse_datetime(text, None, self.services.assignments.tz()).is_none() {
                    return self
                        .send(chat_id, "❌ صيغة التاريخ غير صحيحة. مثال: 2025-12-31", None)
                        .await;
                }
                draft.date = Some(text.to_string());
                self.send(chat_id, ASK_TIME, None).await?;
                self.set_state(chat_id, DialogState::PublishTime { draft }).await
            }
            DialogState::PublishTime { draft } => self.finish_publish(chat_id, user, draft, text).await,
            _ => Ok(()),
        }
    }

    async fn finish_publish(
        &self,
        chat_id: i64,
        user: &User,
        mut draft: AssignmentDraft,
        time: &str,
    ) -> Result<(), DomainError> {
        let tz = self.services.assignments.tz();
        let date = draft.date.clone().unwrap_or_default();
        let Some(deadline) = parse_datetime(&date, Some(time), tz) else {
            return self
                .send(chat_id, "❌ صيغة الوقت غير صحيحة. مثال: 23:59", None)
                .await;
        };
        if let Err(e) = validate_deadline(&deadline, &now_in(tz)) {
            draft.date = None;
            self.send(chat_id, &format!("❌ {}\n\n{}", e, ASK_DATE), None)
                .await?;
            return self.set_state(chat_id, DialogState::PublishDate { draft }).await;
        }

        self.clear_state(chat_id).await?;
        let assignment = self
            .services
            .assignments
            .create(
                user,
                PublishRequest {
                    section_id: draft.section_id,
                    subject_name: draft.subject_name.unwrap_or_default(),
                    title: draft.title.unwrap_or_default(),
                    description: draft.description,
                    deadline,
                },
            )
            .await?;
        let text = format!(
            "{}\n\n{}",
            texts::SUCCESS_ASSIGNMENT_CREATED,
            assignment_card(&assignment, tz)
        );
        self.send(chat_id, &text, Some(&main_keyboard(user.user_type)))
            .await?;
        self.queue(NotificationJob {
            assignment_id: assignment.assignment_id,
            section_id: assignment.section_id,
            kind: NotificationType::New,
            notify_chat: Some(chat_id),
        })
        .await;
        Ok(())
    }

    pub(super) async fn list_assignments(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        let user = self.require(user.telegram_id, UserType::Admin).await?;
        let tz = self.services.assignments.tz();
        let mut total = 0usize;
        for section in self.services.sections.sections_for(&user).await? {
            let assignments = self
                .services
                .assignments
                .list(section.section_id, false)
                .await?;
            if assignments.is_empty() {
                continue;
            }
            self.send(chat_id, &format!("📚 {}", section.section_name), None)
                .await?;
            for a in &assignments {
                total += 1;
                self.send(
                    chat_id,
                    &assignment_card(a, tz),
                    Some(&assignment_keyboard(a.assignment_id)),
                )
                .await?;
            }
        }
        if total == 0 {
            self.send(chat_id, "✅ لا توجد واجبات حالياً", None).await?;
        }
        Ok(())
    }

    pub(super) async fn on_edit_assignment(
        &self,
        cb: &IncomingCallback,
        assignment_id: i64,
    ) -> Result<(), DomainError> {
        let actor = self.require(cb.from.telegram_id, UserType::Admin).await?;
        let assignment = self
            .services
            .assignments
            .authorize(&actor, assignment_id)
            .await?;
        let chat_id = Self::callback_chat(cb);
        self.set_state(chat_id, DialogState::EditChooseField { assignment_id })
            .await?;
        self.send(
            chat_id,
            &format!("✏️ تعديل: {}\n\nماذا تريد أن تعدل؟", assignment.title),
            Some(&Keyboard::choices(
                [
                    buttons::FIELD_TITLE,
                    buttons::FIELD_DESCRIPTION,
                    buttons::FIELD_DEADLINE,
                ],
                buttons::CANCEL,
            )),
        )
        .await?;
        self.bot.answer_callback(&cb.id, None, false).await
    }

    pub(super) async fn edit_field_step(
        &self,
        chat_id: i64,
        assignment_id: i64,
        text: &str,
    ) -> Result<(), DomainError> {
        let Some(field) = edit_field(text) else {
            return self.send(chat_id, "❌ اختر حقلاً من القائمة", None).await;
        };
        let prompt = match field {
            EditField::Title => "📌 أرسل العنوان الجديد:",
            EditField::Description => "📝 أرسل الوصف الجديد:",
            EditField::Deadline => "📅 أرسل الموعد الجديد بالصيغة YYYY-MM-DD HH:MM:",
        };
        self.send(chat_id, prompt, Some(&cancel_keyboard())).await?;
        self.set_state(
            chat_id,
            DialogState::EditValue {
                assignment_id,
                field,
            },
        )
        .await
    }

    pub(super) async fn edit_value_step(
        &self,
        chat_id: i64,
        user: &User,
        assignment_id: i64,
        field: EditField,
        text: &str,
    ) -> Result<(), DomainError> {
        let tz = self.services.assignments.tz();
        let mut changes = AssignmentChanges::default();
        match field {
            EditField::Title => changes.title = Some(text.to_string()),
            EditField::Description => changes.description = Some(text.to_string()),
            EditField::Deadline => {
                let deadline = split_deadline(text).and_then(|(d, t)| parse_datetime(d, Some(t), tz));
                let Some(deadline) = deadline else {
                    return self
                        .send(chat_id, "❌ الصيغة: YYYY-MM-DD HH:MM", None)
                        .await;
                };
                changes.deadline = Some(deadline);
            }
        }

        let assignment = match self
            .services
            .assignments
            .edit(user, assignment_id, changes)
            .await
        {
            Ok(a) => a,
            Err(DomainError::Validation(reason)) => {
                return self
                    .send(chat_id, &format!("❌ {}\n\nأرسل قيمة أخرى:", reason), None)
                    .await;
            }
            Err(e) => {
                self.clear_state(chat_id).await?;
                return Err(e);
            }
        };
        self.clear_state(chat_id).await?;
        let text = format!(
            "{}\n\n{}",
            texts::SUCCESS_ASSIGNMENT_EDITED,
            assignment_card(&assignment, tz)
        );
        self.send(chat_id, &text, Some(&main_keyboard(user.user_type)))
            .await?;
        self.queue(NotificationJob {
            assignment_id,
            section_id: assignment.section_id,
            kind: NotificationType::Edit,
            notify_chat: Some(chat_id),
        })
        .await;
        Ok(())
    }

    pub(super) async fn on_delete_assignment(
        &self,
        cb: &IncomingCallback,
        assignment_id: i64,
    ) -> Result<(), DomainError> {
        let actor = self.require(cb.from.telegram_id, UserType::Admin).await?;
        let deleted = self
            .services
            .assignments
            .delete(&actor, assignment_id)
            .await?;
        self.annotate(cb, "🗑️ تم حذف الواجب").await;
        self.queue(NotificationJob {
            assignment_id,
            section_id: deleted.section_id,
            kind: NotificationType::Delete,
            notify_chat: Some(Self::callback_chat(cb)),
        })
        .await;
        self.bot
            .answer_callback(&cb.id, Some("✅ تم حذف الواجب"), false)
            .await
    }

    pub(super) async fn manage_students(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        let user = self.require(user.telegram_id, UserType::Admin).await?;
        let blocking = self
            .services
            .settings
            .is_enabled(features::STUDENT_BLOCKING)
            .await?;
        let sections = self.services.sections.sections_for(&user).await?;
        if sections.is_empty() {
            return self.send(chat_id, "📋 لا توجد شعب", None).await;
        }
        for section in sections {
            let students = self
                .services
                .registrations
                .approved(&user, section.section_id)
                .await?;
            let mut text = format!("📚 {}\n\n{}", section.section_name, student_list(&students));
            let keyboard = if blocking && !students.is_empty() {
                Some(Keyboard::Inline(
                    students
                        .iter()
                        .map(|s| {
                            vec![InlineButton::new(
                                format!("{} {}", buttons::BLOCK, s.full_name),
                                &CallbackAction::Block {
                                    telegram_id: s.telegram_id,
                                },
                            )]
                        })
                        .collect(),
                ))
            } else {
                if !blocking {
                    text.push_str("\n\nℹ️ ميزة حظر الطلاب غير مفعلة");
                }
                None
            };
            self.send(chat_id, &text, keyboard.as_ref()).await?;

            if !blocking {
                continue;
            }
            let blocked = self
                .services
                .registrations
                .blocked(&user, section.section_id)
                .await?;
            if blocked.is_empty() {
                continue;
            }
            let keyboard = Keyboard::Inline(
                blocked
                    .iter()
                    .map(|s| {
                        vec![InlineButton::new(
                            format!("{} {}", buttons::UNBLOCK, s.full_name),
                            &CallbackAction::Unblock {
                                telegram_id: s.telegram_id,
                            },
                        )]
                    })
                    .collect(),
            );
            self.send(
                chat_id,
                &format!(
                    "🚫 الطلاب المحظورون في {}\n\n{}",
                    section.section_name,
                    student_list(&blocked)
                ),
                Some(&keyboard),
            )
            .await?;
        }
        Ok(())
    }

    pub(super) async fn on_block(
        &self,
        cb: &IncomingCallback,
        student_telegram_id: i64,
        blocked: bool,
    ) -> Result<(), DomainError> {
        let actor = self.require(cb.from.telegram_id, UserType::Admin).await?;
        self.services
            .users
            .set_student_blocked(&actor, student_telegram_id, blocked)
            .await?;
        let chat_id = Self::callback_chat(cb);
        if blocked {
            let unblock = Keyboard::Inline(vec![vec![InlineButton::new(
                buttons::UNBLOCK,
                &CallbackAction::Unblock {
                    telegram_id: student_telegram_id,
                },
            )]]);
            self.send(
                chat_id,
                &format!("🚫 تم حظر الطالب {}", student_telegram_id),
                Some(&unblock),
            )
            .await?;
            self.bot.answer_callback(&cb.id, Some("🚫 تم الحظر"), false).await
        } else {
            self.annotate(cb, "✅ تم إلغاء الحظر").await;
            self.bot
                .answer_callback(&cb.id, Some("✅ تم إلغاء الحظر"), false)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_line_needs_date_and_time() {
        assert_eq!(split_deadline("2030-01-31 23:59"), Some(("2030-01-31", "23:59")));
        assert_eq!(split_deadline("2030-01-31"), None);
        assert_eq!(split_deadline("2030-01-31 23:59 extra"), None);
    }

    #[test]
    fn edit_fields_map_from_button_labels() {
        assert_eq!(edit_field(buttons::FIELD_DEADLINE), Some(EditField::Deadline));
        assert_eq!(edit_field("other"), None);
        let Keyboard::Inline(rows) = assignment_keyboard(9) else {
            panic!("expected inline keyboard");
        };
        assert_eq!(rows[0][0].data, "edit_9");
        assert_eq!(rows[0][1].data, "delete_9");
    }
}
