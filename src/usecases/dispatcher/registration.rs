//! Join links, the name step and admin decisions on pending requests.

use super::{cancel_keyboard, main_keyboard, BotDispatcher};
use crate::domain::format::{registration_request_message, section_info_message};
use crate::domain::texts::{self, buttons};
use crate::domain::time::now_in;
use crate::domain::{
    CallbackAction, DialogState, DomainError, IncomingCallback, IncomingMessage, InlineButton,
    Keyboard, User, UserType,
};
use tracing::{info, warn};

pub(crate) fn decision_keyboard(student_telegram_id: i64, section_id: i64) -> Keyboard {
    Keyboard::Inline(vec![vec![
        InlineButton::new(
            buttons::APPROVE,
            &CallbackAction::Approve {
                telegram_id: student_telegram_id,
                section_id,
            },
        ),
        InlineButton::new(
            buttons::REJECT,
            &CallbackAction::Reject {
                telegram_id: student_telegram_id,
                section_id,
            },
        ),
    ]])
}

impl BotDispatcher {
    pub(super) async fn on_join_link(
        &self,
        msg: &IncomingMessage,
        code: &str,
    ) -> Result<(), DomainError> {
        let section = self
            .services
            .registrations
            .open_join_link(msg.from.telegram_id, code)
            .await?;
        let text = format!(
            "{}\n\n✍️ للتسجيل، أرسل اسمك الكامل:",
            section_info_message(&section)
        );
        self.send(msg.chat_id, &text, Some(&cancel_keyboard())).await?;
        self.set_state(
            msg.chat_id,
            DialogState::WaitingForName {
                section_id: section.section_id,
                section_name: section.section_name,
            },
        )
        .await
    }

    pub(super) async fn on_student_name(
        &self,
        msg: &IncomingMessage,
        section_id: i64,
        section_name: &str,
    ) -> Result<(), DomainError> {
        let handle = msg.from.handle();
        let result = self
            .services
            .registrations
            .register_student(msg.from.telegram_id, &msg.text, handle.as_deref(), section_id)
            .await;
        let section = match result {
            Ok(section) => section,
            Err(DomainError::Validation(reason)) => {
                let text = format!("❌ {}\n\nالرجاء إدخال اسمك الكامل مرة أخرى:", reason);
                return self.send(msg.chat_id, &text, Some(&cancel_keyboard())).await;
            }
            Err(e) => {
                self.clear_state(msg.chat_id).await?;
                return Err(e);
            }
        };
        self.clear_state(msg.chat_id).await?;
        info!(telegram_id = msg.from.telegram_id, section = section_name, "join request filed");
        self.send(msg.chat_id, texts::SUCCESS_REGISTRATION_SENT, Some(&Keyboard::Remove))
            .await?;

        let Some(admin_id) = section.admin_id else {
            warn!(section_id, "section has no admin, request left pending");
            return Ok(());
        };
        let Some(admin) = self.services.users.get_user_by_id(admin_id).await? else {
            warn!(section_id, admin_id, "section admin not found");
            return Ok(());
        };
        let card = registration_request_message(
            msg.text.trim(),
            handle.as_deref(),
            msg.from.telegram_id,
            &section.section_name,
            &now_in(self.services.assignments.tz()),
        );
        self.notify(
            admin.telegram_id,
            &card,
            Some(&decision_keyboard(msg.from.telegram_id, section_id)),
        )
        .await;
        Ok(())
    }

    pub(super) async fn on_decision(
        &self,
        cb: &IncomingCallback,
        student_telegram_id: i64,
        section_id: i64,
        approve: bool,
    ) -> Result<(), DomainError> {
        let actor: User = self.require(cb.from.telegram_id, UserType::Admin).await?;
        let registrations = &self.services.registrations;
        if approve {
            let section = registrations
                .approve(&actor, student_telegram_id, section_id)
                .await?;
            self.annotate(cb, "✅ تمت الموافقة على الطالب").await;
            let text = format!(
                "🎉 مبروك! تمت الموافقة على تسجيلك في {}\n\nيمكنك الآن استلام الواجبات والإشعارات.",
                section.section_name
            );
            self.notify(
                student_telegram_id,
                &text,
                Some(&main_keyboard(UserType::Student)),
            )
            .await;
            self.bot
                .answer_callback(&cb.id, Some("✅ تمت الموافقة"), false)
                .await
        } else {
            registrations
                .reject(&actor, student_telegram_id, section_id)
                .await?;
            self.annotate(cb, "❌ تم رفض الطالب").await;
            self.notify(
                student_telegram_id,
                "😔 عذراً، تم رفض طلب تسجيلك.\n\nللاستفسار، تواصل مع أدمن الشعبة.",
                None,
            )
            .await;
            self.bot
                .answer_callback(&cb.id, Some("❌ تم الرفض"), false)
                .await
        }
    }

    pub(super) async fn pending_requests(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        let user = self.require(user.telegram_id, UserType::Admin).await?;
        let sections = self.services.sections.sections_for(&user).await?;
        let mut total = 0usize;
        for section in &sections {
            let pending = self
                .services
                .registrations
                .pending(&user, section.section_id)
                .await?;
            for student in pending {
                total += 1;
                let text = format!(
                    "👤 {}\n🆔 {}\n🔢 ID: {}\n📚 {}\n⏰ {}",
                    student.full_name,
                    student.username.as_deref().unwrap_or("بدون username"),
                    student.telegram_id,
                    section.section_name,
                    student.at.as_deref().unwrap_or("-")
                );
                self.send(
                    chat_id,
                    &text,
                    Some(&decision_keyboard(student.telegram_id, section.section_id)),
                )
                .await?;
            }
        }
        if total == 0 {
            self.send(
                chat_id,
                "✅ لا توجد طلبات معلقة",
                Some(&main_keyboard(user.user_type)),
            )
            .await?;
        }
        Ok(())
    }
}
