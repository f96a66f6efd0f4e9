//! Owner flows: sections, admins, statistics, settings and feature flags.

use super::{cancel_keyboard, main_keyboard, BotDispatcher};
use crate::domain::format::{
    admin_statistics, owner_statistics, recent_activity_list, section_list,
};
use crate::domain::texts::buttons;
use crate::domain::{
    CallbackAction, DialogState, Division, DomainError, Feature, IncomingCallback, InlineButton,
    Keyboard, StudyType, User, UserType,
};
use tracing::info;

const RECENT_ACTIVITY_LIMIT: u32 = 5;

/// `"123456789 Ali Kareem"` → `(123456789, "Ali Kareem")`.
fn parse_admin_line(text: &str) -> Option<(i64, &str)> {
    let (id, name) = text.trim().split_once(char::is_whitespace)?;
    let id = id.parse::<i64>().ok()?;
    let name = name.trim();
    (!name.is_empty()).then_some((id, name))
}

fn features_text(features: &[Feature]) -> String {
    let mut out = String::from("🔧 الميزات\n\n");
    for f in features {
        out.push_str(&format!(
            "{} {}\n",
            if f.is_enabled { "✅" } else { "❌" },
            f.name
        ));
        if let Some(d) = f.description.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!("   {}\n", d));
        }
    }
    out
}

fn features_keyboard(features: &[Feature]) -> Keyboard {
    Keyboard::Inline(
        features
            .iter()
            .map(|f| {
                let label = format!(
                    "{}: {}",
                    f.name,
                    if f.is_enabled { "مفعلة" } else { "معطلة" }
                );
                vec![InlineButton::new(
                    label,
                    &CallbackAction::Feature { key: f.key.clone() },
                )]
            })
            .collect(),
    )
}

impl BotDispatcher {
    pub(super) async fn start_create_section(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        self.require(user.telegram_id, UserType::Owner).await?;
        let levels = self.services.catalog.list_levels().await?;
        if levels.is_empty() {
            return Err(DomainError::NotFound("لا توجد مراحل دراسية".into()));
        }
        self.send(
            chat_id,
            "📚 اختر المرحلة الدراسية:",
            Some(&Keyboard::choices(
                levels.into_iter().map(|l| l.level_name),
                buttons::CANCEL,
            )),
        )
        .await?;
        self.set_state(chat_id, DialogState::CreateSectionLevel).await
    }

    pub(super) async fn create_section_step(
        &self,
        chat_id: i64,
        user: &User,
        state: DialogState,
        text: &str,
    ) -> Result<(), DomainError> {
        match state {
            DialogState::CreateSectionLevel => {
                let level = self
                    .services
                    .catalog
                    .list_levels()
                    .await?
                    .into_iter()
                    .find(|l| l.level_name == text);
                let Some(level) = level else {
                    return self.send(chat_id, "❌ اختر مرحلة من القائمة", None).await;
                };
                self.send(
                    chat_id,
                    "📅 اختر نوع الدراسة:",
                    Some(&Keyboard::choices(
                        StudyType::ALL.iter().map(|t| t.label()),
                        buttons::CANCEL,
                    )),
                )
                .await?;
                self.set_state(
                    chat_id,
                    DialogState::CreateSectionType {
                        level_id: level.level_id,
                    },
                )
                .await
            }
            DialogState::CreateSectionType { level_id } => {
                let Some(study_type) = StudyType::from_label(text) else {
                    return self.send(chat_id, "❌ اختر نوع الدراسة من القائمة", None).await;
                };
                self.send(
                    chat_id,
                    "🔤 اختر الشعبة:",
                    Some(&Keyboard::choices(
                        Division::ALL.iter().map(|d| d.label()),
                        buttons::CANCEL,
                    )),
                )
                .await?;
                self.set_state(
                    chat_id,
                    DialogState::CreateSectionDivision {
                        level_id,
                        study_type,
                    },
                )
                .await
            }
            DialogState::CreateSectionDivision {
                level_id,
                study_type,
            } => {
                let Some(division) = Division::from_label(text) else {
                    return self.send(chat_id, "❌ اختر الشعبة من القائمة", None).await;
                };
                self.send(
                    chat_id,
                    "👨‍💼 أرسل معرف تلغرام (ID) لأدمن الشعبة:",
                    Some(&cancel_keyboard()),
                )
                .await?;
                self.set_state(
                    chat_id,
                    DialogState::CreateSectionAdmin {
                        level_id,
                        study_type,
                        division,
                    },
                )
                .await
            }
            DialogState::CreateSectionAdmin {
                level_id,
                study_type,
                division,
            } => {
                let Ok(admin_telegram_id) = text.parse::<i64>() else {
                    return self.send(chat_id, "❌ معرف تلغرام يجب أن يكون رقماً", None).await;
                };
                self.clear_state(chat_id).await?;
                let created = self
                    .services
                    .sections
                    .create_section(
                        user,
                        level_id,
                        study_type.label(),
                        division.label(),
                        admin_telegram_id,
                    )
                    .await?;
                let text = format!(
                    "✅ تم إنشاء الشعبة بنجاح!\n\n🏷️ {}\n🔑 الكود: {}\n🔗 رابط التسجيل:\n{}",
                    created.section_name, created.join_code, created.join_link
                );
                self.send(chat_id, &text, Some(&main_keyboard(UserType::Owner)))
                    .await?;
                let note = format!(
                    "📚 تم تعيينك أدمن للشعبة: {}\n\n🔗 رابط التسجيل للطلاب:\n{}",
                    created.section_name, created.join_link
                );
                self.notify(admin_telegram_id, &note, None).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub(super) async fn list_sections(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        let sections = self.services.sections.sections_for(user).await?;
        if sections.is_empty() {
            return self.send(chat_id, "📋 لا توجد شعب", None).await;
        }
        let text = section_list(&sections, self.services.sections.bot_username());
        self.send(chat_id, &text, None).await
    }

    pub(super) async fn statistics(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        let text = match user.user_type {
            UserType::Owner => {
                let stats = owner_statistics(&self.services.stats.owner_stats().await?);
                let recent = self
                    .services
                    .stats
                    .recent_activities(RECENT_ACTIVITY_LIMIT)
                    .await?;
                if recent.is_empty() {
                    stats
                } else {
                    format!("{}\n\n{}", stats, recent_activity_list(&recent))
                }
            }
            UserType::Admin => match self.services.stats.admin_stats(user.telegram_id).await? {
                Some(stats) => admin_statistics(&stats),
                None => "📊 لا توجد إحصائيات، ليس لديك شعب بعد".to_string(),
            },
            UserType::Student => {
                return Err(DomainError::PermissionDenied(
                    "ليس لديك صلاحية لتنفيذ هذا الأمر".into(),
                ))
            }
        };
        self.send(chat_id, &text, None).await
    }

    pub(super) async fn manage_admins(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        self.require(user.telegram_id, UserType::Owner).await?;
        let admins = self.services.users.list_admins().await?;
        let mut text = String::from("👥 الأدمنز:\n\n");
        if admins.is_empty() {
            text.push_str("لا يوجد أدمنز\n");
        }
        for a in &admins {
            text.push_str(&format!("• {} ({})\n", a.full_name, a.telegram_id));
        }
        text.push_str("\nلتعيين أدمن جديد أرسل:\n<معرف تلغرام> <الاسم الكامل>");
        self.send(chat_id, &text, Some(&cancel_keyboard())).await?;
        self.set_state(chat_id, DialogState::AssignAdmin).await
    }

    pub(super) async fn assign_admin_step(
        &self,
        chat_id: i64,
        user: &User,
        text: &str,
    ) -> Result<(), DomainError> {
        let Some((telegram_id, name)) = parse_admin_line(text) else {
            return self
                .send(chat_id, "❌ الصيغة: <معرف تلغرام> <الاسم الكامل>", None)
                .await;
        };
        self.clear_state(chat_id).await?;
        let admin = self
            .services
            .users
            .assign_admin(user, telegram_id, name)
            .await?;
        self.send(
            chat_id,
            &format!("✅ تم تعيين {} أدمن", admin.full_name),
            Some(&main_keyboard(UserType::Owner)),
        )
        .await?;
        self.notify(
            telegram_id,
            "👨‍💼 تم تعيينك أدمن في بوت الواجبات. أرسل /start للبدء.",
            None,
        )
        .await;
        Ok(())
    }

    pub(super) async fn show_settings(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        self.require(user.telegram_id, UserType::Owner).await?;
        let settings = self.services.settings.list().await?;
        let mut text = String::from("⚙️ الإعدادات\n\n");
        let mut rows = Vec::with_capacity(settings.len());
        for s in &settings {
            text.push_str(&format!("• {} = {}\n", s.key, s.value));
            if let Some(d) = s.description.as_deref().filter(|d| !d.is_empty()) {
                text.push_str(&format!("  {}\n", d));
            }
            rows.push(vec![InlineButton::new(
                format!("✏️ {}", s.key),
                &CallbackAction::Setting { key: s.key.clone() },
            )]);
        }
        self.send(chat_id, &text, Some(&Keyboard::Inline(rows))).await
    }

    pub(super) async fn on_edit_setting(&self, cb: &IncomingCallback, key: &str) -> Result<(), DomainError> {
        self.require(cb.from.telegram_id, UserType::Owner).await?;
        let current = self
            .services
            .settings
            .get(key)
            .await?
            .ok_or_else(|| DomainError::NotFound("الإعداد غير موجود".into()))?;
        let chat_id = Self::callback_chat(cb);
        self.set_state(chat_id, DialogState::EditSetting { key: key.to_string() })
            .await?;
        self.send(
            chat_id,
            &format!("✏️ أرسل القيمة الجديدة لـ {}\nالقيمة الحالية: {}", key, current),
            Some(&cancel_keyboard()),
        )
        .await?;
        self.bot.answer_callback(&cb.id, None, false).await
    }

    pub(super) async fn edit_setting_step(
        &self,
        chat_id: i64,
        user: &User,
        key: &str,
        text: &str,
    ) -> Result<(), DomainError> {
        match self.services.settings.set(user, key, text).await {
            Ok(setting) => {
                self.clear_state(chat_id).await?;
                info!(key, "setting updated from chat");
                self.send(
                    chat_id,
                    &format!("✅ تم تحديث {} = {}", setting.key, setting.value),
                    Some(&main_keyboard(user.user_type)),
                )
                .await
            }
            Err(DomainError::Validation(reason)) => {
                self.send(chat_id, &format!("❌ {}\n\nأرسل قيمة أخرى:", reason), None)
                    .await
            }
            Err(e) => {
                self.clear_state(chat_id).await?;
                Err(e)
            }
        }
    }

    pub(super) async fn show_features(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        self.require(user.telegram_id, UserType::Owner).await?;
        let features = self.services.settings.features().await?;
        self.send(
            chat_id,
            &features_text(&features),
            Some(&features_keyboard(&features)),
        )
        .await
    }

    pub(super) async fn on_toggle_feature(&self, cb: &IncomingCallback, key: &str) -> Result<(), DomainError> {
        let owner = self.require(cb.from.telegram_id, UserType::Owner).await?;
        let enabled = self.services.settings.toggle(&owner, key).await?;
        let features = self.services.settings.features().await?;
        if let (Some(chat_id), Some(message_id)) = (cb.chat_id, cb.message_id) {
            self.bot
                .edit_message_text(
                    chat_id,
                    message_id,
                    &features_text(&features),
                    Some(&features_keyboard(&features)),
                )
                .await?;
        }
        let note = if enabled { "✅ تم تفعيل الميزة" } else { "❌ تم تعطيل الميزة" };
        self.bot.answer_callback(&cb.id, Some(note), false).await
    }
}
