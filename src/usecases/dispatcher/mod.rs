//! Conversation dispatcher. Implements `InputPort`: routes commands, menu buttons,
//! dialog steps and inline-button callbacks to the services.
//!
//! Handler errors never escape `handle`: user-facing errors are shown as `❌ <text>`,
//! anything else is logged and answered with the generic error message.

mod admin;
mod owner;
mod registration;
mod student;

use super::notification_worker::NotificationJob;
use super::{
    AssignmentService, RegistrationService, SectionService, SettingsService, StatsService,
    UserService,
};
use crate::domain::format::{split_message, MAX_MESSAGE_LENGTH};
use crate::domain::permissions::check_role;
use crate::domain::texts::{self, buttons};
use crate::domain::validation::is_valid_section_code;
use crate::domain::{
    CallbackAction, DialogState, DomainError, Incoming, IncomingCallback, IncomingMessage,
    Keyboard, User, UserType,
};
use crate::ports::{BotGateway, CatalogRepo, DialogStatePort, InputPort};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Services the dispatcher drives.
pub struct BotServices {
    pub users: Arc<UserService>,
    pub sections: Arc<SectionService>,
    pub registrations: Arc<RegistrationService>,
    pub assignments: Arc<AssignmentService>,
    pub stats: Arc<StatsService>,
    pub settings: Arc<SettingsService>,
    pub catalog: Arc<dyn CatalogRepo>,
}

pub struct BotDispatcher {
    bot: Arc<dyn BotGateway>,
    dialogs: Arc<dyn DialogStatePort>,
    services: BotServices,
    notify_tx: mpsc::Sender<NotificationJob>,
}

pub(crate) fn main_keyboard(user_type: UserType) -> Keyboard {
    match user_type {
        UserType::Owner => Keyboard::reply(buttons::OWNER_MAIN),
        UserType::Admin => Keyboard::reply(buttons::ADMIN_MAIN),
        UserType::Student => Keyboard::reply(buttons::STUDENT_MAIN),
    }
}

pub(crate) fn cancel_keyboard() -> Keyboard {
    Keyboard::reply(&[&[buttons::CANCEL]])
}

/// `/start`, `/start@BotName CODE` → ("start", Some("CODE")).
fn parse_command(text: &str) -> Option<(&str, Option<&str>)> {
    let rest = text.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let name = head.split('@').next().unwrap_or(head);
    Some((name, parts.next()))
}

fn not_registered() -> DomainError {
    DomainError::PermissionDenied("أنت غير مسجل. استخدم رابط التسجيل الخاص بشعبتك.".into())
}

impl BotDispatcher {
    pub fn new(
        bot: Arc<dyn BotGateway>,
        dialogs: Arc<dyn DialogStatePort>,
        services: BotServices,
        notify_tx: mpsc::Sender<NotificationJob>,
    ) -> Self {
        Self {
            bot,
            dialogs,
            services,
            notify_tx,
        }
    }

    /// Send `text`, split at the message limit. The keyboard goes on the last part.
    pub(crate) async fn send(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DomainError> {
        let parts = split_message(text, MAX_MESSAGE_LENGTH);
        let last = parts.len().saturating_sub(1);
        for (i, part) in parts.iter().enumerate() {
            let kb = if i == last { keyboard } else { None };
            self.bot.send_message(chat_id, part, kb).await?;
        }
        Ok(())
    }

    /// Best-effort message to another user; failures are only logged.
    pub(crate) async fn notify(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) {
        if let Err(e) = self.bot.send_message(chat_id, text, keyboard).await {
            warn!(chat_id, error = %e, "notification to user failed");
        }
    }

    pub(crate) async fn queue(&self, job: NotificationJob) {
        let assignment_id = job.assignment_id;
        if self.notify_tx.send(job).await.is_err() {
            error!(assignment_id, "notification worker stopped, job dropped");
        }
    }

    /// Registered, active, unblocked user with at least `role`.
    pub(crate) async fn require(&self, telegram_id: i64, role: UserType) -> Result<User, DomainError> {
        let user = self
            .services
            .users
            .get_user(telegram_id)
            .await?
            .ok_or_else(not_registered)?;
        check_role(Some(&user), role)?;
        Ok(user)
    }

    pub(crate) async fn set_state(&self, chat_id: i64, state: DialogState) -> Result<(), DomainError> {
        self.dialogs.set_state(chat_id, state).await
    }

    pub(crate) async fn clear_state(&self, chat_id: i64) -> Result<(), DomainError> {
        self.dialogs.clear_state(chat_id).await
    }

    /// Show an error to the chat. Infrastructure errors are logged and hidden.
    async fn report(&self, chat_id: i64, err: &DomainError) -> Result<(), DomainError> {
        let text = if err.is_user_facing() {
            debug!(chat_id, error = %err, "request refused");
            format!("❌ {}", err)
        } else {
            error!(chat_id, error = %err, "handler failed");
            texts::ERROR_GENERAL.to_string()
        };
        self.bot.send_message(chat_id, &text, None).await.map(|_| ())
    }

    async fn on_message(&self, msg: &IncomingMessage) -> Result<(), DomainError> {
        let text = msg.text.trim();
        let telegram_id = msg.from.telegram_id;

        if let Some((command, arg)) = parse_command(text) {
            return match command {
                "start" => self.on_start(msg, arg).await,
                "help" => self.on_help(msg).await,
                "cancel" => self.on_cancel(msg).await,
                _ => self.send(msg.chat_id, texts::ERROR_INVALID_INPUT, None).await,
            };
        }
        if text == buttons::CANCEL || text == buttons::BACK {
            return self.on_cancel(msg).await;
        }

        let user = self.services.users.get_user(telegram_id).await?;
        if user.as_ref().is_some_and(|u| u.is_blocked) {
            self.clear_state(msg.chat_id).await?;
            return self.send(msg.chat_id, texts::ERROR_BLOCKED, None).await;
        }

        if let Some(user) = &user {
            if self.on_menu_button(msg, user, text).await? {
                return Ok(());
            }
        }

        let state = self.dialogs.get_state(msg.chat_id).await?;
        if !state.is_idle() {
            return self.on_dialog_step(msg, user.as_ref(), state).await;
        }

        match user {
            Some(u) => {
                self.send(
                    msg.chat_id,
                    "استخدم الأزرار أدناه أو أرسل /help",
                    Some(&main_keyboard(u.user_type)),
                )
                .await
            }
            None => self.send(msg.chat_id, texts::WELCOME_NEW_USER, None).await,
        }
    }

    /// Main-menu buttons. Pressing one abandons any dialog in progress.
    /// Returns false when `text` is not a menu button.
    async fn on_menu_button(
        &self,
        msg: &IncomingMessage,
        user: &User,
        text: &str,
    ) -> Result<bool, DomainError> {
        let known = [
            buttons::CREATE_SECTION,
            buttons::LIST_SECTIONS,
            buttons::MANAGE_ADMINS,
            buttons::STATISTICS,
            buttons::SETTINGS,
            buttons::FEATURES,
            buttons::PUBLISH_ASSIGNMENT,
            buttons::ASSIGNMENTS,
            buttons::MANAGE_STUDENTS,
            buttons::PENDING_REQUESTS,
            buttons::MY_ASSIGNMENTS,
            buttons::SECTION_INFO,
        ];
        if !known.contains(&text) {
            return Ok(false);
        }
        self.clear_state(msg.chat_id).await?;
        let chat_id = msg.chat_id;
        match text {
            buttons::CREATE_SECTION => self.start_create_section(chat_id, user).await?,
            buttons::LIST_SECTIONS => self.list_sections(chat_id, user).await?,
            buttons::MANAGE_ADMINS => self.manage_admins(chat_id, user).await?,
            buttons::STATISTICS => self.statistics(chat_id, user).await?,
            buttons::SETTINGS => self.show_settings(chat_id, user).await?,
            buttons::FEATURES => self.show_features(chat_id, user).await?,
            buttons::PUBLISH_ASSIGNMENT => self.start_publish(chat_id, user).await?,
            buttons::ASSIGNMENTS => self.list_assignments(chat_id, user).await?,
            buttons::MANAGE_STUDENTS => self.manage_students(chat_id, user).await?,
            buttons::PENDING_REQUESTS => self.pending_requests(chat_id, user).await?,
            buttons::MY_ASSIGNMENTS => self.my_assignments(chat_id, user).await?,
            _ => self.section_info(chat_id, user).await?,
        }
        Ok(true)
    }

    async fn on_dialog_step(
        &self,
        msg: &IncomingMessage,
        user: Option<&User>,
        state: DialogState,
    ) -> Result<(), DomainError> {
        if let DialogState::WaitingForName {
            section_id,
            section_name,
        } = state
        {
            return self
                .on_student_name(msg, section_id, &section_name)
                .await;
        }
        // Every other flow belongs to staff.
        let Some(user) = user else {
            self.clear_state(msg.chat_id).await?;
            return Err(not_registered());
        };
        let text = msg.text.trim();
        match state {
            DialogState::Idle | DialogState::WaitingForName { .. } => Ok(()),
            DialogState::CreateSectionLevel
            | DialogState::CreateSectionType { .. }
            | DialogState::CreateSectionDivision { .. }
            | DialogState::CreateSectionAdmin { .. } => {
                self.create_section_step(msg.chat_id, user, state, text).await
            }
            DialogState::AssignAdmin => self.assign_admin_step(msg.chat_id, user, text).await,
            DialogState::EditSetting { key } => {
                self.edit_setting_step(msg.chat_id, user, &key, text).await
            }
            DialogState::PublishSection
            | DialogState::PublishSubject { .. }
            | DialogState::PublishTitle { .. }
            | DialogState::PublishDescription { .. }
            | DialogState::PublishDate { .. }
            | DialogState::PublishTime { .. } => {
                self.publish_step(msg.chat_id, user, state, text).await
            }
            DialogState::EditChooseField { assignment_id } => {
                self.edit_field_step(msg.chat_id, assignment_id, text).await
            }
            DialogState::EditValue {
                assignment_id,
                field,
            } => {
                self.edit_value_step(msg.chat_id, user, assignment_id, field, text)
                    .await
            }
        }
    }

    async fn on_start(&self, msg: &IncomingMessage, arg: Option<&str>) -> Result<(), DomainError> {
        let telegram_id = msg.from.telegram_id;
        info!(telegram_id, "/start");
        self.clear_state(msg.chat_id).await?;

        if let Some(code) = arg.filter(|c| is_valid_section_code(c)) {
            return self.on_join_link(msg, code).await;
        }

        let Some(user) = self.services.users.get_user(telegram_id).await? else {
            return self.send(msg.chat_id, texts::WELCOME_NEW_USER, None).await;
        };
        if user.is_blocked {
            return self.send(msg.chat_id, texts::ERROR_BLOCKED, None).await;
        }
        if let Some(handle) = msg.from.handle().filter(|h| user.username.as_ref() != Some(h)) {
            if let Err(e) = self
                .services
                .users
                .update_user(telegram_id, None, Some(&handle))
                .await
            {
                warn!(telegram_id, error = %e, "username refresh failed");
            }
        }
        let welcome = match user.user_type {
            UserType::Owner => texts::WELCOME_OWNER,
            UserType::Admin => texts::WELCOME_ADMIN,
            UserType::Student => texts::WELCOME_STUDENT,
        };
        self.send(msg.chat_id, welcome, Some(&main_keyboard(user.user_type)))
            .await
    }

    async fn on_help(&self, msg: &IncomingMessage) -> Result<(), DomainError> {
        let user = self.services.users.get_user(msg.from.telegram_id).await?;
        let mut help = String::from(texts::HELP_HEADER);
        match user.map(|u| u.user_type) {
            Some(UserType::Owner) => help.push_str(texts::HELP_OWNER),
            Some(UserType::Admin) => help.push_str(texts::HELP_ADMIN),
            Some(UserType::Student) => help.push_str(texts::HELP_STUDENT),
            None => {}
        }
        help.push_str(texts::HELP_FOOTER);
        self.send(msg.chat_id, &help, None).await
    }

    async fn on_cancel(&self, msg: &IncomingMessage) -> Result<(), DomainError> {
        self.clear_state(msg.chat_id).await?;
        let user = self.services.users.get_user(msg.from.telegram_id).await?;
        let keyboard = match user {
            Some(u) if !u.is_blocked => main_keyboard(u.user_type),
            _ => Keyboard::Remove,
        };
        self.send(msg.chat_id, texts::CANCELLED, Some(&keyboard)).await
    }

    async fn on_callback(&self, cb: &IncomingCallback) -> Result<(), DomainError> {
        let action: CallbackAction = cb.data.parse()?;
        debug!(from = cb.from.telegram_id, data = %cb.data, "callback");
        match action {
            CallbackAction::Approve {
                telegram_id,
                section_id,
            } => self.on_decision(cb, telegram_id, section_id, true).await,
            CallbackAction::Reject {
                telegram_id,
                section_id,
            } => self.on_decision(cb, telegram_id, section_id, false).await,
            CallbackAction::Edit { assignment_id } => self.on_edit_assignment(cb, assignment_id).await,
            CallbackAction::Delete { assignment_id } => {
                self.on_delete_assignment(cb, assignment_id).await
            }
            CallbackAction::Block { telegram_id } => self.on_block(cb, telegram_id, true).await,
            CallbackAction::Unblock { telegram_id } => self.on_block(cb, telegram_id, false).await,
            CallbackAction::Feature { key } => self.on_toggle_feature(cb, &key).await,
            CallbackAction::Setting { key } => self.on_edit_setting(cb, &key).await,
        }
    }

    /// Append `note` to the message the pressed button belongs to and drop its buttons.
    pub(crate) async fn annotate(&self, cb: &IncomingCallback, note: &str) {
        let (Some(chat_id), Some(message_id)) = (cb.chat_id, cb.message_id) else {
            return;
        };
        let text = format!("{}\n\n{}", cb.message_text.as_deref().unwrap_or_default(), note);
        if let Err(e) = self
            .bot
            .edit_message_text(chat_id, message_id, text.trim(), None)
            .await
        {
            warn!(chat_id, message_id, error = %e, "could not update message");
        }
    }

    pub(crate) fn callback_chat(cb: &IncomingCallback) -> i64 {
        cb.chat_id.unwrap_or(cb.from.telegram_id)
    }
}

#[async_trait::async_trait]
impl InputPort for BotDispatcher {
    async fn handle(&self, update: Incoming) -> Result<(), DomainError> {
        match update {
            Incoming::Message(msg) => {
                if let Err(e) = self.on_message(&msg).await {
                    self.report(msg.chat_id, &e).await?;
                }
            }
            Incoming::Callback(cb) => {
                let result = self.on_callback(&cb).await;
                if let Err(e) = result {
                    let text = if e.is_user_facing() {
                        format!("❌ {}", e)
                    } else {
                        error!(data = %cb.data, error = %e, "callback failed");
                        texts::ERROR_GENERAL.to_string()
                    };
                    self.bot.answer_callback(&cb.id, Some(&text), true).await?;
                }
            }
        }
        Ok(())
    }
}
