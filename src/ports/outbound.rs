//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters. Storage traits live in `storage`.

use crate::domain::{DialogState, DomainError, Incoming, Keyboard};

/// Telegram Bot API gateway. Send and edit chat messages.
#[async_trait::async_trait]
pub trait BotGateway: Send + Sync {
    /// Send a text message. Returns the new message id.
    ///
    /// # Errors
    /// `Blocked` when the recipient blocked the bot, `FloodWait` when rate limited,
    /// `Gateway` for any other failure.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<i64, DomainError>;

    /// Replace the text (and inline keyboard) of a message the bot sent earlier.
    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), DomainError>;

    /// Acknowledge a callback query, optionally with a toast or alert.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), DomainError>;
}

/// One polled update. `incoming` is None for update kinds the bot ignores; the
/// id still advances the offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledUpdate {
    pub update_id: i64,
    pub incoming: Option<Incoming>,
}

/// Source of incoming updates (long polling).
#[async_trait::async_trait]
pub trait UpdateSource: Send + Sync {
    /// Fetch updates with id >= `offset`, waiting up to `timeout_secs` for new ones.
    async fn poll_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<PolledUpdate>, DomainError>;
}

/// Dialog state port. Current conversation state per chat.
#[async_trait::async_trait]
pub trait DialogStatePort: Send + Sync {
    /// Returns `Idle` when none is stored.
    async fn get_state(&self, chat_id: i64) -> Result<DialogState, DomainError>;

    async fn set_state(&self, chat_id: i64, state: DialogState) -> Result<(), DomainError>;

    async fn clear_state(&self, chat_id: i64) -> Result<(), DomainError>;
}
