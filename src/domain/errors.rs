//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these. The `Display` text of the
//! user-facing variants is the Arabic message shown in the chat.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed validation. Carries the message shown to the user.
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller lacks the role or section ownership required.
    #[error("{0}")]
    PermissionDenied(String),

    /// Uniqueness violation or an already-processed request.
    #[error("{0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Telegram gateway error: {0}")]
    Gateway(String),

    #[error("Dialog state error: {0}")]
    State(String),

    /// The recipient blocked the bot. Never retried.
    #[error("Recipient blocked the bot")]
    Blocked,

    /// FloodWait error: caller should retry after `seconds` seconds.
    #[error("FloodWait: retry after {seconds} seconds")]
    FloodWait { seconds: u64 },
}

impl DomainError {
    /// True for errors whose text is meant for the chat user (as opposed to infrastructure failures).
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_)
                | DomainError::NotFound(_)
                | DomainError::PermissionDenied(_)
                | DomainError::Conflict(_)
        )
    }
}
