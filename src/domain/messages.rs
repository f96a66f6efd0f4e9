//! Chat-level value types: incoming updates, outgoing keyboards and callback payloads.
//!
//! Independent of the Bot API wire format; the telegram adapter maps to and from these.

use crate::domain::DomainError;
use std::fmt;

/// Who sent an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub telegram_id: i64,
    /// Telegram username without the leading `@`.
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl Sender {
    /// Username in the stored form (`@name`), if any.
    pub fn handle(&self) -> Option<String> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| format!("@{}", u.trim_start_matches('@')))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub from: Sender,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCallback {
    pub id: String,
    pub from: Sender,
    /// Chat and message the inline keyboard is attached to.
    pub chat_id: Option<i64>,
    pub message_id: Option<i64>,
    pub message_text: Option<String>,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Message(IncomingMessage),
    Callback(IncomingCallback),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, action: &CallbackAction) -> Self {
        Self {
            text: text.into(),
            data: action.to_string(),
        }
    }
}

/// Markup attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    Reply { rows: Vec<Vec<String>>, one_time: bool },
    Inline(Vec<Vec<InlineButton>>),
    Remove,
}

impl Keyboard {
    /// Persistent reply keyboard from static label rows.
    pub fn reply(rows: &[&[&str]]) -> Self {
        Keyboard::Reply {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            one_time: false,
        }
    }

    /// One button per row, followed by a cancel row.
    pub fn choices<I, S>(items: I, cancel: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rows: Vec<Vec<String>> = items.into_iter().map(|s| vec![s.into()]).collect();
        rows.push(vec![cancel.to_string()]);
        Keyboard::Reply {
            rows,
            one_time: true,
        }
    }
}

/// Inline button payloads. Wire form is `<verb>_<args>` joined by `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Approve { telegram_id: i64, section_id: i64 },
    Reject { telegram_id: i64, section_id: i64 },
    Edit { assignment_id: i64 },
    Delete { assignment_id: i64 },
    Block { telegram_id: i64 },
    Unblock { telegram_id: i64 },
    Feature { key: String },
    Setting { key: String },
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Approve {
                telegram_id,
                section_id,
            } => write!(f, "approve_{}_{}", telegram_id, section_id),
            CallbackAction::Reject {
                telegram_id,
                section_id,
            } => write!(f, "reject_{}_{}", telegram_id, section_id),
            CallbackAction::Edit { assignment_id } => write!(f, "edit_{}", assignment_id),
            CallbackAction::Delete { assignment_id } => write!(f, "delete_{}", assignment_id),
            CallbackAction::Block { telegram_id } => write!(f, "block_{}", telegram_id),
            CallbackAction::Unblock { telegram_id } => write!(f, "unblock_{}", telegram_id),
            CallbackAction::Feature { key } => write!(f, "feature_{}", key),
            CallbackAction::Setting { key } => write!(f, "setting_{}", key),
        }
    }
}

fn parse_id(s: &str, data: &str) -> Result<i64, DomainError> {
    s.parse::<i64>()
        .map_err(|_| DomainError::Validation(format!("invalid callback data: {}", data)))
}

impl std::str::FromStr for CallbackAction {
    type Err = DomainError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let malformed = || DomainError::Validation(format!("invalid callback data: {}", data));
        let (verb, rest) = data.split_once('_').ok_or_else(malformed)?;
        if rest.is_empty() {
            return Err(malformed());
        }
        let pair = || -> Result<(i64, i64), DomainError> {
            let (a, b) = rest.split_once('_').ok_or_else(malformed)?;
            Ok((parse_id(a, data)?, parse_id(b, data)?))
        };
        Ok(match verb {
            "approve" => {
                let (telegram_id, section_id) = pair()?;
                CallbackAction::Approve {
                    telegram_id,
                    section_id,
                }
            }
            "reject" => {
                let (telegram_id, section_id) = pair()?;
                CallbackAction::Reject {
                    telegram_id,
                    section_id,
                }
            }
            "edit" => CallbackAction::Edit {
                assignment_id: parse_id(rest, data)?,
            },
            "delete" => CallbackAction::Delete {
                assignment_id: parse_id(rest, data)?,
            },
            "block" => CallbackAction::Block {
                telegram_id: parse_id(rest, data)?,
            },
            "unblock" => CallbackAction::Unblock {
                telegram_id: parse_id(rest, data)?,
            },
            // Keys may themselves contain underscores (student_blocking).
            "feature" => CallbackAction::Feature {
                key: rest.to_string(),
            },
            "setting" => CallbackAction::Setting {
                key: rest.to_string(),
            },
            _ => return Err(malformed()),
        })
    }
}
