//! Infrastructure adapters. Implement outbound ports.
//!
//! Telegram Bot API, SQLite, dialog-state file, terminal UI. Map errors to DomainError.

pub mod persistence;
pub mod telegram;
pub mod ui;
