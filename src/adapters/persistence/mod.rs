//! Persistence adapters: SQLite repository and the JSON dialog-state file.

pub mod sqlite;
pub mod state_json;

pub use sqlite::{SchemaSummary, SqliteRepo};
pub use state_json::DialogStateJson;
