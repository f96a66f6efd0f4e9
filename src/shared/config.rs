//! Application configuration. Bot credentials, owner, paths, limits and notification pacing.
//!
//! Values come from the process environment (after `.env` is loaded) and an optional
//! file named by `ASSIGNBOT_CONFIG`. Every field is optional; `*_or_default()` accessors
//! apply the defaults and `validate()` checks what `run` needs.

use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BOT_USERNAME: &str = "UniversityAssignmentsBot";
pub const DEFAULT_BOT_NAME: &str = "بوت الواجبات الجامعي";
pub const DEFAULT_OWNER_NAME: &str = "المسؤول";
pub const DEFAULT_DB_PATH: &str = "university_bot.db";
pub const DEFAULT_TIMEZONE: &str = "Asia/Baghdad";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Default capacity of the notification job channel. When full, publishing handlers
/// wait on send().await until the worker catches up.
pub const DEFAULT_NOTIFICATION_QUEUE_SIZE: usize = 100;

/// Directories created next to the binary's working directory by `check-config`.
pub const WORK_DIRECTORIES: [&str; 3] = ["logs", "backups", "temp"];

/// Written to `.env` by `check-config` when no `.env` exists.
pub const ENV_TEMPLATE: &str = "# Telegram Bot Configuration
BOT_TOKEN=your_bot_token_here
BOT_USERNAME=UniversityAssignmentsBot
BOT_NAME=بوت الواجبات الجامعي

# Owner Configuration
OWNER_TELEGRAM_ID=123456789
OWNER_NAME=المسؤول

# Database Configuration
DB_PATH=university_bot.db

# Section Configuration
MAX_STUDENTS_PER_SECTION=50

# Assignment Configuration
ASSIGNMENT_EDIT_DURATION_HOURS=24

# Timezone Configuration
TIMEZONE=Asia/Baghdad

# Logging Configuration
LOG_LEVEL=INFO
LOG_FILE=bot.log
MAX_LOG_FILE_SIZE_MB=10
LOG_BACKUP_COUNT=5

# Notification Configuration
NOTIFICATION_DELAY_SECONDS=0.05
NOTIFICATION_RETRY_ATTEMPTS=3
NOTIFICATION_BATCH_SIZE=30

# Performance Configuration
DB_TIMEOUT_SECONDS=10

# Development Configuration (optional)
DEBUG_MODE=False
";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    // ─────────────────────────────────────────────────────────────────────────
    // Bot & owner
    // ─────────────────────────────────────────────────────────────────────────
    /// Bot API token. Read from BOT_TOKEN. Required for `run`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Used in join links. Read from BOT_USERNAME.
    #[serde(default)]
    pub bot_username: Option<String>,

    #[serde(default)]
    pub bot_name: Option<String>,

    /// Read from OWNER_TELEGRAM_ID. Required for `run`.
    #[serde(default)]
    pub owner_telegram_id: Option<i64>,

    #[serde(default)]
    pub owner_name: Option<String>,

    /// Base URL of the Bot API. Read from TELEGRAM_API_URL; tests point it at a mock server.
    #[serde(default)]
    pub telegram_api_url: Option<String>,

    /// Long-poll timeout for getUpdates. Read from POLL_TIMEOUT_SECONDS.
    #[serde(default)]
    pub poll_timeout_seconds: Option<u64>,

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub db_path: Option<String>,

    /// SQLite busy timeout. Read from DB_TIMEOUT_SECONDS.
    #[serde(default)]
    pub db_timeout_seconds: Option<u64>,

    /// Dialog state lives in `<DATA_DIR>/dialogs.json`.
    #[serde(default)]
    pub data_dir: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Sections & assignments
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub max_students_per_section: Option<i64>,

    /// Hours after creation during which an admin may edit an assignment.
    #[serde(default)]
    pub assignment_edit_duration_hours: Option<i64>,

    /// IANA zone name for deadlines. Read from TIMEZONE.
    #[serde(default)]
    pub timezone: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Logging
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default)]
    pub log_level: Option<String>,

    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub max_log_file_size_mb: Option<u64>,

    #[serde(default)]
    pub log_backup_count: Option<u32>,

    /// Forces debug logging. Read from DEBUG_MODE.
    #[serde(default)]
    pub debug_mode: Option<bool>,

    // ─────────────────────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────────────────────
    /// Pause between two sends, in (fractional) seconds.
    #[serde(default)]
    pub notification_delay_seconds: Option<f64>,

    #[serde(default)]
    pub notification_retry_attempts: Option<u32>,

    #[serde(default)]
    pub notification_batch_size: Option<usize>,

    /// Jobs buffered between handlers and the notification worker.
    #[serde(default)]
    pub notification_queue_size: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        Self::from_environment(config::Environment::default())
    }

    /// Build from an explicit environment source (tests pass a map).
    pub fn from_environment(env: config::Environment) -> Result<Self, config::ConfigError> {
        let mut c = config::Config::builder();
        if let Ok(path) = std::env::var("ASSIGNBOT_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c = c.add_source(env.try_parsing(true));
        c.build()?.try_deserialize()
    }

    pub fn bot_token(&self) -> Option<&str> {
        self.bot_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn bot_username_or_default(&self) -> String {
        self.bot_username
            .clone()
            .unwrap_or_else(|| DEFAULT_BOT_USERNAME.to_string())
    }

    pub fn bot_name_or_default(&self) -> String {
        self.bot_name
            .clone()
            .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string())
    }

    pub fn owner_name_or_default(&self) -> String {
        self.owner_name
            .clone()
            .unwrap_or_else(|| DEFAULT_OWNER_NAME.to_string())
    }

    pub fn telegram_api_url_or_default(&self) -> String {
        self.telegram_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string())
    }

    /// Defaults to 30 seconds.
    pub fn poll_timeout_secs_or_default(&self) -> u64 {
        self.poll_timeout_seconds.unwrap_or(30)
    }

    pub fn db_path_or_default(&self) -> String {
        self.db_path
            .clone()
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }

    /// Defaults to 10 seconds.
    pub fn db_timeout_or_default(&self) -> Duration {
        Duration::from_secs(self.db_timeout_seconds.unwrap_or(10))
    }

    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "data".to_string())
    }

    /// Defaults to 50.
    pub fn max_students_or_default(&self) -> i64 {
        self.max_students_per_section.unwrap_or(50)
    }

    /// Defaults to 24 hours.
    pub fn edit_window_or_default(&self) -> chrono::Duration {
        chrono::Duration::hours(self.assignment_edit_duration_hours.unwrap_or(24))
    }

    pub fn timezone_name_or_default(&self) -> String {
        self.timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string())
    }

    /// Parsed timezone. Unknown names are reported by `validate()`.
    pub fn tz(&self) -> Result<Tz, String> {
        let name = self.timezone_name_or_default();
        name.parse::<Tz>()
            .map_err(|_| format!("TIMEZONE غير صالحة: {}", name))
    }

    /// Effective log level: `debug` in debug mode, else LOG_LEVEL (default `info`).
    pub fn log_level_or_default(&self) -> String {
        if self.debug_mode.unwrap_or(false) {
            return "debug".to_string();
        }
        match self.log_level.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("") => "info".to_string(),
            Some("warning") => "warn".to_string(),
            Some("critical") | Some("fatal") => "error".to_string(),
            Some(level) => level.to_string(),
        }
    }

    pub fn log_file_or_default(&self) -> String {
        self.log_file.clone().unwrap_or_else(|| "bot.log".to_string())
    }

    /// Defaults to 10 MB.
    pub fn max_log_bytes_or_default(&self) -> u64 {
        self.max_log_file_size_mb.unwrap_or(10) * 1024 * 1024
    }

    /// Defaults to 5.
    pub fn log_backup_count_or_default(&self) -> u32 {
        self.log_backup_count.unwrap_or(5)
    }

    /// Defaults to 50 ms. Negative or non-finite values fall back to the default.
    pub fn notification_delay_or_default(&self) -> Duration {
        let secs = self
            .notification_delay_seconds
            .filter(|s| s.is_finite() && *s >= 0.0)
            .unwrap_or(0.05);
        Duration::from_secs_f64(secs)
    }

    /// Defaults to 3; never less than 1.
    pub fn notification_retry_attempts_or_default(&self) -> u32 {
        self.notification_retry_attempts.unwrap_or(3).max(1)
    }

    /// Defaults to 30; never less than 1.
    pub fn notification_batch_size_or_default(&self) -> usize {
        self.notification_batch_size.unwrap_or(30).max(1)
    }

    pub fn notification_queue_size_or_default(&self) -> usize {
        self.notification_queue_size
            .unwrap_or(DEFAULT_NOTIFICATION_QUEUE_SIZE)
            .max(1)
    }

    /// Check the settings `run` depends on. Returns every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if self.bot_token().is_none() {
            errors.push("BOT_TOKEN غير موجود".to_string());
        }
        match self.owner_telegram_id {
            None => errors.push("OWNER_TELEGRAM_ID غير موجود".to_string()),
            Some(id) if id <= 0 => {
                errors.push("OWNER_TELEGRAM_ID يجب أن يكون رقماً موجباً".to_string())
            }
            Some(_) => {}
        }
        if self.max_students_or_default() <= 0 {
            errors.push("MAX_STUDENTS_PER_SECTION يجب أن يكون أكبر من 0".to_string());
        }
        if let Err(e) = self.tz() {
            errors.push(e);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Create `logs/`, `backups/` and `temp/` under `base`.
pub fn ensure_directories(base: &Path) -> std::io::Result<()> {
    for dir in WORK_DIRECTORIES {
        std::fs::create_dir_all(base.join(dir))?;
    }
    Ok(())
}

/// Write `ENV_TEMPLATE` to `path` unless it exists. Returns true when written.
pub fn write_env_template(path: &Path) -> std::io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(path, ENV_TEMPLATE)?;
    Ok(true)
}
