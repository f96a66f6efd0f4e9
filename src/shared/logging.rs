//! Tracing setup: stderr plus an append-only log file, rotated by size at startup.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn backup_path(path: &Path, n: u32) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", n));
    PathBuf::from(name)
}

/// Rotate `path` when it exceeds `max_bytes`: `bot.log` → `bot.log.1` → … → `bot.log.<backups>`.
/// The oldest backup is dropped. With `backups == 0` the file is simply truncated.
/// Returns true when a rotation happened.
pub fn rotate_if_needed(path: &Path, max_bytes: u64, backups: u32) -> std::io::Result<bool> {
    let size = match std::fs::metadata(path) {
        Ok(m) => m.len(),
        Err(_) => return Ok(false),
    };
    if max_bytes == 0 || size <= max_bytes {
        return Ok(false);
    }
    if backups == 0 {
        std::fs::remove_file(path)?;
        return Ok(true);
    }
    let oldest = backup_path(path, backups);
    if oldest.exists() {
        std::fs::remove_file(&oldest)?;
    }
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            std::fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    std::fs::rename(path, backup_path(path, 1))?;
    Ok(true)
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
///
/// With `log_file` set, events are also appended (without ANSI colors) to that file.
pub fn init(level: &str, log_file: Option<(&Path, u64, u32)>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    match log_file {
        Some((path, max_bytes, backups)) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            rotate_if_needed(path, max_bytes, backups)?;
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => registry.init(),
    }
    Ok(())
}
