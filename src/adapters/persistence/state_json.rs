//! Implements DialogStatePort using a JSON file.
//!
//! Keeps the conversation state of every chat so a restart does not drop half-finished
//! flows. Idle chats are not stored.

use crate::domain::{DialogState, DomainError};
use crate::ports::DialogStatePort;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// State: chat_id -> dialog state
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateData {
    dialogs: HashMap<i64, DialogState>,
}

/// JSON file-based dialog storage.
pub struct DialogStateJson {
    path: std::path::PathBuf,
    cache: tokio::sync::RwLock<StateData>,
}

impl DialogStateJson {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: tokio::sync::RwLock::new(StateData::default()),
        }
    }

    /// Load state from disk. A missing or unreadable file starts empty.
    pub async fn load(&self) -> Result<(), DomainError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "dialog state file unreadable, starting empty");
                StateData::default()
            }),
            Err(_) => StateData::default(),
        };
        *self.cache.write().await = data;
        Ok(())
    }

    /// Write to a temp file, fsync, then rename over the target.
    async fn save(&self) -> Result<(), DomainError> {
        let json = {
            let data = self.cache.read().await;
            serde_json::to_string_pretty(&*data).map_err(|e| DomainError::State(e.to_string()))?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::State(format!("create state dir: {}", e)))?;
        }
        let temp_path = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::State(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::State(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::State(format!("sync temp file: {}", e)))?;
        drop(f);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| DomainError::State(format!("atomic rename failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DialogStatePort for DialogStateJson {
    async fn get_state(&self, chat_id: i64) -> Result<DialogState, DomainError> {
        let cache = self.cache.read().await;
        Ok(cache.dialogs.get(&chat_id).cloned().unwrap_or_default())
    }

    async fn set_state(&self, chat_id: i64, state: DialogState) -> Result<(), DomainError> {
        {
            let mut cache = self.cache.write().await;
            if state.is_idle() {
                cache.dialogs.remove(&chat_id);
            } else {
                cache.dialogs.insert(chat_id, state);
            }
        }
        self.save().await
    }

    async fn clear_state(&self, chat_id: i64) -> Result<(), DomainError> {
        let removed = self.cache.write().await.dialogs.remove(&chat_id).is_some();
        if removed {
            self.save().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssignmentDraft, StudyType};

    #[tokio::test]
    async fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dialogs.json");
        let store = DialogStateJson::new(&path);
        store.load().await.unwrap();

        let state = DialogState::PublishDescription {
            draft: AssignmentDraft {
                section_id: 3,
                subject_name: Some("الرياضيات".into()),
                title: Some("تمارين التكامل".into()),
                ..Default::default()
            },
        };
        store.set_state(42, state.clone()).await.unwrap();
        store
            .set_state(
                43,
                DialogState::CreateSectionType { level_id: 1 },
            )
            .await
            .unwrap();

        let reloaded = DialogStateJson::new(&path);
        reloaded.load().await.unwrap();
        assert_eq!(reloaded.get_state(42).await.unwrap(), state);
        assert_eq!(
            reloaded.get_state(43).await.unwrap(),
            DialogState::CreateSectionType { level_id: 1 }
        );
        assert_eq!(reloaded.get_state(99).await.unwrap(), DialogState::Idle);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn clear_and_idle_remove_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = DialogStateJson::new(dir.path().join("nested").join("dialogs.json"));
        store
            .set_state(
                1,
                DialogState::CreateSectionDivision {
                    level_id: 2,
                    study_type: StudyType::Morning,
                },
            )
            .await
            .unwrap();
        store.clear_state(1).await.unwrap();
        assert!(store.get_state(1).await.unwrap().is_idle());

        store.set_state(2, DialogState::AssignAdmin).await.unwrap();
        store.set_state(2, DialogState::Idle).await.unwrap();
        assert!(store.get_state(2).await.unwrap().is_idle());
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dialogs.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = DialogStateJson::new(&path);
        store.load().await.unwrap();
        assert!(store.get_state(5).await.unwrap().is_idle());
    }
}
