//! Owner-managed bot settings and feature flags.

use crate::domain::entities::ActivityType;
use crate::domain::permissions::check_role;
use crate::domain::{DomainError, Feature, NewActivity, Setting, User, UserType};
use crate::ports::{ActivityRepo, SettingsRepo};
use std::sync::Arc;
use tracing::info;

pub struct SettingsService {
    settings: Arc<dyn SettingsRepo>,
    activity: Arc<dyn ActivityRepo>,
}

/// Check `value` against the declared `setting_type`. Returns the normalized value.
fn coerce(setting_type: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();
    match setting_type {
        "integer" => value
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|_| DomainError::Validation("القيمة يجب أن تكون رقماً صحيحاً".into())),
        "boolean" => match value.to_lowercase().as_str() {
            "true" | "1" | "نعم" => Ok("true".to_string()),
            "false" | "0" | "لا" => Ok("false".to_string()),
            _ => Err(DomainError::Validation(
                "القيمة يجب أن تكون true أو false".into(),
            )),
        },
        "json" => serde_json::from_str::<serde_json::Value>(value)
            .map(|_| value.to_string())
            .map_err(|_| DomainError::Validation("القيمة ليست JSON صالحاً".into())),
        _ if value.is_empty() => Err(DomainError::Validation("القيمة فارغة".into())),
        _ => Ok(value.to_string()),
    }
}

impl SettingsService {
    pub fn new(settings: Arc<dyn SettingsRepo>, activity: Arc<dyn ActivityRepo>) -> Self {
        Self { settings, activity }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        self.settings.get_setting(key).await
    }

    pub async fn list(&self) -> Result<Vec<Setting>, DomainError> {
        self.settings.list_settings().await
    }

    pub async fn set(&self, actor: &User, key: &str, value: &str) -> Result<Setting, DomainError> {
        check_role(Some(actor), UserType::Owner)?;
        let setting = self
            .settings
            .list_settings()
            .await?
            .into_iter()
            .find(|s| s.key == key)
            .ok_or_else(|| DomainError::NotFound("الإعداد غير موجود".into()))?;
        let value = coerce(&setting.setting_type, value)?;
        self.settings.set_setting(key, &value).await?;
        self.activity
            .log_activity(&NewActivity::new(
                actor.user_id,
                ActivityType::SettingChanged,
                format!("تغيير {} إلى {}", key, value),
            ))
            .await?;
        Ok(Setting { value, ..setting })
    }

    /// Flip a feature flag. Returns the new state.
    pub async fn toggle(&self, actor: &User, key: &str) -> Result<bool, DomainError> {
        check_role(Some(actor), UserType::Owner)?;
        let enabled = self.settings.toggle_feature(key).await?;
        self.activity
            .log_activity(&NewActivity::new(
                actor.user_id,
                ActivityType::FeatureToggled,
                format!(
                    "{} الميزة {}",
                    if enabled { "تفعيل" } else { "تعطيل" },
                    key
                ),
            ))
            .await?;
        info!(key, enabled, "feature toggled");
        Ok(enabled)
    }

    pub async fn is_enabled(&self, key: &str) -> Result<bool, DomainError> {
        self.settings.is_feature_enabled(key).await
    }

    pub async fn features(&self) -> Result<Vec<Feature>, DomainError> {
        self.settings.list_features().await
    }
}
