//! Bot settings, feature flags and the level/subject catalog.

use super::{all_rows, db_err, first_row, flag, SqliteRepo};
use crate::domain::{AcademicLevel, DomainError, Feature, Setting, Subject};
use crate::ports::{CatalogRepo, SettingsRepo};
use libsql::{params, Row};
use tracing::info;

fn level_from_row(row: &Row) -> Result<AcademicLevel, DomainError> {
    Ok(AcademicLevel {
        level_id: row.get(0).map_err(db_err)?,
        level_name: row.get(1).map_err(db_err)?,
        level_number: row.get(2).map_err(db_err)?,
    })
}

fn subject_from_row(row: &Row) -> Result<Subject, DomainError> {
    Ok(Subject {
        subject_id: row.get(0).map_err(db_err)?,
        subject_name: row.get(1).map_err(db_err)?,
        description: row.get(2).map_err(db_err)?,
    })
}

#[async_trait::async_trait]
impl CatalogRepo for SqliteRepo {
    async fn list_levels(&self) -> Result<Vec<AcademicLevel>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            "SELECT level_id, level_name, level_number FROM academic_levels WHERE is_active = 1 ORDER BY level_number",
            (),
            level_from_row,
        )
        .await
    }

    async fn get_level(&self, level_id: i64) -> Result<Option<AcademicLevel>, DomainError> {
        let conn = self.conn().await?;
        first_row(
            &conn,
            "SELECT level_id, level_name, level_number FROM academic_levels WHERE level_id = ?1",
            params![level_id],
            level_from_row,
        )
        .await
    }

    async fn list_subjects(&self) -> Result<Vec<Subject>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            "SELECT subject_id, subject_name, description FROM subjects WHERE is_active = 1 ORDER BY subject_name",
            (),
            subject_from_row,
        )
        .await
    }

    async fn subjects_for_stage(&self, stage_id: i64) -> Result<Vec<Subject>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            r#"
            SELECT s.subject_id, s.subject_name, s.description
            FROM subjects s
            JOIN subjects_stages ss ON s.subject_id = ss.subject_id
            WHERE ss.stage_id = ?1 AND s.is_active = 1 AND ss.is_active = 1
            ORDER BY s.subject_name
            "#,
            params![stage_id],
            subject_from_row,
        )
        .await
    }
}

#[async_trait::async_trait]
impl SettingsRepo for SqliteRepo {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, DomainError> {
        let conn = self.conn().await?;
        first_row(
            &conn,
            "SELECT setting_value FROM bot_settings WHERE setting_key = ?1",
            params![key],
            |row| row.get::<String>(0).map_err(db_err),
        )
        .await
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                r#"
                UPDATE bot_settings
                SET setting_value = ?1, updated_at = CURRENT_TIMESTAMP
                WHERE setting_key = ?2
                "#,
                params![value, key],
            )
            .await
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound("الإعداد غير موجود".into()));
        }
        info!(key, value, "setting updated");
        Ok(())
    }

    async fn list_settings(&self) -> Result<Vec<Setting>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            "SELECT setting_key, setting_value, setting_type, description FROM bot_settings ORDER BY setting_id",
            (),
            |row| {
                Ok(Setting {
                    key: row.get(0).map_err(db_err)?,
                    value: row.get(1).map_err(db_err)?,
                    setting_type: row.get(2).map_err(db_err)?,
                    description: row.get(3).map_err(db_err)?,
                })
            },
        )
        .await
    }

    async fn toggle_feature(&self, key: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let enabled = !first_row(
            &conn,
            "SELECT is_enabled FROM bot_features WHERE feature_key = ?1",
            params![key],
            |row| flag(row, 0, false),
        )
        .await?
        .ok_or_else(|| DomainError::NotFound("الميزة غير موجودة".into()))?;
        conn.execute(
            r#"
            UPDATE bot_features
            SET is_enabled = ?1, updated_at = CURRENT_TIMESTAMP
            WHERE feature_key = ?2
            "#,
            params![enabled as i64, key],
        )
        .await
        .map_err(db_err)?;
        info!(key, enabled, "feature toggled");
        Ok(enabled)
    }

    async fn is_feature_enabled(&self, key: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        Ok(first_row(
            &conn,
            "SELECT is_enabled FROM bot_features WHERE feature_key = ?1",
            params![key],
            |row| flag(row, 0, false),
        )
        .await?
        .unwrap_or(false))
    }

    async fn list_features(&self) -> Result<Vec<Feature>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            "SELECT feature_key, feature_name, is_enabled, description FROM bot_features ORDER BY feature_id",
            (),
            |row| {
                Ok(Feature {
                    key: row.get(0).map_err(db_err)?,
                    name: row.get(1).map_err(db_err)?,
                    is_enabled: flag(row, 2, false)?,
                    description: row.get(3).map_err(db_err)?,
                })
            },
        )
        .await
    }
}
