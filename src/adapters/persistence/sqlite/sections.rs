//! Sections and join-code lookups.

use super::{all_rows, count, first_row, section_from_row, write_err, SqliteRepo, SECTION_SELECT};
use crate::domain::{DomainError, NewSection, Section};
use crate::ports::SectionRepo;
use libsql::params;
use tracing::info;

#[async_trait::async_trait]
impl SectionRepo for SqliteRepo {
    async fn create_section(&self, section: &NewSection) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO sections
                (section_name, level_id, study_type, division, admin_id, join_code, max_students)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                section.section_name.as_str(),
                section.level_id,
                section.study_type.label(),
                section.division.label(),
                section.admin_id,
                section.join_code.as_str(),
                section.max_students
            ],
        )
        .await
        .map_err(|e| write_err(e, "الشعبة موجودة مسبقاً"))?;
        let section_id = conn.last_insert_rowid();
        info!(section_id, name = %section.section_name, "section created");
        Ok(section_id)
    }

    async fn get_section_by_code(&self, code: &str) -> Result<Option<Section>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("{} WHERE s.join_code = ?1 AND s.is_active = 1", SECTION_SELECT);
        first_row(&conn, &sql, params![code], section_from_row).await
    }

    async fn get_section_by_id(&self, section_id: i64) -> Result<Option<Section>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("{} WHERE s.section_id = ?1", SECTION_SELECT);
        first_row(&conn, &sql, params![section_id], section_from_row).await
    }

    async fn list_admin_sections(
        &self,
        admin_telegram_id: i64,
    ) -> Result<Vec<Section>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "{} WHERE u.telegram_id = ?1 AND s.is_active = 1 ORDER BY al.level_number, s.study_type, s.division",
            SECTION_SELECT
        );
        all_rows(&conn, &sql, params![admin_telegram_id], section_from_row).await
    }

    async fn list_all_sections(&self) -> Result<Vec<Section>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "{} WHERE s.is_active = 1 ORDER BY al.level_number, s.study_type, s.division",
            SECTION_SELECT
        );
        all_rows(&conn, &sql, (), section_from_row).await
    }

    async fn code_exists(&self, code: &str) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        Ok(count(
            &conn,
            "SELECT COUNT(*) FROM sections WHERE join_code = ?1",
            params![code],
        )
        .await?
            > 0)
    }
}
