use super::{all_rows, assignment_from_row, db_err, first_row, SqliteRepo, ASSIGNMENT_SELECT};
use crate::domain::{Assignment, AssignmentChanges, DomainError, NewAssignment};
use crate::ports::AssignmentRepo;
use libsql::{params, Connection};
use tracing::{info, warn};

impl SqliteRepo {
    async fn create_assignment_in(
        conn: &Connection,
        a: &NewAssignment,
    ) -> Result<i64, DomainError> {
        let subject_id = match first_row(
            conn,
            "SELECT subject_id FROM subjects WHERE subject_name = ?1",
            params![a.subject_name.as_str()],
            |row| row.get::<i64>(0).map_err(db_err),
        )
        .await?
        {
            Some(id) => id,
            None => {
                conn.execute(
                    "INSERT INTO subjects (subject_name) VALUES (?1)",
                    params![a.subject_name.as_str()],
                )
                .await
                .map_err(db_err)?;
                conn.last_insert_rowid()
            }
        };

        conn.execute(
            r#"
            INSERT INTO assignments (section_id, subject_id, title, description, deadline, created_by)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                a.section_id,
                subject_id,
                a.title.as_str(),
                a.description.clone(),
                a.deadline.to_rfc3339(),
                a.created_by
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    async fn edit_assignment_in(
        conn: &Connection,
        assignment_id: i64,
        changes: &AssignmentChanges,
        edited_by: i64,
    ) -> Result<(), DomainError> {
        let changed = conn
            .execute(
                r#"
                INSERT INTO assignment_edits
                    (assignment_id, old_title, old_description, old_deadline, edited_by)
                SELECT assignment_id, title, description, deadline, ?2
                FROM assignments WHERE assignment_id = ?1
                "#,
                params![assignment_id, edited_by],
            )
            .await
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound("الواجب غير موجود".into()));
        }
        conn.execute(
            r#"
            UPDATE assignments
            SET title = COALESCE(?1, title),
                description = COALESCE(?2, description),
                deadline = COALESCE(?3, deadline),
                is_edited = 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE assignment_id = ?4
            "#,
            params![
                changes.title.clone(),
                changes.description.clone(),
                changes.deadline.map(|d| d.to_rfc3339()),
                assignment_id
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AssignmentRepo for SqliteRepo {
    async fn create_assignment(&self, a: &NewAssignment) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        match Self::create_assignment_in(&tx, a).await {
            Ok(assignment_id) => {
                tx.commit().await.map_err(db_err)?;
                info!(assignment_id, section_id = a.section_id, "assignment created");
                Ok(assignment_id)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn get_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("{} WHERE a.assignment_id = ?1", ASSIGNMENT_SELECT);
        first_row(&conn, &sql, params![assignment_id], assignment_from_row).await
    }

    async fn list_section_assignments(
        &self,
        section_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<Assignment>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "{} WHERE a.section_id = ?1 AND (?2 = 1 OR a.is_active = 1) ORDER BY a.deadline DESC",
            ASSIGNMENT_SELECT
        );
        all_rows(
            &conn,
            &sql,
            params![section_id, include_inactive as i64],
            assignment_from_row,
        )
        .await
    }

    async fn edit_assignment(
        &self,
        assignment_id: i64,
        changes: &AssignmentChanges,
        edited_by: i64,
    ) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        match Self::edit_assignment_in(&tx, assignment_id, changes, edited_by).await {
            Ok(()) => {
                tx.commit().await.map_err(db_err)?;
                info!(assignment_id, edited_by, "assignment edited");
                Ok(())
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn deactivate_assignment(&self, assignment_id: i64) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE assignments SET is_active = 0 WHERE assignment_id = ?1",
                params![assignment_id],
            )
            .await
            .map_err(db_err)?;
        if changed == 0 {
            return Err(DomainError::NotFound("الواجب غير موجود".into()));
        }
        info!(assignment_id, "assignment deactivated");
        Ok(())
    }
}
