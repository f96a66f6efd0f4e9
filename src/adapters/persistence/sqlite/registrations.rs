use super::{
    all_rows, count, db_err, first_row, section_from_row, student_from_row, SqliteRepo,
    SECTION_SELECT,
};
use crate::domain::entities::{ActivityType, Decision, RegistrationStatus};
use crate::domain::{DomainError, NewRegistration, Section, StudentEntry, UserType};
use crate::ports::RegistrationRepo;
use libsql::{params, Connection};
use tracing::{info, warn};

impl SqliteRepo {
    /// Body of `register`; runs inside the caller's transaction.
    async fn register_in(conn: &Connection, reg: &NewRegistration) -> Result<i64, DomainError> {
        let max_students = first_row(
            conn,
            "SELECT max_students FROM sections WHERE section_id = ?1 AND is_active = 1",
            params![reg.section_id],
            |row| row.get::<Option<i64>>(0).map_err(db_err),
        )
        .await?
        .ok_or_else(|| DomainError::NotFound("كود الشعبة غير صحيح".into()))?
        .unwrap_or(50);

        let approved = count(
            conn,
            "SELECT COUNT(*) FROM student_sections WHERE section_id = ?1 AND registration_status = 'approved'",
            params![reg.section_id],
        )
        .await?;
        if approved >= max_students {
            return Err(DomainError::Conflict("الشعبة ممتلئة".into()));
        }

        let existing = first_row(
            conn,
            "SELECT user_id FROM users WHERE telegram_id = ?1",
            params![reg.telegram_id],
            |row| row.get::<i64>(0).map_err(db_err),
        )
        .await?;
        let student_id = match existing {
            Some(id) => id,
            None => {
                conn.execute(
                    r#"
                    INSERT INTO users (telegram_id, username, full_name, user_type)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        reg.telegram_id,
                        reg.username.clone(),
                        reg.full_name.as_str(),
                        UserType::Student.as_str()
                    ],
                )
                .await
                .map_err(db_err)?;
                conn.last_insert_rowid()
            }
        };

        if let Some(status) = first_row(
            conn,
            "SELECT registration_status FROM student_sections WHERE student_id = ?1 AND section_id = ?2",
            params![student_id, reg.section_id],
            |row| row.get::<String>(0).map_err(db_err),
        )
        .await?
        {
            let msg = match RegistrationStatus::parse(&status) {
                Some(RegistrationStatus::Pending) => "لديك طلب تسجيل معلق",
                Some(RegistrationStatus::Approved) => "أنت مسجل بالفعل في هذه الشعبة",
                Some(RegistrationStatus::Rejected) => "تم رفض طلبك سابقاً. تواصل مع الأدمن",
                None => "لديك طلب تسجيل سابق",
            };
            return Err(DomainError::Conflict(msg.into()));
        }

        conn.execute(
            r#"
            INSERT INTO student_sections (student_id, section_id, registration_status)
            VALUES (?1, ?2, 'pending')
            "#,
            params![student_id, reg.section_id],
        )
        .await
        .map_err(db_err)?;

        conn.execute(
            r#"
            INSERT INTO activity_logs (user_id, action_type, action_details, target_type, target_id)
            VALUES (?1, ?2, ?3, 'section', ?4)
            "#,
            params![
                student_id,
                ActivityType::RegistrationRequested.as_str(),
                format!("طلب التسجيل في الشعبة {}", reg.section_id),
                reg.section_id
            ],
        )
        .await
        .map_err(db_err)?;

        Ok(student_id)
    }
}

#[async_trait::async_trait]
impl RegistrationRepo for SqliteRepo {
    async fn register(&self, reg: &NewRegistration) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        let tx = conn.transaction().await.map_err(db_err)?;
        match Self::register_in(&tx, reg).await {
            Ok(student_id) => {
                tx.commit().await.map_err(db_err)?;
                info!(
                    student_id,
                    section_id = reg.section_id,
                    "registration request stored"
                );
                Ok(student_id)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn decide(
        &self,
        student_telegram_id: i64,
        section_id: i64,
        decision: Decision,
        decided_by: i64,
    ) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        let student_id = first_row(
            &conn,
            "SELECT user_id FROM users WHERE telegram_id = ?1",
            params![student_telegram_id],
            |row| row.get::<i64>(0).map_err(db_err),
        )
        .await?
        .ok_or_else(|| DomainError::NotFound("الطالب غير موجود".into()))?;

        let changed = match decision {
            Decision::Approve => conn
                .execute(
                    r#"
                    UPDATE student_sections
                    SET registration_status = 'approved',
                        approved_at = CURRENT_TIMESTAMP,
                        approved_by = ?1
                    WHERE student_id = ?2 AND section_id = ?3 AND registration_status = 'pending'
                    "#,
                    params![decided_by, student_id, section_id],
                )
                .await
                .map_err(db_err)?,
            Decision::Reject => conn
                .execute(
                    r#"
                    UPDATE student_sections
                    SET registration_status = 'rejected'
                    WHERE student_id = ?1 AND section_id = ?2 AND registration_status = 'pending'
                    "#,
                    params![student_id, section_id],
                )
                .await
                .map_err(db_err)?,
        };
        if changed == 0 {
            return Err(DomainError::NotFound(
                "الطلب غير موجود أو تمت معالجته مسبقاً".into(),
            ));
        }
        info!(student_id, section_id, ?decision, "registration decided");
        Ok(student_id)
    }

    async fn list_pending(&self, section_id: i64) -> Result<Vec<StudentEntry>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            r#"
            SELECT u.user_id, u.telegram_id, u.full_name, u.username, u.is_blocked,
                   ss.registration_status, ss.registered_at
            FROM student_sections ss
            JOIN users u ON ss.student_id = u.user_id
            WHERE ss.section_id = ?1 AND ss.registration_status = 'pending'
            ORDER BY ss.registered_at DESC, ss.student_section_id DESC
            "#,
            params![section_id],
            student_from_row,
        )
        .await
    }

    async fn list_approved(&self, section_id: i64) -> Result<Vec<StudentEntry>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            r#"
            SELECT u.user_id, u.telegram_id, u.full_name, u.username, u.is_blocked,
                   ss.registration_status, ss.approved_at
            FROM student_sections ss
            JOIN users u ON ss.student_id = u.user_id
            WHERE ss.section_id = ?1
              AND ss.registration_status = 'approved'
              AND ss.is_active = 1
              AND u.is_blocked = 0
            ORDER BY u.full_name
            "#,
            params![section_id],
            student_from_row,
        )
        .await
    }

    async fn list_blocked(&self, section_id: i64) -> Result<Vec<StudentEntry>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            r#"
            SELECT u.user_id, u.telegram_id, u.full_name, u.username, u.is_blocked,
                   ss.registration_status, ss.approved_at
            FROM student_sections ss
            JOIN users u ON ss.student_id = u.user_id
            WHERE ss.section_id = ?1
              AND ss.registration_status = 'approved'
              AND ss.is_active = 1
              AND u.is_blocked = 1
            ORDER BY u.full_name
            "#,
            params![section_id],
            student_from_row,
        )
        .await
    }

    async fn student_section(&self, telegram_id: i64) -> Result<Option<Section>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            r#"{}
            JOIN student_sections ss ON ss.section_id = s.section_id
            JOIN users st ON ss.student_id = st.user_id
            WHERE st.telegram_id = ?1
              AND ss.registration_status = 'approved'
              AND ss.is_active = 1
            LIMIT 1"#,
            SECTION_SELECT
        );
        first_row(&conn, &sql, params![telegram_id], section_from_row).await
    }

    async fn approved_count(&self, section_id: i64) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        count(
            &conn,
            "SELECT COUNT(*) FROM student_sections WHERE section_id = ?1 AND registration_status = 'approved'",
            params![section_id],
        )
        .await
    }
}
