//! Audit trail, notification delivery log and aggregate statistics.

use super::{activity_from_row, all_rows, count, db_err, first_row, SqliteRepo};
use crate::domain::{
    Activity, AdminStats, DeliveryStatus, DomainError, NewActivity, NotificationStats,
    NotificationType, OwnerStats,
};
use crate::ports::{ActivityRepo, NotificationLog, StatsRepo};
use libsql::params;

#[async_trait::async_trait]
impl NotificationLog for SqliteRepo {
    async fn log_notification(
        &self,
        assignment_id: i64,
        student_id: i64,
        kind: NotificationType,
        status: DeliveryStatus,
    ) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO assignment_notifications
                (assignment_id, student_id, notification_type, delivery_status)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![assignment_id, student_id, kind.as_str(), status.as_str()],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn notification_stats(
        &self,
        assignment_id: i64,
    ) -> Result<NotificationStats, DomainError> {
        let conn = self.conn().await?;
        let stats = first_row(
            &conn,
            r#"
            SELECT COUNT(*),
                   SUM(CASE WHEN delivery_status = 'sent' THEN 1 ELSE 0 END),
                   SUM(CASE WHEN delivery_status = 'failed' THEN 1 ELSE 0 END),
                   SUM(CASE WHEN delivery_status = 'blocked' THEN 1 ELSE 0 END)
            FROM assignment_notifications
            WHERE assignment_id = ?1
            "#,
            params![assignment_id],
            |row| {
                let get = |idx: i32| -> Result<i64, DomainError> {
                    Ok(row.get::<Option<i64>>(idx).map_err(db_err)?.unwrap_or(0))
                };
                Ok(NotificationStats {
                    total: get(0)?,
                    sent: get(1)?,
                    failed: get(2)?,
                    blocked: get(3)?,
                })
            },
        )
        .await?;
        Ok(stats.unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl ActivityRepo for SqliteRepo {
    async fn log_activity(&self, activity: &NewActivity) -> Result<(), DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO activity_logs (user_id, action_type, action_details, target_type, target_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                activity.user_id,
                activity.action_type.as_str(),
                activity.details.clone(),
                activity.target_type.clone(),
                activity.target_id
            ],
        )
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn recent_activities(&self, limit: u32) -> Result<Vec<Activity>, DomainError> {
        let conn = self.conn().await?;
        all_rows(
            &conn,
            r#"
            SELECT al.log_id, al.user_id, al.action_type, al.action_details, al.target_type,
                   al.target_id, al.created_at, u.full_name, u.user_type
            FROM activity_logs al
            LEFT JOIN users u ON al.user_id = u.user_id
            ORDER BY al.created_at DESC, al.log_id DESC
            LIMIT ?1
            "#,
            params![limit as i64],
            activity_from_row,
        )
        .await
    }
}

/// Active sections owned by the admin with telegram id `?1`.
const ADMIN_SECTION_IDS: &str = r#"
    SELECT s.section_id FROM sections s
    JOIN users u ON s.admin_id = u.user_id
    WHERE u.telegram_id = ?1 AND s.is_active = 1
"#;

#[async_trait::async_trait]
impl StatsRepo for SqliteRepo {
    async fn owner_stats(&self) -> Result<OwnerStats, DomainError> {
        let conn = self.conn().await?;
        Ok(OwnerStats {
            sections_count: count(&conn, "SELECT COUNT(*) FROM sections WHERE is_active = 1", ())
                .await?,
            students_count: count(
                &conn,
                r#"
                SELECT COUNT(DISTINCT student_id) FROM student_sections
                WHERE registration_status = 'approved' AND is_active = 1
                "#,
                (),
            )
            .await?,
            pending_count: count(
                &conn,
                "SELECT COUNT(*) FROM student_sections WHERE registration_status = 'pending'",
                (),
            )
            .await?,
            assignments_count: count(
                &conn,
                "SELECT COUNT(*) FROM assignments WHERE is_active = 1",
                (),
            )
            .await?,
            admins_count: count(
                &conn,
                "SELECT COUNT(*) FROM users WHERE user_type = 'admin' AND is_active = 1",
                (),
            )
            .await?,
        })
    }

    async fn admin_stats(&self, admin_telegram_id: i64) -> Result<Option<AdminStats>, DomainError> {
        let conn = self.conn().await?;
        let sections_count = count(
            &conn,
            &format!("SELECT COUNT(*) FROM ({})", ADMIN_SECTION_IDS),
            params![admin_telegram_id],
        )
        .await?;
        if sections_count == 0 {
            return Ok(None);
        }
        let students_count = count(
            &conn,
            &format!(
                r#"
                SELECT COUNT(*) FROM student_sections
                WHERE section_id IN ({})
                  AND registration_status = 'approved'
                  AND is_active = 1
                "#,
                ADMIN_SECTION_IDS
            ),
            params![admin_telegram_id],
        )
        .await?;
        let pending_count = count(
            &conn,
            &format!(
                r#"
                SELECT COUNT(*) FROM student_sections
                WHERE section_id IN ({}) AND registration_status = 'pending'
                "#,
                ADMIN_SECTION_IDS
            ),
            params![admin_telegram_id],
        )
        .await?;
        let assignments_count = count(
            &conn,
            &format!(
                "SELECT COUNT(*) FROM assignments WHERE section_id IN ({}) AND is_active = 1",
                ADMIN_SECTION_IDS
            ),
            params![admin_telegram_id],
        )
        .await?;
        Ok(Some(AdminStats {
            sections_count,
            students_count,
            pending_count,
            assignments_count,
        }))
    }
}
