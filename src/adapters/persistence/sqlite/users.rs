use super::{all_rows, db_err, first_row, user_from_row, write_err, SqliteRepo, USER_COLUMNS};
use crate::domain::{DomainError, NewUser, User, UserType};
use crate::ports::UserRepo;
use libsql::params;
use tracing::info;

#[async_trait::async_trait]
impl UserRepo for SqliteRepo {
    async fn create_user(&self, user: &NewUser) -> Result<i64, DomainError> {
        let conn = self.conn().await?;
        conn.execute(
            r#"
            INSERT INTO users (telegram_id, username, full_name, user_type)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                user.telegram_id,
                user.username.clone(),
                user.full_name.as_str(),
                user.user_type.as_str()
            ],
        )
        .await
        .map_err(|e| write_err(e, "المستخدم موجود مسبقاً"))?;
        let user_id = conn.last_insert_rowid();
        info!(
            user_id,
            telegram_id = user.telegram_id,
            user_type = %user.user_type,
            "user created"
        );
        Ok(user_id)
    }

    async fn get_user(&self, telegram_id: i64) -> Result<Option<User>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM users u WHERE u.telegram_id = ?1", USER_COLUMNS);
        first_row(&conn, &sql, params![telegram_id], user_from_row).await
    }

    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!("SELECT {} FROM users u WHERE u.user_id = ?1", USER_COLUMNS);
        first_row(&conn, &sql, params![user_id], user_from_row).await
    }

    async fn update_user(
        &self,
        telegram_id: i64,
        full_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                r#"
                UPDATE users
                SET full_name = COALESCE(?1, full_name),
                    username = COALESCE(?2, username),
                    last_active = CURRENT_TIMESTAMP
                WHERE telegram_id = ?3
                "#,
                params![full_name, username, telegram_id],
            )
            .await
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn set_blocked(&self, telegram_id: i64, blocked: bool) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE users SET is_blocked = ?1 WHERE telegram_id = ?2",
                params![blocked as i64, telegram_id],
            )
            .await
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn set_user_type(
        &self,
        telegram_id: i64,
        user_type: UserType,
    ) -> Result<bool, DomainError> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "UPDATE users SET user_type = ?1, is_active = 1 WHERE telegram_id = ?2",
                params![user_type.as_str(), telegram_id],
            )
            .await
            .map_err(db_err)?;
        Ok(changed > 0)
    }

    async fn list_users_by_type(&self, user_type: UserType) -> Result<Vec<User>, DomainError> {
        let conn = self.conn().await?;
        let sql = format!(
            "SELECT {} FROM users u WHERE u.user_type = ?1 AND u.is_active = 1 ORDER BY u.full_name",
            USER_COLUMNS
        );
        all_rows(&conn, &sql, params![user_type.as_str()], user_from_row).await
    }
}
