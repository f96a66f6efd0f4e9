//! Users: creation, profile updates, blocking, admin assignment and owner setup.

use crate::domain::entities::{features, ActivityType};
use crate::domain::permissions::{check_role, check_section_access};
use crate::domain::validation::{validate_full_name, validate_telegram_id};
use crate::domain::{DomainError, NewActivity, NewUser, User, UserType};
use crate::ports::{ActivityRepo, RegistrationRepo, SettingsRepo, UserRepo};
use std::sync::Arc;
use tracing::info;

pub struct UserService {
    users: Arc<dyn UserRepo>,
    registrations: Arc<dyn RegistrationRepo>,
    settings: Arc<dyn SettingsRepo>,
    activity: Arc<dyn ActivityRepo>,
}

/// `name` → `@name`; blank → None.
pub fn normalize_username(username: Option<&str>) -> Option<String> {
    let u = username?.trim();
    if u.is_empty() {
        return None;
    }
    Some(if u.starts_with('@') {
        u.to_string()
    } else {
        format!("@{}", u)
    })
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        registrations: Arc<dyn RegistrationRepo>,
        settings: Arc<dyn SettingsRepo>,
        activity: Arc<dyn ActivityRepo>,
    ) -> Self {
        Self {
            users,
            registrations,
            settings,
            activity,
        }
    }

    pub async fn get_user(&self, telegram_id: i64) -> Result<Option<User>, DomainError> {
        self.users.get_user(telegram_id).await
    }

    pub async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, DomainError> {
        self.users.get_user_by_id(user_id).await
    }

    /// Validate and insert. A known telegram id is a `Conflict`.
    pub async fn create_user(
        &self,
        telegram_id: i64,
        full_name: &str,
        user_type: UserType,
        username: Option<&str>,
    ) -> Result<i64, DomainError> {
        validate_telegram_id(telegram_id)?;
        let full_name = full_name.trim();
        validate_full_name(full_name)?;
        if self.users.get_user(telegram_id).await?.is_some() {
            return Err(DomainError::Conflict("المستخدم موجود مسبقاً".into()));
        }
        let user_id = self
            .users
            .create_user(&NewUser {
                telegram_id,
                full_name: full_name.to_string(),
                user_type,
                username: normalize_username(username),
            })
            .await?;
        info!(user_id, telegram_id, user_type = %user_type, "user created");
        Ok(user_id)
    }

    pub async fn update_user(
        &self,
        telegram_id: i64,
        full_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<(), DomainError> {
        if full_name.is_none() && username.is_none() {
            return Err(DomainError::Validation("لا توجد بيانات للتحديث".into()));
        }
        if let Some(name) = full_name {
            validate_full_name(name)?;
        }
        let username = normalize_username(username);
        let updated = self
            .users
            .update_user(telegram_id, full_name, username.as_deref())
            .await?;
        if !updated {
            return Err(DomainError::NotFound("المستخدم غير موجود".into()));
        }
        Ok(())
    }

    /// Block or unblock a student of one of the actor's sections.
    /// Requires the `student_blocking` feature.
    pub async fn set_student_blocked(
        &self,
        actor: &User,
        student_telegram_id: i64,
        blocked: bool,
    ) -> Result<(), DomainError> {
        check_role(Some(actor), UserType::Admin)?;
        if !self
            .settings
            .is_feature_enabled(features::STUDENT_BLOCKING)
            .await?
        {
            return Err(DomainError::PermissionDenied(
                "ميزة حظر الطلاب غير مفعلة".into(),
            ));
        }
        let student = self
            .users
            .get_user(student_telegram_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("المستخدم غير موجود".into()))?;
        if student.user_type != UserType::Student {
            return Err(DomainError::Validation("يمكن حظر الطلاب فقط".into()));
        }
        if actor.user_type != UserType::Owner {
            let section = self
                .registrations
                .student_section(student_telegram_id)
                .await?
                .ok_or_else(|| DomainError::NotFound("الطالب غير مسجل في أي شعبة".into()))?;
            check_section_access(actor, section.admin_id)?;
        }

        if !self.users.set_blocked(student_telegram_id, blocked).await? {
            return Err(DomainError::NotFound("المستخدم غير موجود".into()));
        }
        let (kind, details) = if blocked {
            (
                ActivityType::UserBlocked,
                format!("حظر المستخدم {}", student_telegram_id),
            )
        } else {
            (
                ActivityType::UserUnblocked,
                format!("إلغاء حظر المستخدم {}", student_telegram_id),
            )
        };
        self.activity
            .log_activity(&NewActivity::new(actor.user_id, kind, details).target("user", student_telegram_id))
            .await?;
        info!(student_telegram_id, blocked, by = actor.telegram_id, "student block state changed");
        Ok(())
    }

    /// Promote an existing non-owner to admin, or create a new admin.
    pub async fn assign_admin(
        &self,
        owner: &User,
        telegram_id: i64,
        full_name: &str,
    ) -> Result<User, DomainError> {
        check_role(Some(owner), UserType::Owner)?;
        validate_telegram_id(telegram_id)?;
        let full_name = full_name.trim();
        validate_full_name(full_name)?;

        match self.users.get_user(telegram_id).await? {
            Some(u) if u.user_type == UserType::Owner => {
                return Err(DomainError::Conflict("لا يمكن تغيير صلاحية المالك".into()));
            }
            Some(u) if u.user_type == UserType::Admin => {
                return Err(DomainError::Conflict("المستخدم أدمن بالفعل".into()));
            }
            Some(_) => {
                self.users
                    .set_user_type(telegram_id, UserType::Admin)
                    .await?;
            }
            None => {
                self.users
                    .create_user(&NewUser {
                        telegram_id,
                        full_name: full_name.to_string(),
                        user_type: UserType::Admin,
                        username: None,
                    })
                    .await?;
            }
        }

        let admin = self
            .users
            .get_user(telegram_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("المستخدم غير موجود".into()))?;
        self.activity
            .log_activity(
                &NewActivity::new(
                    owner.user_id,
                    ActivityType::AdminAssigned,
                    format!("تعيين أدمن: {}", admin.full_name),
                )
                .target("user", admin.user_id),
            )
            .await?;
        info!(telegram_id, "admin assigned");
        Ok(admin)
    }

    pub async fn list_admins(&self) -> Result<Vec<User>, DomainError> {
        self.users.list_users_by_type(UserType::Admin).await
    }

    /// Create the owner account. An existing account with this id is a `Conflict`.
    pub async fn setup_owner(
        &self,
        telegram_id: i64,
        full_name: &str,
        username: Option<&str>,
    ) -> Result<i64, DomainError> {
        self.create_user(telegram_id, full_name, UserType::Owner, username)
            .await
    }

    /// Make sure the configured owner exists. Returns true when it was created now.
    pub async fn ensure_owner(&self, telegram_id: i64, full_name: &str) -> Result<bool, DomainError> {
        match self.users.get_user(telegram_id).await? {
            Some(u) if u.user_type == UserType::Owner => Ok(false),
            Some(_) => {
                self.users
                    .set_user_type(telegram_id, UserType::Owner)
                    .await?;
                info!(telegram_id, "existing user promoted to owner");
                Ok(false)
            }
            None => {
                self.setup_owner(telegram_id, full_name, None).await?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_normalization() {
        assert_eq!(normalize_username(Some("ali_k")).as_deref(), Some("@ali_k"));
        assert_eq!(normalize_username(Some("@ali_k")).as_deref(), Some("@ali_k"));
        assert_eq!(normalize_username(Some("  ")), None);
        assert_eq!(normalize_username(None), None);
    }
}
