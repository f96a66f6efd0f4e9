//! Role and section-ownership checks. Owner passes everything.

use crate::domain::entities::{User, UserType};
use crate::domain::DomainError;

fn denied(msg: impl Into<String>) -> DomainError {
    DomainError::PermissionDenied(msg.into())
}

/// Require `required` (or owner). Missing, inactive and blocked users are refused.
pub fn check_role(user: Option<&User>, required: UserType) -> Result<&User, DomainError> {
    let user = user.ok_or_else(|| denied("المستخدم غير موجود"))?;
    if !user.is_active {
        return Err(denied("الحساب غير نشط"));
    }
    if user.is_blocked {
        return Err(denied("أنت محظور من استخدام البوت"));
    }
    if user.user_type == UserType::Owner || user.user_type == required {
        Ok(user)
    } else {
        Err(denied(format!("تحتاج إلى صلاحية {}", required)))
    }
}

/// Owner manages every section; an admin only the sections whose `admin_id` is theirs.
pub fn check_section_access(user: &User, section_admin_id: Option<i64>) -> Result<(), DomainError> {
    if user.user_type == UserType::Owner {
        return Ok(());
    }
    if section_admin_id == Some(user.user_id) {
        Ok(())
    } else {
        Err(denied("ليس لديك صلاحية على هذه الشعبة"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(user_type: UserType) -> User {
        User {
            user_id: 7,
            telegram_id: 700,
            username: None,
            full_name: "مستخدم".into(),
            user_type,
            is_active: true,
            is_blocked: false,
        }
    }

    #[test]
    fn owner_passes_every_role() {
        let owner = user(UserType::Owner);
        assert!(check_role(Some(&owner), UserType::Admin).is_ok());
        assert!(check_role(Some(&owner), UserType::Student).is_ok());
        assert!(check_section_access(&owner, None).is_ok());
    }

    #[test]
    fn role_must_match() {
        let student = user(UserType::Student);
        let err = check_role(Some(&student), UserType::Admin).unwrap_err();
        assert_eq!(err, DomainError::PermissionDenied("تحتاج إلى صلاحية admin".into()));
        assert!(check_role(None, UserType::Student).is_err());
    }

    #[test]
    fn blocked_and_inactive_are_refused() {
        let mut admin = user(UserType::Admin);
        admin.is_blocked = true;
        assert!(check_role(Some(&admin), UserType::Admin).is_err());
        admin.is_blocked = false;
        admin.is_active = false;
        assert!(check_role(Some(&admin), UserType::Admin).is_err());
    }

    #[test]
    fn admin_only_owns_own_sections() {
        let admin = user(UserType::Admin);
        assert!(check_section_access(&admin, Some(7)).is_ok());
        assert!(check_section_access(&admin, Some(8)).is_err());
        assert!(check_section_access(&admin, None).is_err());
    }
}
