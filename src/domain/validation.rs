//! Input validation rules for names, codes, titles and deadlines.

use crate::domain::DomainError;
use chrono::{DateTime, Duration, TimeZone};

pub const MIN_NAME_CHARS: usize = 3;
pub const MAX_NAME_CHARS: usize = 100;
pub const MIN_TITLE_CHARS: usize = 3;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
/// Deadlines further out than this are rejected.
pub const MAX_DEADLINE_DAYS: i64 = 365;

pub const SECTION_CODE_PREFIX: &str = "SEC_";
pub const SECTION_CODE_LENGTH: usize = 12;

fn invalid(msg: &str) -> DomainError {
    DomainError::Validation(msg.to_string())
}

pub fn validate_telegram_id(telegram_id: i64) -> Result<(), DomainError> {
    if telegram_id > 0 {
        Ok(())
    } else {
        Err(invalid("معرف تلغرام غير صحيح"))
    }
}

/// Username is optional; when present it must be `@` followed by 5-32 of `[A-Za-z0-9_]`.
pub fn validate_username(username: Option<&str>) -> Result<(), DomainError> {
    let Some(u) = username.filter(|u| !u.is_empty()) else {
        return Ok(());
    };
    let ok = u.strip_prefix('@').is_some_and(|rest| {
        (5..=32).contains(&rest.len())
            && rest.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    });
    if ok {
        Ok(())
    } else {
        Err(invalid("اسم المستخدم غير صحيح"))
    }
}

pub fn validate_full_name(full_name: &str) -> Result<(), DomainError> {
    if full_name.trim().is_empty() {
        return Err(invalid("الاسم فارغ"));
    }
    let len = full_name.chars().count();
    if len < MIN_NAME_CHARS {
        return Err(invalid("الاسم قصير جداً (أقل من 3 أحرف)"));
    }
    if len > MAX_NAME_CHARS {
        return Err(invalid("الاسم طويل جداً (أكثر من 100 حرف)"));
    }
    Ok(())
}

/// `SEC_` followed by exactly 12 ASCII alphanumerics.
pub fn is_valid_section_code(code: &str) -> bool {
    code.strip_prefix(SECTION_CODE_PREFIX).is_some_and(|rest| {
        rest.len() == SECTION_CODE_LENGTH && rest.chars().all(|c| c.is_ascii_alphanumeric())
    })
}

pub fn validate_assignment_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(invalid("العنوان فارغ"));
    }
    let len = title.chars().count();
    if len < MIN_TITLE_CHARS {
        return Err(invalid("العنوان قصير جداً"));
    }
    if len > MAX_TITLE_CHARS {
        return Err(invalid("العنوان طويل جداً"));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), DomainError> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(invalid("الوصف طويل جداً (أكثر من 2000 حرف)"));
    }
    Ok(())
}

/// Deadline must be strictly after `now` and at most a year ahead.
pub fn validate_deadline<A: TimeZone, B: TimeZone>(
    deadline: &DateTime<A>,
    now: &DateTime<B>,
) -> Result<(), DomainError> {
    if deadline <= now {
        return Err(invalid("الموعد النهائي يجب أن يكون في المستقبل"));
    }
    let max = now.clone() + Duration::days(MAX_DEADLINE_DAYS);
    if *deadline > max {
        return Err(invalid("الموعد النهائي بعيد جداً (أكثر من سنة)"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn full_name_rules() {
        assert!(validate_full_name("أحمد محمد علي").is_ok());
        assert_eq!(
            validate_full_name("   "),
            Err(DomainError::Validation("الاسم فارغ".into()))
        );
        assert!(validate_full_name("أ").is_err());
        assert!(validate_full_name(&"س".repeat(101)).is_err());
        assert!(validate_full_name(&"س".repeat(100)).is_ok());
    }

    #[test]
    fn section_code_shape() {
        assert!(is_valid_section_code("SEC_A7bX9kL2pQ3m"));
        assert!(!is_valid_section_code("INVALID_CODE"));
        assert!(!is_valid_section_code("SEC_short"));
        assert!(!is_valid_section_code("SEC_A7bX9kL2pQ3-"));
    }

    #[test]
    fn username_is_optional_but_checked() {
        assert!(validate_username(None).is_ok());
        assert!(validate_username(Some("@student_01")).is_ok());
        assert!(validate_username(Some("student_01")).is_err());
        assert!(validate_username(Some("@abc")).is_err());
    }

    #[test]
    fn title_length_counts_chars_not_bytes() {
        assert!(validate_assignment_title("واجب المصفوفات").is_ok());
        assert!(validate_assignment_title("وا").is_err());
        assert!(validate_assignment_title(&"و".repeat(200)).is_ok());
        assert!(validate_assignment_title(&"و".repeat(201)).is_err());
    }

    #[test]
    fn deadline_window() {
        let now = Utc::now();
        assert!(validate_deadline(&(now + Duration::days(7)), &now).is_ok());
        assert!(validate_deadline(&(now - Duration::days(1)), &now).is_err());
        assert!(validate_deadline(&now, &now).is_err());
        assert!(validate_deadline(&(now + Duration::days(366)), &now).is_err());
    }

    #[test]
    fn telegram_id_positive() {
        assert!(validate_telegram_id(123456789).is_ok());
        assert!(validate_telegram_id(0).is_err());
        assert!(validate_telegram_id(-5).is_err());
    }
}
