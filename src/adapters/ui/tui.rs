//! Inquire-based prompts for `setup-owner`.

use crate::domain::validation::validate_full_name;
use crate::domain::DomainError;
use inquire::validator::Validation;
use inquire::{Confirm, Text};

/// Answers collected by `prompt_owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerAnswers {
    pub telegram_id: i64,
    pub full_name: String,
    pub username: Option<String>,
}

fn prompt_err(e: inquire::InquireError) -> DomainError {
    DomainError::Validation(e.to_string())
}

fn digits_only(input: &str) -> Validation {
    let t = input.trim();
    if !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()) && t.parse::<i64>().is_ok() {
        Validation::Valid
    } else {
        Validation::Invalid("Telegram ID يجب أن يكون أرقام فقط".into())
    }
}

fn min_name(input: &str) -> Validation {
    match validate_full_name(input.trim()) {
        Ok(()) => Validation::Valid,
        Err(e) => Validation::Invalid(e.to_string().into()),
    }
}

/// Ask for the owner's telegram id, name and optional username.
/// Returns None when the operator declines the confirmation.
pub fn prompt_owner() -> Result<Option<OwnerAnswers>, DomainError> {
    let id = Text::new("Telegram ID الخاص بك:")
        .with_help_message("احصل عليه من @userinfobot")
        .with_validator(|s: &str| Ok(digits_only(s)))
        .prompt()
        .map_err(prompt_err)?;
    let telegram_id = id
        .trim()
        .parse::<i64>()
        .map_err(|_| DomainError::Validation("Telegram ID غير صحيح".into()))?;

    let full_name = Text::new("اسمك الكامل:")
        .with_validator(|s: &str| Ok(min_name(s)))
        .prompt()
        .map_err(prompt_err)?
        .trim()
        .to_string();

    let username = Text::new("Username (اختياري):")
        .prompt_skippable()
        .map_err(prompt_err)?
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let summary = format!(
        "Telegram ID: {}\nالاسم: {}\nUsername: {}\n\nهل البيانات صحيحة؟",
        telegram_id,
        full_name,
        username.as_deref().unwrap_or("-")
    );
    let confirmed = Confirm::new(&summary)
        .with_default(true)
        .prompt()
        .map_err(prompt_err)?;

    Ok(confirmed.then_some(OwnerAnswers {
        telegram_id,
        full_name,
        username,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_prompt_accepts_digits_only() {
        assert!(matches!(digits_only(" 123456789 "), Validation::Valid));
        assert!(matches!(digits_only("12a"), Validation::Invalid(_)));
        assert!(matches!(digits_only("-5"), Validation::Invalid(_)));
        assert!(matches!(digits_only(""), Validation::Invalid(_)));
    }

    #[test]
    fn name_prompt_needs_three_chars() {
        assert!(matches!(min_name("علي كريم"), Validation::Valid));
        assert!(matches!(min_name("ab"), Validation::Invalid(_)));
    }
}
