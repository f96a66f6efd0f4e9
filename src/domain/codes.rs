//! Section join-code generation.

use crate::domain::validation::{SECTION_CODE_LENGTH, SECTION_CODE_PREFIX};
use uuid::Uuid;

/// Attempts before giving up on finding an unused code.
pub const MAX_CODE_GENERATION_ATTEMPTS: usize = 10;

/// Random join code: `SEC_` + 12 alphanumerics (hex digits of a v4 UUID).
pub fn generate_section_code() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{}{}", SECTION_CODE_PREFIX, &simple[..SECTION_CODE_LENGTH])
}
