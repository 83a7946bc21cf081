//! Text field normalization shared by department and employee inputs.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound for every free-text field, counted in characters.
pub const MAX_FIELD_CHARS: usize = 200;

/// Rejected text field input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Value is empty after trimming.
    Blank { field: &'static str },
    /// Value exceeds [`MAX_FIELD_CHARS`] after trimming.
    TooLong { field: &'static str, chars: usize },
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "{field} must not be blank"),
            Self::TooLong { field, chars } => write!(
                f,
                "{field} must be at most {MAX_FIELD_CHARS} characters, got {chars}"
            ),
        }
    }
}

impl Error for FieldError {}

/// Trims surrounding whitespace and enforces the non-empty / length rules.
pub fn normalize_field(field: &'static str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Blank { field });
    }
    let chars = trimmed.chars().count();
    if chars > MAX_FIELD_CHARS {
        return Err(FieldError::TooLong { field, chars });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_field, FieldError, MAX_FIELD_CHARS};

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            normalize_field("name", "  TrimmedName  ").unwrap(),
            "TrimmedName"
        );
    }

    #[test]
    fn rejects_whitespace_only() {
        assert_eq!(
            normalize_field("name", " \t\n ").unwrap_err(),
            FieldError::Blank { field: "name" }
        );
    }

    #[test]
    fn length_is_counted_in_characters() {
        let at_limit = "é".repeat(MAX_FIELD_CHARS);
        assert!(normalize_field("name", &at_limit).is_ok());

        let over = "x".repeat(MAX_FIELD_CHARS + 1);
        assert!(matches!(
            normalize_field("position", &over),
            Err(FieldError::TooLong { field: "position", chars }) if chars == MAX_FIELD_CHARS + 1
        ));
    }
}
