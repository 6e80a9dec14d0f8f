//! Field validation shared by all record types.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum length of name/title columns.
pub const MAX_NAME_CHARS: usize = 255;

/// Field-level validation failure raised before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty { field: &'static str },
    TooLong { field: &'static str, max_chars: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max_chars } => {
                write!(f, "{field} must be at most {max_chars} characters")
            }
        }
    }
}

impl Error for ValidationError {}

/// Rejects blank values and values longer than [`MAX_NAME_CHARS`].
pub fn validate_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::TooLong {
            field,
            max_chars: MAX_NAME_CHARS,
        });
    }
    Ok(())
}
