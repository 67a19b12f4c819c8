//! Error types for sigil-core

use thiserror::Error;

/// Result type alias for sigil-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sigil-core
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input failed validation
    #[error("validation error on {field}: {message}")]
    Validation {
        /// Field that failed validation
        field: &'static str,
        /// What went wrong
        message: String,
    },
}

impl Error {
    /// Shorthand for a validation failure on a named field.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let e = Error::validation("email", "missing '@'");
        assert_eq!(e.to_string(), "validation error on email: missing '@'");
    }
}
