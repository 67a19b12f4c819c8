//! Error types for sigil-store

use thiserror::Error;

/// Result type alias for sigil-store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sigil-store
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Entity lookup failed
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind ("holder", "number", "user", "invitation")
        entity: &'static str,
        /// The ID that was looked up
        id: i64,
    },

    /// Email is already taken by an account or an accepted invitation
    #[error("email already registered: {0}")]
    DuplicateEmail(String),

    /// Registry number already exists
    #[error("number already exists: {0}")]
    DuplicateNumber(String),

    /// Number is already linked to a holder
    #[error("number {number} is already linked")]
    AlreadyLinked {
        /// The number that was being linked
        number: i64,
    },

    /// Number is not linked to the given holder
    #[error("number {number} is not linked to holder {holder}")]
    NotLinked {
        /// The number that was being unlinked
        number: i64,
        /// The holder it was expected to be linked to
        holder: i64,
    },

    /// Holder still has linked numbers and cannot be deleted
    #[error("holder {0} still has linked numbers")]
    HolderInUse(i64),

    /// Stored row could not be decoded into a domain type
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    /// Shorthand for a not-found failure.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Error::NotFound { entity, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let e = Error::not_found("holder", 7);
        assert_eq!(e.to_string(), "holder not found: 7");
    }

    #[test]
    fn test_not_linked_display() {
        let e = Error::NotLinked {
            number: 3,
            holder: 9,
        };
        assert_eq!(e.to_string(), "number 3 is not linked to holder 9");
    }
}
