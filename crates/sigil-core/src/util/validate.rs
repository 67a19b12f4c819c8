//! Request input validation.
//!
//! Validation happens after normalization; everything here assumes its
//! input has already been through [`crate::util::normalize`].

use crate::error::{Error, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Check that an email has a plausible shape: exactly one `@` with
/// non-empty local and domain parts, and a dot somewhere in the domain.
pub fn validate_email(email: &str) -> Result<()> {
    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(Error::validation("email", "expected exactly one '@'")),
    };
    if local.is_empty() {
        return Err(Error::validation("email", "empty local part"));
    }
    if domain.is_empty() || !domain.contains('.') || domain.starts_with('.') {
        return Err(Error::validation("email", format!("bad domain '{domain}'")));
    }
    Ok(())
}

/// Check that a holder name is non-empty after trimming.
pub fn validate_holder_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }
    Ok(())
}

/// Check that a normalized registry number is non-empty.
pub fn validate_number(number: &str) -> Result<()> {
    if number.is_empty() {
        return Err(Error::validation("number", "must not be empty"));
    }
    Ok(())
}

/// Check that a password meets the minimum length.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(Error::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}
