//! Input normalization.
//!
//! Emails and registry numbers arrive from operators in inconsistent case
//! and spacing. Both are normalized once, at the edge, so uniqueness checks
//! and lookups compare canonical forms.

/// Normalize an email address: trim and lowercase.
///
/// # Examples
///
/// ```
/// use sigil_core::util::normalize::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// assert_eq!(normalize_email("bob@registry.org"), "bob@registry.org");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalize a registry number to a canonical uppercase form.
///
/// Performs the following transformations:
/// 1. Trims leading/trailing whitespace
/// 2. Converts to uppercase
/// 3. Collapses internal whitespace runs into single hyphens
///
/// # Examples
///
/// ```
/// use sigil_core::util::normalize::normalize_number;
///
/// assert_eq!(normalize_number("sg 0001"), "SG-0001");
/// assert_eq!(normalize_number("  id  44 7 "), "ID-44-7");
/// assert_eq!(normalize_number("SG-0001"), "SG-0001");
/// ```
pub fn normalize_number(number: &str) -> String {
    number
        .trim()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // normalize_email tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_email_lowercases() {
        assert_eq!(normalize_email("Admin@Registry.ORG"), "admin@registry.org");
    }

    #[test]
    fn test_normalize_email_trims() {
        assert_eq!(normalize_email("  a@b.c  "), "a@b.c");
    }

    #[test]
    fn test_normalize_email_already_normal() {
        assert_eq!(normalize_email("a@b.c"), "a@b.c");
    }

    // -------------------------------------------------------------------------
    // normalize_number tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_normalize_number_uppercases() {
        assert_eq!(normalize_number("sg-0001"), "SG-0001");
    }

    #[test]
    fn test_normalize_number_collapses_whitespace() {
        assert_eq!(normalize_number("sg   0001"), "SG-0001");
    }

    #[test]
    fn test_normalize_number_trims() {
        assert_eq!(normalize_number("  SG-9  "), "SG-9");
    }

    #[test]
    fn test_normalize_number_empty() {
        assert_eq!(normalize_number(""), "");
        assert_eq!(normalize_number("   "), "");
    }

    #[test]
    fn test_normalize_number_keeps_existing_hyphens() {
        assert_eq!(normalize_number("ab-1 cd-2"), "AB-1-CD-2");
    }
}
