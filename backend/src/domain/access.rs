//! Email address value object and the access gate decision.

use std::fmt;

use thiserror::Error;

const MAX_EMAIL_LEN: usize = 254;

/// Validation errors for [`EmailAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmailValidationError {
    /// Nothing left after trimming.
    #[error("email address must not be empty")]
    Empty,
    /// Longer than 254 characters.
    #[error("email address must be at most {max} characters")]
    TooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Not of the form `local@domain.tld`.
    #[error("email address is malformed")]
    Malformed,
}

/// Normalised email address: trimmed and lowercased.
///
/// # Examples
/// ```
/// use pixel_onboarding::domain::EmailAddress;
///
/// let email = EmailAddress::parse("  Ana@Example.COM ").expect("valid address");
/// assert_eq!(email.as_str(), "ana@example.com");
/// assert_eq!(email.domain(), "example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise a raw address.
    pub fn parse(raw: &str) -> Result<Self, EmailValidationError> {
        let normalised = raw.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(EmailValidationError::Empty);
        }
        if normalised.chars().count() > MAX_EMAIL_LEN {
            return Err(EmailValidationError::TooLong { max: MAX_EMAIL_LEN });
        }
        let Some((local, domain)) = normalised.split_once('@') else {
            return Err(EmailValidationError::Malformed);
        };
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !domain.contains('@');
        if local.is_empty() || !domain_ok || normalised.chars().any(char::is_whitespace) {
            return Err(EmailValidationError::Malformed);
        }
        Ok(Self(normalised))
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The part after `@`.
    pub fn domain(&self) -> &str {
        self.0
            .split_once('@')
            .map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an access gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The address may proceed to log in.
    Granted,
    /// The address is not permitted.
    Denied {
        /// User-facing explanation.
        reason: String,
    },
}

impl AccessDecision {
    /// Whether access was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("user@example.com", "user@example.com")]
    #[case("  User@Example.Com\n", "user@example.com")]
    #[case("first.last+tag@sub.example.co.uk", "first.last+tag@sub.example.co.uk")]
    fn accepts_and_normalises(#[case] raw: &str, #[case] expected: &str) {
        let email = EmailAddress::parse(raw).expect("valid address");
        assert_eq!(email.as_str(), expected);
    }

    #[rstest]
    #[case("", EmailValidationError::Empty)]
    #[case("   ", EmailValidationError::Empty)]
    #[case("no-at-sign", EmailValidationError::Malformed)]
    #[case("@example.com", EmailValidationError::Malformed)]
    #[case("user@localhost", EmailValidationError::Malformed)]
    #[case("user@@example.com", EmailValidationError::Malformed)]
    #[case("us er@example.com", EmailValidationError::Malformed)]
    #[case("user@example.", EmailValidationError::Malformed)]
    fn rejects_malformed_addresses(#[case] raw: &str, #[case] expected: EmailValidationError) {
        assert_eq!(EmailAddress::parse(raw), Err(expected));
    }

    #[rstest]
    fn rejects_overlong_addresses() {
        let raw = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            EmailAddress::parse(&raw),
            Err(EmailValidationError::TooLong { max: 254 })
        );
    }
}
