//! Email address normalization.

use crate::error::{Error, Result};
use std::fmt;

/// A normalized email address.
///
/// Normalization (trim + ASCII lowercase) happens here and nowhere else, so
/// uniqueness checks and lookups can never disagree about what an address
/// looks like. Both registration and login must go through [`parse`].
///
/// [`parse`]: EmailAddress::parse
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse and normalize a raw address.
    ///
    /// Validation is deliberately shallow: one `@` separating a non-empty
    /// local part from a non-empty domain. Deliverability is the mail
    /// system's problem.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(Error::InvalidEmail("empty address".to_string()));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(Error::InvalidEmail(format!(
                "address contains whitespace: {normalized}"
            )));
        }

        let mut parts = normalized.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(Error::InvalidEmail(format!("not an address: {normalized}")));
        }

        Ok(Self(normalized))
    }

    /// Get the normalized address as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the normalized string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
