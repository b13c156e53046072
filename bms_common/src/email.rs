use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Not a valid email address: {0}")]
pub struct EmailAddressError(String);

/// A lightly validated email address, normalised to lowercase so that lookups and
/// uniqueness checks are case-insensitive.
///
/// The validation is deliberately shallow (non-empty local part, a domain with at least one
/// dot, no whitespace). It exists to distinguish addresses from opaque federated subject
/// identifiers, not to police RFC 5321.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for EmailAddress {
    type Err = EmailAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = s.trim().to_ascii_lowercase();
        if candidate.contains(char::is_whitespace) {
            return Err(EmailAddressError(s.to_string()));
        }
        let Some((local, domain)) = candidate.split_once('@') else {
            return Err(EmailAddressError(s.to_string()));
        };
        let domain_ok = !domain.is_empty() &&
            domain.contains('.') &&
            !domain.starts_with('.') &&
            !domain.ends_with('.') &&
            !domain.contains('@');
        if local.is_empty() || !domain_ok {
            return Err(EmailAddressError(s.to_string()));
        }
        Ok(Self(candidate))
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = EmailAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::EmailAddress;

    #[test]
    fn accepts_and_normalises_ordinary_addresses() {
        let email = "Alice.Smith@Example.COM".parse::<EmailAddress>().unwrap();
        assert_eq!(email.as_str(), "alice.smith@example.com");
        assert_eq!(" bob@studio.example.jp ".parse::<EmailAddress>().unwrap().as_str(), "bob@studio.example.jp");
    }

    #[test]
    fn rejects_non_addresses() {
        assert!("".parse::<EmailAddress>().is_err());
        assert!("b0cdd6b1-9a06-4a97-9b3f-8c6a0a7c5f10".parse::<EmailAddress>().is_err());
        assert!("no-domain@".parse::<EmailAddress>().is_err());
        assert!("@no-local.example.com".parse::<EmailAddress>().is_err());
        assert!("dotless@example".parse::<EmailAddress>().is_err());
        assert!("spaced name@example.com".parse::<EmailAddress>().is_err());
    }

    #[test]
    fn serde_round_trip_enforces_validation() {
        let email: EmailAddress = serde_json::from_str("\"carol@example.com\"").unwrap();
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"carol@example.com\"");
        assert!(serde_json::from_str::<EmailAddress>("\"not an email\"").is_err());
    }
}
