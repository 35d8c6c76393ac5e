//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers the registry indexes.
//! Each identifier is a distinct type: a holder [`Address`] cannot be passed
//! where a [`TokenId`] is expected, and an [`Email`] cannot be confused with
//! an [`ExternalId`].
//!
//! ## Validation
//!
//! All four types validate at construction and again on deserialization
//! (`#[serde(try_from = "String")]`), so a value loaded from a state file is
//! held to the same rules as one built in code.
//!
//! The institutional domain check on [`Email`] is not done here; the suffix is
//! registry configuration, and the registry applies it at issuance.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

fn is_plain_token(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An opaque principal identifier supplied by the hosting environment.
///
/// Used both for callers (authorization) and for token holders. The registry
/// never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Construct an address, rejecting empty or whitespace-bearing input.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if !is_plain_token(&s) {
            return Err(ValidationError::InvalidAddress(s));
        }
        Ok(Self(s))
    }

    /// Access the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.0
    }
}

impl FromStr for Address {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ExternalId
// ---------------------------------------------------------------------------

/// The caller-supplied unique identifier of a subject, e.g. a student
/// number such as `2021/0001`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// Construct an external id, rejecting empty or whitespace-bearing input.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if !is_plain_token(&s) {
            return Err(ValidationError::InvalidExternalId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExternalId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> String {
        id.0
    }
}

impl FromStr for ExternalId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// TokenId
// ---------------------------------------------------------------------------

/// Primary key of an issued record.
///
/// Only constructible from an [`ExternalId`], so every token identifier in
/// the system is derivable from the external id alone. The two are textually
/// equal; keeping them as separate types stops index lookups from mixing
/// them up.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenId(String);

impl TokenId {
    /// Derive the token identifier for an external id.
    pub fn from_external_id(id: &ExternalId) -> Self {
        Self(id.0.clone())
    }

    /// Access the token identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&ExternalId> for TokenId {
    fn from(id: &ExternalId) -> Self {
        Self::from_external_id(id)
    }
}

impl TryFrom<String> for TokenId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ExternalId::new(s).map(|id| Self(id.0))
    }
}

impl From<TokenId> for String {
    fn from(t: TokenId) -> String {
        t.0
    }
}

impl FromStr for TokenId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// An email address of the form `local@domain`.
///
/// Stored verbatim. Uniqueness is exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Construct an email, requiring exactly one `@` with non-empty parts on
    /// both sides and no whitespace.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let well_formed = is_plain_token(&s)
            && match s.split_once('@') {
                Some((local, domain)) => {
                    !local.is_empty() && !domain.is_empty() && !domain.contains('@')
                }
                None => false,
            };
        if !well_formed {
            return Err(ValidationError::InvalidEmailFormat(s));
        }
        Ok(Self(s))
    }

    /// Whether the address ends with the given domain suffix (e.g. `@raf.rs`).
    pub fn has_domain_suffix(&self, suffix: &str) -> bool {
        !suffix.is_empty() && self.0.ends_with(suffix)
    }

    /// Access the email as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Email> for String {
    fn from(e: Email) -> String {
        e.0
    }
}

impl FromStr for Email {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_rejects_empty_and_whitespace() {
        assert!(Address::new("").is_err());
        assert!(Address::new("g1 abc").is_err());
        assert!(Address::new("g1abc").is_ok());
    }

    #[test]
    fn external_id_accepts_student_number() {
        let id = ExternalId::new("2021/0001").unwrap();
        assert_eq!(id.as_str(), "2021/0001");
        assert_eq!(id.to_string(), "2021/0001");
    }

    #[test]
    fn token_id_is_derived_from_external_id() {
        let id = ExternalId::new("2021/0001").unwrap();
        let token = TokenId::from_external_id(&id);
        assert_eq!(token.as_str(), id.as_str());
        assert_eq!(TokenId::from(&id), token);
    }

    #[test]
    fn token_id_parse_applies_external_id_rules() {
        assert!("".parse::<TokenId>().is_err());
        assert_eq!("2021/0002".parse::<TokenId>().unwrap().as_str(), "2021/0002");
    }

    #[test]
    fn email_requires_single_at_sign() {
        assert!(Email::new("john@raf.rs").is_ok());
        assert!(Email::new("john.raf.rs").is_err());
        assert!(Email::new("@raf.rs").is_err());
        assert!(Email::new("john@").is_err());
        assert!(Email::new("john@a@raf.rs").is_err());
        assert!(Email::new("jo hn@raf.rs").is_err());
    }

    #[test]
    fn email_domain_suffix() {
        let email = Email::new("john@raf.rs").unwrap();
        assert!(email.has_domain_suffix("@raf.rs"));
        assert!(!email.has_domain_suffix("@gmail.com"));
        assert!(!email.has_domain_suffix(""));
    }

    #[test]
    fn deserialization_revalidates() {
        let bad: Result<Address, _> = serde_json::from_str("\"\"");
        assert!(bad.is_err());
        let good: Email = serde_json::from_str("\"ana@raf.rs\"").unwrap();
        assert_eq!(good.as_str(), "ana@raf.rs");
    }

    #[test]
    fn serializes_as_plain_string() {
        let addr = Address::new("g1admin").unwrap();
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"g1admin\"");
    }
}
