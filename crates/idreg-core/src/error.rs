//! # Error Types
//!
//! Validation and canonicalization failures for the primitives in this crate.
//! Higher layers wrap these in their own `thiserror` enums.

use thiserror::Error;

/// A domain primitive was rejected at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is empty or contains whitespace.
    #[error("invalid address: \"{0}\" (expected a non-empty token without whitespace)")]
    InvalidAddress(String),

    /// External identifier is empty or contains whitespace.
    #[error("invalid external id: \"{0}\" (expected a non-empty identifier without whitespace)")]
    InvalidExternalId(String),

    /// Email is not of the form `local@domain`.
    #[error("invalid email format: \"{0}\" (expected local@domain)")]
    InvalidEmailFormat(String),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values have no deterministic canonical form.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
