//! # idreg-core: Foundational Types for the Identity Registry
//!
//! Leaf crate of the workspace. Every other `idreg-*` crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `Address`, `ExternalId`,
//!    `TokenId`, and `Email` are distinct types with validated constructors.
//!    A holder address cannot be passed where a token identifier is expected.
//!
//! 2. **Logical time.** `BlockHeight` is the host-supplied, monotonically
//!    increasing counter stamped on graduations and audit events. Wall-clock
//!    `Timestamp` is informational only.
//!
//! 3. **`CanonicalBytes` newtype.** All digest computation flows through
//!    `CanonicalBytes::new()`; `sha256_digest()` accepts nothing else.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `idreg-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, ValidationError};
pub use identity::{Address, Email, ExternalId, TokenId};
pub use temporal::{BlockHeight, Timestamp};
