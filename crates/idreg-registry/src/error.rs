//! # Registry Errors
//!
//! Every failure a registry call can return. Each variant is raised before
//! any store is touched, so an `Err` always means "nothing changed".
//!
//! [`RegistryError::kind`] folds the variants into the coarse taxonomy
//! callers branch on.

use thiserror::Error;

use idreg_core::{Address, Email, ExternalId, TokenId, ValidationError};
use idreg_state::LifecycleError;

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller lacks admin rights.
    Unauthorized,
    /// The addressed token, student, or admin does not exist.
    NotFound,
    /// A unique key is already taken.
    Conflict,
    /// The call would break a registry invariant.
    InvariantViolation,
    /// Malformed or out-of-range input.
    InvalidInput,
    /// The record is in a terminal state.
    TerminalState,
    /// The operation is permanently disabled.
    Unsupported,
}

impl ErrorKind {
    /// Snake-case name, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvariantViolation => "invariant_violation",
            Self::InvalidInput => "invalid_input",
            Self::TerminalState => "terminal_state",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unauthorized: {caller} is not an admin")]
    Unauthorized { caller: Address },

    #[error("invalid token: {0}")]
    InvalidToken(TokenId),

    #[error("invalid student: no record for external id {0}")]
    InvalidStudent(ExternalId),

    #[error("admin not found: {0}")]
    AdminNotFound(Address),

    #[error("email already registered: {0}")]
    EmailExists(Email),

    #[error("external id already registered: {0}")]
    ExternalIdExists(ExternalId),

    #[error("address is already an admin: {0}")]
    AdminExists(Address),

    #[error("cannot remove {0}: it is the last admin")]
    LastAdminProtected(Address),

    #[error("admin {0} cannot remove itself")]
    SelfRemoval(Address),

    #[error("no initial admins supplied: the admin set can never be empty")]
    EmptyAdminSet,

    #[error("invalid email {email}: must end with {required_suffix}")]
    InvalidEmail {
        email: Email,
        required_suffix: String,
    },

    #[error("invalid status {0:?}: only ACTIVE or PROBATION can be set")]
    InvalidStatus(String),

    #[error("student is in year {year}, graduation requires year {final_year}")]
    NotFinalYear { year: u8, final_year: u8 },

    #[error("invalid year {year}: must be between 1 and {final_year}")]
    InvalidYear { year: u8, final_year: u8 },

    #[error("student {0} has already graduated")]
    AlreadyGraduated(String),

    /// Tokens are non-transferable; transfer, approval and operator calls
    /// always fail with this.
    #[error("{operation} is not supported: student identity tokens are non-transferable")]
    NonTransferable { operation: &'static str },

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Loaded state does not satisfy the cross-collection invariants.
    #[error("registry integrity violation: {0}")]
    Integrity(String),

    /// The call's audit event could not be canonicalized. Nothing was
    /// written.
    #[error("audit event cannot be encoded: {0}")]
    AuditEncoding(String),
}

impl RegistryError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidToken(_) | Self::InvalidStudent(_) | Self::AdminNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::EmailExists(_) | Self::ExternalIdExists(_) | Self::AdminExists(_) => {
                ErrorKind::Conflict
            }
            Self::LastAdminProtected(_)
            | Self::SelfRemoval(_)
            | Self::EmptyAdminSet
            | Self::Integrity(_)
            | Self::AuditEncoding(_) => ErrorKind::InvariantViolation,
            Self::InvalidEmail { .. }
            | Self::InvalidStatus(_)
            | Self::NotFinalYear { .. }
            | Self::InvalidYear { .. }
            | Self::Validation(_) => ErrorKind::InvalidInput,
            Self::AlreadyGraduated(_) => ErrorKind::TerminalState,
            Self::NonTransferable { .. } => ErrorKind::Unsupported,
        }
    }

    /// Whether the registry turned down a well-formed call, as opposed to
    /// failing on its own state or encoding.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Integrity(_) | Self::AuditEncoding(_))
    }
}

impl From<LifecycleError> for RegistryError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::AlreadyGraduated { external_id } => Self::AlreadyGraduated(external_id),
            LifecycleError::InvalidStatus { status } => Self::InvalidStatus(status),
            LifecycleError::NotFinalYear { year, final_year } => {
                Self::NotFinalYear { year, final_year }
            }
            LifecycleError::InvalidYear { year, final_year } => {
                Self::InvalidYear { year, final_year }
            }
        }
    }
}
