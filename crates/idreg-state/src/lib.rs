//! # idreg-state: Student Record Lifecycle
//!
//! The status machine governing every issued record:
//!
//! ```text
//! Active ◀──▶ Probation
//!   │            │
//!   └──▶ Graduated ◀┘   (terminal)
//! ```
//!
//! - **Status** (`status.rs`): `StudentStatus` with its transition table.
//! - **Record** (`record.rs`): `StudentRecord` and its transitions. Every
//!   transition borrows the current record and returns a complete new
//!   record; callers store the result as a whole replacement.
//!
//! Authorization and indexing are not this crate's concern; see
//! `idreg-registry`.

pub mod record;
pub mod status;

pub use record::{LifecycleError, NewStudent, StudentRecord};
pub use status::StudentStatus;
