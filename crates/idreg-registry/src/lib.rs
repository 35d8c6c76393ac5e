//! # idreg-registry: Student Identity Registry Core
//!
//! Issues one non-transferable identity record per student, indexes records
//! by token, email, and external id, enforces the lifecycle state machine,
//! and guards every mutation with a never-empty admin set.
//!
//! ## Components
//!
//! - **Store** (`store.rs`): `OrderedStore<K, V>`, the typed ordered map
//!   every collection is built on.
//! - **Ownership** (`ownership.rs`): token → holder.
//! - **Uniqueness** (`uniqueness.rs`): email → token and external id → token.
//! - **Admin set** (`admin.rs`): authorized addresses, never empty.
//! - **Events** (`events.rs`): append-only, hash-chained audit log.
//! - **Registry** (`registry.rs`): the facade composing all of the above
//!   into atomic, authorization-checked operations.
//! - **Token** (`token.rs`): non-fungible-token read view; the transfer and
//!   approval surface is permanently disabled.
//! - **Shared** (`shared.rs`): `RwLock` handle for multi-threaded hosts.
//! - **Config** (`config.rs`) and **Error** (`error.rs`).
//!
//! ## Persisted Layout
//!
//! Six ordered collections (records, ownership, email index, external-id
//! index, admin set, token URIs) plus the audit log, all serialized as part
//! of [`Registry`].

pub mod admin;
pub mod config;
pub mod error;
pub mod events;
pub mod ownership;
pub mod registry;
pub mod shared;
pub mod store;
pub mod token;
pub mod uniqueness;

pub use admin::{AdminGrant, AdminSet};
pub use config::{ConfigError, RegistryConfig};
pub use error::{ErrorKind, RegistryError};
pub use events::{AuditEvent, ChainError, EventLog, EventName};
pub use ownership::OwnershipIndex;
pub use registry::{CallContext, Registry};
pub use shared::SharedRegistry;
pub use store::OrderedStore;
pub use uniqueness::UniqueIndex;

pub use idreg_core::{Address, BlockHeight, Email, ExternalId, TokenId};
pub use idreg_state::{NewStudent, StudentRecord, StudentStatus};
