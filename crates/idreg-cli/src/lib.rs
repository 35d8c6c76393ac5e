//! # idreg-cli: Registry Command-Line Host
//!
//! Hosts a single registry instance in a JSON state file and exposes every
//! registry operation as a subcommand.
//!
//! ## Host Duties
//!
//! The registry trusts its host for two things: the caller identity and the
//! logical height. Here the caller is whatever `--as` names, and the height
//! is a counter in the state file advanced once per mutating invocation.
//! There is no authentication; the CLI is an operator tool, not a service.
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs` and [`commands`]; registry
//!   semantics live in `idreg-registry`.
//! - Every command prints one JSON document on stdout. Logs go to stderr.
//! - A rejected call leaves the state file untouched.
//! - Exit codes: 0 success, 1 the registry rejected the call, 2 any other
//!   failure (I/O, parse, integrity). See [`exit_code`].

pub mod commands;
pub mod state;

use idreg_registry::RegistryError;

/// The registry rejection inside `err`, if the failure is one.
///
/// Integrity and audit-encoding failures are failures of the state, not
/// rejections of the call, and yield `None`.
pub fn rejection(err: &anyhow::Error) -> Option<&RegistryError> {
    err.downcast_ref::<RegistryError>()
        .filter(|e| e.is_rejection())
}

/// Process exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match rejection(err) {
        Some(_) => 1,
        None => 2,
    }
}
