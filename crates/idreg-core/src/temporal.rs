//! # Temporal Types
//!
//! Two notions of time are used by the registry:
//!
//! - [`BlockHeight`]: the logical, monotonically increasing counter supplied
//!   by the hosting environment with every call. It is the only time that
//!   enters registry state (`graduated_at`, audit event heights).
//! - [`Timestamp`]: UTC wall-clock time truncated to seconds, stamped on audit
//!   events for operators. Never used for ordering or invariants.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BlockHeight
// ---------------------------------------------------------------------------

/// A logical chain-height-like counter.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// Height zero, before any call has been processed.
    pub const GENESIS: Self = Self(0);

    /// Wrap a raw height.
    pub fn new(height: u64) -> Self {
        Self(height)
    }

    /// The raw height value.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The following height. Saturates at `u64::MAX`.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for BlockHeight {
    fn from(h: u64) -> Self {
        Self(h)
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A UTC-only timestamp, truncated to seconds precision.
///
/// Renders as `YYYY-MM-DDTHH:MM:SSZ`, which keeps audit events byte-stable
/// under canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self::from_utc(Utc::now())
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Render as ISO 8601 with Z suffix.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
