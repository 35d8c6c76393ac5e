//! # Audit Events
//!
//! Every successful mutation appends exactly one [`AuditEvent`] to the
//! registry's [`EventLog`] and logs it through `tracing` on the
//! `idreg::audit` target. The log is the registry's sole audit trail: it is
//! append-only, never trimmed, and never read back by the registry itself.
//!
//! ## Tamper Evidence
//!
//! Each event carries the digest of its predecessor and its own digest over
//! the canonical bytes of `(sequence, name, fields, height, recorded_at,
//! prev_digest)`. [`EventLog::verify_chain`] recomputes the chain; any edit,
//! reorder, or deletion of a past event breaks it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use idreg_core::{
    sha256_digest, BlockHeight, CanonicalBytes, CanonicalizationError, ContentDigest, Timestamp,
};

// ---------------------------------------------------------------------------
// EventName
// ---------------------------------------------------------------------------

/// The fixed set of audit event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    /// Token minted to a holder (`from` is always empty).
    Transfer,
    AdminAdded,
    AdminRemoved,
    StudentYearUpdated,
    StudentStatusUpdated,
    StudentDepartmentTransferred,
    StudentGraduated,
}

impl EventName {
    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::AdminAdded => "admin_added",
            Self::AdminRemoved => "admin_removed",
            Self::StudentYearUpdated => "student_year_updated",
            Self::StudentStatusUpdated => "student_status_updated",
            Self::StudentDepartmentTransferred => "student_department_transferred",
            Self::StudentGraduated => "student_graduated",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditEvent
// ---------------------------------------------------------------------------

/// One committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    pub name: EventName,
    /// Flat `key=value` payload: actor, subject, changed attributes.
    pub fields: BTreeMap<String, String>,
    /// Logical height of the call that produced the event.
    pub height: BlockHeight,
    /// Wall-clock time, informational.
    pub recorded_at: Timestamp,
    pub prev_digest: ContentDigest,
    pub digest: ContentDigest,
}

/// The digested portion of an event.
#[derive(Serialize)]
struct EventBody<'a> {
    sequence: u64,
    name: EventName,
    fields: &'a BTreeMap<String, String>,
    height: BlockHeight,
    recorded_at: &'a Timestamp,
    prev_digest: &'a ContentDigest,
}

impl AuditEvent {
    /// Field value by key.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Recompute this event's digest from its contents.
    pub fn compute_digest(&self) -> Result<ContentDigest, CanonicalizationError> {
        digest_body(&EventBody {
            sequence: self.sequence,
            name: self.name,
            fields: &self.fields,
            height: self.height,
            recorded_at: &self.recorded_at,
            prev_digest: &self.prev_digest,
        })
    }

    /// Render the fields as `key=value` pairs separated by spaces.
    pub fn fields_display(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn digest_body(body: &EventBody<'_>) -> Result<ContentDigest, CanonicalizationError> {
    let canonical = CanonicalBytes::new(body)?;
    Ok(sha256_digest(&canonical))
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Why [`EventLog::verify_chain`] rejected the log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("event {index} has sequence {found}")]
    SequenceGap { index: usize, found: u64 },

    #[error("event {index} does not link to its predecessor")]
    BrokenLink { index: usize },

    #[error("event {index} digest does not match its contents")]
    DigestMismatch { index: usize },
}

/// Append-only, hash-chained audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<AuditEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in order.
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Most recent event.
    pub fn last(&self) -> Option<&AuditEvent> {
        self.events.last()
    }

    /// The last `n` events (all of them if fewer exist).
    pub fn last_n(&self, n: usize) -> &[AuditEvent] {
        let start = self.events.len().saturating_sub(n);
        &self.events[start..]
    }

    /// Events whose `field` equals `value`, e.g. all events for a token.
    pub fn with_field(&self, field: &str, value: &str) -> Vec<&AuditEvent> {
        self.events
            .iter()
            .filter(|e| e.field(field) == Some(value))
            .collect()
    }

    /// Build the next event of the chain without appending it.
    ///
    /// Registry operations prepare their event before the first store write
    /// so that a canonicalization failure leaves every collection untouched.
    pub(crate) fn prepare(
        &self,
        name: EventName,
        fields: BTreeMap<String, String>,
        height: BlockHeight,
    ) -> Result<AuditEvent, CanonicalizationError> {
        let sequence = self.events.len() as u64;
        let prev_digest = self.last().map(|e| e.digest).unwrap_or(ContentDigest::ZERO);
        let recorded_at = Timestamp::now();
        let digest = digest_body(&EventBody {
            sequence,
            name,
            fields: &fields,
            height,
            recorded_at: &recorded_at,
            prev_digest: &prev_digest,
        })?;

        Ok(AuditEvent {
            sequence,
            name,
            fields,
            height,
            recorded_at,
            prev_digest,
            digest,
        })
    }

    /// Append a prepared event and log it. Returns the stored event.
    ///
    /// The event must come from [`prepare`](Self::prepare) on this log with
    /// no append in between.
    pub(crate) fn append(&mut self, event: AuditEvent) -> &AuditEvent {
        debug_assert_eq!(event.sequence, self.events.len() as u64);
        tracing::info!(
            target: "idreg::audit",
            event = %event.name,
            sequence = event.sequence,
            height = %event.height,
            fields = %event.fields_display(),
            "registry event"
        );
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Recompute sequence numbers, links, and digests for the whole log.
    pub fn verify_chain(&self) -> Result<(), ChainError> {
        let mut prev = ContentDigest::ZERO;
        for (index, event) in self.events.iter().enumerate() {
            if event.sequence != index as u64 {
                return Err(ChainError::SequenceGap {
                    index,
                    found: event.sequence,
                });
            }
            if event.prev_digest != prev {
                return Err(ChainError::BrokenLink { index });
            }
            match event.compute_digest() {
                Ok(digest) if digest == event.digest => {}
                _ => return Err(ChainError::DigestMismatch { index }),
            }
            prev = event.digest;
        }
        Ok(())
    }
}

/// Build an event field map from `(key, value)` pairs.
pub(crate) fn fields<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(log: &mut EventLog, name: EventName, fields: BTreeMap<String, String>, height: u64) {
        let event = log.prepare(name, fields, BlockHeight::new(height)).unwrap();
        log.append(event);
    }

    fn log_with(n: u64) -> EventLog {
        let mut log = EventLog::new();
        for i in 0..n {
            record(
                &mut log,
                EventName::StudentYearUpdated,
                fields([("token_id", format!("2021/{i:04}")), ("year", "2".to_string())]),
                i + 1,
            );
        }
        log
    }

    #[test]
    fn record_assigns_sequence_and_links() {
        let log = log_with(3);
        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[0].prev_digest, ContentDigest::ZERO);
        assert_eq!(log.events()[1].prev_digest, log.events()[0].digest);
        assert_eq!(log.events()[2].sequence, 2);
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn prepared_event_carries_real_digest_and_leaves_log_alone() {
        let log = log_with(2);
        let event = log
            .prepare(
                EventName::StudentGraduated,
                fields([("token_id", "2021/0000".to_string())]),
                BlockHeight::new(3),
            )
            .unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(event.sequence, 2);
        assert_eq!(event.prev_digest, log.events()[1].digest);
        assert_ne!(event.digest, ContentDigest::ZERO);
        assert_eq!(event.compute_digest().unwrap(), event.digest);
    }

    #[test]
    fn discarded_preparation_does_not_shift_the_chain() {
        let mut log = log_with(1);
        let dropped = log
            .prepare(EventName::AdminAdded, fields([("admin", "g1x".to_string())]), BlockHeight::new(2))
            .unwrap();
        drop(dropped);
        record(&mut log, EventName::AdminRemoved, fields([("admin", "g1y".to_string())]), 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[1].sequence, 1);
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn edited_event_breaks_chain() {
        let mut log = log_with(3);
        log.events[1]
            .fields
            .insert("year".to_string(), "3".to_string());
        assert_eq!(log.verify_chain(), Err(ChainError::DigestMismatch { index: 1 }));
    }

    #[test]
    fn deleted_event_breaks_chain() {
        let mut log = log_with(3);
        log.events.remove(1);
        assert_eq!(
            log.verify_chain(),
            Err(ChainError::SequenceGap { index: 1, found: 2 })
        );
    }

    #[test]
    fn filters() {
        let mut log = log_with(2);
        record(
            &mut log,
            EventName::AdminAdded,
            fields([("caller", "g1a".to_string()), ("admin", "g1b".to_string())]),
            9,
        );
        assert_eq!(log.last().unwrap().name, EventName::AdminAdded);
        assert_eq!(log.with_field("token_id", "2021/0001").len(), 1);
        assert_eq!(log.last_n(2).len(), 2);
        assert_eq!(log.last_n(10).len(), 3);
    }

    #[test]
    fn fields_display_is_key_ordered() {
        let log = log_with(1);
        assert_eq!(log.events()[0].fields_display(), "token_id=2021/0000 year=2");
    }

    #[test]
    fn event_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&EventName::StudentDepartmentTransferred).unwrap(),
            "\"student_department_transferred\""
        );
        assert_eq!(EventName::Transfer.to_string(), "transfer");
    }

    #[test]
    fn log_survives_serde_and_still_verifies() {
        let log = log_with(4);
        let json = serde_json::to_string(&log).unwrap();
        let back: EventLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back, log);
        assert!(back.verify_chain().is_ok());
    }
}
