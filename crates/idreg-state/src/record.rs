//! # Student Record
//!
//! The canonical record held for each issued token, and the transitions that
//! produce its successors.
//!
//! ## Invariants
//!
//! - `graduated_at` is `Some` iff `status == Graduated`, and is set once.
//! - `probation_reason` is `Some` only while `status == Probation`.
//! - A graduated record accepts no transition at all.
//!
//! Transitions take `&self` and return a fresh `StudentRecord`. Nothing is
//! patched in place; the registry writes the returned record back whole.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use idreg_core::{BlockHeight, Email, ExternalId};

use crate::status::StudentStatus;

// ─── Errors ──────────────────────────────────────────────────────────

/// A lifecycle transition was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The record is graduated and no longer accepts changes.
    #[error("student {external_id} has already graduated")]
    AlreadyGraduated {
        /// The graduated record.
        external_id: String,
    },

    /// The requested status cannot be set directly.
    #[error("invalid status {status:?}: only ACTIVE or PROBATION can be set")]
    InvalidStatus {
        /// The rejected status name.
        status: String,
    },

    /// Graduation requires the program's final year.
    #[error("student is in year {year}, graduation requires year {final_year}")]
    NotFinalYear {
        /// Current year of study.
        year: u8,
        /// Configured final year.
        final_year: u8,
    },

    /// Year of study out of range.
    #[error("invalid year {year}: must be between 1 and {final_year}")]
    InvalidYear {
        /// The rejected year.
        year: u8,
        /// Configured final year.
        final_year: u8,
    },
}

/// Check a year of study against the program length.
pub(crate) fn check_year(year: u8, final_year: u8) -> Result<(), LifecycleError> {
    if year == 0 || year > final_year {
        return Err(LifecycleError::InvalidYear { year, final_year });
    }
    Ok(())
}

// ─── Issuance input ──────────────────────────────────────────────────

/// Caller-supplied fields for a new record.
///
/// Has no image field; the registry assigns the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    /// Full legal name.
    pub full_name: String,
    /// Date of birth, opaque string.
    pub date_of_birth: String,
    /// Institutional email.
    pub email: Email,
    /// Student number; the token id derives from it.
    pub external_id: ExternalId,
    /// Department of enrollment.
    pub department: String,
    /// Year of study, 1-based.
    pub year: u8,
    /// Enrollment ordering key, e.g. `2021-10-01`.
    pub enrolled_at: String,
}

// ─── Record ──────────────────────────────────────────────────────────

/// The canonical identity record for one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub full_name: String,
    pub date_of_birth: String,
    pub email: Email,
    pub external_id: ExternalId,
    pub enrolled_at: String,
    pub department: String,
    pub year: u8,
    /// System-assigned image URL.
    pub image_url: String,
    pub status: StudentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probation_reason: Option<String>,
    /// Logical height at which graduation happened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduated_at: Option<BlockHeight>,
}

impl StudentRecord {
    /// Build the initial `Active` record. Any image the caller might have
    /// had in mind is irrelevant: `image_url` is always the system default.
    pub fn enroll(
        new: NewStudent,
        image_url: impl Into<String>,
        final_year: u8,
    ) -> Result<Self, LifecycleError> {
        check_year(new.year, final_year)?;
        Ok(Self {
            full_name: new.full_name,
            date_of_birth: new.date_of_birth,
            email: new.email,
            external_id: new.external_id,
            enrolled_at: new.enrolled_at,
            department: new.department,
            year: new.year,
            image_url: image_url.into(),
            status: StudentStatus::Active,
            probation_reason: None,
            graduated_at: None,
        })
    }

    /// Whether the record is graduated.
    pub fn is_graduated(&self) -> bool {
        self.status.is_terminal()
    }

    /// Set the year of study.
    pub fn with_year(&self, year: u8, final_year: u8) -> Result<Self, LifecycleError> {
        self.require_mutable()?;
        check_year(year, final_year)?;
        Ok(Self {
            year,
            ..self.clone()
        })
    }

    /// Set status to `Active` or `Probation`, as allowed by
    /// [`StudentStatus::valid_transitions`]. The reason is kept only for
    /// probation.
    pub fn with_status(&self, status: StudentStatus, reason: &str) -> Result<Self, LifecycleError> {
        self.require_mutable()?;
        if !status.is_settable() || !self.status.can_transition_to(status) {
            return Err(LifecycleError::InvalidStatus {
                status: status.to_string(),
            });
        }
        let probation_reason = match status {
            StudentStatus::Probation => Some(reason.to_string()),
            _ => None,
        };
        Ok(Self {
            status,
            probation_reason,
            ..self.clone()
        })
    }

    /// Move the record to another department.
    pub fn with_department(&self, department: &str) -> Result<Self, LifecycleError> {
        self.require_mutable()?;
        Ok(Self {
            department: department.to_string(),
            ..self.clone()
        })
    }

    /// Graduate at `height`. Requires the final year.
    pub fn graduated(&self, final_year: u8, height: BlockHeight) -> Result<Self, LifecycleError> {
        self.require_mutable()?;
        if self.year != final_year {
            return Err(LifecycleError::NotFinalYear {
                year: self.year,
                final_year,
            });
        }
        Ok(Self {
            status: StudentStatus::Graduated,
            probation_reason: None,
            graduated_at: Some(height),
            ..self.clone()
        })
    }

    /// Whether the status/graduation invariants hold.
    pub fn is_consistent(&self) -> bool {
        let graduation_ok = self.graduated_at.is_some() == (self.status == StudentStatus::Graduated);
        let probation_ok = self.probation_reason.is_none() || self.status == StudentStatus::Probation;
        graduation_ok && probation_ok
    }

    fn require_mutable(&self) -> Result<(), LifecycleError> {
        if self.is_graduated() {
            return Err(LifecycleError::AlreadyGraduated {
                external_id: self.external_id.to_string(),
            });
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FINAL_YEAR: u8 = 4;

    fn new_student(year: u8) -> NewStudent {
        NewStudent {
            full_name: "John Doe".to_string(),
            date_of_birth: "2002-03-14".to_string(),
            email: Email::new("john@raf.rs").unwrap(),
            external_id: ExternalId::new("2021/0001").unwrap(),
            department: "Computer Science".to_string(),
            year,
            enrolled_at: "2021-10-01".to_string(),
        }
    }

    fn active(year: u8) -> StudentRecord {
        StudentRecord::enroll(new_student(year), "https://img/default.png", FINAL_YEAR).unwrap()
    }

    #[test]
    fn enroll_starts_active_with_system_image() {
        let rec = active(1);
        assert_eq!(rec.status, StudentStatus::Active);
        assert_eq!(rec.image_url, "https://img/default.png");
        assert!(rec.graduated_at.is_none());
        assert!(rec.is_consistent());
    }

    #[test]
    fn enroll_rejects_out_of_range_year() {
        assert!(matches!(
            StudentRecord::enroll(new_student(0), "x", FINAL_YEAR),
            Err(LifecycleError::InvalidYear { year: 0, .. })
        ));
        assert!(StudentRecord::enroll(new_student(5), "x", FINAL_YEAR).is_err());
    }

    #[test]
    fn with_year_returns_new_record_and_leaves_input() {
        let rec = active(1);
        let next = rec.with_year(2, FINAL_YEAR).unwrap();
        assert_eq!(rec.year, 1);
        assert_eq!(next.year, 2);
        assert_eq!(next.email, rec.email);
    }

    #[test]
    fn probation_keeps_reason_active_clears_it() {
        let rec = active(2);
        let on_probation = rec
            .with_status(StudentStatus::Probation, "failed exams")
            .unwrap();
        assert_eq!(on_probation.probation_reason.as_deref(), Some("failed exams"));
        assert!(on_probation.is_consistent());

        let back = on_probation.with_status(StudentStatus::Active, "ignored").unwrap();
        assert_eq!(back.status, StudentStatus::Active);
        assert!(back.probation_reason.is_none());
    }

    #[test]
    fn with_status_follows_transition_table() {
        let probation = active(2)
            .with_status(StudentStatus::Probation, "late fees")
            .unwrap();
        for from in [active(2), probation] {
            for to in StudentStatus::ALL {
                let accepted = from.with_status(to, "reason").is_ok();
                assert_eq!(
                    accepted,
                    to.is_settable() && from.status.can_transition_to(to),
                    "{} -> {to}",
                    from.status
                );
            }
        }
    }

    #[test]
    fn same_status_update_is_accepted_and_refreshes_reason() {
        let rec = active(2)
            .with_status(StudentStatus::Probation, "late fees")
            .unwrap();
        let again = rec
            .with_status(StudentStatus::Probation, "failed exams")
            .unwrap();
        assert_eq!(again.probation_reason.as_deref(), Some("failed exams"));
        assert!(active(1).with_status(StudentStatus::Active, "").is_ok());
    }

    #[test]
    fn graduated_cannot_be_set_directly() {
        let err = active(4)
            .with_status(StudentStatus::Graduated, "")
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidStatus { .. }));
    }

    #[test]
    fn graduation_requires_final_year() {
        let err = active(3).graduated(FINAL_YEAR, BlockHeight::new(10)).unwrap_err();
        assert_eq!(
            err,
            LifecycleError::NotFinalYear {
                year: 3,
                final_year: FINAL_YEAR
            }
        );
    }

    #[test]
    fn graduation_sets_height_and_status() {
        let rec = active(4).graduated(FINAL_YEAR, BlockHeight::new(10)).unwrap();
        assert_eq!(rec.status, StudentStatus::Graduated);
        assert_eq!(rec.graduated_at, Some(BlockHeight::new(10)));
        assert!(rec.is_consistent());
    }

    #[test]
    fn probation_record_can_graduate_and_loses_reason() {
        let rec = active(4)
            .with_status(StudentStatus::Probation, "late fees")
            .unwrap()
            .graduated(FINAL_YEAR, BlockHeight::new(3))
            .unwrap();
        assert!(rec.probation_reason.is_none());
        assert!(rec.is_consistent());
    }

    #[test]
    fn graduated_record_rejects_every_transition() {
        let rec = active(4).graduated(FINAL_YEAR, BlockHeight::new(1)).unwrap();
        let already = |r: Result<StudentRecord, LifecycleError>| {
            matches!(r, Err(LifecycleError::AlreadyGraduated { .. }))
        };
        assert!(already(rec.with_year(3, FINAL_YEAR)));
        assert!(already(rec.with_status(StudentStatus::Active, "")));
        assert!(already(rec.with_department("Math")));
        assert!(already(rec.graduated(FINAL_YEAR, BlockHeight::new(2))));
    }

    #[test]
    fn terminal_check_precedes_input_validation() {
        let rec = active(4).graduated(FINAL_YEAR, BlockHeight::new(1)).unwrap();
        assert!(matches!(
            rec.with_status(StudentStatus::Graduated, ""),
            Err(LifecycleError::AlreadyGraduated { .. })
        ));
    }

    #[test]
    fn serialization_omits_absent_lifecycle_fields() {
        let json = serde_json::to_value(active(1)).unwrap();
        assert!(json.get("graduated_at").is_none());
        assert!(json.get("probation_reason").is_none());
        assert_eq!(json["status"], "ACTIVE");
    }
}
