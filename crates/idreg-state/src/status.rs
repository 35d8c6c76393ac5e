//! # Student Status

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::LifecycleError;

/// Lifecycle status of a student record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentStatus {
    /// Enrolled and in good standing.
    Active,
    /// Enrolled, under probation. The record carries a reason.
    Probation,
    /// Finished the program (terminal).
    Graduated,
}

impl StudentStatus {
    /// All states, in declaration order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Probation, Self::Graduated];

    /// Whether no further mutation is accepted in this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Graduated)
    }

    /// Whether an admin may set this status directly. `Graduated` is only
    /// reachable through graduation.
    pub fn is_settable(&self) -> bool {
        matches!(self, Self::Active | Self::Probation)
    }

    /// Status changes allowed from this state. Re-setting the current
    /// status is allowed while the record is mutable; `Graduated` admits
    /// nothing.
    pub fn valid_transitions(&self) -> &'static [StudentStatus] {
        match self {
            Self::Active => &[Self::Active, Self::Probation, Self::Graduated],
            Self::Probation => &[Self::Active, Self::Probation, Self::Graduated],
            Self::Graduated => &[],
        }
    }

    /// Whether `self → to` is a status change the machine allows.
    pub fn can_transition_to(&self, to: StudentStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Probation => "PROBATION",
            Self::Graduated => "GRADUATED",
        }
    }
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudentStatus {
    type Err = LifecycleError;

    /// Case-insensitive. Unknown names are `InvalidStatus`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LifecycleError::InvalidStatus {
                status: s.to_string(),
            })
    }
}
