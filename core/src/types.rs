//! Shared primitive types used across the experiment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A simulation tick. One tick = one calendar day of the experiment.
pub type Day = u64;

/// A stable, unique identifier for a subject.
pub type SubjectId = String;

/// One of the two fixed experiment arms.
/// Ordering is significant: control always sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    Control,
    Treatment,
}

impl Cohort {
    pub const ALL: [Cohort; 2] = [Cohort::Control, Cohort::Treatment];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Control   => "control",
            Self::Treatment => "treatment",
        }
    }
}

impl fmt::Display for Cohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
