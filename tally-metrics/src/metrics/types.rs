use std::fmt;

// -----------------
// Outcome
// -----------------
const OUTCOME_STORED: &str = "stored";
const OUTCOME_REJECTED: &str = "rejected";
const OUTCOME_FAILED: &str = "failed";

/// What became of a single ingested event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Applied to the store
    Stored,
    /// Dropped because the event or its extracted values were invalid
    Rejected,
    /// Valid but the storage medium failed
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        use Outcome::*;
        match self {
            Stored => OUTCOME_STORED,
            Rejected => OUTCOME_REJECTED,
            Failed => OUTCOME_FAILED,
        }
    }
}

impl LabelValue for Outcome {
    fn value(&self) -> &str {
        self.as_str()
    }
}

/// Text a value contributes as a prometheus label
pub trait LabelValue {
    fn value(&self) -> &str;
}
