use std::{fmt, str::FromStr};

use serde_json::Value;

use crate::errors::IngestError;

const PAYLOAD_ROOT: &str = "payload";

/// Dot separated path into an event payload.
///
/// A leading `payload` segment stands for the payload itself, so `ts` and
/// `payload.ts` address the same field and `payload` the whole payload.
/// Numeric segments index into arrays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self { segments: vec![] }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The addressed value, `None` if the path leads nowhere or to null
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let resolved = self.segments.iter().try_fold(value, |value, segment| {
            match value {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => {
                    segment.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                _ => None,
            }
        })?;
        (!resolved.is_null()).then_some(resolved)
    }
}

impl FromStr for FieldPath {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.trim().split('.').collect::<Vec<_>>();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(IngestError::InvalidFieldPath(s.to_string()));
        }
        if segments.first() == Some(&PAYLOAD_ROOT) {
            segments.remove(0);
        }
        Ok(Self {
            segments: segments.into_iter().map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(PAYLOAD_ROOT)?;
        for segment in &self.segments {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}
