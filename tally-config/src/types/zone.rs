use std::{fmt, str::FromStr};

use chrono::{FixedOffset, Offset, Utc};
use derive_more::Deref;
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::consts;

/// Fixed UTC offset whose local calendar counters are bucketed by, written
/// as `UTC`, `Z` or `+HH:MM`/`-HH:MM`
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    DeserializeFromStr,
    SerializeDisplay,
    Deref,
)]
pub struct ZoneOffset(pub FixedOffset);

impl Default for ZoneOffset {
    fn default() -> Self {
        consts::DEFAULT_TIME_ZONE
            .parse()
            .unwrap_or_else(|_| Self(Utc.fix()))
    }
}

impl FromStr for ZoneOffset {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
            return Ok(Self(Utc.fix()));
        }
        s.parse::<FixedOffset>().map(Self)
    }
}

impl fmt::Display for ZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.local_minus_utc() == 0 {
            return f.write_str("UTC");
        }
        write!(f, "{}", self.0)
    }
}
