use std::fmt;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc,
};

use crate::errors::{IngestError, IngestResult};

const RFC_3339: &str = "RFC 3339";

/// Pattern textual event timestamps are parsed with.
///
/// Accepts the letter patterns common to date formatting libraries
/// (`yyyy`, `MM`, `dd`, `HH`, `mm`, `ss`, `SSS`, `Z`, ... with quoted
/// literals) and translates them to a chrono format string. Patterns which
/// contain a `%` already are taken as chrono format strings verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    source: String,
    format: Option<String>,
}

impl Default for DatePattern {
    fn default() -> Self {
        Self::rfc3339()
    }
}

impl DatePattern {
    pub fn rfc3339() -> Self {
        Self {
            source: RFC_3339.to_string(),
            format: None,
        }
    }

    pub fn new(pattern: &str) -> IngestResult<Self> {
        let format = if pattern.contains('%') {
            pattern.to_string()
        } else {
            translate(pattern)?
        };
        Ok(Self {
            source: pattern.to_string(),
            format: Some(format),
        })
    }

    /// The chrono format string, `None` for RFC 3339
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Parses `value` into an instant; values without an offset are local
    /// times of `zone` and values without a time are midnight
    pub fn parse(
        &self,
        value: &str,
        zone: FixedOffset,
    ) -> IngestResult<DateTime<Utc>> {
        let value = value.trim();
        let parsed = match &self.format {
            None => DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|t| t.with_timezone(&Utc)),
            Some(format) => parse_with(value, format, zone),
        };
        parsed.ok_or_else(|| IngestError::UnparsableTimestamp {
            value: value.to_string(),
            pattern: self.source.clone(),
        })
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_with(
    value: &str,
    format: &str,
    zone: FixedOffset,
) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_str(value, format) {
        return Some(t.with_timezone(&Utc));
    }
    let local = NaiveDateTime::parse_from_str(value, format).ok().or_else(|| {
        NaiveDate::parse_from_str(value, format)
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN))
    })?;
    local
        .and_local_timezone(zone)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

fn invalid(pattern: &str, reason: &'static str) -> IngestError {
    IngestError::InvalidDatePattern {
        pattern: pattern.to_string(),
        reason,
    }
}

fn translate(pattern: &str) -> IngestResult<String> {
    let chars = pattern.chars().collect::<Vec<_>>();
    let mut format = String::with_capacity(pattern.len() * 2);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // '' is a literal quote, otherwise read up to the closing quote
            if chars.get(i + 1) == Some(&'\'') {
                format.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(invalid(pattern, "unterminated quote")),
                    Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                        format.push('\'');
                        i += 2;
                    }
                    Some('\'') => {
                        i += 1;
                        break;
                    }
                    Some(literal) => {
                        format.push(*literal);
                        i += 1;
                    }
                }
            }
            continue;
        }
        if !c.is_ascii_alphabetic() {
            format.push(c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|x| **x == c).count();
        let item = match (c, run) {
            ('y', 2) => "%y",
            ('y' | 'u', _) => "%Y",
            ('M', 1 | 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1 | 2) => "%d",
            ('D', _) => "%j",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('H', 1 | 2) => "%H",
            ('h', 1 | 2) => "%I",
            ('m', 1 | 2) => "%M",
            ('s', 1 | 2) => "%S",
            ('S', 1..=3) => "%3f",
            ('S', 4..=6) => "%6f",
            ('S', _) => "%9f",
            ('a', _) => "%p",
            ('Z', _) | ('X' | 'x', 1 | 2) => "%z",
            ('X' | 'x', _) => "%:z",
            _ => return Err(invalid(pattern, "unsupported pattern letter")),
        };
        format.push_str(item);
        i += run;
    }
    Ok(format)
}
