use chrono::{DateTime, FixedOffset, Utc};
use log::*;
use serde_json::Value;
use tally_config::config::IngestConfig;

use crate::{
    errors::{IngestError, IngestResult},
    DatePattern, FieldPath, Payload,
};

/// One increment extracted from an event
#[derive(Debug, Clone, PartialEq)]
pub struct CounterEvent {
    pub name: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Extracts [`CounterEvent`]s from payloads.
///
/// A field that isn't configured, or that the payload lacks, falls back to
/// the configured counter name, an amount of 1 and the arrival time.
#[derive(Debug, Clone)]
pub struct IngestAdapter {
    name: String,
    name_field: Option<FieldPath>,
    increment_field: Option<FieldPath>,
    time_field: Option<FieldPath>,
    date_pattern: DatePattern,
    zone: FixedOffset,
}

impl IngestAdapter {
    pub fn try_new(
        config: &IngestConfig,
        zone: FixedOffset,
    ) -> IngestResult<Self> {
        let parse_field = |field: &Option<String>| {
            field.as_deref().map(str::parse::<FieldPath>).transpose()
        };
        let date_pattern = match &config.date_format {
            Some(pattern) => DatePattern::new(pattern)?,
            None => DatePattern::rfc3339(),
        };
        let adapter = Self {
            name: config.name.clone(),
            name_field: parse_field(&config.name_field)?,
            increment_field: parse_field(&config.increment_field)?,
            time_field: parse_field(&config.time_field)?,
            date_pattern,
            zone,
        };
        debug!("Created ingest adapter {adapter:?}");
        Ok(adapter)
    }

    pub fn extract(
        &self,
        payload: &Payload,
        arrival: DateTime<Utc>,
    ) -> IngestResult<CounterEvent> {
        let value = payload.value();
        let name = match lookup(&self.name_field, value) {
            Some(Value::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => self.name.clone(),
        };
        let amount = match lookup(&self.increment_field, value) {
            Some(value) => amount_of(value)?,
            None => 1.0,
        };
        let timestamp = match lookup(&self.time_field, value) {
            Some(value) => self.timestamp_of(value)?,
            None => arrival,
        };
        Ok(CounterEvent {
            name,
            amount,
            timestamp,
        })
    }

    fn timestamp_of(&self, value: &Value) -> IngestResult<DateTime<Utc>> {
        let parsed = match value {
            Value::String(text) => {
                return self.date_pattern.parse(text, self.zone)
            }
            // numbers are epoch milliseconds
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|millis| millis as i64))
                .and_then(DateTime::from_timestamp_millis),
            _ => None,
        };
        parsed.ok_or_else(|| IngestError::UnparsableTimestamp {
            value: value.to_string(),
            pattern: "epoch milliseconds".to_string(),
        })
    }
}

fn lookup<'a>(
    field: &Option<FieldPath>,
    value: &'a Value,
) -> Option<&'a Value> {
    field.as_ref().and_then(|field| field.resolve(value))
}

fn amount_of(value: &Value) -> IngestResult<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    amount.ok_or_else(|| IngestError::InvalidAmount(value.to_string()))
}
