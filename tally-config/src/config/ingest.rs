use serde::{Deserialize, Serialize};

use crate::consts;

/// How counter name, amount and timestamp are taken out of an event.
///
/// Fields are dot separated paths into the event payload, a leading
/// `payload` segment denotes the payload itself.
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct IngestConfig {
    /// Counter name used when no name field is configured or present.
    pub name: String,

    /// Field holding the counter name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_field: Option<String>,

    /// Field holding the amount to add, 1 if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment_field: Option<String>,

    /// Field holding the event timestamp, the arrival time if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_field: Option<String>,

    /// Pattern of textual timestamps, e.g. `dd/MM/yyyy`.
    /// Default: RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            name: consts::DEFAULT_COUNTER_NAME.to_string(),
            name_field: None,
            increment_field: None,
            time_field: None,
            date_format: None,
        }
    }
}
