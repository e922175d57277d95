use serde::{Deserialize, Serialize};

use crate::types::{StoreBackend, ZoneOffset};

/// Configuration of the counter store.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct StoreConfig {
    /// Medium holding the counters.
    /// Default: rocksdb
    pub backend: StoreBackend,

    /// Offset whose local calendar day, month and year boundaries follow.
    /// Default: UTC
    pub time_zone: ZoneOffset,

    /// If true, every counter is reset on startup.
    pub reset: bool,
}
