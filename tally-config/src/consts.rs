// Struct Default Values
pub const DEFAULT_STORAGE_DIRECTORY: &str = "tally-storage/";
pub const DEFAULT_TIME_ZONE: &str = "UTC";

// Ingest Defaults
pub const DEFAULT_COUNTER_NAME: &str = "aggregate-counter";

// Figment Configuration
pub const ENV_VAR_PREFIX: &str = "TALLY_";

// Metrics Defaults
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:9000";
pub const DEFAULT_CATALOG_REFRESH_SECS: u64 = 30;

// Storage Layout
pub const DATABASE_DIRECTORY: &str = "counters";
