pub mod cli;
pub mod ingest;
pub mod metrics;
pub mod store;

pub use ingest::IngestConfig;
pub use metrics::MetricsConfig;
pub use store::StoreConfig;
