use chrono::{DateTime, Utc};
use tally_metrics::metrics::LabelValue;
use thiserror::Error;

pub type CounterResult<T> = std::result::Result<T, CounterError>;
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("invalid counter name: {0:?}")]
    InvalidName(String),
    #[error("invalid increment amount: {0}")]
    InvalidIncrement(f64),
    #[error("timestamp {0} has no bucket in the store's time zone")]
    InvalidTimestamp(DateTime<Utc>),
    #[error("invalid window of {0} buckets")]
    InvalidWindow(usize),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
}

impl CounterError {
    pub fn as_str(&self) -> &str {
        use CounterError::*;
        match self {
            InvalidName(_) => "invalid_name",
            InvalidIncrement(_) => "invalid_increment",
            InvalidTimestamp(_) => "invalid_timestamp",
            InvalidWindow(_) => "invalid_window",
            StorageUnavailable(_) => "storage_unavailable",
        }
    }

    /// Validation failures never touched the medium
    pub fn is_validation(&self) -> bool {
        !matches!(self, CounterError::StorageUnavailable(_))
    }
}

impl LabelValue for CounterError {
    fn value(&self) -> &str {
        self.as_str()
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("column family {0} is missing")]
    MissingColumn(&'static str),
    #[error("corrupt value of {len} bytes in column {column}")]
    CorruptValue { column: &'static str, len: usize },
}

/// Produces a closure for [`Result::inspect_err`] which logs the error
/// together with a short description of the failed operation
#[macro_export]
macro_rules! log_err {
    ($msg: expr) => {
        |err| ::log::error!("{} failed: {err}", $msg)
    };
    ($msg: expr, $($ctx: expr),* $(,)?) => {
        |err| ::log::error!("{} failed: {err}", format!($msg, $($ctx),*))
    };
}
