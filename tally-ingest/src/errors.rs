use thiserror::Error;

pub type IngestResult<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug, PartialEq)]
pub enum IngestError {
    #[error("increment amount {0} is not a number")]
    InvalidAmount(String),
    #[error("timestamp {value} does not match {pattern}")]
    UnparsableTimestamp { value: String, pattern: String },
    #[error("unsupported date pattern {pattern:?}: {reason}")]
    InvalidDatePattern {
        pattern: String,
        reason: &'static str,
    },
    #[error("invalid field path {0:?}")]
    InvalidFieldPath(String),
}
