//! Turns raw events into the (name, amount, timestamp) triples counters are
//! incremented with.

mod adapter;
mod date;
pub mod errors;
mod field;
mod payload;

pub use adapter::{CounterEvent, IngestAdapter};
pub use date::DatePattern;
pub use errors::{IngestError, IngestResult};
pub use field::FieldPath;
pub use payload::Payload;
