//! Counters pre-aggregated into minute, hour, day, month and year buckets.
//!
//! Every increment fans out into one bucket per [`Resolution`], so reading a
//! window of N buckets costs N point lookups no matter how many events went
//! into them.

pub mod clock;
pub mod database;
pub mod errors;
mod query;
mod resolution;
mod store;

pub use database::{
    columns::BucketIndex,
    options::{AccessType, StoreOptions},
    CounterDatabase, MemoryDatabase, RocksDatabase,
};
pub use errors::{CounterError, CounterResult, StorageError};
pub use query::{
    AggregateCounts, Clock, FixedClock, QueryAssembler, SystemClock,
};
pub use resolution::Resolution;
pub use store::CounterStore;
