//! Storage media behind [`crate::CounterStore`].

use columns::BucketIndex;

use crate::errors::StorageResult;

pub mod columns;
mod memory;
mod merge;
pub mod options;
mod rocks;
mod rocksdb_options;

pub use memory::MemoryDatabase;
pub use rocks::RocksDatabase;

/// A key/value medium able to hold bucket totals and the counter catalog.
///
/// Implementations must apply [`CounterDatabase::add`] atomically per
/// bucket and never lose concurrent additions to the same bucket. Ordering
/// between [`CounterDatabase::add`] and [`CounterDatabase::remove`] of the
/// same counter is enforced by the store.
pub trait CounterDatabase: Send + Sync {
    /// Adds `amount` to each of `buckets` of `name` and catalogs the name,
    /// totals saturate at `u64::MAX`
    fn add(
        &self,
        name: &str,
        buckets: &[BucketIndex],
        amount: u64,
    ) -> StorageResult<()>;

    /// Total of a single bucket, 0 if it was never written
    fn get(&self, name: &str, bucket: &BucketIndex) -> StorageResult<u64>;

    fn multi_get(
        &self,
        name: &str,
        buckets: &[BucketIndex],
    ) -> StorageResult<Vec<u64>> {
        buckets.iter().map(|bucket| self.get(name, bucket)).collect()
    }

    /// Catalogued counter names in byte order
    fn names(&self) -> StorageResult<Vec<String>>;

    /// All written buckets of `name`, grouped by resolution and ordered by
    /// bucket-start within each group
    fn scan(&self, name: &str) -> StorageResult<Vec<(BucketIndex, u64)>>;

    /// Drops every bucket of `name` together with its catalog entry
    fn remove(&self, name: &str) -> StorageResult<()>;

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}
