//! Lives in its own test binary since the catalog gauge is process global.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_metrics::metrics;
use tally_store::{
    errors::StorageResult, BucketIndex, CounterDatabase, CounterStore,
    MemoryDatabase, Resolution, StoreOptions,
};

/// Catalogs another counter whenever one is removed, the way an increment
/// racing a reset would
struct RecataloguingDatabase(MemoryDatabase);

impl CounterDatabase for RecataloguingDatabase {
    fn add(
        &self,
        name: &str,
        buckets: &[BucketIndex],
        amount: u64,
    ) -> StorageResult<()> {
        self.0.add(name, buckets, amount)
    }

    fn get(&self, name: &str, bucket: &BucketIndex) -> StorageResult<u64> {
        self.0.get(name, bucket)
    }

    fn names(&self) -> StorageResult<Vec<String>> {
        self.0.names()
    }

    fn scan(&self, name: &str) -> StorageResult<Vec<(BucketIndex, u64)>> {
        self.0.scan(name)
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        self.0.remove(name)?;
        let start = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        self.0.add(
            &format!("{name}-late"),
            &[BucketIndex::new(Resolution::Day, start)],
            1,
        )
    }
}

#[test]
fn test_reset_all_reports_names_catalogued_meanwhile() {
    let db = Arc::new(RecataloguingDatabase(MemoryDatabase::new()));
    let store = CounterStore::with_database(db, StoreOptions::default());
    let at = DateTime::<Utc>::from_timestamp(3_600, 0).unwrap();
    store.increment("a", 1.0, at).unwrap();
    store.increment("b", 1.0, at).unwrap();

    assert_eq!(store.reset_all().unwrap(), 2);
    assert_eq!(metrics::catalog_size(), 2);
    assert_eq!(store.list().unwrap(), vec!["a-late", "b-late"]);
}
