use std::{
    collections::{BTreeMap, BTreeSet},
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::RwLock;

use super::{
    columns::{BucketIndex, Buckets, Column},
    CounterDatabase,
};
use crate::errors::StorageResult;

/// Volatile medium keyed exactly like the buckets column, used for tests
/// and for sinks that don't need to survive a restart.
///
/// Existing buckets are bumped under the shared map lock, the exclusive
/// lock is only taken to insert new buckets or to remove a counter.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    buckets: RwLock<BTreeMap<Vec<u8>, AtomicU64>>,
    catalog: RwLock<BTreeSet<String>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

fn bump(total: &AtomicU64, amount: u64) {
    // the closure always returns Some, so the update can't fail
    let _ = total.fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| {
        Some(t.saturating_add(amount))
    });
}

impl CounterDatabase for MemoryDatabase {
    fn add(
        &self,
        name: &str,
        buckets: &[BucketIndex],
        amount: u64,
    ) -> StorageResult<()> {
        // catalog first so a listed name never lacks the buckets it is about
        // to receive
        if !self.catalog.read().contains(name) {
            self.catalog.write().insert(name.to_string());
        }

        let keys = buckets
            .iter()
            .map(|bucket| Buckets::key_for(name, bucket))
            .collect::<Vec<_>>();
        let mut missing = Vec::new();
        {
            let map = self.buckets.read();
            for key in keys {
                match map.get(&key) {
                    Some(total) => bump(total, amount),
                    None => missing.push(key),
                }
            }
        }
        if !missing.is_empty() {
            let mut map = self.buckets.write();
            for key in missing {
                bump(map.entry(key).or_default(), amount);
            }
        }
        Ok(())
    }

    fn get(&self, name: &str, bucket: &BucketIndex) -> StorageResult<u64> {
        Ok(self
            .buckets
            .read()
            .get(&Buckets::key_for(name, bucket))
            .map_or(0, |total| total.load(Ordering::Acquire)))
    }

    fn names(&self) -> StorageResult<Vec<String>> {
        // BTreeSet<String> iterates in byte order like the catalog column
        Ok(self.catalog.read().iter().cloned().collect())
    }

    fn scan(&self, name: &str) -> StorageResult<Vec<(BucketIndex, u64)>> {
        let range = Buckets::prefix(name)..Buckets::prefix_end(name);
        Ok(self
            .buckets
            .read()
            .range(range)
            .filter_map(|(key, total)| {
                let (_, bucket) = Buckets::index(key)?;
                Some((bucket, total.load(Ordering::Acquire)))
            })
            .collect())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        let mut map = self.buckets.write();
        let mut tail = map.split_off(&Buckets::prefix(name));
        let mut rest = tail.split_off(&Buckets::prefix_end(name));
        map.append(&mut rest);
        self.catalog.write().remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use chrono::{DateTime, Utc};

    use super::*;
    use crate::Resolution;

    fn bucket(resolution: Resolution, secs: i64) -> BucketIndex {
        let start = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
        BucketIndex::new(resolution, start)
    }

    #[test]
    fn test_add_get_and_scan() {
        let db = MemoryDatabase::new();
        let minute = bucket(Resolution::Minute, 60);
        let month = bucket(Resolution::Month, 0);
        db.add("foo", &[minute, month], 2).unwrap();
        db.add("foo", &[minute, month], 0).unwrap();
        db.add("bar", &[month], 0).unwrap();

        assert_eq!(db.get("foo", &minute).unwrap(), 2);
        assert_eq!(db.get("bar", &minute).unwrap(), 0);
        assert_eq!(db.multi_get("bar", &[month]).unwrap(), vec![0]);
        assert_eq!(db.names().unwrap(), vec!["bar", "foo"]);
        assert_eq!(db.scan("foo").unwrap(), vec![(minute, 2), (month, 2)]);
        assert_eq!(db.scan("bar").unwrap(), vec![(month, 0)]);
    }

    #[test]
    fn test_remove_keeps_neighbours() {
        let db = MemoryDatabase::new();
        let day = bucket(Resolution::Day, 0);
        for name in ["fo", "foo", "foobar", "fop"] {
            db.add(name, &[day], 1).unwrap();
        }
        db.remove("foo").unwrap();
        db.remove("foo").unwrap();

        assert_eq!(db.names().unwrap(), vec!["fo", "foobar", "fop"]);
        assert!(db.scan("foo").unwrap().is_empty());
        for name in ["fo", "foobar", "fop"] {
            assert_eq!(db.get(name, &day).unwrap(), 1);
        }
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let db = Arc::new(MemoryDatabase::new());
        let hour = bucket(Resolution::Hour, 7_200);
        let handles = (0..8)
            .map(|_| {
                let db = db.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        db.add("hits", &[hour], 3).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(db.get("hits", &hour).unwrap(), 8 * 500 * 3);
    }

    #[test]
    fn test_add_saturates() {
        let db = MemoryDatabase::new();
        let year = bucket(Resolution::Year, 0);
        db.add("big", &[year], u64::MAX).unwrap();
        db.add("big", &[year], u64::MAX).unwrap();
        assert_eq!(db.get("big", &year).unwrap(), u64::MAX);
    }
}
