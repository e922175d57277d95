use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    path::Path,
    sync::Arc,
};

use chrono::{DateTime, FixedOffset, Utc};
use log::*;
use parking_lot::RwLock;
use tally_metrics::metrics;

use crate::{
    clock,
    database::{
        columns::{BucketIndex, MAX_NAME_LEN},
        options::StoreOptions,
        CounterDatabase, MemoryDatabase, RocksDatabase,
    },
    errors::{CounterError, CounterResult},
    log_err, Resolution,
};

const STRIPES: usize = 64;

/// Running totals of every counter at every [`Resolution`] plus the catalog
/// of counter names.
///
/// The store is `Send + Sync` and meant to be shared behind an [`Arc`].
/// Increments and resets of the same counter are ordered through one of a
/// fixed set of striped locks: increments share the stripe of their counter
/// while a reset holds it exclusively. A reset therefore waits for all
/// increments already in flight for that counter and removes their effect,
/// increments that start after it are applied on top of the emptied
/// counter.
pub struct CounterStore {
    db: Arc<dyn CounterDatabase>,
    time_zone: FixedOffset,
    stripes: Box<[RwLock<()>]>,
}

impl CounterStore {
    /// Opens (or creates) a RocksDB backed store at `path`
    pub fn open(path: &Path, options: StoreOptions) -> CounterResult<Self> {
        let db = RocksDatabase::open(path, &options).inspect_err(log_err!(
            "opening counter database at {}",
            path.display()
        ))?;
        Ok(Self::with_database(Arc::new(db), options))
    }

    pub fn in_memory(options: StoreOptions) -> Self {
        Self::with_database(Arc::new(MemoryDatabase::new()), options)
    }

    pub fn with_database(
        db: Arc<dyn CounterDatabase>,
        options: StoreOptions,
    ) -> Self {
        let stripes = (0..STRIPES).map(|_| RwLock::new(())).collect();
        Self {
            db,
            time_zone: options.time_zone,
            stripes,
        }
    }

    pub fn time_zone(&self) -> FixedOffset {
        self.time_zone
    }

    /// Adds `amount` to the bucket containing `timestamp` at every
    /// resolution and catalogs `name`.
    ///
    /// `amount` has to be a non-negative whole number which fits a `u64`,
    /// anything else is rejected as [`CounterError::InvalidIncrement`]
    /// before the store is touched.
    pub fn increment(
        &self,
        name: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> CounterResult<()> {
        let amount = record_failure(validate_amount(amount))?;
        self.increment_by(name, amount, timestamp)
    }

    pub fn increment_by(
        &self,
        name: &str,
        amount: u64,
        timestamp: DateTime<Utc>,
    ) -> CounterResult<()> {
        record_failure(validate_name(name))?;
        let mut buckets = Vec::with_capacity(Resolution::ALL.len());
        for resolution in Resolution::ALL {
            let bucket = self
                .bucket(resolution, timestamp)
                .ok_or(CounterError::InvalidTimestamp(timestamp));
            buckets.push(record_failure(bucket)?);
        }

        let _guard = self.stripe(name).read();
        let result = self
            .db
            .add(name, &buckets, amount)
            .inspect_err(log_err!("incrementing {}", name))
            .map_err(CounterError::from);
        record_failure(result)?;

        trace!("Incremented {name} by {amount} at {timestamp}");
        metrics::inc_increments();
        Ok(())
    }

    /// Total of the `resolution` bucket containing `bucket_start`, 0 if it
    /// was never written
    pub fn get(
        &self,
        name: &str,
        resolution: Resolution,
        bucket_start: DateTime<Utc>,
    ) -> CounterResult<u64> {
        validate_name(name)?;
        let bucket = self
            .bucket(resolution, bucket_start)
            .ok_or(CounterError::InvalidWindow(1))?;
        Ok(self.db.get(name, &bucket)?)
    }

    /// Like [`CounterStore::get`] for a number of buckets of one resolution,
    /// the totals are returned in the order of `bucket_starts`
    pub fn get_many(
        &self,
        name: &str,
        resolution: Resolution,
        bucket_starts: &[DateTime<Utc>],
    ) -> CounterResult<Vec<u64>> {
        validate_name(name)?;
        let buckets = bucket_starts
            .iter()
            .map(|start| self.bucket(resolution, *start))
            .collect::<Option<Vec<_>>>()
            .ok_or(CounterError::InvalidWindow(bucket_starts.len()))?;
        Ok(self.db.multi_get(name, &buckets)?)
    }

    /// Names of all counters with live buckets, in byte order
    pub fn list(&self) -> CounterResult<Vec<String>> {
        let names = self
            .db
            .names()
            .inspect_err(log_err!("listing counters"))?;
        metrics::set_catalog_size(names.len());
        Ok(names)
    }

    /// Every written bucket of `name` with its total
    pub fn buckets(
        &self,
        name: &str,
    ) -> CounterResult<Vec<(BucketIndex, u64)>> {
        validate_name(name)?;
        Ok(self.db.scan(name)?)
    }

    /// Drops all buckets of `name` and removes it from the catalog.
    ///
    /// Resetting an unknown counter is a no-op.
    pub fn reset(&self, name: &str) -> CounterResult<()> {
        validate_name(name)?;
        let _guard = self.stripe(name).write();
        self.db
            .remove(name)
            .inspect_err(log_err!("resetting {}", name))?;

        info!("Reset counter {name}");
        metrics::inc_resets();
        Ok(())
    }

    /// Resets every catalogued counter, returns how many there were
    pub fn reset_all(&self) -> CounterResult<usize> {
        let names = self.list()?;
        for name in &names {
            self.reset(name)?;
        }
        // concurrent increments may have catalogued names again
        self.list()?;
        Ok(names.len())
    }

    pub fn flush(&self) -> CounterResult<()> {
        self.db.flush().inspect_err(log_err!("flushing counters"))?;
        Ok(())
    }

    fn bucket(
        &self,
        resolution: Resolution,
        instant: DateTime<Utc>,
    ) -> Option<BucketIndex> {
        clock::aligned_start(instant, resolution, self.time_zone)
            .map(|start| BucketIndex::new(resolution, start))
    }

    fn stripe(&self, name: &str) -> &RwLock<()> {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        &self.stripes[hasher.finish() as usize % self.stripes.len()]
    }
}

impl fmt::Debug for CounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterStore")
            .field("time_zone", &self.time_zone)
            .finish_non_exhaustive()
    }
}

fn record_failure<T>(result: CounterResult<T>) -> CounterResult<T> {
    result.inspect_err(|err| metrics::inc_increment_failures(err))
}

fn validate_name(name: &str) -> CounterResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        let shown = name.chars().take(64).collect();
        return Err(CounterError::InvalidName(shown));
    }
    Ok(())
}

fn validate_amount(amount: f64) -> CounterResult<u64> {
    let valid = amount.is_finite()
        && amount >= 0.0
        && amount.fract() == 0.0
        && amount < u64::MAX as f64;
    if !valid {
        return Err(CounterError::InvalidIncrement(amount));
    }
    Ok(amount as u64)
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{mpsc, Barrier},
        thread,
        time::Duration,
    };

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_amount_validation() {
        assert_eq!(validate_amount(0.0).unwrap(), 0);
        assert_eq!(validate_amount(43.0).unwrap(), 43);
        assert_eq!(validate_amount(-0.0).unwrap(), 0);
        for amount in [-1.0, 0.5, f64::NAN, f64::INFINITY, 1e20] {
            assert!(
                matches!(
                    validate_amount(amount),
                    Err(CounterError::InvalidIncrement(_))
                ),
                "{amount}"
            );
        }
    }

    #[test]
    fn test_name_validation() {
        assert!(validate_name("foo").is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(matches!(
            validate_name(""),
            Err(CounterError::InvalidName(_))
        ));
        assert!(matches!(
            validate_name(&"x".repeat(MAX_NAME_LEN + 1)),
            Err(CounterError::InvalidName(_))
        ));
    }

    #[test]
    fn test_rejected_increment_leaves_no_trace() {
        let store = CounterStore::in_memory(StoreOptions::default());
        let at = utc("2024-05-05T05:05:05Z");
        let err = store.increment("foo", -1.0, at).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.as_str(), "invalid_increment");
        assert!(store.increment("", 1.0, at).is_err());
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.get("foo", Resolution::Year, at).unwrap(), 0);
    }

    #[test]
    fn test_get_aligns_instant() {
        let store = CounterStore::in_memory(StoreOptions::default());
        store
            .increment("foo", 2.0, utc("2024-05-05T05:05:05Z"))
            .unwrap();
        assert_eq!(
            store
                .get("foo", Resolution::Hour, utc("2024-05-05T05:59:59Z"))
                .unwrap(),
            2
        );
        assert_eq!(
            store
                .get("foo", Resolution::Hour, utc("2024-05-05T06:00:00Z"))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_stripes_are_stable_per_name() {
        let store = CounterStore::in_memory(StoreOptions::default());
        assert!(std::ptr::eq(store.stripe("foo"), store.stripe("foo")));
        assert_eq!(store.stripes.len(), STRIPES);
    }

    #[test]
    fn test_reset_waits_for_in_flight_increment() {
        let store = Arc::new(CounterStore::in_memory(StoreOptions::default()));
        let at = utc("2024-05-05T05:05:05Z");

        // hold the stripe the way an in-flight increment does
        let guard = store.stripe("foo").read();
        let day = store.bucket(Resolution::Day, at).unwrap();
        store.db.add("foo", &[day], 7).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let (done_tx, done_rx) = mpsc::channel();
        let handle = {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store.reset("foo").unwrap();
                done_tx.send(()).unwrap();
            })
        };
        barrier.wait();
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(guard);

        done_rx.recv().unwrap();
        handle.join().unwrap();
        assert_eq!(store.get("foo", Resolution::Day, at).unwrap(), 0);
        assert!(store.list().unwrap().is_empty());

        // increments after the reset stay visible
        store.increment("foo", 1.0, at).unwrap();
        assert_eq!(store.get("foo", Resolution::Day, at).unwrap(), 1);
        assert_eq!(store.list().unwrap(), vec!["foo"]);
    }

    #[test]
    fn test_reset_all() {
        let store = CounterStore::in_memory(StoreOptions::default());
        let at = utc("2024-05-05T05:05:05Z");
        store.increment("foo", 1.0, at).unwrap();
        store.increment("bar", 1.0, at).unwrap();
        assert_eq!(store.reset_all().unwrap(), 2);
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.reset_all().unwrap(), 0);
    }
}
