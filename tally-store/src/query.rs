use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::*;
use tally_metrics::metrics;

use crate::{
    clock,
    errors::{CounterError, CounterResult},
    CounterStore, Resolution,
};

/// Source of the instant a window ends at when the caller doesn't give one
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Totals of consecutive buckets of one counter, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCounts {
    pub name: String,
    pub resolution: Resolution,
    pub buckets: Vec<DateTime<Utc>>,
    pub counts: Vec<u64>,
}

impl AggregateCounts {
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, u64)> + '_ {
        self.buckets.iter().copied().zip(self.counts.iter().copied())
    }

    pub fn total(&self) -> u64 {
        self.counts
            .iter()
            .fold(0u64, |total, count| total.saturating_add(*count))
    }
}

/// Reads windows of bucket totals out of a [`CounterStore`]
pub struct QueryAssembler<C = SystemClock> {
    store: Arc<CounterStore>,
    clock: C,
}

impl QueryAssembler {
    pub fn new(store: Arc<CounterStore>) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<C: Clock> QueryAssembler<C> {
    pub fn with_clock(store: Arc<CounterStore>, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<CounterStore> {
        &self.store
    }

    /// Exactly `count` totals of `name` at `resolution`, the last one being
    /// the bucket containing `end`; buckets never written read as 0
    pub fn range(
        &self,
        name: &str,
        resolution: Resolution,
        count: usize,
        end: DateTime<Utc>,
    ) -> CounterResult<Vec<u64>> {
        Ok(self.window(name, resolution, count, end)?.counts)
    }

    pub fn window(
        &self,
        name: &str,
        resolution: Resolution,
        count: usize,
        end: DateTime<Utc>,
    ) -> CounterResult<AggregateCounts> {
        if count == 0 {
            return Err(CounterError::InvalidWindow(count));
        }
        metrics::inc_queries(&resolution);
        metrics::observe_query_duration(|| -> CounterResult<AggregateCounts> {
            let buckets = clock::sequence(
                end,
                resolution,
                count,
                self.store.time_zone(),
            )
            .ok_or(CounterError::InvalidWindow(count))?;
            let counts = self.store.get_many(name, resolution, &buckets)?;
            debug!(
                "Assembled {count} {resolution} buckets of {name} to {end}"
            );
            Ok(AggregateCounts {
                name: name.to_string(),
                resolution,
                buckets,
                counts,
            })
        })
    }

    /// The last `count` buckets of `name` ending now
    pub fn get_counts(
        &self,
        name: &str,
        count: usize,
        resolution: Resolution,
    ) -> CounterResult<Vec<u64>> {
        self.get_counts_at(name, count, self.clock.now(), resolution)
    }

    pub fn get_counts_at(
        &self,
        name: &str,
        count: usize,
        end: DateTime<Utc>,
        resolution: Resolution,
    ) -> CounterResult<Vec<u64>> {
        self.range(name, resolution, count, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreOptions;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn assembler(now: &str) -> QueryAssembler<FixedClock> {
        let store = Arc::new(CounterStore::in_memory(StoreOptions::default()));
        QueryAssembler::with_clock(store, FixedClock(utc(now)))
    }

    #[test]
    fn test_empty_window_is_invalid() {
        let assembler = assembler("2024-01-01T00:00:00Z");
        assert!(matches!(
            assembler.get_counts("foo", 0, Resolution::Hour),
            Err(CounterError::InvalidWindow(0))
        ));
    }

    #[test]
    fn test_window_leaving_calendar_is_invalid() {
        let assembler = assembler("2024-01-01T00:00:00Z");
        assert!(matches!(
            assembler.range(
                "foo",
                Resolution::Year,
                2,
                DateTime::<Utc>::MIN_UTC
            ),
            Err(CounterError::InvalidWindow(2))
        ));
    }

    #[test]
    fn test_unknown_counter_reads_zeros() {
        let assembler = assembler("2024-01-01T00:00:00Z");
        assert_eq!(
            assembler.get_counts("nobody", 3, Resolution::Day).unwrap(),
            vec![0, 0, 0]
        );
    }

    #[test]
    fn test_window_carries_bucket_starts() {
        let assembler = assembler("2024-03-10T12:34:56Z");
        let store = assembler.store().clone();
        store.increment("foo", 2.0, utc("2024-01-20T00:00:00Z")).unwrap();
        store.increment("foo", 5.0, utc("2024-03-01T00:00:00Z")).unwrap();

        let window = assembler
            .window("foo", Resolution::Month, 3, utc("2024-03-10T12:34:56Z"))
            .unwrap();
        assert_eq!(window.name, "foo");
        assert_eq!(window.resolution, Resolution::Month);
        assert_eq!(
            window.iter().collect::<Vec<_>>(),
            vec![
                (utc("2024-01-01T00:00:00Z"), 2),
                (utc("2024-02-01T00:00:00Z"), 0),
                (utc("2024-03-01T00:00:00Z"), 5),
            ]
        );
        assert_eq!(window.total(), 7);
    }

    #[test]
    fn test_get_counts_uses_clock() {
        let assembler = assembler("2024-03-10T12:34:56Z");
        assembler
            .store()
            .increment("foo", 1.0, utc("2024-03-10T11:00:00Z"))
            .unwrap();
        assert_eq!(
            assembler.get_counts("foo", 3, Resolution::Hour).unwrap(),
            vec![0, 1, 0]
        );
        assert_eq!(
            assembler
                .get_counts_at(
                    "foo",
                    2,
                    utc("2024-03-10T11:59:59Z"),
                    Resolution::Hour
                )
                .unwrap(),
            vec![0, 1]
        );
    }
}
