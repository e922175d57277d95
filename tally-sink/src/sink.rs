use std::{fmt, sync::Arc, time::Duration};

use chrono::Utc;
use log::*;
use tally_config::{types::StoreBackend, SinkParams};
use tally_ingest::{IngestAdapter, Payload};
use tally_metrics::metrics::{self, Outcome};
use tally_store::{CounterResult, CounterStore, StoreOptions};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    select,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

const MIN_REFRESH: Duration = Duration::from_millis(100);

/// Opens the store the configuration names, wiping it first if asked to
pub fn open_store(params: &SinkParams) -> CounterResult<CounterStore> {
    let options = StoreOptions::with_time_zone(*params.store.time_zone);
    let store = match params.store.backend {
        StoreBackend::Rocksdb => {
            CounterStore::open(&params.database_path(), options)?
        }
        StoreBackend::Memory => CounterStore::in_memory(options),
    };
    if params.store.reset {
        let count = store.reset_all()?;
        info!("Reset {count} counters on startup");
    }
    Ok(store)
}

/// Tally of what became of the events a [`Sink`] handled
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    pub stored: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl SinkStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Stored => self.stored += 1,
            Outcome::Rejected => self.rejected += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.stored + self.rejected + self.failed
    }
}

impl fmt::Display for SinkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} events: {} stored, {} rejected, {} failed",
            self.total(),
            self.stored,
            self.rejected,
            self.failed
        )
    }
}

pub struct Sink {
    adapter: IngestAdapter,
    store: Arc<CounterStore>,
    stats: SinkStats,
}

impl Sink {
    pub fn new(adapter: IngestAdapter, store: Arc<CounterStore>) -> Self {
        Self {
            adapter,
            store,
            stats: SinkStats::default(),
        }
    }

    pub fn store(&self) -> &Arc<CounterStore> {
        &self.store
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
    }

    /// Extracts one event from `line` and applies it to the store.
    ///
    /// Events that can't be extracted or that the store refuses are dropped
    /// with a warning, storage failures are logged as errors by the store.
    pub fn handle_line(&mut self, line: &str) -> Outcome {
        let payload = Payload::parse(line);
        let outcome = match self.adapter.extract(&payload, Utc::now()) {
            Err(err) => {
                warn!("Dropping event {line:?}: {err}");
                Outcome::Rejected
            }
            Ok(event) => match self.store.increment(
                &event.name,
                event.amount,
                event.timestamp,
            ) {
                Ok(()) => Outcome::Stored,
                Err(err) if err.is_validation() => {
                    warn!("Dropping event {line:?}: {err}");
                    Outcome::Rejected
                }
                Err(_) => Outcome::Failed,
            },
        };
        metrics::inc_ingested_events(outcome);
        self.stats.record(outcome);
        outcome
    }

    /// Handles lines from `reader` until it is exhausted or `cancel` fires.
    ///
    /// Every `refresh` the catalog is listed, which keeps the catalog size
    /// gauge current.
    pub async fn run<R>(
        &mut self,
        reader: R,
        refresh: Duration,
        cancel: CancellationToken,
    ) -> std::io::Result<SinkStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut refresh = interval(refresh.max(MIN_REFRESH));
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            select! {
                _ = cancel.cancelled() => {
                    info!("Stopped reading events");
                    break;
                }
                _ = refresh.tick() => {
                    if let Ok(names) = self.store.list() {
                        debug!("{} counters catalogued", names.len());
                    }
                }
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            self.handle_line(&line);
                        }
                        None => {
                            info!("Reached end of input");
                            break;
                        }
                    }
                }
            }
        }
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset};
    use tally_config::config::IngestConfig;
    use tally_store::Resolution;
    use test_kit::init_logger;

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn sink(config: IngestConfig) -> Sink {
        let adapter =
            IngestAdapter::try_new(&config, FixedOffset::east_opt(0).unwrap())
                .unwrap();
        let store = CounterStore::in_memory(StoreOptions::default());
        Sink::new(adapter, Arc::new(store))
    }

    fn configured() -> Sink {
        sink(IngestConfig {
            name_field: Some("name".to_string()),
            increment_field: Some("by".to_string()),
            time_field: Some("at".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_handle_line_outcomes() {
        init_logger!();
        let mut sink = configured();
        let at = "2024-03-10T10:00:00Z";
        let line = |by: &str| {
            format!(r#"{{"name": "foo", "by": {by}, "at": "{at}"}}"#)
        };

        assert_eq!(sink.handle_line(&line("2")), Outcome::Stored);
        assert_eq!(sink.handle_line(&line("\"x\"")), Outcome::Rejected);
        assert_eq!(sink.handle_line(&line("-1")), Outcome::Rejected);
        assert_eq!(sink.handle_line(&line("0.5")), Outcome::Rejected);
        assert_eq!(
            sink.handle_line(r#"{"name": "foo", "at": "yesterday"}"#),
            Outcome::Rejected
        );

        assert_eq!(
            sink.stats(),
            SinkStats {
                stored: 1,
                rejected: 4,
                failed: 0,
            }
        );
        let store = sink.store();
        assert_eq!(store.get("foo", Resolution::Day, utc(at)).unwrap(), 2);
    }

    #[test]
    fn test_timestamp_past_local_calendar_is_rejected() {
        init_logger!();
        let zone = FixedOffset::east_opt(14 * 3600).unwrap();
        let config = IngestConfig {
            time_field: Some("ts".to_string()),
            ..Default::default()
        };
        let adapter = IngestAdapter::try_new(&config, zone).unwrap();
        let options = StoreOptions::with_time_zone(zone);
        let store = Arc::new(CounterStore::in_memory(options));
        let mut sink = Sink::new(adapter, store);

        // the last millisecond chrono can represent, as epoch millis
        assert_eq!(
            sink.handle_line(r#"{"ts": 8210266876799999}"#),
            Outcome::Rejected
        );
        assert_eq!(
            sink.handle_line(r#"{"ts": 1710064800000}"#),
            Outcome::Stored
        );
        assert_eq!(sink.stats().rejected, 1);
        assert_eq!(sink.store().list().unwrap(), vec!["aggregate-counter"]);
    }

    #[tokio::test]
    async fn test_run_until_end_of_input() {
        init_logger!();
        let mut sink = configured();
        let input = [
            r#"{"name": "a", "at": "2024-03-10T10:00:00Z"}"#,
            r#"{"name": "a", "by": 4, "at": "2024-03-10T10:30:00Z"}"#,
            r#"{"name": "b", "at": "2024-03-10T11:00:00Z"}"#,
            "not json",
        ]
        .join("\n");

        let stats = sink
            .run(
                input.as_bytes(),
                Duration::from_secs(60),
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(stats.stored, 4);
        assert_eq!(stats.total(), 4);

        let store = sink.store();
        // the text line falls back to the default counter at arrival time
        assert_eq!(
            store.list().unwrap(),
            vec!["a", "aggregate-counter", "b"]
        );
        assert_eq!(
            store
                .get("a", Resolution::Hour, utc("2024-03-10T10:00:00Z"))
                .unwrap(),
            5
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_cancelled() {
        let mut sink = configured();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (reader, _writer) = tokio::io::duplex(64);
        let stats = sink
            .run(
                tokio::io::BufReader::new(reader),
                Duration::from_secs(60),
                cancel,
            )
            .await
            .unwrap();
        assert_eq!(stats, SinkStats::default());
    }

    #[test]
    fn test_open_memory_store() {
        let params = SinkParams {
            store: tally_config::config::StoreConfig {
                backend: StoreBackend::Memory,
                reset: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let store = open_store(&params).unwrap();
        assert!(store.list().unwrap().is_empty());
    }
}
