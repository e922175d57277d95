use std::sync::Once;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry,
};
pub use types::{LabelValue, Outcome};

mod types;

// -----------------
// Buckets
// -----------------
// Prometheus collects durations in seconds
const MICROS_10_90: [f64; 9] = [
    0.000_01, 0.000_02, 0.000_03, 0.000_04, 0.000_05, 0.000_06, 0.000_07,
    0.000_08, 0.000_09,
];
const MICROS_100_900: [f64; 9] = [
    0.000_1, 0.000_2, 0.000_3, 0.000_4, 0.000_5, 0.000_6, 0.000_7, 0.000_8,
    0.000_9,
];
const MILLIS_1_9: [f64; 9] = [
    0.001, 0.002, 0.003, 0.004, 0.005, 0.006, 0.007, 0.008, 0.009,
];
const MILLIS_10_90: [f64; 9] =
    [0.01, 0.02, 0.03, 0.04, 0.05, 0.06, 0.07, 0.08, 0.09];
const MILLIS_100_900: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

lazy_static::lazy_static! {
    pub (crate) static ref REGISTRY: Registry =
        Registry::new_custom(Some("tally".to_string()), None).unwrap();

    // -----------------
    // Store
    // -----------------
    static ref INCREMENTS_COUNT: IntCounter = IntCounter::new(
        "increments_count", "Number of increments applied to the store",
    ).unwrap();

    static ref INCREMENT_FAILURES_COUNT: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "increment_failures_count",
            "Number of rejected or failed increments by error kind",
        ),
        &["kind"],
    ).unwrap();

    static ref RESETS_COUNT: IntCounter = IntCounter::new(
        "resets_count", "Number of counter resets",
    ).unwrap();

    static ref CATALOG_SIZE_GAUGE: IntGauge = IntGauge::new(
        "catalog_size_gauge", "Number of counters currently in the catalog",
    ).unwrap();

    // -----------------
    // Queries
    // -----------------
    static ref QUERIES_COUNT: IntCounterVec = IntCounterVec::new(
        Opts::new("queries_count", "Number of window queries by resolution"),
        &["resolution"],
    ).unwrap();

    pub static ref QUERY_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "query_duration_seconds",
            "Time taken to assemble a window of bucket totals"
        )
        .buckets(
            MICROS_10_90.iter().chain(
            MICROS_100_900.iter()).chain(
            MILLIS_1_9.iter()).chain(
            MILLIS_10_90.iter()).chain(
            MILLIS_100_900.iter()).cloned().collect()
        ),
    ).unwrap();

    // -----------------
    // Ingest
    // -----------------
    static ref INGESTED_EVENTS_COUNT: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "ingested_events_count",
            "Number of events read by the sink by outcome",
        ),
        &["outcome"],
    ).unwrap();
}

pub fn register() {
    static REGISTER: Once = Once::new();
    REGISTER.call_once(|| {
        macro_rules! register {
            ($collector:ident) => {
                REGISTRY
                    .register(Box::new($collector.clone()))
                    .expect("collector can't be registered");
            };
        }
        register!(INCREMENTS_COUNT);
        register!(INCREMENT_FAILURES_COUNT);
        register!(RESETS_COUNT);
        register!(CATALOG_SIZE_GAUGE);
        register!(QUERIES_COUNT);
        register!(QUERY_DURATION_SECONDS);
        register!(INGESTED_EVENTS_COUNT);
    });
}

pub fn inc_increments() {
    INCREMENTS_COUNT.inc();
}

pub fn inc_increment_failures(kind: &impl LabelValue) {
    INCREMENT_FAILURES_COUNT
        .with_label_values(&[kind.value()])
        .inc();
}

pub fn inc_resets() {
    RESETS_COUNT.inc();
}

/// Sets the absolute number of catalogued counters, not a delta
pub fn set_catalog_size(count: usize) {
    CATALOG_SIZE_GAUGE.set(count as i64);
}

pub fn catalog_size() -> i64 {
    CATALOG_SIZE_GAUGE.get()
}

pub fn inc_queries(resolution: &impl LabelValue) {
    QUERIES_COUNT.with_label_values(&[resolution.value()]).inc();
}

pub fn observe_query_duration<F, T>(f: F) -> T
where
    F: FnOnce() -> T,
{
    QUERY_DURATION_SECONDS.observe_closure_duration(f)
}

pub fn inc_ingested_events(outcome: Outcome) {
    INGESTED_EVENTS_COUNT
        .with_label_values(&[outcome.as_str()])
        .inc();
}

/// Renders all registered collectors in the prometheus text format
pub fn encode() -> Result<String, prometheus::Error> {
    prometheus::TextEncoder::new().encode_to_string(&REGISTRY.gather())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_metrics_are_prefixed() {
        register();
        // registering twice must not panic
        register();

        inc_increments();
        inc_increment_failures(&Outcome::Rejected);
        inc_ingested_events(Outcome::Stored);
        set_catalog_size(3);

        let text = encode().unwrap();
        assert!(text.contains("tally_increments_count"));
        assert!(text.contains("tally_catalog_size_gauge 3"));
        let stored = r#"tally_ingested_events_count{outcome="stored"}"#;
        let rejected = r#"tally_increment_failures_count{kind="rejected"}"#;
        assert!(text.contains(stored));
        assert!(text.contains(rejected));
    }

    #[test]
    fn test_result_label_value() {
        let ok: Result<Outcome, Outcome> = Ok(Outcome::Stored);
        let err: Result<Outcome, Outcome> = Err(Outcome::Failed);
        assert_eq!(ok.value(), "stored");
        assert_eq!(err.value(), "failed");
    }
}
