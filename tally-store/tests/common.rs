#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_store::{CounterStore, FixedClock, QueryAssembler, StoreOptions};
use test_kit::TestDir;

/// A store on one of the media, keeping its directory alive
pub struct TestStore {
    pub medium: &'static str,
    pub store: Arc<CounterStore>,
    _dir: Option<TestDir>,
}

impl TestStore {
    pub fn assembler(&self, now: DateTime<Utc>) -> QueryAssembler<FixedClock> {
        QueryAssembler::with_clock(self.store.clone(), FixedClock(now))
    }
}

pub fn memory_store(options: StoreOptions) -> TestStore {
    TestStore {
        medium: "memory",
        store: Arc::new(CounterStore::in_memory(options)),
        _dir: None,
    }
}

pub fn rocks_store(options: StoreOptions) -> TestStore {
    let dir = TestDir::new("tally-store");
    let store = CounterStore::open(&dir.join("counters"), options)
        .expect("opening rocksdb store");
    TestStore {
        medium: "rocksdb",
        store: Arc::new(store),
        _dir: Some(dir),
    }
}

/// One fresh store per medium, every shared test runs against all of them
pub fn stores() -> Vec<TestStore> {
    stores_with(StoreOptions::default())
}

pub fn stores_with(options: StoreOptions) -> Vec<TestStore> {
    vec![memory_store(options.clone()), rocks_store(options)]
}

pub fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}
