use std::{
    sync::{Arc, Barrier},
    thread,
};

use tally_store::Resolution;
use test_kit::init_logger;

mod common;
use common::{stores, utc};

const THREADS: usize = 8;
const ROUNDS: u64 = 250;

#[test]
fn test_concurrent_increments_are_not_lost() {
    init_logger!();
    let at = utc("2024-03-10T10:10:10Z");
    for t in stores() {
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles = (0..THREADS)
            .map(|_| {
                let store = t.store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..ROUNDS {
                        store.increment("hits", 3.0, at).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let expected = THREADS as u64 * ROUNDS * 3;
        for resolution in Resolution::ALL {
            assert_eq!(
                t.store.get("hits", resolution, at).unwrap(),
                expected,
                "{} {resolution}",
                t.medium
            );
        }
    }
}

#[test]
fn test_reset_racing_increments_never_tears_buckets() {
    init_logger!();
    let at = utc("2024-03-10T10:10:10Z");
    for t in stores() {
        let barrier = Arc::new(Barrier::new(THREADS + 1));
        let writers = (0..THREADS)
            .map(|_| {
                let store = t.store.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    for _ in 0..ROUNDS {
                        store.increment("race", 1.0, at).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        let resetter = {
            let store = t.store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..20 {
                    store.reset("race").unwrap();
                }
            })
        };
        for handle in writers {
            handle.join().unwrap();
        }
        resetter.join().unwrap();

        // every increment hits all resolutions under the same stripe, so
        // whatever survived the resets is identical across resolutions
        let minute = t.store.get("race", Resolution::Minute, at).unwrap();
        assert!(minute <= THREADS as u64 * ROUNDS);
        for resolution in Resolution::ALL {
            assert_eq!(
                t.store.get("race", resolution, at).unwrap(),
                minute,
                "{} {resolution}",
                t.medium
            );
        }
        let listed = t.store.list().unwrap().contains(&"race".to_string());
        assert_eq!(listed, !t.store.buckets("race").unwrap().is_empty());

        t.store.reset("race").unwrap();
        t.store.increment("race", 1.0, at).unwrap();
        assert_eq!(t.store.get("race", Resolution::Year, at).unwrap(), 1);
    }
}

#[test]
fn test_catalog_matches_buckets_under_concurrent_names() {
    init_logger!();
    let at = utc("2024-03-10T10:10:10Z");
    for t in stores() {
        let handles = (0..THREADS)
            .map(|i| {
                let store = t.store.clone();
                thread::spawn(move || {
                    let name = format!("counter-{i}");
                    for _ in 0..50 {
                        store.increment(&name, 1.0, at).unwrap();
                    }
                    if i % 2 == 0 {
                        store.reset(&name).unwrap();
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }

        let names = t.store.list().unwrap();
        assert_eq!(
            names,
            vec!["counter-1", "counter-3", "counter-5", "counter-7"],
            "{}",
            t.medium
        );
        for name in names {
            assert_eq!(t.store.get(&name, Resolution::Hour, at).unwrap(), 50);
        }
    }
}
