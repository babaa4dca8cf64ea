//! Integration tests for the bounded ring store
//!
//! Exercises the properties the in-file unit tests cannot: durability across
//! reopen, and the capacity invariant under concurrent writers hammering the
//! same store.

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use hygrolog_core::{Reading, RingStore};

fn reading_at(seconds: i64, temperature: f64) -> Reading {
    let timestamp =
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(seconds);
    Reading::new(timestamp, "A4:C1:38:AA:BB:CC", temperature, 55.5, Some(90))
}

#[test]
fn reopening_the_store_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data.db");

    {
        let store = RingStore::open(&path, 3).unwrap();
        for i in 0..5 {
            store.save(&reading_at(i, f64::from(i as i32))).unwrap();
        }
    }

    // Schema init is idempotent and existing rows survive
    let store = RingStore::open(&path, 3).unwrap();
    let rows = store.recent_default().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].temperature, 4.0);
    assert_eq!(rows[2].temperature, 2.0);
}

#[test]
fn concurrent_saves_never_exceed_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RingStore::open(dir.path().join("sensor_data.db"), 3).unwrap());

    let mut handles = Vec::new();
    for worker in 0..4 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let reading = reading_at(i64::from(worker) * 100 + i, f64::from(worker));
                store.save(&reading).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    // 100 interleaved saves, and the ring never grew past its capacity
    assert_eq!(store.count().unwrap(), 3);
    assert_eq!(store.recent_default().unwrap().len(), 3);
}

#[test]
fn queries_interleaved_with_saves_see_consistent_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RingStore::open(dir.path().join("sensor_data.db"), 3).unwrap());

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..50 {
                store.save(&reading_at(i, 20.0)).unwrap();
            }
        })
    };

    for _ in 0..50 {
        let rows = store.recent_default().unwrap();
        assert!(rows.len() <= 3);
        // Newest-first ordering holds in every snapshot
        for pair in rows.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }
    writer.join().unwrap();
}
