//! Fuzz target: restoring durable state from damaged flash
//!
//! Splits the input into values for every checkpoint key and verifies:
//! - `load_at_startup` never panics on arbitrary stored bytes
//! - Restored averages are finite and non-negative
//! - A restored schedule is always inside one day
//!
//! cargo fuzz run fuzz_durable_load

#![no_main]

use drumcounter::app::ports::{StorageError, StoragePort};
use drumcounter::persistence::{Checkpointer, NAMESPACE, keys};
use drumcounter::schedule::MINUTES_PER_DAY;
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

// ── In-memory StoragePort for fuzz testing ────────────────────

struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.data.get(&format!("{ns}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }
}

const KEYS: [&str; 10] = [
    keys::COUNT,
    keys::LAST_SAMPLE_MS,
    keys::LAST_SAMPLE_COUNT,
    keys::AVG_PER_MINUTE,
    keys::AVG_PER_HOUR,
    keys::LAST_LOG_COUNT,
    keys::SCHEDULE,
    keys::SSID,
    keys::PASSWORD,
    keys::LAST_DATE,
];

fuzz_target!(|data: &[u8]| {
    let mut store = MemStore { data: HashMap::new() };

    // Each value is prefixed by one length byte; missing tail keys stay absent.
    let mut rest = data;
    for key in KEYS {
        let Some((&len, tail)) = rest.split_first() else { break };
        let len = usize::from(len).min(tail.len());
        store.data.insert(format!("{NAMESPACE}::{key}"), tail[..len].to_vec());
        rest = &tail[len..];
    }

    let state = Checkpointer::new(5000).load_at_startup(&store, 1);
    assert!(state.rate.per_minute.is_finite() && state.rate.per_minute >= 0.0);
    assert!(state.rate.per_hour.is_finite() && state.rate.per_hour >= 0.0);
    assert!(state.schedule.start_minute < MINUTES_PER_DAY);
    assert!(state.schedule.stop_minute < MINUTES_PER_DAY);
    assert!(!state.network.ssid.is_empty());
});
