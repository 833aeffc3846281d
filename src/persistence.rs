//! Persistence checkpointer — durable state over [`StoragePort`].
//!
//! Every durable field is stored under its own stable key in the
//! [`NAMESPACE`] namespace, postcard-encoded.  Writes are rate-limited by an
//! interval gate (flash wear) with a bypass for transitions that must not be
//! lost:
//!
//! ```text
//!   maybe_checkpoint(now) ──▶ [now - last_ok >= save_interval?] ──▶ write all keys
//!   force_checkpoint(now) ─────────────────────────────────────────▶ write all keys
//! ```
//!
//! A failed write leaves the gate closed on the old timestamp, so the next
//! `maybe_checkpoint` call retries immediately.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::{StorageError, StoragePort};
use crate::config::NetworkIdentity;
use crate::error::Result;
use crate::rate::{RateState, is_plausible};
use crate::schedule::{Schedule, sanitize};

/// NVS namespace holding the durable counter image.
pub const NAMESPACE: &str = "counter";

/// Stable storage keys, one per durable field.
pub mod keys {
    pub const COUNT: &str = "count";
    pub const LAST_SAMPLE_MS: &str = "lastTimeCheck";
    pub const LAST_SAMPLE_COUNT: &str = "lastCountCheck";
    pub const AVG_PER_MINUTE: &str = "avgCPM";
    pub const AVG_PER_HOUR: &str = "avgCPH";
    pub const LAST_LOG_COUNT: &str = "lastLogCount";
    pub const SCHEDULE: &str = "schedule";
    pub const SSID: &str = "ssid";
    pub const PASSWORD: &str = "password";
    pub const LAST_DATE: &str = "lastDate";
}

/// Largest encoded value (a 64-byte password plus its length prefix).
const MAX_VALUE_LEN: usize = 80;

/// Everything that must survive a power cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DurableState {
    pub count: u32,
    pub rate: RateState,
    /// Count at the last successful append-log row.
    pub last_log_count: u32,
    pub schedule: Schedule,
    pub network: NetworkIdentity,
    /// Last calendar day seen by the rollover controller.
    pub last_date: Option<NaiveDate>,
}

/// Interval-gated writer of [`DurableState`].
#[derive(Debug, Clone)]
pub struct Checkpointer {
    save_interval_ms: u64,
    last_write_ms: u64,
    /// Image of the last successful write; unchanged state is not rewritten.
    last_written: Option<DurableState>,
}

impl Checkpointer {
    pub fn new(save_interval_ms: u32) -> Self {
        Self {
            save_interval_ms: u64::from(save_interval_ms),
            last_write_ms: 0,
            last_written: None,
        }
    }

    /// Restore durable state, with explicit defaults for absent or corrupt keys.
    ///
    /// The stored rate anchor is uptime from an earlier boot and means nothing
    /// now, so it is always re-baselined to `(now_ms, count)`; the first tick
    /// after boot then measures only counts made since boot.  Averages that
    /// are negative, non-finite or above [`MAX_RATE`](crate::rate::MAX_RATE)
    /// are cleared.  The interval gate starts at `now_ms`.
    pub fn load_at_startup(&mut self, storage: &impl StoragePort, now_ms: u64) -> DurableState {
        let mut state = DurableState {
            count: read_or(storage, keys::COUNT, 0),
            rate: RateState {
                per_minute: read_or(storage, keys::AVG_PER_MINUTE, 0.0f64),
                per_hour: read_or(storage, keys::AVG_PER_HOUR, 0.0f64),
                last_sample_ms: read_or(storage, keys::LAST_SAMPLE_MS, 0),
                last_sample_count: read_or(storage, keys::LAST_SAMPLE_COUNT, 0),
            },
            last_log_count: read_or(storage, keys::LAST_LOG_COUNT, 0),
            schedule: sanitize(read_or(storage, keys::SCHEDULE, Schedule::default())),
            network: read_network(storage),
            last_date: read_or::<Option<i32>>(storage, keys::LAST_DATE, None)
                .and_then(NaiveDate::from_num_days_from_ce_opt),
        };

        if !is_plausible(state.rate.per_minute) {
            state.rate.per_minute = 0.0;
        }
        if !is_plausible(state.rate.per_hour) {
            state.rate.per_hour = 0.0;
        }
        state.rate.last_sample_ms = now_ms;
        state.rate.last_sample_count = state.count;

        self.last_write_ms = now_ms;
        info!(
            "checkpoint: restored count={} cpm={:.2} cph={:.2} schedule={:?}",
            state.count, state.rate.per_minute, state.rate.per_hour, state.schedule
        );
        state
    }

    /// Write `state` if at least `save_interval` has passed since the last
    /// successful write.  Returns `Ok(true)` when a write happened.
    pub fn maybe_checkpoint(
        &mut self,
        now_ms: u64,
        state: &DurableState,
        storage: &mut impl StoragePort,
    ) -> Result<bool> {
        if now_ms.saturating_sub(self.last_write_ms) < self.save_interval_ms {
            return Ok(false);
        }
        if self.last_written.as_ref() == Some(state) {
            self.last_write_ms = now_ms;
            debug!("checkpoint: state unchanged, skipped");
            return Ok(false);
        }
        self.write(now_ms, state, storage)?;
        Ok(true)
    }

    /// Write `state` now, bypassing the interval gate.  All keys are
    /// committed before this returns.
    pub fn force_checkpoint(
        &mut self,
        now_ms: u64,
        state: &DurableState,
        storage: &mut impl StoragePort,
    ) -> Result<()> {
        self.write(now_ms, state, storage)
    }

    /// Monotonic ms of the last successful write (boot time before the first).
    pub fn last_write_ms(&self) -> u64 {
        self.last_write_ms
    }

    fn write(
        &mut self,
        now_ms: u64,
        state: &DurableState,
        storage: &mut impl StoragePort,
    ) -> Result<()> {
        let result = write_all(state, storage);
        if let Err(e) = result {
            warn!("checkpoint: write failed ({}), keeping state in memory", e);
            return Err(e.into());
        }
        self.last_write_ms = now_ms;
        self.last_written = Some(state.clone());
        info!(
            "checkpoint: saved count={} cpm={:.2} cph={:.2}",
            state.count, state.rate.per_minute, state.rate.per_hour
        );
        Ok(())
    }
}

fn write_all(state: &DurableState, storage: &mut impl StoragePort) -> core::result::Result<(), StorageError> {
    put(storage, keys::COUNT, &state.count)?;
    put(storage, keys::AVG_PER_MINUTE, &state.rate.per_minute)?;
    put(storage, keys::AVG_PER_HOUR, &state.rate.per_hour)?;
    put(storage, keys::LAST_SAMPLE_MS, &state.rate.last_sample_ms)?;
    put(storage, keys::LAST_SAMPLE_COUNT, &state.rate.last_sample_count)?;
    put(storage, keys::LAST_LOG_COUNT, &state.last_log_count)?;
    put(storage, keys::SCHEDULE, &state.schedule)?;
    put(storage, keys::SSID, &state.network.ssid)?;
    put(storage, keys::PASSWORD, &state.network.password)?;
    let days = state.last_date.map(|d| chrono::Datelike::num_days_from_ce(&d));
    put(storage, keys::LAST_DATE, &days)
}

fn put<T: Serialize>(
    storage: &mut impl StoragePort,
    key: &str,
    value: &T,
) -> core::result::Result<(), StorageError> {
    let mut buf = [0u8; MAX_VALUE_LEN];
    let bytes = postcard::to_slice(value, &mut buf).map_err(|_| StorageError::Encode)?;
    storage.write(NAMESPACE, key, bytes)
}

/// Read and decode `key`, falling back to `default` when absent or corrupt.
fn read_or<T: DeserializeOwned>(storage: &impl StoragePort, key: &str, default: T) -> T {
    let mut buf = [0u8; MAX_VALUE_LEN];
    match storage.read(NAMESPACE, key, &mut buf) {
        Ok(n) => match postcard::from_bytes(&buf[..n]) {
            Ok(v) => v,
            Err(_) => {
                warn!("checkpoint: key '{}' corrupt, using default", key);
                default
            }
        },
        Err(StorageError::NotFound) => default,
        Err(e) => {
            warn!("checkpoint: key '{}' unreadable ({}), using default", key, e);
            default
        }
    }
}

/// SSID and password are validated as a pair; either one bad restores both
/// defaults.
fn read_network(storage: &impl StoragePort) -> NetworkIdentity {
    let fallback = NetworkIdentity::default();
    let ssid: heapless::String<32> = read_or(storage, keys::SSID, fallback.ssid.clone());
    let password: heapless::String<64> = read_or(storage, keys::PASSWORD, fallback.password.clone());
    NetworkIdentity::new(&ssid, &password).unwrap_or_else(|_| {
        warn!("checkpoint: stored network identity invalid, using default");
        fallback
    })
}
