//! ESP32 time adapter.
//!
//! Provides the two time bases the counter needs:
//!
//! - monotonic uptime in milliseconds (debounce, rate ticks, checkpoint
//!   gate), never affected by wall-clock changes;
//! - local wall-clock time through [`ClockPort`] (schedule gate, rollover,
//!   log rows), shifted from UTC by the configured offset.
//!
//! - **`target_os = "espidf"`** — `esp_timer_get_time()` for uptime and
//!   `gettimeofday` / `settimeofday` for the wall clock.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` for uptime and
//!   a settable simulated wall clock for host-side testing.

use chrono::NaiveDateTime;
#[cfg(not(target_os = "espidf"))]
use chrono::TimeDelta;

use crate::app::ports::{ClockError, ClockPort};

/// Anything before 2020-01-01 means the RTC was never set.
pub const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    utc_offset_secs: i32,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    /// Simulated wall clock: local time at `set_at`.
    #[cfg(not(target_os = "espidf"))]
    wall: Option<(NaiveDateTime, std::time::Instant)>,
}

impl Esp32TimeAdapter {
    pub fn new(utc_offset_secs: i32) -> Self {
        Self {
            utc_offset_secs,
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            wall: None,
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn utc_offset_secs(&self) -> i32 {
        self.utc_offset_secs
    }
}

#[cfg(target_os = "espidf")]
impl ClockPort for Esp32TimeAdapter {
    fn now(&self) -> Option<NaiveDateTime> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        let utc = i64::from(tv.tv_sec);
        if utc < EPOCH_2020 {
            return None;
        }
        let local = utc.checked_add(i64::from(self.utc_offset_secs))?;
        chrono::DateTime::from_timestamp(local, 0).map(|dt| dt.naive_utc())
    }

    fn set(&mut self, local: NaiveDateTime) -> Result<(), ClockError> {
        let utc = local.and_utc().timestamp() - i64::from(self.utc_offset_secs);
        if utc < EPOCH_2020 {
            return Err(ClockError::OutOfRange);
        }
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: utc as _,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::settimeofday(&tv, core::ptr::null()) } != 0 {
            return Err(ClockError::WriteFailed);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl ClockPort for Esp32TimeAdapter {
    fn now(&self) -> Option<NaiveDateTime> {
        let (base, at) = self.wall?;
        let elapsed = TimeDelta::from_std(at.elapsed()).ok()?;
        base.checked_add_signed(elapsed)
    }

    fn set(&mut self, local: NaiveDateTime) -> Result<(), ClockError> {
        let utc = local.and_utc().timestamp() - i64::from(self.utc_offset_secs);
        if utc < EPOCH_2020 {
            return Err(ClockError::OutOfRange);
        }
        self.wall = Some((local, std::time::Instant::now()));
        Ok(())
    }
}
