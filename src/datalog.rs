//! Append-only day log (one CSV per calendar day on the SD card).
//!
//! ```text
//!   2024-05-01.csv
//!   time,count,cpm,cph
//!   2024-05-01T08:00:00,120,11.87,402.10
//!   2024-05-01T08:01:00,133,12.02,404.55
//! ```
//!
//! A row is written at most once per log interval, timed from the last
//! successful row, and only when the count moved since that row.  A failed
//! append is retried one interval after the failure.

use core::fmt::Write as _;

use chrono::NaiveDateTime;
use log::{debug, warn};

use crate::app::ports::{LogError, LogSinkPort};

/// First line of every day file.
pub const HEADER: &str = "time,count,cpm,cph";

/// `YYYY-MM-DD`
pub type DayKey = heapless::String<10>;

const ROW_CAP: usize = 64;

type Row = heapless::String<ROW_CAP>;

/// Append target for the current day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCursor {
    pub day_key: DayKey,
    pub header_written: bool,
}

/// Periodic CSV row writer.
#[derive(Debug, Clone)]
pub struct DataLogger {
    interval_ms: u64,
    last_row_ms: Option<u64>,
    last_failure_ms: Option<u64>,
    cursor: Option<LogCursor>,
}

impl DataLogger {
    pub fn new(log_interval_secs: u32) -> Self {
        Self {
            interval_ms: u64::from(log_interval_secs) * 1000,
            last_row_ms: None,
            last_failure_ms: None,
            cursor: None,
        }
    }

    pub fn cursor(&self) -> Option<&LogCursor> {
        self.cursor.as_ref()
    }

    /// Append a row if the interval elapsed and `count != *last_log_count`.
    ///
    /// On success `last_log_count` is advanced to `count`.  Returns
    /// `Ok(true)` when a row was written.  Without a wall clock nothing is
    /// logged.
    pub fn maybe_log(
        &mut self,
        now_ms: u64,
        wall: Option<NaiveDateTime>,
        count: u32,
        rates: (f64, f64),
        last_log_count: &mut u32,
        sink: &mut impl LogSinkPort,
    ) -> Result<bool, LogError> {
        let within = |since: Option<u64>| {
            since.is_some_and(|t| now_ms.saturating_sub(t) < self.interval_ms)
        };
        if within(self.last_row_ms) || within(self.last_failure_ms) {
            return Ok(false);
        }

        let Some(wall) = wall else {
            debug!("datalog: no wall clock, row skipped");
            return Ok(false);
        };
        if count == *last_log_count {
            return Ok(false);
        }

        match self.append_row(&wall, count, rates, sink) {
            Ok(()) => {
                self.last_row_ms = Some(now_ms);
                self.last_failure_ms = None;
                *last_log_count = count;
                Ok(true)
            }
            Err(e) => {
                self.last_failure_ms = Some(now_ms);
                Err(e)
            }
        }
    }

    fn append_row(
        &mut self,
        wall: &NaiveDateTime,
        count: u32,
        rates: (f64, f64),
        sink: &mut impl LogSinkPort,
    ) -> Result<(), LogError> {
        let day_key = day_key(wall).ok_or(LogError::WriteFailed)?;
        let mut row = Row::new();
        write!(
            row,
            "{},{},{:.2},{:.2}",
            wall.format("%Y-%m-%dT%H:%M:%S"),
            count,
            rates.0,
            rates.1
        )
        .map_err(|_| {
            warn!("datalog: row for {} exceeds {} bytes, skipped", day_key, ROW_CAP);
            LogError::WriteFailed
        })?;

        let cursor = self.cursor_for(&day_key, sink);
        if !cursor.header_written {
            sink.append(&day_key, HEADER).inspect_err(|e| {
                warn!("datalog: header for {} failed: {}", day_key, e);
            })?;
            cursor.header_written = true;
        }
        sink.append(&day_key, &row).inspect_err(|e| {
            warn!("datalog: append to {} failed: {}", day_key, e);
        })?;
        debug!("datalog: {} <- {}", day_key, row);
        Ok(())
    }

    /// Cursor for `day_key`, creating it on the first write of a new day.
    fn cursor_for(&mut self, day_key: &DayKey, sink: &impl LogSinkPort) -> &mut LogCursor {
        if self.cursor.as_ref().is_none_or(|c| &c.day_key != day_key) {
            self.cursor = Some(LogCursor {
                day_key: day_key.clone(),
                header_written: sink.exists(day_key),
            });
        }
        self.cursor.get_or_insert_with(|| LogCursor {
            day_key: day_key.clone(),
            header_written: false,
        })
    }
}

/// Day key of a wall-clock instant, or `None` for years that do not fit
/// `YYYY-MM-DD`.
pub fn day_key(wall: &NaiveDateTime) -> Option<DayKey> {
    let mut s = DayKey::new();
    write!(s, "{}", wall.format("%Y-%m-%d")).ok()?;
    Some(s)
}
