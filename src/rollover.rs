//! Daily rollover detection.
//!
//! The count is a per-day total: when the calendar day of the wall clock
//! moves forward, the service resets count and rates together.  The
//! last-seen day is durable so a boundary crossed while powered off is still
//! caught at the first clock reading after boot.

use chrono::NaiveDate;
use log::{info, warn};

/// Tracks the last calendar day observed on the wall clock.
#[derive(Debug, Clone, Default)]
pub struct DailyRollover {
    last_seen: Option<NaiveDate>,
}

impl DailyRollover {
    pub fn new(last_seen: Option<NaiveDate>) -> Self {
        Self { last_seen }
    }

    pub fn last_seen(&self) -> Option<NaiveDate> {
        self.last_seen
    }

    /// Returns `true` exactly once per forward day change.
    ///
    /// The first observation only records the day.  A backwards jump (clock
    /// correction) records the earlier day without firing, so the next real
    /// midnight fires normally.
    pub fn check(&mut self, today: NaiveDate) -> bool {
        let Some(last) = self.last_seen else {
            self.last_seen = Some(today);
            return false;
        };
        if today > last {
            info!("rollover: day changed {} -> {}", last, today);
            self.last_seen = Some(today);
            true
        } else {
            if today < last {
                warn!("rollover: clock moved back {} -> {}, no reset", last, today);
                self.last_seen = Some(today);
            }
            false
        }
    }
}
