//! Time-of-day schedule gate.
//!
//! Counting can be restricted to a daily window (e.g. one production shift).
//! The window has minute resolution and may wrap past midnight:
//!
//! ```text
//!   start <= stop   06:00 ──────────── 22:00            active in [start, stop)
//!   start >  stop   ──── 06:00          22:00 ────       active in [start, 24:00) ∪ [00:00, stop)
//! ```
//!
//! The gate is a pure function of the stored [`Schedule`] and the current
//! wall clock.  It is re-evaluated on every edge; nothing is cached.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Minutes in a day; valid minute-of-day values are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Configured counting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// When `false` the gate always permits counting.
    pub enabled: bool,
    /// Window start, minutes since midnight (0–1439).
    pub start_minute: u16,
    /// Window stop, minutes since midnight (0–1439), exclusive.
    pub stop_minute: u16,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            enabled: false,
            start_minute: 0,
            stop_minute: 0,
        }
    }
}

impl Schedule {
    /// Whether counting is permitted at `minute_of_day`.
    ///
    /// `start == stop` is an empty window: never active while enabled.
    pub fn is_active_at(&self, minute_of_day: u16) -> bool {
        if !self.enabled {
            return true;
        }
        if self.start_minute <= self.stop_minute {
            minute_of_day >= self.start_minute && minute_of_day < self.stop_minute
        } else {
            // Overnight window, wraps around midnight.
            minute_of_day >= self.start_minute || minute_of_day < self.stop_minute
        }
    }

    /// Gate decision at a wall-clock time.  With no valid clock the gate is
    /// open, so an RTC failure never silently stops counting.
    pub fn is_active(&self, now: Option<NaiveTime>) -> bool {
        match now {
            Some(t) => self.is_active_at(minute_of_day(t)),
            None => true,
        }
    }

    fn is_valid(&self) -> bool {
        self.start_minute < MINUTES_PER_DAY && self.stop_minute < MINUTES_PER_DAY
    }
}

/// Minutes since midnight of a wall-clock time.
pub fn minute_of_day(t: NaiveTime) -> u16 {
    (t.hour() * 60 + t.minute()) as u16
}

// ───────────────────────────────────────────────────────────────
// Configuration surface payload
// ───────────────────────────────────────────────────────────────

/// Wire shape of a schedule get/set request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub enabled: bool,
    pub start_hour: u8,
    pub start_minute: u8,
    pub stop_hour: u8,
    pub stop_minute: u8,
}

impl ScheduleRequest {
    /// Parse a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ConfigError> {
        serde_json::from_slice(body).map_err(|_| ConfigError::Malformed)
    }

    /// Range-check and convert to a [`Schedule`].
    pub fn validate(&self) -> Result<Schedule, ConfigError> {
        if self.start_hour > 23 {
            return Err(ConfigError::ValidationFailed("startHour must be 0–23"));
        }
        if self.start_minute > 59 {
            return Err(ConfigError::ValidationFailed("startMinute must be 0–59"));
        }
        if self.stop_hour > 23 {
            return Err(ConfigError::ValidationFailed("stopHour must be 0–23"));
        }
        if self.stop_minute > 59 {
            return Err(ConfigError::ValidationFailed("stopMinute must be 0–59"));
        }
        let schedule = Schedule {
            enabled: self.enabled,
            start_minute: u16::from(self.start_hour) * 60 + u16::from(self.start_minute),
            stop_minute: u16::from(self.stop_hour) * 60 + u16::from(self.stop_minute),
        };
        debug_assert!(schedule.is_valid());
        Ok(schedule)
    }

    /// JSON body for a schedule get response.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<Schedule> for ScheduleRequest {
    fn from(s: Schedule) -> Self {
        Self {
            enabled: s.enabled,
            start_hour: (s.start_minute / 60) as u8,
            start_minute: (s.start_minute % 60) as u8,
            stop_hour: (s.stop_minute / 60) as u8,
            stop_minute: (s.stop_minute % 60) as u8,
        }
    }
}

/// Clamp a schedule restored from storage into range; a corrupt value
/// falls back to the disabled default rather than poisoning the gate.
pub fn sanitize(schedule: Schedule) -> Schedule {
    if schedule.is_valid() {
        schedule
    } else {
        log::warn!("schedule: stored window out of range, using default");
        Schedule::default()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
