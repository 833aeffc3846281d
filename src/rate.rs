//! Rate estimator — exponentially smoothed counts per minute and per hour.
//!
//! Called on a fixed cadence (1 Hz on device) with the current count.  Each
//! tick derives the instantaneous rate over the window since the previous
//! sample and folds it into two EMAs:
//!
//! ```text
//!   r      = Δcount / Δt
//!   cpm'   = α_min  · r·60 s   + (1 − α_min)  · cpm
//!   cph'   = α_hour · r·3600 s + (1 − α_hour) · cph
//! ```
//!
//! With 1 Hz ticks the effective windows are about 60 and 3600 samples.

use serde::{Deserialize, Serialize};

use crate::app::events::{Topic, rate_payload};
use crate::publisher::ChangePublisher;

/// Smoothing constant for the per-minute average.
pub const ALPHA_PER_MINUTE: f64 = 1.0 / 60.0;
/// Smoothing constant for the per-hour average.
pub const ALPHA_PER_HOUR: f64 = 1.0 / 3600.0;

/// Upper bound on either average.  Anything above it is treated as corrupt
/// on restore and clamped while ticking, so formatted rates stay bounded.
pub const MAX_RATE: f64 = 1.0e12;

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_HOUR: f64 = 3_600_000.0;

/// Smoothed rates plus the sample anchor used for the next delta.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RateState {
    pub per_minute: f64,
    pub per_hour: f64,
    /// Monotonic ms of the last sample.
    pub last_sample_ms: u64,
    /// Count at the last sample.
    pub last_sample_count: u32,
}

/// Owns [`RateState`]; the only writer of the averages.
#[derive(Debug, Clone, Default)]
pub struct RateEstimator {
    state: RateState,
}

impl RateEstimator {
    pub fn new(state: RateState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> RateState {
        self.state
    }

    /// `(counts per minute, counts per hour)`.
    pub fn rates(&self) -> (f64, f64) {
        (self.state.per_minute, self.state.per_hour)
    }

    /// Fold one sample into the averages.
    ///
    /// A tick with no elapsed time (or a clock that went backwards) only
    /// moves the anchor.  Returns `true` if the averages were updated and
    /// published.
    pub fn tick(&mut self, now_ms: u64, count: u32, publisher: &mut ChangePublisher) -> bool {
        let updated = now_ms > self.state.last_sample_ms;
        if updated {
            let delta_ms = (now_ms - self.state.last_sample_ms) as f64;
            // A count below the anchor means a reset slipped in between
            // samples; treat it as no progress.
            let delta_count = count.saturating_sub(self.state.last_sample_count) as f64;
            let per_ms = delta_count / delta_ms;

            let cpm = ALPHA_PER_MINUTE * (per_ms * MS_PER_MINUTE)
                + (1.0 - ALPHA_PER_MINUTE) * self.state.per_minute;
            let cph = ALPHA_PER_HOUR * (per_ms * MS_PER_HOUR)
                + (1.0 - ALPHA_PER_HOUR) * self.state.per_hour;

            self.state.per_minute = clamp_rate(cpm);
            self.state.per_hour = clamp_rate(cph);
            if let Some(p) = rate_payload(self.state.per_minute, self.state.per_hour) {
                publisher.publish(Topic::Rate, &p);
            }
        }

        self.state.last_sample_ms = now_ms;
        self.state.last_sample_count = count;
        updated
    }

    /// Zero both averages and anchor the next window at (`now_ms`, `count`).
    pub fn reset(&mut self, now_ms: u64, count: u32, publisher: &mut ChangePublisher) {
        self.state = RateState {
            per_minute: 0.0,
            per_hour: 0.0,
            last_sample_ms: now_ms,
            last_sample_count: count,
        };
        if let Some(p) = rate_payload(0.0, 0.0) {
            publisher.publish(Topic::Rate, &p);
        }
    }

    /// Move the sample anchor without touching the averages (boot, time set).
    pub fn rebaseline(&mut self, now_ms: u64, count: u32) {
        self.state.last_sample_ms = now_ms;
        self.state.last_sample_count = count;
    }
}

fn clamp_rate(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v.min(MAX_RATE) } else { 0.0 }
}

/// Whether a restored average is usable as-is.
pub fn is_plausible(v: f64) -> bool {
    v.is_finite() && (0.0..=MAX_RATE).contains(&v)
}
