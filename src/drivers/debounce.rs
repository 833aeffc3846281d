//! Debounce monitor for the counting switch inputs.
//!
//! ## Hardware
//!
//! Mechanical limit switch (drum passing the sensor arm) wired either
//! active-high with a pull-down or active-low with a pull-up.  The main loop
//! samples the raw level every iteration (well under the debounce interval)
//! and feeds it to [`DebounceMonitor::observe`].
//!
//! ## State machine
//!
//! | State       | Input                          | Next                 |
//! |-------------|--------------------------------|----------------------|
//! | `Settled`   | raw == stable                  | `Settled`            |
//! | `Settled`   | raw != stable                  | `Candidate{now}`     |
//! | `Candidate` | raw == stable (bounced back)   | `Settled`            |
//! | `Candidate` | held >= interval               | `Settled`, confirmed |
//!
//! A confirmed transition into the active level yields an [`EdgeEvent`];
//! a confirmed release yields nothing.

/// Which electrical level means "drum present".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    pub const fn from_active_high(active_high: bool) -> Self {
        if active_high { Self::ActiveHigh } else { Self::ActiveLow }
    }

    /// Raw level that counts as active.
    pub const fn active_level(self) -> bool {
        matches!(self, Self::ActiveHigh)
    }
}

/// A confirmed, debounced transition of a channel into its active level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Index of the input channel that produced the edge.
    pub channel: u8,
    /// Monotonic milliseconds at confirmation.
    pub at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Settled,
    /// Raw level differs from the stable one since `since_ms`.
    Candidate { since_ms: u64 },
}

/// Per-channel two-stage debouncer.
#[derive(Debug, Clone)]
pub struct DebounceMonitor {
    channel: u8,
    polarity: Polarity,
    interval_ms: u64,
    stable: bool,
    state: DebounceState,
}

impl DebounceMonitor {
    /// The channel starts settled at its inactive level.
    pub fn new(channel: u8, polarity: Polarity, interval_ms: u64) -> Self {
        Self {
            channel,
            polarity,
            interval_ms,
            stable: !polarity.active_level(),
            state: DebounceState::Settled,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Last confirmed stable level.
    pub fn stable_level(&self) -> bool {
        self.stable
    }

    /// Feed one raw sample taken at `now_ms`.
    pub fn observe(&mut self, raw: bool, now_ms: u64) -> Option<EdgeEvent> {
        let since_ms = match self.state {
            DebounceState::Settled if raw == self.stable => return None,
            DebounceState::Settled => {
                self.state = DebounceState::Candidate { since_ms: now_ms };
                now_ms
            }
            DebounceState::Candidate { .. } if raw == self.stable => {
                self.state = DebounceState::Settled;
                return None;
            }
            DebounceState::Candidate { since_ms } => since_ms,
        };

        if now_ms.saturating_sub(since_ms) < self.interval_ms {
            return None;
        }

        self.stable = raw;
        self.state = DebounceState::Settled;

        (raw == self.polarity.active_level()).then_some(EdgeEvent {
            channel: self.channel,
            at_ms: now_ms,
        })
    }
}
