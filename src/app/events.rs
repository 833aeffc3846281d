//! Outbound publication topics and payload formats.
//!
//! The core publishes through the [`ChangePublisher`](crate::publisher::ChangePublisher).
//! Adapters on the other side decide where payloads go (server-sent event
//! streams, serial log, LCD refresh).

use core::fmt::Write as _;

use chrono::NaiveDateTime;
use log::warn;

/// Capacity of a formatted payload (clock string is the longest at 19 bytes).
pub const PAYLOAD_CAP: usize = 48;

/// A formatted payload, stack-allocated.
pub type Payload = heapless::String<PAYLOAD_CAP>;

/// Topics a subscriber can listen on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Topic {
    /// Current count, decimal integer.
    Count = 0b001,
    /// Smoothed rates, `"<cpm>,<cph>"` with two decimals.
    Rate = 0b010,
    /// Wall clock, `YYYY-MM-DDThh:mm:ss`.
    Clock = 0b100,
}

impl Topic {
    /// Bitmask for subscription filtering.
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Stable stream name used by transports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Rate => "runningAverage",
            Self::Clock => "time",
        }
    }
}

/// Count as a decimal integer string.
pub fn count_payload(count: u32) -> Option<Payload> {
    format_payload(Topic::Count, format_args!("{count}"))
}

/// Rate pair as `"<cpm>,<cph>"`, two decimal places each.
pub fn rate_payload(per_minute: f64, per_hour: f64) -> Option<Payload> {
    format_payload(Topic::Rate, format_args!("{per_minute:.2},{per_hour:.2}"))
}

/// Wall clock as `YYYY-MM-DDThh:mm:ss`.
pub fn clock_payload(local: &NaiveDateTime) -> Option<Payload> {
    format_payload(Topic::Clock, format_args!("{}", local.format("%Y-%m-%dT%H:%M:%S")))
}

/// `None` when the text does not fit; a truncated payload is never emitted.
fn format_payload(topic: Topic, args: core::fmt::Arguments<'_>) -> Option<Payload> {
    let mut s = Payload::new();
    if s.write_fmt(args).is_err() {
        warn!("events: {} payload exceeds {} bytes, dropped", topic.name(), PAYLOAD_CAP);
        return None;
    }
    Some(s)
}
