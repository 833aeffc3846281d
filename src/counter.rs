//! Counting accumulator — the single writer of the canonical count.
//!
//! The count lives in an [`AtomicU32`] so a producer in interrupt context
//! and readers in the cooperative loop (display, web, persistence) never
//! observe a torn value.  Mutation goes through exactly two entry points:
//! [`Accumulator::on_edge`] and [`Accumulator::reset`].

use core::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveTime;
use log::debug;

use crate::app::events::{Topic, count_payload};
use crate::drivers::debounce::EdgeEvent;
use crate::publisher::ChangePublisher;
use crate::schedule::Schedule;

/// Authoritative monotonic event count.
#[derive(Debug, Default)]
pub struct Accumulator {
    count: AtomicU32,
}

impl Accumulator {
    /// Start from a restored count (0 on first boot).
    pub fn new(initial: u32) -> Self {
        Self {
            count: AtomicU32::new(initial),
        }
    }

    /// Current count (single atomic load).
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Count one confirmed edge if the schedule permits it at `wall`.
    ///
    /// Returns the new count, or `None` when the gate dropped the edge.
    /// Rejected edges are not queued or retried.
    pub fn on_edge(
        &self,
        edge: EdgeEvent,
        schedule: &Schedule,
        wall: Option<NaiveTime>,
        publisher: &mut ChangePublisher,
    ) -> Option<u32> {
        if !schedule.is_active(wall) {
            debug!("accumulator: edge on ch{} outside schedule, dropped", edge.channel);
            return None;
        }
        // Saturate rather than wrap: a wrapped count would look like a reset.
        let prev = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some(c.saturating_add(1)))
            .unwrap_or_else(|c| c);
        let now = prev.saturating_add(1);
        debug!("accumulator: ch{} edge at {}ms, count={}", edge.channel, edge.at_ms, now);
        if let Some(p) = count_payload(now) {
            publisher.publish(Topic::Count, &p);
        }
        Some(now)
    }

    /// Set the count to zero and publish it.
    pub fn reset(&self, publisher: &mut ChangePublisher) {
        self.count.store(0, Ordering::Release);
        if let Some(p) = count_payload(0) {
            publisher.publish(Topic::Count, &p);
        }
    }
}
