//! Change publisher — best-effort topic fan-out.
//!
//! Subscribers register a topic mask; [`ChangePublisher::publish`] hands the
//! payload to every matching subscriber synchronously.  There is no replay
//! buffer and no backpressure: with nobody listening the value is dropped.

use log::{debug, warn};

use crate::app::events::Topic;
use crate::app::ports::Subscriber;

/// Maximum number of concurrently registered subscribers.
pub const MAX_SUBSCRIBERS: usize = 4;

struct Registration {
    mask: u8,
    sink: Box<dyn Subscriber>,
}

/// Observer list keyed by topic.
#[derive(Default)]
pub struct ChangePublisher {
    subscribers: heapless::Vec<Registration, MAX_SUBSCRIBERS>,
}

impl ChangePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sink` for every topic in `topics`.
    /// Returns `false` (and drops the sink) if the list is full.
    pub fn subscribe(&mut self, topics: &[Topic], sink: Box<dyn Subscriber>) -> bool {
        let mask = topics.iter().fold(0, |m, t| m | t.mask());
        if self.subscribers.push(Registration { mask, sink }).is_err() {
            warn!("publisher: subscriber list full ({MAX_SUBSCRIBERS})");
            return false;
        }
        true
    }

    /// Fire-and-forget broadcast to all subscribers of `topic`.
    pub fn publish(&mut self, topic: Topic, payload: &str) {
        let mut delivered = 0usize;
        for reg in self.subscribers.iter_mut().filter(|r| r.mask & topic.mask() != 0) {
            reg.sink.deliver(topic, payload);
            delivered += 1;
        }
        if delivered == 0 {
            debug!("publisher: {} dropped (no subscribers)", topic.name());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
