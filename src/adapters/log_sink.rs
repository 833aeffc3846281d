//! Log-based subscriber adapter.
//!
//! Implements [`Subscriber`] by writing every published change to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).  A
//! server-sent-events transport would implement the same trait.

use log::info;

use crate::app::events::Topic;
use crate::app::ports::Subscriber;

/// Adapter that logs every published payload to the serial console.
#[derive(Debug, Default)]
pub struct LogSubscriber {
    delivered: u32,
}

impl LogSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads seen since construction.
    pub fn delivered(&self) -> u32 {
        self.delivered
    }
}

impl Subscriber for LogSubscriber {
    fn deliver(&mut self, topic: Topic, payload: &str) {
        self.delivered = self.delivered.wrapping_add(1);
        match topic {
            Topic::Count => info!("COUNT | {}", payload),
            Topic::Rate => info!("RATE  | cpm,cph={}", payload),
            // Clock ticks every second; keep them out of the info stream.
            Topic::Clock => log::trace!("TIME  | {}", payload),
        }
    }
}
