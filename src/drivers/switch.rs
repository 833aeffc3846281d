//! Raw switch input sampling.
//!
//! Wraps any [`embedded_hal::digital::InputPin`] (an `esp_idf_hal`
//! `PinDriver` on device, a scripted pin in tests) and reports the raw
//! electrical level.  Debouncing happens in
//! [`DebounceMonitor`](super::debounce::DebounceMonitor); this layer only
//! turns pin read errors into skipped samples.

use embedded_hal::digital::InputPin;
use log::warn;

/// One physical counting input.
pub struct SwitchInput<P> {
    pin: P,
    channel: u8,
    read_errors: u32,
}

impl<P: InputPin> SwitchInput<P> {
    pub fn new(pin: P, channel: u8) -> Self {
        Self {
            pin,
            channel,
            read_errors: 0,
        }
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Sample the raw level.  `None` if the GPIO read failed; the sample is
    /// skipped and the debouncer keeps its previous state.
    pub fn read_level(&mut self) -> Option<bool> {
        match self.pin.is_high() {
            Ok(level) => Some(level),
            Err(e) => {
                self.read_errors = self.read_errors.saturating_add(1);
                if self.read_errors.is_power_of_two() {
                    warn!("switch {}: read failed ({:?}), {} total", self.channel, e, self.read_errors);
                }
                None
            }
        }
    }

    /// GPIO read failures since startup.
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }
}
