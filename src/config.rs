//! System configuration parameters
//!
//! All tunable parameters for the DrumCounter system.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Input ---
    /// Minimum time a switch level must hold to be accepted (milliseconds)
    pub debounce_ms: u32,
    /// true = switch pulls the line HIGH when a drum passes
    pub active_high: bool,

    // --- Timing ---
    /// Minimum spacing between periodic NVS checkpoints (milliseconds)
    pub save_interval_ms: u32,
    /// Rate estimator sampling period (milliseconds)
    pub rate_tick_ms: u32,
    /// Clock publish / rollover check period (milliseconds)
    pub clock_tick_ms: u32,
    /// SD card log period (seconds)
    pub log_interval_secs: u32,

    // --- Wall clock ---
    /// Local time offset from UTC (seconds)
    pub utc_offset_secs: i32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Input
            debounce_ms: 50,
            active_high: true,

            // Timing
            save_interval_ms: 5000,
            rate_tick_ms: 1000,  // 1 Hz
            clock_tick_ms: 1000, // 1 Hz
            log_interval_secs: 60,

            // GMT+7, no DST
            utc_offset_secs: 7 * 3600,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(5..=5000).contains(&self.debounce_ms) {
            return Err(ConfigError::ValidationFailed("debounce_ms must be 5–5000"));
        }
        if !(1000..=600_000).contains(&self.save_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "save_interval_ms must be 1000–600000",
            ));
        }
        if !(100..=60_000).contains(&self.rate_tick_ms) {
            return Err(ConfigError::ValidationFailed("rate_tick_ms must be 100–60000"));
        }
        if !(100..=60_000).contains(&self.clock_tick_ms) {
            return Err(ConfigError::ValidationFailed("clock_tick_ms must be 100–60000"));
        }
        if !(1..=86_400).contains(&self.log_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "log_interval_secs must be 1–86400",
            ));
        }
        if !(-12 * 3600..=14 * 3600).contains(&self.utc_offset_secs) {
            return Err(ConfigError::ValidationFailed(
                "utc_offset_secs must be -43200–50400",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Network identity (access point name / password)
// ---------------------------------------------------------------------------

pub const DEFAULT_AP_SSID: &str = "Drum Counter";
pub const DEFAULT_AP_PASSWORD: &str = "12345678";

/// Access-point credentials, persisted with the durable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIdentity {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl Default for NetworkIdentity {
    fn default() -> Self {
        // Both defaults fit their capacity.
        let mut ssid = heapless::String::new();
        let _ = ssid.push_str(DEFAULT_AP_SSID);
        let mut password = heapless::String::new();
        let _ = password.push_str(DEFAULT_AP_PASSWORD);
        Self { ssid, password }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

impl NetworkIdentity {
    /// Validate and build.  SSID: 1–32 printable ASCII; password: empty
    /// (open AP) or 8–64 bytes (WPA2).
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConfigError> {
        if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
            return Err(ConfigError::ValidationFailed(
                "ssid must be 1–32 printable ASCII bytes",
            ));
        }
        if !password.is_empty() && !(8..=64).contains(&password.len()) {
            return Err(ConfigError::ValidationFailed(
                "password must be empty or 8–64 bytes",
            ));
        }
        let mut id = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        id.ssid
            .push_str(ssid)
            .map_err(|_| ConfigError::ValidationFailed("ssid too long"))?;
        id.password
            .push_str(password)
            .map_err(|_| ConfigError::ValidationFailed("password too long"))?;
        Ok(id)
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}
