//! Unified error types for the DrumCounter firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop handles every failure the same way: log it, keep the in-memory state,
//! and try again on the next periodic attempt.  All variants are `Copy`.

use core::fmt;

use crate::app::ports::{ClockError, ConfigError, LogError, StorageError};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the counting core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Durable key-value store read or write failed.
    Storage(StorageError),
    /// Append log sink rejected a row.
    Log(LogError),
    /// Wall clock unavailable or could not be set.
    Clock(ClockError),
    /// An external request carried invalid values.
    Config(ConfigError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Log(e) => write!(f, "log: {e}"),
            Self::Clock(e) => write!(f, "clock: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<LogError> for Error {
    fn from(e: LogError) -> Self {
        Self::Log(e)
    }
}

impl From<ClockError> for Error {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
