//! Port traits — the hexagonal boundary between the counting core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ CounterService (domain)
//! ```
//!
//! Driven adapters (NVS, wall clock, SD log, event streams) implement these
//! traits.  The [`CounterService`](super::service::CounterService) receives
//! them at call sites, so the core never touches hardware directly.
//!
//! ## Contract notes
//!
//! - **StoragePort** writes MUST be atomic per key and flushed before they
//!   return; a forced checkpoint relies on this.
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **LogSinkPort** is append-only; the core decides when headers are due.

use chrono::NaiveDateTime;

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the durable counter state.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic; no partial writes on power loss.
///   The ESP-IDF NVS API guarantees this natively; in-memory simulation
///   achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically and commit it.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the tunable [`SystemConfig`].
///
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// never silently clamped.
pub trait ConfigPort {
    /// Load configuration.  Returns [`SystemConfig::default()`] if none is stored.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Wall clock port (driven adapter: domain ↔ RTC / system time)
// ───────────────────────────────────────────────────────────────

/// Local wall-clock time source (RTC or NTP-disciplined system time).
pub trait ClockPort {
    /// Current local date-time, or `None` while the clock is unset or unreadable.
    fn now(&self) -> Option<NaiveDateTime>;

    /// Apply an externally supplied local date-time.
    fn set(&mut self, local: NaiveDateTime) -> Result<(), ClockError>;
}

// ───────────────────────────────────────────────────────────────
// Append log port (driven adapter: domain → SD card CSV files)
// ───────────────────────────────────────────────────────────────

/// Day-partitioned append-only log (one CSV file per calendar day on device).
pub trait LogSinkPort {
    /// Whether a log for `day_key` already holds data (its header included).
    fn exists(&self, day_key: &str) -> bool;

    /// Append one line to the log for `day_key`, creating it if needed.
    fn append(&mut self, day_key: &str, row: &str) -> Result<(), LogError>;
}

// ───────────────────────────────────────────────────────────────
// Subscriber transport (driven adapter: domain → event streams)
// ───────────────────────────────────────────────────────────────

/// Receives published state changes.  Delivery is best-effort; a
/// subscriber that cannot forward a payload simply drops it.
pub trait Subscriber {
    fn deliver(&mut self, topic: super::events::Topic, payload: &str);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations and configuration-surface validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// Request body is not valid JSON or misses a field.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Value could not be encoded for storage.
    Encode,
}

/// Errors from [`LogSinkPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    /// No medium mounted (e.g. SD card missing).
    NoMedium,
    /// Opening or appending to the day file failed.
    WriteFailed,
}

/// Errors from [`ClockPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockError {
    /// The requested time is outside the representable range.
    OutOfRange,
    /// The underlying RTC write failed.
    WriteFailed,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::Malformed => write!(f, "malformed request"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl core::fmt::Display for LogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoMedium => write!(f, "no log medium"),
            Self::WriteFailed => write!(f, "append failed"),
        }
    }
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfRange => write!(f, "time out of range"),
            Self::WriteFailed => write!(f, "clock write failed"),
        }
    }
}
