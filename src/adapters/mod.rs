//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements    | Connects to               |
//! |--------------|---------------|---------------------------|
//! | `file_log`   | LogSinkPort   | SD card CSV files (VFS)   |
//! | `log_sink`   | Subscriber    | Serial log output         |
//! | `nvs`        | ConfigPort    | NVS / in-memory store     |
//! |              | StoragePort   |                           |
//! | `time`       | ClockPort     | ESP32 timer + system time |

pub mod file_log;
pub mod log_sink;
pub mod nvs;
pub mod time;
