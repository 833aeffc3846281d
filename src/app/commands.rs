//! Inbound commands to the application service.
//!
//! These represent requests from the configuration surface (HTTP handlers,
//! serial console) that the [`CounterService`](super::service::CounterService)
//! interprets and acts upon.  Parsing happens here, at the boundary, so
//! invalid input never reaches core state.

use serde::Deserialize;

use crate::app::ports::ConfigError;
use crate::config::NetworkIdentity;
use crate::schedule::ScheduleRequest;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Read the current count.
    GetCount,

    /// Zero count, rates and last-logged count; persisted immediately.
    ResetCount,

    /// Read the counting window.
    GetSchedule,

    /// Replace the counting window (validated by the service).
    SetSchedule(ScheduleRequest),

    /// Set the wall clock from a unix timestamp (UTC seconds).
    SetTime { unix_secs: i64 },

    /// Replace the access-point credentials.
    SetNetworkIdentity(NetworkIdentity),

    /// Read the smoothed rates.
    GetRates,
}

/// Result of a successfully handled command.
#[derive(Debug, Clone, PartialEq)]
pub enum AppResponse {
    Count(u32),
    Rates { per_minute: f64, per_hour: f64 },
    Schedule(ScheduleRequest),
    /// Command applied; nothing to return.
    Done,
}

impl AppResponse {
    /// Plain-text body for the configuration surface.
    pub fn to_body(&self) -> String {
        match self {
            Self::Count(c) => c.to_string(),
            Self::Rates {
                per_minute,
                per_hour,
            } => format!("{per_minute:.2},{per_hour:.2}"),
            Self::Schedule(s) => s.to_json(),
            Self::Done => "OK".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TimeBody {
    time: i64,
}

#[derive(Deserialize)]
struct NetworkBody {
    ssid: String,
    #[serde(default)]
    password: String,
}

impl AppCommand {
    /// `{"time": <unix seconds>}`
    pub fn set_time_from_json(body: &[u8]) -> Result<Self, ConfigError> {
        let req: TimeBody = serde_json::from_slice(body).map_err(|_| ConfigError::Malformed)?;
        if req.time < 0 {
            return Err(ConfigError::ValidationFailed("time must be non-negative"));
        }
        Ok(Self::SetTime {
            unix_secs: req.time,
        })
    }

    /// `{"ssid": "...", "password": "..."}`
    pub fn network_identity_from_json(body: &[u8]) -> Result<Self, ConfigError> {
        let req: NetworkBody = serde_json::from_slice(body).map_err(|_| ConfigError::Malformed)?;
        Ok(Self::SetNetworkIdentity(NetworkIdentity::new(
            &req.ssid,
            &req.password,
        )?))
    }

    /// Schedule body, see [`ScheduleRequest`].
    pub fn set_schedule_from_json(body: &[u8]) -> Result<Self, ConfigError> {
        ScheduleRequest::from_json(body).map(Self::SetSchedule)
    }
}
