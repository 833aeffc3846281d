//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the DrumCounter: edge
//! counting, schedule gating, rate smoothing, rollover and checkpointing,
//! orchestrated by [`service::CounterService`].  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
