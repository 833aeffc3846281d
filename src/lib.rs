//! DrumCounter firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod counter;
pub mod datalog;
pub mod error;
pub mod persistence;
pub mod publisher;
pub mod rate;
pub mod rollover;
pub mod schedule;

pub mod adapters;
pub mod drivers;
pub mod pins;
