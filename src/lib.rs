//! Sensor node firmware library.
//!
//! Exposes the pure-logic modules for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, with a simulation path for the host.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod provision;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod sensors;

#[cfg(test)]
mod log_capture;
