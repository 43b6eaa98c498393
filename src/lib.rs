//! HCC edge firmware library.
//!
//! Discovers DS18B20 thermometers on a 1-Wire bus, announces them with a
//! hello message and publishes a sample per sensor every poll period.
//! Everything here runs on the host against a simulated bus; ESP-IDF code
//! is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod onewire;
pub mod poll;
pub mod registry;
pub mod scanner;
pub mod sensors;
pub mod telemetry;

pub use error::{Error, Result};
