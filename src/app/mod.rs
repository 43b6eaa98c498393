//! Application core.
//!
//! [`ports`] holds the traits the platform adapters implement;
//! [`service`] composes scanner, registry, poll engine and publisher from
//! the configuration.

pub mod ports;
pub mod service;
