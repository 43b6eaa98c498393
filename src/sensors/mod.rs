//! Sensor drivers.
//!
//! Only 1-Wire thermometers today.  Drivers are stateless protocol helpers
//! over [`OneWireBus`](crate::onewire::OneWireBus); which devices exist is
//! the registry's business.

pub mod ds18b20;
