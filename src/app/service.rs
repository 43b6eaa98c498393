//! Edge service: startup composition.
//!
//! [`EdgeService`] owns the validated configuration, the device identity
//! and the registry.  Which components exist is decided at runtime from
//! the configuration: with 1-Wire disabled there is no scan and no poll
//! engine, and the hello goes out with an empty source list.
//!
//! ```text
//!  EdgeConfig ──▶ ┌──────────────────────────┐ ──▶ Publisher (hello, samples)
//!   MAC ───────▶  │       EdgeService        │
//!  OneWireBus ──▶ │ identity · registry      │ ──▶ PollEngine (0 or 1)
//!                 └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::adapters::device_id::MacAddress;
use crate::config::EdgeConfig;
use crate::error::{CapacityExceeded, CodecError, Error};
use crate::onewire::{OneWireBus, RomCode};
use crate::poll::PollEngine;
use crate::registry::DeviceRegistry;
use crate::scanner::BusScanner;
use crate::telemetry::{Identity, Publisher};

use super::ports::{Stepper, TimePort};

pub struct EdgeService {
    config: EdgeConfig,
    identity: Identity,
    registry: DeviceRegistry,
    capacity_exceeded: Option<CapacityExceeded>,
    devices_on_bus: usize,
    actuator: Option<Box<dyn Stepper + Send>>,
}

impl EdgeService {
    /// Validate `config` and derive the identity.  No bus traffic yet.
    pub fn new(config: EdgeConfig, mac: &MacAddress) -> Result<Self, Error> {
        config.validate()?;
        let identity = Identity::derive(mac, &config.pub_root)?;
        let (registry, _) = DeviceRegistry::build(
            core::iter::empty::<RomCode>(),
            config.max_devices,
            &config.pub_root,
        )?;
        Ok(Self {
            config,
            identity,
            registry,
            capacity_exceeded: None,
            devices_on_bus: 0,
            actuator: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Scan the bus and replace the registry with what was found.  Skipped
    /// when 1-Wire is disabled.
    pub fn discover(&mut self, bus: &mut impl OneWireBus, time: &impl TimePort) -> Result<(), Error> {
        if !self.config.onewire_enabled {
            info!("Service: 1-Wire disabled, skipping scan");
            return Ok(());
        }
        let discovery = BusScanner::new(self.config.max_devices, self.config.resolution)
            .with_settle(self.config.settle_delay())
            .scan(bus, time, &self.config.pub_root)?;
        self.registry = discovery.registry;
        self.capacity_exceeded = discovery.capacity_exceeded;
        self.devices_on_bus = discovery.on_bus;
        Ok(())
    }

    /// Fit a stepper driver.  Refused when the actuator component is off.
    pub fn attach_actuator(&mut self, stepper: Box<dyn Stepper + Send>) -> bool {
        if !self.config.actuator_enabled {
            warn!("Service: actuator disabled, driver not attached");
            return false;
        }
        self.actuator = Some(stepper);
        true
    }

    /// The poll engine, when 1-Wire is enabled.
    pub fn poll_engine(&self) -> Option<PollEngine<'_>> {
        self.config.onewire_enabled.then(|| {
            PollEngine::new(&self.registry, self.config.resolution, self.config.poll_interval())
                .with_devices_on_bus(self.devices_on_bus)
        })
    }

    pub fn publisher(&self) -> Result<Publisher<'_>, CodecError> {
        Publisher::new(&self.registry, &self.identity)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn capacity_exceeded(&self) -> Option<CapacityExceeded> {
        self.capacity_exceeded
    }

    /// Devices the last scan saw on the wire, registered or not.
    pub fn devices_on_bus(&self) -> usize {
        self.devices_on_bus
    }

    pub fn actuator_mut(&mut self) -> Option<&mut (dyn Stepper + Send + 'static)> {
        self.actuator.as_deref_mut()
    }

    /// Log the component setup and the effective configuration.
    pub fn log_configuration(&self) {
        let c = &self.config;
        info!("Service: device id {}", self.identity.device_id());
        if c.onewire_enabled {
            info!(
                "Service: 1-Wire enabled on GPIO {}, up to {} devices, every {} s, {}-bit",
                c.bus_gpio,
                c.max_devices,
                c.poll_interval_secs,
                c.resolution.bits()
            );
        } else {
            info!("Service: 1-Wire disabled");
        }
        match (c.actuator_enabled, self.actuator.is_some()) {
            (false, _) => info!("Service: A4988 disabled"),
            (true, true) => info!("Service: A4988 enabled"),
            (true, false) => warn!("Service: A4988 enabled but no driver attached"),
        }
        info!("Service: broker {}, root {}", c.broker_url, c.pub_root);
    }
}
