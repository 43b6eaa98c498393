//! Device registry: the sensors found by the startup scan.
//!
//! Built once, never mutated.  A device's ordinal is its index in discovery
//! order and stays valid for the life of the process, which lets the poll
//! engine hand out readings by ordinal instead of re-resolving addresses.

use log::warn;

use crate::error::{CapacityExceeded, TopicError};
use crate::onewire::{Address, RomCode};
use crate::sensors::ds18b20;
use crate::telemetry::topic::{self, Topic};

/// Compile-time ceiling for the configurable device capacity.
pub const DEVICE_SLOTS: usize = 16;

/// Kind of quantity a device measures.  Drives the signature prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorClass {
    Temperature,
}

impl SensorClass {
    /// Tag prepended to the address to form the sample signature.
    pub const fn signature_prefix(self) -> char {
        match self {
            Self::Temperature => 'T',
        }
    }

    /// Classify by 1-Wire family code.  Only thermometers exist today, so
    /// unknown families fall back to [`SensorClass::Temperature`].
    pub fn from_family(family: u8) -> Self {
        if !ds18b20::is_thermometer(family) {
            warn!("Registry: unknown family 0x{:02X}, treating as temperature", family);
        }
        Self::Temperature
    }
}

/// One registered sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    ordinal: usize,
    rom: RomCode,
    address: Address,
    class: SensorClass,
    topic: Topic,
}

impl Device {
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn rom(&self) -> &RomCode {
        &self.rom
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn class(&self) -> SensorClass {
        self.class
    }

    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }
}

/// Ordered, bounded, immutable set of devices.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRegistry {
    devices: heapless::Vec<Device, DEVICE_SLOTS>,
    capacity: usize,
}

impl DeviceRegistry {
    /// Register `roms` in order under `root`.
    ///
    /// Duplicates are dropped.  Anything past `capacity` (clamped to
    /// [`DEVICE_SLOTS`]) is dropped and reported through the returned
    /// [`CapacityExceeded`], counting distinct addresses only.
    pub fn build(
        roms: impl IntoIterator<Item = RomCode>,
        capacity: usize,
        root: &str,
    ) -> Result<(Self, Option<CapacityExceeded>), TopicError> {
        topic::validate_root(root)?;
        let capacity = capacity.min(DEVICE_SLOTS);
        let mut devices: heapless::Vec<Device, DEVICE_SLOTS> = heapless::Vec::new();
        // Every distinct ROM so far, registered or past capacity.
        let mut seen: Vec<RomCode> = Vec::new();

        for rom in roms {
            if seen.contains(&rom) {
                warn!("Registry: duplicate ROM {} ignored", rom);
                continue;
            }
            seen.push(rom);
            if devices.len() >= capacity {
                continue;
            }
            let address = rom.address();
            let topic = topic::sensor_topic(root, &address)?;
            let device = Device {
                ordinal: devices.len(),
                rom,
                class: SensorClass::from_family(rom.family()),
                address,
                topic,
            };
            // len < capacity <= DEVICE_SLOTS
            let _ = devices.push(device);
        }

        let found = seen.len();
        let exceeded = (found > capacity).then_some(CapacityExceeded { found, capacity });
        Ok((Self { devices, capacity }, exceeded))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, ordinal: usize) -> Option<&Device> {
        self.devices.get(ordinal)
    }

    pub fn find(&self, address: &Address) -> Option<&Device> {
        self.devices.iter().find(|d| &d.address == address)
    }

    /// Devices in discovery order.
    pub fn iter(&self) -> core::slice::Iter<'_, Device> {
        self.devices.iter()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.devices.iter().map(|d| &d.address)
    }
}

impl<'a> IntoIterator for &'a DeviceRegistry {
    type Item = &'a Device;
    type IntoIter = core::slice::Iter<'a, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
