//! Startup bus scan.
//!
//! ```text
//!   settle delay ──▶ bus init ──▶ Search ROM loop ──▶ registry ──▶ set resolution
//!   (2 s default)    (fatal)      (corrupt ROMs       (capacity,    (whole bus,
//!                                  dropped)            dedup)        non-fatal)
//! ```
//!
//! Runs once.  Taking the bus by `&mut` keeps it from overlapping a poll
//! cycle.
//!
//! The registry may hold fewer devices than the wire does: capacity
//! overflow and ROMs that failed CRC stay connected.  They still answer
//! every broadcast, so resolution is programmed on everything the search
//! saw and [`Discovery::on_bus`] tells the poll engine when Skip ROM is
//! safe.

use core::time::Duration;

use log::{info, warn};

use crate::app::ports::TimePort;
use crate::error::{CapacityExceeded, DiscoveryError, Error};
use crate::onewire::search::{RomSearch, SearchHit};
use crate::onewire::{OneWireBus, RomCode};
use crate::registry::DeviceRegistry;
use crate::sensors::ds18b20::{self, Resolution};

/// Default power-on settle time before the first bus access.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(2000);

/// Upper bound on search passes.  A healthy bus finishes after one pass per
/// device; a glitching one could otherwise keep reporting phantom branches.
const MAX_SEARCH_PASSES: usize = 64;

/// Result of a completed scan.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub registry: DeviceRegistry,
    pub capacity_exceeded: Option<CapacityExceeded>,
    /// ROMs dropped for a bad CRC.
    pub corrupt: usize,
    /// Devices physically on the bus: distinct valid ROMs, including any
    /// past capacity, plus corrupt ones.
    pub on_bus: usize,
}

pub struct BusScanner {
    settle: Duration,
    capacity: usize,
    resolution: Resolution,
}

impl BusScanner {
    pub fn new(capacity: usize, resolution: Resolution) -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            capacity,
            resolution,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// Enumerate every device on the bus and register them under `root`.
    ///
    /// Only bus initialisation and search faults are fatal.  Zero devices
    /// is a valid result.
    pub fn scan(
        &self,
        bus: &mut impl OneWireBus,
        time: &impl TimePort,
        root: &str,
    ) -> Result<Discovery, Error> {
        info!("Scanner: waiting {:?} for the bus to settle", self.settle);
        time.sleep(self.settle);

        bus.init().map_err(DiscoveryError::BusInit)?;

        let mut roms: Vec<RomCode> = Vec::new();
        let mut corrupt = 0usize;
        let mut search = RomSearch::new();
        for _ in 0..MAX_SEARCH_PASSES {
            match search.next(bus).map_err(DiscoveryError::Search)? {
                Some(SearchHit::Valid(rom)) => roms.push(rom),
                Some(SearchHit::Corrupt(rom)) => {
                    corrupt += 1;
                    warn!("Scanner: ROM {} failed CRC, discarded", rom);
                }
                None => break,
            }
        }

        let mut seen: Vec<RomCode> = Vec::with_capacity(roms.len());
        for rom in &roms {
            if !seen.contains(rom) {
                seen.push(*rom);
            }
        }
        let on_bus = seen.len() + corrupt;

        let (registry, capacity_exceeded) = DeviceRegistry::build(roms, self.capacity, root)?;
        if let Some(exceeded) = capacity_exceeded {
            warn!("Scanner: {}", exceeded);
        }
        info!(
            "Scanner: registered {} of {} device(s) on the bus",
            registry.len(),
            on_bus
        );
        for device in &registry {
            info!("Scanner:   {}: {}", device.ordinal(), device.address());
        }

        self.apply_resolution(bus, &seen, corrupt);

        Ok(Discovery {
            registry,
            capacity_exceeded,
            corrupt,
            on_bus,
        })
    }

    /// Program every device on the wire, registered or not.  Convert T is
    /// broadcast, so one device left at 12 bits would hold the line past
    /// the conversion window of a lower resolution.
    fn apply_resolution(&self, bus: &mut impl OneWireBus, seen: &[RomCode], corrupt: usize) {
        let solo = seen.len() + corrupt == 1;
        for rom in seen {
            let target = if solo { None } else { Some(rom) };
            match ds18b20::set_resolution(bus, target, self.resolution) {
                Ok(true) => {}
                Ok(false) => warn!("Scanner: {} did not answer resolution write", rom),
                Err(e) => warn!("Scanner: resolution write to {} failed: {}", rom, e),
            }
        }
        if corrupt > 0 {
            // Unaddressable devices only hear a broadcast; their alarm
            // thresholds fall back to the defaults.
            warn!("Scanner: broadcasting resolution for {} unreadable ROM(s)", corrupt);
            match ds18b20::broadcast_resolution(bus, self.resolution) {
                Ok(true) => {}
                Ok(false) => warn!("Scanner: no presence for resolution broadcast"),
                Err(e) => warn!("Scanner: resolution broadcast failed: {}", e),
            }
        }
    }
}
