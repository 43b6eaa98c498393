//! Periodic poll engine.
//!
//! One cycle:
//!
//! ```text
//!   Idle ──▶ Converting ──▶ Reading ──▶ Publishing ──▶ Idle
//!            Skip ROM        per device   batch to
//!            Convert T       scratchpad   channel
//! ```
//!
//! Every device converts at once, so a cycle costs one conversion time no
//! matter how many sensors are on the bus.  Per-device failures never
//! abort a cycle; each becomes a [`ReadStatus`] on that device's reading
//! and bumps its error counter.

pub mod channel;
pub mod schedule;

use core::time::Duration;

use embassy_sync::channel::TrySendError;
use log::{debug, info, warn};

use crate::app::ports::TimePort;
use crate::onewire::OneWireBus;
use crate::registry::{DEVICE_SLOTS, Device, DeviceRegistry};
use crate::sensors::ds18b20::{self, Resolution};

pub use channel::{BATCH_DEPTH, BatchReceiver, BatchSender, READINGS, ReadingChannel};
pub use schedule::CycleSchedule;

/// Interval between `conversion_done` checks once the nominal conversion
/// time has elapsed.
const DONE_POLL_STEP: Duration = Duration::from_millis(10);

/// Outcome of one device read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    Ok,
    /// Scratchpad arrived but failed its CRC.
    CrcError,
    /// Conversion never finished, the device did not answer, or the bus
    /// faulted mid-read.
    Timeout,
}

/// One temperature reading, keyed by registry ordinal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub ordinal: usize,
    /// Degrees Celsius.  `Some` exactly when `status` is [`ReadStatus::Ok`].
    pub value: Option<f32>,
    pub status: ReadStatus,
}

impl Reading {
    pub fn ok(ordinal: usize, celsius: f32) -> Self {
        Self {
            ordinal,
            value: Some(celsius),
            status: ReadStatus::Ok,
        }
    }

    pub fn failed(ordinal: usize, status: ReadStatus) -> Self {
        Self {
            ordinal,
            value: None,
            status,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReadStatus::Ok
    }
}

/// Everything one cycle produced, in registry order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingBatch {
    pub cycle: u64,
    /// Scheduled start of the cycle that produced this batch.
    pub scheduled_at: Duration,
    pub readings: heapless::Vec<Reading, DEVICE_SLOTS>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Converting,
    Reading,
    Publishing,
}

pub struct PollEngine<'r> {
    registry: &'r DeviceRegistry,
    resolution: Resolution,
    schedule: CycleSchedule,
    devices_on_bus: usize,
    state: CycleState,
    error_counts: [u32; DEVICE_SLOTS],
    cycles: u64,
    dropped_batches: u64,
}

impl<'r> PollEngine<'r> {
    pub fn new(registry: &'r DeviceRegistry, resolution: Resolution, period: Duration) -> Self {
        Self {
            registry,
            resolution,
            schedule: CycleSchedule::new(period),
            devices_on_bus: registry.len(),
            state: CycleState::Idle,
            error_counts: [0; DEVICE_SLOTS],
            cycles: 0,
            dropped_batches: 0,
        }
    }

    /// How many devices share the wire, registered or not.  Defaults to the
    /// registry size; Skip ROM reads are only used when this is 1.
    pub fn with_devices_on_bus(mut self, count: usize) -> Self {
        self.devices_on_bus = count.max(self.registry.len());
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn schedule(&self) -> &CycleSchedule {
        &self.schedule
    }

    /// Failed reads of the device at `ordinal` since startup.
    pub fn error_count(&self, ordinal: usize) -> Option<u32> {
        (ordinal < self.registry.len()).then(|| self.error_counts[ordinal])
    }

    /// Batches dropped because the publisher channel was full.
    pub fn dropped_batches(&self) -> u64 {
        self.dropped_batches
    }

    /// Cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Convert and read every registered device once.
    pub fn run_cycle(&mut self, bus: &mut impl OneWireBus, time: &impl TimePort) -> ReadingBatch {
        self.schedule.start(time.now());
        let mut batch = ReadingBatch {
            cycle: self.cycles,
            scheduled_at: self.schedule.current_start(),
            readings: heapless::Vec::new(),
        };

        if self.registry.is_empty() {
            self.cycles += 1;
            return batch;
        }

        self.state = CycleState::Converting;
        let converted = self.convert(bus, time);

        self.state = CycleState::Reading;
        let solo = self.devices_on_bus == 1;
        for device in self.registry {
            let reading = if converted {
                self.read_device(bus, device, solo)
            } else {
                Reading::failed(device.ordinal(), ReadStatus::Timeout)
            };
            self.record(device, &reading);
            // One reading per registered device; registry.len() <= DEVICE_SLOTS.
            let _ = batch.readings.push(reading);
        }

        self.cycles += 1;
        batch
    }

    /// Hand `batch` to the publisher without blocking.  Returns `false` if
    /// the channel was full and the batch was dropped.
    pub fn hand_off(&mut self, batch: ReadingBatch, out: &BatchSender<'_>) -> bool {
        self.state = CycleState::Publishing;
        let sent = match out.try_send(batch) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                self.dropped_batches += 1;
                warn!(
                    "Poll: publisher behind, dropped cycle {} ({} total)",
                    dropped.cycle, self.dropped_batches
                );
                false
            }
        };
        self.state = CycleState::Idle;
        sent
    }

    /// One full cycle followed by the sleep until the next scheduled start.
    pub fn step(&mut self, bus: &mut impl OneWireBus, time: &impl TimePort, out: &BatchSender<'_>) {
        let batch = self.run_cycle(bus, time);
        self.hand_off(batch, out);

        let skipped = self.schedule.skipped();
        let wait = self.schedule.advance(time.now());
        if self.schedule.skipped() > skipped {
            warn!(
                "Poll: cycle overran, skipped {} slot(s)",
                self.schedule.skipped() - skipped
            );
        }
        time.sleep(wait);
    }

    pub fn run(mut self, bus: &mut impl OneWireBus, time: &impl TimePort, out: &BatchSender<'_>) -> ! {
        info!(
            "Poll: {} device(s) every {:?} at {}-bit",
            self.registry.len(),
            self.schedule.period(),
            self.resolution.bits()
        );
        loop {
            self.step(bus, time, out);
        }
    }

    // ── Internals ─────────────────────────────────────────────

    /// Broadcast Convert T and wait for it to finish.  `false` means every
    /// reading of this cycle is a timeout.
    fn convert(&self, bus: &mut impl OneWireBus, time: &impl TimePort) -> bool {
        match ds18b20::start_conversion_all(bus) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Poll: no presence pulse for Convert T");
                return false;
            }
            Err(e) => {
                warn!("Poll: Convert T failed: {}", e);
                return false;
            }
        }

        let nominal = self.resolution.conversion_time();
        time.sleep(nominal);
        let deadline = time.now() + nominal / 4;
        loop {
            match ds18b20::conversion_done(bus) {
                Ok(true) => return true,
                Ok(false) if time.now() >= deadline => {
                    warn!("Poll: conversion not finished after {:?}", nominal + nominal / 4);
                    return false;
                }
                Ok(false) => time.sleep(DONE_POLL_STEP),
                Err(e) => {
                    warn!("Poll: bus fault while converting: {}", e);
                    return false;
                }
            }
        }
    }

    fn read_device(&self, bus: &mut impl OneWireBus, device: &Device, solo: bool) -> Reading {
        let ordinal = device.ordinal();
        let rom = if solo { None } else { Some(device.rom()) };
        match ds18b20::read_scratchpad(bus, rom) {
            Ok(Some(pad)) if pad.is_blank() => Reading::failed(ordinal, ReadStatus::Timeout),
            Ok(Some(pad)) if !pad.is_valid() => Reading::failed(ordinal, ReadStatus::CrcError),
            Ok(Some(pad)) => Reading::ok(ordinal, pad.celsius(device.rom().family(), self.resolution)),
            Ok(None) => Reading::failed(ordinal, ReadStatus::Timeout),
            Err(e) => {
                debug!("Poll: {} read failed: {}", device.address(), e);
                Reading::failed(ordinal, ReadStatus::Timeout)
            }
        }
    }

    fn record(&mut self, device: &Device, reading: &Reading) {
        let errors = &mut self.error_counts[device.ordinal()];
        match reading.value {
            Some(celsius) => info!("Poll: {}: {:.1}C, {} errors", device.topic(), celsius, *errors),
            None => {
                *errors = errors.saturating_add(1);
                warn!(
                    "Poll: {}: {:?}, {} errors",
                    device.topic(),
                    reading.status,
                    *errors
                );
            }
        }
    }
}
