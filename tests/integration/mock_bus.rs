//! Simulated multi-drop 1-Wire bus and a fake clock.
//!
//! The bus works at the bit level, like the real line: written bits are
//! assembled into command bytes, and reads return the wired-AND of every
//! device that is currently driving.  That makes the Search ROM tests
//! exercise the real branch-walking logic.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use hcc_edge::app::ports::{PublishSink, TimePort};
use hcc_edge::error::BusError;
use hcc_edge::onewire::{self, OneWireBus, RomCode, crc};
use hcc_edge::sensors::ds18b20::{self, Resolution};

// ── Fake clock ────────────────────────────────────────────────

/// Time only moves when someone sleeps (or a test advances it).
#[derive(Debug, Default)]
pub struct FakeClock {
    now: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
}

impl FakeClock {
    pub fn starting_at(now: Duration) -> Self {
        Self {
            now: Cell::new(now),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl TimePort for FakeClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

// ── Recording publish sink ────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Vec<(String, String)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.messages
            .iter()
            .map(|(_, p)| serde_json::from_str(p).unwrap())
            .collect()
    }
}

impl PublishSink for RecordingSink {
    fn publish(&mut self, topic: &str, payload: &str) {
        self.messages.push((topic.to_owned(), payload.to_owned()));
    }
}

// ── Simulated devices ─────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimDevice {
    pub rom: RomCode,
    pub scratchpad: [u8; 9],
    /// Answers resets and commands.  Clear to make a device vanish.
    pub present: bool,
    /// Scratchpad reads come back with a broken CRC byte.
    pub corrupt_reads: bool,
}

impl SimDevice {
    /// DS18B20 with serial `n`, reading `celsius` at 12 bits.
    pub fn ds18b20(n: u8, celsius: f32) -> Self {
        Self::with_family(ds18b20::FAMILY_DS18B20, n, celsius)
    }

    pub fn with_family(family: u8, n: u8, celsius: f32) -> Self {
        let rom = RomCode::from_parts(family, [n, 0x03, 0xA2, 0x79, 0x2B, 0x05]);
        let mut dev = Self {
            rom,
            scratchpad: [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00],
            present: true,
            corrupt_reads: false,
        };
        dev.set_celsius(celsius);
        dev
    }

    pub fn set_celsius(&mut self, celsius: f32) {
        let raw = if self.rom.family() == ds18b20::FAMILY_DS18S20 {
            (celsius * 2.0) as i16
        } else {
            (celsius * 16.0) as i16
        };
        let [lsb, msb] = raw.to_le_bytes();
        self.scratchpad[0] = lsb;
        self.scratchpad[1] = msb;
        self.seal();
    }

    pub fn config_register(&self) -> u8 {
        self.scratchpad[4]
    }

    /// Resolution the device converts at, from its config register.
    pub fn resolution(&self) -> Resolution {
        if self.rom.family() == ds18b20::FAMILY_DS18S20 {
            return Resolution::Bits12;
        }
        Resolution::try_from(((self.config_register() >> 5) & 0b11) + 9).unwrap_or_default()
    }

    fn seal(&mut self) {
        self.scratchpad[8] = crc::crc8(&self.scratchpad[..8]);
    }
}

// ── Bus state machine ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum State {
    /// Waiting for a ROM command byte after reset.
    RomCommand,
    /// Search ROM at `bit` (0..64), `phase` 0 = id bit, 1 = complement,
    /// 2 = waiting for the direction write.
    Search { bit: usize, phase: u8 },
    /// Collecting the 8 ROM bytes after Match ROM.
    Match(Vec<u8>),
    /// Waiting for a function command byte.
    Function,
    /// Convert T running; read slots poll for completion.
    Converting,
    /// Collecting TH, TL, config after Write Scratchpad.
    WriteScratchpad(Vec<u8>),
    /// Nothing more to do until the next reset.
    Done,
}

pub struct SimBus {
    pub devices: Vec<SimDevice>,
    /// `init()` fails with this.
    pub init_fault: Option<BusError>,
    /// `read_bit` fails with `PinFault` once this many more bits have been read.
    pub fail_after_reads: Option<usize>,
    /// Read slots that report "still converting" after each Convert T.
    /// `usize::MAX` for a conversion that never finishes.
    pub convert_busy_polls: usize,
    /// With a clock attached, Convert T also lasts as long as the slowest
    /// present device's resolution takes.
    convert_started: Option<Duration>,
    /// Every ROM and function command byte, in order.
    pub commands: Vec<u8>,
    pub resets: usize,
    /// Clock reading at the first bus access, when a clock is attached.
    pub first_access: Option<Duration>,
    clock: Option<Rc<FakeClock>>,

    state: State,
    selected: Vec<usize>,
    rx: u8,
    rx_bits: u8,
    tx: VecDeque<bool>,
    busy_left: usize,
}

impl SimBus {
    pub fn new(devices: Vec<SimDevice>) -> Self {
        Self {
            devices,
            init_fault: None,
            fail_after_reads: None,
            convert_busy_polls: 0,
            convert_started: None,
            commands: Vec::new(),
            resets: 0,
            first_access: None,
            clock: None,
            state: State::Done,
            selected: Vec::new(),
            rx: 0,
            rx_bits: 0,
            tx: VecDeque::new(),
            busy_left: 0,
        }
    }

    pub fn with_clock(mut self, clock: Rc<FakeClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn count(&self, command: u8) -> usize {
        self.commands.iter().filter(|c| **c == command).count()
    }

    fn touch(&mut self) {
        if self.first_access.is_none() {
            if let Some(clock) = &self.clock {
                self.first_access = Some(clock.now());
            }
        }
    }

    fn still_converting(&self) -> bool {
        let (Some(clock), Some(started)) = (&self.clock, self.convert_started) else {
            return false;
        };
        let slowest = self
            .devices
            .iter()
            .filter(|d| d.present)
            .map(|d| d.resolution().conversion_time())
            .max()
            .unwrap_or_default();
        clock.now() < started + slowest
    }

    fn present(&self) -> Vec<usize> {
        (0..self.devices.len()).filter(|i| self.devices[*i].present).collect()
    }

    fn queue_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            for i in 0..8 {
                self.tx.push_back((byte >> i) & 1 == 1);
            }
        }
    }

    /// Wired-AND of what every selected device would send.
    fn wired_and(&self, bytes_of: impl Fn(&SimDevice) -> Vec<u8>, len: usize) -> Vec<u8> {
        let mut out = vec![0xFF; len];
        for i in &self.selected {
            for (o, b) in out.iter_mut().zip(bytes_of(&self.devices[*i])) {
                *o &= b;
            }
        }
        out
    }

    fn on_byte(&mut self, byte: u8) {
        match std::mem::replace(&mut self.state, State::Done) {
            State::RomCommand => {
                self.commands.push(byte);
                self.state = match byte {
                    onewire::SEARCH_ROM => State::Search { bit: 0, phase: 0 },
                    onewire::SKIP_ROM => State::Function,
                    onewire::MATCH_ROM => State::Match(Vec::new()),
                    onewire::READ_ROM => {
                        let rom = self.wired_and(|d| d.rom.as_bytes().to_vec(), 8);
                        self.queue_bytes(&rom);
                        State::Done
                    }
                    _ => State::Done,
                };
            }
            State::Match(mut rom) => {
                rom.push(byte);
                if rom.len() == 8 {
                    self.selected.retain(|i| self.devices[*i].rom.as_bytes()[..] == rom[..]);
                    self.state = State::Function;
                } else {
                    self.state = State::Match(rom);
                }
            }
            State::Function => {
                self.commands.push(byte);
                self.state = match byte {
                    ds18b20::CONVERT_T => {
                        self.busy_left = self.convert_busy_polls;
                        self.convert_started = self.clock.as_ref().map(|c| c.now());
                        State::Converting
                    }
                    ds18b20::READ_SCRATCHPAD => {
                        let pad = self.wired_and(
                            |d| {
                                let mut p = d.scratchpad.to_vec();
                                if d.corrupt_reads {
                                    p[8] ^= 0x5A;
                                }
                                p
                            },
                            9,
                        );
                        self.queue_bytes(&pad);
                        State::Done
                    }
                    ds18b20::WRITE_SCRATCHPAD => State::WriteScratchpad(Vec::new()),
                    _ => State::Done,
                };
            }
            State::WriteScratchpad(mut data) => {
                data.push(byte);
                if data.len() == 3 {
                    for i in self.selected.clone() {
                        let dev = &mut self.devices[i];
                        dev.scratchpad[2..5].copy_from_slice(&data);
                        dev.seal();
                    }
                    self.state = State::Done;
                } else {
                    self.state = State::WriteScratchpad(data);
                }
            }
            other => self.state = other,
        }
    }
}

impl OneWireBus for SimBus {
    fn init(&mut self) -> Result<(), BusError> {
        self.touch();
        match self.init_fault {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn reset(&mut self) -> Result<bool, BusError> {
        self.touch();
        self.resets += 1;
        self.selected = self.present();
        self.state = State::RomCommand;
        self.rx = 0;
        self.rx_bits = 0;
        self.tx.clear();
        Ok(!self.selected.is_empty())
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError> {
        self.touch();
        if let State::Search { bit: index, phase: 2 } = self.state {
            self.selected.retain(|i| self.devices[*i].rom.bit(index) == bit);
            self.state = if index == 63 {
                State::Done
            } else {
                State::Search {
                    bit: index + 1,
                    phase: 0,
                }
            };
            return Ok(());
        }
        if bit {
            self.rx |= 1 << self.rx_bits;
        }
        self.rx_bits += 1;
        if self.rx_bits == 8 {
            let byte = self.rx;
            self.rx = 0;
            self.rx_bits = 0;
            self.on_byte(byte);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        self.touch();
        if let Some(left) = self.fail_after_reads.as_mut() {
            if *left == 0 {
                return Err(BusError::PinFault);
            }
            *left -= 1;
        }
        match self.state {
            State::Search { bit, phase } if phase < 2 => {
                let want = phase == 0;
                // A device pulls low when the bit it sends is 0.
                let high = self
                    .selected
                    .iter()
                    .all(|i| self.devices[*i].rom.bit(bit) == want);
                self.state = State::Search {
                    bit,
                    phase: phase + 1,
                };
                Ok(high)
            }
            State::Converting => {
                if self.busy_left == 0 {
                    Ok(!self.still_converting())
                } else {
                    self.busy_left = self.busy_left.saturating_sub(1);
                    Ok(false)
                }
            }
            _ => Ok(self.tx.pop_front().unwrap_or(true)),
        }
    }
}
