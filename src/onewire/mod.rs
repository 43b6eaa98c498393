//! 1-Wire link layer.
//!
//! ```text
//!  ┌──────────────┐   ┌──────────────┐   ┌──────────────────────┐
//!  │ Scanner /    │──▶│ ROM commands │──▶│ OneWireBus (trait)   │
//!  │ DS18B20      │   │ search · CRC │   │ reset · bit · byte   │
//!  └──────────────┘   └──────────────┘   └──────────┬───────────┘
//!                                                   │
//!                                  ┌────────────────┴────────────┐
//!                                  │ PinBus (embedded-hal, OD)   │
//!                                  │ simulated bus (tests)       │
//!                                  └─────────────────────────────┘
//! ```
//!
//! Everything above [`OneWireBus`] is protocol logic and is exercised on the
//! host against a simulated bus.  Only [`bitbang::PinBus`] knows about slot
//! timing.

pub mod bitbang;
pub mod crc;
pub mod rom;
pub mod search;

pub use rom::{Address, RomCode};

use crate::error::BusError;

/// ROM command: enumerate devices by binary search.
pub const SEARCH_ROM: u8 = 0xF0;
/// ROM command: read the ROM of the only device on the bus.
pub const READ_ROM: u8 = 0x33;
/// ROM command: address one device by its 64-bit ROM code.
pub const MATCH_ROM: u8 = 0x55;
/// ROM command: address every device at once.
pub const SKIP_ROM: u8 = 0xCC;

/// Bit- and byte-level access to a 1-Wire line.
///
/// Bytes travel least-significant bit first.  Implementations only need the
/// three slot primitives; the byte helpers are provided.
pub trait OneWireBus {
    /// Prepare the line for traffic.  Called once, after the settle delay.
    fn init(&mut self) -> Result<(), BusError> {
        Ok(())
    }

    /// Issue a reset pulse.  Returns `true` if at least one device answered
    /// with a presence pulse.
    fn reset(&mut self) -> Result<bool, BusError>;

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError>;

    fn read_bit(&mut self) -> Result<bool, BusError>;

    fn write_byte(&mut self, byte: u8) -> Result<(), BusError> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 == 1)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, BusError> {
        let mut byte = 0u8;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        bytes.iter().try_for_each(|b| self.write_byte(*b))
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), BusError> {
        for slot in buf.iter_mut() {
            *slot = self.read_byte()?;
        }
        Ok(())
    }
}

impl<B: OneWireBus + ?Sized> OneWireBus for &mut B {
    fn init(&mut self) -> Result<(), BusError> {
        (**self).init()
    }

    fn reset(&mut self) -> Result<bool, BusError> {
        (**self).reset()
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError> {
        (**self).write_bit(bit)
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        (**self).read_bit()
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), BusError> {
        (**self).write_byte(byte)
    }

    fn read_byte(&mut self) -> Result<u8, BusError> {
        (**self).read_byte()
    }
}

/// Reset the bus and address either one device (`Match ROM`) or all of
/// them (`Skip ROM`).  Returns `false` when nobody answered the reset.
pub fn select(bus: &mut impl OneWireBus, rom: Option<&RomCode>) -> Result<bool, BusError> {
    if !bus.reset()? {
        return Ok(false);
    }
    match rom {
        Some(rom) => {
            bus.write_byte(MATCH_ROM)?;
            bus.write_bytes(rom.as_bytes())?;
        }
        None => bus.write_byte(SKIP_ROM)?,
    }
    Ok(true)
}

/// Read the ROM code of the single device on the bus.
///
/// Only meaningful when exactly one device is connected: with more, the
/// wired-AND of all codes comes back and the CRC check fails.
pub fn read_rom(bus: &mut impl OneWireBus) -> Result<Option<RomCode>, BusError> {
    if !bus.reset()? {
        return Ok(None);
    }
    bus.write_byte(READ_ROM)?;
    let mut bytes = [0u8; 8];
    bus.read_bytes(&mut bytes)?;
    let rom = RomCode::new(bytes);
    Ok(rom.is_valid().then_some(rom))
}
