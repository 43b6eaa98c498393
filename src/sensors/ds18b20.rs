//! DS18B20 / DS1822 / DS18S20 digital thermometer driver.
//!
//! Stateless protocol helpers over a [`OneWireBus`]: start a conversion on
//! every device at once, read one device's scratchpad, and program the
//! resolution.  Device bookkeeping lives in the registry and poll engine.
//!
//! ## Scratchpad layout
//!
//! | Byte | Content                      |
//! |------|------------------------------|
//! | 0-1  | temperature LSB, MSB         |
//! | 2-3  | TH, TL alarm registers       |
//! | 4    | configuration (resolution)   |
//! | 5-7  | reserved                     |
//! | 8    | CRC-8 of bytes 0-7           |

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BusError;
use crate::onewire::{self, OneWireBus, RomCode, crc};

pub const CONVERT_T: u8 = 0x44;
pub const WRITE_SCRATCHPAD: u8 = 0x4E;
pub const READ_SCRATCHPAD: u8 = 0xBE;

pub const FAMILY_DS18S20: u8 = 0x10;
pub const FAMILY_DS1822: u8 = 0x22;
pub const FAMILY_DS18B20: u8 = 0x28;

/// Factory alarm thresholds, used when the current ones cannot be read.
const DEFAULT_TH: u8 = 0x4B;
const DEFAULT_TL: u8 = 0x46;

/// `true` for the families this driver knows how to decode.
pub fn is_thermometer(family: u8) -> bool {
    matches!(family, FAMILY_DS18S20 | FAMILY_DS1822 | FAMILY_DS18B20)
}

// ── Resolution ────────────────────────────────────────────────

/// Conversion resolution.  Applies to every device on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Resolution {
    Bits9,
    Bits10,
    Bits11,
    #[default]
    Bits12,
}

impl Resolution {
    pub const fn bits(self) -> u8 {
        match self {
            Self::Bits9 => 9,
            Self::Bits10 => 10,
            Self::Bits11 => 11,
            Self::Bits12 => 12,
        }
    }

    /// Worst-case conversion time from the datasheet.
    pub const fn conversion_time(self) -> Duration {
        match self {
            Self::Bits9 => Duration::from_micros(93_750),
            Self::Bits10 => Duration::from_micros(187_500),
            Self::Bits11 => Duration::from_millis(375),
            Self::Bits12 => Duration::from_millis(750),
        }
    }

    /// Value for scratchpad byte 4: `0 R1 R0 1 1 1 1 1`.
    pub const fn config_register(self) -> u8 {
        ((self.bits() - 9) << 5) | 0x1F
    }

    /// Bits of the raw reading that are undefined at this resolution.
    const fn undefined_bits(self) -> i16 {
        match self {
            Self::Bits9 => 0b111,
            Self::Bits10 => 0b11,
            Self::Bits11 => 0b1,
            Self::Bits12 => 0,
        }
    }
}

impl TryFrom<u8> for Resolution {
    type Error = &'static str;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            9 => Ok(Self::Bits9),
            10 => Ok(Self::Bits10),
            11 => Ok(Self::Bits11),
            12 => Ok(Self::Bits12),
            _ => Err("resolution must be 9, 10, 11 or 12 bits"),
        }
    }
}

impl From<Resolution> for u8 {
    fn from(r: Resolution) -> Self {
        r.bits()
    }
}

// ── Scratchpad ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scratchpad(pub [u8; 9]);

impl Scratchpad {
    /// CRC byte matches bytes 0-7.
    pub fn is_valid(&self) -> bool {
        crc::verify(&self.0)
    }

    /// Every byte read back as `0xFF`: nobody drove the line, the device
    /// is gone or never saw the command.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|b| *b == 0xFF)
    }

    pub fn raw_temperature(&self) -> i16 {
        i16::from_le_bytes([self.0[0], self.0[1]])
    }

    pub fn alarm_registers(&self) -> (u8, u8) {
        (self.0[2], self.0[3])
    }

    /// Decode degrees Celsius for a device of `family`.
    pub fn celsius(&self, family: u8, resolution: Resolution) -> f32 {
        let raw = self.raw_temperature();
        if family == FAMILY_DS18S20 {
            // Fixed 9-bit part, 0.5 °C per LSB.
            return f32::from(raw) / 2.0;
        }
        f32::from(raw & !resolution.undefined_bits()) / 16.0
    }
}

// ── Bus operations ────────────────────────────────────────────

/// Skip ROM + Convert T: every device starts converting at once.
/// Returns `false` if no device answered the reset.
pub fn start_conversion_all(bus: &mut impl OneWireBus) -> Result<bool, BusError> {
    if !onewire::select(bus, None)? {
        return Ok(false);
    }
    bus.write_byte(CONVERT_T)?;
    Ok(true)
}

/// Issue one read slot after Convert T.  Converting devices hold the line
/// low, so `true` means every device has finished.
pub fn conversion_done(bus: &mut impl OneWireBus) -> Result<bool, BusError> {
    bus.read_bit()
}

/// Read the scratchpad of `rom`, or of the only device on the bus when
/// `rom` is `None`.  `Ok(None)` if no presence pulse was seen.
pub fn read_scratchpad(
    bus: &mut impl OneWireBus,
    rom: Option<&RomCode>,
) -> Result<Option<Scratchpad>, BusError> {
    if !onewire::select(bus, rom)? {
        return Ok(None);
    }
    bus.write_byte(READ_SCRATCHPAD)?;
    let mut bytes = [0u8; 9];
    bus.read_bytes(&mut bytes)?;
    Ok(Some(Scratchpad(bytes)))
}

/// Program `resolution` into the configuration register of `rom`, keeping
/// its alarm thresholds.  The setting lives in RAM only; it is not copied
/// to EEPROM, so it is reapplied after every scan.
///
/// Returns `false` if the device did not answer.
pub fn set_resolution(
    bus: &mut impl OneWireBus,
    rom: Option<&RomCode>,
    resolution: Resolution,
) -> Result<bool, BusError> {
    let (th, tl) = match read_scratchpad(bus, rom)? {
        Some(pad) if pad.is_valid() => pad.alarm_registers(),
        Some(_) => (DEFAULT_TH, DEFAULT_TL),
        None => return Ok(false),
    };
    if !onewire::select(bus, rom)? {
        return Ok(false);
    }
    bus.write_byte(WRITE_SCRATCHPAD)?;
    bus.write_bytes(&[th, tl, resolution.config_register()])?;
    Ok(true)
}

/// Skip ROM + Write Scratchpad: every device on the bus takes `resolution`
/// and the default alarm thresholds.
pub fn broadcast_resolution(
    bus: &mut impl OneWireBus,
    resolution: Resolution,
) -> Result<bool, BusError> {
    if !onewire::select(bus, None)? {
        return Ok(false);
    }
    bus.write_byte(WRITE_SCRATCHPAD)?;
    bus.write_bytes(&[DEFAULT_TH, DEFAULT_TL, resolution.config_register()])?;
    Ok(true)
}
