//! 64-bit ROM codes and their textual address form.
//!
//! On the wire a ROM code is `family · serial[6] · crc`, family first.
//! The textual address prints the bytes in reverse (CRC first, family
//! last), matching the convention used by the existing HCC tooling:
//! `D90301A2792B0528` is a DS18B20 (family `0x28`) with CRC `0xD9`.

use core::fmt::{self, Write};
use core::str::FromStr;

use serde::Serialize;

use super::crc;
use crate::error::AddressError;

/// Raw 8-byte ROM code, in bus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RomCode([u8; 8]);

impl RomCode {
    pub const fn new(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Build a ROM code from family and serial, computing the CRC byte.
    pub fn from_parts(family: u8, serial: [u8; 6]) -> Self {
        let mut bytes = [0u8; 8];
        bytes[0] = family;
        bytes[1..7].copy_from_slice(&serial);
        bytes[7] = crc::crc8(&bytes[..7]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    pub fn family(&self) -> u8 {
        self.0[0]
    }

    pub fn crc(&self) -> u8 {
        self.0[7]
    }

    /// Bit `index` (0..64) in transmission order.
    pub fn bit(&self, index: usize) -> bool {
        (self.0[index / 8] >> (index % 8)) & 1 == 1
    }

    pub fn set_bit(&mut self, index: usize, value: bool) {
        let mask = 1 << (index % 8);
        if value {
            self.0[index / 8] |= mask;
        } else {
            self.0[index / 8] &= !mask;
        }
    }

    /// CRC byte matches the first seven bytes.  An all-zero code is
    /// rejected too, since its CRC is trivially zero and it is what a
    /// shorted line reads back.
    pub fn is_valid(&self) -> bool {
        self.0 != [0u8; 8] && crc::verify(&self.0)
    }

    pub fn address(&self) -> Address {
        let mut s = heapless::String::new();
        for byte in self.0.iter().rev() {
            // 8 bytes * 2 digits == capacity, cannot overflow.
            let _ = write!(s, "{:02X}", byte);
        }
        Address(s)
    }
}

impl fmt::Display for RomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address().as_str())
    }
}

/// Number of characters in a textual address.
pub const ADDRESS_LEN: usize = 16;

/// 16 uppercase hex digits identifying a device on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(heapless::String<ADDRESS_LEN>);

impl Address {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Parse back into the bus-order ROM code.
    pub fn rom(&self) -> RomCode {
        let digits = self.0.as_bytes();
        let mut bytes = [0u8; 8];
        for (i, slot) in bytes.iter_mut().rev().enumerate() {
            *slot = (hex_value(digits[2 * i]) << 4) | hex_value(digits[2 * i + 1]);
        }
        RomCode(bytes)
    }
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts upper- or lowercase hex; stores uppercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(AddressError::Length);
        }
        let mut out = heapless::String::new();
        for c in s.chars() {
            if !c.is_ascii_hexdigit() {
                return Err(AddressError::NotHex);
            }
            out.push(c.to_ascii_uppercase()).map_err(|()| AddressError::Length)?;
        }
        Ok(Self(out))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
