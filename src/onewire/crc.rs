//! Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected).
//!
//! Protects both the 64-bit ROM code (CRC in byte 7) and the 9-byte
//! scratchpad (CRC in byte 8).

use crc::{CRC_8_MAXIM_DOW, Crc};

const CRC_COMPUTER: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// CRC-8 of `data`.
#[inline]
pub fn crc8(data: &[u8]) -> u8 {
    CRC_COMPUTER.checksum(data)
}

/// `true` if the last byte of `frame` is the CRC-8 of everything before it.
/// An empty frame never verifies.
pub fn verify(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((crc, body)) => crc8(body) == *crc,
        None => false,
    }
}
