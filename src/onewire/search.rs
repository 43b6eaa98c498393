//! Search ROM: enumerate every device on the bus.
//!
//! Each pass walks the 64 ROM bits.  For every bit all still-participating
//! devices send the bit and then its complement; the wired-AND tells us
//! whether they agree (`01`/`10`), disagree (`00`, a discrepancy) or nobody
//! is left (`11`).  The master writes back the branch to follow and devices
//! on the other branch drop out.  Remembering the last discrepancy where we
//! took the `0` branch lets the next pass take the `1` branch there, so the
//! passes together visit the whole address tree once.

use log::debug;

use super::{OneWireBus, RomCode, SEARCH_ROM};
use crate::error::BusError;

/// Outcome of one search pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchHit {
    /// ROM code whose CRC checks out.
    Valid(RomCode),
    /// ROM code that failed its CRC (noise on the line during the pass).
    Corrupt(RomCode),
}

/// Resumable search state.
#[derive(Debug, Clone, Default)]
pub struct RomSearch {
    rom: [u8; 8],
    /// 1-based bit position of the last unresolved `0` branch; 0 = none.
    last_discrepancy: usize,
    done: bool,
}

impl RomSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one search pass.  `Ok(None)` once every device has been visited,
    /// or immediately if no device answers the reset.
    pub fn next(&mut self, bus: &mut impl OneWireBus) -> Result<Option<SearchHit>, BusError> {
        if self.done {
            return Ok(None);
        }
        if !bus.reset()? {
            debug!("Search: no presence pulse");
            self.done = true;
            return Ok(None);
        }
        bus.write_byte(SEARCH_ROM)?;

        let mut rom = RomCode::new(self.rom);
        let mut last_zero = 0;

        for bit_number in 1..=64 {
            let id_bit = bus.read_bit()?;
            let cmp_bit = bus.read_bit()?;

            let direction = match (id_bit, cmp_bit) {
                (true, true) => {
                    // Everybody dropped out mid-pass.
                    debug!("Search: no devices left at bit {}", bit_number);
                    self.done = true;
                    return Ok(None);
                }
                (bit, cmp) if bit != cmp => bit,
                _ => {
                    let dir = if bit_number < self.last_discrepancy {
                        rom.bit(bit_number - 1)
                    } else {
                        bit_number == self.last_discrepancy
                    };
                    if !dir {
                        last_zero = bit_number;
                    }
                    dir
                }
            };

            rom.set_bit(bit_number - 1, direction);
            bus.write_bit(direction)?;
        }

        self.rom = *rom.as_bytes();
        self.last_discrepancy = last_zero;
        if last_zero == 0 {
            self.done = true;
        }

        Ok(Some(if rom.is_valid() {
            SearchHit::Valid(rom)
        } else {
            SearchHit::Corrupt(rom)
        }))
    }
}
