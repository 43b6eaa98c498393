//! Fuzz target: DS18B20 scratchpad decoding
//!
//! Arbitrary 9-byte frames for every resolution and family must decode
//! to a finite temperature within the 16-bit register range.
//!
//! cargo fuzz run fuzz_scratchpad

#![no_main]

use hcc_edge::onewire::crc;
use hcc_edge::sensors::ds18b20::{FAMILY_DS18B20, FAMILY_DS18S20, Resolution, Scratchpad};
use libfuzzer_sys::fuzz_target;

const RESOLUTIONS: [Resolution; 4] = [
    Resolution::Bits9,
    Resolution::Bits10,
    Resolution::Bits11,
    Resolution::Bits12,
];

fuzz_target!(|frame: [u8; 9]| {
    let pad = Scratchpad(frame);
    assert_eq!(pad.is_valid(), crc::crc8(&frame[..8]) == frame[8]);

    for resolution in RESOLUTIONS {
        for family in [FAMILY_DS18B20, FAMILY_DS18S20] {
            let c = pad.celsius(family, resolution);
            assert!(c.is_finite());
            assert!((-2048.0..2048.0).contains(&c));
        }
    }
});
