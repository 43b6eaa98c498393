//! Fuzz target: `Address::from_str`
//!
//! cargo fuzz run fuzz_address

#![no_main]

use hcc_edge::onewire::Address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(address) = text.parse::<Address>() {
        // Parsed text is canonical: rendering the ROM gives the same address.
        assert_eq!(address.rom().address(), address);
        assert_eq!(address.as_str().len(), 16);
        assert!(address.as_str().eq_ignore_ascii_case(text));
    }
});
