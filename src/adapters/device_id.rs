//! Hardware MAC address source for the device identity.
//!
//! The Wi-Fi station MAC is factory-burned into eFuse, so the identity
//! derived from it is stable across reboots and reflashes.  There is no
//! fallback: every message is keyed by this identity, so an unreadable MAC
//! stops startup.

use crate::error::IdentityError;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the Wi-Fi station MAC address.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> Result<MacAddress, IdentityError> {
    use esp_idf_svc::sys::{ESP_OK, esp_mac_type_t_ESP_MAC_WIFI_STA, esp_read_mac};

    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer, the size esp_read_mac writes
    // for the station interface.
    let ret = unsafe { esp_read_mac(mac.as_mut_ptr(), esp_mac_type_t_ESP_MAC_WIFI_STA) };
    if ret != ESP_OK {
        return Err(IdentityError::MacUnreadable(ret));
    }
    Ok(mac)
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> Result<MacAddress, IdentityError> {
    Ok([0x24, 0x6F, 0x28, 0xA7, 0xC5, 0x3C])
}
