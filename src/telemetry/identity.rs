//! Device identity: who is publishing, and where the hello goes.
//!
//! `device_id` is `ESP32-` followed by the six MAC bytes in uppercase hex,
//! e.g. `ESP32-246F28A7C53C`.  Computed once at startup and read-only
//! afterwards.

use core::fmt::Write;

use super::topic::{self, Topic};
use crate::adapters::device_id::MacAddress;
use crate::error::TopicError;

/// Length of every device id.
pub const DEVICE_ID_LEN: usize = 18;

const DEVICE_ID_PREFIX: &str = "ESP32-";

/// Fixed-size device ID string.
pub type DeviceId = heapless::String<DEVICE_ID_LEN>;

/// Derive the device ID from the full MAC.
pub fn device_id(mac: &MacAddress) -> DeviceId {
    let mut id = DeviceId::new();
    // Prefix (6) + 12 hex digits fills the buffer exactly.
    let _ = write!(
        id,
        "{}{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        DEVICE_ID_PREFIX, mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );
    id
}

/// Process-wide identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    device_id: DeviceId,
    edge_topic: Topic,
}

impl Identity {
    pub fn derive(mac: &MacAddress, root: &str) -> Result<Self, TopicError> {
        Ok(Self {
            device_id: device_id(mac),
            edge_topic: topic::edge_topic(root)?,
        })
    }

    pub fn device_id(&self) -> &str {
        self.device_id.as_str()
    }

    /// Topic the hello message is published on.
    pub fn edge_topic(&self) -> &str {
        self.edge_topic.as_str()
    }
}
