//! JSON payloads for the hello and sample messages.
//!
//! Both are compact (unformatted) JSON objects.  Field order follows the
//! struct declarations but consumers must not rely on it.
//!
//! ```text
//! hello:  {"entity_type":"sensor","device_id":"ESP32-246F28A7C53C",
//!          "sources":["D90301A2792B0528","E40300A27970F728"]}
//! sample: {"entity_type":"sensor","name":"D90301A2792B0528",
//!          "signature":"TD90301A2792B0528","signal":21.5,
//!          "device_id":"ESP32-246F28A7C53C"}
//! ```
//!
//! A failed reading is still published, with `"signal":null` and an
//! `"error"` key naming the failure, so the consumer can tell a sensor
//! fault from a silent device.

use serde::Serialize;

use super::identity::Identity;
use crate::error::CodecError;
use crate::onewire::rom::ADDRESS_LEN;
use crate::poll::{ReadStatus, Reading};
use crate::registry::{Device, DeviceRegistry};

pub const ENTITY_TYPE_SENSOR: &str = "sensor";

/// Class prefix + address.
pub type Signature = heapless::String<{ ADDRESS_LEN + 1 }>;

#[derive(Serialize)]
struct Hello<'a> {
    entity_type: &'static str,
    device_id: &'a str,
    sources: Vec<&'a str>,
}

#[derive(Serialize)]
struct Sample<'a> {
    entity_type: &'static str,
    name: &'a str,
    signature: &'a str,
    signal: Option<f32>,
    device_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

/// `T28FF641D04160037` for a thermometer at `28FF641D04160037`.
pub fn signature(device: &Device) -> Signature {
    let mut sig = Signature::new();
    // 1 + ADDRESS_LEN == capacity
    let _ = sig.push(device.class().signature_prefix());
    let _ = sig.push_str(device.address().as_str());
    sig
}

/// Hello payload listing every registered address in registry order.
pub fn hello(identity: &Identity, registry: &DeviceRegistry) -> Result<String, CodecError> {
    let msg = Hello {
        entity_type: ENTITY_TYPE_SENSOR,
        device_id: identity.device_id(),
        sources: registry.addresses().map(|a| a.as_str()).collect(),
    };
    serde_json::to_string(&msg).map_err(|_| CodecError::Encode)
}

/// Sample payload for one reading of `device`.
pub fn sample(identity: &Identity, device: &Device, reading: &Reading) -> Result<String, CodecError> {
    let signature = signature(device);
    let (signal, error) = match reading.status {
        ReadStatus::Ok => (reading.value, None),
        ReadStatus::CrcError => (None, Some("crc_error")),
        ReadStatus::Timeout => (None, Some("timeout")),
    };
    let msg = Sample {
        entity_type: ENTITY_TYPE_SENSOR,
        name: device.address().as_str(),
        signature: signature.as_str(),
        signal,
        device_id: identity.device_id(),
        error,
    };
    serde_json::to_string(&msg).map_err(|_| CodecError::Encode)
}
