//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter     | Implements   | Connects to                   |
//! |-------------|--------------|-------------------------------|
//! | `device_id` | (MAC source) | eFuse station MAC             |
//! | `log_sink`  | PublishSink  | Serial log output             |
//! | `mqtt`      | PublishSink  | ESP-IDF MQTT client           |
//! | `network`   | (bring-up)   | ESP-IDF WiFi STA              |
//! | `time`      | TimePort     | ESP32 system timer            |
//!
//! The 1-Wire bus adapter is [`crate::onewire::bitbang::PinBus`].

pub mod device_id;
pub mod log_sink;
pub mod mqtt;
pub mod network;
pub mod time;
