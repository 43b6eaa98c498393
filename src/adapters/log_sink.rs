//! Log-based publish sink.
//!
//! Implements [`PublishSink`] by writing each message to the logger (UART
//! / USB-CDC on the device).  Used when no broker is configured and in
//! host runs; the MQTT sink implements the same trait.

use log::info;

use crate::app::ports::PublishSink;

/// Adapter that logs every message to the serial console.
#[derive(Debug, Default)]
pub struct LogPublishSink {
    sent: u64,
}

impl LogPublishSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl PublishSink for LogPublishSink {
    fn publish(&mut self, topic: &str, payload: &str) {
        self.sent += 1;
        info!("PUB | {} | {}", topic, payload);
    }
}
