//! MQTT publish sink.
//!
//! Wraps `EspMqttClient` (ESP-IDF only).  The caller announces through the
//! sink before the poll thread starts; the client's outbox holds that hello
//! until the broker connects, so it leaves ahead of every sample.  A
//! connection thread watches broker events and re-publishes the hello on
//! every later session, so a consumer that restarts or a broker that drops
//! the session still learns the source list.  Samples are enqueued with
//! QoS 1, and failures are logged and dropped.

#[cfg(target_os = "espidf")]
use std::sync::{Arc, Mutex};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
#[cfg(target_os = "espidf")]
use log::{info, warn};

#[cfg(target_os = "espidf")]
use crate::app::ports::PublishSink;

/// Stack for the broker event thread.
#[cfg(target_os = "espidf")]
const CONNECTION_STACK: usize = 6 * 1024;

// ── Session tracking ──────────────────────────────────────────

/// Counts broker sessions.  The first session carries the hello that was
/// queued at startup; every later one needs a fresh copy.
#[derive(Debug, Default)]
pub struct HelloOnReconnect {
    sessions: u32,
}

impl HelloOnReconnect {
    /// Record a `Connected` event.  Returns `true` if the hello must be
    /// queued again.
    pub fn on_connected(&mut self) -> bool {
        self.sessions = self.sessions.saturating_add(1);
        self.sessions > 1
    }

    pub fn sessions(&self) -> u32 {
        self.sessions
    }
}

// ── Client ────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct MqttPublishSink {
    client: Arc<Mutex<EspMqttClient<'static>>>,
}

#[cfg(target_os = "espidf")]
impl MqttPublishSink {
    /// Connect to `url` as `client_id`.  `hello` is (topic, payload) and is
    /// re-published on every reconnect.
    pub fn connect(url: &str, client_id: &str, hello: (String, String)) -> anyhow::Result<Self> {
        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };
        let (client, mut connection) = EspMqttClient::new(url, &conf)?;
        let client = Arc::new(Mutex::new(client));

        let events = Arc::clone(&client);
        std::thread::Builder::new()
            .name("mqtt-events".into())
            .stack_size(CONNECTION_STACK)
            .spawn(move || {
                let (topic, payload) = hello;
                let mut sessions = HelloOnReconnect::default();
                while let Ok(event) = connection.next() {
                    match event.payload() {
                        EventPayload::Connected(_) => {
                            if !sessions.on_connected() {
                                info!("MQTT: connected");
                                continue;
                            }
                            info!("MQTT: reconnected, announcing on {}", topic);
                            if let Ok(mut client) = events.lock() {
                                if let Err(e) =
                                    client.enqueue(&topic, QoS::AtLeastOnce, false, payload.as_bytes())
                                {
                                    warn!("MQTT: hello not queued: {}", e);
                                }
                            }
                        }
                        EventPayload::Disconnected => warn!("MQTT: disconnected"),
                        EventPayload::Error(e) => warn!("MQTT: {}", e),
                        _ => {}
                    }
                }
                info!("MQTT: connection closed");
            })?;

        info!("MQTT: client {} -> {}", client_id, url);
        Ok(Self { client })
    }
}

#[cfg(target_os = "espidf")]
impl PublishSink for MqttPublishSink {
    fn publish(&mut self, topic: &str, payload: &str) {
        let Ok(mut client) = self.client.lock() else {
            warn!("MQTT: client lock poisoned, dropping {}", topic);
            return;
        };
        if let Err(e) = client.enqueue(topic, QoS::AtLeastOnce, false, payload.as_bytes()) {
            warn!("MQTT: publish to {} failed: {}", topic, e);
        }
    }
}
