//! HCC edge firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │  PinBus (1-Wire)   Esp32Time   MqttPublishSink / LogSink     │
//! │                                                              │
//! │  ───────────────── Port Trait Boundary ─────────────────     │
//! │                                                              │
//! │  EdgeService: scan · identity · hello                        │
//! │                                                              │
//! │  poll thread ──▶ READINGS (depth 4) ──▶ publisher (main)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::thread;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};

use hcc_edge::adapters::device_id;
use hcc_edge::adapters::log_sink::LogPublishSink;
use hcc_edge::adapters::mqtt::MqttPublishSink;
use hcc_edge::adapters::network::{self, Credentials};
use hcc_edge::adapters::time::Esp32TimeAdapter;
use hcc_edge::app::ports::PublishSink;
use hcc_edge::app::service::EdgeService;
use hcc_edge::config::EdgeConfig;
use hcc_edge::onewire::bitbang::PinBus;
use hcc_edge::poll::READINGS;

/// Stack for the poll thread; a cycle never allocates more than one batch.
const POLL_STACK: usize = 8 * 1024;

// ── Publish sink selection ────────────────────────────────────

enum Sink {
    Mqtt(MqttPublishSink),
    Log(LogPublishSink),
}

impl PublishSink for Sink {
    fn publish(&mut self, topic: &str, payload: &str) {
        match self {
            Self::Mqtt(s) => s.publish(topic, payload),
            Self::Log(s) => s.publish(topic, payload),
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("HCC edge v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config + identity ──────────────────────────────────
    let config = match option_env!("HCC_CONFIG_JSON") {
        Some(json) => EdgeConfig::from_json(json)?,
        None => EdgeConfig::default(),
    };
    let mac = device_id::read_mac()?;
    let mut service = EdgeService::new(config, &mac)?;
    let time = Esp32TimeAdapter::new();

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 3. 1-Wire bus + scan ──────────────────────────────────
    let mut bus = if service.config().onewire_enabled {
        // SAFETY: the data GPIO is dedicated to the bus and claimed once here.
        let pin = unsafe { AnyIOPin::new(service.config().bus_gpio) };
        Some(PinBus::new(PinDriver::input_output_od(pin)?, Ets))
    } else {
        None
    };
    if let Some(bus) = bus.as_mut() {
        service.discover(bus, &time)?;
    }
    service.log_configuration();

    // ── 4. Network + publish sink ─────────────────────────────
    let publisher = service.publisher()?;
    let cfg = service.config();
    let (mut sink, _wifi) = if cfg.wifi_ssid.is_empty() || cfg.broker_url.is_empty() {
        warn!("Main: no network configured, publishing to the log");
        (Sink::Log(LogPublishSink::new()), None)
    } else {
        let credentials = Credentials::new(&cfg.wifi_ssid, &cfg.wifi_password)?;
        let wifi = network::connect(peripherals.modem, sys_loop, nvs, &credentials)?;
        let identity = service.identity();
        let hello = (identity.edge_topic().to_owned(), publisher.hello().to_owned());
        let mqtt = MqttPublishSink::connect(&cfg.broker_url, identity.device_id(), hello)?;
        (Sink::Mqtt(mqtt), Some(wifi))
    };

    // Queued before the poll thread exists, so it precedes every sample.
    publisher.announce(&mut sink);

    // ── 5. Poll thread + publish loop ─────────────────────────
    let engine = service.poll_engine();
    thread::scope(|s| -> Result<()> {
        if let (Some(engine), Some(bus)) = (engine, bus.as_mut()) {
            let time = &time;
            thread::Builder::new()
                .name("poll".into())
                .stack_size(POLL_STACK)
                .spawn_scoped(s, move || {
                    engine.run(bus, time, &READINGS.sender());
                })?;
        } else {
            info!("Main: no poll engine, idling after hello");
        }
        futures_lite::future::block_on(publisher.run(READINGS.receiver(), &mut sink));
        Ok(())
    })
}
