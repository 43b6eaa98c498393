//! Hello / sample publishing, and the scan-to-sink pipeline.

use std::time::Duration;

use hcc_edge::poll::{PollEngine, Reading, ReadingBatch, ReadingChannel, ReadStatus};
use hcc_edge::registry::DeviceRegistry;
use hcc_edge::scanner::BusScanner;
use hcc_edge::sensors::ds18b20::Resolution;
use hcc_edge::telemetry::{Identity, Publisher};

use crate::mock_bus::{FakeClock, RecordingSink, SimBus, SimDevice};

const MAC: [u8; 6] = [0x24, 0x6F, 0x28, 0xA7, 0xC5, 0x3C];

fn registry(n: u8, root: &str) -> DeviceRegistry {
    let roms = (0..n).map(|i| SimDevice::ds18b20(i + 1, 0.0).rom);
    DeviceRegistry::build(roms, 16, root).unwrap().0
}

fn batch(readings: &[Reading]) -> ReadingBatch {
    ReadingBatch {
        cycle: 0,
        scheduled_at: Duration::ZERO,
        readings: readings.iter().copied().collect(),
    }
}

#[test]
fn hello_goes_to_edge_topic_with_sources_in_order() {
    let reg = registry(3, "x");
    let identity = Identity::derive(&MAC, "x").unwrap();
    let publisher = Publisher::new(&reg, &identity).unwrap();
    let mut sink = RecordingSink::new();

    publisher.announce(&mut sink);

    assert_eq!(sink.messages.len(), 1);
    assert_eq!(sink.messages[0].0, "x/edge");
    let hello = &sink.payloads()[0];
    assert_eq!(hello["entity_type"], "sensor");
    assert_eq!(hello["device_id"], "ESP32-246F28A7C53C");
    let sources: Vec<&str> = hello["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    let expected: Vec<&str> = reg.addresses().map(|a| a.as_str()).collect();
    assert_eq!(sources, expected);
}

#[test]
fn one_sample_per_reading_on_the_device_topic() {
    let reg = registry(2, "hcc");
    let identity = Identity::derive(&MAC, "hcc").unwrap();
    let mut publisher = Publisher::new(&reg, &identity).unwrap();
    let mut sink = RecordingSink::new();

    let sent = publisher.publish_batch(&batch(&[Reading::ok(0, 21.5), Reading::ok(1, 22.0)]), &mut sink);

    assert_eq!(sent, 2);
    assert_eq!(publisher.published(), 2);
    for (i, ((topic, _), payload)) in sink.messages.iter().zip(sink.payloads()).enumerate() {
        let device = reg.get(i).unwrap();
        let addr = device.address().as_str();
        assert_eq!(topic, &format!("hcc/sensor/{addr}"));
        assert_eq!(payload["name"], addr);
        assert_eq!(payload["signature"], format!("T{addr}"));
        assert_eq!(payload["device_id"], "ESP32-246F28A7C53C");
    }
    assert_eq!(sink.payloads()[0]["signal"], 21.5);
}

#[test]
fn failed_readings_are_published_with_error() {
    let reg = registry(2, "hcc");
    let identity = Identity::derive(&MAC, "hcc").unwrap();
    let mut publisher = Publisher::new(&reg, &identity).unwrap();
    let mut sink = RecordingSink::new();

    publisher.publish_batch(
        &batch(&[
            Reading::failed(0, ReadStatus::CrcError),
            Reading::failed(1, ReadStatus::Timeout),
        ]),
        &mut sink,
    );

    let payloads = sink.payloads();
    assert!(payloads[0]["signal"].is_null());
    assert_eq!(payloads[0]["error"], "crc_error");
    assert_eq!(payloads[1]["error"], "timeout");
}

#[test]
fn unknown_ordinal_is_skipped() {
    let reg = registry(1, "hcc");
    let identity = Identity::derive(&MAC, "hcc").unwrap();
    let mut publisher = Publisher::new(&reg, &identity).unwrap();
    let mut sink = RecordingSink::new();

    let sent = publisher.publish_batch(&batch(&[Reading::ok(5, 1.0), Reading::ok(0, 2.0)]), &mut sink);

    assert_eq!(sent, 1);
    assert_eq!(sink.messages.len(), 1);
}

#[test]
fn scan_poll_publish_pipeline() {
    let clock = FakeClock::default();
    let mut bus = SimBus::new(vec![
        SimDevice::ds18b20(1, 18.25),
        SimDevice::ds18b20(2, 19.5),
        SimDevice::ds18b20(3, 20.75),
    ]);
    bus.devices[2].corrupt_reads = true;

    let found = BusScanner::new(8, Resolution::Bits12)
        .scan(&mut bus, &clock, "hcc")
        .unwrap();
    let identity = Identity::derive(&MAC, "hcc").unwrap();
    let mut publisher = Publisher::new(&found.registry, &identity).unwrap();
    let mut sink = RecordingSink::new();
    publisher.announce(&mut sink);

    let channel = ReadingChannel::new();
    let tx = channel.sender();
    let rx = channel.receiver();
    let mut engine = PollEngine::new(&found.registry, Resolution::Bits12, Duration::from_secs(5));
    engine.step(&mut bus, &clock, &tx);
    engine.step(&mut bus, &clock, &tx);

    let sent = publisher.drain(&rx, &mut sink);

    assert_eq!(sent, 6);
    assert_eq!(sink.messages.len(), 7);
    assert_eq!(sink.messages[0].0, "hcc/edge");

    let payloads = sink.payloads();
    let errors = payloads.iter().filter(|p| p.get("error").is_some()).count();
    assert_eq!(errors, 2);
    let mut signals: Vec<f64> = payloads[1..4]
        .iter()
        .filter_map(|p| p["signal"].as_f64())
        .collect();
    signals.sort_by(f64::total_cmp);
    assert_eq!(signals, vec![18.25, 19.5]);
}
