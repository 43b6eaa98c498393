//! Startup composition from configuration.

use hcc_edge::app::ports::{Direction, Stepper, StepperError};
use hcc_edge::app::service::EdgeService;
use hcc_edge::config::EdgeConfig;
use hcc_edge::error::{ConfigError, Error};
use hcc_edge::poll::ReadStatus;
use hcc_edge::sensors::ds18b20::Resolution;

use crate::mock_bus::{FakeClock, RecordingSink, SimBus, SimDevice};

const MAC: [u8; 6] = [0x24, 0x6F, 0x28, 0xA7, 0xC5, 0x3C];

fn config() -> EdgeConfig {
    EdgeConfig {
        onewire_enabled: true,
        actuator_enabled: false,
        bus_gpio: 4,
        max_devices: 4,
        poll_interval_secs: 5,
        resolution: Resolution::Bits11,
        settle_ms: 100,
        pub_root: "hcc".into(),
        broker_url: String::new(),
        wifi_ssid: String::new(),
        wifi_password: String::new(),
    }
}

fn bus(n: u8) -> SimBus {
    SimBus::new((0..n).map(|i| SimDevice::ds18b20(i + 1, 20.0)).collect())
}

/// Records moves; just enough to prove the actuator slot works.
#[derive(Default)]
struct FakeStepper {
    position: i32,
    microstep: u8,
    asleep: bool,
}

impl Stepper for FakeStepper {
    fn step(&mut self, direction: Direction) -> i32 {
        self.position += match direction {
            Direction::Up => 1,
            Direction::Down => -1,
        };
        self.position
    }

    fn max_microstep(&self) -> u8 {
        16
    }

    fn microstep(&self) -> u8 {
        self.microstep
    }

    fn set_microstep(&mut self, divisor: u8) -> Result<(), StepperError> {
        if !divisor.is_power_of_two() || divisor > self.max_microstep() {
            return Err(StepperError::UnsupportedMicrostep(divisor));
        }
        self.microstep = divisor;
        Ok(())
    }

    fn power_save(&mut self, enable: bool) -> bool {
        self.asleep = enable;
        self.asleep
    }
}

#[test]
fn invalid_config_aborts_startup() {
    let cfg = EdgeConfig {
        onewire_enabled: false,
        ..config()
    };
    assert_eq!(
        EdgeService::new(cfg, &MAC).err(),
        Some(Error::Config(ConfigError::NoComponents))
    );
}

#[test]
fn enabled_bus_is_scanned_and_polled() {
    let mut service = EdgeService::new(config(), &MAC).unwrap();
    let mut bus = bus(6);
    let clock = FakeClock::default();

    service.discover(&mut bus, &clock).unwrap();
    service.log_configuration();

    assert_eq!(service.registry().len(), 4);
    assert_eq!(service.capacity_exceeded().map(|c| c.found), Some(6));
    assert_eq!(clock.sleeps()[0].as_millis(), 100);
    for dev in &bus.devices {
        assert_eq!(dev.config_register(), Resolution::Bits11.config_register());
    }

    assert_eq!(service.devices_on_bus(), 6);

    let mut engine = service.poll_engine().unwrap();
    let batch = engine.run_cycle(&mut bus, &clock);
    assert_eq!(batch.readings.len(), 4);
    assert!(batch.readings.iter().all(|r| r.value == Some(20.0)));
}

#[test]
fn one_slot_on_a_two_sensor_bus_still_reads_cleanly() {
    let cfg = EdgeConfig {
        max_devices: 1,
        ..config()
    };
    let mut service = EdgeService::new(cfg, &MAC).unwrap();
    let mut bus = SimBus::new(vec![SimDevice::ds18b20(1, 20.0), SimDevice::ds18b20(2, 25.0)]);
    let clock = FakeClock::default();

    service.discover(&mut bus, &clock).unwrap();
    let mut engine = service.poll_engine().unwrap();
    let batch = engine.run_cycle(&mut bus, &clock);

    assert_eq!(batch.readings.len(), 1);
    assert_eq!(batch.readings[0].status, ReadStatus::Ok);
    assert!(matches!(batch.readings[0].value, Some(v) if v == 20.0 || v == 25.0));
}

#[test]
fn overlong_root_fails_before_any_scan() {
    let cfg = EdgeConfig {
        pub_root: "r".repeat(80),
        ..config()
    };
    assert!(matches!(
        EdgeService::new(cfg, &MAC).err(),
        Some(Error::Config(ConfigError::ValidationFailed(_)))
    ));
}

#[test]
fn disabled_bus_means_no_scan_and_no_engine() {
    let cfg = EdgeConfig {
        onewire_enabled: false,
        actuator_enabled: true,
        ..config()
    };
    let mut service = EdgeService::new(cfg, &MAC).unwrap();
    let mut bus = bus(2);

    service.discover(&mut bus, &FakeClock::default()).unwrap();

    assert_eq!(bus.resets, 0);
    assert!(service.registry().is_empty());
    assert!(service.poll_engine().is_none());

    let publisher = service.publisher().unwrap();
    let mut sink = RecordingSink::new();
    publisher.announce(&mut sink);
    assert_eq!(
        sink.messages[0],
        (
            "hcc/edge".to_owned(),
            r#"{"entity_type":"sensor","device_id":"ESP32-246F28A7C53C","sources":[]}"#.to_owned()
        )
    );
}

#[test]
fn actuator_slot_follows_config() {
    let mut off = EdgeService::new(config(), &MAC).unwrap();
    assert!(!off.attach_actuator(Box::new(FakeStepper::default())));
    assert!(off.actuator_mut().is_none());

    let cfg = EdgeConfig {
        actuator_enabled: true,
        ..config()
    };
    let mut on = EdgeService::new(cfg, &MAC).unwrap();
    assert!(on.attach_actuator(Box::new(FakeStepper::default())));
    on.log_configuration();

    let stepper = on.actuator_mut().unwrap();
    assert_eq!(stepper.step(Direction::Up), 1);
    assert_eq!(stepper.set_microstep(3), Err(StepperError::UnsupportedMicrostep(3)));
    assert_eq!(stepper.set_microstep(8), Ok(()));
    assert_eq!(stepper.microstep(), 8);
    assert!(stepper.power_save(true));
}

#[test]
fn identity_is_derived_from_mac_and_root() {
    let service = EdgeService::new(config(), &MAC).unwrap();
    assert_eq!(service.identity().device_id(), "ESP32-246F28A7C53C");
    assert_eq!(service.identity().edge_topic(), "hcc/edge");
}
