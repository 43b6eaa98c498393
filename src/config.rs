//! Edge node configuration
//!
//! Defaults are baked in at build time from `HCC_*` environment variables
//! and can be overridden at runtime by a JSON overlay.  Every loaded
//! configuration goes through [`EdgeConfig::validate`] before use.
//!
//! | Variable              | Field                | Fallback                  |
//! |-----------------------|----------------------|---------------------------|
//! | `HCC_ONEWIRE_ENABLED` | `onewire_enabled`    | `true`                    |
//! | `HCC_A4988_ENABLED`   | `actuator_enabled`   | `false`                   |
//! | `HCC_ONEWIRE_GPIO`    | `bus_gpio`           | `4`                       |
//! | `HCC_MAX_DEVICES`     | `max_devices`        | `8`                       |
//! | `HCC_POLL_SECS`       | `poll_interval_secs` | `5`                       |
//! | `HCC_RESOLUTION`      | `resolution`         | `12`                      |
//! | `HCC_SETTLE_MS`       | `settle_ms`          | `2000`                    |
//! | `HCC_PUB_ROOT`        | `pub_root`           | `hcc`                     |
//! | `HCC_BROKER_URL`      | `broker_url`         | `mqtt://192.168.1.10:1883`|
//! | `HCC_WIFI_SSID`       | `wifi_ssid`          | empty                     |
//! | `HCC_WIFI_PASSWORD`   | `wifi_password`      | empty                     |

use core::str::FromStr;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, TopicError};
use crate::registry::DEVICE_SLOTS;
use crate::sensors::ds18b20::Resolution;
use crate::telemetry::topic;

/// Edge node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    // --- Components ---
    /// Run the 1-Wire scanner and poll engine
    pub onewire_enabled: bool,
    /// Reserve the stepper actuator slot
    pub actuator_enabled: bool,

    // --- 1-Wire bus ---
    /// GPIO carrying the 1-Wire data line
    pub bus_gpio: i32,
    /// Devices registered at most (1..=16)
    pub max_devices: usize,
    /// Seconds between cycle starts
    pub poll_interval_secs: u32,
    /// DS18B20 conversion resolution
    pub resolution: Resolution,
    /// Power-on settle delay before the first bus access (milliseconds)
    pub settle_ms: u32,

    // --- Publishing ---
    /// Topic root, e.g. `hcc` for `hcc/sensor/<address>`
    pub pub_root: String,
    pub broker_url: String,

    // --- Network ---
    pub wifi_ssid: String,
    #[serde(skip_serializing)]
    pub wifi_password: String,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            onewire_enabled: env_or(option_env!("HCC_ONEWIRE_ENABLED"), true),
            actuator_enabled: env_or(option_env!("HCC_A4988_ENABLED"), false),

            bus_gpio: env_or(option_env!("HCC_ONEWIRE_GPIO"), 4),
            max_devices: env_or(option_env!("HCC_MAX_DEVICES"), 8),
            poll_interval_secs: env_or(option_env!("HCC_POLL_SECS"), 5),
            resolution: option_env!("HCC_RESOLUTION")
                .and_then(|v| v.parse::<u8>().ok())
                .and_then(|bits| Resolution::try_from(bits).ok())
                .unwrap_or_default(),
            settle_ms: env_or(option_env!("HCC_SETTLE_MS"), 2000),

            pub_root: option_env!("HCC_PUB_ROOT").unwrap_or("hcc").into(),
            broker_url: option_env!("HCC_BROKER_URL")
                .unwrap_or("mqtt://192.168.1.10:1883")
                .into(),

            wifi_ssid: option_env!("HCC_WIFI_SSID").unwrap_or_default().into(),
            wifi_password: option_env!("HCC_WIFI_PASSWORD").unwrap_or_default().into(),
        }
    }
}

impl EdgeConfig {
    /// Defaults overlaid with the fields present in `json`, validated.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the firmware cannot run with.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.onewire_enabled && !self.actuator_enabled {
            return Err(ConfigError::NoComponents);
        }
        if self.max_devices == 0 || self.max_devices > DEVICE_SLOTS {
            return Err(ConfigError::ValidationFailed("max_devices must be 1..=16"));
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("poll_interval_secs must be > 0"));
        }
        if self.bus_gpio < 0 {
            return Err(ConfigError::ValidationFailed("bus_gpio must be >= 0"));
        }
        match topic::validate_root(&self.pub_root) {
            Ok(()) => {}
            Err(TopicError::TooLong) => {
                return Err(ConfigError::ValidationFailed("pub_root is too long for sensor topics"));
            }
            Err(_) => {
                return Err(ConfigError::ValidationFailed("pub_root is empty or has wildcards"));
            }
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_interval_secs))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.settle_ms))
    }
}

fn env_or<T: FromStr>(value: Option<&'static str>, fallback: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(fallback)
}
