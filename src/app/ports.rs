//! Port traits: the boundary between the edge logic and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ scanner / poll engine / publisher
//! ```
//!
//! The 1-Wire bus itself is a port too, but it lives next to its protocol
//! code as [`OneWireBus`](crate::onewire::OneWireBus).

use core::time::Duration;

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: platform clock → domain)
// ───────────────────────────────────────────────────────────────

/// Monotonic clock plus blocking sleep.
///
/// The poll engine schedules against `now()` only, so a fake clock that
/// advances on `sleep()` makes every cadence test deterministic.
pub trait TimePort {
    /// Time since an arbitrary fixed origin (boot on the device).
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

impl<T: TimePort + ?Sized> TimePort for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

// ───────────────────────────────────────────────────────────────
// Publish sink (driven adapter: domain → MQTT / log)
// ───────────────────────────────────────────────────────────────

/// Where encoded payloads go.  Best effort: nothing is returned, and
/// delivery failures are the adapter's to log.
pub trait PublishSink {
    fn publish(&mut self, topic: &str, payload: &str);
}

// ───────────────────────────────────────────────────────────────
// Actuator port
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Down,
    Up,
}

/// Stepper motor driver (A4988-class).  No driver ships yet; the service
/// carries an empty slot for one.
pub trait Stepper {
    /// Move one microstep.  Returns the new position in microsteps.
    fn step(&mut self, direction: Direction) -> i32;

    /// Finest supported microstep divisor (e.g. 16 for 1/16 steps).
    fn max_microstep(&self) -> u8;

    fn microstep(&self) -> u8;

    /// Select a microstep divisor.  Rejects values the driver cannot do.
    fn set_microstep(&mut self, divisor: u8) -> Result<(), StepperError>;

    /// Enter or leave power-save.  Returns the resulting state.
    fn power_save(&mut self, enable: bool) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`Stepper`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepperError {
    /// Divisor not a power of two up to `max_microstep`.
    UnsupportedMicrostep(u8),
}

impl core::fmt::Display for StepperError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnsupportedMicrostep(d) => write!(f, "unsupported microstep 1/{}", d),
        }
    }
}
