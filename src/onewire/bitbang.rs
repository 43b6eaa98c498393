//! Bit-banged 1-Wire master on a single open-drain GPIO.
//!
//! Standard-speed slot timings (µs), per the Maxim application note 126:
//!
//! | Slot     | Drive low | Then           |
//! |----------|-----------|----------------|
//! | reset    | 480       | sample at +70, wait 410 |
//! | write 1  | 6         | release 64     |
//! | write 0  | 60        | release 10     |
//! | read     | 6         | sample at +9, wait 55 |
//!
//! Each slot runs inside a critical section so an interrupt cannot stretch
//! the low pulse past what the devices tolerate.  The pin must be
//! configured open-drain with an external 4.7 kΩ pull-up; `set_high`
//! releases the line.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use super::OneWireBus;
use crate::error::BusError;

const RESET_LOW_US: u32 = 480;
const PRESENCE_SAMPLE_US: u32 = 70;
const RESET_RECOVERY_US: u32 = 410;
const WRITE_1_LOW_US: u32 = 6;
const WRITE_1_RELEASE_US: u32 = 64;
const WRITE_0_LOW_US: u32 = 60;
const WRITE_0_RELEASE_US: u32 = 10;
const READ_LOW_US: u32 = 6;
const READ_SAMPLE_US: u32 = 9;
const READ_RECOVERY_US: u32 = 55;

/// 1-Wire master driving an open-drain pin through `embedded-hal` traits.
pub struct PinBus<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> PinBus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    fn release(&mut self) -> Result<(), BusError> {
        self.pin.set_high().map_err(|_| BusError::PinFault)
    }

    fn drive_low(&mut self) -> Result<(), BusError> {
        self.pin.set_low().map_err(|_| BusError::PinFault)
    }

    fn sample(&mut self) -> Result<bool, BusError> {
        self.pin.is_high().map_err(|_| BusError::PinFault)
    }
}

impl<P, D> OneWireBus for PinBus<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn init(&mut self) -> Result<(), BusError> {
        self.release()?;
        self.delay.delay_us(RESET_RECOVERY_US);
        if !self.sample()? {
            return Err(BusError::LineStuckLow);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<bool, BusError> {
        let presence = critical_section::with(|_| -> Result<bool, BusError> {
            self.drive_low()?;
            self.delay.delay_us(RESET_LOW_US);
            self.release()?;
            self.delay.delay_us(PRESENCE_SAMPLE_US);
            // Devices pull the line low to announce themselves.
            Ok(!self.sample()?)
        })?;
        self.delay.delay_us(RESET_RECOVERY_US);
        if !self.sample()? {
            return Err(BusError::LineStuckLow);
        }
        Ok(presence)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), BusError> {
        let (low, recovery) = if bit {
            (WRITE_1_LOW_US, WRITE_1_RELEASE_US)
        } else {
            (WRITE_0_LOW_US, WRITE_0_RELEASE_US)
        };
        critical_section::with(|_| -> Result<(), BusError> {
            self.drive_low()?;
            self.delay.delay_us(low);
            self.release()
        })?;
        self.delay.delay_us(recovery);
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, BusError> {
        let bit = critical_section::with(|_| -> Result<bool, BusError> {
            self.drive_low()?;
            self.delay.delay_us(READ_LOW_US);
            self.release()?;
            self.delay.delay_us(READ_SAMPLE_US);
            self.sample()
        })?;
        self.delay.delay_us(READ_RECOVERY_US);
        Ok(bit)
    }
}
