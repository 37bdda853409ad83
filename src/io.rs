//! External collaborator interfaces.
//!
//! The planner talks to the rest of the firmware through [`MachineIo`]:
//! waking the stepper engine, syncing its position counters, switching motor
//! power, writing fan PWM, and keeping heaters, inactivity timers, and the
//! display alive while the queue is full. [`EnablePin`] adapts an
//! embedded-hal output pin to the motor-enable outputs.

use embedded_hal::digital::OutputPin;

use crate::block::{Axis, NUM_AXIS};
use crate::queue::StepperHandle;

/// Callbacks from the planner into the surrounding firmware.
///
/// All methods default to no-ops so host-side embeddings only implement the
/// pieces they care about.
pub trait MachineIo {
    /// A new block was published; the stepper engine should start (or keep)
    /// consuming.
    fn wake_stepper(&mut self) {}

    /// The planner position was forced; the stepper's own step counters must
    /// follow.
    fn sync_stepper_position(&mut self, steps: [i32; NUM_AXIS]) {
        let _ = steps;
    }

    /// As [`MachineIo::sync_stepper_position`], E axis only.
    fn sync_stepper_e_position(&mut self, steps: i32) {
        let _ = steps;
    }

    /// Power up an axis motor before it is asked to move.
    fn axis_enable(&mut self, axis: Axis) {
        let _ = axis;
    }

    /// Cut power to an axis motor that is idle across the whole queue.
    fn axis_disable(&mut self, axis: Axis) {
        let _ = axis;
    }

    /// Write a fan PWM value for an extruder.
    fn write_fan(&mut self, extruder: u8, pwm: u8) {
        let _ = (extruder, pwm);
    }

    /// Called repeatedly while the queue is full and the planner is waiting
    /// for the stepper to drain a slot. Heater management, inactivity
    /// timeouts, and the display tick from here; `stepper` is the consumer
    /// side of the queue so hosted embeddings can drain it in-line.
    fn on_buffer_full(&mut self, stepper: StepperHandle<'_>) {
        let _ = stepper;
    }
}

/// Active-low (or active-high) motor-enable output over an embedded-hal pin.
///
/// Stepper driver EN inputs are conventionally active low; construct with
/// `active_low = true` for those.
pub struct EnablePin<P: OutputPin> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> EnablePin<P> {
    /// Wrap a pin with the given polarity.
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    /// Drive the pin to its enabled level.
    pub fn enable(&mut self) -> Result<(), P::Error> {
        if self.active_low {
            self.pin.set_low()
        } else {
            self.pin.set_high()
        }
    }

    /// Drive the pin to its disabled level.
    pub fn disable(&mut self) -> Result<(), P::Error> {
        if self.active_low {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }

    /// Release the wrapped pin.
    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct MockPin {
        state: bool,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.state = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.state = false;
            Ok(())
        }
    }

    #[test]
    fn test_active_low_enable() {
        let mut enable = EnablePin::new(MockPin { state: true }, true);

        enable.enable().unwrap();
        assert!(!enable.pin.state);

        enable.disable().unwrap();
        assert!(enable.pin.state);
    }

    #[test]
    fn test_active_high_enable() {
        let mut enable = EnablePin::new(MockPin { state: false }, false);

        enable.enable().unwrap();
        assert!(enable.pin.state);

        let pin = enable.release();
        assert!(pin.state);
    }
}
