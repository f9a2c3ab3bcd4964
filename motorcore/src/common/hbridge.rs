use defmt_or_log::{trace, warn};
use embedded_hal::{
    digital::{Error as _, OutputPin},
    pwm::{Error as _, SetDutyCycle},
};

use crate::{Direction, MotorActuator};

/// Brushed motor behind an L298N style bridge: two direction inputs and a pwm on the enable line.
///
/// Pin and pwm errors are logged and dropped, the controller has no way to act on them.
pub struct HBridge<A: OutputPin, B: OutputPin, P: SetDutyCycle> {
    in1: A,
    in2: B,
    enable: P,
}

impl<A: OutputPin, B: OutputPin, P: SetDutyCycle> HBridge<A, B, P> {
    pub fn new(in1: A, in2: B, enable: P) -> Self {
        Self { in1, in2, enable }
    }

    fn drive(&mut self, in1: bool, in2: bool) {
        if let Err(e) = self.in1.set_state(in1.into()) {
            warn!("hbridge: in1 error {:?}", e.kind());
        }
        if let Err(e) = self.in2.set_state(in2.into()) {
            warn!("hbridge: in2 error {:?}", e.kind());
        }
    }

    fn duty(&mut self, percent: u8) {
        if let Err(e) = self.enable.set_duty_cycle_percent(percent.min(100)) {
            warn!("hbridge: pwm error {:?}", e.kind());
        }
    }
}

impl<A: OutputPin, B: OutputPin, P: SetDutyCycle> MotorActuator for HBridge<A, B, P> {
    fn init(&mut self) {
        self.duty(0);
        self.drive(false, false);
    }

    fn set_direction(&mut self, direction: Direction) {
        trace!("hbridge: direction {:?}", direction);
        match direction {
            Direction::Forward => self.drive(true, false),
            Direction::Backward => self.drive(false, true),
        }
    }

    fn set_speed(&mut self, percent: u8) {
        trace!("hbridge: speed {}%", percent);
        self.duty(percent);
    }

    fn brake(&mut self) {
        self.drive(true, true);
        self.duty(0);
    }
}

#[cfg(all(test, feature = "std"))]
pub(crate) mod test {
    extern crate std;
    use core::convert::Infallible;
    use std::rc::Rc;

    use core::cell::Cell;
    use embedded_hal::{digital::ErrorType as PinErrorType, pwm::ErrorType as PwmErrorType};
    use test_log::test;

    use super::*;

    /// output pin whose level can be inspected after it is moved into a driver
    #[derive(Clone, Default)]
    pub struct FakePin(pub Rc<Cell<bool>>);

    impl PinErrorType for FakePin {
        type Error = Infallible;
    }
    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0.set(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0.set(true);
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub struct FakePwm(pub Rc<Cell<u16>>);

    impl PwmErrorType for FakePwm {
        type Error = Infallible;
    }
    impl SetDutyCycle for FakePwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }
        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.0.set(duty);
            Ok(())
        }
    }

    fn bridge() -> (HBridge<FakePin, FakePin, FakePwm>, FakePin, FakePin, FakePwm) {
        let (in1, in2, pwm) = (FakePin::default(), FakePin::default(), FakePwm::default());
        (HBridge::new(in1.clone(), in2.clone(), pwm.clone()), in1, in2, pwm)
    }

    #[test]
    fn direction_sets_inputs() {
        let (mut motor, in1, in2, _) = bridge();
        motor.set_direction(Direction::Forward);
        assert!(in1.0.get() && !in2.0.get());
        motor.set_direction(Direction::Backward);
        assert!(!in1.0.get() && in2.0.get());
    }

    #[test]
    fn speed_is_clamped() {
        let (mut motor, _, _, pwm) = bridge();
        motor.set_speed(50);
        assert_eq!(pwm.0.get(), 500);
        motor.set_speed(250);
        assert_eq!(pwm.0.get(), 1000);
    }

    #[test]
    fn brake_shorts_the_motor() {
        let (mut motor, in1, in2, pwm) = bridge();
        motor.set_direction(Direction::Forward);
        motor.set_speed(80);
        motor.brake();
        assert!(in1.0.get() && in2.0.get());
        assert_eq!(pwm.0.get(), 0);

        motor.set_direction(Direction::Backward);
        assert!(!in1.0.get() && in2.0.get());
    }

    #[test]
    fn init_stops_everything() {
        let (mut motor, in1, in2, pwm) = bridge();
        in1.0.set(true);
        pwm.0.set(700);
        motor.init();
        assert!(!in1.0.get() && !in2.0.get());
        assert_eq!(pwm.0.get(), 0);
    }
}
