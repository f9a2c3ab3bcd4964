use core::convert::Infallible;

use ch32_hal::timer::{Channel, GeneralInstance16bit, simple_pwm::SimplePwm};
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

/// One channel of a [SimplePwm] seen through embedded-hal, to drive the enable line of an [crate::common::HBridge].
pub struct PwmChannel<'a, T: GeneralInstance16bit> {
    pwm: SimplePwm<'a, T>,
    ch: Channel,
    max: u16,
}

impl<'a, T: GeneralInstance16bit> PwmChannel<'a, T> {
    pub fn new(mut pwm: SimplePwm<'a, T>, ch: Channel) -> Self {
        let max = pwm.get_max_duty().min(u16::MAX as u32) as u16;
        pwm.set_duty(ch, 0);
        pwm.enable(ch);
        Self { pwm, ch, max }
    }
}

impl<'a, T: GeneralInstance16bit> ErrorType for PwmChannel<'a, T> {
    type Error = Infallible;
}

impl<'a, T: GeneralInstance16bit> SetDutyCycle for PwmChannel<'a, T> {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.pwm.set_duty(self.ch, duty.min(self.max) as u32);
        Ok(())
    }
}
