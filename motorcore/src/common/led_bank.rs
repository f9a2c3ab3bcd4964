use defmt_or_log::warn;
use embedded_hal::digital::{Error as _, OutputPin, PinState};

use crate::{IndicatorKind, StatusIndicator};

/// Electrical polarity of a led.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Connection {
    /// lit when the pin is high
    ActiveHigh,
    /// lit when the pin is low, the pin sinks the current
    ActiveLow,
}

pub struct Led<P: OutputPin> {
    pin: P,
    connection: Connection,
}

impl<P: OutputPin> Led<P> {
    pub fn new(pin: P, connection: Connection) -> Self {
        Self { pin, connection }
    }

    pub fn set(&mut self, on: bool) {
        let state = match self.connection {
            Connection::ActiveHigh => PinState::from(on),
            Connection::ActiveLow => PinState::from(!on),
        };
        if let Err(e) = self.pin.set_state(state) {
            warn!("led: pin error {:?}", e.kind());
        }
    }
}

/// One led per [IndicatorKind], in declaration order.
pub struct LedBank<P: OutputPin> {
    leds: [Led<P>; IndicatorKind::COUNT],
}

impl<P: OutputPin> LedBank<P> {
    /// every led starts switched off
    pub fn new(leds: [Led<P>; IndicatorKind::COUNT]) -> Self {
        let mut bank = Self { leds };
        for led in bank.leds.iter_mut() {
            led.set(false);
        }
        bank
    }
}

impl<P: OutputPin> StatusIndicator for LedBank<P> {
    fn set(&mut self, kind: IndicatorKind, on: bool) {
        self.leds[kind.index()].set(on);
    }
}

#[cfg(all(test, feature = "std"))]
mod test {
    use test_log::test;

    use super::*;
    use crate::common::hbridge::test::FakePin;

    #[test]
    fn leds_follow_polarity() {
        let pins: [FakePin; IndicatorKind::COUNT] = Default::default();
        let leds = core::array::from_fn(|i| {
            let connection = if i % 2 == 0 { Connection::ActiveHigh } else { Connection::ActiveLow };
            Led::new(pins[i].clone(), connection)
        });
        let mut bank = LedBank::new(leds);

        // all off after construction
        for (i, pin) in pins.iter().enumerate() {
            assert_eq!(pin.0.get(), i % 2 == 1);
        }

        bank.set(IndicatorKind::Timeout, true);
        assert!(pins[IndicatorKind::Timeout.index()].0.get());
        bank.set(IndicatorKind::SpeedReverse, true);
        assert!(!pins[IndicatorKind::SpeedReverse.index()].0.get());
        bank.set(IndicatorKind::SpeedReverse, false);
        assert!(pins[IndicatorKind::SpeedReverse.index()].0.get());
    }
}
