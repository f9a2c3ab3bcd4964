use serde::{Deserialize, Serialize};

/// Rotation direction of the brushed motor.
///
/// On the wire `1` is forward and `0` is backward.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    pub fn from_flag(flag: bool) -> Self {
        if flag { Direction::Forward } else { Direction::Backward }
    }
    pub fn flag(self) -> bool {
        matches!(self, Direction::Forward)
    }
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Status leds driven by the controller. The discriminant is the position in a [crate::common::LedBank].
#[repr(u8)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorKind {
    /// last frame repeated the transaction id of the accepted one
    InvalidId = 0,
    /// last frame inverted the direction, the motor was braked first
    SpeedReverse = 1,
    /// at least one control period went by without a frame
    Timeout = 2,
    /// a byte was received and acknowledged
    ReceptionSuccessful = 3,
    /// last frame was fully applied to the motor
    SuccessfulTransaction = 4,
}

impl IndicatorKind {
    pub const COUNT: usize = 5;
    pub const ALL: [IndicatorKind; Self::COUNT] = [
        IndicatorKind::InvalidId,
        IndicatorKind::SpeedReverse,
        IndicatorKind::Timeout,
        IndicatorKind::ReceptionSuccessful,
        IndicatorKind::SuccessfulTransaction,
    ];
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Brushed DC motor driven through an h-bridge.
///
/// Implementations clamp out of range values and swallow hardware errors, nothing is reported back.
pub trait MotorActuator {
    /// put the outputs in a known state, motor stopped
    fn init(&mut self);
    fn set_direction(&mut self, direction: Direction);
    /// speed in percent, values above 100 are clamped
    fn set_speed(&mut self, percent: u8);
    /// both bridge outputs asserted and speed forced to 0
    fn brake(&mut self);
}

/// Purely observational outputs, never read back by the controller.
pub trait StatusIndicator {
    fn set(&mut self, kind: IndicatorKind, on: bool);
}

/// Transmit side of the serial line. It's considered infallible.
pub trait SerialTransport {
    /// sends a single byte, blocking until the transmit buffer accepts it
    fn send_byte(&mut self, byte: u8);
}

/// Serial line that can also be polled for the byte that raised the receive interrupt.
pub trait BlockingReceive: SerialTransport {
    /// blocks until a byte is available
    fn receive_byte(&mut self) -> u8;
}
