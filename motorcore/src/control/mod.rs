/*!
Control task: the scheduled callback that turns frames into motor commands.

One pass per scheduler period:
1. drain the [FrameChannel]; an empty channel means a silent window, the timeout led goes on and nothing else happens;
2. the first frame after a timeout clears the timeout led;
3. the very first frame since startup is accepted as is and sets the direction;
4. later frames are checked against the last accepted one: a repeated transaction id raises the invalid id led
   and is not remembered, a new id is remembered;
5. a direction different from the last accepted one brakes the motor before reversing it;
6. the speed is applied and the transaction led goes on.

Steps 5 and 6 run for repeated ids too, the id only decides what is remembered.
*/

use defmt_or_log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    IndicatorKind, MotorActuator, StatusIndicator,
    channel::FrameChannel,
    protocol::frame::{DecodedFrame, MAX_SPEED_LEVEL},
    scheduler::Task,
};


/// How a 4 bit speed level becomes the percent given to [MotorActuator::set_speed].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedMapping {
    /// level handed over unchanged, the actuator clamps
    #[default]
    Passthrough,
    /// level spread over 0..=100 percent
    Scaled,
}

impl SpeedMapping {
    pub fn apply(self, level: u8) -> u8 {
        let level = level.min(MAX_SPEED_LEVEL);
        match self {
            SpeedMapping::Passthrough => level,
            SpeedMapping::Scaled => {
                ((level as u16 * 100 + MAX_SPEED_LEVEL as u16 / 2) / MAX_SPEED_LEVEL as u16) as u8
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ControlConfig {
    pub speed_mapping: SpeedMapping,
}

/// Last accepted frame, empty until the first frame after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHistory(Option<DecodedFrame>);

impl FrameHistory {
    pub fn last(&self) -> Option<DecodedFrame> {
        self.0
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
    fn accept(&mut self, frame: DecodedFrame) {
        self.0 = Some(frame);
    }
}

/// What the control task saw in the current and in the previous periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceptionWindow {
    /// a frame was drained in the last pass
    pub frame_arrived: bool,
    /// a silent pass happened and no frame has arrived since
    pub timed_out: bool,
    /// consecutive silent passes
    pub silent_windows: u32,
}

/// Result of one pass, mostly useful for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PassOutcome {
    /// channel was empty
    Silent,
    /// first frame since startup
    First(DecodedFrame),
    /// new transaction id, frame remembered
    Accepted { frame: DecodedFrame, reversed: bool },
    /// same transaction id as the last accepted frame, applied but not remembered
    Duplicate { frame: DecodedFrame, reversed: bool },
}

pub struct ControlTask<'a, M: MotorActuator, S: StatusIndicator> {
    channel: &'a FrameChannel,
    motor: M,
    status: S,
    config: ControlConfig,
    history: FrameHistory,
    window: ReceptionWindow,
}

impl<'a, M: MotorActuator, S: StatusIndicator> ControlTask<'a, M, S> {
    pub fn new(channel: &'a FrameChannel, motor: M, status: S, config: ControlConfig) -> Self {
        Self {
            channel,
            motor,
            status,
            config,
            history: FrameHistory::default(),
            window: ReceptionWindow::default(),
        }
    }

    /// bring the motor to a stopped, known state. Call once before scheduling.
    pub fn init(&mut self) {
        self.motor.init();
    }

    /// One pass of the state machine.
    pub fn step(&mut self) -> PassOutcome {
        let Some(raw) = self.channel.take_if_available() else {
            if !self.window.timed_out {
                warn!("control: no frame during the last period, timeout");
            }
            self.window.frame_arrived = false;
            self.window.timed_out = true;
            self.window.silent_windows = self.window.silent_windows.saturating_add(1);
            self.status.set(IndicatorKind::Timeout, true);
            return PassOutcome::Silent;
        };

        self.window.frame_arrived = true;
        self.window.silent_windows = 0;
        if self.window.timed_out {
            info!("control: frames are back, timeout cleared");
            self.window.timed_out = false;
            self.status.set(IndicatorKind::Timeout, false);
        }

        let frame = raw.decode();
        debug!("control: received {:?}", frame);

        let outcome = match self.history.last() {
            None => {
                self.motor.set_direction(frame.direction);
                self.history.accept(frame);
                PassOutcome::First(frame)
            }
            Some(previous) => {
                let duplicate = previous.transaction_id == frame.transaction_id;
                if duplicate {
                    warn!("control: transaction id {} repeated", frame.transaction_id);
                    self.status.set(IndicatorKind::InvalidId, true);
                } else {
                    self.status.set(IndicatorKind::InvalidId, false);
                    self.history.accept(frame);
                }

                let reversed = previous.direction != frame.direction;
                if reversed {
                    info!("control: reversing to {:?}, braking first", frame.direction);
                    self.motor.brake();
                    self.motor.set_direction(frame.direction);
                    self.status.set(IndicatorKind::SpeedReverse, true);
                } else {
                    self.status.set(IndicatorKind::SpeedReverse, false);
                }

                if duplicate {
                    PassOutcome::Duplicate { frame, reversed }
                } else {
                    PassOutcome::Accepted { frame, reversed }
                }
            }
        };

        self.motor.set_speed(self.config.speed_mapping.apply(frame.speed_level));
        self.status.set(IndicatorKind::SuccessfulTransaction, true);
        outcome
    }

    pub fn history(&self) -> FrameHistory {
        self.history
    }

    pub fn window(&self) -> ReceptionWindow {
        self.window
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    pub fn status(&self) -> &S {
        &self.status
    }
}

impl<'a, M: MotorActuator, S: StatusIndicator> Task for ControlTask<'a, M, S> {
    fn run(&mut self) {
        self.step();
    }
}
