//! Host side of the link.
//!
//! Every period the latest [MotorCommand] is stamped with a rolling transaction id, written as a single byte
//! and the controller is given `ack_timeout` to answer with [ACK_BYTE]. A missing acknowledgment ends the session.
extern crate std;

use core::{fmt, time::Duration};

use defmt_or_log::{debug, error, info, trace};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval, timeout},
};

use super::{
    AsyncSerial,
    frame::{ACK_BYTE, DecodedFrame, MAX_SPEED_LEVEL, MAX_TRANSACTION_ID, RawFrame},
};
use crate::Direction;

/// speed levels offered by the operator interface, from stopped to full speed
pub const SPEED_STEPS: [u8; 6] = [0, 3, 6, 9, 12, 15];

/// What the operator wants the motor to do, without the transaction id.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCommand {
    pub direction: Direction,
    pub speed_level: u8,
}

impl MotorCommand {
    /// speed levels above 15 are clamped
    pub fn new(direction: Direction, speed_level: u8) -> Self {
        Self {
            direction,
            speed_level: speed_level.min(MAX_SPEED_LEVEL),
        }
    }

    /// command for the `step`-th entry of [SPEED_STEPS]
    pub fn from_step(direction: Direction, step: usize) -> Option<Self> {
        SPEED_STEPS.get(step).map(|&level| Self::new(direction, level))
    }

    pub fn frame(&self, transaction_id: u8) -> RawFrame {
        DecodedFrame::new(transaction_id, self.direction, self.speed_level).encode()
    }
}

impl Default for MotorCommand {
    fn default() -> Self {
        Self::new(Direction::Forward, 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommanderError {
    /// the frame carrying this transaction id was never acknowledged
    AckTimeout { id: u8 },
    /// the command source went away
    Stopped,
}

impl fmt::Display for CommanderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommanderError::AckTimeout { id } => {
                write!(f, "no acknowledgment for transaction {id}, communication failed")
            }
            CommanderError::Stopped => write!(f, "command source closed"),
        }
    }
}

impl std::error::Error for CommanderError {}

pub struct Commander<S: AsyncSerial> {
    serial: S,
    /// id stamped on the next frame
    next_id: u8,
    period: Duration,
    ack_timeout: Duration,
    acknowledged: u32,
}

impl<S: AsyncSerial> Commander<S> {
    pub fn new(serial: S, period: Duration, ack_timeout: Duration) -> Self {
        Self {
            serial,
            next_id: 0,
            period,
            ack_timeout,
            acknowledged: 0,
        }
    }

    /// Send one frame and wait for its acknowledgment.
    ///
    /// The id is consumed even when the acknowledgment never comes. Bytes other than [ACK_BYTE] are skipped.
    pub async fn transmit(&mut self, command: MotorCommand) -> Result<RawFrame, CommanderError> {
        let id = self.next_id;
        self.next_id = (self.next_id + 1) & MAX_TRANSACTION_ID;
        let frame = command.frame(id);

        trace!("commander: sending {:#x} ({:?})", frame.0, command);
        self.serial.write(frame.0).await;

        let serial = &mut self.serial;
        let wait_ack = async {
            loop {
                let byte = serial.read().await;
                if byte == ACK_BYTE {
                    return;
                }
                debug!("commander: ignoring {:#x} while waiting for ack", byte);
            }
        };
        match timeout(self.ack_timeout, wait_ack).await {
            Ok(()) => {
                self.acknowledged = self.acknowledged.wrapping_add(1);
                Ok(frame)
            }
            Err(_) => {
                error!("commander: transaction {} not acknowledged", id);
                Err(CommanderError::AckTimeout { id })
            }
        }
    }

    /// Transmit the latest command every period until the link fails or `commands` is closed.
    ///
    /// The same command is resent on every period, each time with a fresh id.
    pub async fn run(&mut self, mut commands: watch::Receiver<MotorCommand>) -> CommanderError {
        info!("commander: transmitting every {:?}", self.period);
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if commands.has_changed().is_err() {
                info!("commander: command source closed after {} frames", self.acknowledged);
                return CommanderError::Stopped;
            }
            let command = *commands.borrow_and_update();
            if let Err(e) = self.transmit(command).await {
                return e;
            }
        }
    }

    /// id that the next frame will carry
    pub fn next_id(&self) -> u8 {
        self.next_id
    }

    /// frames acknowledged so far
    pub fn acknowledged(&self) -> u32 {
        self.acknowledged
    }
}
