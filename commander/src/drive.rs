use std::time::Duration;

use log::{info, warn};
use motorcore::{
    Direction,
    protocol::{
        AsyncSerial,
        commander::{Commander, CommanderError, MotorCommand, SPEED_STEPS},
    },
};
use tokio::{sync::watch, time::interval};

use crate::config::LinkConfig;

/// What the host keeps sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// the same command every period
    Hold(MotorCommand),
    /// walk through [SPEED_STEPS], one step per period, starting over at the end
    Sweep(Direction),
}

impl Program {
    fn first(&self) -> MotorCommand {
        match *self {
            Program::Hold(command) => command,
            Program::Sweep(direction) => MotorCommand::new(direction, SPEED_STEPS[0]),
        }
    }
}

async fn sweep(commands: watch::Sender<MotorCommand>, direction: Direction, period: Duration) {
    let mut ticker = interval(period);
    for step in (0..SPEED_STEPS.len()).cycle() {
        ticker.tick().await;
        let Some(command) = MotorCommand::from_step(direction, step) else {
            continue;
        };
        if commands.send(command).is_err() {
            return;
        }
    }
}

/// Run `program` over `serial` until the controller stops acknowledging.
pub async fn drive<S: AsyncSerial>(serial: S, config: &LinkConfig, program: Program) -> CommanderError {
    let mut commander = Commander::new(serial, config.period(), config.ack_timeout());
    let (tx, rx) = watch::channel(program.first());
    info!("Driving with {program:?}");

    let reason = match program {
        Program::Hold(_) => commander.run(rx).await,
        Program::Sweep(direction) => {
            tokio::select! {
                reason = commander.run(rx) => reason,
                _ = sweep(tx.clone(), direction, config.period()) => CommanderError::Stopped,
            }
        }
    };
    drop(tx);
    warn!("Stopped after {} acknowledged frames: {reason}", commander.acknowledged());
    reason
}
