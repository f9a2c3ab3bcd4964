use log::{error, info};
use motorcore::{
    channel::FrameChannel,
    control::ControlTask,
    receiver::ByteReceiver,
    scheduler::{ScheduleEntry, Scheduler},
    std::{AckSender, LoggingMotor, SharedIndicator},
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc::unbounded_channel,
};

use crate::config::LinkConfig;

/// Behave like the controller on `port`: acknowledge every byte and run the control task on its schedule.
///
/// `leds` is the single bank lit by both the receive handler and the control task.
/// Returns when either direction of the port fails.
pub async fn emulate<P>(port: P, config: &LinkConfig, leds: SharedIndicator) -> Result<(), String>
where
    P: AsyncRead + AsyncWrite + Send + 'static,
{
    // shared between the receive task and the scheduler for the rest of the process
    let channel: &'static FrameChannel = Box::leak(Box::new(FrameChannel::new()));
    let (mut port_rx, mut port_tx) = tokio::io::split(port);
    let (ack_tx, mut ack_rx) = unbounded_channel::<u8>();

    let mut receiver = ByteReceiver::new(channel, AckSender(ack_tx), leds.clone());
    let mut reader = tokio::spawn(async move {
        loop {
            match port_rx.read_u8().await {
                Ok(byte) => receiver.on_byte(byte),
                Err(e) => return format!("read failed: {e}"),
            }
        }
    });
    let mut writer = tokio::spawn(async move {
        while let Some(ack) = ack_rx.recv().await {
            if let Err(e) = port_tx.write_all(&[ack]).await {
                return format!("write failed: {e}");
            }
            let _ = port_tx.flush().await;
        }
        "ack queue closed".to_string()
    });

    let mut control = ControlTask::new(
        channel,
        LoggingMotor::default(),
        leds,
        config.control,
    );
    control.init();
    let mut scheduler = Scheduler::new([ScheduleEntry::new(config.control_period_ticks, 0, &mut control)])
        .map_err(|e| format!("invalid schedule: {e:?}"))?;
    info!(
        "Emulating a controller, control task every {} ticks of {} ms",
        config.control_period_ticks, config.tick_ms
    );

    let reason = tokio::select! {
        never = scheduler.run(config.tick()) => match never {},
        r = &mut reader => r.unwrap_or_else(|e| format!("receive task died: {e}")),
        r = &mut writer => r.unwrap_or_else(|e| format!("transmit task died: {e}")),
    };
    reader.abort();
    writer.abort();
    let stats = channel.stats();
    error!(
        "Emulator stopped ({reason}), {} bytes received, {} overwritten",
        stats.published, stats.overwritten
    );
    Err(reason)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use motorcore::{
        Direction, IndicatorKind,
        protocol::commander::{Commander, MotorCommand, SPEED_STEPS},
    };
    use test_log::test;

    use super::*;
    use crate::util::serial::simulated_pair;

    #[test(tokio::test)]
    async fn commander_drives_emulated_controller() {
        let (host, device) = simulated_pair().unwrap();
        let config = LinkConfig {
            control_period_ticks: 10,
            ..Default::default()
        };
        let mut commander = Commander::new(host, Duration::from_millis(10), Duration::from_millis(500));
        let leds = SharedIndicator::default();

        let session = async {
            for direction in [Direction::Forward, Direction::Backward] {
                for step in 0..SPEED_STEPS.len() {
                    let command = MotorCommand::from_step(direction, step).unwrap();
                    commander.transmit(command).await.unwrap();
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
            // let the control task drain the last frame
            tokio::time::sleep(Duration::from_millis(50)).await;
            commander.acknowledged()
        };

        tokio::select! {
            acknowledged = session => assert_eq!(acknowledged, 12),
            res = emulate(device, &config, leds.clone()) => panic!("emulator stopped: {res:?}"),
        }
        // receive handler and control task light the same bank
        assert!(leds.get(IndicatorKind::ReceptionSuccessful));
        assert!(leds.get(IndicatorKind::SuccessfulTransaction));
    }
}
