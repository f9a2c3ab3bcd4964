extern crate std;
use core::time::Duration;
use std::{boxed::Box, vec::Vec};

use test_log::test;
use tokio::sync::{mpsc::unbounded_channel, watch};

use super::{
    AsyncSerial,
    commander::*,
    frame::{ACK_BYTE, RawFrame},
};
use crate::{
    Direction,
    channel::FrameChannel,
    control::{ControlConfig, ControlTask, PassOutcome},
    receiver::ByteReceiver,
    std::AckSender,
    test_harness::{Recorder, Testable},
};

const PERIOD: Duration = Duration::from_millis(10);
const ACK_TIMEOUT: Duration = Duration::from_millis(50);

/// Emulated controller: every byte read is handed to a [ByteReceiver], the queued acks are written back.
fn spawn_device(mut device: Testable) -> (&'static FrameChannel, Recorder) {
    let channel: &'static FrameChannel = Box::leak(Box::new(FrameChannel::new()));
    let leds = Recorder::default();
    let (tx, mut acks) = unbounded_channel();
    let mut receiver = ByteReceiver::new(channel, AckSender(tx), leds.clone());
    tokio::spawn(async move {
        loop {
            let byte = device.read().await;
            receiver.on_byte(byte);
            while let Ok(ack) = acks.try_recv() {
                device.write(ack).await;
            }
        }
    });
    (channel, leds)
}

fn init_test(error_rate: f64, omission_rate: f64) -> (Commander<Testable>, Testable) {
    let (host, device) = Testable::new(error_rate, omission_rate);
    (Commander::new(host, PERIOD, ACK_TIMEOUT), device)
}

#[test]
fn speed_steps() {
    let levels: Vec<u8> = (0..SPEED_STEPS.len())
        .map(|i| MotorCommand::from_step(Direction::Forward, i).unwrap().speed_level)
        .collect();
    assert_eq!(levels, SPEED_STEPS);
    assert_eq!(MotorCommand::from_step(Direction::Forward, SPEED_STEPS.len()), None);
    assert_eq!(MotorCommand::new(Direction::Backward, 40).speed_level, 15);
    assert_eq!(
        MotorCommand::new(Direction::Forward, 6).frame(3),
        RawFrame(0b011_1_0110)
    );
}

#[test(tokio::test)]
async fn transaction_ids_roll_over() {
    let (mut commander, device) = init_test(0.0, 0.0);
    let (channel, _) = spawn_device(device);

    let mut ids = Vec::new();
    for _ in 0..10 {
        let frame = commander
            .transmit(MotorCommand::new(Direction::Forward, 9))
            .await
            .unwrap();
        ids.push(frame.decode().transaction_id);
        // the byte is published before the ack goes out
        assert_eq!(channel.take_if_available(), Some(frame));
    }
    assert_eq!(ids, [0, 1, 2, 3, 4, 5, 6, 7, 0, 1]);
    assert_eq!(commander.next_id(), 2);
    assert_eq!(commander.acknowledged(), 10);
}

#[test(tokio::test)]
async fn missing_ack_times_out() {
    let (mut commander, device) = init_test(0.0, 1.0);
    let (channel, _) = spawn_device(device);

    let res = commander.transmit(MotorCommand::default()).await;
    assert_eq!(res, Err(CommanderError::AckTimeout { id: 0 }));
    // the frame never reached the device
    assert!(!channel.is_available());
    // the id is spent anyway
    assert_eq!(commander.next_id(), 1);
}

#[test(tokio::test)]
async fn noise_before_ack_is_skipped() {
    let (mut commander, mut device) = init_test(0.0, 0.0);
    tokio::spawn(async move {
        let _ = device.read().await;
        device.write(0x12).await;
        device.write(0x00).await;
        device.write(ACK_BYTE).await;
    });

    let frame = commander
        .transmit(MotorCommand::new(Direction::Backward, 3))
        .await
        .unwrap();
    assert_eq!(frame, RawFrame(0b000_0_0011));
}

#[test(tokio::test)]
async fn run_stops_when_source_closes() {
    let (mut commander, device) = init_test(0.0, 0.0);
    spawn_device(device);
    let (tx, rx) = watch::channel(MotorCommand::default());
    drop(tx);

    assert_eq!(commander.run(rx).await, CommanderError::Stopped);
    assert_eq!(commander.acknowledged(), 0);
}

#[test(tokio::test)]
async fn run_fails_on_lost_link() {
    let (mut commander, device) = init_test(0.0, 1.0);
    spawn_device(device);
    let (_tx, rx) = watch::channel(MotorCommand::default());

    let res = tokio::time::timeout(Duration::from_secs(1), commander.run(rx)).await;
    assert_eq!(res, Ok(CommanderError::AckTimeout { id: 0 }));
}

#[test(tokio::test)]
async fn run_resends_latest_command() {
    let (mut commander, device) = init_test(0.0, 0.0);
    let (channel, leds) = spawn_device(device);
    let (tx, rx) = watch::channel(MotorCommand::new(Direction::Forward, 3));

    let handle = tokio::spawn(async move {
        let reason = commander.run(rx).await;
        (reason, commander)
    });

    tokio::time::sleep(PERIOD * 5).await;
    tx.send(MotorCommand::new(Direction::Backward, 12)).unwrap();
    tokio::time::sleep(PERIOD * 5).await;
    drop(tx);

    let (reason, commander) = handle.await.unwrap();
    assert_eq!(reason, CommanderError::Stopped);
    assert!(commander.acknowledged() >= 6, "only {} frames", commander.acknowledged());

    let last = channel.take_if_available().unwrap().decode();
    assert_eq!(last.direction, Direction::Backward);
    assert_eq!(last.speed_level, 12);
    assert!(channel.stats().published >= 6);
    assert_eq!(
        leds.indicator(crate::IndicatorKind::ReceptionSuccessful),
        Some(true)
    );
}

#[test(tokio::test)]
async fn sweep_reaches_the_motor() {
    let (mut commander, device) = init_test(0.0, 0.0);
    let (channel, _) = spawn_device(device);
    let recorder = Recorder::default();
    let mut control = ControlTask::new(
        channel,
        recorder.clone(),
        recorder.clone(),
        ControlConfig::default(),
    );

    let mut outcomes = Vec::new();
    for direction in [Direction::Forward, Direction::Backward] {
        for step in 0..SPEED_STEPS.len() {
            let command = MotorCommand::from_step(direction, step).unwrap();
            commander.transmit(command).await.unwrap();
            outcomes.push(control.step());
        }
    }

    assert!(matches!(outcomes[0], PassOutcome::First(_)));
    for (i, outcome) in outcomes.iter().enumerate().skip(1) {
        match outcome {
            PassOutcome::Accepted { frame, reversed } => {
                assert_eq!(frame.speed_level, SPEED_STEPS[i % SPEED_STEPS.len()]);
                assert_eq!(*reversed, i == SPEED_STEPS.len());
            }
            other => panic!("pass {i} gave {other:?}"),
        }
    }
    assert_eq!(control.step(), PassOutcome::Silent);
}
