/*!
Std only helpers to exercise the controller without hardware.
*/
extern crate std;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tokio::sync::mpsc::{self, Receiver, Sender};

use crate::{
    BlockingReceive, Direction, IndicatorKind, MotorActuator, SerialTransport, StatusIndicator,
    protocol::AsyncSerial,
};

/// A call made by the controller on one of its collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Init,
    SetDirection(Direction),
    SetSpeed(u8),
    Brake,
    Indicator(IndicatorKind, bool),
    Transmit(u8),
}

#[derive(Default)]
struct RecorderState {
    events: Vec<Event>,
    inbound: VecDeque<u8>,
}

/// Records every collaborator call in order. Clones share the same log,
/// so one recorder can stand in for the motor, the leds and the serial line at once.
#[derive(Clone, Default)]
pub struct Recorder {
    state: Arc<Mutex<RecorderState>>,
}

impl Recorder {
    fn push(&self, event: Event) {
        self.state.lock().unwrap().events.push(event);
    }
    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }
    /// returns the events recorded so far and forgets them
    pub fn drain(&self) -> Vec<Event> {
        std::mem::take(&mut self.state.lock().unwrap().events)
    }
    pub fn transmitted(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Transmit(b) => Some(b),
                _ => None,
            })
            .collect()
    }
    /// latest state written to an indicator, if it was ever written
    pub fn indicator(&self, kind: IndicatorKind) -> Option<bool> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::Indicator(k, on) if k == kind => Some(on),
            _ => None,
        })
    }
    /// bytes handed out by [BlockingReceive::receive_byte]
    pub fn queue_inbound(&self, bytes: &[u8]) {
        self.state.lock().unwrap().inbound.extend(bytes.iter().copied());
    }
}

impl MotorActuator for Recorder {
    fn init(&mut self) {
        self.push(Event::Init);
    }
    fn set_direction(&mut self, direction: Direction) {
        self.push(Event::SetDirection(direction));
    }
    fn set_speed(&mut self, percent: u8) {
        self.push(Event::SetSpeed(percent));
    }
    fn brake(&mut self) {
        self.push(Event::Brake);
    }
}

impl StatusIndicator for Recorder {
    fn set(&mut self, kind: IndicatorKind, on: bool) {
        self.push(Event::Indicator(kind, on));
    }
}

impl SerialTransport for Recorder {
    fn send_byte(&mut self, byte: u8) {
        self.push(Event::Transmit(byte));
    }
}

impl BlockingReceive for Recorder {
    fn receive_byte(&mut self) -> u8 {
        self.state
            .lock()
            .unwrap()
            .inbound
            .pop_front()
            .expect("receive_byte called with nothing queued")
    }
}

/// In memory serial pair that can corrupt or drop written bytes.
pub struct Testable {
    tx: Sender<u8>,
    rx: Receiver<u8>,
    error_rate: f64,
    omission_rate: f64,
    random: SmallRng,
}

impl Testable {
    pub fn new(error_rate: f64, omission_rate: f64) -> (Self, Self) {
        let (host_tx, device_rx) = mpsc::channel::<u8>(1000);
        let (device_tx, host_rx) = mpsc::channel::<u8>(1000);
        let host = Self {
            tx: host_tx,
            rx: host_rx,
            error_rate,
            omission_rate,
            random: SmallRng::from_os_rng(),
        };
        let device = Self {
            tx: device_tx,
            rx: device_rx,
            error_rate,
            omission_rate,
            random: SmallRng::from_os_rng(),
        };
        (host, device)
    }
}

impl AsyncSerial for Testable {
    async fn read(&mut self) -> u8 {
        self.rx.recv().await.unwrap()
    }

    async fn write(&mut self, buf: u8) {
        let buf = if self.random.random_bool(self.error_rate) {
            self.random.random()
        } else {
            buf
        };
        if self.random.random_bool(1.0 - self.omission_rate) {
            let _ = self.tx.send(buf).await;
        }
    }
}
