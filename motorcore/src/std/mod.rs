/*!
Std only implementations
*/
extern crate std;
use core::cell::RefCell;
use std::sync::Arc;

use defmt_or_log::{info, warn};
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use tokio::sync::mpsc::UnboundedSender;
use tokio_serial::SerialStream;

use crate::{Direction, IndicatorKind, MotorActuator, SerialTransport, StatusIndicator, protocol::AsyncSerial};

/// implement AsyncSerial for SerialStream
impl AsyncSerial for SerialStream {
    async fn read(&mut self) -> u8 {
        let mut buf = [0u8];
        while tokio::io::AsyncReadExt::read(self, &mut buf).await.is_err() {}
        buf[0]
    }

    async fn write(&mut self, buf: u8) {
        while tokio::io::AsyncWriteExt::write(self, &[buf]).await.is_err() {}
        let _ = tokio::io::AsyncWriteExt::flush(self).await; // ignore the result
    }
}

/// Transmit side used by the emulated controller.
///
/// The receive handler runs inside an async task, so instead of blocking on the port the
/// acknowledgment is queued and a writer task forwards it.
#[derive(Clone)]
pub struct AckSender(pub UnboundedSender<u8>);

impl SerialTransport for AckSender {
    fn send_byte(&mut self, byte: u8) {
        if self.0.send(byte).is_err() {
            warn!("ack writer is gone, dropping {:#x}", byte);
        }
    }
}

/// Motor that only reports what it would do.
#[derive(Debug, Default)]
pub struct LoggingMotor {
    pub direction: Option<Direction>,
    pub speed: u8,
    pub braking: bool,
}

impl MotorActuator for LoggingMotor {
    fn init(&mut self) {
        *self = Self::default();
        info!("motor: init, stopped");
    }
    fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
        self.braking = false;
        info!("motor: direction {:?}", direction);
    }
    fn set_speed(&mut self, percent: u8) {
        self.speed = percent.min(100);
        info!("motor: speed {}", self.speed);
    }
    fn brake(&mut self) {
        self.braking = true;
        self.speed = 0;
        info!("motor: brake");
    }
}

/// Status leds printed on change.
#[derive(Debug, Default)]
pub struct LoggingIndicator {
    state: [bool; IndicatorKind::COUNT],
}

impl LoggingIndicator {
    pub fn get(&self, kind: IndicatorKind) -> bool {
        self.state[kind.index()]
    }
}

impl StatusIndicator for LoggingIndicator {
    fn set(&mut self, kind: IndicatorKind, on: bool) {
        let led = &mut self.state[kind.index()];
        if *led != on {
            *led = on;
            info!("led {:?} {}", kind, if on { "on" } else { "off" });
        }
    }
}

/// One [LoggingIndicator] reachable from the receive task and the control task at once,
/// so the emulated controller shows a single led bank.
#[derive(Clone)]
pub struct SharedIndicator(Arc<Mutex<CriticalSectionRawMutex, RefCell<LoggingIndicator>>>);

impl Default for SharedIndicator {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(RefCell::new(LoggingIndicator::default()))))
    }
}

impl SharedIndicator {
    pub fn get(&self, kind: IndicatorKind) -> bool {
        self.0.lock(|leds| leds.borrow().get(kind))
    }
}

impl StatusIndicator for SharedIndicator {
    fn set(&mut self, kind: IndicatorKind, on: bool) {
        self.0.lock(|leds| leds.borrow_mut().set(kind, on));
    }
}
