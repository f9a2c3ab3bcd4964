use ch32_hal::{
    mode::Mode,
    usart::{self, Uart},
};
use defmt_or_log::warn;

use crate::{BlockingReceive, SerialTransport};

/// Polled usart used from the receive interrupt.
pub struct BlockingSerial<'a, T: usart::Instance, M: Mode> {
    uart: Uart<'a, T, M>,
}

impl<'a, T: usart::Instance, M: Mode> BlockingSerial<'a, T, M> {
    pub fn new(uart: Uart<'a, T, M>) -> Self {
        Self { uart }
    }
}

impl<'a, T: usart::Instance, M: Mode> SerialTransport for BlockingSerial<'a, T, M> {
    fn send_byte(&mut self, byte: u8) {
        if let Err(e) = self.uart.blocking_write(&[byte]) {
            warn!("serial: write failed {:?}", e);
            return;
        }
        if let Err(e) = self.uart.blocking_flush() {
            warn!("serial: flush failed {:?}", e);
        }
    }
}

impl<'a, T: usart::Instance, M: Mode> BlockingReceive for BlockingSerial<'a, T, M> {
    fn receive_byte(&mut self) -> u8 {
        let mut buf = [0u8];
        // framing and overrun errors still leave a byte in the data register
        if let Err(e) = self.uart.blocking_read(&mut buf) {
            warn!("serial: read error {:?}, keeping {:#x}", e, buf[0]);
        }
        buf[0]
    }
}
