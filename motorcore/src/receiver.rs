use defmt_or_log::trace;

use crate::{
    BlockingReceive, IndicatorKind, SerialTransport, StatusIndicator, channel::FrameChannel,
    protocol::frame::ACK_BYTE,
};

/// Receive interrupt handler.
///
/// Acknowledges the byte, publishes it to the [FrameChannel] and lights the reception led.
/// No decoding happens here, that is left to the control task.
pub struct ByteReceiver<'a, T: SerialTransport, S: StatusIndicator> {
    channel: &'a FrameChannel,
    transport: T,
    status: S,
}

impl<'a, T: SerialTransport, S: StatusIndicator> ByteReceiver<'a, T, S> {
    pub fn new(channel: &'a FrameChannel, transport: T, status: S) -> Self {
        Self {
            channel,
            transport,
            status,
        }
    }

    /// Callback for a receive event that already carries the byte.
    ///
    /// The acknowledgment blocks until the transmitter takes it, before the byte is published.
    pub fn on_byte(&mut self, byte: u8) {
        trace!("receiver: got {:#x}", byte);
        self.transport.send_byte(ACK_BYTE);
        self.channel.put(byte);
        self.status.set(IndicatorKind::ReceptionSuccessful, true);
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn status(&self) -> &S {
        &self.status
    }
}

impl<'a, T: BlockingReceive, S: StatusIndicator> ByteReceiver<'a, T, S> {
    /// Interrupt entry point when the handler has to fetch the byte itself.
    pub fn on_interrupt(&mut self) {
        let byte = self.transport.receive_byte();
        self.on_byte(byte);
    }
}
