use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::config::LinkConfig;

/// 8N1 without flow control, as the controller usart is configured.
pub fn open_port(config: &LinkConfig) -> Result<SerialStream, String> {
    tokio_serial::new(&config.port, config.baud_rate)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .open_native_async()
        .map_err(|e| format!("could not open {}: {e}", config.port))
}

/// Two connected pseudo terminals, the first for the host and the second for the emulated controller.
pub fn simulated_pair() -> Result<(SerialStream, SerialStream), String> {
    SerialStream::pair().map_err(|e| format!("could not create pseudo terminals: {e}"))
}
