//! Definitions for the comunication protocol used over serial
//! AsyncSerial is an abstraction over serial used on the host side, it should be correctly implemented on each platform we support
//! In frame mod there is the single byte command layout shared by both ends
//! in commander mod there is the host side that periodically sends frames and waits for the acknowledgment

use core::future::Future;

pub mod frame;

#[cfg(feature = "std")]
pub mod commander;

#[cfg(all(feature = "std", test))]
pub mod tests;

/// Serial abstraction. It's considered infallible
pub trait AsyncSerial {
    ///tries to read a single byte from Serial
    fn read(&mut self) -> impl Future<Output = u8>;
    ///writes a single byte over Serial
    fn write(&mut self, buf: u8) -> impl Future<Output = ()>;
}
