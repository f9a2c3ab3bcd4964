#![no_std]
/*!
Single-byte serial motor controller.

A receive interrupt acknowledges every incoming byte and drops it into a one-slot [channel::FrameChannel].
A cooperative [scheduler::Scheduler] periodically runs the [control::ControlTask], which drains the channel,
decodes the [protocol::frame::RawFrame], checks it against the last accepted one and drives the motor and the status leds.

The hardware side is reached only through the traits in this crate ([MotorActuator], [StatusIndicator], [SerialTransport]),
so the same logic runs on the microcontroller and on a PC.
*/

pub mod protocol;

pub mod channel;

pub mod receiver;

pub mod scheduler;

pub mod control;

pub mod common;

#[cfg(feature = "std")]
pub mod std;

#[cfg(feature = "std")]
pub mod test_harness;

#[cfg(feature = "ch32")]
mod ch32;
#[cfg(feature = "ch32")]
pub use ch32::*;

mod traits;
pub use traits::*;

pub mod prelude;
