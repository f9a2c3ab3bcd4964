//! Portable collaborators written against embedded-hal, shared by every board.

mod hbridge;
pub use hbridge::*;

mod led_bank;
pub use led_bank::*;
