mod serial;
pub use serial::*;

mod pwm;
pub use pwm::*;
