//! Single byte command frame.
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! [ transaction ][dir][  speed   ]
//! ```
//! Every received byte is answered with [ACK_BYTE] before it is even looked at.

use serde::{Deserialize, Serialize};

use crate::Direction;

/// acknowledgment sent back for every received byte
pub const ACK_BYTE: u8 = 0xFF;

const ID_OFFSET: u8 = 5;
const DIRECTION_OFFSET: u8 = 4;

const ID_MASK: u8 = 0b1110_0000;
const DIRECTION_MASK: u8 = 0b0001_0000;
const SPEED_MASK: u8 = 0b0000_1111;

/// highest transaction id, ids roll over after it
pub const MAX_TRANSACTION_ID: u8 = ID_MASK >> ID_OFFSET;
/// highest speed level carried by a frame
pub const MAX_SPEED_LEVEL: u8 = SPEED_MASK;

/// A byte as it came from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawFrame(pub u8);

impl RawFrame {
    pub fn decode(self) -> DecodedFrame {
        DecodedFrame {
            transaction_id: (self.0 & ID_MASK) >> ID_OFFSET,
            direction: Direction::from_flag((self.0 & DIRECTION_MASK) >> DIRECTION_OFFSET == 1),
            speed_level: self.0 & SPEED_MASK,
        }
    }
}

impl From<u8> for RawFrame {
    fn from(value: u8) -> Self {
        RawFrame(value)
    }
}

impl From<RawFrame> for u8 {
    fn from(value: RawFrame) -> Self {
        value.0
    }
}

/// Fields of a [RawFrame].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedFrame {
    /// 0..=7, only used to spot repeated frames
    pub transaction_id: u8,
    pub direction: Direction,
    /// 0..=15
    pub speed_level: u8,
}

impl DecodedFrame {
    /// build a frame, out of range fields are truncated to their bit width
    pub fn new(transaction_id: u8, direction: Direction, speed_level: u8) -> Self {
        Self {
            transaction_id: transaction_id & MAX_TRANSACTION_ID,
            direction,
            speed_level: speed_level & MAX_SPEED_LEVEL,
        }
    }
    pub fn encode(&self) -> RawFrame {
        let direction = (self.direction.flag() as u8) << DIRECTION_OFFSET;
        RawFrame(
            ((self.transaction_id << ID_OFFSET) & ID_MASK)
                | direction
                | (self.speed_level & SPEED_MASK),
        )
    }
}
