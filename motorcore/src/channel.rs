use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use portable_atomic::{AtomicU32, Ordering};

use crate::protocol::frame::RawFrame;

#[derive(Clone, Copy)]
struct Slot {
    byte: u8,
    available: bool,
}

/// One-slot mailbox between the receive interrupt and the control task.
///
/// `put` is called only by the receiver, `take_if_available` only by the control task.
/// Both run inside a critical section, so a frame is never read half-written and a set is never lost.
/// A second `put` before a `take` overwrites the first byte: there is no queue.
pub struct FrameChannel {
    slot: Mutex<CriticalSectionRawMutex, Cell<Slot>>,
    published: AtomicU32,
    overwritten: AtomicU32,
}

/// Counters kept by a [FrameChannel] since startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStats {
    /// bytes stored by the receiver
    pub published: u32,
    /// bytes replaced before the control task could read them
    pub overwritten: u32,
}

impl FrameChannel {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(Slot {
                byte: 0,
                available: false,
            })),
            published: AtomicU32::new(0),
            overwritten: AtomicU32::new(0),
        }
    }

    /// store the byte and mark it as available. Interrupt context.
    pub fn put(&self, byte: u8) {
        let overwrote = self.slot.lock(|slot| {
            let previous = slot.replace(Slot {
                byte,
                available: true,
            });
            previous.available
        });
        self.published.fetch_add(1, Ordering::Relaxed);
        if overwrote {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// check and clear the available flag in one step. Cooperative context.
    pub fn take_if_available(&self) -> Option<RawFrame> {
        self.slot.lock(|slot| {
            let current = slot.get();
            if !current.available {
                return None;
            }
            slot.set(Slot {
                available: false,
                ..current
            });
            Some(RawFrame(current.byte))
        })
    }

    pub fn is_available(&self) -> bool {
        self.slot.lock(|slot| slot.get().available)
    }

    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            published: self.published.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
        }
    }
}

impl Default for FrameChannel {
    fn default() -> Self {
        Self::new()
    }
}
