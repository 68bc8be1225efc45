//! Single-slot overwrite channel from the timer context to the plant context.
//!
//! The slot carries the switch position together with the ready flag in one
//! atomic byte, so a reader can never observe a ready flag paired with a
//! stale switch value. Capacity is one: a send that finds the previous event
//! still pending replaces it and the replaced step is lost.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread::{self, Thread};

use crate::converter::SwitchPosition;

const EMPTY: u8 = 0;
const READY_OFF: u8 = 1;
const READY_ON: u8 = 2;

#[inline]
fn encode(position: SwitchPosition) -> u8 {
    if position.is_on { READY_ON } else { READY_OFF }
}

#[inline]
fn decode(raw: u8) -> Option<SwitchPosition> {
    match raw {
        READY_OFF => Some(SwitchPosition::OFF),
        READY_ON => Some(SwitchPosition::ON),
        _ => None,
    }
}

/// Outcome of [`SwitchSlot::try_send`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The slot was empty.
    Fresh,
    /// An unconsumed event was overwritten.
    Coalesced,
}

/// Ready flag plus switch position, shared by exactly one sender and one receiver.
#[derive(Debug)]
pub struct SwitchSlot {
    slot: AtomicU8,
    coalesced: AtomicU64,
    receiver: OnceLock<Thread>,
}

impl Default for SwitchSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchSlot {
    pub const fn new() -> Self {
        Self {
            slot: AtomicU8::new(EMPTY),
            coalesced: AtomicU64::new(0),
            receiver: OnceLock::new(),
        }
    }

    /// Publish a switch position and raise ready. Never blocks.
    #[inline]
    pub fn try_send(&self, position: SwitchPosition) -> Delivery {
        let previous = self.slot.swap(encode(position), Ordering::AcqRel);
        let delivery = if previous == EMPTY {
            Delivery::Fresh
        } else {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            Delivery::Coalesced
        };
        self.wake();
        delivery
    }

    /// Take the pending event, clearing ready in the same operation.
    #[inline]
    pub fn try_recv(&self) -> Option<SwitchPosition> {
        decode(self.slot.swap(EMPTY, Ordering::AcqRel))
    }

    pub fn is_pending(&self) -> bool {
        self.slot.load(Ordering::Acquire) != EMPTY
    }

    /// Number of events overwritten before they were consumed.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    /// Register the calling thread as the one that blocks in [`Self::recv_blocking`].
    ///
    /// Only the first registration sticks. Register before the sender starts
    /// so that no wake-up can target an unregistered receiver.
    pub fn register_receiver(&self) {
        self.receiver.get_or_init(thread::current);
    }

    /// Block until an event arrives or `stop` is raised.
    ///
    /// After `stop` is observed one final `try_recv` drains an event that was
    /// sent before the stop, so no delivered step is lost at shutdown.
    pub fn recv_blocking(&self, stop: &AtomicBool) -> Option<SwitchPosition> {
        self.register_receiver();
        loop {
            if let Some(position) = self.try_recv() {
                return Some(position);
            }
            if stop.load(Ordering::Acquire) {
                return self.try_recv();
            }
            thread::park();
        }
    }

    /// Unpark the registered receiver, if any.
    pub fn wake(&self) {
        if let Some(receiver) = self.receiver.get() {
            receiver.unpark();
        }
    }
}
