use crate::Millis;
use std::fmt;

/// Number of remotely uploadable bitmap slots.
pub const SLOT_COUNT: usize = 20;
/// 128x64 pixels at one bit per pixel.
pub const SLOT_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    OutOfRange(usize),
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotError::OutOfRange(index) => {
                write!(f, "slot {index} out of range (0..{SLOT_COUNT})")
            }
            SlotError::LengthMismatch { expected, actual } => {
                write!(f, "expected {expected} bytes, got {actual}")
            }
        }
    }
}

impl std::error::Error for SlotError {}

/// Outcome of a successful slot write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotWrite {
    Stored,
    Cleared,
}

struct Slot {
    bitmap: Box<[u8; SLOT_BYTES]>,
    active: bool,
    last_updated: Millis,
}

impl Slot {
    fn empty() -> Self {
        Self {
            bitmap: Box::new([0u8; SLOT_BYTES]),
            active: false,
            last_updated: 0,
        }
    }
}

/// Fixed ring of pre-allocated bitmap slots filled over HTTP.
pub struct DisplaySlotStore {
    slots: [Slot; SLOT_COUNT],
}

impl Default for DisplaySlotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySlotStore {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::empty()),
        }
    }

    /// Store, clear, or reject a payload for one slot.
    ///
    /// An empty payload clears the slot. Any length other than `SLOT_BYTES`
    /// also deactivates the slot, leaves its bytes untouched, and is an error.
    pub fn write(
        &mut self,
        index: usize,
        payload: &[u8],
        now: Millis,
    ) -> Result<SlotWrite, SlotError> {
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SlotError::OutOfRange(index))?;

        if payload.is_empty() {
            slot.active = false;
            return Ok(SlotWrite::Cleared);
        }
        if payload.len() != SLOT_BYTES {
            slot.active = false;
            return Err(SlotError::LengthMismatch {
                expected: SLOT_BYTES,
                actual: payload.len(),
            });
        }

        slot.bitmap.copy_from_slice(payload);
        slot.active = true;
        slot.last_updated = now;
        Ok(SlotWrite::Stored)
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.active)
    }

    pub fn last_updated(&self, index: usize) -> Option<Millis> {
        self.slots.get(index).map(|s| s.last_updated)
    }

    /// Active and written less than `max_age` ago.
    pub fn is_displayable(&self, index: usize, now: Millis, max_age: Millis) -> bool {
        self.slots
            .get(index)
            .is_some_and(|s| s.active && now.saturating_sub(s.last_updated) < max_age)
    }

    /// First displayable slot after `cursor`, wrapping around once.
    pub fn next_displayable(&self, cursor: usize, now: Millis, max_age: Millis) -> Option<usize> {
        (1..=SLOT_COUNT)
            .map(|step| (cursor + step) % SLOT_COUNT)
            .find(|&index| self.is_displayable(index, now, max_age))
    }

    pub fn payload(&self, index: usize) -> Option<&[u8; SLOT_BYTES]> {
        self.slots.get(index).map(|s| &*s.bitmap)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }
}
