//! Memoization cell for cached wire sizes.
//!
//! Every sizeable entity carries one of these. `u32::MAX` is the stale
//! sentinel; it can never collide with a real wire size because a packet
//! of that size could not carry its own length header.

use std::cell::Cell;

/// Cached wire size with a stale sentinel.
///
/// Interior mutability keeps `wire_size()` a `&self` operation: the first
/// query computes and stores, later queries hit the cache. Mutating
/// operations call [`SizeMemo::invalidate`] so a stale value is never
/// observed.
#[derive(Debug, Clone)]
pub struct SizeMemo(Cell<u32>);

impl SizeMemo {
    const STALE: u32 = u32::MAX;

    /// A stale memo.
    #[must_use]
    pub fn new() -> Self {
        Self(Cell::new(Self::STALE))
    }

    /// The cached size, or `None` when stale.
    #[must_use]
    pub fn get(&self) -> Option<u32> {
        let value = self.0.get();
        (value != Self::STALE).then_some(value)
    }

    /// Cache `value` and return it.
    pub fn store(&self, value: u32) -> u32 {
        self.0.set(value);
        value
    }

    /// Mark the memo stale.
    pub fn invalidate(&self) {
        self.0.set(Self::STALE);
    }
}

impl Default for SizeMemo {
    fn default() -> Self {
        Self::new()
    }
}
