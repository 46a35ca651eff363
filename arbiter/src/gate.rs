//! Capacity gate: the bounded pool of bus slots.
//!
//! The gate is not a standalone semaphore. It lives inside the arbiter's
//! locked state so that its free-slot count is read and written under the same
//! lock as the direction and the announcement counters. A task that finds no
//! permit available waits on the arbiter, which is what makes `acquire` block.
use std::num::NonZeroUsize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapacityGate {
    capacity: usize,
    free: usize,
}

impl CapacityGate {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            free: capacity.get(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free(&self) -> usize {
        self.free
    }

    /// Number of permits currently held by admitted tasks.
    pub fn occupied(&self) -> usize {
        self.capacity - self.free
    }

    /// No task holds a permit.
    pub fn is_idle(&self) -> bool {
        self.free == self.capacity
    }

    pub fn has_permit(&self) -> bool {
        self.free > 0
    }

    /// Take one permit. Returns false, leaving the gate untouched, if every
    /// permit is already held.
    pub fn try_acquire(&mut self) -> bool {
        if self.free == 0 {
            return false;
        }
        self.free -= 1;
        true
    }

    pub fn release(&mut self) {
        debug_assert!(self.free < self.capacity, "permit released twice");
        self.free = (self.free + 1).min(self.capacity);
    }
}
