//! Object pools for bullets, enemies and collectibles
//!
//! Live entities are owned by the game state's collections; a pool only owns
//! released records waiting to be reused. Each record carries a
//! [`PoolHandle`] (slot + generation) so a stale copy being released a second
//! time is detected instead of corrupting the free list.

use serde::Serialize;

use crate::error::SimError;

/// Identity of a pooled record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolHandle {
    pub slot: u32,
    pub generation: u32,
}

/// A record that can be stored in a [`Pool`]
pub trait Poolable: Default {
    fn handle(&self) -> PoolHandle;
    fn set_handle(&mut self, handle: PoolHandle);
    /// Clear transient per-lifetime state before the record is reused
    fn reset(&mut self);
}

/// Acquire/release counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Records constructed because the free list was empty
    pub created: u64,
    pub acquired: u64,
    pub released: u64,
}

impl PoolStats {
    /// Records handed out and not yet returned
    pub fn live(&self) -> u64 {
        self.acquired - self.released
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    generation: u32,
    in_use: bool,
}

/// Free-list pool
#[derive(Debug)]
pub struct Pool<T> {
    name: &'static str,
    free: Vec<T>,
    max_free: usize,
    recycle: bool,
    slots: Vec<SlotState>,
    free_slots: Vec<u32>,
    stats: PoolStats,
}

impl<T: Poolable> Pool<T> {
    /// Pool that keeps up to `max_free` released records for reuse
    pub fn new(name: &'static str, max_free: usize) -> Self {
        Self {
            name,
            free: Vec::with_capacity(max_free),
            max_free,
            recycle: true,
            slots: Vec::new(),
            free_slots: Vec::new(),
            stats: PoolStats::default(),
        }
    }

    /// Pool that never keeps released records; every acquire constructs a new one.
    /// Bookkeeping and the double-release guard still apply.
    pub fn unpooled(name: &'static str) -> Self {
        Self {
            recycle: false,
            ..Self::new(name, 0)
        }
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Released records currently waiting for reuse
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Hand out a recycled record, or construct one
    pub fn acquire(&mut self) -> T {
        let recycled = if self.recycle { self.free.pop() } else { None };
        let mut item = match recycled {
            Some(item) => item,
            None => {
                self.stats.created += 1;
                let mut item = T::default();
                item.set_handle(PoolHandle {
                    slot: self.allocate_slot(),
                    generation: 0,
                });
                item
            }
        };

        let slot = item.handle().slot;
        let state = &mut self.slots[slot as usize];
        state.generation = state.generation.wrapping_add(1);
        state.in_use = true;
        item.set_handle(PoolHandle {
            slot,
            generation: state.generation,
        });

        self.stats.acquired += 1;
        item
    }

    /// Return a record. Releasing a record that is not live is an error and
    /// leaves the pool untouched.
    pub fn release(&mut self, mut item: T) -> Result<(), SimError> {
        let handle = item.handle();
        let live = self
            .slots
            .get(handle.slot as usize)
            .is_some_and(|s| s.in_use && s.generation == handle.generation);
        if !live {
            return Err(SimError::DoubleRelease {
                pool: self.name,
                slot: handle.slot,
            });
        }

        self.slots[handle.slot as usize].in_use = false;
        self.stats.released += 1;
        item.reset();

        if self.recycle && self.free.len() < self.max_free {
            self.free.push(item);
        } else {
            self.free_slots.push(handle.slot);
        }
        Ok(())
    }

    /// Whether a handle refers to a record that is currently handed out
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.slots
            .get(handle.slot as usize)
            .is_some_and(|s| s.in_use && s.generation == handle.generation)
    }

    /// Change how many released records are kept; extra ones are dropped
    pub fn set_max_free(&mut self, max_free: usize) {
        self.max_free = max_free;
        while self.free.len() > max_free {
            if let Some(item) = self.free.pop() {
                self.free_slots.push(item.handle().slot);
            }
        }
    }

    fn allocate_slot(&mut self) -> u32 {
        if let Some(slot) = self.free_slots.pop() {
            return slot;
        }
        self.slots.push(SlotState::default());
        (self.slots.len() - 1) as u32
    }
}

/// Remove every entity matching `dead` from `live` and hand it back to `pool`.
///
/// Order of the survivors is not preserved.
pub fn release_where<T: Poolable>(
    live: &mut Vec<T>,
    pool: &mut Pool<T>,
    mut dead: impl FnMut(&T) -> bool,
) -> Result<usize, SimError> {
    let mut released = 0;
    let mut i = 0;
    while i < live.len() {
        if dead(&live[i]) {
            pool.release(live.swap_remove(i))?;
            released += 1;
        } else {
            i += 1;
        }
    }
    Ok(released)
}

/// Release entities from the back of `live` until it holds at most `cap`
pub fn truncate_to_cap<T: Poolable>(
    live: &mut Vec<T>,
    pool: &mut Pool<T>,
    cap: usize,
) -> Result<usize, SimError> {
    let mut released = 0;
    while live.len() > cap {
        if let Some(item) = live.pop() {
            pool.release(item)?;
            released += 1;
        }
    }
    Ok(released)
}
