//! # Slot Pool
//!
//! Fixed-capacity object pool with a FIFO free-list, a use-bitmap and a
//! generation counter per slot.

use std::collections::VecDeque;

/// Handle to an allocated slot in a [`SlotPool`].
///
/// The generation is bumped every time the slot is freed, so a handle kept
/// across a free stops resolving even after the slot is handed out again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotHandle {
    /// Index into the pool.
    index: u32,
    /// Generation of the slot when the handle was issued.
    generation: u32,
}

impl SlotHandle {
    /// Returns the slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation the handle was issued with.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Occupancy snapshot of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of slots.
    pub capacity: usize,
    /// Slots currently allocated.
    pub in_use: usize,
    /// Slots on the free-list.
    pub free: usize,
    /// Highest `in_use` value seen since construction or the last clear.
    pub peak: usize,
}

/// A fixed-capacity pool of `T`.
///
/// Slots are zeroed (reset to `T::default()`) when allocated and again when
/// freed, so a freed slot never keeps owned buffers alive.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. The simulation has a single writer per frame.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: SlotPool<LifeTimer> = SlotPool::new("life_timer", 1024);
///
/// // Allocate - O(1), no heap allocation
/// let handle = pool.allocate()?;
/// pool.get_mut(handle)?.life_time = 0.05;
///
/// // Free - O(1), the handle is dead afterwards
/// pool.free(handle);
/// assert!(pool.get(handle).is_none());
/// ```
#[derive(Debug)]
pub struct SlotPool<T> {
    /// Name used in diagnostics.
    name: &'static str,
    /// The storage array.
    storage: Box<[T]>,
    /// Generation per slot.
    generations: Box<[u32]>,
    /// One bit per slot, set while allocated.
    used: Box<[u64]>,
    /// Indices of available slots, oldest free first.
    free_list: VecDeque<u32>,
    /// Number of allocated slots.
    in_use: usize,
    /// Highest `in_use` seen.
    peak: usize,
}

impl<T: Default> SlotPool<T> {
    /// Creates a new pool with the specified capacity.
    ///
    /// All memory is pre-allocated upfront.
    ///
    /// # Arguments
    ///
    /// * `name` - Pool name, used in log messages
    /// * `capacity` - Maximum number of objects
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or does not fit in a `u32`.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(u32::try_from(capacity).is_ok(), "Capacity must fit in u32");

        let storage: Vec<T> = (0..capacity).map(|_| T::default()).collect();

        Self {
            name,
            storage: storage.into_boxed_slice(),
            generations: vec![0; capacity].into_boxed_slice(),
            used: vec![0; capacity.div_ceil(64)].into_boxed_slice(),
            free_list: (0..capacity as u32).collect(),
            in_use: 0,
            peak: 0,
        }
    }

    /// Returns the pool name.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the total capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the number of currently allocated slots.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.in_use
    }

    /// Returns true if nothing is allocated.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.in_use == 0
    }

    /// Returns the number of free slots.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// Returns an occupancy snapshot.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            in_use: self.in_use,
            free: self.free_list.len(),
            peak: self.peak,
        }
    }

    #[inline]
    fn is_used(&self, index: usize) -> bool {
        self.used[index / 64] & (1 << (index % 64)) != 0
    }

    #[inline]
    fn set_used(&mut self, index: usize, used: bool) {
        if used {
            self.used[index / 64] |= 1 << (index % 64);
        } else {
            self.used[index / 64] &= !(1 << (index % 64));
        }
    }

    /// Allocates a slot and resets it to its default value.
    ///
    /// This is a **O(1)** operation with **zero heap allocations**.
    ///
    /// # Returns
    ///
    /// A handle to the slot, or None if the pool is exhausted.
    pub fn allocate(&mut self) -> Option<SlotHandle> {
        let index = self.free_list.pop_front()?;
        let slot = index as usize;

        self.set_used(slot, true);
        self.storage[slot] = T::default();
        self.in_use += 1;
        self.peak = self.peak.max(self.in_use);

        Some(SlotHandle {
            index,
            generation: self.generations[slot],
        })
    }

    /// Frees an allocated slot.
    ///
    /// Freeing a slot that is already free, or freeing through a stale
    /// handle, does nothing.
    ///
    /// # Arguments
    ///
    /// * `handle` - The handle to free
    ///
    /// # Returns
    ///
    /// True if the slot was released by this call.
    pub fn free(&mut self, handle: SlotHandle) -> bool {
        if !self.is_valid(handle) {
            return false;
        }
        let slot = handle.index as usize;

        self.set_used(slot, false);
        self.storage[slot] = T::default();
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free_list.push_back(handle.index);
        self.in_use -= 1;
        true
    }

    /// Returns true if the handle refers to a live slot.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, handle: SlotHandle) -> bool {
        let slot = handle.index as usize;
        slot < self.storage.len()
            && self.is_used(slot)
            && self.generations[slot] == handle.generation
    }

    /// Gets a reference to an allocated slot.
    ///
    /// # Arguments
    ///
    /// * `handle` - The handle to look up
    #[inline]
    #[must_use]
    pub fn get(&self, handle: SlotHandle) -> Option<&T> {
        if self.is_valid(handle) {
            self.storage.get(handle.index as usize)
        } else {
            None
        }
    }

    /// Gets a mutable reference to an allocated slot.
    ///
    /// # Arguments
    ///
    /// * `handle` - The handle to look up
    #[inline]
    pub fn get_mut(&mut self, handle: SlotHandle) -> Option<&mut T> {
        if self.is_valid(handle) {
            self.storage.get_mut(handle.index as usize)
        } else {
            None
        }
    }

    /// Returns the live handle for a slot index, if that slot is allocated.
    #[must_use]
    pub fn handle_at(&self, index: u32) -> Option<SlotHandle> {
        let slot = index as usize;
        (slot < self.storage.len() && self.is_used(slot)).then(|| SlotHandle {
            index,
            generation: self.generations[slot],
        })
    }

    /// Frees every slot, invalidating all outstanding handles.
    pub fn clear(&mut self) {
        for slot in 0..self.storage.len() {
            if self.is_used(slot) {
                self.generations[slot] = self.generations[slot].wrapping_add(1);
                self.storage[slot] = T::default();
            }
        }
        self.used.fill(0);
        self.free_list.clear();
        self.free_list.extend(0..self.storage.len() as u32);
        self.in_use = 0;
        self.peak = 0;
    }

    /// Iterates over all allocated slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotHandle, &T)> {
        self.storage
            .iter()
            .enumerate()
            .filter(|(slot, _)| self.is_used(*slot))
            .map(|(slot, value)| {
                (
                    SlotHandle {
                        index: slot as u32,
                        generation: self.generations[slot],
                    },
                    value,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_allocate_free() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 10);

        let h1 = pool.allocate().unwrap();
        *pool.get_mut(h1).unwrap() = 42;
        assert_eq!(*pool.get(h1).unwrap(), 42);
        assert_eq!(pool.len(), 1);

        assert!(pool.free(h1));
        assert_eq!(pool.len(), 0);
        assert!(pool.get(h1).is_none());
    }

    #[test]
    fn test_allocate_then_free_keeps_free_list_size() {
        let mut pool: SlotPool<u64> = SlotPool::new("test", 8);
        let _keep = pool.allocate().unwrap();
        let before = pool.free_count();

        let h = pool.allocate().unwrap();
        assert!(pool.free(h));

        assert_eq!(pool.free_count(), before);
        assert!(pool.get(h).is_none());
        assert!(!pool.is_valid(h));
    }

    #[test]
    fn test_pool_full() {
        let mut pool: SlotPool<u8> = SlotPool::new("test", 2);

        let _ = pool.allocate().unwrap();
        let _ = pool.allocate().unwrap();
        assert!(pool.allocate().is_none());
        assert_eq!(pool.stats().free, 0);
    }

    #[test]
    fn test_double_free_is_noop() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 4);
        let h = pool.allocate().unwrap();

        assert!(pool.free(h));
        assert!(!pool.free(h));
        assert_eq!(pool.free_count(), 4);
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn test_pool_reuse_is_fifo_and_zeroed() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 1);

        let h1 = pool.allocate().unwrap();
        *pool.get_mut(h1).unwrap() = 7;
        pool.free(h1);

        let h2 = pool.allocate().unwrap();
        assert_eq!(h1.index(), h2.index()); // Same slot reused
        assert_ne!(h1.generation(), h2.generation());
        assert_eq!(*pool.get(h2).unwrap(), 0);
        assert!(pool.get(h1).is_none());
    }

    #[test]
    fn test_freed_slots_go_to_the_back() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 3);
        let a = pool.allocate().unwrap();
        pool.free(a);

        let b = pool.allocate().unwrap();
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn test_stats_track_peak() {
        let mut pool: SlotPool<u32> = SlotPool::new("test", 100);
        let handles: Vec<_> = (0..70).map(|_| pool.allocate().unwrap()).collect();
        for h in &handles[..50] {
            pool.free(*h);
        }
        let stats = pool.stats();
        assert_eq!(stats.in_use, 20);
        assert_eq!(stats.peak, 70);
        assert_eq!(stats.free, 80);

        pool.clear();
        assert!(pool.is_empty());
        assert!(pool.get(handles[60]).is_none());
        assert_eq!(pool.iter().count(), 0);
    }
}
