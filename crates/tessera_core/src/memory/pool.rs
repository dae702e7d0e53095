//! # Object Pool
//!
//! Reusable-object allocator for entities, components and other objects that
//! are created and discarded every frame.
//!
//! ```text
//! free deque:    [ 4 ][ 1 ][ 6 ]            acquire pops the front
//! in-use list:   2 <-> 0 <-> 5 <-> 3        oldest ... newest
//! ```
//!
//! Every created slot is in exactly one of the two structures. Slots are
//! created lazily by the factory up to the pool capacity; what happens after
//! that is decided by the pool's [`ResizePolicy`].

use serde::{Deserialize, Serialize};

use crate::collections::Deque;

/// What a pool does when every slot is in use and the capacity is reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Hand out nothing; the caller must handle `None`.
    ReturnNull,
    /// Grow the capacity by one and create a new item. Never fails.
    #[default]
    IncreaseSize,
    /// Evict the oldest in-use item and reuse its slot.
    KillExisting,
}

/// Capacity and exhaustion policy of a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of items the pool may create before the policy applies.
    pub capacity: usize,
    /// Behaviour once `capacity` items are in use.
    pub policy: ResizePolicy,
}

impl PoolConfig {
    /// Creates a pool configuration.
    #[must_use]
    pub const fn new(capacity: usize, policy: ResizePolicy) -> Self {
        Self { capacity, policy }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            policy: ResizePolicy::IncreaseSize,
        }
    }
}

/// Hooks run when a pooled value changes hands.
pub trait Poolable {
    /// Called every time the value is handed out.
    fn on_acquire(&mut self) {}

    /// Called every time the value goes back to the pool, including eviction.
    fn on_return(&mut self) {}
}

/// Handle to an item handed out by an [`ObjectPool`].
///
/// The generation changes every time the slot is returned, so handles kept
/// past [`ObjectPool::release`] (or an eviction) no longer resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    /// Builds a handle from its parts.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index inside the pool. Stable for the lifetime of the pool.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when the handle was issued.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// Result of [`ObjectPool::acquire_evicting`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Acquired {
    /// The freshly handed out item.
    pub handle: PoolHandle,
    /// Handle of the item evicted to make room, if the pool had to kill one.
    pub evicted: Option<PoolHandle>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Free,
    InUse,
}

struct Slot<T> {
    value: T,
    generation: u32,
    state: SlotState,
    /// Previous (older) in-use slot.
    prev: Option<usize>,
    /// Next (newer) in-use slot.
    next: Option<usize>,
}

/// A pool of reusable `T` values.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per thread or wrap in a mutex.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Bullet { ttl: f32 }
/// impl Poolable for Bullet {}
///
/// let mut pool = ObjectPool::new(256, ResizePolicy::KillExisting, Bullet::default);
///
/// let handle = pool.acquire().expect("kill-existing pools never run dry");
/// pool.get_mut(handle).unwrap().ttl = 2.0;
/// pool.release(handle);
/// ```
pub struct ObjectPool<T> {
    slots: Vec<Slot<T>>,
    /// Indices of free slots; acquire pops the front, release pushes the back.
    free: Deque<usize>,
    /// Oldest in-use slot.
    head: Option<usize>,
    /// Newest in-use slot.
    tail: Option<usize>,
    in_use: usize,
    capacity: usize,
    policy: ResizePolicy,
    factory: Box<dyn FnMut() -> T>,
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates an empty pool. Items are created lazily by `factory`.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Items created before `policy` applies
    /// * `policy` - Behaviour once the pool is exhausted
    /// * `factory` - Creates a fresh item
    pub fn new<F>(capacity: usize, policy: ResizePolicy, factory: F) -> Self
    where
        F: FnMut() -> T + 'static,
    {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Deque::with_capacity(capacity),
            head: None,
            tail: None,
            in_use: 0,
            capacity,
            policy,
            factory: Box::new(factory),
        }
    }

    /// Creates an empty pool from a [`PoolConfig`].
    pub fn with_config<F>(config: PoolConfig, factory: F) -> Self
    where
        F: FnMut() -> T + 'static,
    {
        Self::new(config.capacity, config.policy, factory)
    }

    /// Current capacity. Only [`ResizePolicy::IncreaseSize`] changes it.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Exhaustion policy of this pool.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> ResizePolicy {
        self.policy
    }

    /// Total number of items created so far (free + in use).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no item was created yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of created items waiting in the free deque.
    #[inline]
    #[must_use]
    pub const fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of items currently handed out.
    #[inline]
    #[must_use]
    pub const fn in_use_count(&self) -> usize {
        self.in_use
    }

    /// Hands out an item.
    ///
    /// Returns `None` only for [`ResizePolicy::ReturnNull`] pools that are
    /// exhausted (or zero-capacity kill-existing pools).
    pub fn acquire(&mut self) -> Option<PoolHandle> {
        self.acquire_evicting().map(|acquired| acquired.handle)
    }

    /// Hands out an item, also reporting which item was evicted to make room.
    ///
    /// Owners that map pooled items back to other state need the evicted
    /// handle to drop their references to it.
    pub fn acquire_evicting(&mut self) -> Option<Acquired> {
        let mut evicted = None;

        let index = if let Some(index) = self.free.remove_from_front() {
            index
        } else if self.slots.len() < self.capacity {
            self.create_slot()
        } else {
            match self.policy {
                ResizePolicy::ReturnNull => {
                    tracing::trace!(capacity = self.capacity, "pool exhausted, returning nothing");
                    return None;
                }
                ResizePolicy::IncreaseSize => {
                    self.capacity += 1;
                    tracing::debug!(capacity = self.capacity, "pool grown by one");
                    self.create_slot()
                }
                ResizePolicy::KillExisting => {
                    let oldest = self.head?;
                    evicted = Some(self.handle_at(oldest));
                    self.retire(oldest);
                    tracing::debug!(slot = oldest, "pool evicted oldest in-use item");
                    oldest
                }
            }
        };

        self.link_back(index);
        let slot = &mut self.slots[index];
        slot.state = SlotState::InUse;
        slot.value.on_acquire();
        self.in_use += 1;

        Some(Acquired {
            handle: self.handle_at(index),
            evicted,
        })
    }

    /// Returns an item to the pool.
    ///
    /// Returns `false` if the handle is stale or was never issued by this pool.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(index) = self.live_index(handle) else {
            return false;
        };
        self.retire(index);
        self.free.add_to_back(index);
        true
    }

    /// Checks whether `handle` refers to an item that is still in use.
    #[inline]
    #[must_use]
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.live_index(handle).is_some()
    }

    /// Gets an in-use item.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.live_index(handle).map(|index| &self.slots[index].value)
    }

    /// Gets an in-use item mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        let index = self.live_index(handle)?;
        Some(&mut self.slots[index].value)
    }

    /// Iterates over in-use items from oldest to newest.
    #[must_use]
    pub fn iter_in_use(&self) -> InUse<'_, T> {
        InUse {
            pool: self,
            cursor: self.head,
        }
    }

    /// Returns every in-use item to the pool.
    pub fn clear(&mut self) {
        while let Some(oldest) = self.head {
            self.retire(oldest);
            self.free.add_to_back(oldest);
        }
    }

    fn create_slot(&mut self) -> usize {
        let value = (self.factory)();
        self.slots.push(Slot {
            value,
            generation: 0,
            state: SlotState::Free,
            prev: None,
            next: None,
        });
        self.slots.len() - 1
    }

    /// Takes an in-use slot out of circulation without queueing it as free.
    fn retire(&mut self, index: usize) {
        self.unlink(index);
        let slot = &mut self.slots[index];
        slot.state = SlotState::Free;
        slot.generation = slot.generation.wrapping_add(1);
        slot.value.on_return();
        self.in_use -= 1;
    }

    fn live_index(&self, handle: PoolHandle) -> Option<usize> {
        let index = handle.index as usize;
        let slot = self.slots.get(index)?;
        (slot.state == SlotState::InUse && slot.generation == handle.generation).then_some(index)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn handle_at(&self, index: usize) -> PoolHandle {
        PoolHandle::new(index as u32, self.slots[index].generation)
    }

    fn link_back(&mut self, index: usize) {
        self.slots[index].prev = self.tail;
        self.slots[index].next = None;
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
    }

    fn unlink(&mut self, index: usize) {
        let (prev, next) = {
            let slot = &self.slots[index];
            (slot.prev, slot.next)
        };
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }
        let slot = &mut self.slots[index];
        slot.prev = None;
        slot.next = None;
    }
}

/// Iterator over the in-use items of an [`ObjectPool`], oldest first.
pub struct InUse<'a, T> {
    pool: &'a ObjectPool<T>,
    cursor: Option<usize>,
}

impl<'a, T: Poolable> Iterator for InUse<'a, T> {
    type Item = (PoolHandle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.pool.slots[index];
        self.cursor = slot.next;
        Some((self.pool.handle_at(index), &slot.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default, Debug)]
    struct Particle {
        life: u32,
        returned: u32,
    }

    impl Poolable for Particle {
        fn on_return(&mut self) {
            self.life = 0;
            self.returned += 1;
        }
    }

    impl Poolable for u32 {}

    fn pool(capacity: usize, policy: ResizePolicy) -> ObjectPool<Particle> {
        ObjectPool::new(capacity, policy, Particle::default)
    }

    #[test]
    fn test_pool_acquire_release() {
        let mut pool = pool(10, ResizePolicy::ReturnNull);

        let h1 = pool.acquire().unwrap();
        pool.get_mut(h1).unwrap().life = 42;
        assert_eq!(pool.get(h1).unwrap().life, 42);
        assert_eq!(pool.in_use_count(), 1);

        assert!(pool.release(h1));
        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(pool.free_count(), 1);
        assert!(pool.get(h1).is_none());
        assert!(!pool.release(h1));
    }

    #[test]
    fn test_pool_creates_lazily() {
        let created = Rc::new(Cell::new(0));
        let counter = Rc::clone(&created);
        let mut pool = ObjectPool::new(4, ResizePolicy::ReturnNull, move || {
            counter.set(counter.get() + 1);
            0u32
        });
        assert_eq!(created.get(), 0);

        let h = pool.acquire().unwrap();
        pool.release(h);
        let _again = pool.acquire().unwrap();
        assert_eq!(created.get(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_pool_return_null_when_full() {
        let mut pool = pool(2, ResizePolicy::ReturnNull);

        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert!(pool.acquire().is_none());
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_pool_increase_size_grows_by_one() {
        let mut pool = pool(1, ResizePolicy::IncreaseSize);

        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(pool.capacity(), 2);
        let _c = pool.acquire().unwrap();
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_pool_kill_existing_evicts_oldest() {
        let mut pool = pool(2, ResizePolicy::KillExisting);

        let oldest = pool.acquire().unwrap();
        let newer = pool.acquire().unwrap();
        pool.get_mut(oldest).unwrap().life = 7;

        let acquired = pool.acquire_evicting().unwrap();
        assert_eq!(acquired.evicted, Some(oldest));
        assert_eq!(acquired.handle.index(), oldest.index());
        assert!(!pool.is_live(oldest));
        assert!(pool.is_live(newer));

        let reused = pool.get(acquired.handle).unwrap();
        assert_eq!(reused.life, 0);
        assert_eq!(reused.returned, 1);
        assert_eq!(pool.in_use_count(), 2);
    }

    #[test]
    fn test_pool_reuse_slot() {
        let mut pool = pool(1, ResizePolicy::ReturnNull);

        let h1 = pool.acquire().unwrap();
        pool.release(h1);

        let h2 = pool.acquire().unwrap();
        assert_eq!(h1.index(), h2.index()); // Same slot reused
        assert_ne!(h1.generation(), h2.generation());
    }

    #[test]
    fn test_pool_in_use_order_and_clear() {
        let mut pool = pool(8, ResizePolicy::ReturnNull);
        let handles: Vec<_> = (0..4).map(|_| pool.acquire().unwrap()).collect();
        pool.release(handles[1]);

        let order: Vec<_> = pool.iter_in_use().map(|(handle, _)| handle).collect();
        assert_eq!(order, vec![handles[0], handles[2], handles[3]]);

        pool.clear();
        assert_eq!(pool.in_use_count(), 0);
        assert_eq!(pool.free_count(), 4);
        assert_eq!(pool.iter_in_use().count(), 0);
    }

    #[test]
    fn test_pool_config_from_toml() {
        let config: PoolConfig = toml::from_str("capacity = 16\npolicy = \"kill_existing\"").unwrap();
        assert_eq!(config, PoolConfig::new(16, ResizePolicy::KillExisting));

        let defaults: PoolConfig = toml::from_str("").unwrap();
        assert_eq!(defaults, PoolConfig::default());
    }
}
