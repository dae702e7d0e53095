//! # Component Storage
//!
//! One storage per component type, indexed by entity index.
//!
//! Two backings:
//! - **Dense**: `Vec<Option<T>>`, values are created and dropped in place
//! - **Pooled**: values live in an [`ObjectPool`]; the storage maps entity
//!   index → pool handle and pool slot → owning entity, so a kill-existing
//!   eviction can detach the component from its previous owner
//!
//! Storages are type-erased behind [`AnyStorage`] so the manager can hold
//! every component type in one table and still remove by type index.

use std::any::Any;

use tessera_core::{memory::Acquired, ObjectPool, PoolConfig, PoolHandle, Poolable};

use crate::component::Component;
use crate::entity::Entity;

/// Occupancy of a component pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolStats {
    /// Current pool capacity.
    pub capacity: usize,
    /// Values attached to entities.
    pub in_use: usize,
    /// Values created and waiting for reuse.
    pub free: usize,
}

/// How a component value is produced when it is placed.
pub(crate) enum Fill<T> {
    /// Store exactly this value, replacing any current one.
    Value(T),
    /// Keep the current value, or produce one. Pooled storages reuse the
    /// pooled instance instead of calling the constructor.
    Default(fn() -> T),
}

/// Returned when a `ReturnNull` pool has nothing left to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolExhausted;

/// Type-erased view over a [`ComponentStorage`].
pub(crate) trait AnyStorage {
    /// Drops the component of the entity at `index`, returning it to its pool
    /// if pooled.
    fn remove(&mut self, index: usize) -> bool;

    /// Pool occupancy, `None` for dense storages.
    fn pool_stats(&self) -> Option<PoolStats>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Pool operations the storage needs, object-safe so the storage itself does
/// not carry the `Poolable` bound.
trait PoolBackend<T> {
    fn acquire_evicting(&mut self) -> Option<Acquired>;
    fn release(&mut self, handle: PoolHandle) -> bool;
    fn get(&self, handle: PoolHandle) -> Option<&T>;
    fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T>;
    fn stats(&self) -> PoolStats;
}

impl<T: Poolable> PoolBackend<T> for ObjectPool<T> {
    fn acquire_evicting(&mut self) -> Option<Acquired> {
        ObjectPool::acquire_evicting(self)
    }

    fn release(&mut self, handle: PoolHandle) -> bool {
        ObjectPool::release(self, handle)
    }

    fn get(&self, handle: PoolHandle) -> Option<&T> {
        ObjectPool::get(self, handle)
    }

    fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        ObjectPool::get_mut(self, handle)
    }

    fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            in_use: self.in_use_count(),
            free: self.free_count(),
        }
    }
}

struct PooledSlots<T> {
    pool: Box<dyn PoolBackend<T>>,
    /// Entity index → pool handle.
    handles: Vec<Option<PoolHandle>>,
    /// Pool slot → owning entity.
    owners: Vec<Option<Entity>>,
}

enum Backing<T> {
    Dense(Vec<Option<T>>),
    Pooled(PooledSlots<T>),
}

/// Storage for one component type.
pub(crate) struct ComponentStorage<T> {
    backing: Backing<T>,
}

impl<T: Component> ComponentStorage<T> {
    /// Heap-backed storage.
    pub(crate) const fn dense() -> Self {
        Self {
            backing: Backing::Dense(Vec::new()),
        }
    }

    /// Pool-backed storage; `factory` creates values the pool has not seen.
    pub(crate) fn pooled<F>(config: PoolConfig, factory: F) -> Self
    where
        T: Poolable,
        F: FnMut() -> T + 'static,
    {
        Self {
            backing: Backing::Pooled(PooledSlots {
                pool: Box::new(ObjectPool::with_config(config, factory)),
                handles: Vec::new(),
                owners: Vec::new(),
            }),
        }
    }

    /// Attaches a value to `entity`.
    ///
    /// On success returns the entity whose value was evicted to make room,
    /// if the pool had to kill one.
    pub(crate) fn place(&mut self, entity: Entity, fill: Fill<T>) -> Result<Option<Entity>, PoolExhausted> {
        let slot = entity.slot();
        match &mut self.backing {
            Backing::Dense(values) => {
                if slot >= values.len() {
                    values.resize_with(slot + 1, || None);
                }
                match fill {
                    Fill::Value(value) => values[slot] = Some(value),
                    Fill::Default(make) => {
                        if values[slot].is_none() {
                            values[slot] = Some(make());
                        }
                    }
                }
                Ok(None)
            }
            Backing::Pooled(pooled) => pooled.place(entity, fill),
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        match &self.backing {
            Backing::Dense(values) => values.get(index)?.as_ref(),
            Backing::Pooled(pooled) => {
                let handle = (*pooled.handles.get(index)?)?;
                pooled.pool.get(handle)
            }
        }
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match &mut self.backing {
            Backing::Dense(values) => values.get_mut(index)?.as_mut(),
            Backing::Pooled(pooled) => {
                let handle = (*pooled.handles.get(index)?)?;
                pooled.pool.get_mut(handle)
            }
        }
    }
}

impl<T> PooledSlots<T> {
    fn place(&mut self, entity: Entity, fill: Fill<T>) -> Result<Option<Entity>, PoolExhausted> {
        let slot = entity.slot();

        if let Some(handle) = self.handles.get(slot).copied().flatten() {
            Self::fill(self.pool.as_mut(), handle, fill);
            return Ok(None);
        }

        let Acquired { handle, evicted } = self.pool.acquire_evicting().ok_or(PoolExhausted)?;

        let mut evicted_owner = None;
        if let Some(evicted) = evicted {
            let pool_slot = evicted.index() as usize;
            if let Some(owner) = self.owners.get_mut(pool_slot).and_then(Option::take) {
                self.handles[owner.slot()] = None;
                evicted_owner = Some(owner);
            }
        }

        let pool_slot = handle.index() as usize;
        if slot >= self.handles.len() {
            self.handles.resize(slot + 1, None);
        }
        if pool_slot >= self.owners.len() {
            self.owners.resize(pool_slot + 1, None);
        }
        self.handles[slot] = Some(handle);
        self.owners[pool_slot] = Some(entity);

        Self::fill(self.pool.as_mut(), handle, fill);
        Ok(evicted_owner)
    }

    fn fill(pool: &mut dyn PoolBackend<T>, handle: PoolHandle, fill: Fill<T>) {
        if let (Fill::Value(value), Some(current)) = (fill, pool.get_mut(handle)) {
            *current = value;
        }
    }

    fn remove(&mut self, index: usize) -> bool {
        let Some(handle) = self.handles.get_mut(index).and_then(Option::take) else {
            return false;
        };
        if let Some(owner) = self.owners.get_mut(handle.index() as usize) {
            *owner = None;
        }
        self.pool.release(handle)
    }
}

impl<T: Component> AnyStorage for ComponentStorage<T> {
    fn remove(&mut self, index: usize) -> bool {
        match &mut self.backing {
            Backing::Dense(values) => values.get_mut(index).and_then(Option::take).is_some(),
            Backing::Pooled(pooled) => pooled.remove(index),
        }
    }

    fn pool_stats(&self) -> Option<PoolStats> {
        match &self.backing {
            Backing::Dense(_) => None,
            Backing::Pooled(pooled) => Some(pooled.pool.stats()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::ResizePolicy;

    #[derive(Debug, Default, PartialEq)]
    struct Ammo(u32);

    impl Poolable for Ammo {
        fn on_return(&mut self) {
            self.0 = 0;
        }
    }

    fn entity(index: u32) -> Entity {
        Entity::new(index, 0)
    }

    #[test]
    fn test_dense_place_get_remove() {
        let mut storage = ComponentStorage::<Ammo>::dense();
        assert_eq!(storage.place(entity(4), Fill::Value(Ammo(7))), Ok(None));
        assert_eq!(storage.get(4), Some(&Ammo(7)));
        assert_eq!(storage.get(3), None);

        // Default fill keeps an existing value
        assert_eq!(storage.place(entity(4), Fill::Default(Ammo::default)), Ok(None));
        assert_eq!(storage.get(4), Some(&Ammo(7)));

        assert!(storage.remove(4));
        assert!(!storage.remove(4));
        assert_eq!(storage.get(4), None);
        assert_eq!(storage.pool_stats(), None);
    }

    #[test]
    fn test_pooled_value_returns_to_pool() {
        let config = PoolConfig::new(2, ResizePolicy::ReturnNull);
        let mut storage = ComponentStorage::pooled(config, Ammo::default);

        storage.place(entity(0), Fill::Value(Ammo(30))).unwrap();
        storage.get_mut(0).unwrap().0 -= 1;
        assert_eq!(storage.get(0), Some(&Ammo(29)));

        assert!(storage.remove(0));
        let stats = storage.pool_stats().unwrap();
        assert_eq!((stats.in_use, stats.free), (0, 1));

        // The recycled instance was reset by the return hook
        storage.place(entity(1), Fill::Default(Ammo::default)).unwrap();
        assert_eq!(storage.get(1), Some(&Ammo(0)));
    }

    #[test]
    fn test_pooled_exhaustion_returns_error() {
        let config = PoolConfig::new(1, ResizePolicy::ReturnNull);
        let mut storage = ComponentStorage::pooled(config, Ammo::default);

        storage.place(entity(0), Fill::Value(Ammo(1))).unwrap();
        assert_eq!(storage.place(entity(1), Fill::Value(Ammo(2))), Err(PoolExhausted));
        assert_eq!(storage.get(1), None);

        // Placing on an entity that already holds a value reuses it
        assert_eq!(storage.place(entity(0), Fill::Value(Ammo(5))), Ok(None));
        assert_eq!(storage.get(0), Some(&Ammo(5)));
    }

    #[test]
    fn test_kill_existing_reports_evicted_owner() {
        let config = PoolConfig::new(2, ResizePolicy::KillExisting);
        let mut storage = ComponentStorage::pooled(config, Ammo::default);

        storage.place(entity(0), Fill::Value(Ammo(1))).unwrap();
        storage.place(entity(1), Fill::Value(Ammo(2))).unwrap();
        let evicted = storage.place(entity(2), Fill::Value(Ammo(3))).unwrap();

        assert_eq!(evicted, Some(entity(0)));
        assert_eq!(storage.get(0), None);
        assert_eq!(storage.get(1), Some(&Ammo(2)));
        assert_eq!(storage.get(2), Some(&Ammo(3)));
        assert!(!storage.remove(0));
        assert_eq!(storage.pool_stats().unwrap().in_use, 2);
    }
}
