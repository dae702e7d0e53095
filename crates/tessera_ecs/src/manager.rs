//! # Entity Manager
//!
//! Owns every entity and component of a world.
//!
//! Structural changes are deferred:
//! - creating an entity, attaching a component, toggling enabled state or
//!   marking an entity for removal queue the entity for **refresh**
//! - detaching a component records a pending `(entity, type)` removal that
//!   only takes effect in [`EntityManager::remove_marked_components`]
//!
//! The refresh pass ([`EntityManager::refresh`]) then lets every system
//! re-evaluate the queued entities, and finally destroys the ones marked for
//! removal. Between passes, systems see a stable view.

use std::collections::{HashMap, HashSet};

use tessera_core::{Bag, BitVector, ObjectPool, PoolConfig, Poolable, ResizePolicy};

use crate::component::{Component, ComponentType, ComponentTypeRegistry};
use crate::entity::{Entity, EntityRecord};
use crate::error::EcsResult;
use crate::query::ComponentQuery;
use crate::scheduler::SystemManager;
use crate::storage::{AnyStorage, ComponentStorage, Fill, PoolStats};

/// Default initial entity capacity.
const DEFAULT_ENTITY_CAPACITY: usize = 1024;

/// Entity and component store with deferred structural changes.
pub struct EntityManager {
    registry: ComponentTypeRegistry,
    records: ObjectPool<EntityRecord>,
    /// Indexed by component type index; `None` until first use.
    storages: Vec<Option<Box<dyn AnyStorage>>>,
    refresh_queue: Vec<Entity>,
    pending_removals: Vec<(Entity, ComponentType)>,
    pending_lookup: HashSet<(Entity, usize)>,
    names: HashMap<String, Entity>,
    groups: HashMap<String, Bag<Entity>>,
    by_unique_id: HashMap<u64, Entity>,
    next_unique_id: u64,
    total_created: u64,
    total_removed: u64,
}

impl EntityManager {
    /// Creates a manager with the default entity capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ENTITY_CAPACITY)
    }

    /// Creates a manager whose entity pool starts at `capacity`.
    ///
    /// The pool grows by one past this capacity when needed.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: ComponentTypeRegistry::new(),
            records: ObjectPool::new(capacity, ResizePolicy::IncreaseSize, EntityRecord::default),
            storages: Vec::new(),
            refresh_queue: Vec::new(),
            pending_removals: Vec::new(),
            pending_lookup: HashSet::new(),
            names: HashMap::new(),
            groups: HashMap::new(),
            by_unique_id: HashMap::new(),
            next_unique_id: 0,
            total_created: 0,
            total_removed: 0,
        }
    }

    // =========================================================================
    // Component registration
    // =========================================================================

    /// Component type registry of this manager.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ComponentTypeRegistry {
        &self.registry
    }

    #[inline]
    pub(crate) fn registry_mut(&mut self) -> &mut ComponentTypeRegistry {
        &mut self.registry
    }

    /// Registers `T` with heap storage, fixing its index.
    ///
    /// # Errors
    ///
    /// Fails if `T` already has an index.
    pub fn register_component<T: Component>(&mut self) -> EcsResult<ComponentType> {
        self.registry.register::<T>()
    }

    /// Registers `T` with pooled storage built from `T::default`.
    ///
    /// # Errors
    ///
    /// Fails if `T` already has an index: pooling must be decided before
    /// the first use of the type.
    pub fn register_pooled_component<T>(&mut self, config: PoolConfig) -> EcsResult<ComponentType>
    where
        T: Component + Poolable + Default,
    {
        self.register_pooled_component_with(config, T::default)
    }

    /// Registers `T` with pooled storage built from `factory`.
    ///
    /// # Errors
    ///
    /// Fails if `T` already has an index.
    pub fn register_pooled_component_with<T, F>(
        &mut self,
        config: PoolConfig,
        factory: F,
    ) -> EcsResult<ComponentType>
    where
        T: Component + Poolable,
        F: FnMut() -> T + 'static,
    {
        let component_type = self.registry.register_with::<T>(true)?;
        let storage: Box<dyn AnyStorage> = Box::new(ComponentStorage::<T>::pooled(config, factory));
        self.ensure_storage_slot(component_type.index());
        self.storages[component_type.index()] = Some(storage);
        tracing::debug!(
            component = component_type.type_name(),
            capacity = config.capacity,
            policy = ?config.policy,
            "pooled component registered"
        );
        Ok(component_type)
    }

    /// Occupancy of `T`'s pool, `None` if `T` is not pooled.
    #[must_use]
    pub fn pool_stats<T: Component>(&self) -> Option<PoolStats> {
        let component_type = self.registry.get::<T>()?;
        self.storages.get(component_type.index())?.as_ref()?.pool_stats()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity, reusing a destroyed entity's index if one is free.
    ///
    /// The entity is queued for refresh; systems see it after the next
    /// refresh pass.
    pub fn create_entity(&mut self) -> Entity {
        let Some(handle) = self.records.acquire() else {
            tracing::warn!("entity pool refused to hand out a record");
            return Entity::NULL;
        };
        let entity = Entity::from_handle(handle);
        let unique_id = self.next_unique_id;
        self.next_unique_id += 1;

        if let Some(record) = self.records.get_mut(handle) {
            record.unique_id = unique_id;
            record.enabled = true;
            record.waiting_to_be_added = true;
        }
        self.by_unique_id.insert(unique_id, entity);
        self.total_created += 1;
        self.enqueue_refresh(entity);

        tracing::trace!(%entity, unique_id, "entity created");
        entity
    }

    /// Checks whether `entity` refers to a live entity.
    ///
    /// Entities marked for removal stay alive until the next refresh pass.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.record(entity).is_some()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.records.in_use_count()
    }

    /// Iterates over live entities, oldest first.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.records
            .iter_in_use()
            .map(|(handle, _)| Entity::from_handle(handle))
    }

    /// Marks `entity` for destruction at the end of the next refresh pass.
    ///
    /// Returns `false` for dead handles and entities already marked.
    pub fn mark_for_removal(&mut self, entity: Entity) -> bool {
        let Some(record) = self.record_mut(entity) else {
            return false;
        };
        if record.waiting_to_be_removed {
            return false;
        }
        record.waiting_to_be_removed = true;
        self.enqueue_refresh(entity);
        true
    }

    /// Alias of [`mark_for_removal`](Self::mark_for_removal).
    #[inline]
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.mark_for_removal(entity)
    }

    /// Checks whether `entity` is waiting to be destroyed.
    #[must_use]
    pub fn is_marked_for_removal(&self, entity: Entity) -> bool {
        self.record(entity).is_some_and(|record| record.waiting_to_be_removed)
    }

    /// Checks whether `entity` has not been through a refresh pass yet.
    #[must_use]
    pub fn is_waiting_to_be_added(&self, entity: Entity) -> bool {
        self.record(entity).is_some_and(|record| record.waiting_to_be_added)
    }

    /// Enables or disables `entity`. Disabled entities stay tracked by
    /// interested systems but leave their active sets.
    ///
    /// Returns `false` for dead handles.
    pub fn set_enabled(&mut self, entity: Entity, enabled: bool) -> bool {
        let Some(record) = self.record_mut(entity) else {
            return false;
        };
        if record.enabled != enabled {
            record.enabled = enabled;
            self.enqueue_refresh(entity);
        }
        true
    }

    /// Checks whether `entity` is alive and enabled.
    #[must_use]
    pub fn is_enabled(&self, entity: Entity) -> bool {
        self.record(entity).is_some_and(|record| record.enabled)
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches a `T` to `entity`, or returns the one already attached.
    ///
    /// Pooled types take a recycled instance from their pool. Returns `None`
    /// for dead handles and when a `ReturnNull` pool is exhausted.
    pub fn attach<T: Component + Default>(&mut self, entity: Entity) -> Option<&mut T> {
        self.place(entity, Fill::Default(T::default))
    }

    /// Attaches `value` to `entity`, replacing any current `T`.
    ///
    /// Returns `None` for dead handles and when a `ReturnNull` pool is
    /// exhausted.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Option<&mut T> {
        self.place(entity, Fill::Value(value))
    }

    fn place<T: Component>(&mut self, entity: Entity, fill: Fill<T>) -> Option<&mut T> {
        self.record(entity)?;
        let component_type = self.registry.type_for::<T>();
        let index = component_type.index();

        let placed = self.storage_or_insert::<T>(index)?.place(entity, fill);
        let evicted = match placed {
            Ok(evicted) => evicted,
            Err(_) => {
                tracing::trace!(%entity, component = component_type.type_name(), "component pool exhausted");
                return None;
            }
        };

        if let Some(owner) = evicted {
            self.clear_component_bit(owner, index);
            tracing::debug!(
                %owner,
                component = component_type.type_name(),
                "pooled component evicted from its owner"
            );
        }

        if self.pending_lookup.remove(&(entity, index)) {
            self.pending_removals
                .retain(|&(pending, pending_type)| pending != entity || pending_type.index() != index);
        }
        if let Some(record) = self.record_mut(entity) {
            record.component_bits.insert(index);
        }
        self.enqueue_refresh(entity);

        self.typed_storage_mut::<T>(index)?.get_mut(entity.slot())
    }

    /// Requests removal of `entity`'s `T`.
    ///
    /// Nothing changes until [`remove_marked_components`](Self::remove_marked_components)
    /// runs. Repeated requests are merged. Returns `true` if a removal is
    /// pending afterwards.
    pub fn detach<T: Component>(&mut self, entity: Entity) -> bool {
        let Some(component_type) = self.registry.get::<T>() else {
            return false;
        };
        let attached = self
            .record(entity)
            .is_some_and(|record| record.component_bits.contains(component_type.index()));
        if !attached {
            return false;
        }
        if self.pending_lookup.insert((entity, component_type.index())) {
            self.pending_removals.push((entity, component_type));
        }
        true
    }

    /// Removes every component recorded by [`detach`](Self::detach).
    ///
    /// Pooled values go back to their pools. Returns the number of
    /// components removed.
    pub fn remove_marked_components(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_removals);
        self.pending_lookup.clear();

        let mut removed = 0;
        for (entity, component_type) in pending {
            if self.record(entity).is_none() {
                continue;
            }
            let index = component_type.index();
            if let Some(storage) = self.storages.get_mut(index).and_then(Option::as_mut) {
                storage.remove(entity.slot());
            }
            if self.clear_component_bit(entity, index) {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::trace!(removed, "marked components removed");
        }
        removed
    }

    /// Borrows `entity`'s `T`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.record(entity)?;
        let index = self.registry.get::<T>()?.index();
        self.storages
            .get(index)?
            .as_ref()?
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()?
            .get(entity.slot())
    }

    /// Mutably borrows `entity`'s `T`.
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.record(entity)?;
        let index = self.registry.get::<T>()?.index();
        self.typed_storage_mut::<T>(index)?.get_mut(entity.slot())
    }

    /// Checks whether `entity` has a `T` attached.
    #[must_use]
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        match (self.registry.get::<T>(), self.record(entity)) {
            (Some(component_type), Some(record)) => {
                record.component_bits.contains(component_type.index())
            }
            _ => false,
        }
    }

    /// Borrows several components of `entity` at once.
    #[must_use]
    pub fn query<Q: ComponentQuery>(&self, entity: Entity) -> Option<Q::Item<'_>> {
        Q::fetch(self, entity)
    }

    /// Types currently attached to `entity`, one bit per type index.
    #[must_use]
    pub fn component_bits(&self, entity: Entity) -> Option<&BitVector> {
        self.record(entity).map(|record| &record.component_bits)
    }

    /// Systems currently tracking `entity`, one bit per system id.
    #[must_use]
    pub fn system_bits(&self, entity: Entity) -> Option<&BitVector> {
        self.record(entity).map(|record| &record.system_bits)
    }

    // =========================================================================
    // Names, groups and identifiers
    // =========================================================================

    /// Names `entity`. Names are unique: if another entity holds `name`, it
    /// loses it.
    ///
    /// Returns `false` for dead handles.
    pub fn set_name(&mut self, entity: Entity, name: impl Into<String>) -> bool {
        if self.record(entity).is_none() {
            return false;
        }
        let name = name.into();
        self.clear_name(entity);

        if let Some(previous) = self.names.insert(name.clone(), entity) {
            tracing::debug!(%previous, %entity, name = %name, "entity name reassigned");
            if let Some(record) = self.record_mut(previous) {
                record.name = None;
            }
        }
        if let Some(record) = self.record_mut(entity) {
            record.name = Some(name);
        }
        true
    }

    /// Removes `entity`'s name, returning it.
    pub fn clear_name(&mut self, entity: Entity) -> Option<String> {
        let name = self.record_mut(entity)?.name.take()?;
        self.names.remove(&name);
        Some(name)
    }

    /// Name of `entity`.
    #[must_use]
    pub fn name(&self, entity: Entity) -> Option<&str> {
        self.record(entity)?.name.as_deref()
    }

    /// Entity named `name`.
    #[must_use]
    pub fn entity_by_name(&self, name: &str) -> Option<Entity> {
        self.names.get(name).copied()
    }

    /// Moves `entity` into `group`, leaving its previous group.
    ///
    /// Returns `false` for dead handles.
    pub fn set_group(&mut self, entity: Entity, group: impl Into<String>) -> bool {
        if self.record(entity).is_none() {
            return false;
        }
        let group = group.into();
        self.clear_group(entity);
        self.groups.entry(group.clone()).or_default().add(entity);
        if let Some(record) = self.record_mut(entity) {
            record.group = Some(group);
        }
        true
    }

    /// Removes `entity` from its group, returning the group name.
    pub fn clear_group(&mut self, entity: Entity) -> Option<String> {
        let group = self.record_mut(entity)?.group.take()?;
        if let Some(members) = self.groups.get_mut(&group) {
            members.remove(&entity);
            if members.is_empty() {
                self.groups.remove(&group);
            }
        }
        Some(group)
    }

    /// Group of `entity`.
    #[must_use]
    pub fn group(&self, entity: Entity) -> Option<&str> {
        self.record(entity)?.group.as_deref()
    }

    /// Members of `group`, in no particular order.
    #[must_use]
    pub fn entities_in_group(&self, group: &str) -> &[Entity] {
        self.groups.get(group).map(Bag::as_slice).unwrap_or_default()
    }

    /// Identifier of `entity`, never reused by this manager.
    #[must_use]
    pub fn unique_id(&self, entity: Entity) -> Option<u64> {
        self.record(entity).map(|record| record.unique_id)
    }

    /// Live entity with the given unique identifier.
    #[must_use]
    pub fn entity_by_unique_id(&self, unique_id: u64) -> Option<Entity> {
        self.by_unique_id.get(&unique_id).copied()
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Entities created since construction.
    #[inline]
    #[must_use]
    pub const fn total_created(&self) -> u64 {
        self.total_created
    }

    /// Entities destroyed since construction.
    #[inline]
    #[must_use]
    pub const fn total_removed(&self) -> u64 {
        self.total_removed
    }

    /// Entities waiting for the next refresh pass.
    #[inline]
    #[must_use]
    pub fn pending_refresh_count(&self) -> usize {
        self.refresh_queue.len()
    }

    /// Component removals waiting for the next removal pass.
    #[inline]
    #[must_use]
    pub fn pending_removal_count(&self) -> usize {
        self.pending_removals.len()
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Lets `systems` re-evaluate every queued entity, in queue order, then
    /// destroys entities marked for removal.
    ///
    /// Returns the number of entities refreshed.
    pub fn refresh(&mut self, systems: &mut SystemManager) -> usize {
        let mut queue = std::mem::take(&mut self.refresh_queue);
        let mut refreshed = 0;

        for &entity in &queue {
            let Some(record) = self.record_mut(entity) else {
                continue;
            };
            record.waiting_to_refresh = false;

            let system_bits = systems.refresh_entity(self, entity);

            let Some(record) = self.record_mut(entity) else {
                continue;
            };
            record.system_bits = system_bits;
            record.waiting_to_be_added = false;
            if record.waiting_to_be_removed {
                self.destroy_now(entity);
            }
            refreshed += 1;
        }

        // Systems only see the manager immutably, so nothing was queued
        // meanwhile; hand the allocation back.
        queue.clear();
        self.refresh_queue = queue;

        if refreshed > 0 {
            tracing::trace!(refreshed, "refresh pass complete");
        }
        refreshed
    }

    fn destroy_now(&mut self, entity: Entity) {
        let Some(record) = self.record_mut(entity) else {
            return;
        };
        let component_bits = std::mem::take(&mut record.component_bits);
        let unique_id = record.unique_id;

        for index in &component_bits {
            if let Some(storage) = self.storages.get_mut(index).and_then(Option::as_mut) {
                storage.remove(entity.slot());
            }
        }
        self.clear_name(entity);
        self.clear_group(entity);
        self.by_unique_id.remove(&unique_id);

        self.records.release(entity.handle());
        self.total_removed += 1;
        tracing::debug!(%entity, unique_id, "entity destroyed");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    pub(crate) fn record(&self, entity: Entity) -> Option<&EntityRecord> {
        if entity.is_null() {
            return None;
        }
        self.records.get(entity.handle())
    }

    fn record_mut(&mut self, entity: Entity) -> Option<&mut EntityRecord> {
        if entity.is_null() {
            return None;
        }
        self.records.get_mut(entity.handle())
    }

    fn enqueue_refresh(&mut self, entity: Entity) {
        if let Some(record) = self.record_mut(entity) {
            if !record.waiting_to_refresh {
                record.waiting_to_refresh = true;
                self.refresh_queue.push(entity);
            }
        }
    }

    /// Clears a component bit and queues the entity. Returns `false` if the
    /// bit was not set.
    fn clear_component_bit(&mut self, entity: Entity, index: usize) -> bool {
        let cleared = self
            .record_mut(entity)
            .is_some_and(|record| record.component_bits.remove(index));
        if cleared {
            self.enqueue_refresh(entity);
        }
        cleared
    }

    fn ensure_storage_slot(&mut self, index: usize) {
        if index >= self.storages.len() {
            self.storages.resize_with(index + 1, || None);
        }
    }

    fn storage_or_insert<T: Component>(&mut self, index: usize) -> Option<&mut ComponentStorage<T>> {
        self.ensure_storage_slot(index);
        self.storages[index]
            .get_or_insert_with(|| Box::new(ComponentStorage::<T>::dense()) as Box<dyn AnyStorage>)
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
    }

    fn typed_storage_mut<T: Component>(&mut self, index: usize) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(index)?
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Position(i32, i32);

    #[derive(Debug, Default, PartialEq)]
    struct Velocity(i32, i32);

    #[derive(Debug, Default, PartialEq)]
    struct Bullet {
        damage: u32,
    }

    impl Poolable for Bullet {
        fn on_return(&mut self) {
            self.damage = 0;
        }
    }

    fn flush(entities: &mut EntityManager) {
        let mut systems = SystemManager::new();
        entities.remove_marked_components();
        entities.refresh(&mut systems);
    }

    #[test]
    fn test_create_assigns_sequential_indices() {
        let mut entities = EntityManager::new();
        let created: Vec<u32> = (0..4).map(|_| entities.create_entity().index()).collect();
        assert_eq!(created, vec![0, 1, 2, 3]);
        assert_eq!(entities.entity_count(), 4);
        assert_eq!(entities.pending_refresh_count(), 4);
    }

    #[test]
    fn test_destroyed_index_is_reused() {
        let mut entities = EntityManager::new();
        let created: Vec<Entity> = (0..5).map(|_| entities.create_entity()).collect();
        flush(&mut entities);

        assert!(entities.mark_for_removal(created[3]));
        flush(&mut entities);
        assert!(!entities.is_alive(created[3]));

        let reused = entities.create_entity();
        assert_eq!(reused.index(), 3);
        assert_ne!(reused, created[3]);
        assert!(entities.get::<Position>(created[3]).is_none());
        assert_eq!(entities.total_removed(), 1);
        assert_eq!(entities.total_created(), 6);
    }

    #[test]
    fn test_attach_and_insert() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();

        entities.attach::<Position>(entity).unwrap().0 = 5;
        assert_eq!(entities.get::<Position>(entity), Some(&Position(5, 0)));

        // Attaching again keeps the current value, inserting replaces it
        entities.attach::<Position>(entity);
        assert_eq!(entities.get::<Position>(entity), Some(&Position(5, 0)));
        entities.insert(entity, Position(1, 1));
        assert_eq!(entities.get::<Position>(entity), Some(&Position(1, 1)));

        assert!(entities.has::<Position>(entity));
        assert!(!entities.has::<Velocity>(entity));
        let position = entities.registry().get::<Position>().unwrap();
        assert!(entities.component_bits(entity).unwrap().contains(position.index()));
    }

    #[test]
    fn test_detach_is_deferred() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        entities.insert(entity, Velocity(2, 3));

        assert!(entities.detach::<Velocity>(entity));
        assert!(entities.detach::<Velocity>(entity));
        assert_eq!(entities.pending_removal_count(), 1);
        assert_eq!(entities.get::<Velocity>(entity), Some(&Velocity(2, 3)));
        assert!(entities.has::<Velocity>(entity));

        assert_eq!(entities.remove_marked_components(), 1);
        assert_eq!(entities.get::<Velocity>(entity), None);
        assert!(!entities.has::<Velocity>(entity));
        assert_eq!(entities.pending_removal_count(), 0);
    }

    #[test]
    fn test_detach_missing_component() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        assert!(!entities.detach::<Velocity>(entity));
        entities.insert(entity, Position(0, 0));
        assert!(!entities.detach::<Velocity>(entity));
        assert!(!entities.detach::<Position>(Entity::NULL));
        assert_eq!(entities.pending_removal_count(), 0);
    }

    #[test]
    fn test_attach_cancels_pending_removal() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        entities.insert(entity, Position(1, 2));
        assert!(entities.detach::<Position>(entity));

        entities.insert(entity, Position(3, 4));
        assert_eq!(entities.pending_removal_count(), 0);
        assert_eq!(entities.remove_marked_components(), 0);
        assert_eq!(entities.get::<Position>(entity), Some(&Position(3, 4)));
    }

    #[test]
    fn test_null_and_stale_handles_are_ignored() {
        let mut entities = EntityManager::new();
        assert!(entities.insert(Entity::NULL, Position(0, 0)).is_none());
        assert!(!entities.mark_for_removal(Entity::NULL));
        assert!(!entities.set_enabled(Entity::NULL, false));
        assert!(!entities.set_name(Entity::NULL, "ghost"));

        let entity = entities.create_entity();
        let stale = Entity::new(entity.index(), entity.generation() + 1);
        assert!(entities.attach::<Position>(stale).is_none());
        assert!(!entities.is_alive(stale));
    }

    #[test]
    fn test_mark_for_removal_is_idempotent() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        flush(&mut entities);

        assert!(entities.destroy(entity));
        assert!(!entities.mark_for_removal(entity));
        assert!(entities.is_alive(entity));
        assert!(entities.is_marked_for_removal(entity));
        assert_eq!(entities.pending_refresh_count(), 1);

        flush(&mut entities);
        assert_eq!(entities.entity_count(), 0);
    }

    #[test]
    fn test_refresh_queue_is_deduplicated() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        entities.insert(entity, Position(0, 0));
        entities.insert(entity, Velocity(0, 0));
        entities.set_enabled(entity, false);
        assert_eq!(entities.pending_refresh_count(), 1);

        assert!(entities.is_waiting_to_be_added(entity));
        flush(&mut entities);
        assert!(!entities.is_waiting_to_be_added(entity));
        assert_eq!(entities.pending_refresh_count(), 0);
    }

    #[test]
    fn test_enabled_state() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        flush(&mut entities);
        assert!(entities.is_enabled(entity));

        assert!(entities.set_enabled(entity, true));
        assert_eq!(entities.pending_refresh_count(), 0);
        assert!(entities.set_enabled(entity, false));
        assert!(!entities.is_enabled(entity));
        assert_eq!(entities.pending_refresh_count(), 1);
    }

    #[test]
    fn test_names_are_unique() {
        let mut entities = EntityManager::new();
        let first = entities.create_entity();
        let second = entities.create_entity();

        assert!(entities.set_name(first, "boss"));
        assert_eq!(entities.entity_by_name("boss"), Some(first));
        assert!(entities.set_name(second, "boss"));
        assert_eq!(entities.entity_by_name("boss"), Some(second));
        assert_eq!(entities.name(first), None);

        entities.set_name(second, "miniboss");
        assert_eq!(entities.entity_by_name("boss"), None);
        assert_eq!(entities.name(second), Some("miniboss"));
    }

    #[test]
    fn test_groups() {
        let mut entities = EntityManager::new();
        let a = entities.create_entity();
        let b = entities.create_entity();
        entities.set_group(a, "enemies");
        entities.set_group(b, "enemies");
        assert_eq!(entities.entities_in_group("enemies").len(), 2);

        entities.set_group(a, "allies");
        assert_eq!(entities.entities_in_group("enemies"), &[b]);
        assert_eq!(entities.group(a), Some("allies"));
        assert!(entities.entities_in_group("nobody").is_empty());
    }

    #[test]
    fn test_destroy_clears_associations() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        entities.set_name(entity, "crate");
        entities.set_group(entity, "props");
        entities.insert(entity, Position(0, 0));
        let unique_id = entities.unique_id(entity).unwrap();
        assert_eq!(entities.entity_by_unique_id(unique_id), Some(entity));

        entities.mark_for_removal(entity);
        flush(&mut entities);

        assert_eq!(entities.entity_by_name("crate"), None);
        assert!(entities.entities_in_group("props").is_empty());
        assert_eq!(entities.entity_by_unique_id(unique_id), None);

        // Unique ids are never reused even when the index is
        let next = entities.create_entity();
        assert_eq!(next.index(), entity.index());
        assert_ne!(entities.unique_id(next), Some(unique_id));
    }

    #[test]
    fn test_pooled_component_returns_on_removal() {
        let mut entities = EntityManager::new();
        entities
            .register_pooled_component::<Bullet>(PoolConfig::new(4, ResizePolicy::ReturnNull))
            .unwrap();

        let entity = entities.create_entity();
        entities.attach::<Bullet>(entity).unwrap().damage = 12;
        assert_eq!(entities.pool_stats::<Bullet>().unwrap().in_use, 1);

        entities.detach::<Bullet>(entity);
        entities.remove_marked_components();
        let stats = entities.pool_stats::<Bullet>().unwrap();
        assert_eq!((stats.in_use, stats.free), (0, 1));

        // The recycled bullet was reset by its return hook
        assert_eq!(entities.attach::<Bullet>(entity), Some(&mut Bullet { damage: 0 }));
        assert_eq!(entities.pool_stats::<Position>(), None);
    }

    #[test]
    fn test_return_null_pool_exhaustion() {
        let mut entities = EntityManager::new();
        entities
            .register_pooled_component::<Bullet>(PoolConfig::new(1, ResizePolicy::ReturnNull))
            .unwrap();

        let first = entities.create_entity();
        let second = entities.create_entity();
        assert!(entities.attach::<Bullet>(first).is_some());
        assert!(entities.attach::<Bullet>(second).is_none());
        assert!(!entities.has::<Bullet>(second));
    }

    #[test]
    fn test_kill_existing_evicts_oldest_owner() {
        let mut entities = EntityManager::new();
        entities
            .register_pooled_component::<Bullet>(PoolConfig::new(1, ResizePolicy::KillExisting))
            .unwrap();

        let first = entities.create_entity();
        let second = entities.create_entity();
        entities.insert(first, Bullet { damage: 1 });
        flush(&mut entities);

        entities.insert(second, Bullet { damage: 2 });
        assert!(!entities.has::<Bullet>(first));
        assert_eq!(entities.get::<Bullet>(first), None);
        assert_eq!(entities.get::<Bullet>(second), Some(&Bullet { damage: 2 }));
        assert_eq!(entities.pending_refresh_count(), 2);
    }

    #[test]
    fn test_pooled_registration_after_use_fails() {
        let mut entities = EntityManager::new();
        let entity = entities.create_entity();
        entities.insert(entity, Bullet { damage: 1 });
        assert!(entities
            .register_pooled_component::<Bullet>(PoolConfig::default())
            .is_err());
    }

    #[test]
    fn test_entities_iterates_oldest_first() {
        let mut entities = EntityManager::new();
        let created: Vec<Entity> = (0..3).map(|_| entities.create_entity()).collect();
        assert_eq!(entities.entities().collect::<Vec<_>>(), created);
    }
}
