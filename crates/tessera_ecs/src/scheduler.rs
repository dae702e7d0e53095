//! # System Scheduler
//!
//! Systems are grouped into layers, one sorted list of layers per phase:
//!
//! ```text
//! Update: [layer -1] → [layer 0] → [layer 5]
//!           sys A        sys B       sys D
//!                        sys C
//! Draw:   [layer 0]
//!           sys E
//! ```
//!
//! Layers run in ascending index order; systems within a layer run in
//! registration order. Each system iterates only its active set, which the
//! refresh pass keeps current, so no mask is evaluated while processing.

use std::time::Duration;

use tessera_core::{Bag, BitVector};

use crate::aspect::Aspect;
use crate::component::ComponentTypeRegistry;
use crate::entity::Entity;
use crate::error::{EcsError, EcsResult};
use crate::manager::EntityManager;
use crate::system::{ExecutionMode, GamePhase, System, SystemContext, SystemId, SystemOptions};
use crate::time::GameTime;

/// Systems of one phase sharing a layer index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemLayer {
    index: i32,
    systems: Vec<SystemId>,
}

impl SystemLayer {
    /// Layer index.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> i32 {
        self.index
    }

    /// Systems of the layer, in registration order.
    #[inline]
    #[must_use]
    pub fn systems(&self) -> &[SystemId] {
        &self.systems
    }
}

/// Enabled entities tracked by a system.
///
/// A bag plus a reverse index (entity index → bag slot) so both insertion and
/// removal are O(1).
#[derive(Debug, Default)]
struct ActiveSet {
    entities: Bag<Entity>,
    slots: Vec<Option<usize>>,
}

impl ActiveSet {
    fn contains(&self, entity: Entity) -> bool {
        self.slot_of(entity).is_some()
    }

    fn insert(&mut self, entity: Entity) -> bool {
        if self.contains(entity) {
            return false;
        }
        let index = entity.slot();
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(self.entities.add(entity));
        true
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slot_of(entity) else {
            return false;
        };
        self.slots[entity.slot()] = None;
        self.entities.remove_at(slot);
        // The last entity was swapped into the hole
        if let Some(&moved) = self.entities.get(slot) {
            self.slots[moved.slot()] = Some(slot);
        }
        true
    }

    fn slot_of(&self, entity: Entity) -> Option<usize> {
        let slot = (*self.slots.get(entity.slot())?)?;
        (self.entities.get(slot) == Some(&entity)).then_some(slot)
    }

    fn as_slice(&self) -> &[Entity] {
        self.entities.as_slice()
    }
}

struct SystemEntry {
    name: String,
    system: Box<dyn System>,
    aspect: Aspect,
    options: SystemOptions,
    active: ActiveSet,
    /// Time accumulated towards the processing delay.
    accumulated: Duration,
}

impl SystemEntry {
    fn run(&mut self, id: SystemId, entities: &mut EntityManager, time: GameTime) {
        if let Some(delay) = self.options.processing_delay.filter(|delay| !delay.is_zero()) {
            self.accumulated += time.elapsed;
            if self.accumulated <= delay {
                return;
            }
            // Remainder carries into the next window
            self.accumulated -= delay;
        }

        let mut ctx = SystemContext {
            entities,
            active: self.active.as_slice(),
            time,
            id,
        };
        self.system.begin(&mut ctx);
        self.system.process(&mut ctx);
        self.system.end(&mut ctx);
    }
}

/// Ordered collection of systems for both game-loop phases.
#[derive(Default)]
pub struct SystemManager {
    systems: Vec<SystemEntry>,
    update_layers: Vec<SystemLayer>,
    draw_layers: Vec<SystemLayer>,
}

impl SystemManager {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a system.
    ///
    /// Its aspect is resolved against `registry` now. Systems registered
    /// after entities exist only see them once they are refreshed again.
    ///
    /// # Errors
    ///
    /// - [`EcsError::SystemAlreadyRegistered`] if a system with the same name
    ///   is already registered
    /// - [`EcsError::UnsupportedExecutionMode`] for asynchronous systems
    pub fn add_system(
        &mut self,
        system: Box<dyn System>,
        options: SystemOptions,
        registry: &mut ComponentTypeRegistry,
    ) -> EcsResult<SystemId> {
        let name = system.name().to_owned();
        if self.systems.iter().any(|entry| entry.name == name) {
            return Err(EcsError::SystemAlreadyRegistered { name });
        }
        if options.execution == ExecutionMode::Asynchronous {
            return Err(EcsError::UnsupportedExecutionMode { name });
        }

        let id = SystemId(self.systems.len());
        let aspect = system.aspect().build(registry);

        let layers = match options.phase {
            GamePhase::Update => &mut self.update_layers,
            GamePhase::Draw => &mut self.draw_layers,
        };
        match layers.binary_search_by_key(&options.layer, SystemLayer::index) {
            Ok(position) => layers[position].systems.push(id),
            Err(position) => layers.insert(
                position,
                SystemLayer {
                    index: options.layer,
                    systems: vec![id],
                },
            ),
        }

        tracing::info!(
            system = %name,
            id = id.index(),
            phase = ?options.phase,
            layer = options.layer,
            "system registered"
        );
        self.systems.push(SystemEntry {
            name,
            system,
            aspect,
            options,
            active: ActiveSet::default(),
            accumulated: Duration::ZERO,
        });
        Ok(id)
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Layers of `phase`, in execution order.
    #[must_use]
    pub fn layers(&self, phase: GamePhase) -> &[SystemLayer] {
        match phase {
            GamePhase::Update => &self.update_layers,
            GamePhase::Draw => &self.draw_layers,
        }
    }

    /// Layer indices of `phase`, in execution order.
    #[must_use]
    pub fn layer_indices(&self, phase: GamePhase) -> Vec<i32> {
        self.layers(phase).iter().map(SystemLayer::index).collect()
    }

    /// Name of a system.
    #[must_use]
    pub fn name(&self, id: SystemId) -> Option<&str> {
        self.systems.get(id.index()).map(|entry| entry.name.as_str())
    }

    /// Resolved aspect of a system.
    #[must_use]
    pub fn aspect(&self, id: SystemId) -> Option<&Aspect> {
        self.systems.get(id.index()).map(|entry| &entry.aspect)
    }

    /// Scheduling options of a system.
    #[must_use]
    pub fn options(&self, id: SystemId) -> Option<&SystemOptions> {
        self.systems.get(id.index()).map(|entry| &entry.options)
    }

    /// Active set of a system.
    #[must_use]
    pub fn active_entities(&self, id: SystemId) -> Option<&[Entity]> {
        self.systems.get(id.index()).map(|entry| entry.active.as_slice())
    }

    /// Id of the system registered under `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<SystemId> {
        self.systems
            .iter()
            .position(|entry| entry.name == name)
            .map(SystemId)
    }

    /// Borrows a system as its concrete type.
    #[must_use]
    pub fn get<S: System>(&self, id: SystemId) -> Option<&S> {
        let system: &dyn System = self.systems.get(id.index())?.system.as_ref();
        system.as_any().downcast_ref::<S>()
    }

    /// Mutably borrows a system as its concrete type.
    pub fn get_mut<S: System>(&mut self, id: SystemId) -> Option<&mut S> {
        let system: &mut dyn System = self.systems.get_mut(id.index())?.system.as_mut();
        system.as_any_mut().downcast_mut::<S>()
    }

    /// Runs every system of `phase`, layer by layer.
    pub fn process(&mut self, phase: GamePhase, entities: &mut EntityManager, time: GameTime) {
        let layers = match phase {
            GamePhase::Update => &self.update_layers,
            GamePhase::Draw => &self.draw_layers,
        };
        for layer in layers {
            for &id in &layer.systems {
                self.systems[id.index()].run(id, entities, time);
            }
        }
    }

    /// Re-evaluates `entity` against every system, firing lifecycle hooks.
    ///
    /// Returns the entity's new system bits; the manager stores them once
    /// every system has been notified.
    pub(crate) fn refresh_entity(&mut self, entities: &EntityManager, entity: Entity) -> BitVector {
        let Some(record) = entities.record(entity) else {
            return BitVector::new();
        };
        let mut system_bits = record.system_bits.clone();

        for (index, entry) in self.systems.iter_mut().enumerate() {
            let interested = !record.waiting_to_be_removed && entry.aspect.matches(&record.component_bits);
            let member = system_bits.contains(index);
            let active = entry.active.contains(entity);

            match (interested, member) {
                (true, false) => {
                    system_bits.insert(index);
                    entry.system.on_entity_added(entity, entities);
                    if record.enabled && entry.active.insert(entity) {
                        entry.system.on_entity_enabled(entity, entities);
                    }
                }
                (false, true) => {
                    if entry.active.remove(entity) {
                        entry.system.on_entity_disabled(entity, entities);
                    }
                    system_bits.remove(index);
                    entry.system.on_entity_removed(entity, entities);
                }
                (true, true) => {
                    if record.enabled && !active {
                        entry.active.insert(entity);
                        entry.system.on_entity_enabled(entity, entities);
                    } else if !record.enabled && active {
                        entry.active.remove(entity);
                        entry.system.on_entity_disabled(entity, entities);
                    }
                }
                (false, false) => {}
            }
        }
        system_bits
    }
}
