//! # Systems
//!
//! A system declares an aspect and processes the entities matching it.
//!
//! The scheduler keeps each system's **active set** up to date through the
//! refresh pass and calls the lifecycle hooks as entities come and go:
//!
//! ```text
//! starts matching   → on_entity_added, then on_entity_enabled if enabled
//! stops matching    → on_entity_disabled if active, then on_entity_removed
//! enabled toggled   → on_entity_enabled / on_entity_disabled
//! ```
//!
//! Every frame, `begin`, `process` and `end` run in that order with the
//! active set in a [`SystemContext`].

use std::any::Any;
use std::time::Duration;

use crate::aspect::AspectBuilder;
use crate::entity::Entity;
use crate::manager::EntityManager;
use crate::query::ComponentQuery;
use crate::time::GameTime;

/// Game-loop phase a system runs in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Simulation step.
    #[default]
    Update,
    /// Presentation step.
    Draw,
}

/// How the scheduler runs a system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Sequentially, in registration order within the layer.
    #[default]
    Synchronous,
    /// Concurrently with the rest of the layer. Not supported; registering
    /// such a system fails.
    Asynchronous,
}

/// Scheduling options of a system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemOptions {
    /// Phase the system runs in.
    pub phase: GamePhase,
    /// Layers run in ascending order.
    pub layer: i32,
    /// Execution mode.
    pub execution: ExecutionMode,
    /// Minimum time between two runs, `None` to run every frame.
    pub processing_delay: Option<Duration>,
}

impl SystemOptions {
    /// Runs every update, in layer 0.
    #[must_use]
    pub const fn update() -> Self {
        Self {
            phase: GamePhase::Update,
            layer: 0,
            execution: ExecutionMode::Synchronous,
            processing_delay: None,
        }
    }

    /// Runs every draw, in layer 0.
    #[must_use]
    pub const fn draw() -> Self {
        Self {
            phase: GamePhase::Draw,
            ..Self::update()
        }
    }

    /// Sets the layer.
    #[must_use]
    pub const fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    /// Throttles the system to at most one run per `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = Some(delay);
        self
    }

    /// Sets the execution mode.
    #[must_use]
    pub const fn with_execution(mut self, execution: ExecutionMode) -> Self {
        self.execution = execution;
        self
    }
}

/// Identifier of a registered system, also its bit in entity system masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemId(pub(crate) usize);

impl SystemId {
    /// Registration index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// What a system sees while processing.
pub struct SystemContext<'a> {
    /// Entity manager, for component access and deferred changes.
    pub entities: &'a mut EntityManager,
    /// Enabled entities matching the system's aspect, in no particular order.
    pub active: &'a [Entity],
    /// Frame time.
    pub time: GameTime,
    /// The running system.
    pub id: SystemId,
}

impl SystemContext<'_> {
    /// Calls `f` with a view of `Q` for every active entity holding all of
    /// `Q`'s components.
    pub fn for_each<Q, F>(&self, mut f: F)
    where
        Q: ComponentQuery,
        F: FnMut(Entity, Q::Item<'_>),
    {
        for (entity, item) in self.query::<Q>() {
            f(entity, item);
        }
    }

    /// Iterates over the active entities holding all of `Q`'s components.
    pub fn query<Q: ComponentQuery>(&self) -> impl Iterator<Item = (Entity, Q::Item<'_>)> + '_ {
        let entities: &EntityManager = self.entities;
        self.active
            .iter()
            .filter_map(move |&entity| Q::fetch(entities, entity).map(|item| (entity, item)))
    }
}

/// Downcast support for boxed systems.
pub trait AsAny: Any {
    /// Upcasts to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Upcasts to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A processing unit bound to one aspect.
///
/// # Example
///
/// ```rust
/// use tessera_ecs::{AspectBuilder, System, SystemContext};
///
/// #[derive(Default)]
/// struct Position(f32);
/// #[derive(Default)]
/// struct Velocity(f32);
///
/// struct Movement;
///
/// impl System for Movement {
///     fn aspect(&self) -> AspectBuilder {
///         AspectBuilder::new().all::<(Position, Velocity)>()
///     }
///
///     fn process(&mut self, ctx: &mut SystemContext<'_>) {
///         let dt = ctx.time.elapsed_secs();
///         for &entity in ctx.active {
///             let speed = ctx.entities.get::<Velocity>(entity).map_or(0.0, |v| v.0);
///             if let Some(position) = ctx.entities.get_mut::<Position>(entity) {
///                 position.0 += speed * dt;
///             }
///         }
///     }
/// }
/// ```
pub trait System: AsAny {
    /// Name used in diagnostics and to detect double registration.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Component filter, resolved once at registration.
    fn aspect(&self) -> AspectBuilder {
        AspectBuilder::new()
    }

    /// The entity started matching the aspect.
    fn on_entity_added(&mut self, _entity: Entity, _entities: &EntityManager) {}

    /// The entity stopped matching the aspect or is being destroyed.
    fn on_entity_removed(&mut self, _entity: Entity, _entities: &EntityManager) {}

    /// The entity entered the active set.
    fn on_entity_enabled(&mut self, _entity: Entity, _entities: &EntityManager) {}

    /// The entity left the active set.
    fn on_entity_disabled(&mut self, _entity: Entity, _entities: &EntityManager) {}

    /// Runs before [`process`](Self::process).
    fn begin(&mut self, _ctx: &mut SystemContext<'_>) {}

    /// Processes the active set.
    fn process(&mut self, ctx: &mut SystemContext<'_>);

    /// Runs after [`process`](Self::process).
    fn end(&mut self, _ctx: &mut SystemContext<'_>) {}
}
