//! # World
//!
//! Ties the entity manager, the scheduler and the templates together behind
//! the two calls the host loop makes every frame:
//!
//! ```text
//! update(time)  →  remove marked components → refresh → Update layers
//! draw(time)    →  remove marked components → refresh → Draw layers
//! ```

use tessera_core::{PoolConfig, Poolable};

use crate::component::{Component, ComponentType, ComponentTypeRegistry};
use crate::config::WorldConfig;
use crate::entity::Entity;
use crate::error::EcsResult;
use crate::manager::EntityManager;
use crate::scheduler::SystemManager;
use crate::system::{GamePhase, System, SystemId, SystemOptions};
use crate::template::{EntityTemplate, TemplateRegistry};
use crate::time::GameTime;

/// Counts reported by [`World::flush`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushStats {
    /// Components removed by the removal pass.
    pub components_removed: usize,
    /// Entities re-evaluated by the refresh pass.
    pub entities_refreshed: usize,
}

/// A self-contained ECS instance.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tessera_ecs::{AspectBuilder, GameTime, System, SystemContext, SystemOptions, World};
///
/// #[derive(Default)]
/// struct Lifetime(f32);
///
/// struct Expire;
///
/// impl System for Expire {
///     fn aspect(&self) -> AspectBuilder {
///         AspectBuilder::new().all::<(Lifetime,)>()
///     }
///
///     fn process(&mut self, ctx: &mut SystemContext<'_>) {
///         let dt = ctx.time.elapsed_secs();
///         for &entity in ctx.active {
///             let Some(lifetime) = ctx.entities.get_mut::<Lifetime>(entity) else {
///                 continue;
///             };
///             lifetime.0 -= dt;
///             if lifetime.0 <= 0.0 {
///                 ctx.entities.mark_for_removal(entity);
///             }
///         }
///     }
/// }
///
/// let mut world = World::builder()
///     .with_system(Expire, SystemOptions::update())
///     .build()
///     .unwrap();
///
/// let spark = world.create_entity();
/// world.entities_mut().insert(spark, Lifetime(0.01));
///
/// let mut time = GameTime::default();
/// world.update(time.advance(Duration::from_millis(16)));
/// assert!(world.entities().is_marked_for_removal(spark));
/// world.update(time.advance(Duration::from_millis(16)));
/// assert!(!world.entities().is_alive(spark));
/// ```
pub struct World {
    entities: EntityManager,
    systems: SystemManager,
    templates: TemplateRegistry,
    frame: u64,
}

impl World {
    /// Creates an empty world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&WorldConfig::default())
    }

    /// Creates an empty world.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        Self {
            entities: EntityManager::with_capacity(config.entity_capacity),
            systems: SystemManager::new(),
            templates: TemplateRegistry::new(),
            frame: 0,
        }
    }

    /// Starts a [`WorldBuilder`] with the default configuration.
    #[must_use]
    pub fn builder() -> WorldBuilder {
        WorldBuilder::new(WorldConfig::default())
    }

    /// Entity manager.
    #[inline]
    #[must_use]
    pub const fn entities(&self) -> &EntityManager {
        &self.entities
    }

    /// Entity manager, mutably.
    #[inline]
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    /// Scheduler.
    #[inline]
    #[must_use]
    pub const fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// Scheduler, mutably (e.g. to reach a system through
    /// [`SystemManager::get_mut`]).
    #[inline]
    pub fn systems_mut(&mut self) -> &mut SystemManager {
        &mut self.systems
    }

    /// Component type registry.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ComponentTypeRegistry {
        self.entities.registry()
    }

    /// Templates.
    #[inline]
    #[must_use]
    pub const fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Number of completed `update` calls.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Registers a system.
    ///
    /// # Errors
    ///
    /// See [`SystemManager::add_system`].
    pub fn add_system<S: System>(&mut self, system: S, options: SystemOptions) -> EcsResult<SystemId> {
        self.add_boxed_system(Box::new(system), options)
    }

    /// Registers an already boxed system.
    ///
    /// # Errors
    ///
    /// See [`SystemManager::add_system`].
    pub fn add_boxed_system(&mut self, system: Box<dyn System>, options: SystemOptions) -> EcsResult<SystemId> {
        self.systems
            .add_system(system, options, self.entities.registry_mut())
    }

    /// Registers a template under `name`.
    ///
    /// # Errors
    ///
    /// Fails if the name is taken.
    pub fn register_template<T>(&mut self, name: impl Into<String>, template: T) -> EcsResult<()>
    where
        T: EntityTemplate + 'static,
    {
        self.templates.register(name, Box::new(template))
    }

    /// Creates an empty entity.
    pub fn create_entity(&mut self) -> Entity {
        self.entities.create_entity()
    }

    /// Creates an entity from the template named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::TemplateNotFound`](crate::EcsError::TemplateNotFound)
    /// if no template has that name.
    pub fn create_entity_from_template(&mut self, name: &str) -> EcsResult<Entity> {
        self.templates.create(name, &mut self.entities)
    }

    /// Applies pending structural changes without running systems.
    pub fn flush(&mut self) -> FlushStats {
        let components_removed = self.entities.remove_marked_components();
        let entities_refreshed = self.entities.refresh(&mut self.systems);
        FlushStats {
            components_removed,
            entities_refreshed,
        }
    }

    /// Runs the Update phase.
    pub fn update(&mut self, time: GameTime) {
        self.run_phase(GamePhase::Update, time);
        self.frame += 1;
    }

    /// Runs the Draw phase.
    pub fn draw(&mut self, time: GameTime) {
        self.run_phase(GamePhase::Draw, time);
    }

    fn run_phase(&mut self, phase: GamePhase, time: GameTime) {
        let stats = self.flush();
        tracing::trace!(
            ?phase,
            removed = stats.components_removed,
            refreshed = stats.entities_refreshed,
            "processing phase"
        );
        self.systems.process(phase, &mut self.entities, time);
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

type ComponentRegistration = Box<dyn FnOnce(&mut EntityManager) -> EcsResult<ComponentType>>;

/// Startup configuration of a [`World`].
///
/// Components are registered first, in the order given, then systems, then
/// templates, so component indices do not depend on aspect declarations.
pub struct WorldBuilder {
    config: WorldConfig,
    components: Vec<ComponentRegistration>,
    systems: Vec<(Box<dyn System>, SystemOptions)>,
    templates: Vec<(String, Box<dyn EntityTemplate>)>,
}

impl WorldBuilder {
    /// Starts a builder from `config`.
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            config,
            components: Vec::new(),
            systems: Vec::new(),
            templates: Vec::new(),
        }
    }

    /// Registers `T` with heap storage.
    #[must_use]
    pub fn with_component<T: Component>(mut self) -> Self {
        self.components
            .push(Box::new(EntityManager::register_component::<T>));
        self
    }

    /// Registers `T` with pooled storage.
    #[must_use]
    pub fn with_pooled_component<T>(mut self, pool: PoolConfig) -> Self
    where
        T: Component + Poolable + Default,
    {
        self.components
            .push(Box::new(move |entities: &mut EntityManager| {
                entities.register_pooled_component::<T>(pool)
            }));
        self
    }

    /// Registers `T` with pooled storage using the configured default pool.
    #[must_use]
    pub fn with_default_pooled_component<T>(self) -> Self
    where
        T: Component + Poolable + Default,
    {
        let pool = self.config.default_pool;
        self.with_pooled_component::<T>(pool)
    }

    /// Adds a system.
    #[must_use]
    pub fn with_system<S: System>(mut self, system: S, options: SystemOptions) -> Self {
        let system: Box<dyn System> = Box::new(system);
        self.systems.push((system, options));
        self
    }

    /// Adds a template.
    #[must_use]
    pub fn with_template<T>(mut self, name: impl Into<String>, template: T) -> Self
    where
        T: EntityTemplate + 'static,
    {
        let template: Box<dyn EntityTemplate> = Box::new(template);
        self.templates.push((name.into(), template));
        self
    }

    /// Builds the world.
    ///
    /// # Errors
    ///
    /// Returns the first registration error: a component registered twice,
    /// a duplicate or asynchronous system, or a duplicate template name.
    pub fn build(self) -> EcsResult<World> {
        let mut world = World::with_config(&self.config);

        for register in self.components {
            register(&mut world.entities)?;
        }
        for (system, options) in self.systems {
            world.add_boxed_system(system, options)?;
        }
        for (name, template) in self.templates {
            world.templates.register(name, template)?;
        }

        tracing::info!(
            components = world.registry().len(),
            systems = world.systems.system_count(),
            templates = world.templates.len(),
            entity_capacity = self.config.entity_capacity,
            "world built"
        );
        Ok(world)
    }
}
