//! # Tessera ECS
//!
//! Entity component system with bitmask aspect matching and deferred
//! structural changes.
//!
//! ## Architecture
//!
//! - **Components**: any `'static` type, indexed by a per-world registry
//! - **Aspects**: all / any / none component masks declared by systems
//! - **Entity manager**: entities, components, deferred removal and refresh
//! - **Scheduler**: layered systems for the Update and Draw phases
//!
//! ## Frame
//!
//! Each `World::update` / `World::draw`:
//! 1. removes components detached since the last frame
//! 2. refreshes queued entities (systems gain or lose them, marked entities
//!    are destroyed)
//! 3. runs the phase's layers in ascending order, each system over its
//!    active set
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use tessera_ecs::{AspectBuilder, GameTime, System, SystemContext, SystemOptions, World};
//!
//! #[derive(Default)]
//! struct Position(f32);
//! #[derive(Default)]
//! struct Velocity(f32);
//!
//! struct Movement;
//!
//! impl System for Movement {
//!     fn aspect(&self) -> AspectBuilder {
//!         AspectBuilder::new().all::<(Position, Velocity)>()
//!     }
//!
//!     fn process(&mut self, ctx: &mut SystemContext<'_>) {
//!         let dt = ctx.time.elapsed_secs();
//!         for &entity in ctx.active {
//!             let speed = ctx.entities.get::<Velocity>(entity).map_or(0.0, |v| v.0);
//!             if let Some(position) = ctx.entities.get_mut::<Position>(entity) {
//!                 position.0 += speed * dt;
//!             }
//!         }
//!     }
//! }
//!
//! let mut world = World::new();
//! world.add_system(Movement, SystemOptions::update()).unwrap();
//!
//! let ship = world.create_entity();
//! world.entities_mut().insert(ship, Position(0.0));
//! world.entities_mut().insert(ship, Velocity(2.0));
//!
//! world.update(GameTime::from_elapsed(Duration::from_millis(500)));
//! assert_eq!(world.entities().get::<Position>(ship).map(|p| p.0), Some(1.0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod aspect;
pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod manager;
pub mod query;
pub mod scheduler;
pub mod system;
pub mod template;
pub mod time;
pub mod world;

mod storage;

pub use aspect::{Aspect, AspectBuilder};
pub use component::{Component, ComponentSet, ComponentType, ComponentTypeRegistry, TypeResolver};
pub use config::WorldConfig;
pub use entity::Entity;
pub use error::{EcsError, EcsResult};
pub use manager::EntityManager;
pub use query::ComponentQuery;
pub use scheduler::{SystemLayer, SystemManager};
pub use storage::PoolStats;
pub use system::{AsAny, ExecutionMode, GamePhase, System, SystemContext, SystemId, SystemOptions};
pub use template::{EntityTemplate, TemplateRegistry};
pub use time::GameTime;
pub use world::{FlushStats, World, WorldBuilder};

pub use tessera_core::{BitVector, PoolConfig, Poolable, ResizePolicy};
