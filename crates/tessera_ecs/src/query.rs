//! # Component Queries
//!
//! Read-only views over several components of one entity at once.
//!
//! ```rust
//! use tessera_ecs::EntityManager;
//!
//! #[derive(Default)]
//! struct Position(f32);
//! #[derive(Default)]
//! struct Velocity(f32);
//!
//! let mut entities = EntityManager::new();
//! let entity = entities.create_entity();
//! entities.insert(entity, Position(1.0));
//! entities.insert(entity, Velocity(0.5));
//!
//! let (position, velocity) = entities.query::<(Position, Velocity)>(entity).unwrap();
//! assert_eq!(position.0 + velocity.0, 1.5);
//! ```

use crate::component::Component;
use crate::entity::Entity;
use crate::manager::EntityManager;

/// A tuple of component types fetched together.
///
/// Fetching fails as a whole if any member is missing.
pub trait ComponentQuery {
    /// Borrowed view, one reference per member type.
    type Item<'a>;

    /// Borrows every member component of `entity`.
    fn fetch(entities: &EntityManager, entity: Entity) -> Option<Self::Item<'_>>;
}

macro_rules! impl_component_query {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentQuery for ($($name,)+) {
            type Item<'a> = ($(&'a $name,)+);

            fn fetch(entities: &EntityManager, entity: Entity) -> Option<Self::Item<'_>> {
                Some(($(entities.get::<$name>(entity)?,)+))
            }
        }
    };
}

impl_component_query!(A);
impl_component_query!(A, B);
impl_component_query!(A, B, C);
impl_component_query!(A, B, C, D);
impl_component_query!(A, B, C, D, E);
impl_component_query!(A, B, C, D, E, F);
impl_component_query!(A, B, C, D, E, F, G);
impl_component_query!(A, B, C, D, E, F, G, H);
