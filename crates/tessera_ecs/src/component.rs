//! # Component Types
//!
//! Components are plain data attached to entities. Each distinct Rust type
//! gets a [`ComponentType`]: a dense index assigned on first use (or on
//! explicit registration) and a matching bit in every component mask.
//!
//! The registry is owned by the [`EntityManager`](crate::EntityManager) of a
//! world, so two worlds in the same process never share indices.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use tessera_core::BitVector;

use crate::error::{EcsError, EcsResult};

/// Marker trait for component data.
///
/// Any `'static` type is a component; there is nothing to implement.
///
/// # Example
///
/// ```rust
/// #[derive(Default)]
/// struct Health(u32);
///
/// fn assert_component<T: tessera_ecs::Component>() {}
/// assert_component::<Health>();
/// ```
pub trait Component: Any {}

impl<T: Any> Component for T {}

/// Runtime descriptor of one component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentType {
    index: usize,
    type_id: TypeId,
    type_name: &'static str,
    pooled: bool,
}

impl ComponentType {
    /// Dense index, stable for the lifetime of the registry.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Rust type identity.
    #[inline]
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name, for diagnostics.
    #[inline]
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether values of this type are drawn from an object pool.
    #[inline]
    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        self.pooled
    }

    /// Mask with only this type's bit set.
    #[must_use]
    pub fn bit(&self) -> BitVector {
        let mut bits = BitVector::with_capacity(self.index + 1);
        bits.insert(self.index);
        bits
    }
}

/// Function resolving a component type against a registry.
///
/// Used to defer type lookup until a registry is available, e.g. when an
/// aspect is declared before its system is registered.
pub type TypeResolver = fn(&mut ComponentTypeRegistry) -> ComponentType;

/// Append-only table mapping Rust types to [`ComponentType`]s.
#[derive(Debug, Default)]
pub struct ComponentTypeRegistry {
    types: Vec<ComponentType>,
    by_type: HashMap<TypeId, usize>,
}

impl ComponentTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor for `T`, assigning the next index on first use.
    ///
    /// Idempotent: every call for the same `T` returns the same descriptor.
    pub fn type_for<T: Component>(&mut self) -> ComponentType {
        match self.get::<T>() {
            Some(component_type) => component_type,
            None => self.push::<T>(false),
        }
    }

    /// Explicitly registers `T` with a non-pooled storage.
    ///
    /// Registration order is index order, so registering every component
    /// up front yields a deterministic layout independent of first use.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::ComponentAlreadyRegistered`] if `T` already has an
    /// index.
    pub fn register<T: Component>(&mut self) -> EcsResult<ComponentType> {
        self.register_with::<T>(false)
    }

    pub(crate) fn register_with<T: Component>(&mut self, pooled: bool) -> EcsResult<ComponentType> {
        if self.by_type.contains_key(&TypeId::of::<T>()) {
            return Err(EcsError::ComponentAlreadyRegistered {
                type_name: type_name::<T>(),
            });
        }
        Ok(self.push::<T>(pooled))
    }

    /// Looks up `T` without registering it.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<ComponentType> {
        self.get_by_type_id(TypeId::of::<T>())
    }

    /// Looks up a type by its [`TypeId`].
    #[must_use]
    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<ComponentType> {
        self.by_type.get(&type_id).map(|&index| self.types[index])
    }

    /// Looks up a type by index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<ComponentType> {
        self.types.get(index).copied()
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over registered types in index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = ComponentType> + '_ {
        self.types.iter().copied()
    }

    fn push<T: Component>(&mut self, pooled: bool) -> ComponentType {
        let component_type = ComponentType {
            index: self.types.len(),
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            pooled,
        };
        self.by_type.insert(component_type.type_id, component_type.index);
        self.types.push(component_type);
        tracing::trace!(
            index = component_type.index,
            component = component_type.type_name,
            pooled,
            "component type registered"
        );
        component_type
    }
}

/// A compile-time list of component types.
///
/// Implemented for tuples of one to eight components; `()` is the empty set.
pub trait ComponentSet {
    /// Resolvers for each member type, in declaration order.
    fn resolvers() -> Vec<TypeResolver>;
}

impl ComponentSet for () {
    fn resolvers() -> Vec<TypeResolver> {
        Vec::new()
    }
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn resolvers() -> Vec<TypeResolver> {
                vec![$(ComponentTypeRegistry::type_for::<$name> as TypeResolver),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);
