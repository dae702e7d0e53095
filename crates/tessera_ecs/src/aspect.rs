//! # Aspects
//!
//! An [`Aspect`] is a system's component filter, three masks evaluated as
//! independent gates:
//!
//! ```text
//! all  : bits & all == all    (or all is empty)
//! none : bits & none == 0     (or none is empty)
//! any  : bits & any != 0      (or any is empty)
//! ```
//!
//! An empty mask never constrains, including `any`: a system declaring no
//! "any-of" types matches regardless of the gate.
//!
//! Systems declare an [`AspectBuilder`] from type lists; it is resolved
//! against the registry once, when the system is registered.

use std::fmt;

use tessera_core::BitVector;

use crate::component::{ComponentSet, ComponentTypeRegistry, TypeResolver};

/// Resolved component filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Aspect {
    all: BitVector,
    any: BitVector,
    none: BitVector,
}

impl Aspect {
    /// Aspect matching every entity.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            all: BitVector::new(),
            any: BitVector::new(),
            none: BitVector::new(),
        }
    }

    /// Builds an aspect from raw masks.
    ///
    /// # Arguments
    ///
    /// * `all` - Every bit must be present
    /// * `any` - At least one bit must be present
    /// * `none` - No bit may be present
    #[must_use]
    pub const fn from_masks(all: BitVector, any: BitVector, none: BitVector) -> Self {
        Self { all, any, none }
    }

    /// Required component mask.
    #[inline]
    #[must_use]
    pub const fn all_mask(&self) -> &BitVector {
        &self.all
    }

    /// "At least one of" component mask.
    #[inline]
    #[must_use]
    pub const fn any_mask(&self) -> &BitVector {
        &self.any
    }

    /// Excluded component mask.
    #[inline]
    #[must_use]
    pub const fn none_mask(&self) -> &BitVector {
        &self.none
    }

    /// Returns `true` if no mask constrains anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty() && self.none.is_empty()
    }

    /// Checks an entity's component bits against the three gates.
    #[must_use]
    pub fn matches(&self, component_bits: &BitVector) -> bool {
        let all = self.all.is_empty() || component_bits.contains_all(&self.all);
        let none = self.none.is_empty() || component_bits.is_disjoint(&self.none);
        let any = self.any.is_empty() || component_bits.intersects(&self.any);
        all && none && any
    }
}

/// Unresolved aspect declared from component types.
///
/// # Example
///
/// ```rust
/// use tessera_ecs::{AspectBuilder, ComponentTypeRegistry};
///
/// struct Position;
/// struct Velocity;
/// struct Frozen;
///
/// let mut registry = ComponentTypeRegistry::new();
/// let aspect = AspectBuilder::new()
///     .all::<(Position, Velocity)>()
///     .none::<(Frozen,)>()
///     .build(&mut registry);
///
/// let position = registry.type_for::<Position>();
/// let velocity = registry.type_for::<Velocity>();
/// let mut bits = position.bit();
/// bits.union_with(&velocity.bit());
/// assert!(aspect.matches(&bits));
/// ```
#[derive(Clone, Default)]
pub struct AspectBuilder {
    all: Vec<TypeResolver>,
    any: Vec<TypeResolver>,
    none: Vec<TypeResolver>,
}

impl AspectBuilder {
    /// Starts an unconstrained aspect.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires every type of `S`.
    #[must_use]
    pub fn all<S: ComponentSet>(mut self) -> Self {
        self.all.extend(S::resolvers());
        self
    }

    /// Requires at least one type of `S`.
    #[must_use]
    pub fn any<S: ComponentSet>(mut self) -> Self {
        self.any.extend(S::resolvers());
        self
    }

    /// Excludes every type of `S`.
    #[must_use]
    pub fn none<S: ComponentSet>(mut self) -> Self {
        self.none.extend(S::resolvers());
        self
    }

    /// Resolves the declared types, registering any the registry has not
    /// seen yet, and ORs their bits into the masks.
    pub fn build(&self, registry: &mut ComponentTypeRegistry) -> Aspect {
        Aspect {
            all: resolve(&self.all, registry),
            any: resolve(&self.any, registry),
            none: resolve(&self.none, registry),
        }
    }
}

impl fmt::Debug for AspectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AspectBuilder")
            .field("all", &self.all.len())
            .field("any", &self.any.len())
            .field("none", &self.none.len())
            .finish()
    }
}

fn resolve(resolvers: &[TypeResolver], registry: &mut ComponentTypeRegistry) -> BitVector {
    resolvers
        .iter()
        .map(|resolve| resolve(registry).index())
        .collect()
}
