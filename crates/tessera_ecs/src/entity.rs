//! # Entity Handles
//!
//! An [`Entity`] is a copyable handle:
//! - `index`: slot in the entity table, reused after the entity is destroyed
//! - `generation`: bumped on every reuse, so stale handles stop resolving
//!
//! The per-entity bookkeeping ([`EntityRecord`]) is pooled by the manager and
//! never leaves it.

use std::fmt;

use tessera_core::{BitVector, PoolHandle, Poolable};

/// Handle to an entity owned by an [`EntityManager`](crate::EntityManager).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Handle that never refers to a live entity.
    pub const NULL: Self = Self {
        index: u32::MAX,
        generation: u32::MAX,
    };

    /// Creates a handle from its parts.
    ///
    /// # Arguments
    ///
    /// * `index` - Slot in the entity table
    /// * `generation` - Reuse counter of that slot
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot in the entity table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Reuse counter of the slot.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Checks if this is [`Entity::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX && self.generation == u32::MAX
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.index as usize
    }

    #[inline]
    pub(crate) const fn from_handle(handle: PoolHandle) -> Self {
        Self::new(handle.index(), handle.generation())
    }

    #[inline]
    pub(crate) const fn handle(self) -> PoolHandle {
        PoolHandle::new(self.index, self.generation)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("Entity(null)")
        } else {
            write!(f, "Entity({}v{})", self.index, self.generation)
        }
    }
}

/// Bookkeeping for one live entity.
#[derive(Debug, Default)]
pub(crate) struct EntityRecord {
    /// Never reused within a manager, unlike the index.
    pub(crate) unique_id: u64,
    /// Bit `i` set ⇔ a component of type index `i` is attached.
    pub(crate) component_bits: BitVector,
    /// Bit `i` set ⇔ system `i` tracks this entity.
    pub(crate) system_bits: BitVector,
    pub(crate) enabled: bool,
    pub(crate) waiting_to_be_added: bool,
    pub(crate) waiting_to_be_removed: bool,
    /// Already sitting in the refresh queue.
    pub(crate) waiting_to_refresh: bool,
    pub(crate) name: Option<String>,
    pub(crate) group: Option<String>,
}

impl Poolable for EntityRecord {
    fn on_return(&mut self) {
        self.unique_id = 0;
        self.component_bits.clear();
        self.system_bits.clear();
        self.enabled = false;
        self.waiting_to_be_added = false;
        self.waiting_to_be_removed = false;
        self.waiting_to_refresh = false;
        self.name = None;
        self.group = None;
    }
}
