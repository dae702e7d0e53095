//! # World Configuration
//!
//! Loaded once at startup, usually from a TOML file:
//!
//! ```toml
//! entity_capacity = 4096
//!
//! [default_pool]
//! capacity = 128
//! policy = "kill_existing"
//! ```

use serde::{Deserialize, Serialize};
use tessera_core::PoolConfig;

use crate::error::{EcsError, EcsResult};

/// Startup configuration of a [`World`](crate::World).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Initial capacity of the entity pool. The pool grows past it on demand.
    pub entity_capacity: usize,
    /// Pool settings for components registered without explicit settings.
    pub default_pool: PoolConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            default_pool: PoolConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the document is not valid TOML
    /// or a value has the wrong type.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        toml::from_str(source).map_err(|err| EcsError::InvalidConfig(err.to_string()))
    }

    /// Sets the initial entity capacity.
    #[must_use]
    pub const fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Sets the default pool settings.
    #[must_use]
    pub const fn with_default_pool(mut self, pool: PoolConfig) -> Self {
        self.default_pool = pool;
        self
    }
}
