//! # ECS Error Types
//!
//! Configuration-time failures. Steady-state per-frame conditions (pool
//! exhaustion, duplicate removal requests, stale entity handles) are not
//! errors and never show up here.

use thiserror::Error;

/// Errors raised while configuring or driving a [`World`](crate::World).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// No template was registered under this name.
    #[error("entity template not found: {name}")]
    TemplateNotFound {
        /// The requested template name.
        name: String,
    },

    /// A template with this name already exists.
    #[error("entity template already registered: {name}")]
    TemplateAlreadyRegistered {
        /// The duplicated template name.
        name: String,
    },

    /// A system with this name was already added to the scheduler.
    #[error("system already registered: {name}")]
    SystemAlreadyRegistered {
        /// The duplicated system name.
        name: String,
    },

    /// The system asked for an execution mode the scheduler cannot run.
    #[error("system {name} requested asynchronous execution, which is not supported")]
    UnsupportedExecutionMode {
        /// The offending system.
        name: String,
    },

    /// The component type already has an index, explicit registration must
    /// happen before first use.
    #[error("component type already registered: {type_name}")]
    ComponentAlreadyRegistered {
        /// Rust type name of the component.
        type_name: &'static str,
    },

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
