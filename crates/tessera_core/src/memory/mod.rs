//! # Memory Management
//!
//! Object pools for values that are created and discarded every frame.
//!
//! ## Design Philosophy
//!
//! Warm pools hand out recycled objects:
//! - No allocation once the pool reached its working size
//! - Exhaustion is a policy decision, never an error
//! - Stale handles are detected by generation, never dereferenced

mod pool;

pub use pool::{Acquired, InUse, ObjectPool, PoolConfig, PoolHandle, Poolable, ResizePolicy};
