//! # Tessera Core
//!
//! Allocation-conscious collections backing the Tessera ECS:
//! - Growable bit vectors for component and system masks
//! - Bags and deques as general growable containers
//! - Object pools with explicit exhaustion policies
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{BitVector, ObjectPool, Poolable, ResizePolicy};
//!
//! #[derive(Default)]
//! struct Spark {
//!     ttl: f32,
//! }
//!
//! impl Poolable for Spark {
//!     fn on_return(&mut self) {
//!         self.ttl = 0.0;
//!     }
//! }
//!
//! let mut pool = ObjectPool::new(32, ResizePolicy::ReturnNull, Spark::default);
//! let handle = pool.acquire().expect("pool has room");
//! pool.get_mut(handle).expect("handle is live").ttl = 1.5;
//! assert!(pool.release(handle));
//!
//! let mask = BitVector::from_bits([0, 3, 70]);
//! assert!(mask.contains(70));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collections;
pub mod memory;

pub use collections::{Bag, BitVector, Deque};
pub use memory::{ObjectPool, PoolConfig, PoolHandle, Poolable, ResizePolicy};
