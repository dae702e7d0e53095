//! # Collections
//!
//! Growable building blocks used throughout the ECS.
//!
//! - [`BitVector`]: unbounded bitset for component and system masks
//! - [`Bag`]: unordered array with O(1) swap-remove
//! - [`Deque`]: ring-buffer double-ended queue

mod bag;
mod bit_vector;
mod deque;

pub use bag::Bag;
pub use bit_vector::{BitVector, Ones};
pub use deque::Deque;
