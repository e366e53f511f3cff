//! # Memory Management
//!
//! Fixed-capacity slot pools for entities and components.
//!
//! ## Design Philosophy
//!
//! Every pool is sized once, when a level is loaded. During gameplay:
//! - Allocation pops a free-list, it never grows a buffer
//! - Exhaustion is reported as `None`, never as a panic
//! - Stale handles are rejected by a per-slot generation counter

mod pool;

pub use pool::{PoolStats, SlotHandle, SlotPool};
