//! # SLUICE Shared
//!
//! Plain data used by both the ECS kernel and the simulation crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `sluice_core`
//! - `sluice`
//!
//! Everything here is `Copy` data or a `const`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, MAX_WATER_LEVEL, TILE_SIZE};
pub use math::{Rect, Vec2};
