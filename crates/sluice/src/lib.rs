//! # SLUICE
//!
//! Tile-grid platformer simulation built on [`sluice_core`]:
//! - AABB collision between entities and a mutable tile grid
//! - Ordered physics, player and gameplay systems, one pass each per tick
//! - Water runners that flood the level a few tiles per frame
//!
//! ## Architecture Rules
//!
//! 1. **Systems are functions** - Every pass takes `&mut World`, nothing
//!    keeps hidden state between frames
//! 2. **Collision is a view** - [`CollisionWorld`] borrows the grid and the
//!    manager and never writes
//! 3. **Tile edits reset runners** - Go through [`World::change_tile`] or
//!    [`Scene::change_tile`]
//! 4. **No subscriber here** - Only the binary installs one
//!
//! ## Example
//!
//! ```rust,ignore
//! use sluice::{Action, AssetRegistry, FrameLoop, LevelMap, LevelPack, Scene, SimConfig};
//!
//! let mut scene = Scene::new(SimConfig::default(), AssetRegistry::default())?;
//! scene.set_level_pack(LevelPack::new(vec![map]));
//! scene.load_level(0)?;
//!
//! let mut frame_loop = FrameLoop::new(scene.world.config.frame);
//! scene.do_action(Action::Right, true);
//! frame_loop.run_frame(&mut scene);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod archetypes;
pub mod assets;
pub mod collision;
pub mod config;
pub mod error;
pub mod game_loop;
pub mod geometry;
pub mod level;
pub mod scene;
pub mod systems;
pub mod tilemap;
pub mod water;
pub mod world;

pub use assets::{AssetRegistry, SpriteInfo, SpriteProvider, TextureHandle};
pub use collision::{CollisionWorld, ContactEdges, Hit, TileArea};
pub use config::{FrameConfig, PhysicsConfig, PlayerConfig, PoolsConfig, SimConfig, WaterConfig};
pub use error::{SluiceError, SluiceResult};
pub use game_loop::{FrameLoop, FrameStats, FrameStatsAccumulator, TARGET_FRAME_TIME};
pub use geometry::{find_1d_overlap, find_aabb_overlap, OverlapKind};
pub use level::{populate_world, LevelMap, LevelObject, LevelPack, LevelTile};
pub use scene::{Action, Scene};
pub use tilemap::{SolidType, Tile, TileGrid, TileType};
pub use world::{Coins, LevelState, SlotMarks, World};
