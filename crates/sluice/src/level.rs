//! # Level Data
//!
//! A level is a grid of spawn codes plus a water level per cell. Loading
//! rebuilds the tile grid in two passes (solid tiles first, because spike
//! hitboxes lean against their solid neighbours) and then spawns the
//! level objects through the archetypes.
//!
//! | Code  | Object                                           |
//! |-------|--------------------------------------------------|
//! | 1     | solid tile                                       |
//! | 2     | one-way platform                                 |
//! | 3     | ladder                                           |
//! | 4-7   | spikes                                           |
//! | 8-13  | wooden crate, item `(code - 8) % 6`              |
//! | 14-19 | metal crate, item `(code - 8) % 6`               |
//! | 20    | boulder                                          |
//! | 21    | water runner                                     |
//! | 22    | player                                           |
//! | 23    | chest                                            |
//! | 24    | level end                                        |

use sluice_core::{ContainerItem, ContainerMaterial};
use sluice_shared::constants::{MAX_N_TILES, MAX_WATER_LEVEL, TILE_SIZE};
use sluice_shared::Vec2;
use tracing::warn;

use crate::archetypes::{
    spawn_boulder, spawn_chest, spawn_crate, spawn_level_end, spawn_player, spawn_water_runner,
};
use crate::assets::SpriteProvider;
use crate::error::{SluiceError, SluiceResult};
use crate::tilemap::{TileGrid, TileType};
use crate::world::{Coins, LevelState, World};

/// One cell of a level map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LevelTile {
    /// Spawn code.
    pub tile_type: u8,
    /// Initial water level. Anything above the maximum makes the tile dry
    /// for good.
    pub water: u8,
}

/// What a spawn code places in the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelObject {
    /// Nothing, or an unknown code.
    Empty,
    /// A tile shape.
    Tile(TileType),
    /// A crate.
    Crate(ContainerMaterial, ContainerItem),
    /// A boulder.
    Boulder,
    /// A water runner.
    WaterRunner,
    /// The player.
    Player,
    /// A chest with one coin.
    Chest,
    /// The exit.
    LevelEnd,
}

impl LevelObject {
    /// Decodes a spawn code.
    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Tile(TileType::Solid),
            2 => Self::Tile(TileType::OneWay),
            3 => Self::Tile(TileType::Ladder),
            4..=7 => Self::Tile(TileType::Spikes),
            8..=19 => {
                let idx = code - 8;
                let material = if idx > 5 {
                    ContainerMaterial::Metal
                } else {
                    ContainerMaterial::Wooden
                };
                let item = match idx % 6 {
                    1 => ContainerItem::LeftArrow,
                    2 => ContainerItem::RightArrow,
                    3 => ContainerItem::UpArrow,
                    4 => ContainerItem::DownArrow,
                    5 => ContainerItem::Bomb,
                    _ => ContainerItem::Empty,
                };
                Self::Crate(material, item)
            }
            20 => Self::Boulder,
            21 => Self::WaterRunner,
            22 => Self::Player,
            23 => Self::Chest,
            24 => Self::LevelEnd,
            _ => Self::Empty,
        }
    }
}

/// A level as authored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelMap {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Row-major cells.
    pub tiles: Vec<LevelTile>,
}

impl LevelMap {
    /// An empty map.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![LevelTile::default(); (width * height) as usize],
        }
    }

    /// Sets the spawn code at column `tx`, row `ty`. Out-of-range cells are
    /// ignored.
    pub fn set(&mut self, tx: u32, ty: u32, code: u8) {
        if let Some(cell) = self.cell_mut(tx, ty) {
            cell.tile_type = code;
        }
    }

    /// Sets the initial water level at column `tx`, row `ty`.
    pub fn set_water(&mut self, tx: u32, ty: u32, water: u8) {
        if let Some(cell) = self.cell_mut(tx, ty) {
            cell.water = water;
        }
    }

    fn cell_mut(&mut self, tx: u32, ty: u32) -> Option<&mut LevelTile> {
        if tx >= self.width || ty >= self.height {
            return None;
        }
        self.tiles.get_mut((ty * self.width + tx) as usize)
    }

    /// Checks the size against the grid limit and the cell count.
    ///
    /// # Errors
    ///
    /// [`SluiceError::LevelTooLarge`] or [`SluiceError::LevelDataMismatch`].
    pub fn validate(&self) -> SluiceResult<()> {
        let n = self.width.checked_mul(self.height);
        if n.map_or(true, |n| n == 0 || n > MAX_N_TILES) {
            return Err(SluiceError::LevelTooLarge {
                width: self.width,
                height: self.height,
                max_tiles: MAX_N_TILES,
            });
        }
        let expected = (self.width * self.height) as usize;
        if self.tiles.len() != expected {
            return Err(SluiceError::LevelDataMismatch {
                expected,
                actual: self.tiles.len(),
            });
        }
        Ok(())
    }

    /// Number of chests, one coin each.
    #[must_use]
    pub fn n_chests(&self) -> u32 {
        self.tiles
            .iter()
            .filter(|t| LevelObject::from_code(t.tile_type) == LevelObject::Chest)
            .count() as u32
    }
}

/// An ordered set of levels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelPack {
    levels: Vec<LevelMap>,
}

impl LevelPack {
    /// Wraps a list of levels.
    #[must_use]
    pub fn new(levels: Vec<LevelMap>) -> Self {
        Self { levels }
    }

    /// Number of levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True if the pack has no level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level number `num`.
    ///
    /// # Errors
    ///
    /// [`SluiceError::LevelNotFound`] past the end of the pack.
    pub fn get(&self, num: u32) -> SluiceResult<&LevelMap> {
        self.levels
            .get(num as usize)
            .ok_or(SluiceError::LevelNotFound(num))
    }
}

/// Replaces the world's grid and entities with `map`'s.
///
/// Objects whose pools are full are skipped with a warning. Returns the
/// number of entities spawned.
///
/// # Errors
///
/// Fails if the map is invalid; the world is untouched in that case.
pub fn populate_world(
    world: &mut World,
    sprites: &dyn SpriteProvider,
    map: &LevelMap,
) -> SluiceResult<usize> {
    map.validate()?;
    let grid = TileGrid::new(map.width, map.height)?;

    world.clear_entities();
    world.grid = grid;
    world.coins = Coins {
        current: 0,
        total: map.n_chests(),
    };
    world.state = LevelState::Playing;

    for (i, cell) in map.tiles.iter().enumerate() {
        let idx = i as u32;
        if cell.water > MAX_WATER_LEVEL {
            if let Some(tile) = world.grid.tile_mut(idx) {
                tile.max_water_level = 0;
            }
        } else {
            world.grid.set_water_level(idx, cell.water);
        }
        if LevelObject::from_code(cell.tile_type) == LevelObject::Tile(TileType::Solid) {
            world.grid.change_tile(idx, TileType::Solid);
        }
    }

    let ts = TILE_SIZE as f32;
    let mut spawned = 0;
    for (i, cell) in map.tiles.iter().enumerate() {
        let idx = i as u32;
        let (tx, ty) = world.grid.coords(idx);
        let corner = Vec2::new(tx as f32 * ts, ty as f32 * ts);

        let object = LevelObject::from_code(cell.tile_type);
        let id = match object {
            LevelObject::Empty | LevelObject::Tile(TileType::Solid) => continue,
            LevelObject::Tile(tile_type) => {
                world.grid.change_tile(idx, tile_type);
                continue;
            }
            LevelObject::Crate(material, item) => {
                spawn_crate(world, sprites, corner, material, item)
            }
            LevelObject::Boulder => spawn_boulder(world, sprites, corner),
            LevelObject::WaterRunner => spawn_water_runner(world, idx),
            LevelObject::Player => spawn_player(world, sprites, corner),
            LevelObject::Chest => spawn_chest(world, sprites, corner),
            LevelObject::LevelEnd => {
                spawn_level_end(world, sprites, corner + Vec2::splat(ts / 2.0))
            }
        };
        match id {
            Some(_) => spawned += 1,
            None => warn!(tile = idx, ?object, "Level object not spawned"),
        }
    }

    world.flush();
    Ok(spawned)
}
