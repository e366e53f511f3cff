//! # Tile Grid
//!
//! Dense row-major array of tiles. Besides its static shape (type, hitbox,
//! toughness) every tile tracks its water level and the set of entities
//! whose bounding box currently overlaps it. That set is the collision
//! broad phase; it is rebuilt by the tile-membership system and trimmed by
//! the manager's removal phase through [`RemovalObserver`].

use std::collections::BTreeSet;

use sluice_core::{ComponentKind, EntityId, EntityManager, RemovalObserver, TileCoord};
use sluice_shared::constants::{MAX_N_TILES, MAX_WATER_LEVEL, TILE_SIZE, WATER_BBOX_STEP};
use sluice_shared::{Rect, Vec2};

use crate::error::{SluiceError, SluiceResult};

/// Shape of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileType {
    /// Nothing
    #[default]
    Empty,
    /// Solid block
    Solid,
    /// Platform, passable from below
    OneWay,
    /// Climbable
    Ladder,
    /// Damaging
    Spikes,
}

/// How a tile blocks movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolidType {
    /// Never blocks
    #[default]
    NotSolid,
    /// Always blocks
    Solid,
    /// Blocks only bodies coming from above
    OneWay,
}

/// One grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    /// Shape.
    pub tile_type: TileType,
    /// Blocking behaviour, derived from the shape.
    pub solid: SolidType,
    /// Current water level, `0..=max_water_level`.
    pub water_level: u8,
    /// Highest water level this tile can hold, 0 disables water.
    pub max_water_level: u8,
    /// Holds any water.
    pub wet: bool,
    /// Moveable bodies may enter this tile.
    pub moveable: bool,
    /// Toughness, an attack must exceed it to destroy the tile.
    pub def: u8,
    /// Hitbox offset from the tile corner.
    pub offset: Vec2,
    /// Hitbox size.
    pub size: Vec2,
    /// Entities overlapping this tile.
    pub entities: BTreeSet<EntityId>,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            tile_type: TileType::Empty,
            solid: SolidType::NotSolid,
            water_level: 0,
            max_water_level: MAX_WATER_LEVEL,
            wet: false,
            moveable: true,
            def: 2,
            offset: Vec2::ZERO,
            size: Vec2::splat(TILE_SIZE as f32),
            entities: BTreeSet::new(),
        }
    }
}

impl Tile {
    /// True if the tile cannot take more water.
    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.water_level >= self.max_water_level
    }
}

/// The level's tile grid.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`SluiceError::LevelTooLarge`] if the grid is empty or has
    /// more than `MAX_N_TILES` cells.
    pub fn new(width: u32, height: u32) -> SluiceResult<Self> {
        let too_large = SluiceError::LevelTooLarge {
            width,
            height,
            max_tiles: MAX_N_TILES,
        };
        let n = width.checked_mul(height).ok_or_else(|| too_large.clone())?;
        if n == 0 || n > MAX_N_TILES {
            return Err(too_large);
        }
        Ok(Self {
            width,
            height,
            tiles: vec![Tile::default(); n as usize],
        })
    }

    /// Width in tiles.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of tiles.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Always false, a grid has at least one tile.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Level width in pixels.
    #[must_use]
    pub fn width_px(&self) -> f32 {
        (self.width * TILE_SIZE) as f32
    }

    /// Level height in pixels.
    #[must_use]
    pub fn height_px(&self) -> f32 {
        (self.height * TILE_SIZE) as f32
    }

    /// Index of the tile at column `tx`, row `ty`.
    #[inline]
    #[must_use]
    pub fn index(&self, tx: i32, ty: i32) -> Option<u32> {
        let inside = tx >= 0 && ty >= 0 && (tx as u32) < self.width && (ty as u32) < self.height;
        inside.then(|| ty as u32 * self.width + tx as u32)
    }

    /// Column and row of a tile index.
    #[inline]
    #[must_use]
    pub const fn coords(&self, idx: u32) -> (u32, u32) {
        (idx % self.width, idx / self.width)
    }

    /// Index of the tile containing a world position.
    #[must_use]
    pub fn index_at(&self, pos: Vec2) -> Option<u32> {
        let ts = TILE_SIZE as f32;
        self.index((pos.x / ts).floor() as i32, (pos.y / ts).floor() as i32)
    }

    /// Tile by index.
    #[inline]
    #[must_use]
    pub fn tile(&self, idx: u32) -> Option<&Tile> {
        self.tiles.get(idx as usize)
    }

    /// Mutable tile by index.
    #[inline]
    pub fn tile_mut(&mut self, idx: u32) -> Option<&mut Tile> {
        self.tiles.get_mut(idx as usize)
    }

    /// All tiles in index order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// World-space hitbox of a tile.
    #[must_use]
    pub fn tile_rect(&self, idx: u32) -> Rect {
        let (tx, ty) = self.coords(idx);
        let ts = TILE_SIZE as f32;
        match self.tile(idx) {
            Some(tile) => Rect::new(
                tx as f32 * ts + tile.offset.x,
                ty as f32 * ts + tile.offset.y,
                tile.size.x,
                tile.size.y,
            ),
            None => Rect::default(),
        }
    }

    /// World-space water rectangle of a tile, anchored at the tile bottom.
    #[must_use]
    pub fn water_rect(&self, idx: u32) -> Option<Rect> {
        let tile = self.tile(idx)?;
        if tile.water_level == 0 {
            return None;
        }
        let (tx, ty) = self.coords(idx);
        let height = (u32::from(tile.water_level) * WATER_BBOX_STEP) as f32;
        Some(Rect::new(
            (tx * TILE_SIZE) as f32,
            ((ty + 1) * TILE_SIZE) as f32 - height,
            TILE_SIZE as f32,
            height,
        ))
    }

    /// Sets the water level, clamped to the tile maximum.
    pub fn set_water_level(&mut self, idx: u32, level: u8) {
        if let Some(tile) = self.tile_mut(idx) {
            tile.water_level = level.min(tile.max_water_level);
            tile.wet = tile.water_level > 0;
        }
    }

    /// True if the tile at `idx` blocks unconditionally.
    #[must_use]
    pub fn is_solid(&self, idx: u32) -> bool {
        self.tile(idx).is_some_and(|t| t.solid == SolidType::Solid)
    }

    fn neighbour_solid(&self, idx: u32, dx: i32, dy: i32) -> bool {
        let (tx, ty) = self.coords(idx);
        self.index(tx as i32 + dx, ty as i32 + dy)
            .is_some_and(|n| self.is_solid(n))
    }

    /// Changes a tile's shape and recomputes its hitbox, toughness and
    /// blocking behaviour.
    ///
    /// Water runners cache the grid; callers must reset them afterwards.
    pub fn change_tile(&mut self, idx: u32, tile_type: TileType) {
        if self.tile(idx).is_none() {
            return;
        }
        let ts = TILE_SIZE as f32;
        let (offset, size) = match tile_type {
            TileType::OneWay => (Vec2::ZERO, Vec2::new(ts, 10.0)),
            TileType::Spikes => {
                if self.neighbour_solid(idx, 0, 1) {
                    (Vec2::new(0.0, ts - 12.0), Vec2::new(30.0, 12.0))
                } else if self.neighbour_solid(idx, 0, -1) {
                    (Vec2::ZERO, Vec2::new(30.0, 12.0))
                } else if self.neighbour_solid(idx, -1, 0) {
                    (Vec2::ZERO, Vec2::new(12.0, 30.0))
                } else if self.neighbour_solid(idx, 1, 0) {
                    (Vec2::new(ts - 12.0, 0.0), Vec2::new(12.0, 30.0))
                } else {
                    (Vec2::new(0.0, ts / 2.0), Vec2::new(ts, ts / 2.0))
                }
            }
            _ => (Vec2::ZERO, Vec2::splat(ts)),
        };

        if let Some(tile) = self.tile_mut(idx) {
            tile.tile_type = tile_type;
            tile.solid = match tile_type {
                TileType::Solid => SolidType::Solid,
                TileType::OneWay => SolidType::OneWay,
                _ => SolidType::NotSolid,
            };
            tile.moveable = matches!(
                tile_type,
                TileType::Empty | TileType::Spikes | TileType::Ladder
            );
            tile.def = if tile_type == TileType::Solid { 5 } else { 2 };
            tile.offset = offset;
            tile.size = size;
            if tile.solid == SolidType::Solid {
                tile.water_level = 0;
                tile.wet = false;
            }
        }
    }

    /// Registers an entity as overlapping a tile.
    pub fn add_entity_to_tile(&mut self, idx: u32, id: EntityId) {
        if let Some(tile) = self.tile_mut(idx) {
            tile.entities.insert(id);
        }
    }

    /// Drops an entity from a tile's set.
    pub fn remove_entity_from_tile(&mut self, idx: u32, id: EntityId) {
        if let Some(tile) = self.tile_mut(idx) {
            tile.entities.remove(&id);
        }
    }

    /// Empties every tile's entity set.
    pub fn clear_entities(&mut self) {
        for tile in &mut self.tiles {
            tile.entities.clear();
        }
    }

    /// Resets every tile to an empty, dry tile.
    pub fn reset(&mut self) {
        self.tiles.fill(Tile::default());
    }
}

impl TileGrid {
    fn drop_tile_refs(&mut self, id: EntityId, manager: &EntityManager) {
        if let Some(coord) = manager.get_component::<TileCoord>(id) {
            for &idx in coord.tiles() {
                self.remove_entity_from_tile(idx, id);
            }
        }
    }
}

impl RemovalObserver for TileGrid {
    fn on_entity_removed(&mut self, id: EntityId, manager: &EntityManager) {
        self.drop_tile_refs(id, manager);
    }

    fn on_component_removed(
        &mut self,
        id: EntityId,
        kind: ComponentKind,
        manager: &EntityManager,
    ) {
        if kind == ComponentKind::TileCoord {
            self.drop_tile_refs(id, manager);
        }
    }
}
