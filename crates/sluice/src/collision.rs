//! # Collision Engine
//!
//! Stateless queries over the tile grid and the entities registered in it.
//! Broad phase is the per-tile entity set, narrow phase is
//! [`find_aabb_overlap`].

use std::ops::{BitOr, BitOrAssign};

use sluice_core::{BoundingBox, EntityId, EntityManager};
use sluice_shared::constants::TILE_SIZE;
use sluice_shared::{Rect, Vec2};

use crate::geometry::{find_aabb_overlap, line_in_aabb, OverlapKind};
use crate::tilemap::{SolidType, TileGrid};

/// Sides of a body that touch something.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContactEdges(u8);

impl ContactEdges {
    /// No contact.
    pub const NONE: Self = Self(0);
    /// Something below.
    pub const DOWN: Self = Self(1);
    /// Something above.
    pub const UP: Self = Self(1 << 1);
    /// Something to the right.
    pub const RIGHT: Self = Self(1 << 2);
    /// Something to the left.
    pub const LEFT: Self = Self(1 << 3);

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every side in `other` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// True if no side is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Contacts implied by a position correction.
    #[must_use]
    pub fn from_offset(offset: Vec2) -> Self {
        let mut edges = Self::NONE;
        if offset.y < 0.0 {
            edges |= Self::DOWN;
        } else if offset.y > 0.0 {
            edges |= Self::UP;
        }
        if offset.x < 0.0 {
            edges |= Self::RIGHT;
        } else if offset.x > 0.0 {
            edges |= Self::LEFT;
        }
        edges
    }
}

impl BitOr for ContactEdges {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ContactEdges {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Result of a collision query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Hit {
    /// Nothing in the way.
    Clear = 0,
    /// A tile or rigid solid entity.
    Rigid = 1,
    /// A fragile solid entity.
    Fragile = 2,
}

impl Hit {
    /// True for any hit.
    #[inline]
    #[must_use]
    pub const fn is_hit(self) -> bool {
        !matches!(self, Self::Clear)
    }
}

/// Inclusive tile span of a rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileArea {
    /// First column.
    pub x1: i32,
    /// Last column.
    pub x2: i32,
    /// First row.
    pub y1: i32,
    /// Last row.
    pub y2: i32,
}

impl TileArea {
    /// Tiles covered by the pixels of `rect`.
    #[must_use]
    pub fn covering(rect: Rect) -> Self {
        let ts = TILE_SIZE as f32;
        Self {
            x1: (rect.x / ts).floor() as i32,
            x2: ((rect.x + rect.width - 1.0) / ts).floor() as i32,
            y1: (rect.y / ts).floor() as i32,
            y2: ((rect.y + rect.height - 1.0) / ts).floor() as i32,
        }
    }

    /// The span clamped to the grid.
    #[must_use]
    pub fn clamped(self, grid: &TileGrid) -> Self {
        let max_x = grid.width() as i32 - 1;
        let max_y = grid.height() as i32 - 1;
        Self {
            x1: self.x1.clamp(0, max_x),
            x2: self.x2.clamp(0, max_x),
            y1: self.y1.clamp(0, max_y),
            y2: self.y2.clamp(0, max_y),
        }
    }

    /// Tile indices in the clamped span, row by row.
    pub fn indices(self, grid: &TileGrid) -> impl Iterator<Item = u32> + '_ {
        let area = self.clamped(grid);
        (area.y1..=area.y2)
            .flat_map(move |ty| (area.x1..=area.x2).map(move |tx| (tx, ty)))
            .filter_map(|(tx, ty)| grid.index(tx, ty))
    }
}

/// A body probing for collisions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollideEntity {
    /// The body itself, never reported as its own obstacle.
    pub entity: EntityId,
    /// Query box.
    pub bbox: Rect,
    /// Box of the body one frame ago, for one-way platforms.
    pub prev_bbox: Rect,
    /// Tiles to scan.
    pub area: TileArea,
}

impl CollideEntity {
    /// Query `bbox` scanning the tiles it covers.
    #[must_use]
    pub fn new(entity: EntityId, bbox: Rect, prev_bbox: Rect) -> Self {
        Self {
            entity,
            bbox,
            prev_bbox,
            area: TileArea::covering(bbox),
        }
    }
}

/// Read-only view used by every query.
#[derive(Clone, Copy, Debug)]
pub struct CollisionWorld<'a> {
    /// The tile grid.
    pub grid: &'a TileGrid,
    /// Entity storage.
    pub manager: &'a EntityManager,
}

impl<'a> CollisionWorld<'a> {
    /// Bundles the grid and the manager.
    #[must_use]
    pub const fn new(grid: &'a TileGrid, manager: &'a EntityManager) -> Self {
        Self { grid, manager }
    }

    /// Box of a solid live entity other than `skip`.
    fn solid_body(&self, other: EntityId, skip: EntityId) -> Option<(Rect, BoundingBox)> {
        if other == skip {
            return None;
        }
        let record = self.manager.get_entity(other)?;
        if !record.is_alive() {
            return None;
        }
        let bbox = *self.manager.get_component::<BoundingBox>(other)?;
        bbox.solid
            .then(|| (Rect::from_pos_size(record.position, bbox.size), bbox))
    }

    /// Scans the query area for solid tiles, one-way platforms the body was
    /// above last frame (when `check_oneway`), and solid entities.
    #[must_use]
    pub fn check_collision(&self, ent: &CollideEntity, check_oneway: bool) -> Hit {
        for idx in ent.area.indices(self.grid) {
            let Some(tile) = self.grid.tile(idx) else {
                continue;
            };
            let tile_rect = self.grid.tile_rect(idx);
            match tile.solid {
                SolidType::Solid => {
                    if find_aabb_overlap(ent.bbox, tile_rect).0 != OverlapKind::None {
                        return Hit::Rigid;
                    }
                }
                SolidType::OneWay if check_oneway => {
                    let (kind, overlap) = find_aabb_overlap(ent.bbox, tile_rect);
                    let (_, ty) = self.grid.coords(idx);
                    let top = (ty * TILE_SIZE) as f32;
                    if kind != OverlapKind::None
                        && overlap.y != 0.0
                        && ent.prev_bbox.y + ent.prev_bbox.height - 1.0 < top
                    {
                        return Hit::Rigid;
                    }
                }
                _ => {}
            }

            for &other in &tile.entities {
                let Some((rect, bbox)) = self.solid_body(other, ent.entity) else {
                    continue;
                };
                if find_aabb_overlap(ent.bbox, rect).0 != OverlapKind::None {
                    return if bbox.fragile { Hit::Fragile } else { Hit::Rigid };
                }
            }
        }
        Hit::Clear
    }

    /// Like [`check_collision`](Self::check_collision) for the inclusive
    /// pixel box from `p1` to `p2`, ignoring one-way platforms.
    #[must_use]
    pub fn check_collision_line(&self, entity: EntityId, p1: Vec2, p2: Vec2) -> Hit {
        let span = Rect::new(p1.x, p1.y, p2.x - p1.x + 1.0, p2.y - p1.y + 1.0);
        for idx in TileArea::covering(span).indices(self.grid) {
            let Some(tile) = self.grid.tile(idx) else {
                continue;
            };
            if tile.solid == SolidType::Solid && line_in_aabb(p1, p2, self.grid.tile_rect(idx)) {
                return Hit::Rigid;
            }
            for &other in &tile.entities {
                let Some((rect, bbox)) = self.solid_body(other, entity) else {
                    continue;
                };
                if line_in_aabb(p1, p2, rect) {
                    return if bbox.fragile { Hit::Fragile } else { Hit::Rigid };
                }
            }
        }
        Hit::Clear
    }

    /// Would a body of `size` at `pos` collide with anything solid?
    #[must_use]
    pub fn check_collision_at(&self, entity: EntityId, pos: Vec2, size: Vec2) -> Hit {
        let bbox = Rect::from_pos_size(pos, size);
        self.check_collision(&CollideEntity::new(entity, bbox, bbox), false)
    }

    /// [`check_collision_at`](Self::check_collision_at) shifted by `offset`.
    #[must_use]
    pub fn check_collision_offset(
        &self,
        entity: EntityId,
        pos: Vec2,
        size: Vec2,
        offset: Vec2,
    ) -> Hit {
        self.check_collision_at(entity, pos + offset, size)
    }

    /// True if a one-pixel strip under the body hits something, counting
    /// one-way platforms the body was above last frame.
    #[must_use]
    pub fn check_on_ground(&self, entity: EntityId, pos: Vec2, prev_pos: Vec2, size: Vec2) -> bool {
        let strip = Rect::new(pos.x, pos.y + size.y, size.x, 1.0);
        let prev = Rect::from_pos_size(prev_pos, size);
        self.check_collision(&CollideEntity::new(entity, strip, prev), true)
            .is_hit()
    }

    /// Tests one-pixel strips on all four sides of the body.
    ///
    /// With `ignore_fragile`, fragile entities do not count as contact.
    #[must_use]
    pub fn check_bbox_edges(
        &self,
        entity: EntityId,
        pos: Vec2,
        size: Vec2,
        ignore_fragile: bool,
    ) -> ContactEdges {
        let body = Rect::from_pos_size(pos, size);
        let counts = |hit: Hit| match hit {
            Hit::Clear => false,
            Hit::Rigid => true,
            Hit::Fragile => !ignore_fragile,
        };
        let hits = |rect: Rect, oneway: bool| {
            counts(self.check_collision(&CollideEntity::new(entity, rect, body), oneway))
        };

        let mut edges = ContactEdges::NONE;
        if hits(Rect::new(pos.x - 1.0, pos.y, 1.0, size.y), false) {
            edges |= ContactEdges::LEFT;
        }
        if hits(Rect::new(pos.x + size.x, pos.y, 1.0, size.y), false) {
            edges |= ContactEdges::RIGHT;
        }
        if hits(Rect::new(pos.x, pos.y - 1.0, size.x, 1.0), false) {
            edges |= ContactEdges::UP;
        }
        if hits(Rect::new(pos.x, pos.y + size.y, size.x, 1.0), true) {
            edges |= ContactEdges::DOWN;
        }
        edges
    }

    /// Pushes a body at `pos` out of the obstacle `other`.
    ///
    /// For a partial overlap the previous frame decides the axis: the axis
    /// that already overlapped last frame is left alone and the other one is
    /// corrected. Equal previous overlaps resolve the smaller current one,
    /// and an exact tie there too resolves along y.
    /// A contained body is moved to the first free spot on top, left, right
    /// or below the obstacle, and on top of it when none is free.
    ///
    /// One-way obstacles only push upward, and only a body whose previous
    /// bottom was at or above their top. Returns the contacts created.
    pub fn check_collision_and_move(
        &self,
        entity: EntityId,
        pos: &mut Vec2,
        prev_pos: Vec2,
        size: Vec2,
        other: Rect,
        other_solid: SolidType,
    ) -> ContactEdges {
        if other_solid == SolidType::NotSolid {
            return ContactEdges::NONE;
        }
        let (kind, overlap) = find_aabb_overlap(Rect::from_pos_size(*pos, size), other);

        match kind {
            OverlapKind::None => ContactEdges::NONE,
            OverlapKind::Partial => {
                let (_, prev) = find_aabb_overlap(Rect::from_pos_size(prev_pos, size), other);
                let mut offset = Vec2::ZERO;
                if prev.y.abs() > prev.x.abs() {
                    offset.x = overlap.x;
                } else if prev.x.abs() > prev.y.abs() {
                    offset.y = overlap.y;
                } else if overlap.x.abs() < overlap.y.abs() {
                    offset.x = overlap.x;
                } else {
                    offset.y = overlap.y;
                }

                let apply = match other_solid {
                    SolidType::Solid => true,
                    SolidType::OneWay => {
                        offset.x == 0.0 && offset.y < 0.0 && prev_pos.y + size.y <= other.y
                    }
                    SolidType::NotSolid => false,
                };
                if !apply {
                    return ContactEdges::NONE;
                }
                *pos += offset;
                ContactEdges::from_offset(offset)
            }
            OverlapKind::Complete => {
                if other_solid != SolidType::Solid {
                    return ContactEdges::NONE;
                }
                let candidates = [
                    Vec2::new(pos.x, other.y - size.y),
                    Vec2::new(other.x - size.x, pos.y),
                    Vec2::new(other.x + other.width, pos.y),
                    Vec2::new(pos.x, other.y + other.height),
                ];
                let target = candidates
                    .into_iter()
                    .find(|c| !self.check_collision_at(entity, *c, size).is_hit())
                    .unwrap_or(candidates[0]);
                let offset = target - *pos;
                *pos = target;
                ContactEdges::from_offset(offset)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::TileType;
    use sluice_core::{EntityTag, PendingOps, PoolConfig, TileCoord};

    fn setup() -> (TileGrid, EntityManager, PendingOps) {
        let grid = TileGrid::new(8, 8).unwrap();
        let manager = EntityManager::new(&PoolConfig {
            entity_capacity: 16,
            component_capacity: 16,
            player_capacity: 2,
        });
        (grid, manager, PendingOps::new())
    }

    fn body(
        em: &mut EntityManager,
        ops: &mut PendingOps,
        pos: Vec2,
        size: Vec2,
        fragile: bool,
    ) -> EntityId {
        let id = em.add_entity(EntityTag::Crate, ops).unwrap();
        em.get_entity_mut(id).unwrap().position = pos;
        let bbox = em.add_component::<BoundingBox>(id, ops).unwrap();
        bbox.set(size.x, size.y);
        bbox.solid = true;
        bbox.fragile = fragile;
        em.add_component::<TileCoord>(id, ops);
        id
    }

    #[test]
    fn test_solid_tile_hit() {
        let (mut grid, em, _) = setup();
        grid.change_tile(grid.index(2, 2).unwrap(), TileType::Solid);
        let world = CollisionWorld::new(&grid, &em);
        let size = Vec2::splat(10.0);

        let hit = world.check_collision_at(EntityId::NULL, Vec2::new(60.0, 60.0), size);
        assert_eq!(hit, Hit::Rigid);
        let touching = world.check_collision_at(EntityId::NULL, Vec2::new(54.0, 64.0), size);
        assert_eq!(touching, Hit::Clear);
    }

    #[test]
    fn test_oneway_needs_previous_position_above() {
        let (mut grid, em, _) = setup();
        grid.change_tile(grid.index(1, 3).unwrap(), TileType::OneWay);
        let world = CollisionWorld::new(&grid, &em);
        let size = Vec2::new(20.0, 20.0);

        let bbox = Rect::from_pos_size(Vec2::new(36.0, 80.0), size);
        let above = Rect::from_pos_size(Vec2::new(36.0, 70.0), size);
        let from_above = CollideEntity::new(EntityId::NULL, bbox, above);
        assert_eq!(world.check_collision(&from_above, true), Hit::Rigid);
        assert_eq!(world.check_collision(&from_above, false), Hit::Clear);

        let below = Rect::from_pos_size(Vec2::new(36.0, 90.0), size);
        let from_below = CollideEntity::new(EntityId::NULL, bbox, below);
        assert_eq!(world.check_collision(&from_below, true), Hit::Clear);
    }

    #[test]
    fn test_fragile_entity_is_distinguished() {
        let (mut grid, mut em, mut ops) = setup();
        let chest = body(&mut em, &mut ops, Vec2::new(64.0, 64.0), Vec2::splat(32.0), true);
        grid.add_entity_to_tile(grid.index(2, 2).unwrap(), chest);
        em.update(&mut ops, &mut grid);

        let world = CollisionWorld::new(&grid, &em);
        let point = Vec2::new(70.0, 70.0);
        let small = Vec2::splat(4.0);
        assert_eq!(world.check_collision_at(EntityId::NULL, point, small), Hit::Fragile);
        assert_eq!(world.check_collision_at(chest, point, small), Hit::Clear);

        let pos = Vec2::new(44.0, 70.0);
        let size = Vec2::splat(20.0);
        let edges = world.check_bbox_edges(EntityId::NULL, pos, size, true);
        assert!(edges.is_empty());
        let edges = world.check_bbox_edges(EntityId::NULL, pos, size, false);
        assert_eq!(edges, ContactEdges::RIGHT);
    }

    #[test]
    fn test_edges_on_floor() {
        let (mut grid, em, _) = setup();
        for tx in 0..8 {
            grid.change_tile(grid.index(tx, 4).unwrap(), TileType::Solid);
        }
        let world = CollisionWorld::new(&grid, &em);
        let pos = Vec2::new(40.0, 108.0);
        let size = Vec2::splat(20.0);

        let edges = world.check_bbox_edges(EntityId::NULL, pos, size, false);
        assert_eq!(edges, ContactEdges::DOWN);
        assert!(world.check_on_ground(EntityId::NULL, pos, Vec2::new(40.0, 100.0), size));
    }

    #[test]
    fn test_resolution_uses_previous_overlap_axis() {
        let (grid, em, _) = setup();
        let world = CollisionWorld::new(&grid, &em);
        let wall = Rect::new(64.0, 0.0, 32.0, 256.0);
        let size = Vec2::splat(20.0);

        // Moving right into a tall wall: y overlapped last frame, so x is resolved
        let mut pos = Vec2::new(50.0, 100.0);
        let prev = Vec2::new(40.0, 100.0);
        let edges = world.check_collision_and_move(
            EntityId::NULL,
            &mut pos,
            prev,
            size,
            wall,
            SolidType::Solid,
        );
        assert_eq!(pos, Vec2::new(44.0, 100.0));
        assert_eq!(edges, ContactEdges::RIGHT);
    }

    #[test]
    fn test_landing_resolves_y() {
        let (grid, em, _) = setup();
        let world = CollisionWorld::new(&grid, &em);
        let floor = Rect::new(0.0, 128.0, 32.0, 32.0);
        let size = Vec2::new(30.0, 20.0);

        let mut pos = Vec2::new(0.0, 112.0);
        let prev = Vec2::new(0.0, 100.0);
        let edges = world.check_collision_and_move(
            EntityId::NULL,
            &mut pos,
            prev,
            size,
            floor,
            SolidType::Solid,
        );
        assert_eq!(pos, Vec2::new(0.0, 108.0));
        assert_eq!(edges, ContactEdges::DOWN);
    }

    #[test]
    fn test_diagonal_corner_tie_resolves_y() {
        let (grid, em, _) = setup();
        let world = CollisionWorld::new(&grid, &em);
        let tile = Rect::new(64.0, 64.0, 32.0, 32.0);
        let size = Vec2::splat(20.0);

        // Clear of the tile last frame, equal overlap on both axes now
        let mut pos = Vec2::new(48.0, 48.0);
        let prev = Vec2::new(40.0, 40.0);
        let edges = world.check_collision_and_move(
            EntityId::NULL,
            &mut pos,
            prev,
            size,
            tile,
            SolidType::Solid,
        );
        assert_eq!(pos, Vec2::new(48.0, 44.0));
        assert_eq!(edges, ContactEdges::DOWN);
    }

    #[test]
    fn test_oneway_does_not_push_from_below() {
        let (grid, em, _) = setup();
        let world = CollisionWorld::new(&grid, &em);
        let platform = Rect::new(0.0, 96.0, 32.0, 10.0);
        let size = Vec2::new(20.0, 20.0);

        let mut pos = Vec2::new(4.0, 100.0);
        let prev = Vec2::new(4.0, 110.0);
        let edges = world.check_collision_and_move(
            EntityId::NULL,
            &mut pos,
            prev,
            size,
            platform,
            SolidType::OneWay,
        );
        assert!(edges.is_empty());
        assert_eq!(pos, Vec2::new(4.0, 100.0));
    }

    #[test]
    fn test_contained_body_moves_to_free_spot_on_top() {
        let (grid, em, _) = setup();
        let world = CollisionWorld::new(&grid, &em);
        let block = Rect::new(64.0, 64.0, 64.0, 64.0);
        let size = Vec2::splat(10.0);

        let mut pos = Vec2::new(80.0, 80.0);
        let prev = pos;
        let edges = world.check_collision_and_move(
            EntityId::NULL,
            &mut pos,
            prev,
            size,
            block,
            SolidType::Solid,
        );
        assert_eq!(pos, Vec2::new(80.0, 54.0));
        assert!(edges.contains(ContactEdges::DOWN));
    }
}
