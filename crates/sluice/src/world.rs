//! # Simulation World
//!
//! Everything one frame reads and writes: the entity manager, its command
//! buffer, the tile grid, the tuning table and the level's progress.
//! Systems are free functions over `&mut World`.

use sluice_core::{
    ComponentKind, EntityId, EntityManager, EntityTag, PendingOps, RunnerState, WaterRunner,
};
use tracing::debug;

use crate::collision::CollisionWorld;
use crate::config::SimConfig;
use crate::tilemap::{TileGrid, TileType};

/// Progress of the current level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LevelState {
    /// Level running.
    #[default]
    Playing,
    /// The player died.
    PlayerDead,
    /// The player reached the exit with every coin.
    Complete,
}

/// Coin tally, one coin per chest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coins {
    /// Coins collected so far.
    pub current: u32,
    /// Coins in the level.
    pub total: u32,
}

impl Coins {
    /// True once every coin is collected.
    #[must_use]
    pub const fn all_collected(&self) -> bool {
        self.current >= self.total
    }
}

/// Entities already visited by a pass, marked by slot index.
///
/// Both insert and clear cost only the entries touched, so one instance is
/// reused across frames.
#[derive(Debug, Default)]
pub struct SlotMarks {
    marked: Vec<bool>,
    ids: Vec<EntityId>,
}

impl SlotMarks {
    /// Marks sized for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            marked: vec![false; capacity],
            ids: Vec::with_capacity(capacity),
        }
    }

    /// Marks `id`. Returns false if it was already marked.
    pub fn insert(&mut self, id: EntityId) -> bool {
        let slot = id.index() as usize;
        if slot >= self.marked.len() {
            self.marked.resize(slot + 1, false);
        }
        if self.marked[slot] {
            return false;
        }
        self.marked[slot] = true;
        self.ids.push(id);
        true
    }

    /// Unmarks everything marked since the last clear.
    pub fn clear(&mut self) {
        for id in self.ids.drain(..) {
            if let Some(mark) = self.marked.get_mut(id.index() as usize) {
                *mark = false;
            }
        }
    }
}

/// Mutable state of a running level.
#[derive(Debug)]
pub struct World {
    /// Entity and component storage.
    pub manager: EntityManager,
    /// Structural changes queued during the frame.
    pub ops: PendingOps,
    /// The level grid.
    pub grid: TileGrid,
    /// Tuning.
    pub config: SimConfig,
    /// Coin tally.
    pub coins: Coins,
    /// Level progress.
    pub state: LevelState,
    scratch: Vec<EntityId>,
    marks: SlotMarks,
}

impl World {
    /// Builds a world around an empty grid.
    #[must_use]
    pub fn new(config: SimConfig, grid: TileGrid) -> Self {
        let pools = config.pool_config();
        Self {
            manager: EntityManager::new(&pools),
            ops: PendingOps::with_capacity(pools.entity_capacity),
            grid,
            config,
            coins: Coins::default(),
            state: LevelState::Playing,
            scratch: Vec::with_capacity(pools.entity_capacity),
            marks: SlotMarks::with_capacity(pools.entity_capacity),
        }
    }

    /// Read-only collision queries over the grid and the entities.
    #[inline]
    #[must_use]
    pub fn collision(&self) -> CollisionWorld<'_> {
        CollisionWorld::new(&self.grid, &self.manager)
    }

    /// Owners of `kind` components. Hand the buffer back with
    /// [`release_ids`](Self::release_ids) so the next system reuses it.
    pub(crate) fn take_ids(&mut self, kind: ComponentKind) -> Vec<EntityId> {
        let mut ids = std::mem::take(&mut self.scratch);
        self.manager.collect_entities_with(kind, &mut ids);
        ids
    }

    /// Registered entities tagged `tag`, in the same reusable buffer.
    pub(crate) fn take_tagged(&mut self, tag: EntityTag) -> Vec<EntityId> {
        let mut ids = std::mem::take(&mut self.scratch);
        self.manager.collect_entities_tagged(tag, &mut ids);
        ids
    }

    pub(crate) fn release_ids(&mut self, ids: Vec<EntityId>) {
        self.scratch = ids;
    }

    /// The reusable visit marks, cleared. Hand them back with
    /// [`release_marks`](Self::release_marks).
    pub(crate) fn take_marks(&mut self) -> SlotMarks {
        let mut marks = std::mem::take(&mut self.marks);
        marks.clear();
        marks
    }

    pub(crate) fn release_marks(&mut self, marks: SlotMarks) {
        self.marks = marks;
    }

    /// Marks an entity dead; it is reclaimed at the end of the frame.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        self.manager.remove_entity(id, &mut self.ops)
    }

    /// Changes a tile's shape and resets every water runner.
    pub fn change_tile(&mut self, idx: u32, tile_type: TileType) {
        self.grid.change_tile(idx, tile_type);
        self.reset_water_runners();
    }

    /// Turns a tile into empty space.
    pub fn destroy_tile(&mut self, idx: u32) {
        debug!(tile = idx, "Tile destroyed");
        self.change_tile(idx, TileType::Empty);
    }

    /// Sends every water runner back to [`RunnerState::Reset`].
    pub fn reset_water_runners(&mut self) {
        let ids = self.take_ids(ComponentKind::WaterRunner);
        for &id in &ids {
            if let Some(runner) = self.manager.get_component_mut::<WaterRunner>(id) {
                runner.state = RunnerState::Reset;
            }
        }
        self.release_ids(ids);
    }

    /// Applies the frame's queued changes, dropping tile back-references of
    /// removed entities.
    pub fn flush(&mut self) {
        self.manager.update(&mut self.ops, &mut self.grid);
    }

    /// Removes every entity and empties the tile sets.
    pub fn clear_entities(&mut self) {
        self.manager.clear(&mut self.ops, &mut self.grid);
        self.grid.clear_entities();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_marks_insert_once_until_cleared() {
        let mut marks = SlotMarks::with_capacity(4);
        let a = EntityId::new(1, 0);
        let b = EntityId::new(9, 0);

        assert!(marks.insert(a));
        assert!(!marks.insert(a));
        // Past the initial capacity the marks grow
        assert!(marks.insert(b));
        assert!(!marks.insert(b));

        marks.clear();
        assert!(marks.insert(a));
        assert!(marks.insert(b));
    }
}
