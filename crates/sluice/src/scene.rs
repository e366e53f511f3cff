//! # Level Scene
//!
//! Owns the [`World`], the sprite provider and the level pack, turns
//! actions into player intent and runs one frame of systems per
//! [`Scene::tick`].
//!
//! ```text
//! tick(dt):
//!   tiles -> player input -> player box -> pushing
//!   -> friction -> forces -> grid moves -> integrate -> boulders vs platforms
//!   -> tiles -> collision -> damage, crushing, spikes
//!   -> edge check -> state transitions -> jump recovery
//!   -> timers -> containers -> animation -> level end -> player dead
//!   -> input reset -> water runners -> flush
//! ```

use sluice_core::{ComponentKind, PlayerState};
use sluice_shared::constants::{DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH};
use tracing::{debug, info, warn};

use crate::assets::{AssetRegistry, SpriteProvider};
use crate::config::SimConfig;
use crate::error::SluiceResult;
use crate::level::{populate_world, LevelMap, LevelPack};
use crate::systems::{
    airtimer_update_system, boulder_destroy_wooden_tile_system, check_player_dead_system,
    container_destroy_system, edge_velocity_check_system, friction_coefficient_update_system,
    global_external_forces_system, hitbox_update_system, level_end_detection_system,
    lifetimer_update_system, moveable_update_system, movement_update_system,
    player_bbox_update_system, player_crushing_system, player_dir_reset_system,
    player_ground_air_transition_system, player_movement_input_system, player_pushing_system,
    spike_collision_system, sprite_animation_system, state_transition_update_system,
    tile_collision_system, update_tilemap_system,
};
use crate::tilemap::{TileGrid, TileType};
use crate::water::update_water_runner_system;
use crate::world::{LevelState, World};

/// Discrete input delivered by the action layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Climb, or aim up.
    Up,
    /// Crouch, or climb down.
    Down,
    /// Move left.
    Left,
    /// Move right.
    Right,
    /// Jump.
    Jump,
    /// Reload the current level, on release.
    Restart,
    /// Load the next level, on release.
    NextLevel,
    /// Load the previous level, on release.
    PrevLevel,
}

/// A running level.
#[derive(Debug)]
pub struct Scene<P: SpriteProvider = AssetRegistry> {
    /// Simulation state.
    pub world: World,
    /// Sprite lookup for spawned entities.
    pub assets: P,
    levels: LevelPack,
    current_level: Option<u32>,
    frame: u64,
}

impl<P: SpriteProvider> Scene<P> {
    /// Creates a scene with an empty default-sized grid.
    ///
    /// # Errors
    ///
    /// Returns the validation error of an invalid `config`.
    pub fn new(config: SimConfig, assets: P) -> SluiceResult<Self> {
        config.validate()?;
        let grid = TileGrid::new(DEFAULT_MAP_WIDTH, DEFAULT_MAP_HEIGHT)?;
        Ok(Self {
            world: World::new(config, grid),
            assets,
            levels: LevelPack::default(),
            current_level: None,
            frame: 0,
        })
    }

    /// Replaces the level pack. The running level is kept.
    pub fn set_level_pack(&mut self, levels: LevelPack) {
        self.levels = levels;
    }

    /// Number of the loaded level, if it came from the pack.
    #[must_use]
    pub const fn current_level(&self) -> Option<u32> {
        self.current_level
    }

    /// Ticks run since the scene was created.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Progress of the running level.
    #[must_use]
    pub const fn state(&self) -> LevelState {
        self.world.state
    }

    /// Loads level `num` from the pack.
    ///
    /// # Errors
    ///
    /// [`SluiceError::LevelNotFound`](crate::SluiceError::LevelNotFound)
    /// past the end of the pack, or the map's validation error.
    pub fn load_level(&mut self, num: u32) -> SluiceResult<()> {
        let map = self.levels.get(num)?;
        let spawned = populate_world(&mut self.world, &self.assets, map)?;
        self.current_level = Some(num);
        info!(
            level = num,
            width = map.width,
            height = map.height,
            entities = spawned,
            coins = self.world.coins.total,
            "Level loaded"
        );
        self.log_pools();
        Ok(())
    }

    /// Loads a map that is not part of the pack.
    ///
    /// # Errors
    ///
    /// The map's validation error.
    pub fn load_map(&mut self, map: &LevelMap) -> SluiceResult<()> {
        let spawned = populate_world(&mut self.world, &self.assets, map)?;
        self.current_level = None;
        info!(
            width = map.width,
            height = map.height,
            entities = spawned,
            coins = self.world.coins.total,
            "Level loaded"
        );
        self.log_pools();
        Ok(())
    }

    fn log_pools(&self) {
        for (pool, stats) in self.world.manager.pool_report() {
            debug!(
                pool,
                capacity = stats.capacity,
                in_use = stats.in_use,
                peak = stats.peak,
                "Pool usage"
            );
        }
    }

    /// Applies one input event.
    ///
    /// Movement keys only write player intent; the systems read it on the
    /// next tick. Level switching happens on release.
    pub fn do_action(&mut self, action: Action, pressed: bool) {
        let world = &mut self.world;
        let ids = world.take_ids(ComponentKind::PlayerState);
        for &id in &ids {
            let Some(p) = world.manager.get_component_mut::<PlayerState>(id) else {
                continue;
            };
            let axis = if pressed { 1.0 } else { 0.0 };
            match action {
                Action::Up => p.player_dir.y = -axis,
                Action::Down => p.player_dir.y = axis,
                Action::Left => p.player_dir.x = -axis,
                Action::Right => p.player_dir.x = axis,
                Action::Jump => p.jump_pressed = pressed,
                Action::Restart | Action::NextLevel | Action::PrevLevel => {}
            }
        }
        world.release_ids(ids);

        if pressed {
            return;
        }
        let target = match (action, self.current_level) {
            (Action::Restart, Some(curr)) => Some(curr),
            (Action::NextLevel, Some(curr)) => curr.checked_add(1),
            (Action::PrevLevel, Some(curr)) => curr.checked_sub(1),
            _ => None,
        };
        if let Some(num) = target {
            if let Err(err) = self.load_level(num) {
                warn!(level = num, %err, "Level switch ignored");
            }
        }
    }

    /// Changes a tile during play and resets the water runners.
    pub fn change_tile(&mut self, idx: u32, tile_type: TileType) {
        self.world.change_tile(idx, tile_type);
    }

    /// Runs one frame of systems with the given timestep.
    pub fn tick(&mut self, dt: f32) {
        let world = &mut self.world;

        update_tilemap_system(world);
        player_movement_input_system(world);
        player_bbox_update_system(world);
        player_pushing_system(world);
        friction_coefficient_update_system(world);
        global_external_forces_system(world, dt);
        moveable_update_system(world, dt);
        movement_update_system(world, dt);
        boulder_destroy_wooden_tile_system(world);
        update_tilemap_system(world);
        tile_collision_system(world);
        hitbox_update_system(world);
        player_crushing_system(world);
        spike_collision_system(world);
        edge_velocity_check_system(world);
        state_transition_update_system(world);
        player_ground_air_transition_system(world);
        lifetimer_update_system(world, dt);
        airtimer_update_system(world, dt);
        container_destroy_system(world, &self.assets);
        sprite_animation_system(world, dt);
        level_end_detection_system(world);
        check_player_dead_system(world);
        player_dir_reset_system(world);
        update_water_runner_system(world, dt);
        world.flush();

        self.frame += 1;
    }
}
