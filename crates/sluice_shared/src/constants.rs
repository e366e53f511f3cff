//! # Simulation Constants
//!
//! Stock tuning values. Every value that a level designer may want to
//! override is mirrored by a field of the runtime configuration, which
//! defaults to the numbers below.

// =============================================================================
// GRID
// =============================================================================

/// Edge length of a tile in pixels
pub const TILE_SIZE: u32 = 32;

/// Default level width in tiles
pub const DEFAULT_MAP_WIDTH: u32 = 48;

/// Default level height in tiles
pub const DEFAULT_MAP_HEIGHT: u32 = 32;

/// Largest tile count a level may have
pub const MAX_N_TILES: u32 = 4096;

/// Maximum number of tiles a single bounding box is tracked in
pub const MAX_TILE_SPAN: usize = 8;

// =============================================================================
// WATER
// =============================================================================

/// Highest water level a tile can hold
pub const MAX_WATER_LEVEL: u8 = 4;

/// Height in pixels of one water level
pub const WATER_BBOX_STEP: u32 = TILE_SIZE / MAX_WATER_LEVEL as u32;

/// Water units poured per second by a runner
pub const WATER_FILL_RATE: f32 = 60.0;

/// Frames a runner waits between path steps
pub const RUNNER_MOVEMENT_DELAY: u8 = 5;

/// Tiles a runner advances per path step
pub const RUNNER_MOVEMENT_SPEED: u8 = 1;

// =============================================================================
// TIMING
// =============================================================================

/// Nominal simulation step in seconds
pub const DELTA_T: f32 = 0.017;

/// Largest step the frame loop will hand to the simulation
pub const MAX_DELTA_T: f32 = 1.0 / 60.0;

/// Sprite animation ticks per second
pub const ANIM_FRAME_RATE: f32 = 24.0;

// =============================================================================
// PHYSICS
// =============================================================================

/// Downward acceleration in px/s^2
pub const GRAV_ACCEL: f32 = 1500.0;

/// Ratio of buoyancy to gravity for a fully submerged body
pub const UPTHRUST_RATIO: f32 = 1.15;

/// Default jump speed in px/s
pub const JUMP_SPEED: f32 = 600.0;

/// Player movement acceleration in px/s^2
pub const MOVE_ACCEL: f32 = 1300.0;

/// Speed cap for every moving entity in px/s
pub const PLAYER_MAX_SPEED: f32 = 800.0;

/// Friction coefficient while submerged (both axes)
pub const WATER_FRICTION: f32 = 7.5;

/// Horizontal friction coefficient on ground and in air
pub const GROUND_X_FRICTION: f32 = 6.1;

/// Vertical friction coefficient (air resistance)
pub const GROUND_Y_FRICTION: f32 = 1.0;

/// Velocities below this magnitude are flushed to zero
pub const VELOCITY_EPSILON: f32 = 1e-3;

// =============================================================================
// PLAYER
// =============================================================================

/// Standing bounding box width
pub const PLAYER_WIDTH: f32 = 22.0;

/// Standing bounding box height
pub const PLAYER_HEIGHT: f32 = 42.0;

/// Crouching / swimming bounding box width
pub const PLAYER_C_WIDTH: f32 = 30.0;

/// Crouching / swimming bounding box height
pub const PLAYER_C_HEIGHT: f32 = 26.0;

/// Player jump speed in px/s
pub const PLAYER_JUMP_SPEED: f32 = 680.0;

/// Vertical ladder climbing speed in px/s
pub const LADDER_CLIMB_SPEED: f32 = 150.0;

/// Horizontal speed while on a ladder in px/s
pub const LADDER_STRAFE_SPEED: f32 = 40.0;

/// Ticks a player may still jump after walking off a ledge
pub const COYOTE_TICKS: u8 = 3;

// =============================================================================
// ITEMS
// =============================================================================

/// Arrow flight speed in px/s
pub const ARROW_SPEED: f32 = 400.0;

/// Bomb launch speed in px/s
pub const BOMB_LAUNCH_SPEED: f32 = 500.0;

/// Boulder grid-move speed in px/s
pub const BOULDER_MOVE_SPEED: f32 = 480.0;

// =============================================================================
// POOLS
// =============================================================================

/// Entity pool capacity
pub const MAX_ENTITIES: usize = 2048;

/// Default capacity of a component pool
pub const MAX_COMP_POOL_SIZE: usize = 1024;

/// Capacity of the player-only component pools (jump, player state)
pub const MAX_PLAYER_COMP_POOL_SIZE: usize = 4;
