//! # Component Types
//!
//! Components are plain data with no behaviour. Each kind has its own
//! fixed-capacity pool; an entity refers to at most one component per kind.

use std::collections::VecDeque;

use sluice_shared::constants::MAX_TILE_SPAN;
use sluice_shared::{Rect, Vec2};

use crate::ecs::entity::EntityId;
use crate::ecs::pools::ComponentPools;
use crate::ecs::sprite::{SpriteBehavior, SpriteHandle};
use crate::memory::SlotPool;

/// Number of component kinds.
pub const COMPONENT_KINDS: usize = 15;

/// Discriminant of every component kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    /// [`BoundingBox`]
    BoundingBox,
    /// [`Transform`]
    Transform,
    /// [`TileCoord`]
    TileCoord,
    /// [`MovementState`]
    MovementState,
    /// [`Jump`]
    Jump,
    /// [`PlayerState`]
    PlayerState,
    /// [`Container`]
    Container,
    /// [`HitBoxes`]
    HitBoxes,
    /// [`Hurtbox`]
    Hurtbox,
    /// [`Sprite`]
    Sprite,
    /// [`Moveable`]
    Moveable,
    /// [`LifeTimer`]
    LifeTimer,
    /// [`WaterRunner`]
    WaterRunner,
    /// [`AirTimer`]
    AirTimer,
    /// [`Emitter`]
    Emitter,
}

impl ComponentKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; COMPONENT_KINDS] = [
        Self::BoundingBox,
        Self::Transform,
        Self::TileCoord,
        Self::MovementState,
        Self::Jump,
        Self::PlayerState,
        Self::Container,
        Self::HitBoxes,
        Self::Hurtbox,
        Self::Sprite,
        Self::Moveable,
        Self::LifeTimer,
        Self::WaterRunner,
        Self::AirTimer,
        Self::Emitter,
    ];

    /// Dense index of the kind.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A component type stored in [`ComponentPools`].
///
/// # Example
///
/// ```rust,ignore
/// let timer = manager.add_component::<LifeTimer>(id, &mut ops)?;
/// timer.life_time = 0.05;
/// ```
pub trait Component: Default + 'static {
    /// Kind tag used for the entity's component slots and forward index.
    const KIND: ComponentKind;

    /// The pool holding this kind.
    fn pool(pools: &ComponentPools) -> &SlotPool<Self>;

    /// The pool holding this kind, mutably.
    fn pool_mut(pools: &mut ComponentPools) -> &mut SlotPool<Self>;
}

// =============================================================================
// COLLISION & MOVEMENT
// =============================================================================

/// Axis-aligned collision box, anchored at the entity position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    /// Width and height.
    pub size: Vec2,
    /// Half of `size`, kept in sync by [`BoundingBox::set`].
    pub half_size: Vec2,
    /// Blocks other entities.
    pub solid: bool,
    /// Solid, but breakable: edge checks may ignore it.
    pub fragile: bool,
}

impl BoundingBox {
    /// Sets the size and its cached half.
    pub fn set(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
        self.half_size = self.size.half();
    }
}

/// How integration treats acceleration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MovementMode {
    /// Velocity follows acceleration.
    #[default]
    Regular,
    /// Velocity is fixed by whoever set it.
    Kinematic,
}

/// Motion state integrated every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Position before the last integration step.
    pub prev_position: Vec2,
    /// Velocity in px/s.
    pub velocity: Vec2,
    /// Velocity before the last integration step.
    pub prev_velocity: Vec2,
    /// Acceleration accumulated this frame, cleared by integration.
    pub accel: Vec2,
    /// Velocity-proportional friction coefficient (negative).
    pub fric_coeff: Vec2,
    /// Per-axis scale applied to external forces.
    pub shape_factor: Vec2,
    /// Gravity delay after losing ground contact, in seconds.
    pub grav_delay: f32,
    /// Remaining gravity delay.
    pub grav_timer: f32,
    /// Integration mode.
    pub movement_mode: MovementMode,
    /// Inactive transforms are frozen in place.
    pub active: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            prev_position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            prev_velocity: Vec2::ZERO,
            accel: Vec2::ZERO,
            fric_coeff: Vec2::ZERO,
            shape_factor: Vec2::splat(1.0),
            grav_delay: 0.0,
            grav_timer: 0.0,
            movement_mode: MovementMode::Regular,
            active: false,
        }
    }
}

/// Tiles the entity's bounding box currently spans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TileCoord {
    tiles: [u32; MAX_TILE_SPAN],
    n_tiles: usize,
}

impl TileCoord {
    /// Tile indices, in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[u32] {
        &self.tiles[..self.n_tiles]
    }

    /// Number of tracked tiles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.n_tiles
    }

    /// True if no tile is tracked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.n_tiles == 0
    }

    /// Forgets every tracked tile.
    pub fn clear(&mut self) {
        self.n_tiles = 0;
    }

    /// Tracks one more tile. Returns false once the span is full.
    pub fn push(&mut self, tile_idx: u32) -> bool {
        if self.n_tiles >= MAX_TILE_SPAN {
            return false;
        }
        self.tiles[self.n_tiles] = tile_idx;
        self.n_tiles += 1;
        true
    }
}

/// Ground/water contact history.
///
/// `ground_state` and `water_state` are 2-bit shift registers: bit 0 is this
/// frame, bit 1 the previous one. `0b01` means "just landed / entered",
/// `0b10` means "just left".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementState {
    /// Ground contact history.
    pub ground_state: u8,
    /// Water contact history.
    pub water_state: u8,
    /// 1 when last moving right, 0 when last moving left.
    pub x_dir: u8,
    /// Fraction of the bounding box under water, 0..=1.
    pub water_overlap: f32,
}

impl MovementState {
    /// On the ground this frame.
    #[inline]
    #[must_use]
    pub const fn on_ground(&self) -> bool {
        self.ground_state & 1 != 0
    }

    /// In water this frame.
    #[inline]
    #[must_use]
    pub const fn in_water(&self) -> bool {
        self.water_state & 1 != 0
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// Jump budget and variable-height jump bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Jump {
    /// Take-off speed in px/s.
    pub jump_speed: f32,
    /// Jumps left.
    pub jumps: u8,
    /// Jumps restored on landing.
    pub max_jumps: u8,
    /// Ticks left in which a ledge jump is still allowed.
    pub coyote_timer: u8,
    /// A jump is in progress.
    pub jumped: bool,
    /// Ready to jump again.
    pub jump_ready: bool,
    /// The short-hop cut has been applied to this jump.
    pub short_hop: bool,
    /// Jump key released since the last jump.
    pub jump_released: bool,
}

/// Input-derived player intent, written by the action layer.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerState {
    /// Requested direction, each axis in -1..=1.
    pub player_dir: Vec2,
    /// Jump key held.
    pub jump_pressed: bool,
    /// Crouch shift register: bit 1 is requested, bit 0 is applied.
    pub is_crouch: u8,
    /// Attached to a ladder.
    pub ladder_state: bool,
    /// Ignore inputs.
    pub locked: bool,
}

// =============================================================================
// ITEMS & COMBAT
// =============================================================================

/// What a container releases when destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContainerItem {
    /// Nothing
    #[default]
    Empty,
    /// Arrow flying left
    LeftArrow,
    /// Arrow flying right
    RightArrow,
    /// Arrow flying up
    UpArrow,
    /// Arrow flying down
    DownArrow,
    /// A coin
    Coin,
    /// A bomb, launched away from a player attacker
    Bomb,
    /// An explosion
    Explosion,
}

/// Container material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContainerMaterial {
    /// Breaks easily
    #[default]
    Wooden,
    /// Tougher
    Metal,
}

/// Something that releases an item when destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Container {
    /// Material.
    pub material: ContainerMaterial,
    /// Released item.
    pub item: ContainerItem,
}

/// Attack boxes, relative to the entity position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitBoxes {
    /// Box storage, the first `n_boxes` are used.
    pub boxes: [Rect; 2],
    /// Boxes in use.
    pub n_boxes: u8,
    /// Attack strength, compared against a target's `def`.
    pub atk: u8,
    /// Destroy the owner on its first hit.
    pub one_hit: bool,
}

impl HitBoxes {
    /// The boxes in use.
    #[must_use]
    pub fn active(&self) -> &[Rect] {
        let n = usize::from(self.n_boxes).min(self.boxes.len());
        &self.boxes[..n]
    }
}

/// Damage-receiving box, relative to the entity position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hurtbox {
    /// Offset from the entity position.
    pub offset: Vec2,
    /// Size.
    pub size: Vec2,
    /// Defence, an attack must exceed it.
    pub def: u8,
    /// Last entity that broke through.
    pub damage_src: Option<EntityId>,
}

/// Counts down and destroys the owner at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LifeTimer {
    /// Seconds left.
    pub life_time: f32,
}

/// Breath meter for submerged entities.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AirTimer {
    /// Length of one bubble.
    pub max_ftimer: f32,
    /// Time left in the current bubble.
    pub curr_ftimer: f32,
    /// Drain rate multiplier.
    pub decay_rate: f32,
    /// Bubbles when surfacing.
    pub max_count: u8,
    /// Bubbles left.
    pub curr_count: u8,
}

/// Grid-aligned push movement.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moveable {
    /// Speed of a grid move in px/s.
    pub move_speed: f32,
    /// Position when the grid move started.
    pub prev_pos: Vec2,
    /// Destination of the grid move.
    pub target_pos: Vec2,
    /// A grid move is in progress.
    pub gridmove: bool,
}

/// Opaque particle emitter handle owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EmitterHandle(pub u32);

/// Attachment point for a particle emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Emitter {
    /// Emitter owned by the renderer, if one is playing.
    pub handle: Option<EmitterHandle>,
    /// Offset from the entity position.
    pub offset: Vec2,
    /// The emitter should be playing.
    pub active: bool,
}

// =============================================================================
// SPRITES
// =============================================================================

/// Maximum animation clips per sprite component.
pub const MAX_SPRITE_CLIPS: usize = 4;

/// One animation clip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationClip {
    /// Sprite sheet, if the asset is loaded.
    pub sprite: Option<SpriteHandle>,
    /// Frames in the clip.
    pub frame_count: u32,
    /// Animation ticks per frame, 0 for a still image.
    pub speed: u32,
}

/// Animated sprite state.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sprite {
    /// Clips, selected by `current_idx`.
    pub clips: [AnimationClip; MAX_SPRITE_CLIPS],
    /// Picks the clip each frame. `None` keeps `current_idx`.
    pub behavior: Option<&'static dyn SpriteBehavior>,
    /// Selected clip.
    pub current_idx: usize,
    /// Frame within the clip.
    pub current_frame: u32,
    /// Leftover time towards the next animation tick.
    pub fractional: f32,
    /// Animation ticks spent on the current frame.
    pub elapsed: u32,
    /// Freeze the frame counter.
    pub pause: bool,
    /// Mirror horizontally.
    pub flip_x: bool,
}

// =============================================================================
// WATER
// =============================================================================

/// Per-cell record of a water runner's search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BfsTile {
    /// Next tile on the path towards the target, -1 if none.
    pub to: i32,
    /// Tile this one was discovered from, -1 if none.
    pub from: i32,
    /// Discovered by the current search.
    pub reachable: bool,
}

impl Default for BfsTile {
    fn default() -> Self {
        Self {
            to: -1,
            from: -1,
            reachable: false,
        }
    }
}

/// Water runner phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunnerState {
    /// Drop cached search data.
    #[default]
    Reset,
    /// Pick a non-solid start tile.
    Start,
    /// Search for the lowest reachable tile.
    LowestPointSearch,
    /// Walk the path to the lowest tile.
    LowestPointMovement,
    /// Find the fillable span of the current row.
    ReachabilitySearch,
    /// Pour water over the span.
    ScanlineFill,
    /// Nothing left to fill.
    FillComplete,
}

/// Incremental fluid solver state.
///
/// The scratch buffers are sized to the level's tile count when the runner
/// is created and dropped when its slot is freed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WaterRunner {
    /// One search record per grid cell.
    pub bfs_tilemap: Vec<BfsTile>,
    /// Grid width in tiles.
    pub width: i32,
    /// Grid height in tiles.
    pub height: i32,
    /// Current phase.
    pub state: RunnerState,
    /// Search frontier.
    pub bfs_queue: VecDeque<i32>,
    /// Cells already queued by the current search.
    pub visited: Vec<bool>,
    /// Tile the runner is on.
    pub current_tile: i32,
    /// Lowest tile found by the last search.
    pub target_tile: i32,
    /// Next tile to receive water in the fill span.
    pub fill_idx: i32,
    /// Inclusive column span of the fill, within `current_tile`'s row.
    pub fill_range: [i32; 2],
    /// Frames between path steps.
    pub movement_delay: u8,
    /// Tiles per path step.
    pub movement_speed: u8,
    /// Frames since the last path step.
    pub counter: i16,
    /// Water units owed to the fill.
    pub fractional: f32,
}

impl WaterRunner {
    /// Sizes the scratch buffers for a `width` x `height` grid.
    pub fn allocate(&mut self, width: u32, height: u32) {
        let total = (width * height) as usize;
        self.width = width as i32;
        self.height = height as i32;
        self.bfs_tilemap = vec![BfsTile::default(); total];
        self.visited = vec![false; total];
        self.bfs_queue = VecDeque::with_capacity(total);
    }

    /// Number of cells covered by the scratch buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bfs_tilemap.len()
    }

    /// True when the buffers have not been sized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bfs_tilemap.is_empty()
    }
}
