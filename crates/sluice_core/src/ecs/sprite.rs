//! Sprite asset handles and clip-selection behaviours.

use sluice_shared::Vec2;

/// Opaque handle to a sprite sheet owned by the asset registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpriteHandle(u32);

impl SpriteHandle {
    /// Wraps a registry-assigned id.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The registry-assigned id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

/// What a behaviour sees when picking the next clip.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpriteContext {
    /// Owner velocity, zero without a transform.
    pub velocity: Vec2,
    /// Owner is on the ground.
    pub on_ground: bool,
    /// Owner is in water.
    pub in_water: bool,
    /// Owner is crouching.
    pub crouching: bool,
    /// Owner is on a ladder.
    pub on_ladder: bool,
    /// Clip currently selected.
    pub current: usize,
}

/// Picks the animation clip for an entity each frame.
///
/// Behaviours are stateless and shared, so the component stores a
/// `&'static` reference.
pub trait SpriteBehavior: std::fmt::Debug + Send + Sync {
    /// Index of the clip to show next.
    fn next_clip(&self, ctx: &SpriteContext) -> usize;
}
