//! # Sprite Handles
//!
//! The simulation never owns asset bytes. It asks a [`SpriteProvider`] for
//! opaque handles by name and stores those in sprite components; whatever
//! draws the frame resolves them again.
//!
//! [`AssetRegistry`] is an in-memory provider for headless runs and tests.

use std::collections::HashMap;

use sluice_core::{AnimationClip, SpriteHandle};

/// Opaque handle to a texture owned by the asset layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
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

/// Frame layout of a sprite sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpriteInfo {
    /// Frames in the sheet.
    pub frame_count: u32,
    /// Animation ticks per frame, 0 for a still image.
    pub speed: u32,
}

/// Name-based lookup of sprite and texture handles.
pub trait SpriteProvider {
    /// Handle of the sprite called `name`.
    fn get_sprite(&self, name: &str) -> Option<SpriteHandle>;

    /// Handle of the texture called `name`.
    fn get_texture(&self, name: &str) -> Option<TextureHandle>;

    /// Frame layout of a sprite, a single still frame if unknown.
    fn sprite_info(&self, _handle: SpriteHandle) -> SpriteInfo {
        SpriteInfo {
            frame_count: 1,
            speed: 0,
        }
    }

    /// Animation clip for the sprite called `name`, empty if it is missing.
    fn clip(&self, name: &str) -> AnimationClip {
        self.get_sprite(name).map_or_else(AnimationClip::default, |handle| {
            let info = self.sprite_info(handle);
            AnimationClip {
                sprite: Some(handle),
                frame_count: info.frame_count,
                speed: info.speed,
            }
        })
    }
}

/// In-memory [`SpriteProvider`].
#[derive(Clone, Debug, Default)]
pub struct AssetRegistry {
    sprites: HashMap<String, SpriteHandle>,
    sprite_info: Vec<SpriteInfo>,
    textures: HashMap<String, TextureHandle>,
}

impl AssetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a texture, returning the existing handle on a repeat name.
    pub fn add_texture(&mut self, name: &str) -> TextureHandle {
        let next = TextureHandle::new(self.textures.len() as u32);
        *self.textures.entry(name.to_owned()).or_insert(next)
    }

    /// Registers a sprite sheet, returning the existing handle on a repeat
    /// name.
    pub fn add_sprite(&mut self, name: &str, frame_count: u32, speed: u32) -> SpriteHandle {
        if let Some(&handle) = self.sprites.get(name) {
            return handle;
        }
        let handle = SpriteHandle::new(self.sprite_info.len() as u32);
        self.sprite_info.push(SpriteInfo { frame_count, speed });
        self.sprites.insert(name.to_owned(), handle);
        handle
    }

    /// Number of registered sprites.
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.sprite_info.len()
    }
}

impl SpriteProvider for AssetRegistry {
    fn get_sprite(&self, name: &str) -> Option<SpriteHandle> {
        self.sprites.get(name).copied()
    }

    fn get_texture(&self, name: &str) -> Option<TextureHandle> {
        self.textures.get(name).copied()
    }

    fn sprite_info(&self, handle: SpriteHandle) -> SpriteInfo {
        self.sprite_info
            .get(handle.id() as usize)
            .copied()
            .unwrap_or(SpriteInfo {
                frame_count: 1,
                speed: 0,
            })
    }
}
