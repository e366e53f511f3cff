//! Sprite clip selection and frame stepping.

use sluice_core::{
    ComponentKind, MovementState, PlayerState, Sprite, SpriteContext, Transform,
};
use sluice_shared::Vec2;

use crate::world::World;

fn sprite_context(world: &World, id: sluice_core::EntityId, current: usize) -> SpriteContext {
    let mstate = world.manager.get_component::<MovementState>(id);
    let pstate = world.manager.get_component::<PlayerState>(id);
    SpriteContext {
        velocity: world
            .manager
            .get_component::<Transform>(id)
            .map_or(Vec2::ZERO, |t| t.velocity),
        on_ground: mstate.is_some_and(MovementState::on_ground),
        in_water: mstate.is_some_and(MovementState::in_water),
        crouching: pstate.is_some_and(|p| p.is_crouch & 1 != 0),
        on_ladder: pstate.is_some_and(|p| p.ladder_state),
        current,
    }
}

/// Lets each sprite's behaviour pick its clip, then advances the frame at
/// the animation tick rate.
///
/// Switching clips restarts the animation. Clips with a speed of zero are
/// still images.
pub fn sprite_animation_system(world: &mut World, dt: f32) {
    let tick = 1.0 / world.config.frame.anim_frame_rate;

    let ids = world.take_ids(ComponentKind::Sprite);
    for &id in &ids {
        let Some(sprite) = world.manager.get_component::<Sprite>(id) else {
            continue;
        };
        let next = match sprite.behavior {
            Some(behavior) => behavior.next_clip(&sprite_context(world, id, sprite.current_idx)),
            None => sprite.current_idx,
        };

        let Some(spr) = world.manager.get_component_mut::<Sprite>(id) else {
            continue;
        };
        let reset = spr.current_idx != next;
        spr.current_idx = next;
        let Some(clip) = spr.clips.get(spr.current_idx).copied() else {
            continue;
        };
        if clip.sprite.is_none() {
            continue;
        }
        if reset {
            spr.fractional = 0.0;
            spr.elapsed = 0;
            spr.current_frame = 0;
        }
        if clip.speed == 0 || clip.frame_count == 0 {
            continue;
        }

        spr.fractional += dt;
        if spr.fractional > tick {
            spr.fractional -= tick;
            spr.elapsed += 1;
            if spr.elapsed >= clip.speed {
                spr.elapsed = 0;
                if !spr.pause {
                    spr.current_frame = (spr.current_frame + 1) % clip.frame_count;
                }
            }
        }
    }
    world.release_ids(ids);
}
