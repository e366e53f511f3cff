//! # Frame Systems
//!
//! Ordered passes over the [`World`](crate::world::World). Each system
//! copies the components it needs out of the pools, computes against the
//! read-only collision view, then writes the results back. Entity creation
//! and destruction only go through the command buffer, so no pass ever
//! sees a slot vanish under it.
//!
//! The frame order lives in [`Scene::tick`](crate::scene::Scene::tick).

mod animation;
mod gameplay;
mod physics;
mod player;

pub use animation::sprite_animation_system;
pub use gameplay::{
    airtimer_update_system, boulder_destroy_wooden_tile_system, check_player_dead_system,
    container_destroy_system, hitbox_update_system, level_end_detection_system,
    lifetimer_update_system, spike_collision_system,
};
pub use physics::{
    edge_velocity_check_system, friction_coefficient_update_system,
    global_external_forces_system, moveable_update_system, movement_update_system,
    state_transition_update_system, tile_collision_system, update_tilemap_system,
};
pub use player::{
    player_bbox_update_system, player_crushing_system, player_dir_reset_system,
    player_ground_air_transition_system, player_movement_input_system, player_pushing_system,
};

use sluice_shared::Vec2;

use crate::collision::ContactEdges;

/// Drops the components of `v` that point into a contact.
pub(crate) fn zero_into_edges(v: &mut Vec2, edges: ContactEdges) {
    if edges.contains(ContactEdges::LEFT) && v.x < 0.0 {
        v.x = 0.0;
    }
    if edges.contains(ContactEdges::RIGHT) && v.x > 0.0 {
        v.x = 0.0;
    }
    if edges.contains(ContactEdges::UP) && v.y < 0.0 {
        v.y = 0.0;
    }
    if edges.contains(ContactEdges::DOWN) && v.y > 0.0 {
        v.y = 0.0;
    }
}
