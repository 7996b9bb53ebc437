use bevy_ecs::world::World;

use crate::simulation::{JourneyLog, Position, SceneLibrary};
use crate::systems::transition::apply_effects;

/// Applies the current scene's declared meditation effects when the scene
/// offers one. Returns whether anything was applied; a scene without an
/// available meditation is a no-op. Meditation is not a choice, so the
/// choices-made counter does not move.
pub fn perform_meditation(world: &mut World) -> bool {
    let position = world.resource::<Position>().clone();
    let meditation = world
        .resource::<SceneLibrary>()
        .scene(position.act, &position.scene_id)
        .and_then(|scene| scene.meditation.clone());
    match meditation {
        Some(meditation) if meditation.available => {
            apply_effects(world, &meditation.effects);
            world
                .resource_mut::<JourneyLog>()
                .record(format!("Meditated at {}", position.scene_id));
            true
        }
        _ => false,
    }
}
