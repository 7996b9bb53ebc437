use bevy_ecs::world::World;

use crate::simulation::{
    JourneyLog, PlayerProfile, PlayerState, Position, SceneLibrary, WorldFacts,
};

/// Build the ECS world with baseline resources. The caller supplies the
/// compiled scene library and the starting position within it.
pub fn create_world(library: SceneLibrary, start: Position) -> World {
    let mut world = World::new();
    world.insert_resource(library);
    world.insert_resource(PlayerProfile::default());
    world.insert_resource(PlayerState::default());
    world.insert_resource(WorldFacts::default());
    world.insert_resource(JourneyLog::default());
    world.insert_resource(start);
    world
}
