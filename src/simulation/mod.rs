pub mod journey;
pub mod player;
pub mod scene_graph;
pub mod world_facts;

pub use journey::{JourneyLog, Position};
pub use player::{
    DharmicProfile, Gana, Gunas, PlayerProfile, PlayerState, Progression, SpecialItem,
    ATTRIBUTE_ALL,
};
pub use scene_graph::{ActGraph, CompiledChoice, Destination, Scene, SceneLibrary};
pub use world_facts::WorldFacts;

use bevy_ecs::world::World;

/// A deep, independent copy of the evaluable state, handed to the choice
/// resolver so condition evaluation can never touch the live resources.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub profile: PlayerProfile,
    pub player: PlayerState,
    pub world: WorldFacts,
}

pub fn snapshot_state(world: &World) -> StateSnapshot {
    StateSnapshot {
        profile: world.resource::<PlayerProfile>().clone(),
        player: world.resource::<PlayerState>().clone(),
        world: world.resource::<WorldFacts>().clone(),
    }
}
