use std::time::{SystemTime, UNIX_EPOCH};

use bevy_ecs::world::World;
use serde::{Deserialize, Serialize};

use crate::simulation::{PlayerProfile, PlayerState, Position, WorldFacts};

pub const SAVE_FORMAT_VERSION: u32 = 1;

/// The single persisted record: profile, player, world facts, and the
/// position cursor, tagged with a format version for future migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveState {
    #[serde(default = "default_save_version")]
    pub version: u32,
    #[serde(default)]
    pub saved_at: u64,
    pub profile: PlayerProfile,
    pub player: PlayerState,
    pub world: WorldFacts,
    pub position: Position,
}

fn default_save_version() -> u32 {
    1
}

/// Known-compatible format versions `restore` accepts.
pub fn is_compatible_version(version: u32) -> bool {
    version == SAVE_FORMAT_VERSION
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Extract a serializable snapshot of the journey.
pub fn extract_state_from_world(world: &World) -> SaveState {
    SaveState {
        version: SAVE_FORMAT_VERSION,
        saved_at: unix_seconds(),
        profile: world.resource::<PlayerProfile>().clone(),
        player: world.resource::<PlayerState>().clone(),
        world: world.resource::<WorldFacts>().clone(),
        position: world.resource::<Position>().clone(),
    }
}

/// Apply a saved snapshot back into the world. Replaces each resource
/// wholesale; the caller has already vetted the snapshot, so there is no
/// partial-overwrite path here.
pub fn apply_state_to_world(state: SaveState, world: &mut World) {
    *world.resource_mut::<PlayerProfile>() = state.profile;
    *world.resource_mut::<PlayerState>() = state.player;
    *world.resource_mut::<WorldFacts>() = state.world;
    *world.resource_mut::<Position>() = state.position;
}

/// Serialize a save state into JSON for persistence.
pub fn save_state_to_json(state: &SaveState) -> serde_json::Result<String> {
    serde_json::to_string_pretty(state)
}

/// Deserialize JSON back into a save state.
pub fn load_state_from_json(data: &str) -> serde_json::Result<SaveState> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::JourneyLog;
    use serde_json::json;

    fn populated_world() -> World {
        let mut world = World::new();
        let mut player = PlayerState::default();
        player.apply_attribute_delta("wisdom", 4);
        player.add_inventory_item("Pearl Earring");
        player.set_flag("met_boatman", json!(true));
        player.karma = 3;
        let mut facts = WorldFacts::default();
        facts.set("curse_broken", json!(true));
        world.insert_resource(PlayerProfile::default());
        world.insert_resource(player);
        world.insert_resource(facts);
        world.insert_resource(JourneyLog::default());
        world.insert_resource(Position::new(1, "GHAT_RITUAL_FOCUS"));
        world
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let world = populated_world();
        let state = extract_state_from_world(&world);
        let json = save_state_to_json(&state).unwrap();
        let restored = load_state_from_json(&json).unwrap();
        assert_eq!(state, restored);
    }

    #[test]
    fn apply_restores_extracted_state() {
        let world = populated_world();
        let state = extract_state_from_world(&world);

        let mut fresh = World::new();
        fresh.insert_resource(PlayerProfile::default());
        fresh.insert_resource(PlayerState::default());
        fresh.insert_resource(WorldFacts::default());
        fresh.insert_resource(Position::new(1, "ELSEWHERE"));
        apply_state_to_world(state.clone(), &mut fresh);

        assert_eq!(*fresh.resource::<PlayerState>(), state.player);
        assert_eq!(*fresh.resource::<WorldFacts>(), state.world);
        assert_eq!(*fresh.resource::<Position>(), state.position);
    }

    #[test]
    fn missing_version_defaults_to_current() {
        let json = r#"{
            "profile": {},
            "player": {},
            "world": {},
            "position": { "act": 1, "scene_id": "JOURNEY_START" }
        }"#;
        let state = load_state_from_json(json).unwrap();
        assert_eq!(state.version, SAVE_FORMAT_VERSION);
        assert!(is_compatible_version(state.version));
    }
}
