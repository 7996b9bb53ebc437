use bevy_ecs::world::World;

use crate::data::scenes::EffectsDef;
use crate::simulation::{
    snapshot_state, Destination, JourneyLog, PlayerState, Position, SceneLibrary, SpecialItem,
    WorldFacts,
};
use crate::systems::resolver::resolve_available;

#[derive(Debug)]
pub enum TransitionError {
    ChoiceNotFound(String),
    UnknownScene { act: u32, scene_id: String },
    UnknownAct(u32),
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::ChoiceNotFound(id) => {
                write!(f, "choice {} is not currently available", id)
            }
            TransitionError::UnknownScene { act, scene_id } => {
                write!(f, "act {} has no scene {}", act, scene_id)
            }
            TransitionError::UnknownAct(act) => write!(f, "act {} is not loaded", act),
        }
    }
}

impl std::error::Error for TransitionError {}

/// Applies an effect payload to the live state in the fixed order:
/// attribute deltas, dharmic deltas, inventory adds, inventory removes,
/// world-state merge (flag sets ride along), progression merge, karma.
/// Each sub-mutation always fully applies; there is no mid-list rollback.
/// Returns one summary line per applied mutation.
pub fn apply_effects(world: &mut World, effects: &EffectsDef) -> Vec<String> {
    let mut applied = Vec::new();

    {
        let mut player = world.resource_mut::<PlayerState>();

        let mut attributes: Vec<(&String, &i32)> = effects.attributes.iter().collect();
        attributes.sort_by_key(|(name, _)| name.as_str());
        for (name, delta) in attributes {
            player.apply_attribute_delta(name, *delta);
            applied.push(format!("{} {:+}", name, delta));
        }

        let mut dharmic: Vec<(&String, &i32)> = effects.dharmic.iter().collect();
        dharmic.sort_by_key(|(aspect, _)| aspect.as_str());
        for (aspect, delta) in dharmic {
            if player.adjust_dharmic(aspect, *delta) {
                applied.push(format!("{} {:+}", aspect, delta));
            }
        }

        for item in &effects.add_items {
            player.add_inventory_item(item);
            applied.push(format!("gained {}", item));
        }
        for special in &effects.special_items {
            let added = player.add_special_item(SpecialItem {
                id: special.id.clone(),
                name: special.name.clone(),
                description: special.description.clone(),
            });
            if added {
                applied.push(format!("received {}", special.name));
            }
        }
        for item in &effects.remove_items {
            if player.remove_inventory_item(item) {
                applied.push(format!("lost {}", item));
            }
        }
    }

    if !effects.world_state.is_empty() {
        world
            .resource_mut::<WorldFacts>()
            .merge(&effects.world_state);
    }

    {
        let mut player = world.resource_mut::<PlayerState>();
        for (key, value) in &effects.flags {
            player.set_flag(key, value.clone());
        }
        player.progression.quests_completed += effects.progression.quests_completed;
        player.progression.puzzles_solved += effects.progression.puzzles_solved;
        if effects.karma != 0 {
            let total = player.adjust_karma(effects.karma);
            applied.push(format!("karma {:+} -> {}", effects.karma, total));
        }
    }

    applied
}

/// Takes the identified choice: re-validates availability, applies effects
/// and world triggers, bumps the choices-made counter, then resolves the
/// next position. Navigation failures keep the already-applied effects:
/// effects happen when the choice is taken, only the move failed.
pub fn apply_choice(world: &mut World, choice_id: &str) -> Result<Position, TransitionError> {
    let position = world.resource::<Position>().clone();
    let snapshot = snapshot_state(world);

    let scene = match world
        .resource::<SceneLibrary>()
        .scene(position.act, &position.scene_id)
    {
        Some(scene) => scene.clone(),
        None => {
            world.resource_mut::<JourneyLog>().record(format!(
                "lookup failed: act {} has no scene {}",
                position.act, position.scene_id
            ));
            return Err(TransitionError::ChoiceNotFound(choice_id.to_string()));
        }
    };

    let mut diagnostics = Vec::new();
    let chosen = {
        let resolved = resolve_available(&scene, &snapshot, &mut diagnostics);
        resolved
            .iter()
            .find(|(choice, _)| choice.key == choice_id)
            .or_else(|| {
                resolved
                    .iter()
                    .find(|(choice, _)| choice.author_id.as_deref() == Some(choice_id))
            })
            .map(|(choice, _)| (*choice).clone())
    };
    if !diagnostics.is_empty() {
        let mut log = world.resource_mut::<JourneyLog>();
        for line in diagnostics {
            log.record(line);
        }
    }
    let Some(choice) = chosen else {
        return Err(TransitionError::ChoiceNotFound(choice_id.to_string()));
    };

    if let Some(effects) = &choice.effects {
        apply_effects(world, effects);
    }
    if !choice.world_state_triggers.is_empty() {
        world
            .resource_mut::<WorldFacts>()
            .merge(&choice.world_state_triggers);
    }
    world.resource_mut::<PlayerState>().progression.choices_made += 1;
    world
        .resource_mut::<JourneyLog>()
        .record(format!("Chose: {}", choice.text));

    match &choice.destination {
        Destination::Act(act) => {
            let entry = world
                .resource::<SceneLibrary>()
                .act(*act)
                .map(|graph| graph.entry_scene.clone());
            match entry {
                Some(entry) => {
                    let new_position = {
                        let mut current = world.resource_mut::<Position>();
                        current.jump(*act, entry);
                        current.clone()
                    };
                    world
                        .resource_mut::<JourneyLog>()
                        .record(format!("Act {} begins", act));
                    Ok(new_position)
                }
                None => {
                    world
                        .resource_mut::<JourneyLog>()
                        .record(format!("choice {} points at unloaded act {}", choice.key, act));
                    Err(TransitionError::UnknownAct(*act))
                }
            }
        }
        Destination::Scene(scene_id) => {
            let exists = world
                .resource::<SceneLibrary>()
                .scene(position.act, scene_id)
                .is_some();
            if exists {
                let mut current = world.resource_mut::<Position>();
                current.set_scene(scene_id.clone());
                Ok(current.clone())
            } else {
                world.resource_mut::<JourneyLog>().record(format!(
                    "choice {} points at missing scene {}",
                    choice.key, scene_id
                ));
                Err(TransitionError::UnknownScene {
                    act: position.act,
                    scene_id: scene_id.clone(),
                })
            }
        }
        Destination::Stay => Ok(position),
    }
}
