use std::collections::HashMap;

use bevy_ecs::prelude::*;
use serde_json::Value;

use crate::data::scenes::{
    ActCatalog, ChoiceDef, EffectsDef, InteractionDef, MeditationDef, PuzzleDef, SceneDataError,
    SceneDef,
};
use crate::rules::condition::Condition;
use crate::rules::requirements::Requirements;

/// Where taking a choice leads. `Stay` is a state-only choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Scene(String),
    Act(u32),
    Stay,
}

/// A choice after compilation: condition parsed, lookup key minted. The
/// author-facing id stays a label; the key is the identity.
#[derive(Debug, Clone)]
pub struct CompiledChoice {
    pub key: String,
    pub author_id: Option<String>,
    pub text: String,
    pub condition: Option<Condition>,
    pub requirements: Option<Requirements>,
    pub effects: Option<EffectsDef>,
    pub world_state_triggers: HashMap<String, Value>,
    pub destination: Destination,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub body: String,
    pub choices: Vec<CompiledChoice>,
    pub interactions: Vec<CompiledChoice>,
    pub archetype_choices: HashMap<String, Vec<CompiledChoice>>,
    pub puzzle: Option<PuzzleDef>,
    pub meditation: Option<MeditationDef>,
}

#[derive(Debug, Clone)]
pub struct ActGraph {
    pub act: u32,
    pub title: String,
    pub entry_scene: String,
    scenes: HashMap<String, Scene>,
}

impl ActGraph {
    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }
}

/// The immutable-per-load scene graph, one compiled graph per act. Only the
/// position cursor moves at runtime; this resource never changes.
#[derive(Resource, Debug, Default, Clone)]
pub struct SceneLibrary {
    acts: HashMap<u32, ActGraph>,
}

impl SceneLibrary {
    /// Compiles loaded catalogs. Content validation belongs to
    /// `load_act_catalog`; compilation only rejects what it cannot express
    /// (duplicate acts, malformed conditions). Anything else that slips
    /// through fails closed at runtime.
    pub fn from_catalogs(catalogs: Vec<ActCatalog>) -> Result<Self, SceneDataError> {
        let mut acts = HashMap::new();
        for catalog in catalogs {
            if acts.contains_key(&catalog.act) {
                return Err(SceneDataError::Validation(format!(
                    "act {} is declared twice",
                    catalog.act
                )));
            }
            let graph = compile_act(catalog)?;
            acts.insert(graph.act, graph);
        }
        Ok(Self { acts })
    }

    pub fn act(&self, act: u32) -> Option<&ActGraph> {
        self.acts.get(&act)
    }

    pub fn has_act(&self, act: u32) -> bool {
        self.acts.contains_key(&act)
    }

    pub fn scene(&self, act: u32, scene_id: &str) -> Option<&Scene> {
        self.acts.get(&act).and_then(|graph| graph.scene(scene_id))
    }

    /// The lowest-numbered act; where a fresh journey begins.
    pub fn first_act(&self) -> Option<&ActGraph> {
        self.acts.keys().min().and_then(|act| self.acts.get(act))
    }

    pub fn is_empty(&self) -> bool {
        self.acts.is_empty()
    }
}

fn compile_act(catalog: ActCatalog) -> Result<ActGraph, SceneDataError> {
    let act = catalog.act;
    let mut scenes = HashMap::new();
    for scene in catalog.scenes {
        let compiled = compile_scene(scene)?;
        scenes.insert(compiled.id.clone(), compiled);
    }
    Ok(ActGraph {
        act,
        title: catalog.title,
        entry_scene: catalog.entry_scene,
        scenes,
    })
}

fn compile_scene(def: SceneDef) -> Result<Scene, SceneDataError> {
    let scene_id = def.id.clone();
    let mut choices = Vec::with_capacity(def.choices.len());
    for (index, choice) in def.choices.into_iter().enumerate() {
        let key = format!("{}#c{}", scene_id, index);
        choices.push(compile_choice(&scene_id, key, choice)?);
    }

    let mut interactions = Vec::with_capacity(def.interactions.len());
    for (index, interaction) in def.interactions.into_iter().enumerate() {
        let key = format!("{}#i{}", scene_id, index);
        interactions.push(compile_interaction(key, interaction));
    }

    let mut archetype_choices = HashMap::new();
    for (archetype, bonus) in def.archetype_choices {
        let mut compiled = Vec::with_capacity(bonus.len());
        for (index, choice) in bonus.into_iter().enumerate() {
            let key = format!("{}#a:{}:{}", scene_id, archetype, index);
            compiled.push(compile_choice(&scene_id, key, choice)?);
        }
        archetype_choices.insert(archetype, compiled);
    }

    Ok(Scene {
        id: scene_id,
        title: def.title,
        body: def.body,
        choices,
        interactions,
        archetype_choices,
        puzzle: def.puzzle,
        meditation: def.meditation,
    })
}

fn compile_choice(
    scene_id: &str,
    key: String,
    def: ChoiceDef,
) -> Result<CompiledChoice, SceneDataError> {
    let condition = match def.condition {
        Some(raw) => Some(Condition::parse(&raw).map_err(|err| {
            SceneDataError::Validation(format!("scene {}: {}", scene_id, err))
        })?),
        None => None,
    };
    let destination = match (def.next_act, def.next_scene) {
        (Some(act), _) => Destination::Act(act),
        (None, Some(scene)) => Destination::Scene(scene),
        (None, None) => Destination::Stay,
    };
    Ok(CompiledChoice {
        key,
        author_id: def.id,
        text: def.text,
        condition,
        requirements: def.requirements,
        effects: def.effects,
        world_state_triggers: def.world_state_triggers,
        destination,
    })
}

/// Interactions become always-available choices; the author id falls back
/// to the verb_noun pair when not declared.
fn compile_interaction(key: String, def: InteractionDef) -> CompiledChoice {
    let author_id = def.id.unwrap_or_else(|| {
        format!(
            "{}_{}",
            def.verb.to_ascii_lowercase(),
            def.noun.to_ascii_lowercase()
        )
    });
    let text = def
        .text
        .unwrap_or_else(|| format!("{} {}", def.verb, def.noun));
    CompiledChoice {
        key,
        author_id: Some(author_id),
        text,
        condition: None,
        requirements: None,
        effects: None,
        world_state_triggers: HashMap::new(),
        destination: Destination::Scene(def.next_scene),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::scenes::SceneDef;

    fn scene(id: &str) -> SceneDef {
        SceneDef {
            id: id.to_string(),
            title: id.to_string(),
            body: "Narration.".to_string(),
            choices: Vec::new(),
            interactions: Vec::new(),
            archetype_choices: HashMap::new(),
            puzzle: None,
            meditation: None,
        }
    }

    fn catalog(act: u32, entry: &str, scenes: Vec<SceneDef>) -> ActCatalog {
        ActCatalog {
            schema_version: 1,
            act,
            title: format!("Act {}", act),
            entry_scene: entry.to_string(),
            scenes,
        }
    }

    #[test]
    fn compile_mints_unique_keys_per_choice() {
        let mut start = scene("START");
        for text in ["Pray", "Pray"] {
            start.choices.push(ChoiceDef {
                id: Some("pray".to_string()),
                text: text.to_string(),
                condition: None,
                requirements: None,
                effects: None,
                world_state_triggers: HashMap::new(),
                next_scene: None,
                next_act: None,
            });
        }
        let library =
            SceneLibrary::from_catalogs(vec![catalog(1, "START", vec![start])]).unwrap();
        let compiled = library.scene(1, "START").unwrap();
        assert_eq!(compiled.choices[0].key, "START#c0");
        assert_eq!(compiled.choices[1].key, "START#c1");
        // author ids may collide; minted keys never do
        assert_eq!(compiled.choices[0].author_id, compiled.choices[1].author_id);
    }

    #[test]
    fn interactions_become_always_available_choices() {
        let mut start = scene("START");
        start.interactions.push(InteractionDef {
            verb: "Examine".to_string(),
            noun: "Lamp".to_string(),
            next_scene: "LAMP".to_string(),
            id: None,
            text: None,
        });
        let library = SceneLibrary::from_catalogs(vec![catalog(
            1,
            "START",
            vec![start, scene("LAMP")],
        )])
        .unwrap();
        let compiled = library.scene(1, "START").unwrap();
        let interaction = &compiled.interactions[0];
        assert_eq!(interaction.key, "START#i0");
        assert_eq!(interaction.author_id.as_deref(), Some("examine_lamp"));
        assert!(interaction.condition.is_none());
        assert_eq!(
            interaction.destination,
            Destination::Scene("LAMP".to_string())
        );
    }

    #[test]
    fn duplicate_act_numbers_are_rejected() {
        let result = SceneLibrary::from_catalogs(vec![
            catalog(1, "START", vec![scene("START")]),
            catalog(1, "START", vec![scene("START")]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn first_act_is_lowest_numbered() {
        let library = SceneLibrary::from_catalogs(vec![
            catalog(2, "LATER", vec![scene("LATER")]),
            catalog(1, "START", vec![scene("START")]),
        ])
        .unwrap();
        assert_eq!(library.first_act().map(|graph| graph.act), Some(1));
    }
}
