use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::condition::Condition;
use crate::rules::requirements::Requirements;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActCatalog {
    pub schema_version: u32,
    pub act: u32,
    pub title: String,
    pub entry_scene: String,
    pub scenes: Vec<SceneDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDef {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub choices: Vec<ChoiceDef>,
    #[serde(default)]
    pub interactions: Vec<InteractionDef>,
    #[serde(default)]
    pub archetype_choices: HashMap<String, Vec<ChoiceDef>>,
    #[serde(default)]
    pub puzzle: Option<PuzzleDef>,
    #[serde(default)]
    pub meditation: Option<MeditationDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDef {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub requirements: Option<Requirements>,
    #[serde(default)]
    pub effects: Option<EffectsDef>,
    #[serde(default)]
    pub world_state_triggers: HashMap<String, Value>,
    #[serde(default)]
    pub next_scene: Option<String>,
    #[serde(default)]
    pub next_act: Option<u32>,
}

/// A verb + noun pair surfaced as an always-available choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionDef {
    pub verb: String,
    pub noun: String,
    pub next_scene: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleDef {
    pub description: String,
    pub solution: String,
    pub success: String,
    #[serde(default)]
    pub failure: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeditationDef {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub effects: EffectsDef,
}

/// Declarative state mutations a choice carries. Applied by the transition
/// engine in a fixed order; see `systems::transition`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectsDef {
    #[serde(default)]
    pub attributes: HashMap<String, i32>,
    #[serde(default)]
    pub dharmic: HashMap<String, i32>,
    #[serde(default)]
    pub add_items: Vec<String>,
    #[serde(default)]
    pub special_items: Vec<SpecialItemDef>,
    #[serde(default)]
    pub remove_items: Vec<String>,
    #[serde(default)]
    pub flags: HashMap<String, Value>,
    #[serde(default)]
    pub world_state: HashMap<String, Value>,
    #[serde(default)]
    pub progression: ProgressionDelta,
    #[serde(default)]
    pub karma: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialItemDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProgressionDelta {
    #[serde(default)]
    pub quests_completed: u32,
    #[serde(default)]
    pub puzzles_solved: u32,
}

#[derive(Debug)]
pub enum SceneDataError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
    Validation(String),
}

impl std::fmt::Display for SceneDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneDataError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path, source)
            }
            SceneDataError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path, source)
            }
            SceneDataError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for SceneDataError {}

pub fn load_act_catalog(path: impl AsRef<Path>) -> Result<ActCatalog, SceneDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| SceneDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog: ActCatalog =
        serde_json::from_str(&raw).map_err(|source| SceneDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

impl ActCatalog {
    pub fn validate(&self) -> Result<(), SceneDataError> {
        let mut ids = HashSet::new();
        for scene in &self.scenes {
            if scene.id.trim().is_empty() {
                return Err(SceneDataError::Validation(format!(
                    "act {} has a scene with an empty id",
                    self.act
                )));
            }
            if !ids.insert(scene.id.clone()) {
                return Err(SceneDataError::Validation(format!(
                    "act {} has duplicate scene id {}",
                    self.act, scene.id
                )));
            }
            if scene.body.trim().is_empty() {
                return Err(SceneDataError::Validation(format!(
                    "scene {} has no body text",
                    scene.id
                )));
            }
        }
        if !ids.contains(&self.entry_scene) {
            return Err(SceneDataError::Validation(format!(
                "act {} entry scene {} does not exist",
                self.act, self.entry_scene
            )));
        }

        for scene in &self.scenes {
            for choice in &scene.choices {
                self.validate_choice(&scene.id, choice, &ids)?;
            }
            for bonus in scene.archetype_choices.values() {
                for choice in bonus {
                    self.validate_choice(&scene.id, choice, &ids)?;
                }
            }
            for interaction in &scene.interactions {
                if !ids.contains(&interaction.next_scene) {
                    return Err(SceneDataError::Validation(format!(
                        "scene {} interaction {} {} points at missing scene {}",
                        scene.id, interaction.verb, interaction.noun, interaction.next_scene
                    )));
                }
            }
            if let Some(puzzle) = &scene.puzzle {
                if puzzle.solution.trim().is_empty() {
                    return Err(SceneDataError::Validation(format!(
                        "scene {} puzzle has an empty solution",
                        scene.id
                    )));
                }
                if !ids.contains(&puzzle.success) {
                    return Err(SceneDataError::Validation(format!(
                        "scene {} puzzle success points at missing scene {}",
                        scene.id, puzzle.success
                    )));
                }
                if let Some(failure) = &puzzle.failure {
                    if !ids.contains(failure) {
                        return Err(SceneDataError::Validation(format!(
                            "scene {} puzzle failure points at missing scene {}",
                            scene.id, failure
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_choice(
        &self,
        scene_id: &str,
        choice: &ChoiceDef,
        ids: &HashSet<String>,
    ) -> Result<(), SceneDataError> {
        if choice.text.trim().is_empty() {
            return Err(SceneDataError::Validation(format!(
                "scene {} has a choice with no display text",
                scene_id
            )));
        }
        if choice.next_scene.is_some() && choice.next_act.is_some() {
            return Err(SceneDataError::Validation(format!(
                "scene {} choice {} declares both next_scene and next_act",
                scene_id,
                choice.id.as_deref().unwrap_or(&choice.text)
            )));
        }
        if let Some(next_scene) = &choice.next_scene {
            if !ids.contains(next_scene) {
                return Err(SceneDataError::Validation(format!(
                    "scene {} choice {} points at missing scene {}",
                    scene_id,
                    choice.id.as_deref().unwrap_or(&choice.text),
                    next_scene
                )));
            }
        }
        if let Some(condition) = &choice.condition {
            if let Err(err) = Condition::parse(condition) {
                return Err(SceneDataError::Validation(format!(
                    "scene {} choice {}: {}",
                    scene_id,
                    choice.id.as_deref().unwrap_or(&choice.text),
                    err
                )));
            }
        }
        Ok(())
    }
}
