use crate::simulation::{CompiledChoice, Scene, StateSnapshot};

/// Which of the three categories a resolved choice came from. Presentation
/// uses this to badge archetype bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceSource {
    Standard,
    Interaction,
    ArchetypeBonus,
}

/// One currently-takeable option, identified by its minted key. The author
/// id is carried for display and as a lookup convenience only.
#[derive(Debug, Clone)]
pub struct ResolvedChoice {
    pub key: String,
    pub author_id: Option<String>,
    pub text: String,
    pub source: ChoiceSource,
}

impl ResolvedChoice {
    pub fn is_archetype_bonus(&self) -> bool {
        self.source == ChoiceSource::ArchetypeBonus
    }
}

/// Computes the ordered list of takeable choices: standard choices that pass
/// their gates, then interactions (always available), then the matching
/// archetype's bonus choices. Duplicate author ids are preserved as-is.
/// Gate failures fail closed and leave a line in `diagnostics`.
pub fn resolve_available<'a>(
    scene: &'a Scene,
    snapshot: &StateSnapshot,
    diagnostics: &mut Vec<String>,
) -> Vec<(&'a CompiledChoice, ChoiceSource)> {
    let mut resolved = Vec::new();
    for choice in &scene.choices {
        if gate_open(choice, snapshot, diagnostics) {
            resolved.push((choice, ChoiceSource::Standard));
        }
    }
    for interaction in &scene.interactions {
        resolved.push((interaction, ChoiceSource::Interaction));
    }
    if let Some(archetype) = snapshot.profile.archetype.as_deref() {
        if let Some(bonus) = scene.archetype_choices.get(archetype) {
            for choice in bonus {
                if gate_open(choice, snapshot, diagnostics) {
                    resolved.push((choice, ChoiceSource::ArchetypeBonus));
                }
            }
        }
    }
    resolved
}

pub fn available_choices(
    scene: &Scene,
    snapshot: &StateSnapshot,
    diagnostics: &mut Vec<String>,
) -> Vec<ResolvedChoice> {
    resolve_available(scene, snapshot, diagnostics)
        .into_iter()
        .map(|(choice, source)| ResolvedChoice {
            key: choice.key.clone(),
            author_id: choice.author_id.clone(),
            text: choice.text.clone(),
            source,
        })
        .collect()
}

fn gate_open(choice: &CompiledChoice, snapshot: &StateSnapshot, diagnostics: &mut Vec<String>) -> bool {
    if let Some(condition) = &choice.condition {
        return match condition.evaluate(snapshot) {
            Ok(open) => open,
            Err(err) => {
                diagnostics.push(format!("choice {} excluded: {}", choice.key, err));
                false
            }
        };
    }
    if let Some(requirements) = &choice.requirements {
        return requirements.met_by(&snapshot.player);
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::data::scenes::{ActCatalog, ChoiceDef, InteractionDef, SceneDef};
    use crate::simulation::{PlayerProfile, PlayerState, SceneLibrary, StateSnapshot, WorldFacts};

    fn choice(text: &str, condition: Option<&str>) -> ChoiceDef {
        ChoiceDef {
            id: Some(text.to_ascii_lowercase().replace(' ', "_")),
            text: text.to_string(),
            condition: condition.map(str::to_string),
            requirements: None,
            effects: None,
            world_state_triggers: HashMap::new(),
            next_scene: None,
            next_act: None,
        }
    }

    fn library() -> SceneLibrary {
        let mut archetype_choices = HashMap::new();
        archetype_choices.insert("ashwini".to_string(), vec![choice("Invoke the twin horsemen", None)]);
        let scene = SceneDef {
            id: "GHAT".to_string(),
            title: "The Ghat".to_string(),
            body: "The river waits.".to_string(),
            choices: vec![
                choice("Offer the pearl", Some("inventory contains \"Pearl Earring\"")),
                choice("Sit by the water", None),
            ],
            interactions: vec![InteractionDef {
                verb: "watch".to_string(),
                noun: "pyres".to_string(),
                next_scene: "GHAT".to_string(),
                id: None,
                text: None,
            }],
            archetype_choices,
            puzzle: None,
            meditation: None,
        };
        SceneLibrary::from_catalogs(vec![ActCatalog {
            schema_version: 1,
            act: 1,
            title: "Act 1".to_string(),
            entry_scene: "GHAT".to_string(),
            scenes: vec![scene],
        }])
        .unwrap()
    }

    fn snapshot(with_pearl: bool, archetype: Option<&str>) -> StateSnapshot {
        let mut player = PlayerState::default();
        if with_pearl {
            player.add_inventory_item("Pearl Earring");
        }
        let mut profile = PlayerProfile::default();
        profile.archetype = archetype.map(str::to_string);
        StateSnapshot {
            profile,
            player,
            world: WorldFacts::default(),
        }
    }

    #[test]
    fn gated_choice_appears_only_with_the_item() {
        let library = library();
        let scene = library.scene(1, "GHAT").unwrap();
        let mut diagnostics = Vec::new();

        let without = available_choices(scene, &snapshot(false, None), &mut diagnostics);
        assert!(without.iter().all(|c| c.author_id.as_deref() != Some("offer_the_pearl")));

        let with = available_choices(scene, &snapshot(true, None), &mut diagnostics);
        assert!(with.iter().any(|c| c.author_id.as_deref() == Some("offer_the_pearl")));
    }

    #[test]
    fn order_is_standard_then_interactions_then_archetype() {
        let library = library();
        let scene = library.scene(1, "GHAT").unwrap();
        let mut diagnostics = Vec::new();
        let choices = available_choices(scene, &snapshot(true, Some("ashwini")), &mut diagnostics);
        let sources: Vec<ChoiceSource> = choices.iter().map(|c| c.source).collect();
        assert_eq!(
            sources,
            vec![
                ChoiceSource::Standard,
                ChoiceSource::Standard,
                ChoiceSource::Interaction,
                ChoiceSource::ArchetypeBonus,
            ]
        );
        assert!(choices[3].is_archetype_bonus());
    }

    #[test]
    fn archetype_bonus_hidden_for_other_archetypes() {
        let library = library();
        let scene = library.scene(1, "GHAT").unwrap();
        let mut diagnostics = Vec::new();
        let choices = available_choices(scene, &snapshot(false, Some("bharani")), &mut diagnostics);
        assert!(choices.iter().all(|c| !c.is_archetype_bonus()));
    }

    #[test]
    fn listing_twice_returns_identical_sequences() {
        let library = library();
        let scene = library.scene(1, "GHAT").unwrap();
        let snapshot = snapshot(true, Some("ashwini"));
        let mut diagnostics = Vec::new();
        let first: Vec<String> = available_choices(scene, &snapshot, &mut diagnostics)
            .into_iter()
            .map(|c| c.key)
            .collect();
        let second: Vec<String> = available_choices(scene, &snapshot, &mut diagnostics)
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(first, second);
    }
}
