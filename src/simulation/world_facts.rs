use std::collections::HashMap;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Facts about the story world, distinct from the protagonist's own state.
/// Keys are free-form; values are whatever the content declares.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldFacts {
    #[serde(default)]
    pub facts: HashMap<String, Value>,
}

impl WorldFacts {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.facts.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.facts.insert(key.to_string(), value);
    }

    /// Shallow merge: later writes to the same key overwrite earlier ones.
    pub fn merge(&mut self, patch: &HashMap<String, Value>) {
        for (key, value) in patch {
            self.facts.insert(key.clone(), value.clone());
        }
    }
}
