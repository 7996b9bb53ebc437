use std::collections::HashMap;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pseudo-attribute name that targets every currently-known attribute.
pub const ATTRIBUTE_ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gana {
    Deva,
    Manushya,
    Rakshasa,
}

impl Gana {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gana::Deva => "deva",
            Gana::Manushya => "manushya",
            Gana::Rakshasa => "rakshasa",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gunas {
    #[serde(default)]
    pub sattva: i32,
    #[serde(default)]
    pub rajas: i32,
    #[serde(default)]
    pub tamas: i32,
}

/// The player's chosen persona: birth-star archetype, its gana, and the
/// guna seed derived from the archetype catalog at initialization.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub gana: Option<Gana>,
    #[serde(default)]
    pub gunas: Gunas,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DharmicProfile {
    #[serde(default)]
    pub dharma: i32,
    #[serde(default)]
    pub artha: i32,
    #[serde(default)]
    pub kama: i32,
    #[serde(default)]
    pub moksha: i32,
}

/// Monotonic audit counters. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    #[serde(default)]
    pub choices_made: u32,
    #[serde(default)]
    pub puzzles_solved: u32,
    #[serde(default)]
    pub quests_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything that describes the protagonist, as opposed to the world.
/// Mutated only through the primitives below; the transition engine is the
/// sole caller outside of initialization and restore.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(default)]
    pub attributes: HashMap<String, i32>,
    #[serde(default)]
    pub inventory: Vec<String>,
    #[serde(default)]
    pub special_items: HashMap<String, SpecialItem>,
    #[serde(default)]
    pub flags: HashMap<String, Value>,
    #[serde(default)]
    pub karma: i32,
    #[serde(default)]
    pub dharmic: DharmicProfile,
    #[serde(default)]
    pub progression: Progression,
}

impl PlayerState {
    /// Adds `amount` to the named attribute, creating it at 0 first. The
    /// pseudo-name `"all"` applies the delta to every known attribute in
    /// one step.
    pub fn apply_attribute_delta(&mut self, name: &str, amount: i32) {
        if name == ATTRIBUTE_ALL {
            for value in self.attributes.values_mut() {
                *value += amount;
            }
            return;
        }
        *self.attributes.entry(name.to_string()).or_insert(0) += amount;
    }

    pub fn attribute(&self, name: &str) -> i32 {
        self.attributes.get(name).copied().unwrap_or(0)
    }

    /// Plain inventory append. Duplicates are allowed.
    pub fn add_inventory_item(&mut self, item: &str) {
        self.inventory.push(item.to_string());
    }

    /// Removes the first matching item. Removing an absent item is a no-op.
    pub fn remove_inventory_item(&mut self, item: &str) -> bool {
        match self.inventory.iter().position(|entry| entry == item) {
            Some(index) => {
                self.inventory.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn has_inventory_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|entry| entry == item)
    }

    /// Special items dedupe by id; adding one already held is a no-op.
    pub fn add_special_item(&mut self, item: SpecialItem) -> bool {
        if self.special_items.contains_key(&item.id) {
            return false;
        }
        self.special_items.insert(item.id.clone(), item);
        true
    }

    pub fn set_flag(&mut self, key: &str, value: Value) {
        self.flags.insert(key.to_string(), value);
    }

    pub fn read_flag(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    /// Returns the new total.
    pub fn adjust_karma(&mut self, amount: i32) -> i32 {
        self.karma += amount;
        self.karma
    }

    /// Returns whether `aspect` named a recognized accumulator. Unknown
    /// aspects are a silent no-op: scene data may reference optional ones.
    pub fn adjust_dharmic(&mut self, aspect: &str, amount: i32) -> bool {
        match aspect {
            "dharma" => self.dharmic.dharma += amount,
            "artha" => self.dharmic.artha += amount,
            "kama" => self.dharmic.kama += amount,
            "moksha" => self.dharmic.moksha += amount,
            _ => return false,
        }
        true
    }
}
