use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::rules::condition::truthy;
use crate::simulation::PlayerState;

/// The simpler gate form a choice may declare instead of a condition
/// expression: minimum attribute values and required flags, all of which
/// must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub attributes: HashMap<String, i32>,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl Requirements {
    /// A missing attribute counts as 0; a missing flag is not truthy.
    pub fn met_by(&self, player: &PlayerState) -> bool {
        let attributes_ok = self
            .attributes
            .iter()
            .all(|(name, threshold)| player.attribute(name) >= *threshold);
        let flags_ok = self
            .flags
            .iter()
            .all(|flag| player.read_flag(flag).map(truthy).unwrap_or(false));
        attributes_ok && flags_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn requirements(attribute: &str, threshold: i32) -> Requirements {
        let mut attributes = HashMap::new();
        attributes.insert(attribute.to_string(), threshold);
        Requirements {
            attributes,
            flags: Vec::new(),
        }
    }

    #[test]
    fn attribute_threshold_boundary_is_inclusive() {
        let gate = requirements("wisdom", 3);
        let mut player = PlayerState::default();
        player.apply_attribute_delta("wisdom", 2);
        assert!(!gate.met_by(&player));
        player.apply_attribute_delta("wisdom", 1);
        assert!(gate.met_by(&player));
    }

    #[test]
    fn missing_attribute_counts_as_zero() {
        let gate = requirements("compassion", 1);
        assert!(!gate.met_by(&PlayerState::default()));
        let zero_gate = requirements("compassion", 0);
        assert!(zero_gate.met_by(&PlayerState::default()));
    }

    #[test]
    fn flags_must_be_truthy() {
        let gate = Requirements {
            attributes: HashMap::new(),
            flags: vec!["blessed".to_string()],
        };
        let mut player = PlayerState::default();
        assert!(!gate.met_by(&player));
        player.set_flag("blessed", json!(false));
        assert!(!gate.met_by(&player));
        player.set_flag("blessed", json!(true));
        assert!(gate.met_by(&player));
    }

    #[test]
    fn both_sub_checks_must_pass() {
        let mut gate = requirements("wisdom", 1);
        gate.flags.push("blessed".to_string());
        let mut player = PlayerState::default();
        player.apply_attribute_delta("wisdom", 1);
        assert!(!gate.met_by(&player));
        player.set_flag("blessed", json!(1));
        assert!(gate.met_by(&player));
    }
}
