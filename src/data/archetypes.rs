use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::simulation::{Gana, Gunas};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchetypeCatalog {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub archetypes: Vec<ArchetypeDef>,
}

/// A selectable birth-star persona. Seeds the player's profile and starting
/// attribute bonuses at initialization; its id keys bonus choices on scenes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeDef {
    pub id: String,
    pub label: String,
    pub gana: Gana,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub gunas: Gunas,
    #[serde(default)]
    pub starting_attributes: HashMap<String, i32>,
}

#[derive(Debug)]
pub enum ArchetypeDataError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
    Validation(String),
}

impl std::fmt::Display for ArchetypeDataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchetypeDataError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path, source)
            }
            ArchetypeDataError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path, source)
            }
            ArchetypeDataError::Validation(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ArchetypeDataError {}

pub fn load_archetype_catalog(
    path: impl AsRef<Path>,
) -> Result<ArchetypeCatalog, ArchetypeDataError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ArchetypeDataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let catalog: ArchetypeCatalog =
        serde_json::from_str(&raw).map_err(|source| ArchetypeDataError::Json {
            path: path.display().to_string(),
            source,
        })?;
    catalog.validate()?;
    Ok(catalog)
}

impl ArchetypeCatalog {
    pub fn validate(&self) -> Result<(), ArchetypeDataError> {
        let mut ids = HashSet::new();
        for archetype in &self.archetypes {
            if archetype.id.trim().is_empty() {
                return Err(ArchetypeDataError::Validation(
                    "archetype id cannot be empty".to_string(),
                ));
            }
            if !ids.insert(archetype.id.clone()) {
                return Err(ArchetypeDataError::Validation(format!(
                    "duplicate archetype id {}",
                    archetype.id
                )));
            }
            if archetype.label.trim().is_empty() {
                return Err(ArchetypeDataError::Validation(format!(
                    "archetype {} has no label",
                    archetype.id
                )));
            }
        }
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&ArchetypeDef> {
        self.archetypes.iter().find(|archetype| archetype.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_fail_validation() {
        let archetype = ArchetypeDef {
            id: "ashwini".to_string(),
            label: "Ashwini".to_string(),
            gana: Gana::Deva,
            summary: String::new(),
            gunas: Gunas::default(),
            starting_attributes: HashMap::new(),
        };
        let catalog = ArchetypeCatalog {
            schema_version: 1,
            archetypes: vec![archetype.clone(), archetype],
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn find_returns_declared_archetype() {
        let catalog = ArchetypeCatalog {
            schema_version: 1,
            archetypes: vec![ArchetypeDef {
                id: "bharani".to_string(),
                label: "Bharani".to_string(),
                gana: Gana::Manushya,
                summary: String::new(),
                gunas: Gunas {
                    sattva: 1,
                    rajas: 2,
                    tamas: 0,
                },
                starting_attributes: HashMap::new(),
            }],
        };
        assert!(catalog.find("bharani").is_some());
        assert!(catalog.find("revati").is_none());
    }
}
