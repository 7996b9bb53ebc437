pub mod archetypes;
pub mod scenes;

pub use archetypes::{load_archetype_catalog, ArchetypeCatalog, ArchetypeDataError, ArchetypeDef};
pub use scenes::{
    load_act_catalog, ActCatalog, ChoiceDef, EffectsDef, InteractionDef, MeditationDef, PuzzleDef,
    SceneDataError, SceneDef, SpecialItemDef,
};
