pub mod ecs;
pub mod engine;
pub mod serialization;

pub use ecs::create_world;
pub use engine::{Engine, EngineError, SaveTimer};
pub use serialization::{
    apply_state_to_world, extract_state_from_world, is_compatible_version, load_state_from_json,
    save_state_to_json, SaveState, SAVE_FORMAT_VERSION,
};
