// Re-export core modules for use by the binary or other consumers
pub mod core;
pub mod data;
pub mod rules;
pub mod simulation;
pub mod systems;
pub mod world;

// Expose the engine facade and the types needed for interaction
pub use crate::core::engine::{Engine, EngineError};
pub use crate::core::serialization::SaveState;
pub use crate::simulation::{Position, SceneLibrary, StateSnapshot};
