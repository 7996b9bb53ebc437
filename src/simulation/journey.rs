use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

const JOURNEY_LOG_CAP: usize = 200;

/// The single mutable cursor into the scene graph: current act and the
/// scene within it. Act and scene always change together via `jump`, or
/// scene alone within the same act via `set_scene`.
#[derive(Resource, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub act: u32,
    pub scene_id: String,
}

impl Position {
    pub fn new(act: u32, scene_id: impl Into<String>) -> Self {
        Self {
            act,
            scene_id: scene_id.into(),
        }
    }

    pub fn jump(&mut self, act: u32, scene_id: impl Into<String>) {
        self.act = act;
        self.scene_id = scene_id.into();
    }

    pub fn set_scene(&mut self, scene_id: impl Into<String>) {
        self.scene_id = scene_id.into();
    }
}

/// Append-only record of notable engine events (choices taken, puzzles
/// solved, act transitions), capped to the most recent entries.
#[derive(Resource, Debug, Clone, Default)]
pub struct JourneyLog {
    pub entries: Vec<String>,
}

impl JourneyLog {
    pub fn record(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
        if self.entries.len() > JOURNEY_LOG_CAP {
            let overflow = self.entries.len() - JOURNEY_LOG_CAP;
            self.entries.drain(..overflow);
        }
    }
}
