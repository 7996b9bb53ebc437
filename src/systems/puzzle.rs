use bevy_ecs::world::World;

use crate::simulation::{JourneyLog, PlayerState, Position, SceneLibrary};

#[derive(Debug)]
pub enum PuzzleError {
    NoPuzzleActive,
}

impl std::fmt::Display for PuzzleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PuzzleError::NoPuzzleActive => write!(f, "the current scene has no puzzle"),
        }
    }
}

impl std::error::Error for PuzzleError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleOutcome {
    Solved { next_scene: String },
    Failed { next_scene: Option<String> },
}

/// Solutions compare after trimming surrounding whitespace, ignoring ASCII
/// case. A wrong answer routes to the declared failure scene, or stays put
/// when none is declared; it is an outcome, never an error.
pub fn submit_solution(world: &mut World, submitted: &str) -> Result<PuzzleOutcome, PuzzleError> {
    let position = world.resource::<Position>().clone();
    let puzzle = world
        .resource::<SceneLibrary>()
        .scene(position.act, &position.scene_id)
        .and_then(|scene| scene.puzzle.clone());
    let Some(puzzle) = puzzle else {
        return Err(PuzzleError::NoPuzzleActive);
    };

    if solution_matches(submitted, &puzzle.solution) {
        world
            .resource_mut::<PlayerState>()
            .progression
            .puzzles_solved += 1;
        world
            .resource_mut::<Position>()
            .set_scene(puzzle.success.clone());
        world
            .resource_mut::<JourneyLog>()
            .record(format!("Puzzle solved at {}", position.scene_id));
        Ok(PuzzleOutcome::Solved {
            next_scene: puzzle.success,
        })
    } else {
        if let Some(failure) = &puzzle.failure {
            world.resource_mut::<Position>().set_scene(failure.clone());
        }
        world
            .resource_mut::<JourneyLog>()
            .record(format!("Puzzle failed at {}", position.scene_id));
        Ok(PuzzleOutcome::Failed {
            next_scene: puzzle.failure,
        })
    }
}

fn solution_matches(submitted: &str, expected: &str) -> bool {
    submitted.trim().eq_ignore_ascii_case(expected.trim())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::data::scenes::{ActCatalog, PuzzleDef, SceneDef};
    use crate::simulation::{PlayerProfile, SceneLibrary, WorldFacts};

    fn scene(id: &str, puzzle: Option<PuzzleDef>) -> SceneDef {
        SceneDef {
            id: id.to_string(),
            title: id.to_string(),
            body: "Narration.".to_string(),
            choices: Vec::new(),
            interactions: Vec::new(),
            archetype_choices: HashMap::new(),
            puzzle,
            meditation: None,
        }
    }

    fn world_with_puzzle(failure: Option<&str>) -> World {
        let puzzle = PuzzleDef {
            description: "What walks the ghats at dusk?".to_string(),
            solution: "shadow".to_string(),
            success: "SOLVED".to_string(),
            failure: failure.map(str::to_string),
        };
        let library = SceneLibrary::from_catalogs(vec![ActCatalog {
            schema_version: 1,
            act: 1,
            title: "Act 1".to_string(),
            entry_scene: "RIDDLE".to_string(),
            scenes: vec![
                scene("RIDDLE", Some(puzzle)),
                scene("SOLVED", None),
                scene("LOST", None),
            ],
        }])
        .unwrap();
        let mut world = World::new();
        world.insert_resource(library);
        world.insert_resource(PlayerProfile::default());
        world.insert_resource(PlayerState::default());
        world.insert_resource(WorldFacts::default());
        world.insert_resource(JourneyLog::default());
        world.insert_resource(Position::new(1, "RIDDLE"));
        world
    }

    #[test]
    fn normalized_match_routes_to_success() {
        let mut world = world_with_puzzle(Some("LOST"));
        let outcome = submit_solution(&mut world, "  Shadow ").unwrap();
        assert_eq!(
            outcome,
            PuzzleOutcome::Solved {
                next_scene: "SOLVED".to_string()
            }
        );
        assert_eq!(*world.resource::<Position>(), Position::new(1, "SOLVED"));
        assert_eq!(
            world.resource::<PlayerState>().progression.puzzles_solved,
            1
        );
    }

    #[test]
    fn mismatch_routes_to_failure_scene() {
        let mut world = world_with_puzzle(Some("LOST"));
        let outcome = submit_solution(&mut world, "moonlight").unwrap();
        assert_eq!(
            outcome,
            PuzzleOutcome::Failed {
                next_scene: Some("LOST".to_string())
            }
        );
        assert_eq!(*world.resource::<Position>(), Position::new(1, "LOST"));
        assert_eq!(
            world.resource::<PlayerState>().progression.puzzles_solved,
            0
        );
    }

    #[test]
    fn mismatch_without_failure_scene_stays_put() {
        let mut world = world_with_puzzle(None);
        let outcome = submit_solution(&mut world, "moonlight").unwrap();
        assert_eq!(outcome, PuzzleOutcome::Failed { next_scene: None });
        assert_eq!(*world.resource::<Position>(), Position::new(1, "RIDDLE"));
    }

    #[test]
    fn scene_without_puzzle_reports_none_active() {
        let mut world = world_with_puzzle(None);
        world.resource_mut::<Position>().set_scene("SOLVED");
        let err = submit_solution(&mut world, "shadow").unwrap_err();
        assert!(matches!(err, PuzzleError::NoPuzzleActive));
        assert_eq!(*world.resource::<Position>(), Position::new(1, "SOLVED"));
    }
}
