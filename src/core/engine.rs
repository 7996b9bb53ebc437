use bevy_ecs::world::World;
use bevy_utils::tracing::warn;

use crate::core::ecs::create_world;
use crate::core::serialization::{
    apply_state_to_world, extract_state_from_world, is_compatible_version,
};
use crate::data::archetypes::ArchetypeCatalog;
use crate::simulation::{
    snapshot_state, JourneyLog, PlayerProfile, PlayerState, Position, Scene, SceneLibrary,
    StateSnapshot, WorldFacts,
};
use crate::systems::meditation;
use crate::systems::puzzle::{self, PuzzleError, PuzzleOutcome};
use crate::systems::resolver;
use crate::systems::transition::{self, TransitionError};
use crate::systems::ResolvedChoice;
use crate::world::repository::SaveRepository;

#[derive(Debug)]
pub enum EngineError {
    NoContent,
    SceneNotFound { act: u32, scene_id: String },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NoContent => write!(f, "no acts are loaded"),
            EngineError::SceneNotFound { act, scene_id } => {
                write!(f, "act {} has no scene {}", act, scene_id)
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Cooperative persistence timers, pumped by `Engine::tick` once per player
/// interaction. A mutation arms the debounce; the autosave counter runs on
/// its own cadence. Both write the full snapshot, so overlapping fires are
/// last-write-wins safe.
#[derive(Debug, Clone)]
pub struct SaveTimer {
    pub debounce_window: u32,
    pub autosave_interval: u32,
    pending_debounce: Option<u32>,
    ticks_since_autosave: u32,
}

impl Default for SaveTimer {
    fn default() -> Self {
        Self {
            debounce_window: 3,
            autosave_interval: 12,
            pending_debounce: None,
            ticks_since_autosave: 0,
        }
    }
}

impl SaveTimer {
    /// (Re)start the debounce countdown. A newer arm supersedes the pending
    /// one; an explicit persist never clears it.
    fn arm(&mut self) {
        self.pending_debounce = Some(self.debounce_window.max(1));
    }

    fn reset(&mut self) {
        self.pending_debounce = None;
        self.ticks_since_autosave = 0;
    }

    fn tick(&mut self) -> bool {
        let mut fire = false;
        if let Some(remaining) = self.pending_debounce.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.pending_debounce = None;
                fire = true;
            }
        }
        if self.autosave_interval > 0 {
            self.ticks_since_autosave += 1;
            if self.ticks_since_autosave >= self.autosave_interval {
                self.ticks_since_autosave = 0;
                fire = true;
            }
        }
        fire
    }

    pub fn debounce_pending(&self) -> bool {
        self.pending_debounce.is_some()
    }
}

/// The engine facade: owns the ECS world, the archetype catalog, and the
/// save repository. Every public operation of the narrative engine goes
/// through here; there is no global state, so independent engines coexist.
pub struct Engine {
    world: World,
    archetypes: ArchetypeCatalog,
    repository: Option<Box<dyn SaveRepository>>,
    timer: SaveTimer,
}

impl Engine {
    pub fn new(
        library: SceneLibrary,
        archetypes: ArchetypeCatalog,
        repository: Option<Box<dyn SaveRepository>>,
    ) -> Result<Self, EngineError> {
        let start = library
            .first_act()
            .map(|graph| Position::new(graph.act, graph.entry_scene.clone()))
            .ok_or(EngineError::NoContent)?;
        let world = create_world(library, start);
        let mut engine = Self {
            world,
            archetypes,
            repository,
            timer: SaveTimer::default(),
        };
        engine.initialize(None);
        Ok(engine)
    }

    /// Resets player, world, and position to a fresh journey. Idempotent:
    /// nothing from a prior game survives a second call. An archetype
    /// selection seeds the profile and starting attribute bonuses from the
    /// catalog; an unknown id falls back to a neutral profile.
    pub fn initialize(&mut self, archetype: Option<&str>) {
        *self.world.resource_mut::<PlayerState>() = PlayerState::default();
        *self.world.resource_mut::<WorldFacts>() = WorldFacts::default();
        *self.world.resource_mut::<JourneyLog>() = JourneyLog::default();

        let mut profile = PlayerProfile::default();
        if let Some(id) = archetype {
            match self.archetypes.find(id) {
                Some(def) => {
                    profile.archetype = Some(def.id.clone());
                    profile.gana = Some(def.gana);
                    profile.gunas = def.gunas;
                    let mut bonuses: Vec<(&String, &i32)> =
                        def.starting_attributes.iter().collect();
                    bonuses.sort_by_key(|(name, _)| name.as_str());
                    let mut player = self.world.resource_mut::<PlayerState>();
                    for (name, bonus) in bonuses {
                        player.apply_attribute_delta(name, *bonus);
                    }
                }
                None => {
                    warn!("unknown archetype {}; starting with a neutral profile", id);
                }
            }
        }
        *self.world.resource_mut::<PlayerProfile>() = profile;

        let start = self
            .world
            .resource::<SceneLibrary>()
            .first_act()
            .map(|graph| Position::new(graph.act, graph.entry_scene.clone()));
        if let Some(start) = start {
            *self.world.resource_mut::<Position>() = start;
        }
        self.timer.reset();
        self.world
            .resource_mut::<JourneyLog>()
            .record("The journey begins");
    }

    pub fn position(&self) -> Position {
        self.world.resource::<Position>().clone()
    }

    pub fn archetypes(&self) -> &ArchetypeCatalog {
        &self.archetypes
    }

    pub fn act_title(&self) -> Option<&str> {
        let position = self.world.resource::<Position>();
        self.world
            .resource::<SceneLibrary>()
            .act(position.act)
            .map(|graph| graph.title.as_str())
    }

    pub fn current_scene(&self) -> Result<&Scene, EngineError> {
        let position = self.world.resource::<Position>();
        self.world
            .resource::<SceneLibrary>()
            .scene(position.act, &position.scene_id)
            .ok_or_else(|| EngineError::SceneNotFound {
                act: position.act,
                scene_id: position.scene_id.clone(),
            })
    }

    /// Deep copy of profile, player, and world state for read-only
    /// inspection; listing and evaluating choices never mutates the engine.
    pub fn snapshot(&self) -> StateSnapshot {
        snapshot_state(&self.world)
    }

    pub fn available_choices(&self) -> Vec<ResolvedChoice> {
        let position = self.world.resource::<Position>();
        let scene = match self
            .world
            .resource::<SceneLibrary>()
            .scene(position.act, &position.scene_id)
        {
            Some(scene) => scene,
            None => {
                warn!(
                    "scene lookup failed while listing choices: act {} scene {}",
                    position.act, position.scene_id
                );
                return Vec::new();
            }
        };
        let snapshot = self.snapshot();
        let mut diagnostics = Vec::new();
        let choices = resolver::available_choices(scene, &snapshot, &mut diagnostics);
        for line in diagnostics {
            warn!("{}", line);
        }
        choices
    }

    pub fn apply_choice(&mut self, choice_id: &str) -> Result<Position, TransitionError> {
        let before = self.world.resource::<Position>().act;
        let result = transition::apply_choice(&mut self.world, choice_id);
        match &result {
            Ok(position) => {
                self.timer.arm();
                if position.act != before {
                    self.persist();
                }
            }
            // navigation failed after the effects already landed; the
            // mutated state still wants a save
            Err(TransitionError::UnknownScene { .. } | TransitionError::UnknownAct(_)) => {
                self.timer.arm();
            }
            Err(TransitionError::ChoiceNotFound(_)) => {}
        }
        result
    }

    pub fn submit_solution(&mut self, submitted: &str) -> Result<PuzzleOutcome, PuzzleError> {
        let result = puzzle::submit_solution(&mut self.world, submitted);
        if result.is_ok() {
            self.timer.arm();
        }
        result
    }

    pub fn perform_meditation(&mut self) -> bool {
        let applied = meditation::perform_meditation(&mut self.world);
        if applied {
            self.timer.arm();
        }
        applied
    }

    pub fn journey_log(&self) -> &[String] {
        &self.world.resource::<JourneyLog>().entries
    }

    /// Immediate snapshot write. Failure is logged, never fatal: the engine
    /// keeps playing in memory. Does not cancel a pending debounced save.
    pub fn persist(&mut self) -> bool {
        let Some(repository) = self.repository.as_mut() else {
            return false;
        };
        let state = extract_state_from_world(&self.world);
        match repository.store(&state) {
            Ok(()) => true,
            Err(err) => {
                warn!("persist failed: {}", err);
                self.world
                    .resource_mut::<JourneyLog>()
                    .record(format!("save failed: {}", err));
                false
            }
        }
    }

    /// Reads the stored snapshot back. Missing, corrupt, or incompatible
    /// data returns false and leaves the in-memory state untouched.
    pub fn restore(&mut self) -> bool {
        let loaded = match self.repository.as_mut() {
            Some(repository) => repository.load(),
            None => return false,
        };
        match loaded {
            Ok(Some(state)) => {
                if !is_compatible_version(state.version) {
                    warn!("save format {} is not compatible", state.version);
                    return false;
                }
                apply_state_to_world(state, &mut self.world);
                self.world
                    .resource_mut::<JourneyLog>()
                    .record("Journey restored from the last save");
                true
            }
            Ok(None) => false,
            Err(err) => {
                warn!("restore failed: {}", err);
                false
            }
        }
    }

    /// Pump the cooperative save timers. Call once per player interaction.
    pub fn tick(&mut self) {
        if self.timer.tick() {
            self.persist();
        }
    }

    pub fn save_timer(&self) -> &SaveTimer {
        &self.timer
    }

    pub fn configure_saves(&mut self, debounce_window: u32, autosave_interval: u32) {
        self.timer.debounce_window = debounce_window;
        self.timer.autosave_interval = autosave_interval;
    }
}
