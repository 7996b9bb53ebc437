use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use banyan_journey::data::archetypes::{load_archetype_catalog, ArchetypeCatalog};
use banyan_journey::data::scenes::load_act_catalog;
use banyan_journey::simulation::SceneLibrary;
use banyan_journey::systems::{ChoiceSource, PuzzleError, PuzzleOutcome, TransitionError};
use banyan_journey::world::{SaveDb, SaveRepository};
use banyan_journey::Engine;

const ACT_FILES: &[&str] = &["act1.json", "act2.json"];
const ARCHETYPE_FILE: &str = "archetypes.json";
const COMMANDS: &str = "Commands: look | choices | choose <id> | solve <answer> | meditate | state | log | archetypes | new [archetype] | save | load | tick [n] | quit";

fn main() {
    println!("Initializing Banyan Journey...");
    let (data_dir, save_path) = parse_paths(env::args().collect());

    let mut catalogs = Vec::new();
    for file in ACT_FILES {
        let path = data_dir.join(file);
        match load_act_catalog(&path) {
            Ok(catalog) => catalogs.push(catalog),
            Err(err) => {
                eprintln!("Failed to load {}: {}", path.display(), err);
                std::process::exit(1);
            }
        }
    }
    let library = match SceneLibrary::from_catalogs(catalogs) {
        Ok(library) => library,
        Err(err) => {
            eprintln!("Failed to compile scene graph: {}", err);
            std::process::exit(1);
        }
    };

    let archetypes = match load_archetype_catalog(data_dir.join(ARCHETYPE_FILE)) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("Failed to load archetypes: {}. Continuing without them.", err);
            ArchetypeCatalog::default()
        }
    };

    if let Some(parent) = save_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let repository: Option<Box<dyn SaveRepository>> = match SaveDb::open(&save_path) {
        Ok(db) => Some(Box::new(db)),
        Err(err) => {
            eprintln!(
                "Save store unavailable at {} ({}); playing in memory only.",
                save_path.display(),
                err
            );
            None
        }
    };

    let mut engine = match Engine::new(library, archetypes, repository) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Failed to start the engine: {}", err);
            std::process::exit(1);
        }
    };

    render_scene(&engine);
    println!("{}", COMMANDS);
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => println!("{}", COMMANDS),
            "look" => render_scene(&engine),
            "choices" => render_choices(&engine),
            "choose" => match parts.next() {
                Some(id) => choose(&mut engine, id),
                None => println!("Usage: choose <choice id>"),
            },
            "solve" => {
                let answer: Vec<&str> = parts.collect();
                if answer.is_empty() {
                    println!("Usage: solve <answer>");
                } else {
                    solve(&mut engine, &answer.join(" "));
                }
            }
            "meditate" => {
                if engine.perform_meditation() {
                    println!("You sit in stillness; something settles.");
                } else {
                    println!("This is no place for meditation.");
                }
            }
            "state" => render_state(&engine),
            "log" => {
                for line in engine.journey_log() {
                    println!("  {}", line);
                }
            }
            "archetypes" => render_archetypes(&engine),
            "new" => {
                engine.initialize(parts.next());
                render_scene(&engine);
            }
            "save" => {
                if engine.persist() {
                    println!("Journey saved.");
                } else {
                    println!("Save failed; see the log.");
                }
            }
            "load" => {
                if engine.restore() {
                    println!("Journey restored.");
                    render_scene(&engine);
                } else {
                    println!("No compatible save found.");
                }
            }
            "tick" => {
                let extra: u32 = parts.next().and_then(|v| v.parse().ok()).unwrap_or(1);
                for _ in 0..extra {
                    engine.tick();
                }
            }
            _ => println!("Unknown command: {} (try help)", cmd),
        }

        engine.tick();
    }
}

fn parse_paths(args: Vec<String>) -> (PathBuf, PathBuf) {
    let mut data_dir = PathBuf::from("./assets/data");
    let mut save_path = PathBuf::from("./assets/db/journey_save.db");
    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data" => {
                if let Some(value) = iter.next() {
                    data_dir = PathBuf::from(value);
                }
            }
            "--save" => {
                if let Some(value) = iter.next() {
                    save_path = PathBuf::from(value);
                }
            }
            _ => eprintln!("Ignoring unknown argument {}", arg),
        }
    }
    (data_dir, save_path)
}

fn choose(engine: &mut Engine, id: &str) {
    match engine.apply_choice(id) {
        Ok(_) => render_scene(engine),
        Err(TransitionError::ChoiceNotFound(_)) => {
            println!("That choice is not open to you right now.");
        }
        Err(err) => println!("The path falters: {}", err),
    }
}

fn solve(engine: &mut Engine, answer: &str) {
    match engine.submit_solution(answer) {
        Ok(PuzzleOutcome::Solved { .. }) => {
            println!("The answer rings true.");
            render_scene(engine);
        }
        Ok(PuzzleOutcome::Failed { next_scene }) => {
            println!("The answer falls flat.");
            if next_scene.is_some() {
                render_scene(engine);
            }
        }
        Err(PuzzleError::NoPuzzleActive) => println!("There is no riddle here."),
    }
}

fn render_scene(engine: &Engine) {
    match engine.current_scene() {
        Ok(scene) => {
            if let Some(title) = engine.act_title() {
                println!("=== {} ===", title);
            }
            println!("[{}] {}", scene.id, scene.title);
            println!("{}", scene.body);
            if let Some(puzzle) = &scene.puzzle {
                println!("Riddle: {}", puzzle.description);
            }
            render_choices(engine);
        }
        Err(err) => println!("Nowhere to stand: {}", err),
    }
}

fn render_choices(engine: &Engine) {
    let choices = engine.available_choices();
    if choices.is_empty() {
        println!("  (no choices available)");
        return;
    }
    for choice in choices {
        let badge = match choice.source {
            ChoiceSource::Standard => "",
            ChoiceSource::Interaction => " [interact]",
            ChoiceSource::ArchetypeBonus => " [birth-star]",
        };
        let id = choice.author_id.as_deref().unwrap_or(choice.key.as_str());
        println!("  {} | {}{}", id, choice.text, badge);
    }
}

fn render_state(engine: &Engine) {
    let snapshot = engine.snapshot();
    let position = engine.position();
    println!("Act {} | scene {}", position.act, position.scene_id);
    if let Some(archetype) = &snapshot.profile.archetype {
        let gana = snapshot
            .profile
            .gana
            .map(|gana| gana.as_str())
            .unwrap_or("unknown");
        println!("Archetype: {} ({})", archetype, gana);
    }
    let gunas = snapshot.profile.gunas;
    println!(
        "Gunas: sattva={} rajas={} tamas={}",
        gunas.sattva, gunas.rajas, gunas.tamas
    );

    let mut attributes: Vec<(&String, &i32)> = snapshot.player.attributes.iter().collect();
    attributes.sort_by_key(|(name, _)| name.as_str());
    for (name, value) in attributes {
        println!("  {} = {}", name, value);
    }
    if !snapshot.player.inventory.is_empty() {
        println!("Inventory: {}", snapshot.player.inventory.join(", "));
    }
    if !snapshot.player.special_items.is_empty() {
        let mut names: Vec<&str> = snapshot
            .player
            .special_items
            .values()
            .map(|item| item.name.as_str())
            .collect();
        names.sort_unstable();
        println!("Keepsakes: {}", names.join(", "));
    }
    let dharmic = snapshot.player.dharmic;
    println!(
        "Karma: {} | dharma={} artha={} kama={} moksha={}",
        snapshot.player.karma, dharmic.dharma, dharmic.artha, dharmic.kama, dharmic.moksha
    );
    let progression = snapshot.player.progression;
    println!(
        "Choices made: {} | puzzles solved: {} | quests completed: {}",
        progression.choices_made, progression.puzzles_solved, progression.quests_completed
    );
    if !snapshot.world.facts.is_empty() {
        let mut facts: Vec<(&String, &serde_json::Value)> = snapshot.world.facts.iter().collect();
        facts.sort_by_key(|(key, _)| key.as_str());
        println!("The world remembers:");
        for (key, value) in facts {
            println!("  {} = {}", key, value);
        }
    }
}

fn render_archetypes(engine: &Engine) {
    let archetypes = engine.archetypes();
    if archetypes.archetypes.is_empty() {
        println!("No archetypes are loaded.");
        return;
    }
    for archetype in &archetypes.archetypes {
        println!(
            "  {} | {} ({})",
            archetype.id,
            archetype.label,
            archetype.gana.as_str()
        );
        if !archetype.summary.is_empty() {
            println!("      {}", archetype.summary);
        }
    }
}
