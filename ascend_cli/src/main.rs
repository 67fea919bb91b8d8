use ascend_core::*;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "ascend")]
#[command(about = "Bodyweight progression tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive workout session (default)
    Start {
        /// Comma-separated categories (push,pull,dips,legs,core)
        #[arg(long)]
        categories: Option<String>,
    },

    /// Show unlocked levels per category
    Levels,

    /// Show the workout history
    History {
        /// Show at most this many entries
        #[arg(long, default_value_t = HISTORY_CAP)]
        limit: usize,
    },

    /// List the progression ladder for a category (or all)
    Catalog {
        /// Category id (push, pull, dips, legs, core)
        category: Option<String>,
    },

    /// Ask the recommendation collaborator for advice
    Advise,
}

fn main() -> Result<()> {
    ascend_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Some(Commands::Start { categories }) => cmd_start(data_dir, categories, &config),
        Some(Commands::Levels) => cmd_levels(data_dir),
        Some(Commands::History { limit }) => cmd_history(data_dir, limit),
        Some(Commands::Catalog { category }) => cmd_catalog(data_dir, category, &config),
        Some(Commands::Advise) => cmd_advise(data_dir, &config),
        None => cmd_start(data_dir, None, &config),
    }
}

fn parse_categories(raw: Option<&str>) -> Vec<CategoryId> {
    match raw {
        None => CategoryId::ALL.to_vec(),
        Some(raw) => raw
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                match CategoryId::from_str(part) {
                    Ok(cat) => Some(cat),
                    Err(e) => {
                        eprintln!("{}. Skipping.", e);
                        None
                    }
                }
            })
            .collect(),
    }
}

fn cmd_start(data_dir: PathBuf, categories: Option<String>, config: &Config) -> Result<()> {
    std::fs::create_dir_all(&data_dir)?;

    let catalog = default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let mut levels = LevelStore::load(FileStore::new(&data_dir));
    let mut history = HistoryStore::load(FileStore::new(&data_dir));

    let queue = parse_categories(categories.as_deref());
    if queue.is_empty() {
        println!("No categories to train - nothing to do.");
        return Ok(());
    }

    let (mut engine, effects) = SessionEngine::start(catalog, &levels, &queue);
    engine.configure(&config.progression);
    println!("\nSession started:");
    for planned in &engine.plan().queue {
        println!(
            "  {} (from level {})",
            planned.category, planned.starting_level
        );
    }
    print_effects(&effects);

    loop {
        let Some(view) = current_view(&engine, &levels) else {
            println!("\nNo exercise available for this category.");
            engine.end_early();
            break;
        };

        println!();
        println!("─────────────────────────────────────────");
        println!(
            "  {} · {} (level {}{})",
            view.category,
            view.name,
            view.level,
            if view.level == 0 { ", warm-up" } else { "" }
        );
        let (total_reps, total_seconds) = engine.totals();
        println!(
            "  Wave {} · unlocked level {} · so far: {} reps, {} s",
            engine.wave_number(),
            view.unlocked,
            total_reps,
            total_seconds
        );

        let value = match prompt_work(&view)? {
            Some(value) => value,
            None => {
                engine.end_early();
                println!("\nSession ended - unsaved work discarded.");
                break;
            }
        };

        let action = match prompt_action()? {
            Some(action) => action,
            None => {
                engine.end_early();
                println!("\nSession ended - unsaved work discarded.");
                break;
            }
        };

        match action {
            UserAction::Wave => match engine.log_wave(&mut levels, value) {
                Ok(effects) => print_effects(&effects),
                Err(Error::Validation(msg)) => println!("  ! {}", msg),
                Err(e) => return Err(e),
            },
            UserAction::Up | UserAction::Down => {
                let direction = if matches!(action, UserAction::Up) {
                    Direction::Up
                } else {
                    Direction::Down
                };
                match engine.change_level(&mut levels, direction, value) {
                    Ok(effects) => print_effects(&effects),
                    Err(Error::Validation(msg)) => println!("  ! {}", msg),
                    Err(e) => return Err(e),
                }
            }
            UserAction::Pick => {
                let Some(line) = read_line("  Level to switch to: ")? else {
                    engine.end_early();
                    println!("\nSession ended - unsaved work discarded.");
                    break;
                };
                match line.trim().parse::<u8>() {
                    Ok(level) => match engine.select_level(&levels, level) {
                        Ok(effects) => print_effects(&effects),
                        Err(Error::Validation(msg)) => println!("  ! {}", msg),
                        Err(e) => return Err(e),
                    },
                    Err(_) => println!("  ! Enter a level number"),
                }
            }
            UserAction::Finish => {
                match engine.finish_movement(&mut levels, &mut history, value) {
                    Ok(outcome) => {
                        print_effects(&outcome.effects);
                        print_entry(&outcome.entry);
                        match outcome.next_category {
                            Some(next) => println!("\nNext up: {}", next),
                            None => {
                                println!("\nSession complete!");
                                break;
                            }
                        }
                    }
                    Err(Error::Validation(msg)) => println!("  ! {}", msg),
                    Err(e) => return Err(e),
                }
            }
            UserAction::Quit => {
                engine.end_early();
                println!("\nSession ended - unsaved work discarded.");
                break;
            }
        }
    }

    Ok(())
}

/// Cloned display info for the current exercise, so the engine can be
/// borrowed mutably afterwards
struct ExerciseView {
    category: CategoryId,
    name: String,
    level: u8,
    unlocked: u8,
    hold_seconds: Option<u32>,
}

fn current_view<S: KeyValue>(
    engine: &SessionEngine<'_>,
    levels: &LevelStore<S>,
) -> Option<ExerciseView> {
    let (category, movement) = engine.current_exercise()?;
    Some(ExerciseView {
        category,
        name: movement.name.clone(),
        level: movement.level,
        unlocked: levels.get(category),
        hold_seconds: movement.hold_seconds(),
    })
}

/// Ask for this wave's work value. Returns None on EOF (treated as quit).
fn prompt_work(view: &ExerciseView) -> Result<Option<u32>> {
    match view.hold_seconds {
        None => {
            let Some(line) = read_line("  Reps this wave: ")? else {
                return Ok(None);
            };
            Ok(Some(line.trim().parse::<u32>().unwrap_or(0)))
        }
        Some(target) => {
            let prompt = format!("  Seconds held (Enter runs the {}s countdown): ", target);
            let Some(line) = read_line(&prompt)? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                Ok(Some(run_countdown(target)))
            } else {
                Ok(Some(line.parse::<u32>().unwrap_or(0)))
            }
        }
    }
}

/// Run the hold countdown at a 1-second tick, printing the remaining time
fn run_countdown(target: u32) -> u32 {
    let mut timer = Timer::countdown(target);
    timer.toggle();
    println!("  Hold! {} s", timer.value());
    loop {
        std::thread::sleep(std::time::Duration::from_secs(1));
        match timer.tick() {
            Some(TimerEvent::Updated(value)) => {
                print!("\r  Hold! {} s  ", value);
                let _ = io::stdout().flush();
            }
            Some(TimerEvent::Completed) => {
                println!("\r  Done!        ");
                return target;
            }
            None => return timer.value(),
        }
    }
}

enum UserAction {
    Wave,
    Up,
    Down,
    Pick,
    Finish,
    Quit,
}

/// Ask for the next action. Returns None on EOF (treated as quit).
fn prompt_action() -> Result<Option<UserAction>> {
    let Some(input) =
        read_line("  Action [w]ave / [u]p / [d]own / [p]ick / [f]inish / [q]uit: ")?
    else {
        return Ok(None);
    };

    let action = match input.trim().to_lowercase().as_str() {
        "u" => UserAction::Up,
        "d" => UserAction::Down,
        "p" => UserAction::Pick,
        "f" => UserAction::Finish,
        "q" => UserAction::Quit,
        _ => UserAction::Wave,
    };
    Ok(Some(action))
}

/// Prompted line read; None at end of input
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input))
}

fn print_effects(effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::WaveLogged { wave, level, work } => {
                let (amount, unit) = match work {
                    Work::Reps(n) => (n, "reps"),
                    Work::DurationSeconds(n) => (n, "s"),
                };
                println!("  ✓ Wave {} logged at level {}: {} {}", wave, level, amount, unit);
            }
            Effect::LevelUnlocked { category, level } => {
                println!("  ★ Level {} unlocked for {}!", level, category);
            }
            Effect::AtLowestLevel => println!("  ! Already at the lowest level"),
            Effect::LevelLocked => println!("  ! That level is still locked"),
            Effect::MovementChanged { name, level } => {
                println!("  → {} (level {})", name, level);
            }
            Effect::TimerReset { .. } => {}
        }
    }
}

fn print_entry(entry: &WorkoutEntry) {
    println!();
    println!(
        "  Logged: {} · {} · level {} achieved",
        entry.category, entry.movement, entry.level_achieved
    );
    if let Some(reps) = entry.total_reps {
        println!("    total reps: {}", reps);
    }
    if let Some(seconds) = entry.duration_seconds {
        println!("    total hold: {} s", seconds);
    }
    println!("    waves: {}", entry.waves.len());
}

fn cmd_levels(data_dir: PathBuf) -> Result<()> {
    let levels = LevelStore::load(FileStore::new(&data_dir));

    println!("Unlocked levels:");
    for cat in CategoryId::ALL {
        println!("  {:<5} level {}", cat.name(), levels.get(cat));
    }
    Ok(())
}

fn cmd_history(data_dir: PathBuf, limit: usize) -> Result<()> {
    let history = HistoryStore::load(FileStore::new(&data_dir));

    if history.is_empty() {
        println!("No workouts logged yet.");
        return Ok(());
    }

    for entry in history.recent(limit) {
        let total = match (entry.total_reps, entry.duration_seconds) {
            (Some(reps), Some(seconds)) => format!("{} reps, {} s", reps, seconds),
            (Some(reps), None) => format!("{} reps", reps),
            (None, Some(seconds)) => format!("{} s", seconds),
            (None, None) => "-".into(),
        };
        println!(
            "{}  {:<5} {} (level {}) - {} in {} wave(s)",
            entry.date.format("%Y-%m-%d"),
            entry.category.name(),
            entry.movement,
            entry.level_achieved,
            total,
            entry.waves.len()
        );
    }
    Ok(())
}

fn cmd_catalog(data_dir: PathBuf, category: Option<String>, config: &Config) -> Result<()> {
    let catalog = default_catalog();
    let levels = LevelStore::load(FileStore::new(&data_dir));

    let selected: Vec<CategoryId> = match category.as_deref() {
        Some(raw) => match CategoryId::from_str(raw) {
            Ok(cat) => vec![cat],
            Err(e) => {
                eprintln!("{}", e);
                return Ok(());
            }
        },
        None => CategoryId::ALL.to_vec(),
    };

    for id in selected {
        let Some(cat) = catalog.category(id) else {
            continue;
        };
        let unlocked = levels.get(id);
        println!("\n{} (unlocked level {}):", cat.name, unlocked);
        for movement in &cat.progressions {
            let marker = if movement.level == 0 {
                "~"
            } else if movement.level <= unlocked {
                "✓"
            } else {
                "✗"
            };
            let measure = match movement.measure {
                Measure::Reps { .. } => format!(
                    "{} reps to unlock",
                    movement.unlock_threshold(config.progression.target_reps)
                ),
                Measure::Hold {
                    default_seconds, ..
                } => format!("{} s hold", default_seconds),
            };
            println!(
                "  {} [{:>2}] {:<26} {}",
                marker, movement.level, movement.name, measure
            );
        }
    }
    Ok(())
}

fn cmd_advise(data_dir: PathBuf, config: &Config) -> Result<()> {
    let levels = LevelStore::load(FileStore::new(&data_dir));
    let history = HistoryStore::load(FileStore::new(&data_dir));

    let request = build_request(&history, &levels, config.progression.target_reps);
    let text = match &config.recommend.command {
        Some(command) => {
            println!("Asking your coach...\n");
            request_recommendations(&CommandBackend::new(command), &request)
        }
        None => {
            tracing::info!("No recommendation command configured; using fallback");
            ascend_core::recommend::FALLBACK_MESSAGE.to_string()
        }
    };

    println!("{}", text);
    Ok(())
}
