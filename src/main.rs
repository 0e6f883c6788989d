//! Binary entrypoint for the genmud CLI.
//!
//! Commands:
//! - `play [--size <n>] [--seed <s>] [--no-generate]` - start a game on the console
//! - `init` - write a starter `genmud.toml`
//! - `map [--size <n>] [--seed <s>]` - print a generated layout and exit
//!
//! See the library crate docs for module-level details: `genmud::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use genmud::config::Config;
use genmud::content::{ContentProvider, OfflineContent, Provider};
use genmud::game::{EngineOptions, GameEngine, GameMap, MapOptions};
use genmud::shell;

#[derive(Parser)]
#[command(name = "genmud")]
#[command(about = "A procedurally generated text adventure")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "genmud.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a new game on the console
    Play {
        /// Side length of the map (overrides config and MAP_SIZE)
        #[arg(short, long)]
        size: Option<usize>,
        /// Seed for a reproducible layout
        #[arg(long)]
        seed: Option<u64>,
        /// Do not generate room content
        #[arg(long)]
        no_generate: bool,
    },
    /// Write a default configuration file
    Init,
    /// Print a generated map layout
    Map {
        #[arg(short, long)]
        size: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            if tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
                return Err(anyhow!("{} already exists; not overwriting", cli.config));
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Play {
            size,
            seed,
            no_generate,
        } => {
            let mut config = load_config(&cli.config, cli.verbose).await?;
            if let Some(size) = size {
                config.game.map_size = size;
            }
            if no_generate {
                config.game.generate = false;
            }
            config.validate()?;

            let map = build_map(&config, seed)?;
            let provider = match seed {
                Some(seed) if config.content.provider == "offline" => {
                    Provider::Offline(OfflineContent::seeded(seed))
                }
                _ => Provider::from_config(&config.content),
            };
            info!(
                "Starting genmud v{} on a {}x{} map with {} content",
                env!("CARGO_PKG_VERSION"),
                config.game.map_size,
                config.game.map_size,
                provider.name()
            );
            play(map, provider, &config).await?;
        }
        Commands::Map { size, seed } => {
            let mut config = load_config(&cli.config, cli.verbose).await?;
            if let Some(size) = size {
                config.game.map_size = size;
            }
            config.validate()?;
            let map = build_map(&config, seed)?;
            println!("{}", map.render());
            println!(
                "start {}  end {}  win path {} cells  dead ends {}",
                map.start(),
                map.end(),
                map.win_path().len(),
                map.dead_end_paths().len()
            );
        }
    }

    Ok(())
}

/// File (or defaults), then environment, then logging.
async fn load_config(path: &str, verbosity: u8) -> Result<Config> {
    let mut config = Config::load_or_default(path).await?;
    config.apply_env()?;
    init_logging(&Some(config.clone()), verbosity);
    Ok(config)
}

fn build_map(config: &Config, seed: Option<u64>) -> Result<GameMap> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let options = MapOptions {
        max_dead_end_length: config.game.max_dead_end_length,
        max_path_attempts: config.game.max_path_attempts,
    };
    Ok(GameMap::create(config.game.map_size, options, &mut rng)?)
}

async fn play<P: ContentProvider>(map: GameMap, provider: P, config: &Config) -> Result<()> {
    let options = EngineOptions {
        generate: config.game.generate,
        verbose: config.game.verbose,
    };
    let mut engine = GameEngine::new(map, provider, options);
    engine.initialize().await;
    shell::run_console(&mut engine).await?;
    info!("Session ended: {:?}", engine.status());
    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let configured = config
        .as_ref()
        .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Mutex::new(f);
        // Keep the console clear for play unless stderr is an interactive terminal and -v was given
        let mirror = verbosity > 0 && atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if mirror {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
