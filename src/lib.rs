//! # genmud - a procedurally generated text adventure
//!
//! Every game is played on a fresh square grid. A guaranteed route (the *win
//! path*) runs from the west edge to the east edge, short *dead-end* branches
//! sprout from it, and every other cell is solid. Rooms are written lazily by
//! a content provider the first time the player looks at or enters a cell.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use genmud::content::OfflineContent;
//! use genmud::game::{EngineOptions, GameEngine, GameMap, MapOptions};
//! use rand::SeedableRng;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!     let map = GameMap::create(6, MapOptions::default(), &mut rng)?;
//!     let mut engine = GameEngine::new(map, OfflineContent::seeded(7), EngineOptions::default());
//!     engine.initialize().await;
//!     engine.execute_command("move", "east").await;
//!     for line in engine.take_output() {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - map generation, rooms, player state and the command interpreter
//! - [`content`] - room and narration providers (offline templates, generative API)
//! - [`config`] - TOML configuration with environment overrides
//! - [`shell`] - console prompt loop

pub mod config;
pub mod content;
pub mod game;
pub mod shell;
