//! Game core: map generation, rooms, player state and the command interpreter.

pub mod engine;
pub mod errors;
pub mod graph;
pub mod map;
pub mod player;
pub mod room;

pub use engine::{Command, EngineOptions, GameEngine, SessionStatus};
pub use errors::GameError;
pub use graph::{GraphData, GraphUpdate, JourneyGraph};
pub use map::{CellInfo, CellType, Coord, Direction, Exits, GameMap, MapOptions};
pub use player::PlayerState;
pub use room::{Room, RoomCache};
