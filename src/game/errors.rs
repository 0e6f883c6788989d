use thiserror::Error;

use crate::game::map::Coord;

/// Errors that can arise while building a map.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// The grid must have at least one cell per side.
    #[error("invalid map size: {0}")]
    InvalidSize(usize),

    /// A start or end cell lies outside the grid.
    #[error("{which} cell {coord} is outside a {size}x{size} grid")]
    OutOfBounds {
        which: &'static str,
        coord: Coord,
        size: usize,
    },

    /// Paths only move east, north or south, so the end can never lie west of the start.
    #[error("end {end} cannot be reached from start {start}")]
    Unreachable { start: Coord, end: Coord },

    /// Returned by `GameMap::from_layout` when the supplied paths break a map invariant.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}
