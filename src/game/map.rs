//! Procedural map generation.
//!
//! A map is a square grid with one guaranteed route (the win path) from a start
//! cell on the west edge to an end cell on the east edge. Larger maps also get
//! short dead-end branches hanging off the win path. Every other cell is empty
//! and cannot be entered.
//!
//! Paths only ever step east, north or south, so a route can never double back
//! past the column it came from. Generation is a random walk that restarts from
//! scratch whenever it paints itself into a corner; the number of restarts is
//! bounded by [`MapOptions::max_path_attempts`], after which a deterministic
//! route is used instead.

use std::collections::HashSet;
use std::fmt;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;

/// Maps smaller than this get only the win path.
pub const MIN_SIZE_FOR_DEAD_ENDS: usize = 5;
pub const DEFAULT_MAX_DEAD_END_LENGTH: usize = 2;
pub const DEFAULT_MAX_PATH_ATTEMPTS: usize = 1000;

/// Moves a path is allowed to make, in the order candidates are listed.
const PATH_MOVES: [Direction; 3] = [Direction::East, Direction::South, Direction::North];

/// A grid position. `y` grows southward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Stable string key (`"x,y"`) used for room lookup and graph node ids.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Neighbouring coordinate in `dir`, or `None` when it falls off a `size` grid.
    pub fn step(self, dir: Direction, size: usize) -> Option<Coord> {
        let next = match dir {
            Direction::North => Coord::new(self.x, self.y.checked_sub(1)?),
            Direction::South => Coord::new(self.x, self.y + 1),
            Direction::East => Coord::new(self.x + 1, self.y),
            Direction::West => Coord::new(self.x.checked_sub(1)?, self.y),
        };
        (next.x < size && next.y < size).then_some(next)
    }

    /// Direction that leads from `self` to an orthogonally adjacent `other`.
    pub fn direction_to(self, other: Coord) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|dir| self.step(*dir, usize::MAX) == Some(other))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Compass directions a player can move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    /// Parse a full direction name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Direction> {
        match s.trim().to_ascii_lowercase().as_str() {
            "north" => Some(Direction::North),
            "south" => Some(Direction::South),
            "east" => Some(Direction::East),
            "west" => Some(Direction::West),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Narrative category of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Start,
    End,
    Win,
    #[serde(rename = "deadend")]
    DeadEnd,
    Empty,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Start => "start",
            CellType::End => "end",
            CellType::Win => "win",
            CellType::DeadEnd => "deadend",
            CellType::Empty => "empty",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which neighbours of a cell can be entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exits {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl Exits {
    pub fn has(&self, dir: Direction) -> bool {
        match dir {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }

    /// Open directions in north, south, east, west order.
    pub fn open(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| self.has(*dir))
            .collect()
    }
}

/// Classification and exits of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellInfo {
    #[serde(rename = "type")]
    pub cell_type: CellType,
    pub exits: Exits,
}

/// Tunables for map generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    /// Maximum number of steps a dead-end branch grows past its first cell.
    pub max_dead_end_length: usize,
    /// Random walks tried before falling back to a deterministic win path.
    pub max_path_attempts: usize,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            max_dead_end_length: DEFAULT_MAX_DEAD_END_LENGTH,
            max_path_attempts: DEFAULT_MAX_PATH_ATTEMPTS,
        }
    }
}

/// An immutable generated map.
#[derive(Debug, Clone)]
pub struct GameMap {
    size: usize,
    start: Coord,
    end: Coord,
    win_path: Vec<Coord>,
    dead_end_paths: Vec<Vec<Coord>>,
    win_cells: HashSet<Coord>,
    dead_end_cells: HashSet<Coord>,
}

impl GameMap {
    /// Generate a map with the start on the west edge and the end on the east
    /// edge, each in a uniformly random row.
    pub fn create<R: Rng + ?Sized>(
        size: usize,
        options: MapOptions,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        if size == 0 {
            return Err(GameError::InvalidSize(size));
        }
        let start = Coord::new(0, rng.gen_range(0..size));
        let end = Coord::new(size - 1, rng.gen_range(0..size));
        Self::with_endpoints(size, start, end, options, rng)
    }

    /// Generate a map between explicit endpoints.
    pub fn with_endpoints<R: Rng + ?Sized>(
        size: usize,
        start: Coord,
        end: Coord,
        options: MapOptions,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        check_endpoints(size, start, end)?;

        let win_path = generate_win_path(size, start, end, options.max_path_attempts, rng);
        let win_cells: HashSet<Coord> = win_path.iter().copied().collect();
        let dead_end_paths = if size < MIN_SIZE_FOR_DEAD_ENDS {
            Vec::new()
        } else {
            generate_dead_ends(size, &win_path, &win_cells, options.max_dead_end_length, rng)
        };
        debug!(
            "Generated {}x{} map: start={} end={} win_path={} cells, {} dead ends",
            size,
            size,
            start,
            end,
            win_path.len(),
            dead_end_paths.len()
        );

        Ok(Self::assemble(size, start, end, win_path, dead_end_paths))
    }

    /// Build a map from explicit paths, checking every layout invariant.
    pub fn from_layout(
        size: usize,
        start: Coord,
        end: Coord,
        win_path: Vec<Coord>,
        dead_end_paths: Vec<Vec<Coord>>,
    ) -> Result<Self, GameError> {
        check_endpoints(size, start, end)?;
        let invalid =
            |msg: String| -> Result<Self, GameError> { Err(GameError::InvalidLayout(msg)) };

        if win_path.first() != Some(&start) || win_path.last() != Some(&end) {
            return invalid(format!("win path must run from {} to {}", start, end));
        }
        let mut seen = HashSet::new();
        for cell in &win_path {
            if cell.x >= size || cell.y >= size {
                return invalid(format!("win path cell {} is out of bounds", cell));
            }
            if !seen.insert(*cell) {
                return invalid(format!("win path revisits {}", cell));
            }
        }
        for pair in win_path.windows(2) {
            match pair[0].direction_to(pair[1]) {
                Some(dir) if PATH_MOVES.contains(&dir) => {}
                _ => {
                    return invalid(format!(
                        "win path step {} -> {} is not allowed",
                        pair[0], pair[1]
                    ))
                }
            }
        }

        for branch in &dead_end_paths {
            let Some(first) = branch.first() else {
                return invalid("dead end branch is empty".to_string());
            };
            if !Direction::ALL
                .into_iter()
                .filter_map(|dir| first.step(dir, size))
                .any(|n| win_path.contains(&n))
            {
                return invalid(format!("dead end {} does not touch the win path", first));
            }
            for cell in branch {
                if cell.x >= size || cell.y >= size {
                    return invalid(format!("dead end cell {} is out of bounds", cell));
                }
                if !seen.insert(*cell) {
                    return invalid(format!("dead end cell {} overlaps another path", cell));
                }
            }
            if branch.windows(2).any(|pair| pair[0].direction_to(pair[1]).is_none()) {
                return invalid("dead end branch is not contiguous".to_string());
            }
        }

        Ok(Self::assemble(size, start, end, win_path, dead_end_paths))
    }

    fn assemble(
        size: usize,
        start: Coord,
        end: Coord,
        win_path: Vec<Coord>,
        dead_end_paths: Vec<Vec<Coord>>,
    ) -> Self {
        let win_cells = win_path.iter().copied().collect();
        let dead_end_cells = dead_end_paths.iter().flatten().copied().collect();
        Self {
            size,
            start,
            end,
            win_path,
            dead_end_paths,
            win_cells,
            dead_end_cells,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn start(&self) -> Coord {
        self.start
    }

    pub fn end(&self) -> Coord {
        self.end
    }

    pub fn win_path(&self) -> &[Coord] {
        &self.win_path
    }

    pub fn dead_end_paths(&self) -> &[Vec<Coord>] {
        &self.dead_end_paths
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    /// Classify a cell. Win path membership beats dead-end membership; start
    /// and end only apply to cells on neither. Out-of-bounds cells are empty.
    pub fn cell_type(&self, x: usize, y: usize) -> CellType {
        let coord = Coord::new(x, y);
        if self.win_cells.contains(&coord) {
            CellType::Win
        } else if self.dead_end_cells.contains(&coord) {
            CellType::DeadEnd
        } else if coord == self.start {
            CellType::Start
        } else if coord == self.end {
            CellType::End
        } else {
            CellType::Empty
        }
    }

    /// Exits of a cell: a direction is open when the neighbour exists and is not empty.
    pub fn exits(&self, coord: Coord) -> Exits {
        let open = |dir| {
            coord
                .step(dir, self.size)
                .map(|n| self.cell_type(n.x, n.y) != CellType::Empty)
                .unwrap_or(false)
        };
        Exits {
            north: open(Direction::North),
            south: open(Direction::South),
            east: open(Direction::East),
            west: open(Direction::West),
        }
    }

    /// Cell classification and exits, or `None` outside the grid.
    pub fn cell(&self, x: usize, y: usize) -> Option<CellInfo> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(CellInfo {
            cell_type: self.cell_type(x, y),
            exits: self.exits(Coord::new(x, y)),
        })
    }

    /// ASCII rendering: `S` start, `E` end, `*` win path, `.` dead end.
    pub fn render(&self) -> String {
        let mut grid = vec![vec![' '; self.size]; self.size];
        for cell in &self.win_path {
            grid[cell.y][cell.x] = '*';
        }
        for cell in self.dead_end_paths.iter().flatten() {
            grid[cell.y][cell.x] = '.';
        }
        grid[self.start.y][self.start.x] = 'S';
        grid[self.end.y][self.end.x] = 'E';

        let rule = "-".repeat((self.size * 4).saturating_sub(1));
        let mut out = String::new();
        for row in grid {
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            out.push_str(&line.join(" | "));
            out.push('\n');
            out.push_str(&rule);
            out.push('\n');
        }
        out
    }
}

fn check_endpoints(size: usize, start: Coord, end: Coord) -> Result<(), GameError> {
    if size == 0 {
        return Err(GameError::InvalidSize(size));
    }
    for (which, coord) in [("start", start), ("end", end)] {
        if coord.x >= size || coord.y >= size {
            return Err(GameError::OutOfBounds { which, coord, size });
        }
    }
    if end.x < start.x {
        return Err(GameError::Unreachable { start, end });
    }
    Ok(())
}

/// Neighbours of `cell` reachable with a path move that are in bounds and not blocked.
fn valid_moves(cell: Coord, size: usize, blocked: &HashSet<Coord>) -> Vec<Coord> {
    PATH_MOVES
        .iter()
        .filter_map(|dir| cell.step(*dir, size))
        .filter(|next| !blocked.contains(next))
        .collect()
}

fn generate_win_path<R: Rng + ?Sized>(
    size: usize,
    start: Coord,
    end: Coord,
    max_attempts: usize,
    rng: &mut R,
) -> Vec<Coord> {
    for attempt in 1..=max_attempts {
        if let Some(path) = random_walk(size, start, end, rng) {
            debug!("Win path found on attempt {}", attempt);
            return path;
        }
    }
    warn!(
        "No random win path after {} attempts; using a direct route",
        max_attempts
    );
    direct_path(start, end)
}

/// One random walk from `start`; `None` when it gets stuck before reaching `end`.
fn random_walk<R: Rng + ?Sized>(
    size: usize,
    start: Coord,
    end: Coord,
    rng: &mut R,
) -> Option<Vec<Coord>> {
    let mut path = vec![start];
    let mut visited = HashSet::from([start]);
    let mut last = start;
    while last != end {
        let next = *valid_moves(last, size, &visited).choose(rng)?;
        path.push(next);
        visited.insert(next);
        last = next;
    }
    Some(path)
}

/// Vertical to the end row, then east. Valid whenever `end.x >= start.x`.
fn direct_path(start: Coord, end: Coord) -> Vec<Coord> {
    let mut path = vec![start];
    let mut cur = start;
    while cur.y != end.y {
        cur.y = if cur.y < end.y { cur.y + 1 } else { cur.y - 1 };
        path.push(cur);
    }
    while cur.x < end.x {
        cur.x += 1;
        path.push(cur);
    }
    path
}

fn generate_dead_ends<R: Rng + ?Sized>(
    size: usize,
    win_path: &[Coord],
    win_cells: &HashSet<Coord>,
    max_len: usize,
    rng: &mut R,
) -> Vec<Vec<Coord>> {
    let mut visited = win_cells.clone();
    let mut branches = Vec::new();

    for cell in &win_path[..win_path.len().saturating_sub(1)] {
        for candidate in valid_moves(*cell, size, win_cells) {
            if visited.contains(&candidate) {
                continue;
            }
            let mut branch = vec![candidate];
            visited.insert(candidate);
            let mut current = candidate;
            for _ in 0..max_len {
                let Some(&next) = valid_moves(current, size, &visited).choose(rng) else {
                    break;
                };
                branch.push(next);
                visited.insert(next);
                current = next;
            }
            branches.push(branch);
        }
    }

    branches
}
