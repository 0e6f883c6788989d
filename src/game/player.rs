use serde::{Deserialize, Serialize};

use crate::game::map::Coord;

/// Where the player is and how they got there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub position: Coord,
    /// Every cell entered, in order; the first element is the start cell.
    pub path_taken: Vec<Coord>,
    /// Reserved for item handling; nothing adds to it yet.
    pub inventory: Vec<String>,
}

impl PlayerState {
    pub fn new(start: Coord) -> Self {
        Self {
            position: start,
            path_taken: vec![start],
            inventory: Vec::new(),
        }
    }

    pub(crate) fn move_to(&mut self, coord: Coord) {
        self.position = coord;
        self.path_taken.push(coord);
    }

    /// ASCII trail of the path on a `size` grid: `S` marks the start, arrows
    /// point the way each cell was entered.
    pub fn render_path(&self, size: usize) -> String {
        let mut grid = vec![vec![' '; size]; size];
        for (i, cell) in self.path_taken.iter().enumerate() {
            if cell.x >= size || cell.y >= size {
                continue;
            }
            grid[cell.y][cell.x] = if i == 0 {
                'S'
            } else {
                let prev = self.path_taken[i - 1];
                if cell.x > prev.x {
                    '>'
                } else if cell.x < prev.x {
                    '<'
                } else if cell.y > prev.y {
                    'v'
                } else {
                    '^'
                }
            };
        }
        grid.into_iter()
            .map(|row| row.into_iter().map(String::from).collect::<Vec<_>>().join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_starts_at_start_and_appends() {
        let mut player = PlayerState::new(Coord::new(0, 1));
        assert_eq!(player.path_taken, vec![Coord::new(0, 1)]);
        player.move_to(Coord::new(1, 1));
        player.move_to(Coord::new(1, 0));
        assert_eq!(player.position, Coord::new(1, 0));
        assert_eq!(player.path_taken.len(), 3);
        assert!(player.inventory.is_empty());
    }

    #[test]
    fn render_path_draws_arrows() {
        let mut player = PlayerState::new(Coord::new(0, 1));
        player.move_to(Coord::new(1, 1));
        player.move_to(Coord::new(1, 0));
        let text = player.render_path(2);
        assert_eq!(text, "  ^\nS >");
    }
}
