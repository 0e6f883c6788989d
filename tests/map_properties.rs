// Layout invariants checked across many seeded maps.

use std::collections::HashSet;

use genmud::game::{CellType, Coord, Direction, GameMap, MapOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn maps() -> impl Iterator<Item = GameMap> {
    (1..=14usize).flat_map(|size| {
        (0..12u64).map(move |seed| {
            let mut rng = StdRng::seed_from_u64(seed * 31 + size as u64);
            GameMap::create(size, MapOptions::default(), &mut rng).unwrap()
        })
    })
}

#[test]
fn endpoints_sit_on_opposite_edges() {
    for map in maps() {
        assert_eq!(map.start().x, 0);
        assert_eq!(map.end().x, map.size() - 1);
        assert_eq!(map.win_path().first(), Some(&map.start()));
        assert_eq!(map.win_path().last(), Some(&map.end()));
    }
}

#[test]
fn win_path_never_steps_west_or_repeats() {
    for map in maps() {
        let mut seen = HashSet::new();
        for cell in map.win_path() {
            assert!(seen.insert(*cell), "win path revisits {}", cell);
        }
        for pair in map.win_path().windows(2) {
            let dir = pair[0].direction_to(pair[1]).expect("adjacent cells");
            assert_ne!(dir, Direction::West);
        }
    }
}

#[test]
fn dead_ends_stay_off_the_win_path_and_short() {
    for map in maps() {
        let win: HashSet<Coord> = map.win_path().iter().copied().collect();
        let mut used = HashSet::new();
        if map.size() < 5 {
            assert!(map.dead_end_paths().is_empty());
        }
        for branch in map.dead_end_paths() {
            // root cell plus up to max_dead_end_length further steps
            let max_cells = MapOptions::default().max_dead_end_length + 1;
            assert!(
                !branch.is_empty() && branch.len() <= max_cells,
                "branch of {} cells",
                branch.len()
            );
            for cell in branch {
                assert!(!win.contains(cell));
                assert!(used.insert(*cell), "dead ends overlap at {}", cell);
                assert_eq!(map.cell_type(cell.x, cell.y), CellType::DeadEnd);
            }
        }
    }
}

#[test]
fn exits_lead_only_to_open_neighbours() {
    for map in maps() {
        for y in 0..map.size() {
            for x in 0..map.size() {
                let here = Coord::new(x, y);
                let exits = map.exits(here);
                for dir in Direction::ALL {
                    let Some(next) = here.step(dir, map.size()) else {
                        assert!(!exits.has(dir));
                        continue;
                    };
                    let open = map.cell_type(next.x, next.y) != CellType::Empty;
                    assert_eq!(exits.has(dir), open, "{} -> {}", here, dir);
                }
            }
        }
    }
}

#[test]
fn same_seed_same_layout() {
    let make = || {
        let mut rng = StdRng::seed_from_u64(99);
        GameMap::create(9, MapOptions::default(), &mut rng).unwrap()
    };
    let (a, b) = (make(), make());
    assert_eq!(a.win_path(), b.win_path());
    assert_eq!(a.dead_end_paths(), b.dead_end_paths());
    assert_eq!(a.render(), b.render());
}

#[test]
fn zero_size_is_rejected() {
    let mut rng = StdRng::seed_from_u64(1);
    assert!(GameMap::create(0, MapOptions::default(), &mut rng).is_err());
}
