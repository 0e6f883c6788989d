//! Template rooms for play without a language model.
//!
//! Names and descriptions are drawn from small per-category tables; exits
//! always match the ones the cell actually has.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::content::ContentProvider;
use crate::game::map::{CellInfo, CellType, Direction};
use crate::game::room::{Room, RoomExit};

const WIN_NAMES: &[&str] = &[
    "Lantern Hall",
    "Carved Gallery",
    "Whispering Corridor",
    "Mapmaker's Study",
    "Sunken Archway",
];
const DEAD_END_NAMES: &[&str] = &[
    "Collapsed Cellar",
    "Rat-Gnawed Closet",
    "Flooded Alcove",
    "Bone Niche",
];
const START_NAMES: &[&str] = &["Traveller's Rest", "Gatehouse"];
const END_NAMES: &[&str] = &["Hall of the Summit", "Starlit Vault"];

fn describe_kind(kind: CellType) -> (&'static str, &'static str) {
    match kind {
        CellType::Start => (
            "A warm hearth crackles beside a worn bench. Travellers have set out from here before you.",
            "A faded banner reads: the way onward lies east.",
        ),
        CellType::End => (
            "Light pours through a high window onto a pedestal crowned with gold.",
            "You feel the weight of the road lift from your shoulders.",
        ),
        CellType::Win => (
            "Torches burn in iron sconces and the floor is worn smooth by many feet.",
            "Scratched arrows on the wall point further in.",
        ),
        CellType::DeadEnd => (
            "The ceiling sags low and the air is stale. Something skitters in the dark.",
            "Nothing here but dust and a feeling you took a wrong turn.",
        ),
        CellType::Empty => (
            "Solid rock. You should not be here.",
            "Only stone.",
        ),
    }
}

fn exit_desc(dir: Direction) -> String {
    match dir {
        Direction::North => "A narrow stair climbs north.".to_string(),
        Direction::South => "A sloping tunnel runs south.".to_string(),
        Direction::East => "An open archway leads east.".to_string(),
        Direction::West => "A low door opens to the west.".to_string(),
    }
}

fn ambience_for(kind: CellType) -> Vec<String> {
    let colours: [&str; 3] = match kind {
        CellType::Start => ["#f6d365", "#fda085", "#fbc2eb"],
        CellType::End => ["#fceabb", "#f8b500", "#fff1a8"],
        CellType::Win => ["#2c3e50", "#4ca1af", "#c4e0e5"],
        CellType::DeadEnd => ["#232526", "#414345", "#1f1c2c"],
        CellType::Empty => ["#000000", "#000000", "#000000"],
    };
    colours.iter().map(|c| c.to_string()).collect()
}

/// Offline provider. Seed it for reproducible room names.
pub struct OfflineContent {
    rng: Mutex<StdRng>,
}

impl Default for OfflineContent {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineContent {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick_name(&self, kind: CellType) -> String {
        let table = match kind {
            CellType::Start => START_NAMES,
            CellType::End => END_NAMES,
            CellType::DeadEnd => DEAD_END_NAMES,
            CellType::Win | CellType::Empty => WIN_NAMES,
        };
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        table.choose(&mut *rng).copied().unwrap_or("Nameless Room").to_string()
    }
}

impl ContentProvider for OfflineContent {
    async fn generate_room(&self, cell: &CellInfo) -> Option<Room> {
        let (desc, on_look) = describe_kind(cell.cell_type);
        let exits = cell
            .exits
            .open()
            .into_iter()
            .map(|dir| RoomExit {
                id: String::new(),
                dir,
                desc: exit_desc(dir),
                block: None,
            })
            .collect();
        Room {
            id: String::new(),
            name: self.pick_name(cell.cell_type),
            desc: desc.to_string(),
            exits,
            items: Vec::new(),
            on_enter: None,
            on_exit: None,
            on_look: on_look.to_string(),
            narration: None,
            ambience: Vec::new(),
        }
        .validated()
    }

    async fn describe_room(&self, room: &Room) -> Option<String> {
        let mut text = format!("{}\n{} {}", room.name, room.desc, room.on_look);
        if room.exits.is_empty() {
            text.push_str("\nThere is no way out.");
        } else {
            for exit in &room.exits {
                text.push('\n');
                text.push_str(&exit.desc);
            }
        }
        Some(text)
    }

    async fn describe_journey(&self, rooms: &[Room]) -> Option<String> {
        let names: Vec<&str> = rooms.iter().map(|r| r.name.as_str()).collect();
        let text = match names.as_slice() {
            [] => "You arrived without ever leaving the place you began.".to_string(),
            [only] => format!("Your whole journey took place in the {}.", only),
            [first, last] => format!(
                "From the {} you pressed straight on to the {}, and the road ended there.",
                first, last
            ),
            [first, .., last] => format!(
                "From the {} you wandered through {} rooms, past {}, until the {} rewarded your persistence.",
                first,
                names.len(),
                names[1..names.len() - 1].join(", "),
                last
            ),
        };
        Some(text)
    }

    async fn design_room(&self, room: &Room) -> Option<Vec<String>> {
        let kind = if DEAD_END_NAMES.contains(&room.name.as_str()) {
            CellType::DeadEnd
        } else if START_NAMES.contains(&room.name.as_str()) {
            CellType::Start
        } else if END_NAMES.contains(&room.name.as_str()) {
            CellType::End
        } else {
            CellType::Win
        };
        Some(ambience_for(kind))
    }
}
