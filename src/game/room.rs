//! Generated room content and the per-session cache that holds it.
//!
//! Rooms follow a fixed JSON shape so that content produced by a language
//! model can be validated before it reaches the game:
//!
//! ```json
//! { "name": "...", "desc": "...", "onLook": "...",
//!   "exits": [{ "dir": "east", "desc": "...", "block": "..." }],
//!   "items": [{ "name": "...", "desc": "...", "isTakeable": true }] }
//! ```

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::map::{Coord, Direction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomExit {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub dir: Direction,
    pub desc: String,
    /// What (if anything) stands in the way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub is_takeable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_look: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_take: Option<String>,
}

/// Narrative content bound to one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub desc: String,
    pub exits: Vec<RoomExit>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_enter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_exit: Option<String>,
    pub on_look: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    /// Gradient colours describing the room's mood, when a designer supplied them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ambience: Vec<String>,
}

impl Room {
    /// Parse and validate a generated room. Any schema violation yields `None`.
    pub fn from_json(text: &str) -> Option<Room> {
        match serde_json::from_str::<Room>(text) {
            Ok(room) => room.validated(),
            Err(e) => {
                debug!("Generated room failed to parse: {}", e);
                None
            }
        }
    }

    /// Reject rooms with blank required text or the same direction listed twice.
    pub fn validated(self) -> Option<Room> {
        if self.name.trim().is_empty() || self.desc.trim().is_empty() {
            debug!("Generated room is missing a name or description");
            return None;
        }
        for (i, exit) in self.exits.iter().enumerate() {
            if self.exits[..i].iter().any(|e| e.dir == exit.dir) {
                debug!("Generated room lists exit {} twice", exit.dir);
                return None;
            }
        }
        Some(self)
    }

    /// Give the room and each of its exits a fresh unique id.
    pub fn assign_ids(&mut self) {
        self.id = new_id();
        for exit in &mut self.exits {
            exit.id = new_id();
        }
    }

    /// Text shown by `look`: the narration when present, else the raw description.
    pub fn view(&self) -> &str {
        self.narration.as_deref().unwrap_or(&self.desc)
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Rooms generated so far this session, keyed by cell.
#[derive(Debug, Default)]
pub struct RoomCache {
    rooms: HashMap<Coord, Room>,
}

impl RoomCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.rooms.contains_key(&coord)
    }

    pub fn get(&self, coord: Coord) -> Option<&Room> {
        self.rooms.get(&coord)
    }

    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Room> {
        self.rooms.get_mut(&coord)
    }

    /// Store `room` unless the cell already has one. Existing content is never
    /// replaced; returns whether the room was stored.
    pub fn insert_new(&mut self, coord: Coord, room: Room) -> bool {
        if self.rooms.contains_key(&coord) {
            return false;
        }
        self.rooms.insert(coord, room);
        true
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Rooms along a path, in order, skipping cells that never got content.
    pub fn along(&self, path: &[Coord]) -> Vec<Room> {
        path.iter()
            .filter_map(|c| self.rooms.get(c))
            .cloned()
            .collect()
    }
}
