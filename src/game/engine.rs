//! Command interpreter.
//!
//! A [`GameEngine`] owns one session: the map, the player, the rooms generated
//! so far and the journey graph. Each call to
//! [`execute_command`](GameEngine::execute_command) runs to completion
//! (including any wait on the content provider) before the next can start,
//! which `&mut self` enforces. Text for the player is collected as lines and
//! drained with [`take_output`](GameEngine::take_output).
//!
//! Construction is two-phase: [`GameEngine::new`] sets up state without I/O and
//! [`GameEngine::initialize`] generates and shows the first room.

use log::{debug, info, warn};

use crate::content::ContentProvider;
use crate::game::graph::{GraphData, GraphUpdate, JourneyGraph};
use crate::game::map::{Coord, Direction, GameMap};
use crate::game::player::PlayerState;
use crate::game::room::{Room, RoomCache};

pub const MSG_INVALID_COMMAND: &str = "Invalid command.";
pub const MSG_NO_EXIT: &str = "You can't go that way.";
pub const MSG_NOTHING_HERE: &str = "There's nothing here.";
pub const MSG_GAME_WON: &str = "Congratulations! You have reached the end of the game!";
pub const MSG_FAREWELL: &str = "Thanks for playing!";
pub const MSG_JOURNEY_OVER: &str = "Your journey is over.";

/// Verbs understood by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Look,
    /// `move`/`go`; the raw argument is kept so bad directions can be refused like missing exits.
    Move(String),
    Take(String),
    Use(String),
    Talk(String),
    Inventory,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(verb: &str, argument: &str) -> Command {
        let argument = argument.trim().to_lowercase();
        match verb.trim().to_ascii_lowercase().as_str() {
            "look" => Command::Look,
            "move" | "go" => Command::Move(argument),
            "take" => Command::Take(argument),
            "use" => Command::Use(argument),
            "talk" => Command::Talk(argument),
            "inventory" => Command::Inventory,
            "quit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Split a line into a lowercase verb and the rest as its argument.
pub fn split_input(line: &str) -> (String, String) {
    let lowered = line.trim().to_lowercase();
    let mut parts = lowered.split_whitespace();
    let verb = parts.next().unwrap_or("").to_string();
    let argument = parts.collect::<Vec<_>>().join(" ");
    (verb, argument)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Playing,
    /// The player reached the end cell.
    Won,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Ask the provider for room content.
    pub generate: bool,
    /// Log the player's trail and repeated generation requests.
    pub verbose: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            generate: true,
            verbose: false,
        }
    }
}

pub struct GameEngine<P> {
    map: GameMap,
    provider: P,
    options: EngineOptions,
    player: PlayerState,
    rooms: RoomCache,
    graph: JourneyGraph,
    output: Vec<String>,
    status: SessionStatus,
}

impl<P: ContentProvider> GameEngine<P> {
    pub fn new(map: GameMap, provider: P, options: EngineOptions) -> Self {
        let player = PlayerState::new(map.start());
        Self {
            map,
            provider,
            options,
            player,
            rooms: RoomCache::new(),
            graph: JourneyGraph::new(),
            output: Vec::new(),
            status: SessionStatus::Playing,
        }
    }

    /// Generate and show the starting room. A map whose start is also its end
    /// finishes here.
    pub async fn initialize(&mut self) {
        if self.options.verbose {
            info!("Map layout:\n{}", self.map.render());
        }
        let here = self.player.position;
        if self.options.generate {
            self.generate_room_at(here).await;
            self.show_room(false).await;
        }
        if here == self.map.end() {
            self.end_game().await;
        }
    }

    /// Run one command. Returns whether the player moved.
    pub async fn execute_command(&mut self, command: &str, argument: &str) -> bool {
        if self.status != SessionStatus::Playing {
            self.say(MSG_JOURNEY_OVER);
            return false;
        }
        let parsed = Command::parse(command, argument);
        debug!("Executing {:?} at {}", parsed, self.player.position);

        match parsed {
            Command::Look => {
                self.look().await;
                false
            }
            Command::Move(direction) => self.move_player(&direction).await,
            Command::Take(item) => {
                self.take_item(&item);
                false
            }
            Command::Use(item) => {
                self.use_item(&item);
                false
            }
            Command::Talk(npc) => {
                self.talk_to(&npc);
                false
            }
            Command::Inventory => {
                self.show_inventory();
                false
            }
            Command::Quit => {
                self.quit();
                false
            }
            Command::Unknown(_) => {
                self.say(MSG_INVALID_COMMAND);
                false
            }
        }
    }

    /// Show the current room, generating it first when it is missing.
    pub async fn look(&mut self) {
        self.show_room(true).await;
    }

    async fn show_room(&mut self, regenerate: bool) {
        let here = self.player.position;
        if regenerate && self.options.generate && !self.rooms.contains(here) {
            self.generate_room_at(here).await;
        }

        let Some(missing_narration) = self.rooms.get(here).map(|r| r.narration.is_none()) else {
            self.say(MSG_NOTHING_HERE);
            return;
        };
        if missing_narration && self.options.generate {
            let narration = match self.rooms.get(here) {
                Some(room) => self.provider.describe_room(room).await,
                None => None,
            };
            if let (Some(text), Some(room)) = (narration, self.rooms.get_mut(here)) {
                room.narration = Some(text);
            }
        }

        let view = self.rooms.get(here).map(|room| room.view().to_string());
        if let Some(text) = view {
            self.say(text);
        }
    }

    /// Create content for `coord` unless it already has some. Returns whether
    /// a new room was stored; a populated cell is left untouched.
    pub async fn generate_room_at(&mut self, coord: Coord) -> bool {
        if self.rooms.contains(coord) {
            if self.options.verbose {
                info!("Cell {} is already occupied.", coord);
            }
            return false;
        }
        let Some(cell) = self.map.cell(coord.x, coord.y) else {
            return false;
        };

        let Some(mut room) = self.provider.generate_room(&cell).await else {
            warn!("No room content produced for {}", coord);
            return false;
        };
        room.assign_ids();
        room.narration = self.provider.describe_room(&room).await;
        if let Some(colours) = self.provider.design_room(&room).await {
            room.ambience = colours;
        }
        debug!("Room '{}' placed at {}", room.name, coord);
        self.rooms.insert_new(coord, room)
    }

    async fn move_player(&mut self, argument: &str) -> bool {
        let here = self.player.position;
        let target = Direction::parse(argument).and_then(|dir| {
            if self.map.exits(here).has(dir) {
                here.step(dir, self.map.size()).map(|next| (dir, next))
            } else {
                None
            }
        });
        let Some((dir, next)) = target else {
            self.say(MSG_NO_EXIT);
            return false;
        };

        if self.options.generate && !self.rooms.contains(next) {
            self.generate_room_at(next).await;
        }
        self.player.move_to(next);
        self.say(format!("You move {}.", dir));
        if self.options.verbose {
            info!(
                "Path taken:\n{}",
                self.player.render_path(self.map.size())
            );
        }

        self.show_room(false).await;

        if next == self.map.end() {
            self.end_game().await;
        }
        true
    }

    async fn end_game(&mut self) {
        if self.status != SessionStatus::Playing {
            return;
        }
        let visited = self.rooms.along(&self.player.path_taken);
        let journey = if self.options.generate {
            self.provider.describe_journey(&visited).await
        } else {
            None
        };
        info!(
            "Player reached the end after {} steps",
            self.player.path_taken.len() - 1
        );

        self.say("");
        self.say(MSG_GAME_WON);
        let journey = journey.unwrap_or_else(|| self.journey_summary());
        self.say(journey);
        self.say(MSG_FAREWELL);
        self.status = SessionStatus::Won;
    }

    fn journey_summary(&self) -> String {
        let steps = self.player.path_taken.len() - 1;
        format!(
            "You found your way in {} step{}.",
            steps,
            if steps == 1 { "" } else { "s" }
        )
    }

    fn take_item(&mut self, item: &str) {
        if item.is_empty() {
            self.say("Take what?");
        } else {
            self.say(format!("You can't take the {} right now.", item));
        }
    }

    fn use_item(&mut self, item: &str) {
        if item.is_empty() {
            self.say("Use what?");
        } else {
            self.say(format!("You can't use the {} right now.", item));
        }
    }

    fn talk_to(&mut self, npc: &str) {
        if npc.is_empty() {
            self.say("Talk to whom?");
        } else {
            self.say(format!("The {} has nothing to say.", npc));
        }
    }

    fn show_inventory(&mut self) {
        if self.player.inventory.is_empty() {
            self.say("You are carrying nothing.");
        } else {
            let listing = format!("You are carrying: {}", self.player.inventory.join(", "));
            self.say(listing);
        }
    }

    fn quit(&mut self) {
        self.say(MSG_FAREWELL);
        self.status = SessionStatus::Quit;
    }

    fn say(&mut self, line: impl Into<String>) {
        self.output.push(line.into());
    }

    /// Drain the lines produced since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Full journey graph, rebuilt from the path.
    pub fn graph_data(&mut self) -> GraphData {
        let rooms = &self.rooms;
        self.graph
            .rebuild(&self.player.path_taken, |c| node_label(rooms, c))
    }

    /// Only what changed since the last graph call.
    pub fn graph_update(&mut self) -> GraphUpdate {
        let rooms = &self.rooms;
        self.graph
            .extend(&self.player.path_taken, |c| node_label(rooms, c))
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn rooms(&self) -> &RoomCache {
        &self.rooms
    }

    pub fn room_here(&self) -> Option<&Room> {
        self.rooms.get(self.player.position)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status != SessionStatus::Playing
    }
}

fn node_label(rooms: &RoomCache, coord: Coord) -> String {
    rooms
        .get(coord)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| coord.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map::{CellInfo, MapOptions};
    use crate::game::room::RoomExit;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that counts calls and fails the first `failures` room requests.
    #[derive(Default)]
    struct Scripted {
        failures: AtomicUsize,
        rooms: AtomicUsize,
        narrations: AtomicUsize,
        journeys: AtomicUsize,
    }

    impl Scripted {
        fn failing(n: usize) -> Self {
            Self {
                failures: AtomicUsize::new(n),
                ..Self::default()
            }
        }
    }

    impl ContentProvider for Scripted {
        async fn generate_room(&self, cell: &CellInfo) -> Option<Room> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return None;
            }
            let n = self.rooms.fetch_add(1, Ordering::SeqCst);
            Some(Room {
                id: String::new(),
                name: format!("Room {}", n),
                desc: format!("A {} room.", cell.cell_type),
                exits: cell
                    .exits
                    .open()
                    .into_iter()
                    .map(|dir| RoomExit {
                        id: String::new(),
                        dir,
                        desc: dir.to_string(),
                        block: None,
                    })
                    .collect(),
                items: Vec::new(),
                on_enter: None,
                on_exit: None,
                on_look: String::new(),
                narration: None,
                ambience: Vec::new(),
            })
        }

        async fn describe_room(&self, room: &Room) -> Option<String> {
            self.narrations.fetch_add(1, Ordering::SeqCst);
            Some(format!("You stand in {}.", room.name))
        }

        async fn describe_journey(&self, rooms: &[Room]) -> Option<String> {
            self.journeys.fetch_add(1, Ordering::SeqCst);
            Some(format!("A journey of {} rooms.", rooms.len()))
        }
    }

    fn line_map() -> GameMap {
        let start = Coord::new(0, 0);
        let end = Coord::new(2, 0);
        GameMap::from_layout(3, start, end, vec![start, Coord::new(1, 0), end], vec![]).unwrap()
    }

    fn detour_map() -> GameMap {
        let start = Coord::new(0, 0);
        let end = Coord::new(2, 2);
        let path = vec![
            start,
            Coord::new(0, 1),
            Coord::new(1, 1),
            Coord::new(2, 1),
            end,
        ];
        GameMap::from_layout(3, start, end, path, vec![]).unwrap()
    }

    fn offline() -> EngineOptions {
        EngineOptions {
            generate: false,
            verbose: false,
        }
    }

    #[tokio::test]
    async fn initialize_generates_and_shows_first_room() {
        let mut engine = GameEngine::new(line_map(), Scripted::default(), EngineOptions::default());
        engine.initialize().await;
        assert_eq!(engine.rooms().len(), 1);
        let room = engine.room_here().unwrap();
        assert!(!room.id.is_empty());
        assert_eq!(engine.take_output(), vec!["You stand in Room 0.".to_string()]);
    }

    #[tokio::test]
    async fn east_succeeds_when_neighbour_is_open() {
        let mut engine = GameEngine::new(line_map(), Scripted::default(), offline());
        engine.initialize().await;
        assert!(engine.execute_command("move", "east").await);
        assert_eq!(engine.player().position, Coord::new(1, 0));
        assert_eq!(engine.player().path_taken.len(), 2);
        let out = engine.take_output();
        assert_eq!(out[0], "You move east.");
        assert_eq!(out[1], MSG_NOTHING_HERE);
    }

    #[tokio::test]
    async fn east_fails_when_neighbour_is_empty() {
        let mut engine = GameEngine::new(detour_map(), Scripted::default(), offline());
        engine.initialize().await;
        assert!(!engine.execute_command("go", "east").await);
        assert!(!engine.execute_command("go", "west").await);
        assert!(!engine.execute_command("go", "north").await);
        assert!(!engine.execute_command("go", "sideways").await);
        assert_eq!(engine.player().position, Coord::new(0, 0));
        assert_eq!(engine.player().path_taken, vec![Coord::new(0, 0)]);
        assert!(engine.take_output().iter().all(|l| l == MSG_NO_EXIT));
        assert!(engine.execute_command("go", "south").await);
    }

    #[tokio::test]
    async fn generation_is_idempotent_per_cell() {
        let mut engine = GameEngine::new(line_map(), Scripted::default(), EngineOptions::default());
        let here = Coord::new(0, 0);
        assert!(engine.generate_room_at(here).await);
        let first_id = engine.rooms().get(here).unwrap().id.clone();
        assert!(!engine.generate_room_at(here).await);
        assert_eq!(engine.rooms().len(), 1);
        assert_eq!(engine.rooms().get(here).unwrap().id, first_id);
        assert_eq!(engine.provider().rooms.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_generation_is_retried_by_look() {
        let mut engine = GameEngine::new(line_map(), Scripted::failing(1), EngineOptions::default());
        engine.initialize().await;
        assert!(engine.rooms().is_empty());
        assert_eq!(engine.take_output(), vec![MSG_NOTHING_HERE.to_string()]);

        engine.execute_command("look", "").await;
        assert_eq!(engine.rooms().len(), 1);
        assert_eq!(engine.take_output(), vec!["You stand in Room 0.".to_string()]);
    }

    #[tokio::test]
    async fn reaching_the_end_finishes_once() {
        let mut engine = GameEngine::new(line_map(), Scripted::default(), EngineOptions::default());
        engine.initialize().await;
        engine.take_output();
        assert!(engine.execute_command("move", "east").await);
        assert!(!engine.is_finished());
        assert!(engine.execute_command("move", "east").await);
        assert_eq!(engine.status(), SessionStatus::Won);

        let out = engine.take_output();
        assert!(out.contains(&MSG_GAME_WON.to_string()));
        assert!(out.contains(&"A journey of 3 rooms.".to_string()));
        assert_eq!(out.last().unwrap(), MSG_FAREWELL);
        assert_eq!(engine.provider().journeys.load(Ordering::SeqCst), 1);

        assert!(!engine.execute_command("move", "west").await);
        assert_eq!(engine.take_output(), vec![MSG_JOURNEY_OVER.to_string()]);
        assert_eq!(engine.provider().journeys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn degenerate_map_ends_on_initialize() {
        let mut rng = StdRng::seed_from_u64(4);
        let origin = Coord::new(0, 0);
        let map = GameMap::with_endpoints(3, origin, origin, MapOptions::default(), &mut rng)
            .unwrap();
        assert_eq!(map.win_path(), &[origin]);
        let mut engine = GameEngine::new(map, Scripted::default(), EngineOptions::default());
        engine.initialize().await;
        assert_eq!(engine.status(), SessionStatus::Won);
        engine.execute_command("look", "").await;
        let out = engine.take_output();
        assert_eq!(out.iter().filter(|l| *l == MSG_GAME_WON).count(), 1);
        assert_eq!(engine.provider().journeys.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_generation_never_calls_provider() {
        let mut engine = GameEngine::new(line_map(), Scripted::default(), offline());
        engine.initialize().await;
        engine.execute_command("look", "").await;
        engine.execute_command("go", "east").await;
        engine.execute_command("go", "east").await;
        assert!(engine.rooms().is_empty());
        let p = engine.provider();
        assert_eq!(p.rooms.load(Ordering::SeqCst), 0);
        assert_eq!(p.journeys.load(Ordering::SeqCst), 0);
        let out = engine.take_output();
        assert!(out.contains(&"You found your way in 2 steps.".to_string()));
    }

    #[tokio::test]
    async fn stubs_and_unknown_verbs_leave_state_alone() {
        let mut engine = GameEngine::new(line_map(), Scripted::default(), offline());
        engine.initialize().await;
        let before = engine.player().clone();
        for (verb, arg) in [
            ("take", "lamp"),
            ("use", "key"),
            ("talk", "wizard"),
            ("inventory", ""),
            ("dance", ""),
            ("", ""),
        ] {
            assert!(!engine.execute_command(verb, arg).await);
        }
        assert_eq!(engine.player(), &before);
        let out = engine.take_output();
        assert_eq!(out[3], "You are carrying nothing.");
        assert_eq!(out[4], MSG_INVALID_COMMAND);
        assert_eq!(out[5], MSG_INVALID_COMMAND);
    }

    #[tokio::test]
    async fn quit_ends_the_session() {
        let mut engine = GameEngine::new(line_map(), Scripted::default(), offline());
        engine.initialize().await;
        engine.execute_command("QUIT", "").await;
        assert_eq!(engine.status(), SessionStatus::Quit);
        assert_eq!(engine.take_output(), vec![MSG_FAREWELL.to_string()]);
    }

    #[tokio::test]
    async fn graph_tracks_the_journey() {
        let mut engine = GameEngine::new(detour_map(), Scripted::default(), EngineOptions::default());
        engine.initialize().await;
        let full = engine.graph_data();
        assert_eq!(full.nodes.len(), 1);
        assert_eq!(full.nodes[0].label, "Room 0");

        engine.execute_command("go", "south").await;
        let update = engine.graph_update();
        assert_eq!(update.nodes.len(), 1);
        assert_eq!(update.nodes[0].id, "0,1");
        assert_eq!(update.links.len(), 1);
        assert_eq!(update.current_node.unwrap().id, "0,1");

        engine.execute_command("go", "north").await;
        let update = engine.graph_update();
        assert!(update.nodes.is_empty());
        assert_eq!(update.links.len(), 1);

        let full = engine.graph_data();
        assert_eq!(full.nodes.len(), 2);
        assert_eq!(full.links.len(), 2);
    }

    #[test]
    fn split_input_lowercases_and_joins_arguments() {
        assert_eq!(
            split_input("  Take   Rusty Key "),
            ("take".to_string(), "rusty key".to_string())
        );
        assert_eq!(split_input(""), (String::new(), String::new()));
        assert_eq!(Command::parse("GO", " North "), Command::Move("north".into()));
        assert_eq!(Command::parse("take", "Rusty KEY"), Command::Take("rusty key".into()));
    }

    #[tokio::test]
    async fn verbose_regeneration_keeps_the_stored_room() {
        let options = EngineOptions {
            generate: true,
            verbose: true,
        };
        let mut engine = GameEngine::new(line_map(), Scripted::default(), options);
        engine.initialize().await;
        let here = engine.player().position;
        let stored = engine.room_here().unwrap().clone();

        assert!(!engine.generate_room_at(here).await);
        engine.execute_command("look", "").await;
        assert_eq!(engine.room_here(), Some(&stored));
        assert_eq!(engine.provider().rooms.load(Ordering::SeqCst), 1);
        assert_eq!(engine.provider().narrations.load(Ordering::SeqCst), 1);
    }
}
