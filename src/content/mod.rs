//! Content collaborators.
//!
//! The game core never writes prose itself. It hands a cell descriptor to a
//! [`ContentProvider`] and gets back a [`Room`] (or nothing), and asks the same
//! provider to narrate rooms and the finished journey. A provider that fails
//! returns `None`; the engine leaves the cell empty and may ask again later.
//!
//! Two providers ship with the crate:
//! - [`OfflineContent`] - template rooms, no network.
//! - `GeminiContent` - a generative language API over HTTP (feature `remote-content`).

pub mod offline;
#[cfg(feature = "remote-content")]
pub mod gemini;

use log::info;

use crate::config::ContentConfig;
use crate::game::map::CellInfo;
use crate::game::room::Room;

pub use offline::OfflineContent;
#[cfg(feature = "remote-content")]
pub use gemini::GeminiContent;

/// Request/response contract for generated content.
///
/// Calls are awaited one at a time by a single session, so implementations
/// need no internal coordination beyond what `&self` access requires.
#[allow(async_fn_in_trait)]
pub trait ContentProvider {
    /// Write a room for a cell of the given type and exits.
    async fn generate_room(&self, cell: &CellInfo) -> Option<Room>;

    /// Turn a room into prose for the player.
    async fn describe_room(&self, room: &Room) -> Option<String>;

    /// Summarise a finished journey through `rooms`, in visiting order.
    async fn describe_journey(&self, rooms: &[Room]) -> Option<String>;

    /// Gradient colours that set the room's mood. Optional.
    async fn design_room(&self, _room: &Room) -> Option<Vec<String>> {
        None
    }
}

/// Provider selected from configuration.
pub enum Provider {
    Offline(OfflineContent),
    #[cfg(feature = "remote-content")]
    Gemini(GeminiContent),
}

impl Provider {
    /// Pick the provider named in config, falling back to offline templates
    /// when the remote one is unavailable or has no API key.
    pub fn from_config(config: &ContentConfig) -> Self {
        match config.provider.as_str() {
            #[cfg(feature = "remote-content")]
            "gemini" if !config.api_key.is_empty() => {
                info!("Using generative content from model {}", config.model);
                Provider::Gemini(GeminiContent::new(config.clone()))
            }
            "offline" => Provider::Offline(OfflineContent::new()),
            other => {
                info!(
                    "Content provider '{}' unavailable (missing API key or feature); using offline rooms",
                    other
                );
                Provider::Offline(OfflineContent::new())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Offline(_) => "offline",
            #[cfg(feature = "remote-content")]
            Provider::Gemini(_) => "gemini",
        }
    }
}

impl ContentProvider for Provider {
    async fn generate_room(&self, cell: &CellInfo) -> Option<Room> {
        match self {
            Provider::Offline(p) => p.generate_room(cell).await,
            #[cfg(feature = "remote-content")]
            Provider::Gemini(p) => p.generate_room(cell).await,
        }
    }

    async fn describe_room(&self, room: &Room) -> Option<String> {
        match self {
            Provider::Offline(p) => p.describe_room(room).await,
            #[cfg(feature = "remote-content")]
            Provider::Gemini(p) => p.describe_room(room).await,
        }
    }

    async fn describe_journey(&self, rooms: &[Room]) -> Option<String> {
        match self {
            Provider::Offline(p) => p.describe_journey(rooms).await,
            #[cfg(feature = "remote-content")]
            Provider::Gemini(p) => p.describe_journey(rooms).await,
        }
    }

    async fn design_room(&self, room: &Room) -> Option<Vec<String>> {
        match self {
            Provider::Offline(p) => p.design_room(room).await,
            #[cfg(feature = "remote-content")]
            Provider::Gemini(p) => p.design_room(room).await,
        }
    }
}
