//! Generative content over HTTP.
//!
//! Talks to a Gemini-style `generateContent` endpoint. Rooms are requested in
//! JSON mode as one running conversation, so later rooms can echo earlier
//! ones; narration and journey summaries are single-shot prose requests.
//! Every failure (transport, timeout, status, unparsable or schema-invalid
//! reply) is logged and reported to the game as "no content".

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::config::ContentConfig;
use crate::content::ContentProvider;
use crate::game::map::CellInfo;
use crate::game::room::Room;

const ROOM_INSTRUCTION: &str = "You are the game master of a MUD-style text adventure. \
For each request, reply with exactly one room as JSON with the fields name, desc, exits \
(each with dir, desc and an optional block), items (name, desc, isTakeable, onUse, onLook, onTake), \
onEnter, onExit and onLook.\n\
- A start room is welcoming and sets up a fantasy theme.\n\
- An end room carries a sense of accomplishment and perhaps a reward.\n\
- A win room offers clues that keep the player moving.\n\
- A dead end feels cramped or desolate and may hide traps or red herrings.\n\
- Add atmosphere suited to the room (echoes in a cavern, a musty cellar smell).\n\
- List exactly the exits you are given, with their directions.\n\
- No clutter, no extra commentary.";

const NARRATOR_INSTRUCTION: &str = "You are a game master. Describe the JSON entity you are given \
as cohesive natural language, without disclaimers or forewords.";

const DESIGNER_INSTRUCTION: &str = "You are a game master setting the ambience of a room. \
Reply with a JSON array of three CSS gradient colours.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Strip a Markdown code fence that some models wrap around JSON replies.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Prompt asking for a room matching `cell`.
pub fn room_prompt(cell: &CellInfo) -> String {
    let exits: Vec<&str> = cell.exits.open().iter().map(|d| d.as_str()).collect();
    format!(
        "Generate a room description for a {} room in a MUD-style game.\n\nExits: {}",
        cell.cell_type,
        exits.join(", ")
    )
}

pub struct GeminiContent {
    config: ContentConfig,
    client: reqwest::Client,
    /// Conversation so far for room generation.
    history: Mutex<Vec<Content>>,
}

impl GeminiContent {
    pub fn new(config: ContentConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            self.config.api_key
        )
    }

    fn history_snapshot(&self) -> Vec<Content> {
        match self.history.lock() {
            Ok(h) => h.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn remember(&self, prompt: Content, reply: Content) {
        let mut history = match self.history.lock() {
            Ok(h) => h,
            Err(poisoned) => poisoned.into_inner(),
        };
        history.push(prompt);
        history.push(reply);
    }

    async fn generate(
        &self,
        instruction: &str,
        contents: Vec<Content>,
        json: bool,
    ) -> Result<String> {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: instruction.to_string(),
                }],
            },
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
                response_mime_type: json.then_some("application/json"),
            },
        };

        let request = self.client.post(self.build_url()).json(&body);
        let timeout_duration = Duration::from_secs(self.config.timeout_seconds);
        let response = timeout(timeout_duration, request.send())
            .await
            .map_err(|_| anyhow!("Request timeout after {}s", self.config.timeout_seconds))?
            .map_err(|e| anyhow!("HTTP request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(anyhow!("API returned status: {}", response.status()));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse JSON response: {}", e))?;
        parsed
            .text()
            .ok_or_else(|| anyhow!("Response contained no text"))
    }

    async fn prose(&self, prompt: String) -> Option<String> {
        match self
            .generate(NARRATOR_INSTRUCTION, vec![Content::text("user", prompt)], false)
            .await
        {
            Ok(text) => Some(text.trim().to_string()),
            Err(e) => {
                warn!("Narration request failed: {}", e);
                None
            }
        }
    }
}

impl ContentProvider for GeminiContent {
    async fn generate_room(&self, cell: &CellInfo) -> Option<Room> {
        let prompt = Content::text("user", room_prompt(cell));
        let mut contents = self.history_snapshot();
        contents.push(prompt.clone());

        let text = match self.generate(ROOM_INSTRUCTION, contents, true).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Room generation failed: {}", e);
                return None;
            }
        };
        let room = Room::from_json(strip_fences(&text));
        if room.is_none() {
            warn!("Cannot validate generated room");
            return None;
        }
        debug!("Room generated for {} cell", cell.cell_type);
        self.remember(prompt, Content::text("model", text));
        room
    }

    async fn describe_room(&self, room: &Room) -> Option<String> {
        let json = serde_json::to_string_pretty(room).ok()?;
        self.prose(format!(
            "Generate a vivid description for the following room\n\n```json\n{}\n```",
            json
        ))
        .await
    }

    async fn describe_journey(&self, rooms: &[Room]) -> Option<String> {
        let json = serde_json::to_string_pretty(rooms).ok()?;
        self.prose(format!(
            "Create a short, narrative summary of a player's journey through the following rooms \
in a MUD-style game, leading up to a satisfying conclusion. Highlight key moments, challenges \
overcome, and discoveries made.\n\n```json\n{}\n```",
            json
        ))
        .await
    }

    async fn design_room(&self, room: &Room) -> Option<Vec<String>> {
        let prompt = format!(
            "Return the array of three gradient colors that define the ambience of the room.\nThe room description is: {}",
            room.desc
        );
        let text = match self
            .generate(DESIGNER_INSTRUCTION, vec![Content::text("user", prompt)], true)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                debug!("Ambience request failed: {}", e);
                return None;
            }
        };
        serde_json::from_str::<Vec<String>>(strip_fences(&text)).ok()
    }
}
