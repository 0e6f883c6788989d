//! Line-oriented console front end.
//!
//! Reads one command per line, hands it to the engine and prints whatever the
//! engine produced. Stops when the session finishes or input runs out.

use anyhow::Result;
use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::content::ContentProvider;
use crate::game::engine::{split_input, GameEngine};

pub const PROMPT: &str =
    "What do you want to do? (look, move <direction>, take <item>, use <item>, talk <npc>, inventory, quit): ";

async fn flush_output<P, W>(engine: &mut GameEngine<P>, out: &mut W) -> Result<()>
where
    P: ContentProvider,
    W: AsyncWrite + Unpin,
{
    for line in engine.take_output() {
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.flush().await?;
    Ok(())
}

/// Drive `engine` from `input` until the game ends or input is exhausted.
/// The engine must already be initialized.
pub async fn run_session<P, R, W>(engine: &mut GameEngine<P>, input: R, mut out: W) -> Result<()>
where
    P: ContentProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    flush_output(engine, &mut out).await?;
    let mut lines = input.lines();

    while !engine.is_finished() {
        out.write_all(PROMPT.as_bytes()).await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("Input closed; leaving the game");
            break;
        };
        let (verb, argument) = split_input(&line);
        engine.execute_command(&verb, &argument).await;
        flush_output(engine, &mut out).await?;
    }
    Ok(())
}

/// Play on the process's stdin and stdout.
pub async fn run_console<P: ContentProvider>(engine: &mut GameEngine<P>) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_session(engine, stdin, tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::OfflineContent;
    use crate::game::engine::EngineOptions;
    use crate::game::map::{Coord, GameMap};

    fn engine() -> GameEngine<OfflineContent> {
        let start = Coord::new(0, 1);
        let end = Coord::new(1, 1);
        let map = GameMap::from_layout(2, start, end, vec![start, end], vec![]).unwrap();
        GameEngine::new(map, OfflineContent::seeded(3), EngineOptions::default())
    }

    #[tokio::test]
    async fn session_stops_when_the_end_is_reached() {
        let mut engine = engine();
        engine.initialize().await;
        let input: &[u8] = b"Dance\nMOVE East\nlook\n";
        let mut out = Vec::new();
        run_session(&mut engine, input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Invalid command."));
        assert!(text.contains("You move east."));
        assert!(text.trim_end().ends_with("Thanks for playing!"));
        assert_eq!(text.matches(PROMPT).count(), 2);
        assert!(engine.is_finished());
    }

    #[tokio::test]
    async fn session_ends_quietly_on_eof() {
        let mut engine = engine();
        engine.initialize().await;
        let mut out = Vec::new();
        run_session(&mut engine, &b""[..], &mut out).await.unwrap();
        assert!(!engine.is_finished());
        assert!(String::from_utf8(out).unwrap().ends_with(PROMPT));
    }
}
