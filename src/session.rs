//! The public game-session surface.
//!
//! One [`GameSession`] owns one engine subprocess, the current position
//! and the router task feeding engine output to pending requests. The
//! session is meant to be stored by whatever drives the game (one per
//! user, threaded through the caller's state) rather than shared:
//! operations take `&mut self` and are served strictly in submission
//! order, so overlapping calls cannot cross their replies.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::board::BoardSnapshot;
use crate::channel::{EngineChannel, EngineLine, EngineWriter, Source};
use crate::correlator::{Correlator, RequestId};
use crate::error::{EngineError, Result};
use crate::protocol;

/// How the engine subprocess is launched and how long replies may take.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Engine executable, resolved through `PATH`.
    pub program: String,
    /// Extra arguments passed to the executable.
    pub args: Vec<String>,
    /// Search depth for [`GameSession::engine_move`].
    pub depth: u32,
    /// Time budget for [`GameSession::engine_move`], in milliseconds.
    pub movetime_ms: u64,
    /// Bound on every awaited reply.
    pub reply_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "stockfish".to_string(),
            args: Vec::new(),
            depth: 8,
            movetime_ms: 1000,
            reply_timeout: Duration::from_secs(10),
        }
    }
}

/// Lines of engine stderr kept around for diagnostics.
const STDERR_TAIL: usize = 32;

/// One game against one engine subprocess.
pub struct GameSession {
    channel: EngineChannel,
    writer: EngineWriter,
    correlator: Arc<Mutex<Correlator>>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    router: JoinHandle<()>,
    config: EngineConfig,
    position: String,
    last_engine_move: Option<String>,
}

impl GameSession {
    /// Spawn the engine and reset it for a new game.
    pub async fn connect(config: EngineConfig) -> Result<Self> {
        let (channel, lines) = EngineChannel::spawn(&config.program, &config.args)?;
        let writer = channel.writer();
        let correlator = Arc::new(Mutex::new(Correlator::new()));
        let stderr_tail = Arc::new(Mutex::new(VecDeque::new()));
        let router = tokio::spawn(route_lines(
            lines,
            correlator.clone(),
            writer.clone(),
            stderr_tail.clone(),
        ));

        let session = Self {
            channel,
            writer,
            correlator,
            stderr_tail,
            router,
            config,
            position: protocol::START_FEN.to_string(),
            last_engine_move: None,
        };
        session.writer.send(protocol::NEW_GAME).await?;
        session.writer.send(protocol::IS_READY).await?;
        Ok(session)
    }

    /// Reset to the standard starting position and return its FEN.
    pub async fn init_start_pos(&mut self) -> Result<String> {
        let (id, rx) = self.correlator.lock().await.expect_position();
        let lines = [
            protocol::set_position(protocol::START_FEN),
            protocol::DUMP.to_string(),
        ];
        self.send_or_cancel(id, &lines).await?;
        let update = self.await_reply(id, rx, "position update").await?;
        self.position = update.fen.clone();
        Ok(update.fen)
    }

    /// Legal moves in the current position, in the order the engine
    /// reports them. An empty list means checkmate or stalemate.
    pub async fn legal_moves(&mut self) -> Result<Vec<String>> {
        let (id, rx) = self.correlator.lock().await.expect_legal_moves();
        self.send_or_cancel(id, &[protocol::DUMP.to_string()]).await?;
        self.await_reply(id, rx, "legal moves").await
    }

    /// Whether `mv` is legal right now, by exact membership in the
    /// engine-reported set. No validation happens on this side.
    pub async fn is_move_legal(&mut self, mv: &str) -> Result<bool> {
        Ok(self.legal_moves().await?.iter().any(|m| m == mv))
    }

    /// Apply a caller move and return the resulting FEN.
    ///
    /// For a castling king move the rook displacement is already part
    /// of the returned FEN; callers announcing the rook separately ask
    /// [`crate::castling::rook_move_for`].
    pub async fn play_move(&mut self, mv: &str) -> Result<String> {
        let (id, rx) = self.correlator.lock().await.expect_position();
        let lines = [
            protocol::apply_move(&self.position, mv),
            protocol::DUMP.to_string(),
        ];
        self.send_or_cancel(id, &lines).await?;
        let update = self.await_reply(id, rx, "position update").await?;
        self.position = update.fen.clone();
        Ok(update.fen)
    }

    /// Let the engine choose and play its move. Returns the resulting
    /// FEN; the move itself is recorded for [`GameSession::last_engine_move`].
    pub async fn engine_move(&mut self) -> Result<String> {
        let (id, rx) = self
            .correlator
            .lock()
            .await
            .expect_engine_move(self.position.clone());
        let lines = [protocol::go(self.config.depth, self.config.movetime_ms)];
        self.send_or_cancel(id, &lines).await?;
        let update = self.await_reply(id, rx, "best move").await?;
        self.position = update.fen.clone();
        self.last_engine_move = update.engine_move;
        Ok(update.fen)
    }

    /// Current position FEN.
    pub fn position(&self) -> &str {
        &self.position
    }

    /// The engine's most recent own move, if it has made one.
    pub fn last_engine_move(&self) -> Option<&str> {
        self.last_engine_move.as_deref()
    }

    /// Addressable grid for the current position.
    pub fn board(&self) -> Result<BoardSnapshot> {
        BoardSnapshot::parse(&self.position)
    }

    /// Most recent engine stderr lines, oldest first.
    pub async fn stderr_tail(&self) -> Vec<String> {
        self.stderr_tail.lock().await.iter().cloned().collect()
    }

    /// Tell the engine to quit and tear the subprocess down.
    pub async fn shutdown(mut self) {
        let _ = self.writer.send(protocol::QUIT).await;
        self.channel.shutdown().await;
        self.router.abort();
    }

    async fn send_or_cancel(&self, id: RequestId, lines: &[String]) -> Result<()> {
        for line in lines {
            if let Err(err) = self.writer.send(line).await {
                // never leave an entry that nothing will answer
                self.correlator.lock().await.cancel(id);
                return Err(err);
            }
        }
        Ok(())
    }

    async fn await_reply<T>(
        &self,
        id: RequestId,
        rx: oneshot::Receiver<T>,
        expected: &'static str,
    ) -> Result<T> {
        match timeout(self.config.reply_timeout, rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(EngineError::NotRunning),
            Err(_) => {
                self.correlator.lock().await.cancel(id);
                Err(EngineError::Timeout {
                    expected,
                    after: self.config.reply_timeout,
                })
            }
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        // the subprocess dies with the channel; stop routing its remains
        self.router.abort();
    }
}

/// Route engine output: stdout lines feed the correlator, whose
/// best-move follow-ups go straight back to the engine; stderr lines
/// land in the diagnostic tail.
async fn route_lines(
    mut lines: mpsc::Receiver<EngineLine>,
    correlator: Arc<Mutex<Correlator>>,
    writer: EngineWriter,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
) {
    while let Some(line) = lines.recv().await {
        match line.source {
            Source::Stderr => {
                let mut tail = stderr_tail.lock().await;
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line.text);
            }
            Source::Stdout => {
                let follow_ups = correlator.lock().await.take_line(&line.text);
                for follow_up in &follow_ups {
                    if writer.send(follow_up).await.is_err() {
                        // the waiting caller will hit its timeout
                        break;
                    }
                }
            }
        }
    }
    // stream ended: the engine is gone, wake every waiting caller
    correlator.lock().await.abandon_pending();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.program, "stockfish");
        assert_eq!(config.depth, 8);
        assert_eq!(config.movetime_ms, 1000);
        assert_eq!(config.reply_timeout, Duration::from_secs(10));
    }
}
