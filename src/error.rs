//! Error types for the engine bridge.

use std::time::Duration;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Everything that can go wrong while talking to the engine subprocess.
///
/// Spawn and I/O failures are fatal to the session: the subprocess state
/// is not recoverable in place, so they are surfaced rather than retried.
/// A timeout leaves the session usable; the pending request is already
/// cleared when it surfaces.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine executable could not be started.
    #[error("failed to launch engine process: {0}")]
    Spawn(#[source] std::io::Error),

    /// Writing to the engine failed (pipe closed, process gone).
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine's output stream ended while a reply was outstanding.
    #[error("engine process is not running")]
    NotRunning,

    /// No matching reply arrived within the configured bound.
    #[error("no {expected} reply within {after:?}")]
    Timeout {
        expected: &'static str,
        after: Duration,
    },

    /// A position string did not have the expected structure.
    #[error("malformed position data: {0}")]
    Format(String),
}
