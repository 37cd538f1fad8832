//! Chess-Bridge: a session bridge to a UCI chess engine subprocess.
//!
//! The engine (Stockfish or compatible) supplies move legality and move
//! selection; this crate supplies everything needed to drive it from a
//! turn-based controller over its line-oriented text protocol.
//!
//! ## Modules
//!
//! - [`session`] - the public operation surface ([`session::GameSession`])
//! - [`correlator`] - matching asynchronous replies to pending requests
//! - [`channel`] - subprocess ownership and line-oriented transport
//! - [`board`] - addressable snapshots of the engine's position dumps
//! - [`castling`] - companion rook moves for coordinate-notation castling
//! - [`protocol`] - wire-line constants, parsers and builders
//! - [`error`] - the [`EngineError`] kinds surfaced to callers
//!
//! ## Example
//!
//! ```no_run
//! use chess_bridge::session::{EngineConfig, GameSession};
//!
//! # async fn demo() -> chess_bridge::Result<()> {
//! let mut session = GameSession::connect(EngineConfig::default()).await?;
//! session.init_start_pos().await?;
//! if session.is_move_legal("e2e4").await? {
//!     session.play_move("e2e4").await?;
//!     session.engine_move().await?;
//!     println!("engine answered {:?}", session.last_engine_move());
//! }
//! session.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod board;
pub mod castling;
pub mod channel;
pub mod correlator;
pub mod error;
pub mod protocol;
pub mod session;

pub use error::{EngineError, Result};
