//! Chess-Bridge CLI: drive a UCI engine from the terminal.
//!
//! ## Usage
//!
//! - `chess-bridge play` - you enter coordinate moves, the engine answers
//! - `chess-bridge demo` - watch a random mover lose to the engine

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use chess_bridge::castling;
use chess_bridge::session::{EngineConfig, GameSession};

/// Chess-Bridge: terminal front-end for the engine session bridge
#[derive(Parser)]
#[command(name = "chess-bridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the engine, entering moves like `e2e4`
    Play(EngineArgs),
    /// Watch a random mover play the engine
    Demo(EngineArgs),
}

#[derive(Args)]
struct EngineArgs {
    /// Engine executable to launch
    #[arg(long, default_value = "stockfish")]
    engine: String,

    /// Search depth for engine moves
    #[arg(long, default_value_t = 8)]
    depth: u32,

    /// Engine time budget per move, in milliseconds
    #[arg(long, default_value_t = 1000)]
    movetime: u64,

    /// Plies after which the demo stops
    #[arg(long, default_value_t = 20)]
    plies: usize,
}

impl Default for EngineArgs {
    fn default() -> Self {
        Self {
            engine: "stockfish".to_string(),
            depth: 8,
            movetime: 1000,
            plies: 20,
        }
    }
}

impl EngineArgs {
    fn config(&self) -> EngineConfig {
        EngineConfig {
            program: self.engine.clone(),
            depth: self.depth,
            movetime_ms: self.movetime,
            reply_timeout: Duration::from_secs(30),
            ..EngineConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Some(Commands::Play(args)) => play(args).await,
        Some(Commands::Demo(args)) => demo(args).await,
        None => demo(EngineArgs::default()).await,
    }
}

/// Interactive game: the user types coordinate moves, the engine answers.
async fn play(args: EngineArgs) -> anyhow::Result<()> {
    let mut session = GameSession::connect(args.config())
        .await
        .with_context(|| format!("could not start engine {:?}", args.engine))?;
    session.init_start_pos().await?;
    println!("{}", session.board()?);

    let stdin = io::stdin();
    let mut input = String::new();
    loop {
        print!("your move (or quit)> ");
        io::stdout().flush()?;
        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let mv = input.trim();
        if mv.is_empty() {
            continue;
        }
        if mv == "quit" {
            break;
        }

        if !session.is_move_legal(mv).await? {
            println!("{mv} is not legal here");
            continue;
        }
        if let Some(piece) = session.board()?.piece_at(&mv[..2]) {
            if castling::is_castling_move(piece, mv) {
                if let Some(rook) = castling::rook_move_for(mv) {
                    println!("castling: the rook slides {rook}");
                }
            }
        }
        session.play_move(mv).await?;

        if session.legal_moves().await?.is_empty() {
            println!("{}", session.board()?);
            println!("the engine has no reply - game over");
            break;
        }
        session.engine_move().await?;
        if let Some(reply) = session.last_engine_move() {
            println!("engine plays {reply}");
        }
        println!("{}", session.board()?);
    }

    session.shutdown().await;
    Ok(())
}

/// Self-running game: a random mover against the engine.
async fn demo(args: EngineArgs) -> anyhow::Result<()> {
    let mut session = GameSession::connect(args.config())
        .await
        .with_context(|| format!("could not start engine {:?}", args.engine))?;
    session.init_start_pos().await?;
    println!("random mover vs {}\n", args.engine);

    for ply in 0..args.plies {
        let moves = session.legal_moves().await?;
        if moves.is_empty() {
            println!("random mover has no legal moves after {ply} plies");
            break;
        }
        let pick = &moves[fastrand::usize(..moves.len())];
        session.play_move(pick).await?;
        println!("random mover: {pick}");

        if session.legal_moves().await?.is_empty() {
            println!("engine has no legal moves after {ply} plies");
            break;
        }
        session.engine_move().await?;
        if let Some(reply) = session.last_engine_move() {
            println!("engine: {reply}");
        }
    }

    println!("\n{}", session.board()?);
    println!("final position: {}", session.position());
    session.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
