//! Wire protocol: request lines sent to the engine and the response
//! markers recognized on the way back.
//!
//! Response lines are tokenized on whitespace or matched by prefix,
//! never sliced at fixed offsets, so extra spacing or trailing
//! annotations (`bestmove e2e4 ponder e7e5`) cannot shift a field into
//! garbage. Parsers return `Option`: a line that does not match is a
//! discard for the caller, not an error.

// =============================================================================
// Positions and moves
// =============================================================================

/// FEN of the standard chess starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Number of space-separated fields in a full FEN record.
pub const FEN_FIELDS: usize = 6;

/// True for 4- or 5-character coordinate moves such as `e2e4` or `e7e8q`.
pub fn is_coordinate_move(token: &str) -> bool {
    let bytes = token.as_bytes();
    if bytes.len() != 4 && bytes.len() != 5 {
        return false;
    }
    let square = |b: &[u8]| matches!(b, [f, r] if (b'a'..=b'h').contains(f) && (b'1'..=b'8').contains(r));
    square(&bytes[0..2]) && square(&bytes[2..4]) && (bytes.len() == 4 || bytes[4].is_ascii_alphabetic())
}

// =============================================================================
// Request lines
// =============================================================================

/// Reset the engine's internal game state.
pub const NEW_GAME: &str = "ucinewgame";

/// Synchronization barrier; the `readyok` answer falls through the
/// discard rule rather than being awaited.
pub const IS_READY: &str = "isready";

/// Ask the engine to dump the current position (FEN plus legal moves).
pub const DUMP: &str = "d";

/// Ask the engine to exit.
pub const QUIT: &str = "quit";

/// Set the engine's current position.
pub fn set_position(fen: &str) -> String {
    format!("position fen {fen}")
}

/// Set the engine's current position, then apply one move to it.
pub fn apply_move(fen: &str, mv: &str) -> String {
    format!("position fen {fen} moves {mv}")
}

/// Ask the engine to compute and report its best move.
pub fn go(depth: u32, movetime_ms: u64) -> String {
    format!("go depth {depth} movetime {movetime_ms}")
}

// =============================================================================
// Response markers
// =============================================================================

/// Prefix of the position-dump line.
pub const FEN_MARKER: &str = "Fen:";

/// Prefix of the legal-move-list line.
pub const LEGAL_MOVES_MARKER: &str = "Legal uci moves:";

/// First token of the engine's move report.
pub const BEST_MOVE_MARKER: &str = "bestmove";

/// Extract the FEN from a position-dump line.
///
/// The remainder after the marker must carry all six FEN fields;
/// a truncated dump is treated as a non-match.
pub fn parse_position_dump(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(FEN_MARKER)?.trim();
    if rest.split_whitespace().count() == FEN_FIELDS {
        Some(rest)
    } else {
        None
    }
}

/// Extract the move list from a legal-moves line.
///
/// An empty list is a valid outcome (checkmate or stalemate), distinct
/// from a line that does not carry the marker at all.
pub fn parse_legal_moves(line: &str) -> Option<Vec<String>> {
    let rest = line.strip_prefix(LEGAL_MOVES_MARKER)?;
    Some(rest.split_whitespace().map(str::to_owned).collect())
}

/// Extract the engine's chosen move from a best-move report.
///
/// The move is the second whitespace token; anything after it (ponder
/// hints) is ignored. A token that is not a coordinate move, such as
/// the `(none)` the engine reports when it has no move, is a non-match.
pub fn parse_best_move(line: &str) -> Option<&str> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != BEST_MOVE_MARKER {
        return None;
    }
    let mv = tokens.next()?;
    is_coordinate_move(mv).then_some(mv)
}

/// Side to move of a FEN record: `'w'` or `'b'`.
pub fn side_to_move(fen: &str) -> Option<char> {
    match fen.split_whitespace().nth(1)? {
        "w" => Some('w'),
        "b" => Some('b'),
        _ => None,
    }
}
