//! Castling move resolution.
//!
//! In coordinate notation a castling move is just a two-square king
//! move; the engine applies the rook displacement internally and the
//! resulting FEN already reflects it. Callers that need to announce or
//! animate the rook ask here. Absence of a companion is the normal
//! outcome for almost every move, so these are plain `Option`s.

/// Kingside or queenside, by the king's destination file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CastlingKind {
    Kingside,
    Queenside,
}

/// King move and its companion rook move, for the four legal castling
/// moves (white/black x kingside/queenside).
const ROOK_COMPANIONS: [(&str, &str); 4] = [
    ("e1g1", "h1f1"),
    ("e1c1", "a1d1"),
    ("e8g8", "h8f8"),
    ("e8c8", "a8d8"),
];

/// Companion rook move for a castling king move, `None` for any other move.
pub fn rook_move_for(king_move: &str) -> Option<&'static str> {
    ROOK_COMPANIONS
        .iter()
        .find(|(king, _)| *king == king_move)
        .map(|(_, rook)| *rook)
}

/// True only if `piece` is a king glyph (either case) and `mv` is one
/// of the four canonical castling moves.
pub fn is_castling_move(piece: char, mv: &str) -> bool {
    piece.eq_ignore_ascii_case(&'k') && rook_move_for(mv).is_some()
}

/// Classify a canonical castling move by its destination file.
pub fn castling_kind(mv: &str) -> Option<CastlingKind> {
    rook_move_for(mv)?;
    match mv.as_bytes().get(2) {
        Some(b'g') => Some(CastlingKind::Kingside),
        Some(b'c') => Some(CastlingKind::Queenside),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rook_move_for_canonical_moves() {
        assert_eq!(rook_move_for("e1g1"), Some("h1f1"));
        assert_eq!(rook_move_for("e1c1"), Some("a1d1"));
        assert_eq!(rook_move_for("e8g8"), Some("h8f8"));
        assert_eq!(rook_move_for("e8c8"), Some("a8d8"));
    }

    #[test]
    fn test_rook_move_for_everything_else() {
        assert_eq!(rook_move_for("g3h5"), None);
        assert_eq!(rook_move_for("f8c8"), None);
        assert_eq!(rook_move_for("e2e4"), None);
        assert_eq!(rook_move_for(""), None);
    }

    #[test]
    fn test_is_castling_move_requires_a_king() {
        assert!(is_castling_move('k', "e8g8"));
        assert!(is_castling_move('K', "e1g1"));
        assert!(!is_castling_move('Q', "e1c1"));
        assert!(!is_castling_move('p', "g7g5"));
        assert!(!is_castling_move('k', "e2e4"));
    }

    #[test]
    fn test_castling_kind() {
        assert_eq!(castling_kind("e1g1"), Some(CastlingKind::Kingside));
        assert_eq!(castling_kind("e8g8"), Some(CastlingKind::Kingside));
        assert_eq!(castling_kind("e1c1"), Some(CastlingKind::Queenside));
        assert_eq!(castling_kind("e8c8"), Some(CastlingKind::Queenside));
        assert_eq!(castling_kind("g1g8"), None);
        assert_eq!(castling_kind("e7e5"), None);
    }
}
