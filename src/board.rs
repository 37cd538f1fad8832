//! Addressable board snapshots derived from the engine's position dumps.
//!
//! The piece-placement field of a FEN record lists ranks top of the
//! board first, with digits standing for runs of empty squares. This
//! module expands that into an 8x8 grid whose cells carry their own
//! algebraic coordinate, so callers can ask "what is on e1" without
//! re-deriving the notation.

use std::fmt;

use crate::error::{EngineError, Result};

/// One square: its algebraic coordinate and the piece glyph on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub square: String,
    /// Piece letter as it appears in the placement field (uppercase =
    /// white, lowercase = black), `None` for an empty square.
    pub piece: Option<char>,
}

/// An 8x8 grid expanded from the piece-placement field of a FEN record.
///
/// Ranks are stored top of the board first (rank 8 down to rank 1),
/// matching the field order of the notation itself.
pub struct BoardSnapshot {
    ranks: Vec<Vec<Cell>>,
}

fn square_name(file: usize, rank: usize) -> String {
    format!("{}{}", (b'a' + file as u8) as char, rank)
}

impl BoardSnapshot {
    /// Parse a full FEN record or a bare placement field.
    pub fn parse(fen: &str) -> Result<Self> {
        let placement = fen
            .split_whitespace()
            .next()
            .ok_or_else(|| EngineError::Format("empty position string".into()))?;

        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != 8 {
            return Err(EngineError::Format(format!(
                "expected 8 ranks, got {} in {placement:?}",
                rows.len()
            )));
        }

        let mut ranks = Vec::with_capacity(8);
        for (i, row) in rows.iter().enumerate() {
            let rank_no = 8 - i;
            let mut cells: Vec<Cell> = Vec::with_capacity(8);
            for ch in row.chars() {
                if let Some(run) = ch.to_digit(10) {
                    for _ in 0..run {
                        let file = cells.len();
                        cells.push(Cell {
                            square: square_name(file, rank_no),
                            piece: None,
                        });
                    }
                } else if ch.is_ascii_alphabetic() {
                    let file = cells.len();
                    cells.push(Cell {
                        square: square_name(file, rank_no),
                        piece: Some(ch),
                    });
                } else {
                    return Err(EngineError::Format(format!(
                        "unexpected {ch:?} in rank {rank_no}"
                    )));
                }
            }
            if cells.len() != 8 {
                return Err(EngineError::Format(format!(
                    "rank {rank_no} has {} files in {placement:?}",
                    cells.len()
                )));
            }
            ranks.push(cells);
        }
        Ok(Self { ranks })
    }

    /// The 8 cells of a rank, file a first. Rank runs 1 to 8;
    /// out-of-range is `None`.
    pub fn row(&self, rank: usize) -> Option<&[Cell]> {
        if !(1..=8).contains(&rank) {
            return None;
        }
        Some(&self.ranks[8 - rank])
    }

    /// Piece glyph at an algebraic coordinate, `None` for an empty or
    /// unknown square.
    pub fn piece_at(&self, square: &str) -> Option<char> {
        let bytes = square.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].to_ascii_lowercase().checked_sub(b'a')? as usize;
        let rank = bytes[1].checked_sub(b'1')? as usize;
        if file >= 8 || rank >= 8 {
            return None;
        }
        self.ranks[7 - rank][file].piece
    }
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rank) in self.ranks.iter().enumerate() {
            write!(f, "{} ", 8 - i)?;
            for cell in rank {
                write!(f, "{} ", cell.piece.unwrap_or('.'))?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::START_FEN;

    #[test]
    fn test_start_position_grid() {
        let board = BoardSnapshot::parse(START_FEN).unwrap();
        assert_eq!(board.piece_at("e1"), Some('K'));
        assert_eq!(board.piece_at("e8"), Some('k'));
        assert_eq!(board.piece_at("a1"), Some('R'));
        assert_eq!(board.piece_at("h8"), Some('r'));
        assert_eq!(board.piece_at("b2"), Some('P'));
        assert_eq!(board.piece_at("e4"), None);
    }

    #[test]
    fn test_rows_cover_every_square_once() {
        let board = BoardSnapshot::parse(START_FEN).unwrap();
        let mut squares: Vec<String> = (1..=8)
            .flat_map(|rank| board.row(rank).unwrap().iter().map(|c| c.square.clone()))
            .collect();
        assert_eq!(squares.len(), 64);
        squares.sort();
        squares.dedup();
        assert_eq!(squares.len(), 64, "coordinates must be distinct");
        assert!(squares.contains(&"a1".to_string()));
        assert!(squares.contains(&"h8".to_string()));
    }

    #[test]
    fn test_row_orders_files_a_to_h() {
        let board = BoardSnapshot::parse(START_FEN).unwrap();
        let first: Vec<&str> = board.row(1).unwrap().iter().map(|c| c.square.as_str()).collect();
        assert_eq!(first, ["a1", "b1", "c1", "d1", "e1", "f1", "g1", "h1"]);
        // e8 is the fifth cell of the top rank
        assert_eq!(board.row(8).unwrap()[4].piece, Some('k'));
    }

    #[test]
    fn test_row_out_of_range() {
        let board = BoardSnapshot::parse(START_FEN).unwrap();
        assert!(board.row(0).is_none());
        assert!(board.row(9).is_none());
    }

    #[test]
    fn test_accepts_bare_placement_field() {
        let board = BoardSnapshot::parse("8/8/8/8/8/8/8/8").unwrap();
        assert_eq!(board.piece_at("d4"), None);
        assert_eq!(board.row(4).unwrap().len(), 8);
    }

    #[test]
    fn test_rejects_wrong_rank_count() {
        assert!(BoardSnapshot::parse("8/8/8").is_err());
        assert!(BoardSnapshot::parse("8/8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    }

    #[test]
    fn test_rejects_wrong_file_count() {
        assert!(BoardSnapshot::parse("9/8/8/8/8/8/8/8").is_err());
        assert!(BoardSnapshot::parse("ppppppp/8/8/8/8/8/8/8").is_err());
        assert!(BoardSnapshot::parse("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").is_err());
    }

    #[test]
    fn test_rejects_garbage_glyph() {
        assert!(BoardSnapshot::parse("8/8/8/8/8/8/8/7.").is_err());
        assert!(matches!(
            BoardSnapshot::parse(""),
            Err(EngineError::Format(_))
        ));
    }

    #[test]
    fn test_invalid_coordinate_lookup_is_none() {
        let board = BoardSnapshot::parse(START_FEN).unwrap();
        assert_eq!(board.piece_at("z9"), None);
        assert_eq!(board.piece_at(""), None);
        assert_eq!(board.piece_at("e99"), None);
    }

    #[test]
    fn test_display_renders_the_grid() {
        let board = BoardSnapshot::parse(START_FEN).unwrap();
        let rendered = board.to_string();
        assert!(rendered.contains("a b c d e f g h"));
        assert!(rendered.starts_with("8 r n b q k b n r"));
    }
}
