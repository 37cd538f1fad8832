//! Request/response correlation for the engine's output stream.
//!
//! The engine answers asynchronously and without framing; the only
//! thing tying a reply to a caller is arrival order. Pending requests
//! therefore live in an explicit FIFO queue keyed by a monotonically
//! increasing id, served strictly in submission order. Each complete
//! stdout line either resolves the front entry, triggers the best-move
//! follow-up, or is discarded.
//!
//! Discarding is deliberate: the engine emits plenty of chatter
//! (`info` lines, `readyok`, the board drawing that precedes a dump),
//! and a dump answers with more marker lines than any one request
//! wants. Robustness here means ignoring what nobody asked for.

use std::collections::VecDeque;

use tokio::sync::oneshot;

use crate::protocol;

/// Identifies one pending request, for cancellation after a timeout.
pub type RequestId = u64;

/// A position dump resolved for a caller. `engine_move` carries the
/// engine's own choice when the dump was triggered by a best-move
/// report rather than a caller-supplied move.
#[derive(Debug)]
pub struct PositionUpdate {
    pub fen: String,
    pub engine_move: Option<String>,
}

/// What a pending request is waiting for.
enum Waiting {
    Position {
        reply: oneshot::Sender<PositionUpdate>,
        /// Position the engine's chosen move applies to (engine-move flow).
        base_fen: Option<String>,
        /// Move extracted from the best-move line, once it has arrived.
        chosen: Option<String>,
    },
    LegalMoves {
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// FIFO of pending requests over one engine subprocess.
#[derive(Default)]
pub struct Correlator {
    queue: VecDeque<(RequestId, Waiting)>,
    next_id: RequestId,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    fn enqueue(&mut self, waiting: Waiting) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push_back((id, waiting));
        id
    }

    /// Wait for a position dump (the caller issues `position ...` + `d`).
    pub fn expect_position(&mut self) -> (RequestId, oneshot::Receiver<PositionUpdate>) {
        let (tx, rx) = oneshot::channel();
        let id = self.enqueue(Waiting::Position {
            reply: tx,
            base_fen: None,
            chosen: None,
        });
        (id, rx)
    }

    /// Wait for the engine to pick and apply its own move (the caller
    /// issues `go ...`); `base_fen` is the position that move applies to.
    pub fn expect_engine_move(
        &mut self,
        base_fen: String,
    ) -> (RequestId, oneshot::Receiver<PositionUpdate>) {
        let (tx, rx) = oneshot::channel();
        let id = self.enqueue(Waiting::Position {
            reply: tx,
            base_fen: Some(base_fen),
            chosen: None,
        });
        (id, rx)
    }

    /// Wait for a legal-move list (the caller issues `d`).
    pub fn expect_legal_moves(&mut self) -> (RequestId, oneshot::Receiver<Vec<String>>) {
        let (tx, rx) = oneshot::channel();
        let id = self.enqueue(Waiting::LegalMoves { reply: tx });
        (id, rx)
    }

    /// Remove a pending request whose caller gave up. A reply arriving
    /// later no longer matches anything and falls through to the
    /// discard rule instead of leaking into a newer request.
    pub fn cancel(&mut self, id: RequestId) {
        self.queue.retain(|(entry, _)| *entry != id);
    }

    /// Drop every pending request; waiting callers observe a closed
    /// channel. Called when the engine's output stream ends.
    pub fn abandon_pending(&mut self) {
        self.queue.clear();
    }

    /// Number of requests still awaiting a reply.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Classify one stdout line.
    ///
    /// Returns follow-up protocol lines the caller must send to the
    /// engine; only the best-move path produces any. Each pending
    /// request resolves at most once: resolution consumes the sender
    /// and pops the entry before the next line is looked at.
    pub fn take_line(&mut self, line: &str) -> Vec<String> {
        if let Some(mv) = protocol::parse_best_move(line) {
            return self.record_best_move(mv);
        }
        if let Some(fen) = protocol::parse_position_dump(line) {
            self.resolve_position(fen);
        } else if let Some(moves) = protocol::parse_legal_moves(line) {
            self.resolve_legal_moves(moves);
        }
        // everything else is engine chatter, discarded
        Vec::new()
    }

    /// A best-move report is not a terminal result: convert it into the
    /// position-update the rest of the system expects by asking the
    /// engine to apply its own move and dump the outcome.
    fn record_best_move(&mut self, mv: &str) -> Vec<String> {
        match self.queue.front_mut() {
            Some((_, Waiting::Position { base_fen: Some(base), chosen, .. }))
                if chosen.is_none() =>
            {
                let follow_ups = vec![protocol::apply_move(base, mv), protocol::DUMP.to_string()];
                *chosen = Some(mv.to_string());
                follow_ups
            }
            // A best-move with no engine-move request in front has no
            // position to apply to; discard it.
            _ => Vec::new(),
        }
    }

    fn resolve_position(&mut self, fen: &str) {
        if !matches!(self.queue.front(), Some((_, Waiting::Position { .. }))) {
            return;
        }
        let Some((_, Waiting::Position { reply, chosen, .. })) = self.queue.pop_front() else {
            return;
        };
        let _ = reply.send(PositionUpdate {
            fen: fen.to_string(),
            engine_move: chosen,
        });
    }

    fn resolve_legal_moves(&mut self, moves: Vec<String>) {
        if !matches!(self.queue.front(), Some((_, Waiting::LegalMoves { .. }))) {
            return;
        }
        let Some((_, Waiting::LegalMoves { reply })) = self.queue.pop_front() else {
            return;
        };
        let _ = reply.send(moves);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::START_FEN;
    use tokio::sync::oneshot::error::TryRecvError;

    const E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    #[test]
    fn test_position_dump_resolves_front_request() {
        let mut c = Correlator::new();
        let (_id, mut rx) = c.expect_position();
        let follow_ups = c.take_line(&format!("Fen: {START_FEN}"));
        assert!(follow_ups.is_empty());
        let update = rx.try_recv().expect("request should be resolved");
        assert_eq!(update.fen, START_FEN);
        assert_eq!(update.engine_move, None);
        assert_eq!(c.pending(), 0);
    }

    #[test]
    fn test_each_request_resolves_at_most_once() {
        let mut c = Correlator::new();
        let (_id, mut rx) = c.expect_position();
        c.take_line(&format!("Fen: {START_FEN}"));
        // a second dump with nothing pending must be discarded, not
        // double-delivered
        c.take_line(&format!("Fen: {E4_FEN}"));
        assert_eq!(rx.try_recv().unwrap().fen, START_FEN);
        assert_eq!(c.pending(), 0);
    }

    #[test]
    fn test_dump_fen_does_not_satisfy_a_legal_moves_request() {
        let mut c = Correlator::new();
        let (_id, mut rx) = c.expect_legal_moves();
        // `d` prints the FEN line before the move list
        c.take_line(&format!("Fen: {START_FEN}"));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        c.take_line("Legal uci moves: e2e4 d2d4 g1f3");
        assert_eq!(rx.try_recv().unwrap(), vec!["e2e4", "d2d4", "g1f3"]);
    }

    #[test]
    fn test_best_move_triggers_follow_ups_then_resolves_on_dump() {
        let mut c = Correlator::new();
        let (_id, mut rx) = c.expect_engine_move(START_FEN.to_string());
        let follow_ups = c.take_line("bestmove e2e4 ponder e7e5");
        assert_eq!(
            follow_ups,
            vec![
                format!("position fen {START_FEN} moves e2e4"),
                "d".to_string()
            ]
        );
        assert!(
            matches!(rx.try_recv(), Err(TryRecvError::Empty)),
            "nothing resolves until the dump arrives"
        );
        c.take_line(&format!("Fen: {E4_FEN}"));
        let update = rx.try_recv().unwrap();
        assert_eq!(update.engine_move.as_deref(), Some("e2e4"));
        assert_eq!(update.fen, E4_FEN);
    }

    #[test]
    fn test_best_move_without_matching_request_is_discarded() {
        let mut c = Correlator::new();
        let (_id, mut rx) = c.expect_position();
        assert!(c.take_line("bestmove e2e4").is_empty());
        assert_eq!(c.pending(), 1);
        c.take_line(&format!("Fen: {START_FEN}"));
        assert_eq!(rx.try_recv().unwrap().engine_move, None);
    }

    #[test]
    fn test_none_best_move_is_discarded() {
        let mut c = Correlator::new();
        let (_id, _rx) = c.expect_engine_move(START_FEN.to_string());
        assert!(c.take_line("bestmove (none)").is_empty());
        assert_eq!(c.pending(), 1);
    }

    #[test]
    fn test_repeated_best_move_lines_produce_one_follow_up() {
        let mut c = Correlator::new();
        let (_id, _rx) = c.expect_engine_move(START_FEN.to_string());
        assert!(!c.take_line("bestmove e2e4").is_empty());
        assert!(c.take_line("bestmove d2d4").is_empty());
    }

    #[test]
    fn test_unrecognized_lines_are_ignored() {
        let mut c = Correlator::new();
        let (_id, mut rx) = c.expect_position();
        assert!(c.take_line("info string hello").is_empty());
        assert!(c.take_line("readyok").is_empty());
        assert!(c.take_line("Checkers:").is_empty());
        assert_eq!(c.pending(), 1);
        c.take_line(&format!("Fen: {START_FEN}"));
        assert_eq!(rx.try_recv().unwrap().fen, START_FEN);
    }

    #[test]
    fn test_cancel_clears_the_slot() {
        let mut c = Correlator::new();
        let (id, mut stale) = c.expect_position();
        c.cancel(id);
        assert_eq!(c.pending(), 0);
        // a late reply for the cancelled request is a discard
        c.take_line(&format!("Fen: {START_FEN}"));
        assert!(matches!(stale.try_recv(), Err(TryRecvError::Closed)));

        // the next request correlates independently
        let (_id, mut fresh) = c.expect_position();
        c.take_line(&format!("Fen: {E4_FEN}"));
        assert_eq!(fresh.try_recv().unwrap().fen, E4_FEN);
    }

    #[test]
    fn test_requests_resolve_in_submission_order() {
        let mut c = Correlator::new();
        let (_a, mut first) = c.expect_position();
        let (_b, mut second) = c.expect_legal_moves();
        c.take_line(&format!("Fen: {START_FEN}"));
        c.take_line("Legal uci moves: e2e4");
        assert_eq!(first.try_recv().unwrap().fen, START_FEN);
        assert_eq!(second.try_recv().unwrap(), vec!["e2e4"]);
    }

    #[test]
    fn test_abandon_pending_closes_waiting_callers() {
        let mut c = Correlator::new();
        let (_id, mut rx) = c.expect_position();
        c.abandon_pending();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Closed)));
        assert_eq!(c.pending(), 0);
    }
}
