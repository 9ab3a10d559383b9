//! Implements the engine facade.
//!
//! `Engine` owns the mutable game state: the current position and
//! the transposition table. Frontends (the UCI adapter, tests,
//! tools) drive it through a handful of operations and never touch
//! `Position` lifetimes directly. The table lives as long as the
//! engine and is reused from search to search, so knowledge gathered
//! in one move carries over to the next; a new game wipes it.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use log::debug;
use crate::depth::Depth;
use crate::moves::Move;
use crate::notation::NotationError;
use crate::position::Position;
use crate::position::evaluation::evaluate;
use crate::position::move_generation::perft;
use crate::search::{search, Limits, Reporter, SearchResult};
use crate::search::tt::TranspositionTable;
use crate::value::Value;

/// The chess engine: one current position, one transposition table.
pub struct Engine {
    position: Position,
    tt: TranspositionTable,
}

impl Engine {
    /// Creates an engine holding the standard starting position.
    pub fn new() -> Engine {
        Engine {
            position: Position::startpos(),
            tt: TranspositionTable::new(),
        }
    }

    /// Returns the current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Resets the position to the starting array and forgets all
    /// cached search results.
    pub fn new_game(&mut self) {
        self.position = Position::startpos();
        self.tt.clear();
    }

    /// Replaces the current position.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Replaces the current position with one parsed from FEN.
    ///
    /// On error the engine state is unchanged.
    pub fn set_position_from_fen(&mut self, fen: &str) -> Result<(), NotationError> {
        self.position = Position::from_fen(fen)?;
        Ok(())
    }

    /// Plays a move on the current position.
    ///
    /// The move must be legal; feeding an illegal move corrupts the
    /// game state.
    pub fn apply_move(&mut self, m: &Move) {
        debug!("apply move {}", m);
        self.position.do_move(m);
    }

    /// Plays a sequence of moves on the current position.
    pub fn apply_moves(&mut self, moves: &[Move]) {
        for m in moves {
            self.apply_move(m);
        }
    }

    /// Searches the current position under the given limits.
    ///
    /// The search runs on a copy of the position; the engine's own
    /// position is left untouched.
    pub fn search(&mut self,
                  limits: &Limits,
                  reporter: &mut dyn Reporter,
                  stop_flag: Option<Arc<AtomicBool>>)
                  -> SearchResult {
        let mut position = self.position.clone();
        search(&mut position, limits, reporter, &mut self.tt, stop_flag)
    }

    /// Resizes the transposition table.
    ///
    /// The size is clamped to the supported range and the table
    /// starts out empty.
    pub fn set_hash_size_mb(&mut self, size_mb: usize) {
        self.tt = TranspositionTable::with_size_mb(size_mb);
    }

    /// Wipes the transposition table.
    pub fn clear_tt(&mut self) {
        self.tt.clear();
    }

    /// Statically evaluates the current position.
    pub fn evaluate_static(&self) -> Value {
        evaluate(&self.position)
    }

    /// Counts the leaf nodes of the current position's legal-move
    /// tree at a given depth.
    pub fn perft(&self, depth: Depth) -> u64 {
        let mut position = self.position.clone();
        perft(&mut position, depth)
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::*;
    use crate::search::NullReporter;
    use crate::squares::*;

    fn quiet(piece: Piece, orig_square: Square, dest_square: Square) -> Move {
        Move {
            piece: piece,
            orig_square: orig_square,
            dest_square: dest_square,
            captured_piece: None,
            promotion_piece: None,
            is_enpassant: false,
        }
    }

    #[test]
    fn starts_at_the_initial_position() {
        let engine = Engine::new();
        let pos = engine.position();
        assert_eq!(pos.to_move, WHITE);
        assert_eq!(pos.board.piece_at(E1), Some(WK));
        assert_eq!(pos.board.piece_at(E8), Some(BK));
        assert_eq!(pos.board.piece_at(E2), Some(WP));
        assert_eq!(pos.fullmove_number, 1);
        assert_eq!(pos.halfmove_clock, 0);
    }

    #[test]
    fn new_game_resets_the_position() {
        let mut engine = Engine::new();
        engine.apply_move(&quiet(WP, E2, E4));
        engine.apply_move(&quiet(BP, E7, E5));
        assert_eq!(engine.position().board.piece_at(E4), Some(WP));
        engine.new_game();
        assert_eq!(engine.position().board.piece_at(E2), Some(WP));
        assert_eq!(engine.position().board.piece_at(E4), None);
        assert_eq!(engine.position().fullmove_number, 1);
    }

    #[test]
    fn applied_moves_advance_the_game() {
        let mut engine = Engine::new();
        // 1. e4 c5 2. Nf3 d6 3. d4 cxd4 4. Nxd4 Nf6
        let sicilian = [quiet(WP, E2, E4),
                        quiet(BP, C7, C5),
                        quiet(WN, G1, F3),
                        quiet(BP, D7, D6),
                        quiet(WP, D2, D4),
                        Move { captured_piece: Some(WP), ..quiet(BP, C5, D4) },
                        Move { captured_piece: Some(BP), ..quiet(WN, F3, D4) },
                        quiet(BN, G8, F6)];
        engine.apply_moves(&sicilian);
        let pos = engine.position();
        assert_eq!(pos.to_move, WHITE);
        assert_eq!(pos.board.piece_at(E4), Some(WP));
        assert_eq!(pos.board.piece_at(D4), Some(WN));
        assert_eq!(pos.board.piece_at(D6), Some(BP));
        assert_eq!(pos.board.piece_at(F6), Some(BN));
        assert_eq!(pos.board.piece_at(C5), None);
        assert_eq!(pos.fullmove_number, 5);
    }

    #[test]
    fn search_leaves_the_position_untouched() {
        let mut engine = Engine::new();
        engine.set_position_from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R \
                                      w KQkq - 0 1")
              .unwrap();
        let fen_before = engine.position().to_fen();
        let key_before = engine.position().key;
        let limits = Limits { depth: Some(3), ..Default::default() };
        engine.search(&limits, &mut NullReporter, None);
        assert_eq!(engine.position().to_fen(), fen_before);
        assert_eq!(engine.position().key, key_before);
    }

    #[test]
    fn bad_fen_leaves_the_position_untouched() {
        let mut engine = Engine::new();
        assert!(engine.set_position_from_fen("not a fen").is_err());
        assert_eq!(engine.position().to_fen(), crate::position::START_POS_FEN);
    }

    #[test]
    fn hash_size_can_be_reconfigured() {
        let mut engine = Engine::new();
        engine.set_hash_size_mb(1);
        let limits = Limits { depth: Some(2), ..Default::default() };
        let result = engine.search(&limits, &mut NullReporter, None);
        assert!(result.depth >= 1);
        assert!(!result.pv.is_empty());
    }

    #[test]
    fn static_evaluation_and_perft() {
        let engine = Engine::new();
        assert_eq!(engine.evaluate_static(), 0);
        assert_eq!(engine.perft(1), 20);
        assert_eq!(engine.perft(2), 400);
    }
}
