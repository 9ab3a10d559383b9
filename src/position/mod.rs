//! Implements `Position` -- the complete game state.
//!
//! A position is more than the piece placement: it also carries the
//! side to move, the castling rights, the en-passant target square,
//! the two move clocks, and the Zobrist key of the whole state. The
//! key is maintained incrementally: `do_move` XOR-s out the vanished
//! features and XOR-s in the appeared ones, which is O(1) instead of
//! a full recomputation. In debug builds every transition checks the
//! incremental key against `compute_key`.
//!
//! `do_move` saves the fields that can not be derived from the move
//! being unmade (castling rights, en-passant square, half-move
//! clock, key) on a history stack; `undo_move` pops and restores
//! them. The stack of keys doubles as the record used for detecting
//! draws by repetition.

pub mod zobrist;
pub mod board_geometry;
pub mod move_generation;
pub mod evaluation;

use crate::board::*;
use crate::bitsets::*;
use crate::files::file;
use crate::moves::Move;
use crate::notation;
use crate::notation::NotationError;
use self::zobrist::ZOBRIST;
use self::move_generation::enpassant_sources;

/// The standard starting position in Forsyth–Edwards Notation.
pub const START_POS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// The maximum number of entries the history stack may hold.
pub const MAX_HISTORY: usize = 256;

/// The fields of a position that can not be reconstructed from the
/// move being unmade.
#[derive(Debug, Clone, Copy)]
struct HistoryEntry {
    castling_rights: CastlingRights,
    enpassant_square: Option<Square>,
    halfmove_clock: u8,
    key: u64,
}

/// The complete state of one game of chess.
#[derive(Clone)]
pub struct Position {
    pub board: Board,
    pub to_move: Color,
    pub castling_rights: CastlingRights,
    pub enpassant_square: Option<Square>,
    pub halfmove_clock: u8,
    pub fullmove_number: u8,
    pub key: u64,
    history: Vec<HistoryEntry>,
}

impl Position {
    /// Creates a new position from its components.
    pub fn new(board: Board,
               to_move: Color,
               castling_rights: CastlingRights,
               enpassant_square: Option<Square>,
               halfmove_clock: u8,
               fullmove_number: u8)
               -> Position {
        let mut position = Position {
            board: board,
            to_move: to_move,
            castling_rights: castling_rights,
            enpassant_square: enpassant_square,
            halfmove_clock: halfmove_clock,
            fullmove_number: fullmove_number,
            key: 0,
            history: Vec::with_capacity(MAX_HISTORY),
        };
        position.key = position.compute_key();
        position
    }

    /// Creates the standard starting position.
    pub fn startpos() -> Position {
        Position::from_fen(START_POS_FEN).unwrap()
    }

    /// Parses a position from Forsyth–Edwards Notation.
    pub fn from_fen(fen: &str) -> Result<Position, NotationError> {
        let (board, to_move, castling_rights, enpassant_square, halfmove_clock, fullmove_number) =
            notation::parse_fen(fen)?;
        Ok(Position::new(board,
                         to_move,
                         castling_rights,
                         enpassant_square,
                         halfmove_clock,
                         fullmove_number))
    }

    /// Serializes the position to Forsyth–Edwards Notation.
    pub fn to_fen(&self) -> String {
        format!("{} {} {} {} {} {}",
                notation::board_to_fen(&self.board),
                if self.to_move == WHITE { 'w' } else { 'b' },
                notation::castling_rights_to_fen(self.castling_rights),
                match self.enpassant_square {
                    Some(square) => notation::square_notation(square).to_string(),
                    None => "-".to_string(),
                },
                self.halfmove_clock,
                self.fullmove_number)
    }

    /// Returns the color that is not to move.
    #[inline(always)]
    pub fn opponent_color(&self) -> Color {
        opponent(self.to_move)
    }

    /// Calculates the Zobrist key of the position from scratch.
    ///
    /// During play the key is maintained incrementally; this method
    /// is used at construction time, and as the reference value for
    /// the debug-build consistency checks.
    pub fn compute_key(&self) -> u64 {
        let mut key = 0;
        for &piece in ALL_PIECES.iter() {
            let mut piece_bb = self.board.pieces(piece);
            while piece_bb != 0 {
                key ^= ZOBRIST.pieces[piece][bsf_reset(&mut piece_bb)];
            }
        }
        if self.to_move == BLACK {
            key ^= ZOBRIST.to_move;
        }
        key ^= ZOBRIST.castling_rights[self.castling_rights.value()];

        // The en-passant file counts only when a capturing pawn
        // actually exists, so that positions differing only in a
        // phantom en-passant target transpose to the same key.
        if let Some(square) = self.enpassant_square {
            if enpassant_sources(square, self.to_move, &self.board) != 0 {
                key ^= ZOBRIST.enpassant_file[file(square)];
            }
        }
        key
    }

    /// Plays a move on the board.
    ///
    /// The move must be pseudo-legal. The caller is responsible for
    /// verifying afterwards that the side that just moved is not in
    /// check, and for calling `undo_move` with the same move if it
    /// is.
    pub fn do_move(&mut self, m: &Move) {
        let history = HistoryEntry {
            castling_rights: self.castling_rights,
            enpassant_square: self.enpassant_square,
            halfmove_clock: self.halfmove_clock,
            key: self.key,
        };
        self.history.push(history);
        debug_assert!(self.history.len() <= MAX_HISTORY);

        if let Some(square) = self.enpassant_square {
            if enpassant_sources(square, self.to_move, &self.board) != 0 {
                self.key ^= ZOBRIST.enpassant_file[file(square)];
            }
        }
        self.enpassant_square = None;
        self.halfmove_clock = self.halfmove_clock.wrapping_add(1);

        if let Some(capture_square) = m.capture_square() {
            self.halfmove_clock = 0;
            self.board.remove_piece(capture_square);
            self.key ^= ZOBRIST.pieces[m.captured_piece.unwrap()][capture_square];
        }

        if is_pawn(m.piece) {
            self.halfmove_clock = 0;
            if m.rank_diff() == 2 {
                let square = advanced_square(m.orig_square, self.to_move);
                self.enpassant_square = Some(square);
                if enpassant_sources(square, self.opponent_color(), &self.board) != 0 {
                    self.key ^= ZOBRIST.enpassant_file[file(square)];
                }
            }
        }

        if is_king(m.piece) {
            self.castling_rights.remove_for_color(self.to_move);
            if m.is_castling() {
                let rook_piece = rook(self.to_move);
                let rank_base = m.dest_square & !7;
                let (rook_from, rook_to) = if m.dest_square & 7 == 2 {
                    // Queen-side: the rook jumps from the A-file to
                    // the D-file on the king's rank.
                    (rank_base, rank_base + 3)
                } else {
                    // King-side: from the H-file to the F-file.
                    (rank_base + 7, rank_base + 5)
                };
                self.board.remove_piece(rook_from);
                self.board.put_piece(rook_piece, rook_to);
                self.key ^= ZOBRIST.pieces[rook_piece][rook_from];
                self.key ^= ZOBRIST.pieces[rook_piece][rook_to];
            }
        }

        if 1 << m.orig_square & BB_CORNERS != 0 {
            self.castling_rights.remove_for_corner(m.orig_square);
        }
        if 1 << m.dest_square & BB_CORNERS != 0 {
            self.castling_rights.remove_for_corner(m.dest_square);
        }
        self.key ^= ZOBRIST.castling_rights[self.castling_rights.value()];
        self.key ^= ZOBRIST.castling_rights[history.castling_rights.value()];

        let dest_piece = m.promotion_piece.unwrap_or(m.piece);
        self.board.remove_piece(m.orig_square);
        self.board.put_piece(dest_piece, m.dest_square);
        self.key ^= ZOBRIST.pieces[dest_piece][m.dest_square];
        self.key ^= ZOBRIST.pieces[m.piece][m.orig_square];

        if self.to_move == BLACK {
            self.fullmove_number = self.fullmove_number.wrapping_add(1);
        }
        self.to_move = self.opponent_color();
        self.key ^= ZOBRIST.to_move;

        debug_assert_eq!(self.key, self.compute_key());
    }

    /// Takes back a move played by `do_move`.
    pub fn undo_move(&mut self, m: &Move) {
        debug_assert!(!self.history.is_empty());
        let history = self.history.pop().unwrap();
        self.castling_rights = history.castling_rights;
        self.enpassant_square = history.enpassant_square;
        self.halfmove_clock = history.halfmove_clock;
        self.key = history.key;

        if m.is_castling() {
            let rook_piece = rook(self.opponent_color());
            let rank_base = m.dest_square & !7;
            let (rook_from, rook_to) = if m.dest_square & 7 == 2 {
                (rank_base + 3, rank_base)
            } else {
                (rank_base + 5, rank_base + 7)
            };
            self.board.remove_piece(rook_from);
            self.board.put_piece(rook_piece, rook_to);
        }

        self.board.remove_piece(m.dest_square);
        self.board.put_piece(m.piece, m.orig_square);
        if let Some(capture_square) = m.capture_square() {
            self.board.put_piece(m.captured_piece.unwrap(), capture_square);
        }

        self.to_move = self.opponent_color();
        if self.to_move == BLACK {
            self.fullmove_number = self.fullmove_number.wrapping_sub(1);
        }

        debug_assert_eq!(self.key, self.compute_key());
    }

    /// Passes the turn without moving a piece.
    ///
    /// Null moves are illegal in chess but useful in search: if
    /// doing nothing still beats beta, the position is strong enough
    /// to prune. The state transitions (en-passant clearing, clocks,
    /// side to move, key) are the same as for a real move.
    pub fn do_null_move(&mut self) {
        let history = HistoryEntry {
            castling_rights: self.castling_rights,
            enpassant_square: self.enpassant_square,
            halfmove_clock: self.halfmove_clock,
            key: self.key,
        };
        self.history.push(history);
        debug_assert!(self.history.len() <= MAX_HISTORY);

        if let Some(square) = self.enpassant_square {
            if enpassant_sources(square, self.to_move, &self.board) != 0 {
                self.key ^= ZOBRIST.enpassant_file[file(square)];
            }
        }
        self.enpassant_square = None;
        self.halfmove_clock = self.halfmove_clock.wrapping_add(1);

        if self.to_move == BLACK {
            self.fullmove_number = self.fullmove_number.wrapping_add(1);
        }
        self.to_move = self.opponent_color();
        self.key ^= ZOBRIST.to_move;

        debug_assert_eq!(self.key, self.compute_key());
    }

    /// Takes back a null move played by `do_null_move`.
    pub fn undo_null_move(&mut self) {
        debug_assert!(!self.history.is_empty());
        let history = self.history.pop().unwrap();
        self.castling_rights = history.castling_rights;
        self.enpassant_square = history.enpassant_square;
        self.halfmove_clock = history.halfmove_clock;
        self.key = history.key;

        self.to_move = self.opponent_color();
        if self.to_move == BLACK {
            self.fullmove_number = self.fullmove_number.wrapping_sub(1);
        }

        debug_assert_eq!(self.key, self.compute_key());
    }

    /// Returns whether the position is drawn by repetition.
    ///
    /// Inside the current search window (a key match closer than
    /// `search_ply` plies) a single repetition counts as a draw --
    /// allowing the line to cycle would let the search analyse it
    /// forever. Outside the window two matches are required, which
    /// together with the current occurrence makes a threefold
    /// repetition.
    pub fn is_repetition_draw(&self, search_ply: u8) -> bool {
        // No repetition is possible since the last capture or pawn
        // move, and a repetition needs at least 4 plies per cycle.
        if self.halfmove_clock < 8 {
            return false;
        }

        let mut counter = 0;
        let limit = (self.halfmove_clock as usize).min(self.history.len());
        for distance in 0..limit {
            // Entries at even distances have the other side to move;
            // the nearest possible repetition is 4 plies back.
            if distance < 3 || distance % 2 == 0 {
                continue;
            }
            let entry = &self.history[self.history.len() - 1 - distance];
            if entry.key != self.key {
                continue;
            }
            if distance < search_ply as usize {
                return true;
            }
            counter += 1;
            if counter == 2 {
                return true;
            }
        }
        false
    }

    /// Returns whether the position is drawn by the 50-move rule.
    #[inline]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }
}
