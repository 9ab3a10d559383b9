//! Implements the static evaluation function.
//!
//! The evaluation has three components, each computed from white's
//! point of view and negated when black is to move:
//!
//! * **Material** -- piece values times piece counts.
//!
//! * **Piece-square tables** -- a fixed bonus for each piece on each
//!   square. The tables encode well-known rules of thumb: knights
//!   and bishops belong in the center, pawns should advance, rooks
//!   are strong on the seventh rank, castled kings are safer.
//!
//! * **King safety** -- pawn shield, open files near the king,
//!   enemy pieces in the king's zone, and tropism. The whole term is
//!   scaled by the game phase (it matters in the middlegame, not in
//!   the endgame) and sharply reduced when the enemy has no queen.

use crate::board::*;
use crate::bitsets::*;
use crate::files::file;
use crate::ranks::rank;
use crate::value::*;
use super::Position;

/// The material value of each piece in centipawns.
pub const PIECE_VALUES: [Value; 12] = [100, 300, 350, 500, 900, 0, 100, 300, 350, 500, 900, 0];

// The base piece-square tables, one per piece kind, written from
// white's perspective with rank 8 at the top. Black uses the same
// tables through a vertical mirror.
#[rustfmt::skip]
const PIECE_SQUARE_BASE: [[Value; 64]; 6] = [
    // Pawn: advancement is encouraged, the central squares are
    // preferred, and the unmoved d/e-pawn hooks (d2/e2 blockers) are
    // penalized.
    [
         0,   0,   0,   0,   0,   0,   0,   0,
        60,  60,  60,  60,  70,  60,  60,  60,
        40,  40,  40,  50,  60,  40,  40,  40,
        20,  20,  20,  40,  50,  20,  20,  20,
         5,   5,  15,  30,  40,  10,   5,   5,
         5,   5,  10,  20,  30,   5,   5,   5,
         5,   5,   5, -30, -30,   5,   5,   5,
         0,   0,   0,   0,   0,   0,   0,   0,
    ],
    // Knight: strong in the center, dim on the rim.
    [
        -20, -10, -10, -10, -10, -10, -10, -20,
        -10,  -5,  -5,  -5,  -5,  -5,  -5, -10,
        -10,  -5,  15,  15,  15,  15,  -5, -10,
        -10,  -5,  15,  15,  15,  15,  -5, -10,
        -10,  -5,  15,  15,  15,  15,  -5, -10,
        -10,  -5,  10,  15,  15,  15,  -5, -10,
        -10,  -5,  -5,  -5,  -5,  -5,  -5, -10,
        -20, -10, -10, -10, -10, -10, -10, -20,
    ],
    // Bishop: long diagonals, avoid the edges.
    [
        -20,   0,   0,   0,   0,   0,   0, -20,
        -15,   0,   0,   0,   0,   0,   0, -15,
        -10,   0,   0,   5,   5,   0,   0, -10,
        -10,  10,  10,  30,  30,  10,  10, -10,
          5,   5,  10,  25,  25,  10,   5,   5,
          5,   5,   5,  10,  10,   5,   5,   5,
        -10,   5,   5,  10,  10,   5,   5, -10,
        -20, -10, -10, -10, -10, -10, -10, -20,
    ],
    // Rook: the seventh rank is golden, centralized rooks can swing
    // to either side.
    [
         0,   0,   0,   0,   0,   0,   0,   0,
        15,  15,  15,  20,  20,  15,  15,  15,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,  10,  10,  10,   0,   0,
    ],
    // Queen: central control without early overcommitment.
    [
        -30, -20, -10, -10, -10, -10, -20, -30,
        -20, -10,  -5,  -5,  -5,  -5, -10, -20,
        -10,  -5,  10,  10,  10,  10,  -5, -10,
        -10,  -5,  10,  20,  20,  10,  -5, -10,
        -10,  -5,  10,  20,  20,  10,  -5, -10,
        -10,  -5,  -5,  -5,  -5,  -5,  -5, -10,
        -20, -10,  -5,  -5,  -5,  -5, -10, -20,
        -30, -20, -10, -10, -10, -10, -20, -30,
    ],
    // King: stay castled and protected; a central king is a target
    // while the queens are on the board.
    [
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0,  20,  20,   0,   0,   0,
         0,   0,   0,  20,  20,   0,   0,   0,
         0,   0,   0,   0,   0,   0,   0,   0,
         0,   0,   0, -10, -10,   0,   0,   0,
         0,   0,  20, -10, -10,   0,  20,   0,
    ],
];

// Maps a square to the index at which its value is found in the base
// tables: a vertical mirror for white (the tables are written rank 8
// first), the identity for black.
#[rustfmt::skip]
const RANK_FLIP: [[usize; 64]; 2] = [
    [
        56, 57, 58, 59, 60, 61, 62, 63,
        48, 49, 50, 51, 52, 53, 54, 55,
        40, 41, 42, 43, 44, 45, 46, 47,
        32, 33, 34, 35, 36, 37, 38, 39,
        24, 25, 26, 27, 28, 29, 30, 31,
        16, 17, 18, 19, 20, 21, 22, 23,
         8,  9, 10, 11, 12, 13, 14, 15,
         0,  1,  2,  3,  4,  5,  6,  7,
    ],
    [
         0,  1,  2,  3,  4,  5,  6,  7,
         8,  9, 10, 11, 12, 13, 14, 15,
        16, 17, 18, 19, 20, 21, 22, 23,
        24, 25, 26, 27, 28, 29, 30, 31,
        32, 33, 34, 35, 36, 37, 38, 39,
        40, 41, 42, 43, 44, 45, 46, 47,
        48, 49, 50, 51, 52, 53, 54, 55,
        56, 57, 58, 59, 60, 61, 62, 63,
    ],
];

const fn build_psqt() -> [[Value; 64]; 12] {
    let mut psqt = [[0; 64]; 12];
    let mut piece = 0;
    while piece < 12 {
        let mut square = 0;
        while square < 64 {
            psqt[piece][square] = PIECE_SQUARE_BASE[piece % 6][RANK_FLIP[piece / 6][square]];
            square += 1;
        }
        piece += 1;
    }
    psqt
}

/// The combined piece-square tables for all twelve pieces.
pub static PIECE_SQUARE_TABLES: [[Value; 64]; 12] = build_psqt();

// Game phase weights. The phase is the non-pawn material still on
// the board, normalized to 0 (bare endgame) .. 256 (full
// middlegame).
const PHASE_KNIGHT: i32 = 1;
const PHASE_BISHOP: i32 = 1;
const PHASE_ROOK: i32 = 2;
const PHASE_QUEEN: i32 = 4;
const PHASE_TOTAL: i32 = 4 * PHASE_KNIGHT + 4 * PHASE_BISHOP + 4 * PHASE_ROOK + 2 * PHASE_QUEEN;

// Pawn shield bonuses for a shield pawn on the second, third, and
// fourth ranks in front of the king.
const PAWN_SHIELD_BONUS: [Value; 3] = [12, 8, 4];

// Penalties for a wholly missing shield pawn. The f-pawn guards the
// critical diagonals around a castled king, so its absence costs
// the most. On the queenside the c/b/a-pawns take the roles of the
// f/g/h-pawns.
const MISSING_F_PAWN_PENALTY: Value = -25;
const MISSING_G_PAWN_PENALTY: Value = -15;
const MISSING_H_PAWN_PENALTY: Value = -8;

const OPEN_FILE_PENALTY: Value = -20;
const SEMI_OPEN_FILE_PENALTY: Value = -10;

// Attack-zone weights per piece kind (pawns and kings excluded);
// the total is additionally multiplied by the attacker count.
const ATTACK_WEIGHTS: [Value; 6] = [0, 2, 2, 3, 5, 0];

// Tropism weights per piece kind, scaled by closeness in Manhattan
// distance.
const TROPISM_WEIGHTS: [Value; 6] = [0, 1, 1, 2, 3, 0];

// Without a queen the enemy's attacking chances drop dramatically.
const NO_QUEEN_SAFETY_DIVISOR: Value = 4;

/// Evaluates a position statically.
///
/// Returns a centipawn score from the side-to-move's perspective:
/// positive is good for the side to move.
pub fn evaluate(pos: &Position) -> Value {
    let board = &pos.board;
    let score = eval_material(WHITE, board) - eval_material(BLACK, board) +
                eval_psqt(WHITE, board) - eval_psqt(BLACK, board) +
                eval_king_safety(WHITE, board) - eval_king_safety(BLACK, board);
    if pos.to_move == WHITE {
        score
    } else {
        -score
    }
}

/// Sums the material value of one side.
pub fn eval_material(color: Color, board: &Board) -> Value {
    let mut total = 0;
    for &piece in PIECES_OF[color].iter() {
        total += PIECE_VALUES[piece] * board.piece_count(piece) as Value;
    }
    total
}

/// Sums the piece-square bonuses of one side.
pub fn eval_psqt(color: Color, board: &Board) -> Value {
    let mut total = 0;
    for &piece in PIECES_OF[color].iter() {
        let mut piece_bb = board.pieces(piece);
        while piece_bb != 0 {
            total += PIECE_SQUARE_TABLES[piece][bsf_reset(&mut piece_bb)];
        }
    }
    total
}

/// Evaluates the safety of one side's king.
///
/// Combines the pawn shield, open files near the king, the enemy
/// presence in the king's zone, and tropism, scaled by the game
/// phase.
pub fn eval_king_safety(color: Color, board: &Board) -> Value {
    let king_bb = board.pieces(king(color));
    if king_bb == 0 {
        // No king on the board; only reachable from artificial test
        // positions.
        return 0;
    }
    let king_square = bsf(king_bb);
    let enemy = opponent(color);
    let phase = game_phase(board);

    let mut score = eval_pawn_shield(color, king_square, board) +
                    eval_open_files(color, king_square, board) +
                    eval_attack_zone(color, king_square, board) +
                    eval_tropism(color, king_square, board);

    score = (score as i32 * phase / 256) as Value;
    if board.pieces(queen(enemy)) == 0 {
        score /= NO_QUEEN_SAFETY_DIVISOR;
    }
    score
}

/// Returns the game phase between 0 (bare endgame) and 256 (full
/// middlegame), judged by the non-pawn material on the board.
fn game_phase(board: &Board) -> i32 {
    let mut phase = 0;
    for color in 0..2 {
        phase += PHASE_KNIGHT * board.piece_count(knight(color)) as i32;
        phase += PHASE_BISHOP * board.piece_count(bishop(color)) as i32;
        phase += PHASE_ROOK * board.piece_count(rook(color)) as i32;
        phase += PHASE_QUEEN * board.piece_count(queen(color)) as i32;
    }
    (phase * 256 + PHASE_TOTAL / 2) / PHASE_TOTAL
}

/// Returns the files of the pawn shield: the king's file and its
/// immediate neighbours (when they exist).
fn shield_files(king_square: Square) -> [Option<File>; 3] {
    let king_file = file(king_square);
    [if king_file > 0 { Some(king_file - 1) } else { None },
     Some(king_file),
     if king_file < 7 { Some(king_file + 1) } else { None }]
}

fn eval_pawn_shield(color: Color, king_square: Square, board: &Board) -> Value {
    let own_pawns = board.pieces(pawn(color));
    let kingside = file(king_square) >= 4;
    let base_rank: isize = if color == WHITE { 1 } else { 6 };
    let direction: isize = if color == WHITE { 1 } else { -1 };

    let mut score = 0;
    for shield_file in shield_files(king_square) {
        let shield_file = match shield_file {
            Some(f) => f,
            None => continue,
        };

        // Look for a shield pawn on the second, third, or fourth
        // rank in front of the king.
        let mut found_pawn = false;
        for rank_offset in 0..3 {
            let rank = base_rank + direction * rank_offset;
            if !(0..8).contains(&rank) {
                continue;
            }
            if own_pawns & 1 << square(shield_file, rank as usize) != 0 {
                score += PAWN_SHIELD_BONUS[rank_offset as usize];
                found_pawn = true;
                break;
            }
        }

        if !found_pawn {
            score += if kingside {
                match shield_file {
                    5 => MISSING_F_PAWN_PENALTY,
                    6 => MISSING_G_PAWN_PENALTY,
                    7 => MISSING_H_PAWN_PENALTY,
                    _ => 0,
                }
            } else {
                // Queenside shield files, mirrored.
                match shield_file {
                    2 => MISSING_F_PAWN_PENALTY,
                    1 => MISSING_G_PAWN_PENALTY,
                    0 => MISSING_H_PAWN_PENALTY,
                    _ => 0,
                }
            };
        }
    }
    score
}

fn eval_open_files(color: Color, king_square: Square, board: &Board) -> Value {
    let own_pawns = board.pieces(pawn(color));
    let enemy_pawns = board.pieces(pawn(opponent(color)));

    let mut score = 0;
    for shield_file in shield_files(king_square) {
        let shield_file = match shield_file {
            Some(f) => f,
            None => continue,
        };
        let file_mask = BB_FILES[shield_file];
        let has_own_pawn = own_pawns & file_mask != 0;
        let has_enemy_pawn = enemy_pawns & file_mask != 0;
        if !has_own_pawn && !has_enemy_pawn {
            score += OPEN_FILE_PENALTY;
        } else if !has_own_pawn && has_enemy_pawn {
            score += SEMI_OPEN_FILE_PENALTY;
        }
    }
    score
}

fn manhattan_distance(a: Square, b: Square) -> usize {
    let file_diff = (file(a) as isize - file(b) as isize).unsigned_abs();
    let rank_diff = (rank(a) as isize - rank(b) as isize).unsigned_abs();
    file_diff + rank_diff
}

fn chebyshev_distance(a: Square, b: Square) -> usize {
    let file_diff = (file(a) as isize - file(b) as isize).unsigned_abs();
    let rank_diff = (rank(a) as isize - rank(b) as isize).unsigned_abs();
    file_diff.max(rank_diff)
}

/// Penalizes enemy pieces within striking range of the king.
///
/// Each piece kind has its own Chebyshev radius; the accumulated
/// weight is multiplied by the attacker count so that piling
/// attackers on hurts quadratically.
fn eval_attack_zone(color: Color, king_square: Square, board: &Board) -> Value {
    let enemy = opponent(color);
    let mut attacker_count = 0;
    let mut attack_weight = 0;

    for (kind, radius) in [(1, 2), (2, 3), (3, 3), (4, 4)] {
        let mut enemy_pieces = board.pieces(6 * enemy + kind);
        while enemy_pieces != 0 {
            let square = bsf_reset(&mut enemy_pieces);
            if chebyshev_distance(square, king_square) <= radius {
                attacker_count += 1;
                attack_weight += ATTACK_WEIGHTS[kind];
            }
        }
    }

    if attacker_count == 0 {
        0
    } else {
        -attack_weight * attacker_count * 3
    }
}

/// Penalizes enemy pieces for sheer closeness to the king.
fn eval_tropism(color: Color, king_square: Square, board: &Board) -> Value {
    let enemy = opponent(color);
    let mut score = 0;
    for kind in 1..5 {
        let mut enemy_pieces = board.pieces(6 * enemy + kind);
        while enemy_pieces != 0 {
            let square = bsf_reset(&mut enemy_pieces);
            let distance = manhattan_distance(square, king_square) as Value;
            score -= TROPISM_WEIGHTS[kind] * (14 - distance) / 2;
        }
    }
    score
}
