//! Implements Forsyth–Edwards Notation parsing and serialization.

use std::error::Error;
use std::fmt;
use lazy_static::lazy_static;
use regex::Regex;
use crate::board::*;
use crate::files::*;
use crate::ranks::*;

/// An error raised when a string can not be interpreted as a board,
/// a square, or a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotationError;

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid notation")
    }
}

impl Error for NotationError {}

/// A move as written in UCI notation: origin and destination squares
/// and an optional promotion piece.
///
/// The promotion letter in the text is colorless; the piece stored
/// here takes its color from the destination rank (rank 1 promotes
/// black pawns, rank 8 white pawns).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciMove {
    pub orig_square: Square,
    pub dest_square: Square,
    pub promotion_piece: Option<Piece>,
}

/// Returns the algebraic notation for a given square.
pub fn square_notation(square: Square) -> &'static str {
    lazy_static! {
        static ref NOTATION: Vec<String> = (0..64)
            .map(|i| {
                format!("{}{}",
                        ["a", "b", "c", "d", "e", "f", "g", "h"][file(i)],
                        ["1", "2", "3", "4", "5", "6", "7", "8"][rank(i)])
            })
            .collect();
    }
    NOTATION[square].as_str()
}

/// Parses square's algebraic notation (lowercase only).
pub fn parse_square(s: &str) -> Result<Square, NotationError> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^[a-h][1-8]$").unwrap();
    }
    if RE.is_match(s) {
        let mut chars = s.chars();
        let file = (chars.next().unwrap().to_digit(18).unwrap() - 10) as usize;
        let rank = (chars.next().unwrap().to_digit(9).unwrap() - 1) as usize;
        Ok(square(file, rank))
    } else {
        Err(NotationError)
    }
}

/// Parses a move written in UCI notation.
///
/// Four or five characters: origin square, destination square, and an
/// optional lowercase promotion letter (`n`, `b`, `r`, or `q`).
pub fn parse_uci_move(s: &str) -> Result<UciMove, NotationError> {
    if s.len() != 4 && s.len() != 5 {
        return Err(NotationError);
    }
    let orig_square = parse_square(&s[0..2])?;
    let dest_square = parse_square(&s[2..4])?;
    let promotion_piece = match s.as_bytes().get(4) {
        None => None,
        Some(&letter) => {
            let color = if rank(dest_square) == RANK_1 {
                BLACK
            } else {
                WHITE
            };
            Some(match letter {
                b'n' => knight(color),
                b'b' => bishop(color),
                b'r' => rook(color),
                b'q' => queen(color),
                _ => return Err(NotationError),
            })
        }
    };
    Ok(UciMove {
        orig_square: orig_square,
        dest_square: dest_square,
        promotion_piece: promotion_piece,
    })
}

/// Parses Forsyth–Edwards Notation (FEN).
///
/// Returns a tuple with the following elements: `0`) a board
/// instance, `1`) the color to move, `2`) the castling rights, `3`)
/// the en-passant target square, `4`) the halfmove clock, `5`) the
/// fullmove number.
///
/// # Forsyth–Edwards Notation
///
/// A FEN string defines a particular position using only the ASCII
/// character set. A FEN string contains six fields separated by a
/// space. The fields are:
///
/// 1. Piece placement (from white's perspective). Each rank is
///    described, starting with rank 8 and ending with rank 1. Within
///    each rank, the contents of each square are described from file
///    A through file H. Each piece is identified by a single letter
///    taken from the standard English names. White pieces are
///    designated using upper-case letters ("PNBRQK") whilst Black
///    uses lowercase ("pnbrqk"). Blank squares are noted using digits
///    1 through 8 (the number of blank squares), and "/" separates
///    ranks.
///
/// 2. Active color. "w" means white moves next, "b" means black.
///
/// 3. Castling availability. If neither side can castle, this is
///    "-". Otherwise, this has one or more letters: "K" (White can
///    castle kingside), "Q" (White can castle queenside), "k" (Black
///    can castle kingside), and/or "q" (Black can castle queenside).
///
/// 4. En-passant target square (in algebraic notation). If there's no
///    en-passant target square, this is "-". If a pawn has just made
///    a 2-square move, this is the position "behind" the pawn.
///
/// 5. Halfmove clock. This is the number of halfmoves since the last
///    pawn advance or capture. This is used to determine if a draw
///    can be claimed under the fifty-move rule.
///
/// 6. Fullmove number. The number of the full move. It starts at 1,
///    and is incremented after Black's move.
pub fn parse_fen(s: &str)
                 -> Result<(Board, Color, CastlingRights, Option<Square>, u8, u8), NotationError> {
    let fields: Vec<_> = s.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(NotationError);
    }
    let board = parse_fen_piece_placement(fields[0])?;
    let to_move = parse_fen_active_color(fields[1])?;
    let castling_rights = parse_fen_castling_rights(fields[2])?;
    let enpassant_square = if let Some(square) = parse_fen_enpassant_square(fields[3])? {
        match to_move {
            WHITE if rank(square) == RANK_6 => Some(square),
            BLACK if rank(square) == RANK_3 => Some(square),
            _ => return Err(NotationError),
        }
    } else {
        None
    };
    let halfmove_clock = fields[4].parse::<u8>().map_err(|_| NotationError)?;
    let fullmove_number = fields[5].parse::<u8>().map_err(|_| NotationError)?;
    if fullmove_number == 0 {
        return Err(NotationError);
    }
    Ok((board, to_move, castling_rights, enpassant_square, halfmove_clock, fullmove_number))
}

/// Serializes a board to the first FEN field.
pub fn board_to_fen(board: &Board) -> String {
    let mut output = String::with_capacity(64 + 7);
    for rank in (0..8).rev() {
        let mut empty_run = 0;
        for file in 0..8 {
            match board.piece_at(square(file, rank)) {
                Some(piece) => {
                    if empty_run > 0 {
                        output.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    output.push(piece_to_char(piece));
                }
                None => {
                    empty_run += 1;
                }
            }
        }
        if empty_run > 0 {
            output.push((b'0' + empty_run) as char);
        }
        if rank > 0 {
            output.push('/');
        }
    }
    output
}

/// Serializes castling rights to the third FEN field.
pub fn castling_rights_to_fen(rights: CastlingRights) -> String {
    let mut output = String::new();
    if rights.has(CASTLE_WHITE_KINGSIDE) {
        output.push('K');
    }
    if rights.has(CASTLE_WHITE_QUEENSIDE) {
        output.push('Q');
    }
    if rights.has(CASTLE_BLACK_KINGSIDE) {
        output.push('k');
    }
    if rights.has(CASTLE_BLACK_QUEENSIDE) {
        output.push('q');
    }
    if output.is_empty() {
        output.push('-');
    }
    output
}

fn parse_fen_piece_placement(s: &str) -> Result<Board, NotationError> {
    // These are the possible productions in the grammar.
    enum Token {
        Piece(Piece),
        EmptySquares(u32),
        Separator,
    }

    // FEN describes the board starting from A8 and going toward H1.
    let mut file = FILE_A;
    let mut rank = RANK_8;

    // We start with an empty board, then read `s` character by
    // character, updating it as we go.
    let mut board = Board::empty();
    for c in s.chars() {
        let token = match c {
            'P' => Token::Piece(WP),
            'N' => Token::Piece(WN),
            'B' => Token::Piece(WB),
            'R' => Token::Piece(WR),
            'Q' => Token::Piece(WQ),
            'K' => Token::Piece(WK),
            'p' => Token::Piece(BP),
            'n' => Token::Piece(BN),
            'b' => Token::Piece(BB),
            'r' => Token::Piece(BR),
            'q' => Token::Piece(BQ),
            'k' => Token::Piece(BK),
            n @ '1'..='8' => Token::EmptySquares(n.to_digit(9).unwrap()),
            '/' => Token::Separator,
            _ => return Err(NotationError),
        };
        match token {
            Token::Piece(piece) => {
                if file > 7 {
                    return Err(NotationError);
                }
                board.put_piece(piece, square(file, rank));
                file += 1;
            }
            Token::EmptySquares(n) => {
                file += n as usize;
                if file > 8 {
                    return Err(NotationError);
                }
            }
            Token::Separator => {
                if file == 8 && rank > 0 {
                    file = 0;
                    rank -= 1;
                } else {
                    return Err(NotationError);
                }
            }
        }
    }

    // Make sure that all squares were initialized.
    if file != 8 || rank != 0 {
        return Err(NotationError);
    }
    Ok(board)
}

fn parse_fen_active_color(s: &str) -> Result<Color, NotationError> {
    match s {
        "w" => Ok(WHITE),
        "b" => Ok(BLACK),
        _ => Err(NotationError),
    }
}

fn parse_fen_castling_rights(s: &str) -> Result<CastlingRights, NotationError> {
    let mut rights = CastlingRights::none();
    if s != "-" {
        if s.is_empty() || s.len() > 4 {
            return Err(NotationError);
        }
        for c in s.chars() {
            let right = match c {
                'K' => CASTLE_WHITE_KINGSIDE,
                'Q' => CASTLE_WHITE_QUEENSIDE,
                'k' => CASTLE_BLACK_KINGSIDE,
                'q' => CASTLE_BLACK_QUEENSIDE,
                _ => return Err(NotationError),
            };
            if rights.has(right) {
                return Err(NotationError);
            }
            rights.grant(right);
        }
    }
    Ok(rights)
}

fn parse_fen_enpassant_square(s: &str) -> Result<Option<Square>, NotationError> {
    if s == "-" {
        Ok(None)
    } else {
        parse_square(s).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squares::*;

    #[test]
    fn parse_squares() {
        assert_eq!(parse_square("a1"), Ok(A1));
        assert_eq!(parse_square("h8"), Ok(H8));
        assert_eq!(parse_square("e4"), Ok(E4));
        assert!(parse_square("i1").is_err());
        assert!(parse_square("a9").is_err());
        assert!(parse_square("A1").is_err());
        assert!(parse_square("a").is_err());
        assert_eq!(square_notation(E4), "e4");
        assert_eq!(square_notation(A1), "a1");
        assert_eq!(square_notation(H8), "h8");
    }

    #[test]
    fn parse_uci_moves() {
        let m = parse_uci_move("e2e4").unwrap();
        assert_eq!(m.orig_square, E2);
        assert_eq!(m.dest_square, E4);
        assert_eq!(m.promotion_piece, None);
        let m = parse_uci_move("e7e8q").unwrap();
        assert_eq!(m.promotion_piece, Some(WQ));
        let m = parse_uci_move("f2f1n").unwrap();
        assert_eq!(m.promotion_piece, Some(BN));
        assert!(parse_uci_move("e2e4x").is_err());
        assert!(parse_uci_move("e2").is_err());
        assert!(parse_uci_move("e2e9").is_err());
    }

    #[test]
    fn parse_fen_strings() {
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").is_ok());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").is_err());
        assert!(parse_fen("nbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").is_err());
        assert!(parse_fen("rnbqkbnr1/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                    .is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBN b KQkq e3 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR/ b KQkq e3 0 1")
                    .is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPP01PPP/RNBQKBNR b KQkq e3 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPP91PPP/RNBQKBNR b KQkq e3 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPP*1PPP/RNBQKBNR b KQkq e3 0 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 * 1").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 *").is_err());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b - e3 0 1").is_ok());
        assert!(parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b Kkq e3 0 1").is_ok());
        assert!(parse_fen("k7/8/8/8/8/8/8/7K w - - 0 1").is_ok());
        assert!(parse_fen("k7/8/8/8/7P/8/8/7K w - h3 0 1").is_err());
        assert!(parse_fen("k7/8/8/7P/8/8/8/7K b - h4 0 1").is_err());
        assert!(parse_fen("8/8/8/6k1/7P/8/8/6RK b - h3 0 1").is_ok());
        assert!(parse_fen("8/8/8/6k1/7P/8/8/7K b - h3 0 0").is_err());
    }

    #[test]
    fn serialize_boards() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R";
        let (board, ..) = parse_fen(&format!("{} w KQkq - 0 1", fen)).unwrap();
        assert_eq!(board_to_fen(&board), fen);
        assert_eq!(castling_rights_to_fen(CastlingRights::all()), "KQkq");
        assert_eq!(castling_rights_to_fen(CastlingRights::none()), "-");
        let mut rights = CastlingRights::none();
        rights.grant(CASTLE_WHITE_KINGSIDE | CASTLE_BLACK_QUEENSIDE);
        assert_eq!(castling_rights_to_fen(rights), "Kq");
    }
}
