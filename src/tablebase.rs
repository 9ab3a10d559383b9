//! Implements the endgame tablebase interface.
//!
//! Syzygy tablebases contain precomputed perfect play for positions
//! with few pieces. They split the information in two: *WDL*
//! (win/draw/loss under optimal play, compact and fast to probe) and
//! *DTZ* (distance to the next capture or pawn move, needed to win
//! within the 50-move rule). The search may consult WDL for cutoffs
//! deep in the tree, and DTZ at the root to pick the move that wins
//! fastest or resists longest.
//!
//! The engine talks to tablebases only through the `Tablebase`
//! trait. The backend shipped here is `NullTablebase`, which always
//! answers "no information" -- probing semantics are unchanged when
//! a real backend is plugged in, and positions outside the
//! tablebases behave identically either way.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use lazy_static::lazy_static;
use crate::board::*;
use crate::moves::{Move, MoveList};
use crate::position::Position;
use crate::value::*;

/// Global tablebase configuration, set through the UCI options.
pub struct TablebaseConfig;

static PROBE_DEPTH: AtomicU8 = AtomicU8::new(1);
static USE_50_MOVE_RULE: AtomicBool = AtomicBool::new(true);
static PROBE_LIMIT: AtomicU8 = AtomicU8::new(6);

lazy_static! {
    static ref PATH: Mutex<String> = Mutex::new(String::new());
}

impl TablebaseConfig {
    /// Sets the path to the tablebase files.
    pub fn set_path(path: &str) {
        *PATH.lock().unwrap() = path.to_string();
    }

    pub fn path() -> String {
        PATH.lock().unwrap().clone()
    }

    /// Sets the minimum remaining depth at which the search probes.
    pub fn set_probe_depth(depth: u8) {
        PROBE_DEPTH.store(depth, Ordering::Relaxed);
    }

    pub fn probe_depth() -> u8 {
        PROBE_DEPTH.load(Ordering::Relaxed)
    }

    /// Sets whether probing accounts for the 50-move rule.
    pub fn set_50_move_rule(enabled: bool) {
        USE_50_MOVE_RULE.store(enabled, Ordering::Relaxed);
    }

    pub fn use_50_move_rule() -> bool {
        USE_50_MOVE_RULE.load(Ordering::Relaxed)
    }

    /// Sets the maximum piece count for which probing is attempted.
    pub fn set_probe_limit(limit: u8) {
        PROBE_LIMIT.store(limit, Ordering::Relaxed);
    }

    pub fn probe_limit() -> u8 {
        PROBE_LIMIT.load(Ordering::Relaxed)
    }
}

/// Win/draw/loss from the perspective of the side to move.
///
/// The "cursed" and "blessed" variants mark positions whose
/// game-theoretic outcome is overturned by the 50-move rule: a
/// cursed win will be claimed as a draw, a blessed loss saved by
/// the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Wdl {
    Loss,
    BlessedLoss,
    Draw,
    CursedWin,
    Win,
}

impl Wdl {
    /// Returns the outcome from the opponent's perspective.
    pub fn negate(self) -> Wdl {
        match self {
            Wdl::Loss => Wdl::Win,
            Wdl::BlessedLoss => Wdl::CursedWin,
            Wdl::Draw => Wdl::Draw,
            Wdl::CursedWin => Wdl::BlessedLoss,
            Wdl::Win => Wdl::Loss,
        }
    }
}

/// Converts a WDL outcome to a centipawn value.
pub fn wdl_to_value(wdl: Wdl) -> Value {
    match wdl {
        Wdl::Win => VALUE_MAX,
        Wdl::CursedWin => 50,
        Wdl::Draw => VALUE_DRAW,
        Wdl::BlessedLoss => -50,
        Wdl::Loss => VALUE_MIN,
    }
}

/// A DTZ probe result: the outcome and the distance to the next
/// zeroing move (negative when losing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtzResult {
    pub wdl: Wdl,
    pub dtz: i16,
}

impl DtzResult {
    /// Returns the same result from the opponent's perspective.
    pub fn negate(self) -> DtzResult {
        DtzResult {
            wdl: self.wdl.negate(),
            dtz: -self.dtz,
        }
    }
}

/// A legal root move together with the tablebase verdict on the
/// position it leads to.
#[derive(Debug, Clone, Copy)]
pub struct RootMove {
    pub m: Move,
    pub dtz: DtzResult,
}

/// The probing interface the search talks to.
pub trait Tablebase {
    /// Points the backend at a directory of tablebase files.
    /// Returns whether any tablebases were found.
    fn init(&mut self, path: &str) -> bool;

    /// Returns whether probes can currently succeed.
    fn is_available(&self) -> bool;

    /// Returns the largest piece count the loaded tables cover.
    fn max_pieces(&self) -> u8;

    /// Probes the win/draw/loss outcome of a position.
    fn probe_wdl(&self, pos: &Position) -> Option<Wdl>;

    /// Probes the outcome and distance-to-zeroing of a position.
    fn probe_dtz(&self, pos: &Position) -> Option<DtzResult>;

    /// Probes every legal root move and returns them ranked best
    /// first.
    fn probe_root(&self, pos: &Position, legal_moves: &MoveList) -> Option<Vec<RootMove>>;
}

/// A backend with no tablebase files: every probe answers "no
/// information", which the search treats as "rely on your own
/// judgement".
pub struct NullTablebase;

impl Tablebase for NullTablebase {
    fn init(&mut self, _path: &str) -> bool {
        false
    }

    fn is_available(&self) -> bool {
        false
    }

    fn max_pieces(&self) -> u8 {
        0
    }

    fn probe_wdl(&self, _pos: &Position) -> Option<Wdl> {
        None
    }

    fn probe_dtz(&self, _pos: &Position) -> Option<DtzResult> {
        None
    }

    fn probe_root(&self, _pos: &Position, _legal_moves: &MoveList) -> Option<Vec<RootMove>> {
        None
    }
}

lazy_static! {
    static ref TABLEBASE: Mutex<Box<dyn Tablebase + Send>> = Mutex::new(Box::new(NullTablebase));
}

/// Re-initializes the global tablebase with a path.
pub fn init(path: &str) -> bool {
    TABLEBASE.lock().unwrap().init(path)
}

/// Replaces the global tablebase backend.
pub fn set_tablebase(tablebase: Box<dyn Tablebase + Send>) {
    *TABLEBASE.lock().unwrap() = tablebase;
}

/// Restores the default (null) backend.
pub fn reset_tablebase() {
    set_tablebase(Box::new(NullTablebase));
}

/// Probes the global tablebase for a WDL outcome.
pub fn probe_wdl(pos: &Position) -> Option<Wdl> {
    TABLEBASE.lock().unwrap().probe_wdl(pos)
}

/// Probes the global tablebase for a DTZ result.
pub fn probe_dtz(pos: &Position) -> Option<DtzResult> {
    TABLEBASE.lock().unwrap().probe_dtz(pos)
}

/// Probes the global tablebase at the root.
pub fn probe_root(pos: &Position, legal_moves: &MoveList) -> Option<Vec<RootMove>> {
    TABLEBASE.lock().unwrap().probe_root(pos, legal_moves)
}

/// Counts the pieces on the board.
pub fn count_pieces(pos: &Position) -> u8 {
    let mut count = 0;
    for &piece in ALL_PIECES.iter() {
        count += pos.board.piece_count(piece) as u8;
    }
    count
}

/// Returns whether a position can be found in the tablebases at
/// all: few enough pieces, and no castling rights (tablebases do not
/// cover castling).
pub fn is_probeable(pos: &Position) -> bool {
    pos.castling_rights == CastlingRights::none() &&
    count_pieces(pos) <= TablebaseConfig::probe_limit()
}

/// Returns whether the search should probe at a node with the given
/// remaining depth.
pub fn should_probe(pos: &Position, remaining_depth: u8) -> bool {
    is_probeable(pos) && remaining_depth >= TablebaseConfig::probe_depth()
}

/// Ranks probed root moves best first: wins before draws before
/// losses. Among wins the shortest distance to zeroing comes first
/// (the fastest win); among losses the longest distance comes last.
/// (Losing distances carry a negative sign, so both rules are a
/// descending sort on the raw value within the group.)
pub fn rank_root_moves(root_moves: &mut Vec<RootMove>) {
    root_moves.sort_by(|a, b| {
        b.dtz.wdl
            .cmp(&a.dtz.wdl)
            .then_with(|| match a.dtz.wdl {
                Wdl::Win | Wdl::CursedWin => a.dtz.dtz.cmp(&b.dtz.dtz),
                Wdl::Loss | Wdl::BlessedLoss => b.dtz.dtz.cmp(&a.dtz.dtz),
                Wdl::Draw => std::cmp::Ordering::Equal,
            })
    });
}
