//! Implements the search: iterative deepening over an alpha-beta
//! core.
//!
//! `search` deepens from depth 1 until the depth ceiling or the
//! first limit is hit, publishing one progress report per completed
//! depth. From depth 4 onwards each iteration opens with a narrow
//! *aspiration window* around the previous score -- when the guess
//! holds, the tighter bounds prune much harder; when it fails, the
//! window is widened and the iteration retried.
//!
//! Cancellation is cooperative: the stopper trips on an external
//! atomic flag, or on the time and node limits (checked every 256th
//! node), and every open alpha-beta frame unwinds without publishing
//! a new best. The result of the last fully completed depth stands.

pub mod tt;
pub mod alpha_beta;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use log::debug;
use crate::depth::{Depth, DEPTH_MAX};
use crate::moves::MoveList;
use crate::position::Position;
use crate::value::*;
use self::alpha_beta::{alphabeta, KillerTable};
use self::tt::TranspositionTable;

// Aspiration window tuning. Below the minimum depth the previous
// score is too unstable to aspire to.
const ASPIRATION_MIN_DEPTH: Depth = 4;
const ASPIRATION_INITIAL_DELTA: Value = 25;
const ASPIRATION_EXPANSION_FACTOR: Value = 2;
const ASPIRATION_MAX_RETRIES: u8 = 3;

// Time and node limits are only consulted when the node counter has
// these bits clear; the external stop flag is consulted every time.
const STOPPER_NODES_MASK: u64 = 0xff;

/// The limits under which a search runs.
///
/// All fields are optional; a search without limits runs until the
/// maximum depth or an external stop.
#[derive(Debug, Clone, Default)]
pub struct Limits {
    pub depth: Option<Depth>,
    pub nodes: Option<u64>,
    pub time: Option<Duration>,
}

/// A progress report from an ongoing search.
#[derive(Debug, Clone)]
pub struct Report {
    pub depth: Depth,
    pub ply: u8,
    pub nodes: u64,
    pub pv: Option<(MoveList, Value)>,
    pub tt_usage: usize,
    pub tt_capacity: usize,
    pub started_at: Instant,
}

impl Report {
    /// Creates an empty report, stamped with the current time.
    pub fn new() -> Report {
        Report {
            depth: 0,
            ply: 0,
            nodes: 0,
            pv: None,
            tt_usage: 0,
            tt_capacity: 0,
            started_at: Instant::now(),
        }
    }

    /// Returns the time elapsed since the search started.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the number of plies until the forced mate, when the
    /// reported value encodes one.
    pub fn plies_until_mate(&self) -> Option<u8> {
        let (_, value) = self.pv.as_ref()?;
        let distance = VALUE_MAX - value.abs();
        if value.abs() >= VALUE_MATE_THRESHOLD && distance >= 0 {
            Some(distance as u8)
        } else {
            None
        }
    }
}

impl Default for Report {
    fn default() -> Report {
        Report::new()
    }
}

/// A sink for search progress reports.
pub trait Reporter {
    fn send(&mut self, report: &Report);
}

/// A reporter that swallows everything. Useful for non-interactive
/// searches and tests.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn send(&mut self, _report: &Report) {}
}

/// Decides when a running search must wind down.
///
/// The external stop flag is obeyed immediately on every check; the
/// time and node limits are only consulted every 256th node, because
/// reading the clock on every node costs more than the node itself.
pub struct Stopper {
    stop_flag: Option<Arc<AtomicBool>>,
    elapsed: Option<Duration>,
    nodes: Option<u64>,
}

impl Stopper {
    /// Creates a stopper driven by an optional external flag.
    pub fn new(stop_flag: Option<Arc<AtomicBool>>) -> Stopper {
        Stopper {
            stop_flag: stop_flag,
            elapsed: None,
            nodes: None,
        }
    }

    /// Limits the wall-clock time of the search.
    pub fn at_elapsed(&mut self, elapsed: Option<Duration>) {
        self.elapsed = elapsed;
    }

    /// Limits the number of searched nodes.
    pub fn at_nodes(&mut self, nodes: Option<u64>) {
        self.nodes = nodes;
    }

    /// Returns whether the search should stop now.
    pub fn should_stop(&self, report: &Report) -> bool {
        if let Some(ref flag) = self.stop_flag {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        if report.nodes & STOPPER_NODES_MASK != 0 {
            return false;
        }
        if let Some(elapsed) = self.elapsed {
            if report.elapsed() > elapsed {
                return true;
            }
        }
        if let Some(nodes) = self.nodes {
            if report.nodes > nodes {
                return true;
            }
        }
        false
    }
}

/// The outcome of a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The last fully completed depth.
    pub depth: Depth,
    /// The value of the position at that depth.
    pub value: Value,
    /// The principal variation at that depth.
    pub pv: MoveList,
    /// The total number of nodes searched.
    pub nodes: u64,
    /// The transposition table fill level, in permille.
    pub hashfull: u32,
}

/// Walks a principal variation and truncates it at the first draw.
///
/// The alpha-beta scores are blind to what happens *after* the
/// horizon, but a PV whose prefix already repeats or runs the
/// 50-move clock out is a draw no matter what the leaf evaluation
/// says.
fn sanitize_pv(pos: &Position, pv: MoveList, value: Value) -> (MoveList, Value) {
    let mut probe = pos.clone();
    for (i, m) in pv.iter().enumerate() {
        probe.do_move(m);
        if probe.is_fifty_move_draw() || probe.is_repetition_draw(0) {
            return (pv[..i + 1].to_vec(), VALUE_DRAW);
        }
    }
    (pv, value)
}

/// Searches a position under the given limits.
///
/// The position is borrowed mutably for make/unmake during the
/// search, and is restored to its exact original state before the
/// function returns.
pub fn search(pos: &mut Position,
              limits: &Limits,
              reporter: &mut dyn Reporter,
              tt: &mut TranspositionTable,
              stop_flag: Option<Arc<AtomicBool>>)
              -> SearchResult {
    debug!("search: depth={:?} nodes={:?} time={:?}",
           limits.depth,
           limits.nodes,
           limits.time);

    let mut stopper = Stopper::new(stop_flag);
    stopper.at_elapsed(limits.time);
    stopper.at_nodes(limits.nodes);

    let mut killers = KillerTable::new();
    let mut report = Report::new();

    let max_depth = limits.depth.unwrap_or(DEPTH_MAX);
    let mut last_value: Value = 0;
    let mut best_pv = MoveList::new();
    let mut best_depth = 0;

    for depth in 1..=max_depth {
        let mut pv = MoveList::new();

        let aspiring = depth >= ASPIRATION_MIN_DEPTH && last_value.abs() < VALUE_MATE_THRESHOLD;
        let mut delta_low = ASPIRATION_INITIAL_DELTA;
        let mut delta_high = ASPIRATION_INITIAL_DELTA;
        let mut alpha = if aspiring {
            VALUE_MIN.max(last_value - delta_low)
        } else {
            VALUE_MIN
        };
        let mut beta = if aspiring {
            VALUE_MAX.min(last_value + delta_high)
        } else {
            VALUE_MAX
        };
        let mut full_window = !aspiring;
        let mut retries = 0;

        let value = loop {
            let value = alphabeta(pos,
                                  depth,
                                  alpha,
                                  beta,
                                  &mut pv,
                                  tt,
                                  &mut killers,
                                  &mut report,
                                  &stopper);

            // Accept the result if it landed strictly inside the
            // window, if the search was stopped, or if the window
            // can not be widened any further.
            if (value > alpha && value < beta) || stopper.should_stop(&report) || full_window {
                break value;
            }

            retries += 1;
            if retries > ASPIRATION_MAX_RETRIES {
                alpha = VALUE_MIN;
                beta = VALUE_MAX;
                full_window = true;
                continue;
            }

            if value <= alpha {
                delta_low *= ASPIRATION_EXPANSION_FACTOR;
                alpha = VALUE_MIN.max(last_value - delta_low);
            } else if value >= beta {
                delta_high *= ASPIRATION_EXPANSION_FACTOR;
                beta = VALUE_MAX.min(last_value + delta_high);
            }
        };

        if stopper.should_stop(&report) {
            break;
        }

        let (pv, value) = sanitize_pv(pos, pv, value);
        last_value = value;
        best_pv = pv.clone();
        best_depth = depth;

        report.depth = depth;
        report.pv = Some((pv, value));
        report.tt_usage = tt.usage();
        report.tt_capacity = tt.capacity();
        reporter.send(&report);
    }

    SearchResult {
        depth: best_depth,
        value: last_value,
        pv: best_pv,
        nodes: report.nodes,
        hashfull: if report.nodes == 0 || tt.capacity() == 0 {
            0
        } else {
            (tt.usage() * 1000 / tt.capacity()) as u32
        },
    }
}

/// Searches a position to a fixed depth with a fresh transposition
/// table and no reporting.
pub fn search_to_depth(pos: &mut Position, depth: Depth) -> SearchResult {
    let mut tt = TranspositionTable::new();
    let limits = Limits { depth: Some(depth), ..Default::default() };
    search(pos, &limits, &mut NullReporter, &mut tt, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_report_distances() {
        let mut report = Report::new();
        assert_eq!(report.plies_until_mate(), None);
        report.pv = Some((MoveList::new(), 120));
        assert_eq!(report.plies_until_mate(), None);
        report.pv = Some((MoveList::new(), VALUE_MAX - 3));
        assert_eq!(report.plies_until_mate(), Some(3));
        report.pv = Some((MoveList::new(), -(VALUE_MAX - 5)));
        assert_eq!(report.plies_until_mate(), Some(5));
    }

    #[test]
    fn stopper_obeys_the_flag_immediately() {
        let flag = Arc::new(AtomicBool::new(false));
        let stopper = Stopper::new(Some(flag.clone()));
        let mut report = Report::new();
        report.nodes = 1;
        assert!(!stopper.should_stop(&report));
        flag.store(true, Ordering::Relaxed);
        assert!(stopper.should_stop(&report));
    }

    #[test]
    fn stopper_amortizes_limit_checks() {
        let mut stopper = Stopper::new(None);
        stopper.at_nodes(Some(10));
        let mut report = Report::new();
        // Over the limit, but not at a check boundary.
        report.nodes = 0x101;
        assert!(!stopper.should_stop(&report));
        // At the boundary the limit bites.
        report.nodes = 0x100;
        assert!(stopper.should_stop(&report));
    }

    #[test]
    fn sanitized_pv_reports_draws() {
        use crate::board::*;
        use crate::squares::*;
        let quiet = |piece, orig_square, dest_square| {
            crate::moves::Move {
                piece: piece,
                orig_square: orig_square,
                dest_square: dest_square,
                captured_piece: None,
                promotion_piece: None,
                is_enpassant: false,
            }
        };
        // A position one reversible cycle away from threefold
        // repetition.
        let mut pos = Position::startpos();
        let cycle = [quiet(WN, G1, F3),
                     quiet(BN, G8, F6),
                     quiet(WN, F3, G1),
                     quiet(BN, F6, G8)];
        for m in cycle.iter().chain(cycle.iter().take(3)) {
            pos.do_move(m);
        }
        // One more knight retreat completes the third occurrence.
        let pv = vec![quiet(BN, F6, G8)];
        let (sanitized, value) = sanitize_pv(&pos, pv.clone(), 35);
        assert_eq!(sanitized, pv);
        assert_eq!(value, VALUE_DRAW);
        // A quiet PV in a fresh position is left alone.
        let pos = Position::startpos();
        let pv = vec![quiet(WP, E2, E4)];
        let (sanitized, value) = sanitize_pv(&pos, pv.clone(), 35);
        assert_eq!(sanitized, pv);
        assert_eq!(value, 35);
    }
}
