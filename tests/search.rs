//! End-to-end search tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use lysander::position::move_generation::{generate_pseudo_legal, is_in_check};
use lysander::position::Position;
use lysander::search::tt::TranspositionTable;
use lysander::search::{search, search_to_depth, Limits, NullReporter};
use lysander::{opponent, VALUE_MATE_THRESHOLD, VALUE_MAX};

fn parse(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

fn pv_notation(result: &lysander::search::SearchResult) -> Vec<String> {
    result.pv.iter().map(|m| m.notation()).collect()
}

#[test]
fn startpos_depth_2() {
    let mut pos = Position::startpos();
    let result = search_to_depth(&mut pos, 2);
    assert_eq!(result.depth, 2);
    assert_eq!(result.value, 0);
    let pv = pv_notation(&result);
    assert!(!pv.is_empty());
    assert_eq!(pv[0], "e2e4");
}

#[test]
fn kiwipete_depth_3() {
    let mut pos = parse("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    let result = search_to_depth(&mut pos, 3);
    assert_eq!(result.depth, 3);
    assert_eq!(result.value, 50);
    let pv = pv_notation(&result);
    assert!(pv.len() >= 3);
    assert_eq!(&pv[..3], &["e2a6", "e6d5", "g2h3"]);
}

#[test]
fn finds_back_rank_mate() {
    let mut pos = parse("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1");
    let result = search_to_depth(&mut pos, 2);
    let pv = pv_notation(&result);
    assert!(!pv.is_empty());
    assert_eq!(pv[0], "e1e8");
    assert!(result.value > VALUE_MAX - 100);
}

#[test]
fn finds_scholars_mate() {
    let mut pos = parse("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
    let result = search_to_depth(&mut pos, 4);
    let pv = pv_notation(&result);
    assert!(!pv.is_empty());
    assert_eq!(pv[0], "h5f7");
    assert!(result.value > VALUE_MAX - 100);
}

#[test]
fn checkmated_side_reports_the_mate() {
    let mut pos = parse("5R1k/6pp/8/8/8/8/8/6K1 b - - 0 1");
    let result = search_to_depth(&mut pos, 1);
    assert!(result.value < -(VALUE_MAX - 100));
    assert!(result.pv.is_empty());
}

#[test]
fn punishes_fools_mate() {
    // After 1. f3 e5 2. g4 black has a mate in one.
    let mut pos = parse("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
    let result = search_to_depth(&mut pos, 2);
    let pv = pv_notation(&result);
    assert!(!pv.is_empty());
    assert_eq!(pv[0], "d8h4");
    assert!(result.value > VALUE_MATE_THRESHOLD);
}

#[test]
fn mate_distance_shortens_with_depth() {
    // Mate in one: every deeper iteration must keep reporting the
    // one-ply mate, never a longer one.
    let mut pos = parse("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1");
    let mut last_distance = u16::MAX;
    for depth in 2..=5 {
        let result = search_to_depth(&mut pos.clone(), depth);
        assert!(result.value >= VALUE_MATE_THRESHOLD);
        let distance = (VALUE_MAX - result.value) as u16;
        assert!(distance <= last_distance,
                "mate distance grew from {} to {} at depth {}",
                last_distance,
                distance,
                depth);
        last_distance = distance;
    }
    assert_eq!(last_distance, 1);
}

#[test]
fn fifty_move_rule_draws_the_search() {
    let mut pos = parse("8/8/8/8/8/3k4/8/R3K3 w - - 100 50");
    let result = search_to_depth(&mut pos, 3);
    assert!(result.value.abs() <= 50);
}

#[test]
fn avoids_stalemate_when_winning() {
    // Queen and king against bare king: f7f8 would be stalemate.
    let mut pos = parse("7k/5Q2/6K1/8/8/8/8/8 w - - 0 1");
    let result = search_to_depth(&mut pos, 4);
    let pv = pv_notation(&result);
    assert!(!pv.is_empty());
    assert_ne!(pv[0], "f7f8");
    assert!(result.value > 500);
}

#[test]
fn pv_moves_are_all_legal() {
    let mut pos = parse("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    let result = search_to_depth(&mut pos.clone(), 4);
    assert!(!result.pv.is_empty());
    for m in result.pv.iter() {
        let legal = generate_pseudo_legal(&pos).into_iter().any(|candidate| {
            if candidate != *m {
                return false;
            }
            pos.do_move(&candidate);
            let legal = !is_in_check(opponent(pos.to_move), &pos.board);
            pos.undo_move(&candidate);
            legal
        });
        assert!(legal, "PV move {} is not legal", m);
        pos.do_move(m);
    }
}

#[test]
fn respects_the_depth_limit() {
    let mut pos = Position::startpos();
    let result = search_to_depth(&mut pos, 3);
    assert_eq!(result.depth, 3);
}

#[test]
fn respects_the_node_limit() {
    let mut pos = Position::startpos();
    let mut tt = TranspositionTable::with_size_mb(1);
    let limits = Limits { nodes: Some(500), ..Default::default() };
    let result = search(&mut pos, &limits, &mut NullReporter, &mut tt, None);
    // The limit is only consulted every 256th node, and quiescence
    // bursts run between checks, so allow some overshoot.
    assert!(result.nodes <= 1_500, "searched {} nodes", result.nodes);
}

#[test]
fn stop_flag_halts_the_search() {
    let mut pos = Position::startpos();
    let mut tt = TranspositionTable::with_size_mb(16);
    let limits = Limits { depth: Some(100), ..Default::default() };
    let stop_flag = Arc::new(AtomicBool::new(false));

    let setter = {
        let stop_flag = stop_flag.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            stop_flag.store(true, Ordering::Relaxed);
        })
    };

    let result = search(&mut pos, &limits, &mut NullReporter, &mut tt, Some(stop_flag));
    setter.join().unwrap();

    assert!(result.depth < 100);
    assert!(!result.pv.is_empty());
}

#[test]
fn search_is_deterministic() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let first = search_to_depth(&mut parse(fen), 4);
    let second = search_to_depth(&mut parse(fen), 4);
    assert_eq!(first.depth, second.depth);
    assert_eq!(first.value, second.value);
    assert_eq!(pv_notation(&first), pv_notation(&second));
    assert_eq!(first.nodes, second.nodes);
}

#[test]
fn search_leaves_the_position_intact() {
    let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    let mut pos = parse(fen);
    let key_before = pos.key;
    search_to_depth(&mut pos, 3);
    assert_eq!(pos.to_fen(), fen);
    assert_eq!(pos.key, key_before);
}

#[test]
fn takes_a_hanging_queen() {
    let mut pos = parse("4k3/8/8/8/3q4/5N2/8/4K3 w - - 0 1");
    let result = search_to_depth(&mut pos, 2);
    let pv = pv_notation(&result);
    assert!(!pv.is_empty());
    assert_eq!(pv[0], "f3d4");
    assert!(result.value > 200);
}
