//! Search behavior tests against known positions.

use std::sync::Arc;

use bookforge::search::{qsearch, search_to_depth, Worker};
use bookforge::{Board, EngineHandle, SearchLimits, TranspositionTable};

fn fresh_worker(mb: usize) -> Worker {
    Worker::new(Arc::new(TranspositionTable::new(mb)))
}

/// Depth 1 from the start position: some nodes searched, and the chosen
/// move is one of the twenty legal openers.
#[test]
fn depth_one_start_position() {
    let mut board = Board::startpos();
    let mut worker = fresh_worker(1);
    let best = search_to_depth(&mut board, &mut worker, 1).expect("should find a move");

    assert!(worker.stats.nodes > 0, "should search at least one node");
    let legal = board.generate_moves();
    assert_eq!(legal.len(), 20);
    assert!(legal.contains(best), "best move must be legal");
}

/// The engine finds a back-rank mate in one.
#[test]
fn finds_mate_in_one_back_rank() {
    let mut board = Board::from_fen("6k1/5ppp/8/8/8/8/8/4Q2K w - - 0 1");
    let mut worker = fresh_worker(16);
    let best = search_to_depth(&mut board, &mut worker, 4).expect("should find a move");
    assert_eq!(best.to_string(), "e1e8", "should find Qe8# (back rank mate)");
}

/// The engine takes a cleanly hanging queen.
#[test]
fn captures_free_queen() {
    let mut board = Board::from_fen("3q3k/8/8/8/8/8/8/3R3K w - - 0 1");
    let mut worker = fresh_worker(16);
    let best = search_to_depth(&mut board, &mut worker, 4).expect("should find a move");
    assert_eq!(best.to_string(), "d1d8", "should capture the hanging queen");
}

/// Quiescence agrees with the static evaluation in a position without
/// tactics, and disagrees when a capture wins material.
#[test]
fn quiescence_matches_eval_only_when_quiet() {
    let mut quiet = Board::startpos();
    let mut worker = fresh_worker(1);
    assert_eq!(qsearch(&mut quiet, &mut worker), quiet.evaluate());

    let mut noisy = Board::from_fen("4k3/7p/8/3r4/8/8/1PP5/3QK3 w - - 0 1");
    assert!(qsearch(&mut noisy, &mut worker) > noisy.evaluate());
}

/// Two searches of the same suite position through fresh handles give
/// identical node counts.
#[test]
fn engine_handle_is_deterministic() {
    let fen = "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";

    let run = || {
        let mut engine = EngineHandle::new(1, 4);
        let board = Board::from_fen(fen);
        let report = engine
            .search(&board, &SearchLimits::depth(4))
            .expect("search succeeds");
        (report.nodes, report.best_move.map(|m| m.to_string()))
    };

    assert_eq!(run(), run());
}

/// A handle survives repeated searches with table clears in between, the
/// pattern every pipeline uses.
#[test]
fn repeated_searches_through_one_handle() {
    let mut engine = EngineHandle::new(1, 2);
    let limits = SearchLimits::depth(3);

    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3",
        "8/8/8/4k3/8/8/3Q4/4K3 w - - 0 1",
    ] {
        let board = Board::from_fen(fen);
        let report = engine.search(&board, &limits).expect("search succeeds");
        assert!(report.nodes > 0);
        engine.reset_workers();
        engine.clear_tt();
    }
}
