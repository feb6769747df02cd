//! Engine handle: a fixed worker pool and a shared transposition table.
//!
//! One handle spans one pipeline invocation. The harness issues exactly one
//! search at a time through a handle; internal parallelism (lazy-SMP style
//! helper workers sharing the table) is invisible to callers, which simply
//! block until the bounded-depth search completes. The pool and table are
//! released together when the handle is dropped.

use std::fmt;
use std::sync::Arc;
use std::thread;

use log::{debug, info};

use crate::board::{Board, Move};
use crate::search::{self, SearchLimits, Worker, MAX_DEPTH};
use crate::tt::TranspositionTable;

/// Opaque failure inside the search core. Treated as fatal by every
/// pipeline: a failed search indicates an algorithmic or resource problem
/// that a retry will not fix.
#[derive(Debug)]
pub enum EngineError {
    /// A search worker thread panicked.
    WorkerPanicked { worker: usize },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::WorkerPanicked { worker } => {
                write!(f, "search worker {worker} panicked")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Outcome of one bounded-depth search.
#[derive(Debug, Clone, Copy)]
pub struct SearchReport {
    /// Best move found, `None` only for mated/stalemated positions.
    pub best_move: Option<Move>,
    /// Expected reply, recovered from the shared table.
    pub ponder_move: Option<Move>,
    /// Score at the requested depth, centipawns, side-to-move relative.
    pub score: i32,
    /// Nodes searched, aggregated across all workers.
    pub nodes: u64,
}

/// Owner of the search resources: N workers and one shared table, both
/// fixed at creation for the handle's whole lifetime.
pub struct EngineHandle {
    tt: Arc<TranspositionTable>,
    workers: Vec<Worker>,
}

impl EngineHandle {
    /// Create a handle with `threads` workers and a `tt_mb` megabyte table.
    /// The table is initialized exactly once here; later searches only ever
    /// clear it.
    #[must_use]
    pub fn new(threads: usize, tt_mb: usize) -> Self {
        let threads = threads.max(1);
        let tt = Arc::new(TranspositionTable::new(tt_mb));
        let workers = (0..threads)
            .map(|_| Worker::new(Arc::clone(&tt)))
            .collect();
        info!("engine handle: {threads} worker(s), {tt_mb} MB table");
        EngineHandle { tt, workers }
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Clear the shared transposition table without reallocating it.
    pub fn clear_tt(&self) {
        self.tt.clear();
    }

    /// Clear per-search transient state (move-ordering history, killers,
    /// counters) in every worker. Pool size and configuration are untouched.
    pub fn reset_workers(&mut self) {
        for worker in &mut self.workers {
            worker.reset();
        }
    }

    /// Run one depth-bounded search, blocking until all workers finish.
    ///
    /// Worker 0 is the main worker and determines the best move and the
    /// reported score; odd-numbered helpers search one ply deeper to feed
    /// the shared table.
    pub fn search(
        &mut self,
        board: &Board,
        limits: &SearchLimits,
    ) -> Result<SearchReport, EngineError> {
        debug_assert!(limits.depth_limited, "harness searches are depth-bounded");
        let depth = limits.depth.clamp(1, MAX_DEPTH);

        for worker in &mut self.workers {
            worker.begin_search();
        }

        let mut results: Vec<Option<Move>> = Vec::with_capacity(self.workers.len());
        let mut panicked: Option<usize> = None;

        if self.workers.len() == 1 {
            let mut scratch = board.clone();
            results.push(search::search_to_depth(
                &mut scratch,
                &mut self.workers[0],
                depth,
            ));
        } else {
            thread::scope(|scope| {
                let mut handles = Vec::with_capacity(self.workers.len());
                for (id, worker) in self.workers.iter_mut().enumerate() {
                    let mut scratch = board.clone();
                    let worker_depth = helper_depth(depth, id);
                    handles.push(scope.spawn(move || {
                        search::search_to_depth(&mut scratch, worker, worker_depth)
                    }));
                }
                for (id, handle) in handles.into_iter().enumerate() {
                    match handle.join() {
                        Ok(best) => results.push(best),
                        Err(_) => {
                            results.push(None);
                            if panicked.is_none() {
                                panicked = Some(id);
                            }
                        }
                    }
                }
            });
        }

        if let Some(worker) = panicked {
            return Err(EngineError::WorkerPanicked { worker });
        }

        let nodes: u64 = self.workers.iter().map(|w| w.stats.nodes).sum();
        let best_move = results[0];
        let score = self.workers[0].stats.values[depth as usize];
        let ponder_move = best_move.and_then(|mv| self.extract_ponder(board, mv));

        debug!(
            "searched depth {depth}: {nodes} nodes in {} ms",
            limits.clock.elapsed_ms()
        );

        Ok(SearchReport {
            best_move,
            ponder_move,
            score,
            nodes,
        })
    }

    /// Static evaluation of a position, side-to-move relative.
    #[must_use]
    pub fn static_eval(&self, board: &Board) -> i32 {
        board.evaluate()
    }

    /// Full-window quiescence value of a position, run on worker 0.
    pub fn quiescence_eval(&mut self, board: &Board) -> i32 {
        let mut scratch = board.clone();
        search::qsearch(&mut scratch, &mut self.workers[0])
    }

    /// Expected opponent reply: make the best move and probe the table.
    fn extract_ponder(&self, board: &Board, best: Move) -> Option<Move> {
        let mut scratch = board.clone();
        scratch.make_move(best);
        let reply = self.tt.probe(scratch.hash()).and_then(|e| e.best_move())?;
        if scratch.generate_moves().contains(reply) {
            Some(reply)
        } else {
            None
        }
    }
}

fn helper_depth(depth: u32, worker_id: usize) -> u32 {
    // Odd helpers search one ply deeper to populate the shared table.
    if worker_id % 2 == 1 {
        (depth + 1).min(MAX_DEPTH)
    } else {
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_one_startpos() {
        let mut engine = EngineHandle::new(1, 1);
        let mut board = Board::startpos();
        let report = engine
            .search(&board, &SearchLimits::depth(1))
            .expect("search succeeds");
        assert!(report.nodes > 0);
        let best = report.best_move.expect("a best move exists");
        assert!(board.generate_moves().contains(best));
    }

    #[test]
    fn test_ponder_move_is_legal_reply() {
        let mut engine = EngineHandle::new(1, 2);
        let board = Board::startpos();
        let report = engine
            .search(&board, &SearchLimits::depth(4))
            .expect("search succeeds");
        let best = report.best_move.expect("a best move exists");
        if let Some(ponder) = report.ponder_move {
            let mut after = board.clone();
            after.make_move(best);
            assert!(after.generate_moves().contains(ponder));
        }
    }

    #[test]
    fn test_two_workers_report_aggregate_nodes() {
        let mut engine = EngineHandle::new(2, 2);
        let board = Board::startpos();
        let report = engine
            .search(&board, &SearchLimits::depth(3))
            .expect("search succeeds");
        assert!(report.best_move.is_some());
        assert!(report.nodes > 0);
    }

    #[test]
    fn test_mated_position_reports_no_move() {
        let mut engine = EngineHandle::new(1, 1);
        let board =
            Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let report = engine
            .search(&board, &SearchLimits::depth(2))
            .expect("search succeeds");
        assert!(report.best_move.is_none());
        assert!(report.ponder_move.is_none());
    }

    #[test]
    fn test_reset_workers_keeps_pool_size() {
        let mut engine = EngineHandle::new(3, 1);
        engine.reset_workers();
        assert_eq!(engine.worker_count(), 3);
    }
}
