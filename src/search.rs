//! Depth-bounded alpha-beta search with quiescence.
//!
//! The harness only ever runs fixed-depth searches: depth is the sole
//! termination bound, there is no time management and no cancellation.
//! Everything here is deterministic for a fixed position, depth, and
//! transposition-table size, which the benchmark pipeline relies on.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::board::{Board, Move, MoveList, Piece, ScoredMoveList, MAX_PLY};
use crate::tt::{BoundType, TranspositionTable};

/// Hard ceiling on search depth.
pub const MAX_DEPTH: u32 = 64;

pub(crate) const MATE: i32 = 32000;
pub(crate) const INFINITY: i32 = 32500;
const MATE_THRESHOLD: i32 = MATE - MAX_PLY as i32;
const MAX_QSEARCH_DEPTH: i32 = 32;

/// Wall clock shared between the harness and the workers of one search.
pub struct SearchClock {
    start: Mutex<Instant>,
}

impl SearchClock {
    #[must_use]
    pub fn new() -> Self {
        SearchClock {
            start: Mutex::new(Instant::now()),
        }
    }

    /// Mark the start of a new search.
    pub fn restart(&self) {
        *self.start.lock() = Instant::now();
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.start.lock().elapsed().as_millis() as u64
    }
}

impl Default for SearchClock {
    fn default() -> Self {
        SearchClock::new()
    }
}

/// Limits for one bounded search. Fixed per pipeline invocation.
pub struct SearchLimits {
    /// Number of principal variations requested. Only 1 is supported.
    pub multi_pv: u32,
    /// Always true for this harness; kept explicit in the search contract.
    pub depth_limited: bool,
    /// The sole termination bound.
    pub depth: u32,
    /// Shared wall clock, restarted by the caller before each search.
    pub clock: Arc<SearchClock>,
}

impl SearchLimits {
    /// Depth-bounded limits with a fresh clock.
    #[must_use]
    pub fn depth(depth: u32) -> Self {
        SearchLimits {
            multi_pv: 1,
            depth_limited: true,
            depth,
            clock: Arc::new(SearchClock::new()),
        }
    }
}

/// Statistics of one worker's current search.
pub struct SearchStats {
    /// Nodes visited (make_move count, main search and quiescence).
    pub nodes: u64,
    /// Score of each completed iteration, indexed by depth.
    pub values: [i32; (MAX_DEPTH + 1) as usize],
}

impl SearchStats {
    fn new() -> Self {
        SearchStats {
            nodes: 0,
            values: [0; (MAX_DEPTH + 1) as usize],
        }
    }

    fn reset(&mut self) {
        self.nodes = 0;
        self.values = [0; (MAX_DEPTH + 1) as usize];
    }
}

pub(crate) struct KillerTable {
    slots: [[Move; 2]; MAX_PLY],
}

impl KillerTable {
    fn new() -> Self {
        KillerTable {
            slots: [[Move::null(); 2]; MAX_PLY],
        }
    }

    fn primary(&self, ply: usize) -> Move {
        self.slots.get(ply).map_or(Move::null(), |row| row[0])
    }

    fn secondary(&self, ply: usize) -> Move {
        self.slots.get(ply).map_or(Move::null(), |row| row[1])
    }

    fn update(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        if self.slots[ply][0] != mv {
            self.slots[ply][1] = self.slots[ply][0];
            self.slots[ply][0] = mv;
        }
    }

    fn reset(&mut self) {
        self.slots = [[Move::null(); 2]; MAX_PLY];
    }
}

pub(crate) struct HistoryTable {
    entries: [i32; 4096],
}

impl HistoryTable {
    fn new() -> Self {
        HistoryTable { entries: [0; 4096] }
    }

    fn score(&self, mv: Move) -> i32 {
        self.entries[mv.from().index() * 64 + mv.to().index()]
    }

    /// Reward a quiet move that caused a beta cutoff.
    fn update(&mut self, mv: Move, depth: u32) {
        let entry = &mut self.entries[mv.from().index() * 64 + mv.to().index()];
        *entry = entry.saturating_add((depth * depth) as i32);
    }

    fn reset(&mut self) {
        self.entries = [0; 4096];
    }
}

/// One search worker: per-thread move-ordering state plus a handle to the
/// shared transposition table.
pub struct Worker {
    pub stats: SearchStats,
    tt: Arc<TranspositionTable>,
    killers: KillerTable,
    history: HistoryTable,
}

impl Worker {
    #[must_use]
    pub fn new(tt: Arc<TranspositionTable>) -> Self {
        Worker {
            stats: SearchStats::new(),
            tt,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
        }
    }

    /// Zero the per-search counters. Called before every search.
    pub(crate) fn begin_search(&mut self) {
        self.stats.reset();
    }

    /// Drop all transient state accumulated by prior searches
    /// (move-ordering history, killer slots, statistics). Does not touch
    /// the shared transposition table.
    pub fn reset(&mut self) {
        self.stats.reset();
        self.killers.reset();
        self.history.reset();
    }
}

/// Run iterative deepening to exactly `depth`, recording each iteration's
/// score in the worker's stats. Returns the best root move.
pub fn search_to_depth(board: &mut Board, worker: &mut Worker, depth: u32) -> Option<Move> {
    let depth = depth.clamp(1, MAX_DEPTH);
    let mut ctx = Ctx { board, worker };
    let mut best = None;
    for d in 1..=depth {
        let (score, mv) = ctx.root(d as i32);
        ctx.worker.stats.values[d as usize] = score;
        if mv.is_some() {
            best = mv;
        }
    }
    best
}

/// Full-window quiescence value of a position. This is the tactical probe
/// used by the quiet-position filter: it equals the static evaluation
/// exactly when no capture sequence improves on standing pat.
pub fn qsearch(board: &mut Board, worker: &mut Worker) -> i32 {
    let mut ctx = Ctx { board, worker };
    ctx.quiesce(-INFINITY, INFINITY, 0)
}

fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

struct Ctx<'a> {
    board: &'a mut Board,
    worker: &'a mut Worker,
}

impl Ctx<'_> {
    fn root(&mut self, depth: i32) -> (i32, Option<Move>) {
        let moves = self.board.generate_moves();
        if moves.is_empty() {
            let score = if self.board.in_check(self.board.side_to_move()) {
                -MATE
            } else {
                0
            };
            return (score, None);
        }

        let tt_move = self
            .worker
            .tt
            .probe(self.board.hash())
            .and_then(|e| e.best_move());
        let ordered = self.order(&moves, tt_move, 0);

        let mut alpha = -INFINITY;
        let mut best_move = None;
        for mv in ordered.moves() {
            self.worker.stats.nodes += 1;
            let info = self.board.make_move(mv);
            let score = -self.alphabeta(depth - 1, 1, -INFINITY, -alpha, true);
            self.board.unmake_move(mv, info);
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
            }
        }

        self.worker.tt.store(
            self.board.hash(),
            depth as u32,
            score_to_tt(alpha, 0),
            BoundType::Exact,
            best_move,
        );
        (alpha, best_move)
    }

    fn alphabeta(
        &mut self,
        depth: i32,
        ply: i32,
        mut alpha: i32,
        beta: i32,
        allow_null: bool,
    ) -> i32 {
        if depth <= 0 {
            return self.quiesce(alpha, beta, 0);
        }
        if self.board.halfmove_clock() >= 100 {
            return 0;
        }

        let us = self.board.side_to_move();
        let in_check = self.board.in_check(us);
        let hash = self.board.hash();

        let mut tt_move = None;
        if let Some(entry) = self.worker.tt.probe(hash) {
            tt_move = entry.best_move();
            if entry.depth() as i32 >= depth {
                let score = score_from_tt(entry.score(), ply);
                match entry.bound() {
                    BoundType::Exact => return score,
                    BoundType::Lower if score >= beta => return score,
                    BoundType::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        if allow_null && !in_check && depth >= 3 && self.board.has_non_pawn_material(us) {
            let info = self.board.make_null();
            let score = -self.alphabeta(depth - 3, ply + 1, -beta, -beta + 1, false);
            self.board.unmake_null(info);
            if score >= beta {
                return beta;
            }
        }

        let moves = self.board.generate_moves();
        if moves.is_empty() {
            return if in_check { ply - MATE } else { 0 };
        }

        let ordered = self.order(&moves, tt_move, ply as usize);
        let original_alpha = alpha;
        let mut best_score = -INFINITY;
        let mut best_move = None;

        for mv in ordered.moves() {
            self.worker.stats.nodes += 1;
            let info = self.board.make_move(mv);
            let score = -self.alphabeta(depth - 1, ply + 1, -beta, -alpha, true);
            self.board.unmake_move(mv, info);

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                if !mv.is_capture() {
                    self.worker.killers.update(ply as usize, mv);
                    self.worker.history.update(mv, depth as u32);
                }
                break;
            }
        }

        let bound = if best_score <= original_alpha {
            BoundType::Upper
        } else if best_score >= beta {
            BoundType::Lower
        } else {
            BoundType::Exact
        };
        self.worker.tt.store(
            hash,
            depth as u32,
            score_to_tt(best_score, ply),
            bound,
            best_move,
        );
        best_score
    }

    fn quiesce(&mut self, mut alpha: i32, beta: i32, qdepth: i32) -> i32 {
        let stand_pat = self.board.evaluate();
        if qdepth >= MAX_QSEARCH_DEPTH {
            return stand_pat;
        }

        let in_check = self.board.in_check(self.board.side_to_move());
        let moves = if in_check {
            let evasions = self.board.generate_moves();
            if evasions.is_empty() {
                return qdepth - MATE;
            }
            evasions
        } else {
            if stand_pat >= beta {
                return stand_pat;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            self.board.generate_tactical_moves()
        };

        let mut best = if in_check { -INFINITY } else { stand_pat };

        let mut sorted = ScoredMoveList::new();
        for &mv in &moves {
            sorted.push(mv, self.capture_score(mv));
        }
        sorted.sort_by_score_desc();

        for mv in sorted.moves() {
            self.worker.stats.nodes += 1;
            let info = self.board.make_move(mv);
            let score = -self.quiesce(-beta, -alpha, qdepth + 1);
            self.board.unmake_move(mv, info);

            if score > best {
                best = score;
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                break;
            }
        }

        best
    }

    fn order(&self, moves: &MoveList, tt_move: Option<Move>, ply: usize) -> ScoredMoveList {
        let mut scored = ScoredMoveList::new();
        for &mv in moves {
            let score = if Some(mv) == tt_move {
                1_000_000
            } else if mv.is_capture() {
                100_000 + self.capture_score(mv)
            } else if mv.is_promotion() {
                90_000
            } else if self.worker.killers.primary(ply) == mv {
                80_000
            } else if self.worker.killers.secondary(ply) == mv {
                79_000
            } else {
                self.worker.history.score(mv)
            };
            scored.push(mv, score);
        }
        scored.sort_by_score_desc();
        scored
    }

    /// MVV-LVA capture ordering score.
    fn capture_score(&self, mv: Move) -> i32 {
        if !mv.is_capture() {
            return if mv.is_promotion() { 850 } else { 0 };
        }
        let victim = if mv.is_en_passant() {
            Piece::Pawn
        } else {
            self.board
                .piece_at(mv.to())
                .map_or(Piece::Pawn, |(_, piece)| piece)
        };
        let attacker = self
            .board
            .piece_at(mv.from())
            .map_or(Piece::Pawn, |(_, piece)| piece);
        victim.value() * 10 - attacker.value()
    }
}
