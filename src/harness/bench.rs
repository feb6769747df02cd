//! Benchmark pipeline: fixed-depth searches over a position suite with
//! aggregated node and timing statistics.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::board::{Board, Move};
use crate::engine::EngineHandle;
use crate::search::{SearchClock, SearchLimits};

use super::error::HarnessError;
use super::suite::BenchSuite;
use super::{handle_parse_failure, ParseErrorPolicy};

/// Benchmark configuration. Defaults mirror the command-line defaults.
#[derive(Clone, Debug)]
pub struct BenchConfig {
    pub depth: u32,
    pub threads: usize,
    pub hash_mb: usize,
    pub on_parse_error: ParseErrorPolicy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            depth: 13,
            threads: 1,
            hash_mb: 16,
            on_parse_error: ParseErrorPolicy::Abort,
        }
    }
}

/// Per-position benchmark result. Created once, never mutated afterwards.
#[derive(Clone, Copy, Debug)]
pub struct BenchmarkRecord {
    /// 1-based position index
    pub index: usize,
    /// Score at the requested depth, centipawns
    pub score: i32,
    pub best_move: Option<Move>,
    pub ponder_move: Option<Move>,
    pub elapsed_ms: u64,
    pub nodes: u64,
}

/// Aggregate results of one benchmark run.
#[derive(Clone, Debug)]
pub struct BenchSummary {
    pub records: Vec<BenchmarkRecord>,
    pub total_nodes: u64,
    pub elapsed_ms: u64,
}

impl BenchSummary {
    /// Overall nodes per second, guarded against zero elapsed time.
    #[must_use]
    pub fn nps(&self) -> u64 {
        nps(self.total_nodes, self.elapsed_ms)
    }
}

/// Nodes per second with the +1 denominator guard: a search that completes
/// within the timer resolution must not divide by zero.
fn nps(nodes: u64, elapsed_ms: u64) -> u64 {
    1000 * nodes / (elapsed_ms + 1)
}

fn format_move(mv: Option<Move>) -> String {
    mv.map_or_else(|| "0000".to_string(), |m| m.to_string())
}

/// Run the benchmark over `suite`, printing the per-position report and the
/// aggregate line to `out`.
///
/// The transposition table is initialized once for the whole run and cleared
/// (not resized) between positions, so node counts are reproducible across
/// runs; leftover entries would make later positions artificially fast.
pub fn run_benchmark(
    suite: &BenchSuite,
    config: &BenchConfig,
    out: &mut impl Write,
) -> Result<BenchSummary, HarnessError> {
    let mut engine = EngineHandle::new(config.threads, config.hash_mb);
    let clock = Arc::new(SearchClock::new());
    let limits = SearchLimits {
        multi_pv: 1,
        depth_limited: true,
        depth: config.depth,
        clock: Arc::clone(&clock),
    };

    info!(
        "benchmark: {} position(s), depth {}, {} thread(s), {} MB",
        suite.len(),
        config.depth,
        config.threads,
        config.hash_mb
    );

    let run_start = Instant::now();
    let mut records = Vec::with_capacity(suite.len());

    for (idx, fen) in suite.iter().enumerate() {
        let board = match Board::try_from_fen(fen) {
            Ok(board) => board,
            Err(err) => {
                handle_parse_failure(config.on_parse_error, idx + 1, &err.to_string())?;
                continue;
            }
        };

        clock.restart();
        let report = engine.search(&board, &limits)?;
        records.push(BenchmarkRecord {
            index: idx + 1,
            score: report.score,
            best_move: report.best_move,
            ponder_move: report.ponder_move,
            elapsed_ms: clock.elapsed_ms(),
            nodes: report.nodes,
        });

        engine.clear_tt();
    }

    let rule = "=".repeat(81);
    writeln!(out)?;
    writeln!(out, "{rule}")?;
    for record in &records {
        writeln!(
            out,
            "Bench [# {:>2}] {:>5} cp  Best:{:>6}  Ponder:{:>6} {:>12} nodes {:>8} nps",
            record.index,
            record.score,
            format_move(record.best_move),
            format_move(record.ponder_move),
            record.nodes,
            nps(record.nodes, record.elapsed_ms),
        )?;
    }
    writeln!(out, "{rule}")?;

    let total_nodes: u64 = records.iter().map(|r| r.nodes).sum();
    let elapsed_ms = run_start.elapsed().as_millis() as u64;
    writeln!(
        out,
        "OVERALL: {:>53} nodes {:>8} nps",
        total_nodes,
        nps(total_nodes, elapsed_ms),
    )?;

    Ok(BenchSummary {
        records,
        total_nodes,
        elapsed_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_config(depth: u32) -> BenchConfig {
        BenchConfig {
            depth,
            threads: 1,
            hash_mb: 1,
            on_parse_error: ParseErrorPolicy::Abort,
        }
    }

    #[test]
    fn test_empty_suite_prints_zero_aggregate() {
        let suite = BenchSuite::parse("");
        let mut out = Vec::new();
        let summary = run_benchmark(&suite, &tiny_config(2), &mut out).unwrap();
        assert_eq!(summary.total_nodes, 0);
        assert_eq!(summary.nps(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("OVERALL:"));
        assert!(!text.contains("Bench [#"));
    }

    #[test]
    fn test_records_one_per_position() {
        let suite = BenchSuite::parse(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1\n\
             8/8/8/4k3/8/8/3Q4/4K3 w - - 0 1\n",
        );
        let mut out = Vec::new();
        let summary = run_benchmark(&suite, &tiny_config(2), &mut out).unwrap();
        assert_eq!(summary.records.len(), 2);
        assert!(summary.records.iter().all(|r| r.nodes > 0));
        assert_eq!(summary.records[0].index, 1);
        assert_eq!(summary.records[1].index, 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Bench [#  1]"));
        assert!(text.contains("Bench [#  2]"));
        assert!(text.contains("OVERALL:"));
    }

    #[test]
    fn test_deterministic_node_counts() {
        let suite = BenchSuite::parse(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3\n\
             rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2\n",
        );
        let mut first_out = Vec::new();
        let first = run_benchmark(&suite, &tiny_config(4), &mut first_out).unwrap();
        let mut second_out = Vec::new();
        let second = run_benchmark(&suite, &tiny_config(4), &mut second_out).unwrap();

        let first_nodes: Vec<u64> = first.records.iter().map(|r| r.nodes).collect();
        let second_nodes: Vec<u64> = second.records.iter().map(|r| r.nodes).collect();
        assert_eq!(first_nodes, second_nodes);
    }

    #[test]
    fn test_bad_fen_aborts_with_line_number() {
        let suite = BenchSuite::parse("not a position\n");
        let mut out = Vec::new();
        let err = run_benchmark(&suite, &tiny_config(2), &mut out).unwrap_err();
        assert!(matches!(err, HarnessError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_bad_fen_skipped_under_skip_policy() {
        let suite = BenchSuite::parse(
            "not a position\n\
             rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1\n",
        );
        let mut config = tiny_config(2);
        config.on_parse_error = ParseErrorPolicy::Skip;
        let mut out = Vec::new();
        let summary = run_benchmark(&suite, &config, &mut out).unwrap();
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].index, 2);
    }
}
