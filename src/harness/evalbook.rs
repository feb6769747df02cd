//! Bulk evaluation pipeline: bounded-depth search over every line of a
//! position book, echoing each line with per-run timing.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::board::Board;
use crate::engine::EngineHandle;
use crate::search::{SearchClock, SearchLimits};

use super::error::HarnessError;
use super::{handle_parse_failure, ParseErrorPolicy};

/// Evaluation-run configuration. Defaults mirror the command-line defaults.
#[derive(Clone, Debug)]
pub struct EvalBookConfig {
    pub depth: u32,
    pub threads: usize,
    pub hash_mb: usize,
    pub on_parse_error: ParseErrorPolicy,
}

impl Default for EvalBookConfig {
    fn default() -> Self {
        EvalBookConfig {
            depth: 12,
            threads: 1,
            hash_mb: 2,
            on_parse_error: ParseErrorPolicy::Abort,
        }
    }
}

/// Search every position in the book at the configured depth, echoing each
/// line and a final total-time report to `out`. Returns the number of
/// positions searched.
///
/// One engine handle serves the whole run. Between lines the worker pool's
/// transient search state is reset and the shared table is cleared (never
/// resized), so every line is searched from a cold, reproducible state.
pub fn run_eval_book(
    path: &Path,
    config: &EvalBookConfig,
    out: &mut impl Write,
) -> Result<u64, HarnessError> {
    let file = File::open(path).map_err(|e| HarnessError::file_open(path, e))?;
    let reader = BufReader::new(file);

    let mut engine = EngineHandle::new(config.threads, config.hash_mb);
    let clock = Arc::new(SearchClock::new());
    let limits = SearchLimits {
        multi_pv: 1,
        depth_limited: true,
        depth: config.depth,
        clock: Arc::clone(&clock),
    };

    info!(
        "evalbook: {} at depth {}, {} thread(s), {} MB",
        path.display(),
        config.depth,
        config.threads,
        config.hash_mb
    );

    let run_start = Instant::now();
    let mut searched = 0u64;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let board = match Board::try_from_fen(&line) {
            Ok(board) => board,
            Err(err) => {
                handle_parse_failure(config.on_parse_error, idx + 1, &err.to_string())?;
                continue;
            }
        };

        clock.restart();
        engine.search(&board, &limits)?;
        engine.reset_workers();
        engine.clear_tt();
        searched += 1;

        writeln!(out, "FEN: {line}")?;
    }

    writeln!(out, "Time {}ms", run_start.elapsed().as_millis())?;
    Ok(searched)
}
