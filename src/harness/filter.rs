//! Training-position filter: keep only quiet positions worth labeling with
//! a static evaluation.

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use log::info;

use crate::board::Board;
use crate::engine::EngineHandle;

use super::error::HarnessError;
use super::{handle_parse_failure, ParseErrorPolicy};

/// Positions at or below this total piece count live in exhaustively solved
/// endgame-table space and would bias the training distribution.
const ENDGAME_TABLE_PIECES: u32 = 6;

/// Filter configuration.
#[derive(Clone, Debug, Default)]
pub struct FilterConfig {
    pub on_parse_error: ParseErrorPolicy,
}

/// Counters for one filter run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub read: u64,
    pub kept: u64,
    pub rejected_in_check: u64,
    pub rejected_endgame_table: u64,
    pub rejected_noisy: u64,
}

/// Stream annotated lines from `path`, writing to `out` only those that
/// survive three predicates, evaluated in this order with short-circuiting:
///
/// 1. the side to move is not in check (a checked position is tactically
///    unstable and unusable as a static-evaluation sample);
/// 2. more than six pieces are on the board;
/// 3. the static evaluation equals the full-window quiescence value
///    (a mismatch means unresolved tactics, so the static score would be a
///    biased label).
///
/// Surviving lines are emitted verbatim, annotation suffix included, in
/// their original order.
pub fn run_filter(
    path: &Path,
    config: &FilterConfig,
    out: &mut impl Write,
) -> Result<FilterStats, HarnessError> {
    let file = File::open(path).map_err(|e| HarnessError::file_open(path, e))?;
    let reader = BufReader::new(file);

    let mut engine = EngineHandle::new(1, 1);
    let mut stats = FilterStats::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.read += 1;

        let board = match Board::try_from_fen(&line) {
            Ok(board) => board,
            Err(err) => {
                handle_parse_failure(config.on_parse_error, idx + 1, &err.to_string())?;
                continue;
            }
        };

        if board.in_check(board.side_to_move()) {
            stats.rejected_in_check += 1;
            continue;
        }

        if board.piece_count() <= ENDGAME_TABLE_PIECES {
            stats.rejected_endgame_table += 1;
            continue;
        }

        let static_eval = engine.static_eval(&board);
        let quiesced = engine.quiescence_eval(&board);
        if static_eval != quiesced {
            stats.rejected_noisy += 1;
            continue;
        }

        writeln!(out, "{line}")?;
        stats.kept += 1;
    }

    info!(
        "filter: kept {}/{} (in check {}, endgame-table {}, noisy {})",
        stats.kept,
        stats.read,
        stats.rejected_in_check,
        stats.rejected_endgame_table,
        stats.rejected_noisy
    );
    Ok(stats)
}
