//! Batch pipelines: benchmarking, bulk evaluation, training-position
//! filtering, and binary training-book generation.

pub mod annotation;
pub mod bench;
pub mod error;
pub mod evalbook;
pub mod filter;
pub mod nnbook;
pub mod suite;

pub use annotation::{parse_annotation, Annotation, AnnotationError, GameResult};
pub use bench::{run_benchmark, BenchConfig, BenchSummary, BenchmarkRecord};
pub use error::HarnessError;
pub use evalbook::{run_eval_book, EvalBookConfig};
pub use filter::{run_filter, FilterConfig, FilterStats};
pub use nnbook::{build_training_book, NnBookConfig, TrainingRecord};
pub use suite::BenchSuite;

use log::warn;

/// What to do when an input line fails to parse. The choice is explicit per
/// pipeline run; malformed lines are never skipped silently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParseErrorPolicy {
    /// Abort the whole batch, reporting the offending 1-based line number.
    #[default]
    Abort,
    /// Log a warning and continue with the next line.
    Skip,
}

/// Apply the configured policy to a parse failure on `line` (1-based).
pub(crate) fn handle_parse_failure(
    policy: ParseErrorPolicy,
    line: usize,
    message: &str,
) -> Result<(), HarnessError> {
    match policy {
        ParseErrorPolicy::Abort => Err(HarnessError::parse(line, message.to_string())),
        ParseErrorPolicy::Skip => {
            warn!("skipping line {line}: {message}");
            Ok(())
        }
    }
}
