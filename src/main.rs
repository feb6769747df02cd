use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use bookforge::harness::{
    build_training_book, run_benchmark, run_eval_book, run_filter, BenchConfig, BenchSuite,
    EvalBookConfig, FilterConfig, HarnessError, NnBookConfig,
};

/// Default output path of the `nnbook` pipeline, in the working directory.
const NNBOOK_OUTPUT: &str = "output.nnbook";

const USAGE: &str = "usage:
  bookforge bench [depth] [threads] [megabytes]       (defaults 13, 1, 16)
  bookforge evalbook <book> [depth] [threads] [megabytes]  (defaults 12, 1, 2)
  bookforge filter <book>
  bookforge nnbook <book>                             (writes output.nnbook)";

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();

    if let Err(err) = dispatch(&args) {
        eprintln!("error: {err}");
        let code = match err {
            HarnessError::InvalidArguments { .. } => {
                eprintln!("{USAGE}");
                2
            }
            _ => 1,
        };
        process::exit(code);
    }
}

fn dispatch(args: &[String]) -> Result<(), HarnessError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.first().map(String::as_str) {
        Some("bench") => {
            let config = BenchConfig {
                depth: numeric_arg(args, 1, 13)?,
                threads: numeric_arg(args, 2, 1)?,
                hash_mb: numeric_arg(args, 3, 16)?,
                ..BenchConfig::default()
            };
            run_benchmark(&BenchSuite::builtin(), &config, &mut out)?;
            Ok(())
        }
        Some("evalbook") => {
            let book = required_path(args, 1, "evalbook needs a book path")?;
            let config = EvalBookConfig {
                depth: numeric_arg(args, 2, 12)?,
                threads: numeric_arg(args, 3, 1)?,
                hash_mb: numeric_arg(args, 4, 2)?,
                ..EvalBookConfig::default()
            };
            run_eval_book(Path::new(book), &config, &mut out)?;
            Ok(())
        }
        Some("filter") => {
            let book = required_path(args, 1, "filter needs a book path")?;
            run_filter(Path::new(book), &FilterConfig::default(), &mut out)?;
            out.flush()?;
            Ok(())
        }
        Some("nnbook") => {
            let book = required_path(args, 1, "nnbook needs a book path")?;
            let written = build_training_book(
                Path::new(book),
                Path::new(NNBOOK_OUTPUT),
                &NnBookConfig::default(),
            )?;
            writeln!(out, "Wrote {written} records to {NNBOOK_OUTPUT}")?;
            Ok(())
        }
        Some(other) => Err(HarnessError::InvalidArguments {
            message: format!("unknown command '{other}'"),
        }),
        None => Err(HarnessError::InvalidArguments {
            message: "no command given".to_string(),
        }),
    }
}

fn required_path<'a>(args: &'a [String], idx: usize, message: &str) -> Result<&'a str, HarnessError> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| HarnessError::InvalidArguments {
            message: message.to_string(),
        })
}

/// Parse an optional positional numeric argument, falling back to `default`
/// when absent. A present but non-numeric argument is a usage error.
fn numeric_arg<T>(args: &[String], idx: usize, default: T) -> Result<T, HarnessError>
where
    T: std::str::FromStr,
{
    match args.get(idx) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| HarnessError::InvalidArguments {
            message: format!("'{raw}' is not a valid number"),
        }),
    }
}
