//! Harness error taxonomy.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::engine::EngineError;

/// Failures surfaced by the batch pipelines.
#[derive(Debug)]
pub enum HarnessError {
    /// Bad command line; reported with usage before any resource allocation.
    InvalidArguments { message: String },
    /// An input or output file could not be opened.
    FileOpen { path: PathBuf, source: io::Error },
    /// A malformed position or annotation, with its 1-based line number.
    Parse { line: usize, message: String },
    /// An I/O failure while streaming input or output.
    Io { source: io::Error },
    /// Opaque failure from the search core; fatal, never retried.
    Engine { source: EngineError },
}

impl HarnessError {
    pub(crate) fn file_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::FileOpen {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        HarnessError::Parse {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::InvalidArguments { message } => write!(f, "{message}"),
            HarnessError::FileOpen { path, source } => {
                write!(f, "cannot open {}: {source}", path.display())
            }
            HarnessError::Parse { line, message } => {
                write!(f, "line {line}: {message}")
            }
            HarnessError::Io { source } => write!(f, "I/O error: {source}"),
            HarnessError::Engine { source } => write!(f, "engine failure: {source}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::FileOpen { source, .. } | HarnessError::Io { source } => Some(source),
            HarnessError::Engine { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for HarnessError {
    fn from(source: io::Error) -> Self {
        HarnessError::Io { source }
    }
}

impl From<EngineError> for HarnessError {
    fn from(source: EngineError) -> Self {
        HarnessError::Engine { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_path() {
        let err = HarnessError::file_open(
            "books/missing.epd",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("books/missing.epd"));
    }

    #[test]
    fn test_display_names_line() {
        let err = HarnessError::parse(17, "bad FEN");
        assert!(err.to_string().contains("17"));
        assert!(err.to_string().contains("bad FEN"));
    }
}
