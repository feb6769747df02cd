//! Annotated-line tokenizer.
//!
//! Training-book lines carry a position, one bracketed result marker, and a
//! trailing signed integer evaluation:
//!
//! ```text
//! 8/5k2/8/8/8/2Q5/1K6/8 w - - 0 1 [1.0] 873
//! ```
//!
//! The tokenizer is strict: exactly one marker must be present and the
//! evaluation must parse, otherwise the line is an explicit error. A line
//! containing more than one marker token is rejected rather than resolved
//! by whichever substring happens to be scanned last.

use std::fmt;

/// Game outcome from the perspective encoded by the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    Loss,
    Draw,
    Win,
}

impl GameResult {
    /// Wire code used in training records: 0 loss, 1 draw, 2 win.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            GameResult::Loss => 0,
            GameResult::Draw => 1,
            GameResult::Win => 2,
        }
    }

    #[must_use]
    pub(crate) fn from_code(code: u8) -> Option<GameResult> {
        match code {
            0 => Some(GameResult::Loss),
            1 => Some(GameResult::Draw),
            2 => Some(GameResult::Win),
            _ => None,
        }
    }
}

const MARKERS: [(&str, GameResult); 3] = [
    ("[0.0]", GameResult::Loss),
    ("[0.5]", GameResult::Draw),
    ("[1.0]", GameResult::Win),
];

/// Parsed annotation suffix of a book line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Annotation {
    pub result: GameResult,
    /// Side-relative centipawn evaluation.
    pub eval: i16,
}

/// Annotation parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    /// None of the three result markers is present
    MissingResultMarker,
    /// More than one result marker is present
    AmbiguousResultMarker,
    /// No parseable integer follows the marker
    MissingEval,
    /// The evaluation does not fit a signed 16-bit centipawn field
    EvalOutOfRange { value: i64 },
}

impl fmt::Display for AnnotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationError::MissingResultMarker => {
                write!(f, "no result marker ([0.0], [0.5] or [1.0]) found")
            }
            AnnotationError::AmbiguousResultMarker => {
                write!(f, "more than one result marker found")
            }
            AnnotationError::MissingEval => {
                write!(f, "no evaluation integer after the result marker")
            }
            AnnotationError::EvalOutOfRange { value } => {
                write!(f, "evaluation {value} does not fit in 16 bits")
            }
        }
    }
}

impl std::error::Error for AnnotationError {}

/// Parse the annotation suffix of one book line.
pub fn parse_annotation(line: &str) -> Result<Annotation, AnnotationError> {
    let mut found: Option<(usize, &str, GameResult)> = None;
    let mut occurrences = 0usize;

    for (marker, result) in MARKERS {
        for (pos, _) in line.match_indices(marker) {
            occurrences += 1;
            if found.is_none() {
                found = Some((pos, marker, result));
            }
        }
    }

    let (pos, marker, result) = match (occurrences, found) {
        (0, _) | (_, None) => return Err(AnnotationError::MissingResultMarker),
        (1, Some(hit)) => hit,
        _ => return Err(AnnotationError::AmbiguousResultMarker),
    };

    let rest = line[pos + marker.len()..].trim_start();
    let end = rest
        .char_indices()
        .find(|&(idx, c)| {
            let sign = (c == '-' || c == '+') && idx == 0;
            !(sign || c.is_ascii_digit())
        })
        .map_or(rest.len(), |(idx, _)| idx);

    let value: i64 = rest[..end]
        .parse()
        .map_err(|_| AnnotationError::MissingEval)?;
    let eval = i16::try_from(value).map_err(|_| AnnotationError::EvalOutOfRange { value })?;

    Ok(Annotation { result, eval })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_each_marker() {
        let cases = [
            ("8/8 w - - 0 1 [0.0] -250", GameResult::Loss, -250),
            ("8/8 w - - 0 1 [0.5] 0", GameResult::Draw, 0),
            ("8/8 w - - 0 1 [1.0] 873", GameResult::Win, 873),
        ];
        for (line, result, eval) in cases {
            let ann = parse_annotation(line).unwrap();
            assert_eq!(ann.result, result);
            assert_eq!(ann.eval, eval);
        }
    }

    #[test]
    fn test_positive_sign_accepted() {
        let ann = parse_annotation("fen [1.0] +42").unwrap();
        assert_eq!(ann.eval, 42);
    }

    #[test]
    fn test_missing_marker_rejected() {
        assert_eq!(
            parse_annotation("8/8 w - - 0 1 12"),
            Err(AnnotationError::MissingResultMarker)
        );
    }

    #[test]
    fn test_ambiguous_markers_rejected() {
        assert_eq!(
            parse_annotation("fen [0.5] 10 [1.0] 20"),
            Err(AnnotationError::AmbiguousResultMarker)
        );
        // Even a repeat of the same marker is ambiguous
        assert_eq!(
            parse_annotation("fen [1.0] [1.0] 20"),
            Err(AnnotationError::AmbiguousResultMarker)
        );
    }

    #[test]
    fn test_missing_eval_rejected() {
        assert_eq!(
            parse_annotation("fen [0.5]"),
            Err(AnnotationError::MissingEval)
        );
        assert_eq!(
            parse_annotation("fen [0.5] draw"),
            Err(AnnotationError::MissingEval)
        );
    }

    #[test]
    fn test_eval_out_of_range_rejected() {
        assert!(matches!(
            parse_annotation("fen [1.0] 40000"),
            Err(AnnotationError::EvalOutOfRange { value: 40000 })
        ));
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(GameResult::Loss.code(), 0);
        assert_eq!(GameResult::Draw.code(), 1);
        assert_eq!(GameResult::Win.code(), 2);
        for code in 0..3 {
            assert_eq!(GameResult::from_code(code).unwrap().code(), code);
        }
        assert_eq!(GameResult::from_code(3), None);
    }
}
