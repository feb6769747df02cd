//! Benchmark suite loading.
//!
//! The suite is a data asset rather than code: one FEN per line, terminated
//! by the first empty line (or end of input). The default suite is embedded
//! at compile time but goes through the same parser as any other source, so
//! tests can substitute their own.

/// Default benchmark positions, embedded from `assets/bench.csv`.
const DEFAULT_SUITE: &str = include_str!("../../assets/bench.csv");

/// An ordered list of benchmark positions.
#[derive(Clone, Debug)]
pub struct BenchSuite {
    positions: Vec<String>,
}

impl BenchSuite {
    /// The compiled-in default suite.
    #[must_use]
    pub fn builtin() -> Self {
        BenchSuite::parse(DEFAULT_SUITE)
    }

    /// Parse a suite from text. Reading stops at the first empty line,
    /// the sentinel of the suite format.
    #[must_use]
    pub fn parse(data: &str) -> Self {
        let positions = data
            .lines()
            .map(str::trim)
            .take_while(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        BenchSuite { positions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.positions.iter().map(String::as_str)
    }
}
