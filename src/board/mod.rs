//! Chess board representation: bitboard state, FEN parsing, attack and move
//! generation, make/unmake, and static evaluation.

mod attacks;
mod error;
mod eval;
mod fen;
mod make_unmake;
mod movegen;
mod state;
mod types;

pub use error::{FenError, SquareError};
pub use fen::START_FEN;
pub use state::{Board, UnmakeInfo};
pub use types::{Bitboard, Color, Move, MoveList, Piece, Square};

pub(crate) use types::{ScoredMoveList, MAX_PLY};
