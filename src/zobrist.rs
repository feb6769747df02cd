//! Zobrist hashing for chess positions.
//!
//! Keys are generated from a fixed seed so that hashes, and therefore node
//! counts of hash-guided searches, are reproducible across runs and builds.

use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub(crate) struct ZobristKeys {
    /// `pieces[color][piece][square]`
    pub(crate) pieces: [[[u64; 64]; 6]; 2],
    pub(crate) side_to_move: u64,
    /// One key per castling-rights bit, in bitmask bit order.
    pub(crate) castling: [u64; 4],
    /// Keyed by en passant target file only.
    pub(crate) en_passant_file: [u64; 8],
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x00c0_ffee_d00d_f00d);

        let mut pieces = [[[0u64; 64]; 6]; 2];
        for color in &mut pieces {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let side_to_move = rng.gen();

        let mut castling = [0u64; 4];
        for key in &mut castling {
            *key = rng.gen();
        }

        let mut en_passant_file = [0u64; 8];
        for key in &mut en_passant_file {
            *key = rng.gen();
        }

        ZobristKeys {
            pieces,
            side_to_move,
            castling,
            en_passant_file,
        }
    }
}

pub(crate) static ZOBRIST: Lazy<ZobristKeys> = Lazy::new(ZobristKeys::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        // Spot check: a fixed seed must still produce non-colliding keys
        // for a few obviously distinct inputs.
        assert_ne!(ZOBRIST.pieces[0][0][0], ZOBRIST.pieces[1][0][0]);
        assert_ne!(ZOBRIST.pieces[0][0][0], ZOBRIST.pieces[0][0][1]);
        assert_ne!(ZOBRIST.castling[0], ZOBRIST.castling[1]);
        assert_ne!(ZOBRIST.side_to_move, 0);
    }

    #[test]
    fn test_keys_are_reproducible() {
        let again = ZobristKeys::new();
        assert_eq!(again.side_to_move, ZOBRIST.side_to_move);
        assert_eq!(again.pieces[1][5][63], ZOBRIST.pieces[1][5][63]);
    }
}
