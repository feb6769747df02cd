//! Attack generation: precomputed leaper tables and ray scans for sliders.

use once_cell::sync::Lazy;

use super::types::{Bitboard, Color, Piece, Square};
use super::Board;

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

pub(crate) const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
pub(crate) const QUEEN_DIRS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

fn leaper_targets(from: Square, deltas: &[(i8, i8)]) -> Bitboard {
    let mut targets = Bitboard::EMPTY;
    let (rank, file) = (from.rank() as i8, from.file() as i8);
    for &(dr, df) in deltas {
        let (r, f) = (rank + dr, file + df);
        if (0..8).contains(&r) && (0..8).contains(&f) {
            targets |= Bitboard::from_square(Square::from_coords(r as usize, f as usize));
        }
    }
    targets
}

static KNIGHT_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for (idx, entry) in table.iter_mut().enumerate() {
        *entry = leaper_targets(Square::from_index(idx as u8), &KNIGHT_DELTAS);
    }
    table
});

static KING_ATTACKS: Lazy<[Bitboard; 64]> = Lazy::new(|| {
    let mut table = [Bitboard::EMPTY; 64];
    for (idx, entry) in table.iter_mut().enumerate() {
        *entry = leaper_targets(Square::from_index(idx as u8), &KING_DELTAS);
    }
    table
});

/// `PAWN_ATTACKS[color][sq]`: squares attacked by a pawn of `color` on `sq`.
static PAWN_ATTACKS: Lazy<[[Bitboard; 64]; 2]> = Lazy::new(|| {
    let mut table = [[Bitboard::EMPTY; 64]; 2];
    for idx in 0..64 {
        let sq = Square::from_index(idx as u8);
        table[Color::White.index()][idx] = leaper_targets(sq, &[(1, -1), (1, 1)]);
        table[Color::Black.index()][idx] = leaper_targets(sq, &[(-1, -1), (-1, 1)]);
    }
    table
});

#[inline]
pub(crate) fn knight_attacks(from: Square) -> Bitboard {
    KNIGHT_ATTACKS[from.index()]
}

#[inline]
pub(crate) fn king_attacks(from: Square) -> Bitboard {
    KING_ATTACKS[from.index()]
}

#[inline]
pub(crate) fn pawn_attacks(color: Color, from: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][from.index()]
}

/// Slider attacks by ray scan: walk each direction until the first blocker
/// (the blocker square itself is included, capture legality is decided later).
pub(crate) fn ray_attacks(from: Square, occupied: Bitboard, dirs: &[(i8, i8)]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    let (rank, file) = (from.rank() as i8, from.file() as i8);
    for &(dr, df) in dirs {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let sq = Square::from_coords(r as usize, f as usize);
            attacks |= Bitboard::from_square(sq);
            if occupied.contains(sq) {
                break;
            }
            r += dr;
            f += df;
        }
    }
    attacks
}

#[inline]
pub(crate) fn bishop_attacks(from: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(from, occupied, &BISHOP_DIRS)
}

#[inline]
pub(crate) fn rook_attacks(from: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(from, occupied, &ROOK_DIRS)
}

impl Board {
    /// True if `sq` is attacked by any piece of `by`.
    #[must_use]
    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        let b = by.index();

        // A pawn of `by` attacks sq exactly when a defender-colored pawn on
        // sq would attack the pawn's square.
        if (pawn_attacks(by.opponent(), sq) & self.pieces[b][Piece::Pawn.index()]).any() {
            return true;
        }
        if (knight_attacks(sq) & self.pieces[b][Piece::Knight.index()]).any() {
            return true;
        }
        if (king_attacks(sq) & self.pieces[b][Piece::King.index()]).any() {
            return true;
        }

        let diagonal = self.pieces[b][Piece::Bishop.index()] | self.pieces[b][Piece::Queen.index()];
        if (bishop_attacks(sq, self.all_occupied) & diagonal).any() {
            return true;
        }

        let straight = self.pieces[b][Piece::Rook.index()] | self.pieces[b][Piece::Queen.index()];
        (rook_attacks(sq, self.all_occupied) & straight).any()
    }

    /// True if `color`'s king is currently attacked.
    #[must_use]
    pub fn in_check(&self, color: Color) -> bool {
        self.king_square(color)
            .map_or(false, |sq| self.is_square_attacked(sq, color.opponent()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_knight_attack_counts() {
        assert_eq!(knight_attacks(sq("a1")).popcount(), 2);
        assert_eq!(knight_attacks(sq("d4")).popcount(), 8);
        assert_eq!(knight_attacks(sq("h8")).popcount(), 2);
    }

    #[test]
    fn test_pawn_attack_direction() {
        assert!(pawn_attacks(Color::White, sq("e4")).contains(sq("d5")));
        assert!(pawn_attacks(Color::White, sq("e4")).contains(sq("f5")));
        assert!(pawn_attacks(Color::Black, sq("e4")).contains(sq("d3")));
        assert!(!pawn_attacks(Color::White, sq("a2")).contains(sq("b2")));
    }

    #[test]
    fn test_rook_ray_stops_at_blocker() {
        let occupied = Bitboard::from_square(sq("d6"));
        let attacks = rook_attacks(sq("d4"), occupied);
        assert!(attacks.contains(sq("d5")));
        assert!(attacks.contains(sq("d6"))); // blocker included
        assert!(!attacks.contains(sq("d7")));
        assert!(attacks.contains(sq("a4")));
        assert!(attacks.contains(sq("h4")));
    }

    #[test]
    fn test_in_check_detection() {
        // Black king on e8 facing a white rook on e1 down an open file
        let board = Board::from_fen("4k3/8/8/8/8/8/8/4RK2 b - - 0 1");
        assert!(board.in_check(Color::Black));
        assert!(!board.in_check(Color::White));

        // Knight check
        let board = Board::from_fen("4k3/8/3N4/8/8/8/8/4K3 b - - 0 1");
        assert!(board.in_check(Color::Black));
    }

    #[test]
    fn test_blocked_slider_gives_no_check() {
        let board = Board::from_fen("4k3/4p3/8/8/8/8/8/4RK2 b - - 0 1");
        assert!(!board.in_check(Color::Black));
    }
}
