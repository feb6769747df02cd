//! Applying and reverting moves, with incremental Zobrist updates.

use crate::zobrist::ZOBRIST;

use super::state::{NullUnmakeInfo, UnmakeInfo};
use super::types::{castle_bit, Color, Move, Piece, Square};
use super::Board;

impl Board {
    /// Apply `mv` to the board. Returns the state needed by
    /// [`Board::unmake_move`] to restore the previous position.
    ///
    /// The move must be pseudo-legal for the current position.
    pub fn make_move(&mut self, mv: Move) -> UnmakeInfo {
        let us = self.side_to_move();
        let them = us.opponent();
        let from = mv.from();
        let to = mv.to();

        let prev_en_passant = self.en_passant_target;
        let prev_castling_rights = self.castling_rights;
        let prev_halfmove_clock = self.halfmove_clock;
        let prev_hash = self.hash;

        let mut hash = self.hash ^ ZOBRIST.side_to_move;
        if let Some(ep) = self.en_passant_target {
            hash ^= ZOBRIST.en_passant_file[ep.file()];
        }
        self.en_passant_target = None;

        let (_, moving) = self.piece_at(from).expect("make_move: empty from-square");

        // Remove the captured piece first so the destination is free.
        let mut captured: Option<(Color, Piece)> = None;
        if mv.is_en_passant() {
            let cap_sq = Square::from_coords(from.rank(), to.file());
            self.remove_piece(cap_sq, them, Piece::Pawn);
            hash ^= ZOBRIST.pieces[them.index()][Piece::Pawn.index()][cap_sq.index()];
            captured = Some((them, Piece::Pawn));
        } else if mv.is_capture() {
            let (cap_color, cap_piece) = self.piece_at(to).expect("capture without victim");
            self.remove_piece(to, cap_color, cap_piece);
            hash ^= ZOBRIST.pieces[cap_color.index()][cap_piece.index()][to.index()];
            captured = Some((cap_color, cap_piece));
        }

        // Move the piece, promoting if requested.
        self.remove_piece(from, us, moving);
        hash ^= ZOBRIST.pieces[us.index()][moving.index()][from.index()];
        let placed = mv.promotion_piece().unwrap_or(moving);
        self.set_piece(to, us, placed);
        hash ^= ZOBRIST.pieces[us.index()][placed.index()][to.index()];

        // Castling also moves the rook.
        if mv.is_castling() {
            let rank = from.rank();
            let (rook_from_file, rook_to_file) = if to.file() == 6 { (7, 5) } else { (0, 3) };
            let rook_from = Square::from_coords(rank, rook_from_file);
            let rook_to = Square::from_coords(rank, rook_to_file);
            self.remove_piece(rook_from, us, Piece::Rook);
            self.set_piece(rook_to, us, Piece::Rook);
            hash ^= ZOBRIST.pieces[us.index()][Piece::Rook.index()][rook_from.index()];
            hash ^= ZOBRIST.pieces[us.index()][Piece::Rook.index()][rook_to.index()];
        }

        // A double push exposes a new en passant target.
        if mv.is_double_pawn_push() {
            let ep = Square::from_coords((from.rank() + to.rank()) / 2, from.file());
            self.en_passant_target = Some(ep);
            hash ^= ZOBRIST.en_passant_file[ep.file()];
        }

        if moving == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        // Castling rights lost by king/rook moves and rook captures.
        let mut cleared = 0u8;
        if moving == Piece::King {
            cleared |= castle_bit(us, true) | castle_bit(us, false);
        } else if moving == Piece::Rook {
            let home = if us == Color::White { 0 } else { 7 };
            if from == Square::from_coords(home, 0) {
                cleared |= castle_bit(us, false);
            } else if from == Square::from_coords(home, 7) {
                cleared |= castle_bit(us, true);
            }
        }
        if let Some((cap_color, Piece::Rook)) = captured {
            let home = if cap_color == Color::White { 0 } else { 7 };
            if to == Square::from_coords(home, 0) {
                cleared |= castle_bit(cap_color, false);
            } else if to == Square::from_coords(home, 7) {
                cleared |= castle_bit(cap_color, true);
            }
        }
        let removed = self.castling_rights & cleared;
        for bit in 0..4 {
            if removed & (1 << bit) != 0 {
                hash ^= ZOBRIST.castling[bit];
            }
        }
        self.castling_rights &= !cleared;

        self.white_to_move = !self.white_to_move;
        self.hash = hash;

        UnmakeInfo {
            captured,
            prev_en_passant,
            prev_castling_rights,
            prev_halfmove_clock,
            prev_hash,
        }
    }

    /// Revert a move applied by [`Board::make_move`].
    pub fn unmake_move(&mut self, mv: Move, info: UnmakeInfo) {
        self.white_to_move = !self.white_to_move;
        let us = self.side_to_move();
        let from = mv.from();
        let to = mv.to();

        let moving = if mv.is_promotion() {
            Piece::Pawn
        } else {
            self.piece_at(to).expect("unmake_move: empty to-square").1
        };
        let placed = mv.promotion_piece().unwrap_or(moving);
        self.remove_piece(to, us, placed);
        self.set_piece(from, us, moving);

        if mv.is_castling() {
            let rank = from.rank();
            let (rook_from_file, rook_to_file) = if to.file() == 6 { (7, 5) } else { (0, 3) };
            self.remove_piece(Square::from_coords(rank, rook_to_file), us, Piece::Rook);
            self.set_piece(Square::from_coords(rank, rook_from_file), us, Piece::Rook);
        }

        if let Some((cap_color, cap_piece)) = info.captured {
            let cap_sq = if mv.is_en_passant() {
                Square::from_coords(from.rank(), to.file())
            } else {
                to
            };
            self.set_piece(cap_sq, cap_color, cap_piece);
        }

        self.en_passant_target = info.prev_en_passant;
        self.castling_rights = info.prev_castling_rights;
        self.halfmove_clock = info.prev_halfmove_clock;
        self.hash = info.prev_hash;
    }

    /// Pass the turn without moving. Used by null-move pruning.
    pub(crate) fn make_null(&mut self) -> NullUnmakeInfo {
        let info = NullUnmakeInfo {
            prev_en_passant: self.en_passant_target,
            prev_halfmove_clock: self.halfmove_clock,
            prev_hash: self.hash,
        };
        let mut hash = self.hash ^ ZOBRIST.side_to_move;
        if let Some(ep) = self.en_passant_target {
            hash ^= ZOBRIST.en_passant_file[ep.file()];
        }
        self.en_passant_target = None;
        self.halfmove_clock += 1;
        self.white_to_move = !self.white_to_move;
        self.hash = hash;
        info
    }

    pub(crate) fn unmake_null(&mut self, info: NullUnmakeInfo) {
        self.white_to_move = !self.white_to_move;
        self.en_passant_target = info.prev_en_passant;
        self.halfmove_clock = info.prev_halfmove_clock;
        self.hash = info.prev_hash;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_incremental_hash(board: &Board) {
        assert_eq!(
            board.hash(),
            board.calculate_hash(),
            "incremental hash drifted from full recomputation"
        );
    }

    fn make_unmake_round_trip(fen: &str) {
        let mut board = Board::from_fen(fen);
        let before_fen = board.to_fen();
        let before_hash = board.hash();
        let moves = board.generate_moves();
        for &mv in &moves {
            let info = board.make_move(mv);
            assert_incremental_hash(&board);
            board.unmake_move(mv, info);
            assert_eq!(board.to_fen(), before_fen, "position not restored by {mv}");
            assert_eq!(board.hash(), before_hash, "hash not restored by {mv}");
        }
    }

    #[test]
    fn test_make_unmake_startpos() {
        make_unmake_round_trip(super::super::fen::START_FEN);
    }

    #[test]
    fn test_make_unmake_tactical_position() {
        make_unmake_round_trip(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        );
    }

    #[test]
    fn test_make_unmake_en_passant() {
        make_unmake_round_trip("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 0 1");
    }

    #[test]
    fn test_en_passant_capture_removes_pawn() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        let moves = board.generate_moves();
        let ep = moves
            .iter()
            .copied()
            .find(|m| m.is_en_passant())
            .expect("en passant available");
        assert_eq!(ep.to_string(), "d4e3");
        board.make_move(ep);
        // The captured pawn on e4 is gone
        assert!(board.square_is_empty("e4".parse().unwrap()));
        assert_incremental_hash(&board);
    }

    #[test]
    fn test_castling_moves_rook() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let moves = board.generate_moves();
        let castle = moves
            .iter()
            .copied()
            .find(|m| m.to_string() == "e1g1")
            .expect("kingside castle available");
        let info = board.make_move(castle);
        assert_eq!(
            board.piece_at("f1".parse().unwrap()),
            Some((Color::White, Piece::Rook))
        );
        assert!(board.square_is_empty("h1".parse().unwrap()));
        assert_incremental_hash(&board);
        board.unmake_move(castle, info);
        assert_eq!(
            board.piece_at("h1".parse().unwrap()),
            Some((Color::White, Piece::Rook))
        );
    }

    #[test]
    fn test_promotion_replaces_pawn() {
        let mut board = Board::from_fen("8/P7/8/8/8/8/k7/4K3 w - - 0 1");
        let moves = board.generate_moves();
        let promo = moves
            .iter()
            .copied()
            .find(|m| m.promotion_piece() == Some(Piece::Queen))
            .expect("promotion available");
        let info = board.make_move(promo);
        assert_eq!(
            board.piece_at("a8".parse().unwrap()),
            Some((Color::White, Piece::Queen))
        );
        assert!(board.piece_bb(Color::White, Piece::Pawn).is_empty());
        assert_incremental_hash(&board);
        board.unmake_move(promo, info);
        assert_eq!(
            board.piece_at("a7".parse().unwrap()),
            Some((Color::White, Piece::Pawn))
        );
    }

    #[test]
    fn test_null_move_round_trip() {
        let mut board =
            Board::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        let before = board.hash();
        let info = board.make_null();
        assert_ne!(board.hash(), before);
        assert_eq!(board.calculate_hash(), board.hash());
        board.unmake_null(info);
        assert_eq!(board.hash(), before);
        assert!(board.en_passant_target.is_some());
    }
}
