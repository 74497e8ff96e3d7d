use super::Board;
use crate::lookup_tables::*;
use crate::moves::{Move, MoveList};
use crate::types::{CastlingIndex::*, Color::*, Piece, Piece::*};
use lancer_bitboards::*;

const PROMOTIONS: [Piece; 4] = [Queen, Rook, Bishop, Knight];

impl Board {
    /// All moves obeying piece movement and occupancy, without testing
    /// whether the mover's king is left in check. Castling is the exception:
    /// its attack conditions are part of generation.
    pub fn generate_pseudo_legal_into(&self, moves: &mut MoveList) {
        moves.clear();
        self.generate_pawn_moves(moves, false);
        self.generate_piece_moves(moves, false);
        self.generate_castling(moves);
    }

    /// Captures, en passant, and promotions, for quiescence.
    pub fn generate_captures_into(&self, moves: &mut MoveList) {
        moves.clear();
        self.generate_pawn_moves(moves, true);
        self.generate_piece_moves(moves, true);
    }

    /// Pseudo-legal moves filtered through make/test-in-check/unmake.
    pub fn legal_moves(&mut self) -> MoveList {
        let mut pseudo_legal = MoveList::new();
        self.generate_pseudo_legal_into(&mut pseudo_legal);

        let color = self.current_player();
        let mut legal = MoveList::new();
        for mv in pseudo_legal.iter() {
            self.make_move(mv);
            if !self.in_check(color) {
                legal.push(mv);
            }
            self.unmake_move(mv);
        }
        legal
    }

    fn generate_pawn_moves(&self, moves: &mut MoveList, captures_only: bool) {
        let color = self.current_player();
        let pawns = self.colored(color, Pawn);
        let empty = self.occupied().inverse();
        let enemy = self.color_pieces(!color);

        let (promotion_rank, back_rank) = match color {
            White => (EIGHTH_RANK, 7),
            Black => (FIRST_RANK, 0),
        };

        // pushes by bulk shift; promotions fan out even in captures-only mode
        let single_pushes = match color {
            White => (pawns << 8) & empty,
            Black => (pawns >> 8) & empty,
        };
        let push_origin = |target: Square| match color {
            White => target.offset(0, -1),
            Black => target.offset(0, 1),
        };

        for target in single_pushes & promotion_rank {
            for promotion in PROMOTIONS {
                moves.push(Move::pawn_promotion(
                    push_origin(target),
                    target,
                    color,
                    NoPiece,
                    promotion,
                ));
            }
        }

        if !captures_only {
            for target in single_pushes & promotion_rank.inverse() {
                moves.push(Move::quiet(push_origin(target), target, Pawn, color));
            }

            let double_pushes = match color {
                White => ((single_pushes & THIRD_RANK) << 8) & empty,
                Black => ((single_pushes & SIXTH_RANK) >> 8) & empty,
            };
            for target in double_pushes {
                let from = match color {
                    White => target.offset(0, -2),
                    Black => target.offset(0, 2),
                };
                moves.push(Move::quiet(from, target, Pawn, color));
            }
        }

        // captures via the attack masks
        for from in pawns {
            for target in lookup_pawn_attack(from, color) & enemy {
                let captured = self.piece_at(target);
                if target.rank() == back_rank {
                    for promotion in PROMOTIONS {
                        moves.push(Move::pawn_promotion(from, target, color, captured, promotion));
                    }
                } else {
                    moves.push(Move::capture(from, target, Pawn, color, captured));
                }
            }
        }

        // pawns attacking the ep square are found with the reverse lookup
        if self.ep_mask().is_not_empty() {
            let ep_square = self.ep_mask().first_square();
            for from in lookup_pawn_attack(ep_square, !color) & pawns {
                moves.push(Move::en_passant(from, ep_square, color));
            }
        }
    }

    fn generate_piece_moves(&self, moves: &mut MoveList, captures_only: bool) {
        let color = self.current_player();
        let own = self.color_pieces(color);
        let enemy = self.color_pieces(!color);
        let empty = self.occupied().inverse();
        let occupied = self.occupied();

        for piece in [Knight, Bishop, Rook, Queen, King] {
            for from in self.colored(color, piece) {
                let attacks = match piece {
                    Knight => lookup_knight(from),
                    Bishop => lookup_bishop(from, occupied),
                    Rook => lookup_rook(from, occupied),
                    Queen => lookup_queen(from, occupied),
                    King => lookup_king(from),
                    _ => unreachable!(),
                } & own.inverse();

                for target in attacks & enemy {
                    moves.push(Move::capture(
                        from,
                        target,
                        piece,
                        color,
                        self.piece_at(target),
                    ));
                }
                if !captures_only {
                    for target in attacks & empty {
                        moves.push(Move::quiet(from, target, piece, color));
                    }
                }
            }
        }
    }

    /// Castling needs the right, an unattacked king, empty squares between
    /// king and rook, and an unattacked transit and landing square.
    fn generate_castling(&self, moves: &mut MoveList) {
        let color = self.current_player();
        let occupied = self.occupied();

        let king_from = match color {
            White => Square::E1,
            Black => Square::E8,
        };
        if self.king_square(color) != king_from || self.in_check(color) {
            return;
        }

        if self.castling_rights()[(color, Kingside)] {
            let transit = king_from.offset(1, 0);
            let landing = king_from.offset(2, 0);
            if (occupied & (transit.bitboard() | landing.bitboard())).is_empty()
                && !self.is_attacked(transit, !color, occupied)
                && !self.is_attacked(landing, !color, occupied)
            {
                moves.push(Move::castle(king_from, landing, color));
            }
        }
        if self.castling_rights()[(color, Queenside)] {
            let transit = king_from.offset(-1, 0);
            let landing = king_from.offset(-2, 0);
            let rook_path = king_from.offset(-3, 0);
            if (occupied & (transit.bitboard() | landing.bitboard() | rook_path.bitboard()))
                .is_empty()
                && !self.is_attacked(transit, !color, occupied)
                && !self.is_attacked(landing, !color, occupied)
            {
                moves.push(Move::castle(king_from, landing, color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startpos_has_twenty_moves() {
        let mut board = Board::new();
        let moves = board.legal_moves();
        assert_eq!(moves.len(), 20);

        let pawn_moves = moves.iter().filter(|m| m.piece() == Pawn).count();
        let knight_moves = moves.iter().filter(|m| m.piece() == Knight).count();
        assert_eq!(pawn_moves, 16);
        assert_eq!(knight_moves, 4);
    }

    #[test]
    fn test_checkmate_has_no_moves() {
        // fool's mate
        let mut board =
            Board::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 1")
                .unwrap();
        assert!(board.in_check(White));
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn test_stalemate_has_no_moves() {
        let mut board = Board::from_fen("k7/8/1Q6/8/8/8/8/K7 b - - 0 1").unwrap();
        assert!(!board.in_check(Black));
        assert!(board.legal_moves().is_empty());
    }

    #[test]
    fn test_en_passant_capture_is_generated() {
        let mut board =
            Board::from_fen("r1bqkbnr/ppp1pppp/2n5/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
                .unwrap();
        let moves = board.legal_moves();
        assert!(moves.iter().any(|m| m.coords() == "e5d6" && m.is_en_passant()));

        // without the ep square the capture disappears
        let mut board =
            Board::from_fen("r1bqkbnr/ppp1pppp/2n5/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq - 0 3")
                .unwrap();
        let moves = board.legal_moves();
        assert!(!moves.iter().any(|m| m.coords() == "e5d6"));
    }

    #[test]
    fn test_captures_subset_of_pseudo_legal() {
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let mut all = MoveList::new();
        let mut captures = MoveList::new();
        board.generate_pseudo_legal_into(&mut all);
        board.generate_captures_into(&mut captures);

        for mv in captures.iter() {
            assert!(mv.is_capture() || mv.promotion() != NoPiece);
            assert!(all.contains(mv));
        }
    }

    #[test]
    fn test_castling_blocked_by_attack() {
        // a rook on f8 covers the white kingside transit square
        let mut board = Board::from_fen("5rk1/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let moves = board.legal_moves();
        assert!(!moves.iter().any(|m| m.is_castle()));

        // move the attacker off the file and the castle returns
        let mut board = Board::from_fen("6k1/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let moves = board.legal_moves();
        assert!(moves.iter().any(|m| m.is_castle() && m.coords() == "e1g1"));
    }

    #[test]
    fn test_perft_startpos() {
        let mut board = Board::new();
        assert_eq!(board.perft(1), 20);
        assert_eq!(board.perft(2), 400);
        assert_eq!(board.perft(3), 8_902);
        assert_eq!(board.perft(4), 197_281);
    }

    #[test]
    #[ignore = "slow, run with --ignored"]
    fn test_perft_startpos_deep() {
        let mut board = Board::new();
        assert_eq!(board.perft(5), 4_865_609);
        assert_eq!(board.perft(6), 119_060_324);
    }

    #[test]
    fn test_perft_kiwipete() {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(board.perft(1), 48);
        assert_eq!(board.perft(2), 2_039);
        assert_eq!(board.perft(3), 97_862);
    }

    #[test]
    #[ignore = "slow, run with --ignored"]
    fn test_perft_kiwipete_deep() {
        let mut board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(board.perft(4), 4_085_603);
    }

    #[test]
    #[ignore = "slow, run with --ignored"]
    fn test_perft_position_3() {
        let mut board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(board.perft(6), 11_030_083);
    }

    #[test]
    fn test_perft_position_4() {
        let mut board =
            Board::from_fen("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1")
                .unwrap();
        assert_eq!(board.perft(4), 422_333);
    }

    #[test]
    #[ignore = "slow, run with --ignored"]
    fn test_perft_position_5() {
        let mut board =
            Board::from_fen("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8").unwrap();
        assert_eq!(board.perft(5), 89_941_194);
    }

    #[test]
    fn test_generated_moves_round_trip() {
        // every generated pseudo-legal move survives make/unmake bit-for-bit
        let fens = [
            super::super::STARTPOS_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ];
        for fen in fens {
            let mut board = Board::from_fen(fen).unwrap();
            let reference_fen = board.fen();
            let mut moves = MoveList::new();
            board.generate_pseudo_legal_into(&mut moves);
            for mv in moves.iter() {
                board.make_move(mv);
                board.unmake_move(mv);
                board.assert_consistent();
                assert_eq!(board.fen(), reference_fen, "move {} corrupted state", mv);
            }
        }
    }
}
