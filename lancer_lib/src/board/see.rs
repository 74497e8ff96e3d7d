use super::Board;
use crate::lookup_tables::*;
use crate::moves::Move;
use crate::types::{Color::*, Piece::*, PIECES};

pub const SEE_PIECE_VALUES: [i16; 6] = [100, 300, 300, 500, 900, 20000];

impl Board {
    /// Simulates the exchange on the destination square: attackers recapture
    /// from least valuable to most valuable, alternating sides, with sliding
    /// x-rays refreshed as pieces leave the board. The gain list resolves
    /// with the standard backward reduction. Used only as a pruning
    /// heuristic in quiescence.
    pub fn see(&self, mv: Move) -> i16 {
        let target = mv.to();
        let mut swap_list = [0i16; 32];

        let mut current_attacker = mv.piece();
        let mut attacker_mask = mv.from().bitboard();

        let bishops = self.pieces(Bishop) | self.pieces(Queen);
        let rooks = self.pieces(Rook) | self.pieces(Queen);

        swap_list[0] = match self.piece_at(target) {
            NoPiece => 0,
            piece => SEE_PIECE_VALUES[piece],
        };
        let mut occupied = self.occupied();
        let mover = self.current_player();
        let mut color = !mover;

        // the en passant victim sits behind the target square
        if mv.is_en_passant() {
            let cap_square = if mover == White {
                target.offset(0, -1)
            } else {
                target.offset(0, 1)
            };
            occupied ^= cap_square.bitboard();
            swap_list[0] = SEE_PIECE_VALUES[Pawn];
        }

        let mut attackers = self.attacks_to(target, occupied);

        let mut i = 0;
        for _ in 1..32 {
            i += 1;
            swap_list[i] = SEE_PIECE_VALUES[current_attacker] - swap_list[i - 1];
            if swap_list[i].max(swap_list[i - 1]) < 0 {
                break;
            }

            // remove the attacker from the board (perform the capture)
            occupied ^= attacker_mask;

            // sliders behind the vacated square join the exchange
            if matches!(current_attacker, Pawn | Bishop | Queen) {
                attackers |= lookup_bishop(target, occupied) & bishops;
            }
            if matches!(current_attacker, Rook | Queen) {
                attackers |= lookup_rook(target, occupied) & rooks;
            }

            attackers &= occupied;
            let side_attackers = attackers & self.color_pieces(color);
            if side_attackers.is_empty() {
                break;
            }

            // least valuable attacker recaptures next
            for piece in PIECES {
                let candidates = side_attackers & self.pieces(piece);
                if candidates.is_not_empty() {
                    current_attacker = piece;
                    attacker_mask = candidates.first_square().bitboard();
                    break;
                }
            }
            color = !color;
        }

        i -= 1;
        while i != 0 {
            swap_list[i - 1] = -(swap_list[i].max(-swap_list[i - 1]));
            i -= 1;
        }
        swap_list[0]
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use crate::{board::Board, moves::Move};

    #[test]
    fn test_see() -> Result<(), Box<dyn Error>> {
        let test_cases = [
            (
                "1k1r3q/1ppn3p/p4b2/4p3/8/P2N2P1/1PP1R1BP/2K1Q3 w - - 0 1",
                "d3e5",
                -200,
            ),
            ("4k3/1n6/8/2n5/3P4/8/8/4K3 w - - 0 1", "d4c5", 200),
            (
                "q2n4/1b1p4/3k4/2pP4/4B3/5B2/6B1/2Q1K3 w - c6 0 1",
                "d5c6",
                0,
            ),
            ("2kr4/8/8/8/2pP4/8/3K4/5Q2 b - d3 0 1", "c4d3", 100),
            ("4k3/8/8/4r3/5P2/8/8/4K3 w - - 0 1", "f4e5", 500),
            ("4k3/8/3p4/4n3/8/4R3/8/4K3 w - - 0 1", "e3e5", -200),
            ("4k3/8/1p1p4/2p5/3P4/8/2R5/4K3 w - - 0 1", "d4c5", 0),
            ("4k3/8/1q1p4/2p5/3P4/8/2R5/4K3 w - - 0 1", "d4c5", 0),
            ("4k3/8/1q1p4/2p5/3P4/8/2R5/4K3 w - - 0 1", "c2c5", -400),
            ("4k3/8/1q1p4/2p5/3P4/8/2R5/2Q1K3 w - - 0 1", "d4c5", 100),
            ("4k3/8/1b1p4/2p5/3P4/4B3/5B2/4K3 w - - 0 1", "d4c5", 100),
            ("8/8/8/2pk4/3P4/4P3/8/4K3 b - - 0 1", "c5d4", 100),
            ("1k1rr3/8/8/8/8/8/3Q4/K2R4 w - - 0 1", "d2d8", 100),
            (
                "rnbqk1nr/pppp1ppp/8/2b1p3/2B1P3/8/PPPP1PPP/RNBQK1NR w KQkq - 0 1",
                "c4f7",
                -200,
            ),
            ("6k1/8/8/RrRrP3/8/8/8/6K1 b - - 0 1", "d5e5", -400),
        ];
        for (fen, coords, score) in test_cases {
            let board = Board::from_fen(fen)?;
            let mv = Move::from_coords(&board, coords).unwrap();
            assert_eq!(board.see(mv), score, "SEE mismatch for {coords} in {fen}");
        }
        Ok(())
    }
}
