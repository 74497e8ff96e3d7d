use super::eval_params::{EvalParams, GamePhase::*, PIECE_TABLES};
use super::Board;
use crate::lookup_tables::*;
use crate::types::{Color, Color::*, Piece::*, PIECES};
use lancer_bitboards::*;

/// Initial number of non-pawn, non-king pieces; the game-phase divisor.
const PHASE_PIECE_COUNT: i32 = 14;

impl Board {
    /// Static evaluation from the side to move's perspective.
    pub fn evaluate(&self, params: &EvalParams) -> i32 {
        let us = self.current_player();
        let them = !us;

        let mut eval = self.material_difference(params);
        eval += self.piece_placement();
        eval += self.pawn_structure(us, params) - self.pawn_structure(them, params);
        eval += self.rook_open_files(us, params) - self.rook_open_files(them, params);
        eval += self.bishop_pair(us, params) - self.bishop_pair(them, params);
        eval += self.king_shield(us, params) - self.king_shield(them, params);
        eval += self.king_restriction(us, params) - self.king_restriction(them, params);
        eval += self.supported_pieces(us, params) - self.supported_pieces(them, params);

        if self.in_check(us) {
            eval -= params.checked_penalty;
        }
        if self.in_check(them) {
            eval += params.checking_bonus;
        }

        eval
    }

    fn material_difference(&self, params: &EvalParams) -> i32 {
        let us = self.current_player();
        let mut sum = 0;
        for piece in [Pawn, Knight, Bishop, Rook, Queen] {
            sum += (self.colored(us, piece).count_ones() as i32
                - self.colored(!us, piece).count_ones() as i32)
                * params.piece_values[piece];
        }
        sum
    }

    /// Blends the early and endgame tables by the count of remaining
    /// non-pawn non-king pieces.
    fn game_phase_weights(&self) -> (i32, i32) {
        let remaining = (self.pieces(Knight)
            | self.pieces(Bishop)
            | self.pieces(Rook)
            | self.pieces(Queen))
        .count_ones() as i32;
        let early = remaining.min(PHASE_PIECE_COUNT);
        let end = (8 - remaining).clamp(0, 8);
        (early, end)
    }

    fn piece_placement(&self) -> i32 {
        let us = self.current_player();
        let (early_weight, end_weight) = self.game_phase_weights();

        let mut early = 0;
        let mut end = 0;
        for piece in PIECES {
            for square in self.colored(us, piece) {
                let index = if us == White { square } else { square.mirror() };
                early += PIECE_TABLES[(Early, piece)][index];
                end += PIECE_TABLES[(End, piece)][index];
            }
            for square in self.colored(!us, piece) {
                let index = if us == White { square.mirror() } else { square };
                early -= PIECE_TABLES[(Early, piece)][index];
                end -= PIECE_TABLES[(End, piece)][index];
            }
        }
        (early * early_weight + end * end_weight) / PHASE_PIECE_COUNT
    }

    fn pawn_structure(&self, color: Color, params: &EvalParams) -> i32 {
        let mut sum = 0;
        let pawns = self.colored(color, Pawn);
        let enemy_pawns = self.colored(!color, Pawn);

        // doubled pawns: each extra pawn on a file is penalized
        for file in FILES {
            sum -= params.doubled_pawn_penalty
                * (pawns & file).count_ones().saturating_sub(1) as i32;
        }

        for pawn in pawns {
            // isolated: no friendly pawn on an adjacent file
            if (pawns & adjacent_files(pawn.file())).is_empty() {
                sum -= params.isolated_pawn_penalty;
            }

            // passed: no enemy pawn ahead on the own or adjacent files
            let zone = (FILES[pawn.file()] | adjacent_files(pawn.file())) & ahead_of(color, pawn);
            if (enemy_pawns & zone).is_empty() {
                sum += params.passed_pawn_bonus;
            }

            // supporting: this pawn defends a friendly pawn
            if (lookup_pawn_attack(pawn, color) & pawns).is_not_empty() {
                sum += params.supporting_pawn_bonus;
            }
        }

        // supported: pawns defended by a friendly pawn
        sum += params.supported_pawn_bonus
            * (pawns & self.pawn_attacks(color)).count_ones() as i32;

        sum
    }

    fn rook_open_files(&self, color: Color, params: &EvalParams) -> i32 {
        let mut sum = 0;
        for rook in self.colored(color, Rook) {
            if (FILES[rook.file()] & self.occupied()).count_ones() == 1 {
                sum += params.rook_open_file_bonus;
            }
        }
        sum
    }

    fn bishop_pair(&self, color: Color, params: &EvalParams) -> i32 {
        let bishops = self.colored(color, Bishop);
        if (bishops & LIGHT_SQUARES).is_not_empty() && (bishops & DARK_SQUARES).is_not_empty() {
            params.bishop_pair_bonus
        } else {
            0
        }
    }

    fn king_shield(&self, color: Color, params: &EvalParams) -> i32 {
        let king = self.king_square(color);
        let back_rank = match color {
            White => 0,
            Black => 7,
        };
        let shield = lookup_king(king) & self.colored(color, Pawn);
        if king.rank() == back_rank && shield.count_ones() >= 2 {
            params.king_shield_bonus
        } else {
            -params.airy_king_penalty
        }
    }

    /// Squares next to the enemy king covered by this side's attacks.
    fn king_restriction(&self, color: Color, params: &EvalParams) -> i32 {
        let enemy_king_zone = lookup_king(self.king_square(!color));
        let covered = enemy_king_zone & self.all_attacks(color);
        covered.count_ones() as i32 * params.restrict_king_bonus
    }

    fn supported_pieces(&self, color: Color, params: &EvalParams) -> i32 {
        let backed = self.color_pieces(color)
            & self.colored(color, Pawn).inverse()
            & self.colored(color, King).inverse()
            & self.pawn_attacks(color);
        backed.count_ones() as i32 * params.supporting_piece_bonus
    }

    /// Union of every square this color attacks under the full occupancy.
    pub fn all_attacks(&self, color: Color) -> BitBoard {
        let occupied = self.occupied();
        let mut attacks = self.pawn_attacks(color) | lookup_king(self.king_square(color));
        for square in self.colored(color, Knight) {
            attacks |= lookup_knight(square);
        }
        for square in self.colored(color, Bishop) {
            attacks |= lookup_bishop(square, occupied);
        }
        for square in self.colored(color, Rook) {
            attacks |= lookup_rook(square, occupied);
        }
        for square in self.colored(color, Queen) {
            attacks |= lookup_queen(square, occupied);
        }
        attacks
    }
}

/// Squares strictly ahead of `square` from `color`'s viewpoint, all files.
fn ahead_of(color: Color, square: Square) -> BitBoard {
    let rank = square.rank() as u32;
    match color {
        White => BitBoard(u64::MAX.checked_shl(8 * (rank + 1)).unwrap_or(0)),
        Black => BitBoard((1u64 << (8 * rank)) - 1),
    }
}
