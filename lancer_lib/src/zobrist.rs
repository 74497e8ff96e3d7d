use once_cell::sync::OnceCell;
use rand::prelude::*;

use crate::types::{CastlingRights, Color, Piece};
use lancer_bitboards::{BitBoard, Square};

// 64 squares x 6 kinds x 2 colors, 1 side to move, 16 castling states, 8 ep files
const ZOBRIST_COUNT: usize = 64 * 6 * 2 + 1 + 16 + 8;

static ZOBRIST_NUMBERS: OnceCell<Vec<u64>> = OnceCell::new();

pub fn zobrist_numbers() -> &'static Vec<u64> {
    ZOBRIST_NUMBERS.get_or_init(initialise_zobrist_numbers)
}

fn initialise_zobrist_numbers() -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(0x1A2CE581CE);
    let mut numbers = vec![0; ZOBRIST_COUNT];

    rng.fill(&mut numbers[..]);

    numbers
}

pub fn zobrist_piece(piece: Piece, color: Color, square: Square) -> u64 {
    zobrist_numbers()[64 * 2 * piece.index() + 64 * (color as usize) + square as usize]
}

pub fn zobrist_player() -> u64 {
    zobrist_numbers()[64 * 6 * 2]
}

pub fn zobrist_castling(rights: CastlingRights) -> u64 {
    zobrist_numbers()[64 * 6 * 2 + 1 + rights.zobrist_index()]
}

pub fn zobrist_enpassant(mask: BitBoard) -> u64 {
    zobrist_numbers()[64 * 6 * 2 + 1 + 16 + mask.first_square().file()]
}
