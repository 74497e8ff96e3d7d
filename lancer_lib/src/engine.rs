use rand::prelude::*;

use crate::board::eval_params::EvalParams;
use crate::board::Board;
use crate::moves::Move;
use crate::search::{Search, SearchLimits};
use crate::types::Piece::*;

pub const ENGINE_AUTHOR: &str = "the lancer authors";

/// The capability set every engine variant provides, decoupling the UCI
/// controller from the move-selection strategy.
pub trait Engine {
    fn name(&self) -> String;
    fn author(&self) -> &'static str {
        ENGINE_AUTHOR
    }
    /// Clear any state carried between searches for a fresh game.
    fn new_game(&mut self);
    /// Push the current option values down into the engine.
    fn set_params(&mut self, params: EvalParams);
    /// Static evaluation of a position from the side to move's perspective.
    fn evaluate(&mut self, board: &Board) -> i32;
    /// Find a best move under the given limits, blocking until done.
    fn go(&mut self, board: Board, limits: SearchLimits) -> Move;
}

/// The primary engine: iterative-deepening principal-variation search.
pub struct SearchEngine {
    search: Search,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            search: Search::new(Board::new()).output(true),
        }
    }

    /// A variant that suppresses info output, for tests and benches.
    pub fn silent() -> Self {
        Self {
            search: Search::new(Board::new()),
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for SearchEngine {
    fn name(&self) -> String {
        format!("Lancer {}", env!("CARGO_PKG_VERSION"))
    }

    fn new_game(&mut self) {
        self.search.new_game();
        self.search.game = Board::new();
    }

    fn set_params(&mut self, params: EvalParams) {
        self.search.set_params(params);
    }

    fn evaluate(&mut self, board: &Board) -> i32 {
        board.evaluate(&self.search.eval_params())
    }

    fn go(&mut self, board: Board, limits: SearchLimits) -> Move {
        self.search.game = board;
        self.search.limits = limits;
        let (_, best_move) = self.search.search();
        best_move
    }
}

fn material_difference(board: &Board, params: &EvalParams) -> i32 {
    let us = board.current_player();
    let mut sum = 0;
    for piece in [Pawn, Knight, Bishop, Rook, Queen] {
        sum += (board.colored(us, piece).count_ones() as i32
            - board.colored(!us, piece).count_ones() as i32)
            * params.piece_values[piece];
    }
    sum
}

/// Baseline: one-ply material maximizer.
pub struct MaterialEngine {
    params: EvalParams,
}

impl MaterialEngine {
    pub fn new() -> Self {
        Self {
            params: EvalParams::default(),
        }
    }
}

impl Default for MaterialEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for MaterialEngine {
    fn name(&self) -> String {
        format!("Lancer-material {}", env!("CARGO_PKG_VERSION"))
    }

    fn new_game(&mut self) {}

    fn set_params(&mut self, params: EvalParams) {
        self.params = params;
    }

    fn evaluate(&mut self, board: &Board) -> i32 {
        material_difference(board, &self.params)
    }

    fn go(&mut self, mut board: Board, _limits: SearchLimits) -> Move {
        let moves = board.legal_moves();
        let mut best_move = Move::null();
        let mut best_score = i32::MIN;
        for mv in moves.iter() {
            board.make_move(mv);
            let score = -material_difference(&board, &self.params);
            board.unmake_move(mv);
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
        }
        best_move
    }
}

/// Baseline: uniformly random legal move.
pub struct RandomEngine;

impl Engine for RandomEngine {
    fn name(&self) -> String {
        format!("Lancer-random {}", env!("CARGO_PKG_VERSION"))
    }

    fn new_game(&mut self) {}

    fn set_params(&mut self, _params: EvalParams) {}

    fn evaluate(&mut self, _board: &Board) -> i32 {
        0
    }

    fn go(&mut self, mut board: Board, _limits: SearchLimits) -> Move {
        let moves = board.legal_moves();
        if moves.is_empty() {
            return Move::null();
        }
        let index = thread_rng().gen_range(0..moves.len());
        moves[index].mv
    }
}
