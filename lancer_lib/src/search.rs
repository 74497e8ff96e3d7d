use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use crate::board::eval_params::{EvalParams, DRAW_SCORE};
use crate::board::Board;
use crate::history_tables::{apply_history_bonus, apply_history_malus, HistoryTable, HISTORY_MAX};
use crate::moves::{KillerMoves, Move, MoveList, MAX_MOVES, MAX_PLY};
use crate::transposition_table::{NodeType::*, TranspositionTable, TT_DEFAULT_BITS};

/// Cooperative stop flag shared between the controller and the worker; the
/// search polls it at every node and unwinds with its best root move.
pub static ABORT_SEARCH: AtomicBool = AtomicBool::new(false);
pub static NODE_COUNT: AtomicUsize = AtomicUsize::new(0);

const INF: i32 = i32::MAX - 1;
const MINUS_INF: i32 = -INF;

pub const MAX_SEARCH_DEPTH: usize = 64;

// move ordering tiers
const TT_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_SCORE: i32 = 100_000;
const FIRST_KILLER_SCORE: i32 = 90_000;
const SECOND_KILLER_SCORE: i32 = 80_000;

// margin kept in hand when deciding whether another depth fits the budget
const TIME_BUFFER_MS: u64 = 5;
// scores within this distance of the mate score are mate-in-N values and get
// re-distanced relative to the probing ply
const MATE_WINDOW: i32 = 500;

#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    pub depth: Option<usize>,
    pub nodes: Option<usize>,
    pub movetime: Option<u64>,
}

pub const PV_MAX_LEN: usize = 16;

#[derive(Copy, Clone, Default, Debug)]
pub struct PrincipalVariation {
    pub len: usize,
    pub moves: [Move; PV_MAX_LEN],
}

impl PrincipalVariation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for PrincipalVariation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, m) in self.moves.iter().take(self.len).enumerate() {
            if i == 0 {
                write!(f, "{}", m.coords())?;
            } else {
                write!(f, " {}", m.coords())?;
            }
        }
        Ok(())
    }
}

pub struct Search {
    pub game: Board,
    params: EvalParams,
    transposition_table: TranspositionTable,
    killer_moves: KillerMoves<2>,
    history: HistoryTable,
    move_lists: Vec<MoveList>,
    pub limits: SearchLimits,
    start_time: Instant,
    abort: bool,
    output: bool,
}

impl Search {
    pub fn new(game: Board) -> Self {
        Self {
            game,
            params: EvalParams::default(),
            transposition_table: TranspositionTable::new(TT_DEFAULT_BITS),
            killer_moves: KillerMoves::new(),
            history: HistoryTable::default(),
            move_lists: vec![MoveList::new(); MAX_PLY],
            limits: SearchLimits::default(),
            start_time: Instant::now(),
            abort: false,
            output: false,
        }
    }

    pub fn params(mut self, params: EvalParams) -> Self {
        self.params = params;
        self
    }

    pub fn limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn output(mut self, output: bool) -> Self {
        self.output = output;
        self
    }

    pub fn set_params(&mut self, params: EvalParams) {
        self.params = params;
    }

    pub fn eval_params(&self) -> EvalParams {
        self.params
    }

    /// Clears the tables that survive across searches within a game.
    pub fn new_game(&mut self) {
        self.transposition_table.clear();
        self.killer_moves.clear();
        self.history.clear();
    }

    /// Iterative deepening driver. Returns the score and best move of the
    /// last fully completed depth; an interrupted first depth falls back to
    /// the first legal root move.
    pub fn search(&mut self) -> (i32, Move) {
        self.start_time = Instant::now();
        self.abort = false;
        let max_depth = self
            .limits
            .depth
            .unwrap_or(MAX_SEARCH_DEPTH)
            .min(MAX_SEARCH_DEPTH);

        let root_moves = self.game.legal_moves();
        if root_moves.is_empty() {
            return (DRAW_SCORE, Move::null());
        }
        let mut best_move = root_moves[0].mv;
        let mut best_score = MINUS_INF;

        let start = self.start_time;
        for depth in 2..=max_depth.max(2) {
            let depth_start = Instant::now();
            let mut pv = PrincipalVariation::new();

            let score = self.negamax(MINUS_INF, INF, depth as i32, 0, &mut pv);

            if self.aborting() {
                // results from a partial depth are not trusted
                break;
            }

            best_score = score;
            if !pv.moves[0].is_null() {
                best_move = pv.moves[0];
            }

            if self.output {
                let elapsed = start.elapsed();
                let nodes = NODE_COUNT.load(Ordering::Relaxed);
                let mate_distance = self.params.mate_score - score.abs();
                let score_string = if mate_distance < MATE_WINDOW {
                    format!("mate {}", score.signum() * ((mate_distance + 1) / 2))
                } else {
                    format!("cp {score}")
                };
                println!(
                    "info depth {depth} score {score_string} time {} nodes {} nps {} pv {pv}",
                    elapsed.as_millis(),
                    nodes,
                    (nodes as f64 / elapsed.as_secs_f64().max(1e-6)) as usize,
                );
            }

            // another depth is attempted only if a tenfold longer iteration
            // still fits the per-move budget
            if let Some(cap) = self.limits.movetime {
                let depth_elapsed = depth_start.elapsed().as_millis() as u64;
                if depth_elapsed * 10 + TIME_BUFFER_MS >= cap {
                    break;
                }
            }
        }

        (best_score, best_move)
    }

    #[inline(always)]
    fn aborting(&self) -> bool {
        self.abort || ABORT_SEARCH.load(Ordering::Relaxed)
    }

    fn should_abort(&mut self) -> bool {
        // time and node limits are re-checked every 2048 nodes
        let nodes = NODE_COUNT.load(Ordering::Relaxed);
        if nodes & 2047 == 2047 {
            if let Some(cap) = self.limits.movetime {
                if self.start_time.elapsed().as_millis() as u64 >= cap {
                    self.abort = true;
                }
            }
            if let Some(max_nodes) = self.limits.nodes {
                if nodes >= max_nodes {
                    self.abort = true;
                }
            }
        }
        self.aborting()
    }

    /// Principal-variation search: the first legal move gets the full
    /// window, later moves a null window with a full re-search when they
    /// land inside (alpha, beta).
    fn negamax(
        &mut self,
        mut alpha: i32,
        beta: i32,
        depth: i32,
        ply: usize,
        pv: &mut PrincipalVariation,
    ) -> i32 {
        if self.should_abort() && ply != 0 {
            return 0;
        }

        if depth <= 0 {
            pv.len = 0;
            return self.quiesce(alpha, beta, ply);
        }
        if ply >= MAX_PLY {
            return self.game.evaluate(&self.params);
        }

        NODE_COUNT.fetch_add(1, Ordering::Relaxed);

        // 50-move rule and repetition of a game position are draws
        if ply != 0 && (self.game.halfmove_clock() >= 100 || self.game.is_repetition()) {
            pv.len = 0;
            return DRAW_SCORE;
        }

        // transposition table: prune on sufficient depth, keep the hash move
        let hash = self.game.hash();
        let mut tt_move = Move::null();
        if let Some(entry) = self.transposition_table.get(hash) {
            if entry.depth as i32 >= depth && ply != 0 {
                let score = self.tt_score_to_node(entry.score, ply);
                match entry.node_type {
                    Exact => {
                        pv.len = 0;
                        return score;
                    }
                    LowerBound if score >= beta => return beta,
                    UpperBound if score <= alpha => return alpha,
                    _ => {}
                }
            }
            tt_move = entry.best_move;
        }

        let color = self.game.current_player();
        let in_check_before = self.game.in_check(color);

        self.game.generate_pseudo_legal_into(&mut self.move_lists[ply]);
        self.score_moves(ply, tt_move);

        let mut line = PrincipalVariation::new();
        let mut best_move = Move::null();
        let mut node_type = UpperBound;
        let mut legal_moves = 0;
        let mut tried_quiets = [Move::null(); MAX_MOVES];
        let mut tried_quiet_count = 0;

        for i in 0..self.move_lists[ply].len() {
            let mv = self.move_lists[ply].pick_move(i);

            self.game.make_move(mv);
            if self.game.in_check(color) {
                self.game.unmake_move(mv);
                continue;
            }
            legal_moves += 1;

            let score = if legal_moves == 1 {
                -self.negamax(-beta, -alpha, depth - 1, ply + 1, &mut line)
            } else {
                // late move reductions for quiets when neither side is in
                // check and the move is no killer
                let gives_check = self.game.in_check(!color);
                let is_killer = self.killer_moves[ply].contains(&mv);
                let reduction =
                    if depth >= 3 && mv.is_quiet() && !in_check_before && !gives_check && !is_killer
                    {
                        (depth / 2).min(2)
                    } else {
                        0
                    };

                let mut score =
                    -self.negamax(-alpha - 1, -alpha, depth - 1 - reduction, ply + 1, &mut line);
                if score > alpha && score < beta {
                    score = -self.negamax(-beta, -alpha, depth - 1, ply + 1, &mut line);
                }
                score
            };
            self.game.unmake_move(mv);

            if self.aborting() && ply != 0 {
                return 0;
            }

            if score >= beta {
                if mv.is_quiet() {
                    // quiets that cut get a killer slot and a history bonus,
                    // the quiets tried before them a matching penalty
                    self.killer_moves.push(mv, ply);
                    let bonus = (depth * depth).min(HISTORY_MAX as i32) as i16;
                    apply_history_bonus(&mut self.history[(color, mv)], bonus);
                    for quiet in tried_quiets.iter().take(tried_quiet_count) {
                        apply_history_malus(&mut self.history[(color, *quiet)], bonus);
                    }
                }
                let tt_score = self.node_score_to_tt(beta, ply);
                self.transposition_table
                    .set(hash, mv, depth as i8, tt_score, LowerBound);
                return beta;
            }
            if score > alpha {
                alpha = score;
                best_move = mv;
                node_type = Exact;

                pv.moves[0] = mv;
                let tail = line.len.min(PV_MAX_LEN - 1);
                pv.moves[1..=tail].copy_from_slice(&line.moves[..tail]);
                pv.len = tail + 1;
            }
            if mv.is_quiet() {
                tried_quiets[tried_quiet_count] = mv;
                tried_quiet_count += 1;
            }
        }

        if legal_moves == 0 {
            pv.len = 0;
            return if in_check_before {
                // checkmate, discounted so shorter mates score higher
                -(self.params.mate_score - ply as i32)
            } else {
                DRAW_SCORE
            };
        }

        let tt_score = self.node_score_to_tt(alpha, ply);
        self.transposition_table
            .set(hash, best_move, depth as i8, tt_score, node_type);
        alpha
    }

    /// Stand pat on the static evaluation, then captures ordered by
    /// MVV/LVA, skipping exchanges the static exchange evaluation refutes.
    fn quiesce(&mut self, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if self.should_abort() {
            return 0;
        }
        NODE_COUNT.fetch_add(1, Ordering::Relaxed);

        let stand_pat = self.game.evaluate(&self.params);
        if ply >= MAX_PLY {
            return stand_pat;
        }
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        let color = self.game.current_player();
        self.game.generate_captures_into(&mut self.move_lists[ply]);
        {
            let params = &self.params;
            self.move_lists[ply].inner_mut().iter_mut().for_each(|sm| {
                let victim = if sm.mv.is_capture() {
                    params.piece_values[sm.mv.captured()]
                } else {
                    0
                };
                sm.score = 10 * victim - params.piece_values[sm.mv.piece()];
            });
        }

        for i in 0..self.move_lists[ply].len() {
            let mv = self.move_lists[ply].pick_move(i);

            // a capture that loses the exchange outright is skipped
            if mv.is_capture() && self.game.see(mv) < 0 {
                continue;
            }

            self.game.make_move(mv);
            if self.game.in_check(color) {
                self.game.unmake_move(mv);
                continue;
            }
            let score = -self.quiesce(-beta, -alpha, ply + 1);
            self.game.unmake_move(mv);

            if score >= beta {
                return beta;
            }
            alpha = alpha.max(score);
        }
        alpha
    }

    fn score_moves(&mut self, ply: usize, tt_move: Move) {
        let color = self.game.current_player();
        let killers = self.killer_moves[ply];
        let params = &self.params;
        let history = &self.history;
        self.move_lists[ply].inner_mut().iter_mut().for_each(|sm| {
            let mv = sm.mv;
            sm.score = if mv == tt_move {
                TT_MOVE_SCORE
            } else if mv.is_capture() {
                CAPTURE_SCORE + 10 * params.piece_values[mv.captured()]
                    - params.piece_values[mv.piece()]
            } else if mv == killers[0] {
                FIRST_KILLER_SCORE
            } else if mv == killers[1] {
                SECOND_KILLER_SCORE
            } else {
                history[(color, mv)] as i32
            };
        });
    }

    /// Mate scores are stored relative to the storing node and re-distanced
    /// relative to the probing node.
    fn tt_score_to_node(&self, score: i32, ply: usize) -> i32 {
        if score > self.params.mate_score - MATE_WINDOW {
            score - ply as i32
        } else if score < -self.params.mate_score + MATE_WINDOW {
            score + ply as i32
        } else {
            score
        }
    }

    fn node_score_to_tt(&self, score: i32, ply: usize) -> i32 {
        if score > self.params.mate_score - MATE_WINDOW {
            score + ply as i32
        } else if score < -self.params.mate_score + MATE_WINDOW {
            score - ply as i32
        } else {
            score
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_search(fen: &str, depth: usize) -> (i32, Move, Board) {
        ABORT_SEARCH.store(false, Ordering::Relaxed);
        let board = Board::from_fen(fen).unwrap();
        let mut search = Search::new(board.clone()).limits(SearchLimits {
            depth: Some(depth),
            ..Default::default()
        });
        let (score, mv) = search.search();
        (score, mv, board)
    }

    #[test]
    fn test_startpos_returns_legal_move() {
        let (_, mv, board) = run_search(crate::board::STARTPOS_FEN, 4);
        let mut board = board;
        assert!(board.legal_moves().contains(mv));
    }

    #[test]
    fn test_finds_mate_in_one() {
        // back-rank mate with the rook
        let (score, mv, _) = run_search("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 4);
        assert_eq!(mv.coords(), "a1a8");
        assert!(score > EvalParams::default().mate_score - MATE_WINDOW);
    }

    #[test]
    fn test_avoids_hanging_the_queen() {
        // the d5 pawn is defended by the queen, so taking it loses the knight
        let (_, mv, _) = run_search(
            "rnbqkbnr/ppp1pppp/8/3p4/8/2N5/PPPPPPPP/R1BQKBNR w KQkq - 0 2",
            4,
        );
        assert_ne!(mv.coords(), "c3d5");
    }

    #[test]
    fn test_no_legal_moves_returns_null() {
        let (score, mv, _) = run_search(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 0 1",
            2,
        );
        assert!(mv.is_null());
        assert_eq!(score, DRAW_SCORE);
    }

    #[test]
    fn test_node_limit_terminates() {
        ABORT_SEARCH.store(false, Ordering::Relaxed);
        let board = Board::new();
        let mut search = Search::new(board).limits(SearchLimits {
            depth: Some(MAX_SEARCH_DEPTH),
            nodes: Some(20_000),
            ..Default::default()
        });
        // terminates quickly instead of searching depth 64 to completion
        let (_, mv) = search.search();
        assert!(!mv.is_null());
        ABORT_SEARCH.store(false, Ordering::Relaxed);
    }

    #[test]
    fn test_prefers_winning_capture() {
        // white can win a rook with the bishop
        let (score, _, _) = run_search("4k3/8/8/4r3/8/8/8/B3K3 w - - 0 1", 4);
        assert!(score > 300);
    }
}
