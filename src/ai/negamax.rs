use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::game::{Board, Color, Grid};

use super::evaluator::{Evaluator, WIN_SCORE};

/// Tree search variant run by [`Searcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Plain negamax over the full tree.
    Minimax,
    /// Negamax with an (alpha, beta) pruning window. Same values as `Minimax`.
    AlphaBeta,
    /// Own nodes maximize; opponent nodes average over every legal reply.
    Expectimax,
}

/// Fixed-depth adversarial searcher scored by a pluggable [`Evaluator`].
///
/// Exploration happens on a private copy of the board with strict
/// play-then-undo, so the caller's board is never touched. Root moves are
/// shuffled before the max-scan to break ties uniformly at random.
pub struct Searcher {
    evaluator: Box<dyn Evaluator>,
    rng: StdRng,
    last_nodes: u64,
}

impl Searcher {
    pub fn new(evaluator: Box<dyn Evaluator>) -> Self {
        Searcher {
            evaluator,
            rng: StdRng::from_os_rng(),
            last_nodes: 0,
        }
    }

    /// Searcher whose tie-breaks are reproducible.
    pub fn with_seed(evaluator: Box<dyn Evaluator>, seed: u64) -> Self {
        Searcher {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(evaluator)
        }
    }

    pub fn evaluator(&self) -> &dyn Evaluator {
        self.evaluator.as_ref()
    }

    /// Nodes visited by the most recent search.
    pub fn last_node_count(&self) -> u64 {
        self.last_nodes
    }

    /// Best column for `color` searching `depth` plies, or `None` when the
    /// board has no legal moves.
    pub fn best_move(
        &mut self,
        depth: usize,
        board: &Board,
        color: Color,
        alpha_beta: bool,
    ) -> Option<usize> {
        let mode = if alpha_beta {
            SearchMode::AlphaBeta
        } else {
            SearchMode::Minimax
        };
        self.search(depth, board, color, mode).map(|(col, _)| col)
    }

    /// Search and return the chosen column with its value for `color`.
    ///
    /// A depth of zero is treated as one so a move is always produced.
    pub fn search(
        &mut self,
        depth: usize,
        board: &Board,
        color: Color,
        mode: SearchMode,
    ) -> Option<(usize, f64)> {
        let depth = depth.max(1);
        let mut scratch = board.clone();
        let mut moves = scratch.legal_moves();
        if moves.is_empty() {
            return None;
        }
        moves.shuffle(&mut self.rng);

        let mut ctx = Context::new(self.evaluator.as_ref(), &scratch);
        let mut best: Option<(usize, f64)> = None;

        for col in moves {
            let Ok(mut child) = scratch.scratch(col, color) else {
                continue;
            };
            // Every root child gets the full window so its value is exact.
            let value = match mode {
                SearchMode::Minimax => -ctx.minimax(&mut child, depth - 1, color.other()),
                SearchMode::AlphaBeta => -ctx.alpha_beta(
                    &mut child,
                    depth - 1,
                    color.other(),
                    f64::NEG_INFINITY,
                    f64::INFINITY,
                ),
                SearchMode::Expectimax => {
                    ctx.expectimax(&mut child, depth - 1, color.other(), color)
                }
            };
            trace!(col, value, "root move scored");

            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((col, value));
            }
        }

        self.last_nodes = ctx.nodes;
        if let Some((col, value)) = best {
            debug!(?mode, depth, col, value, nodes = ctx.nodes, "search complete");
        }
        best
    }
}

/// Per-search state: move ordering and node accounting.
struct Context<'a> {
    evaluator: &'a dyn Evaluator,
    /// Columns ordered center-first.
    order: Vec<usize>,
    /// A line completed before the search started ends every branch.
    root_winner: Option<Color>,
    nodes: u64,
}

impl<'a> Context<'a> {
    fn new(evaluator: &'a dyn Evaluator, board: &Board) -> Self {
        let center = board.width() / 2;
        let mut order: Vec<usize> = (0..board.width()).collect();
        order.sort_by_key(|&col| col.abs_diff(center));
        Context {
            evaluator,
            order,
            root_winner: board.contains_k_in_a_row(),
            nodes: 0,
        }
    }

    /// Score of `board` when it is terminal or the depth is exhausted.
    ///
    /// Decided games never reach the evaluator. A win is worth
    /// `WIN_SCORE + depth` to the winner, above any static score, and a full
    /// board is a draw at 0.
    fn leaf_score(&self, board: &Board, depth: usize, perspective: Color) -> Option<f64> {
        let winner = self.root_winner.or_else(|| board.last_move_wins());
        match winner {
            Some(w) if w == perspective => Some(WIN_SCORE + depth as f64),
            Some(_) => Some(-(WIN_SCORE + depth as f64)),
            None if board.is_full() => Some(0.0),
            None if depth == 0 => Some(self.evaluator.evaluate(board, perspective)),
            None => None,
        }
    }

    fn minimax(&mut self, board: &mut Board, depth: usize, color: Color) -> f64 {
        self.nodes += 1;
        if let Some(score) = self.leaf_score(board, depth, color) {
            return score;
        }

        let mut best = f64::NEG_INFINITY;
        for i in 0..self.order.len() {
            let Ok(mut child) = board.scratch(self.order[i], color) else {
                continue;
            };
            best = best.max(-self.minimax(&mut child, depth - 1, color.other()));
        }
        best
    }

    fn alpha_beta(
        &mut self,
        board: &mut Board,
        depth: usize,
        color: Color,
        mut alpha: f64,
        beta: f64,
    ) -> f64 {
        self.nodes += 1;
        if let Some(score) = self.leaf_score(board, depth, color) {
            return score;
        }

        let mut best = f64::NEG_INFINITY;
        for i in 0..self.order.len() {
            let Ok(mut child) = board.scratch(self.order[i], color) else {
                continue;
            };
            let value = -self.alpha_beta(&mut child, depth - 1, color.other(), -beta, -alpha);
            best = best.max(value);
            alpha = alpha.max(value);
            if beta <= alpha {
                break;
            }
        }
        best
    }

    /// Value for `root` of the position with `color` to move.
    fn expectimax(&mut self, board: &mut Board, depth: usize, color: Color, root: Color) -> f64 {
        self.nodes += 1;
        if let Some(score) = self.leaf_score(board, depth, root) {
            return score;
        }

        let mut best = f64::NEG_INFINITY;
        let mut total = 0.0;
        let mut replies = 0usize;
        for i in 0..self.order.len() {
            let Ok(mut child) = board.scratch(self.order[i], color) else {
                continue;
            };
            let value = self.expectimax(&mut child, depth - 1, color.other(), root);
            best = best.max(value);
            total += value;
            replies += 1;
        }

        if color == root {
            best
        } else {
            total / replies as f64
        }
    }
}
