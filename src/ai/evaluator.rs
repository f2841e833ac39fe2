use std::fmt;
use std::str::FromStr;

use crate::error::AgentError;
use crate::game::{Board, Cell, Color, Grid};

/// Score awarded for a completed line of `connect` pieces.
pub const WIN_SCORE: f64 = 100_000.0;

/// Static evaluation of a board from one color's perspective.
///
/// Higher favors `color`. Implementations must be pure functions of the
/// board's contents.
pub trait Evaluator: Send {
    fn evaluate(&self, board: &Board, color: Color) -> f64;
}

/// Static heuristic used by the minimax, alpha-beta and expectimax players.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    /// [`StreakEvaluator`] with its reference weights.
    #[default]
    Streak,
    /// [`WindowEvaluator`].
    Window,
}

impl Heuristic {
    pub fn name(self) -> &'static str {
        match self {
            Heuristic::Streak => "streak",
            Heuristic::Window => "window",
        }
    }

    pub fn build(self) -> Box<dyn Evaluator> {
        match self {
            Heuristic::Streak => Box::new(StreakEvaluator::new()),
            Heuristic::Window => Box::new(WindowEvaluator),
        }
    }
}

impl FromStr for Heuristic {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "streak" => Ok(Heuristic::Streak),
            "window" => Ok(Heuristic::Window),
            _ => Err(AgentError::UnrecognizedEvaluator(s.to_string())),
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Linear weights of the streak evaluator's tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreakWeights {
    /// Completed line of `connect`.
    pub complete: f64,
    /// Run of `connect - 1`, or a `connect` window missing one piece.
    pub one_short: f64,
    /// Run of `connect - 2`, or a `connect - 1` window missing one piece.
    pub two_short: f64,
    /// Each `connect` window still winnable, i.e. holding own pieces and no opponent pieces.
    pub open_window: f64,
}

impl Default for StreakWeights {
    fn default() -> Self {
        StreakWeights {
            complete: WIN_SCORE,
            one_short: 100.0,
            two_short: 1.0,
            open_window: 0.1,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct StreakCounts {
    complete: usize,
    one_short: usize,
    two_short: usize,
    open_window: usize,
}

/// Pieces of each kind inside one window of a line.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    own: usize,
    opp: usize,
    empty: usize,
}

/// Reference pattern-counting heuristic.
///
/// Counts exact-length runs and gapped windows for both colors across every
/// row, column and diagonal. Any completed line for the opponent clamps the
/// score to `-complete`.
#[derive(Debug, Default, Clone)]
pub struct StreakEvaluator {
    weights: StreakWeights,
}

impl StreakEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: StreakWeights) -> Self {
        StreakEvaluator { weights }
    }

    fn count(lines: &[Vec<Cell>], k: usize, color: Color) -> StreakCounts {
        let own = color.to_cell();
        let mut counts = StreakCounts::default();

        for line in lines {
            for run in runs_of(line, own) {
                if run >= k {
                    counts.complete += 1;
                } else if run + 1 == k && run >= 2 {
                    counts.one_short += 1;
                } else if run + 2 == k && run >= 2 {
                    counts.two_short += 1;
                }
            }

            for t in window_tallies(line, k, color) {
                if t.own + 1 == k && t.empty == 1 {
                    counts.one_short += 1;
                }
                if t.opp == 0 && t.own > 0 {
                    counts.open_window += 1;
                }
            }

            if k >= 3 {
                for t in window_tallies(line, k - 1, color) {
                    if t.own + 2 == k && t.empty == 1 {
                        counts.two_short += 1;
                    }
                }
            }
        }

        counts
    }
}

impl Evaluator for StreakEvaluator {
    fn evaluate(&self, board: &Board, color: Color) -> f64 {
        let lines = board.lines();
        let k = board.connect();
        let mine = Self::count(&lines, k, color);
        let theirs = Self::count(&lines, k, color.other());
        let w = &self.weights;

        if theirs.complete > 0 {
            return -w.complete;
        }

        let diff = |a: usize, b: usize| a as f64 - b as f64;
        mine.complete as f64 * w.complete
            + w.one_short * diff(mine.one_short, theirs.one_short)
            + w.two_short * diff(mine.two_short, theirs.two_short)
            + w.open_window * diff(mine.open_window, theirs.open_window)
    }
}

/// Threat-window heuristic: scores every `connect`-cell window by how close
/// each side is to filling it, plus a bonus for center-column pieces.
#[derive(Debug, Default, Clone)]
pub struct WindowEvaluator;

impl WindowEvaluator {
    fn score_window(t: Tally, k: usize) -> f64 {
        if t.own + 1 == k && t.empty == 1 {
            50.0
        } else if t.own >= 2 && t.own + 2 == k && t.empty == 2 {
            10.0
        } else if t.opp + 1 == k && t.empty == 1 {
            -80.0
        } else if t.opp >= 2 && t.opp + 2 == k && t.empty == 2 {
            -10.0
        } else {
            0.0
        }
    }
}

impl Evaluator for WindowEvaluator {
    fn evaluate(&self, board: &Board, color: Color) -> f64 {
        match board.contains_k_in_a_row() {
            Some(winner) if winner == color => return WIN_SCORE,
            Some(_) => return -WIN_SCORE,
            None => {}
        }

        let own_cell = color.to_cell();
        let opp_cell = color.other().to_cell();
        let k = board.connect();
        let mut score = 0.0;

        // Center column bonus
        for &cell in board.column(board.width() / 2) {
            if cell == own_cell {
                score += 3.0;
            } else if cell == opp_cell {
                score -= 3.0;
            }
        }

        for line in board.lines() {
            for t in window_tallies(&line, k, color) {
                score += Self::score_window(t, k);
            }
        }

        score
    }
}

/// Lengths of the maximal runs of `cell` along a line.
fn runs_of(line: &[Cell], cell: Cell) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut len = 0;
    for &c in line {
        if c == cell {
            len += 1;
        } else if len > 0 {
            runs.push(len);
            len = 0;
        }
    }
    if len > 0 {
        runs.push(len);
    }
    runs
}

/// Tally every sliding window of `size` cells along a line from `color`'s side.
fn window_tallies(line: &[Cell], size: usize, color: Color) -> Vec<Tally> {
    if size == 0 || line.len() < size {
        return Vec::new();
    }
    let own = color.to_cell();
    line.windows(size)
        .map(|window| {
            window.iter().fold(Tally::default(), |mut t, &c| {
                if c == own {
                    t.own += 1;
                } else if c == Cell::Empty {
                    t.empty += 1;
                } else {
                    t.opp += 1;
                }
                t
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(moves: &[usize]) -> Board {
        let mut board = Board::standard();
        for &col in moves {
            board.add_piece(col, board.next_color()).unwrap();
        }
        board
    }

    #[test]
    fn runs_are_maximal() {
        use Cell::{Black as B, Empty as E, Red as R};
        assert_eq!(runs_of(&[R, R, E, R, B, R, R, R], R), vec![2, 1, 3]);
        assert!(runs_of(&[E, B], R).is_empty());
    }

    #[test]
    fn streak_empty_board_is_zero() {
        let board = Board::standard();
        let eval = StreakEvaluator::new();
        assert_eq!(eval.evaluate(&board, Color::Red), 0.0);
        assert_eq!(eval.evaluate(&board, Color::Black), 0.0);
    }

    #[test]
    fn streak_is_antisymmetric_without_wins() {
        let board = board_from(&[3, 2, 3, 4, 1]);
        let eval = StreakEvaluator::new();
        let red = eval.evaluate(&board, Color::Red);
        let black = eval.evaluate(&board, Color::Black);
        assert!((red + black).abs() < 1e-9, "red {red}, black {black}");
    }

    #[test]
    fn streak_center_preference() {
        let eval = StreakEvaluator::new();
        let center = board_from(&[3]);
        let inner = board_from(&[2]);
        let edge = board_from(&[0]);

        let c = eval.evaluate(&center, Color::Red);
        let i = eval.evaluate(&inner, Color::Red);
        let e = eval.evaluate(&edge, Color::Red);
        assert!(c > i && i > e, "center {c}, inner {i}, edge {e}");
    }

    #[test]
    fn streak_three_outweighs_twos() {
        let eval = StreakEvaluator::new();
        let mut three = Board::standard();
        let mut two = Board::standard();
        for col in 0..3 {
            three.add_piece(col, Color::Red).unwrap();
        }
        two.add_piece(0, Color::Red).unwrap();
        two.add_piece(1, Color::Red).unwrap();
        two.add_piece(5, Color::Red).unwrap();

        let s3 = eval.evaluate(&three, Color::Red);
        let s2 = eval.evaluate(&two, Color::Red);
        assert!(s3 >= 200.0, "open three should score two threat tiers, got {s3}");
        assert!(s3 > s2 + 100.0);
    }

    #[test]
    fn streak_gapped_three_counts_as_threat() {
        let eval = StreakEvaluator::new();
        let mut board = Board::standard();
        for col in [0, 1, 3] {
            board.add_piece(col, Color::Red).unwrap();
        }
        // R R . R: no run of three, but the window is one piece short
        assert!(eval.evaluate(&board, Color::Red) >= 100.0);
    }

    #[test]
    fn streak_completed_line_dominates() {
        let eval = StreakEvaluator::new();
        let mut board = Board::standard();
        for col in 0..4 {
            board.add_piece(col, Color::Red).unwrap();
        }
        assert!(eval.evaluate(&board, Color::Red) >= WIN_SCORE);
    }

    #[test]
    fn streak_opponent_win_clamps_to_loss() {
        let eval = StreakEvaluator::new();
        let mut board = Board::standard();
        for col in 0..4 {
            board.add_piece(col, Color::Red).unwrap();
        }
        // Black's own threats cannot dilute the loss
        for _ in 0..3 {
            board.add_piece(6, Color::Black).unwrap();
        }
        assert_eq!(eval.evaluate(&board, Color::Black), -WIN_SCORE);
    }

    #[test]
    fn streak_respects_connect_length() {
        let eval = StreakEvaluator::new();
        let mut board = Board::new(5, 5, 3);
        for col in 0..3 {
            board.add_piece(col, Color::Black).unwrap();
        }
        assert_eq!(eval.evaluate(&board, Color::Red), -WIN_SCORE);
    }

    #[test]
    fn window_empty_board_is_zero() {
        let board = Board::standard();
        let h = WindowEvaluator;
        assert_eq!(h.evaluate(&board, Color::Red), 0.0);
        assert_eq!(h.evaluate(&board, Color::Black), 0.0);
    }

    #[test]
    fn window_center_preference() {
        let h = WindowEvaluator;
        let center = board_from(&[3]);
        let edge = board_from(&[0]);

        let score_center = h.evaluate(&center, Color::Red);
        let score_edge = h.evaluate(&edge, Color::Red);
        assert!(
            score_center > score_edge,
            "Center ({score_center}) should score higher than edge ({score_edge})"
        );
    }

    #[test]
    fn window_three_in_a_row_scores_high() {
        let h = WindowEvaluator;
        let mut board = Board::standard();
        board.add_piece(0, Color::Red).unwrap();
        board.add_piece(1, Color::Red).unwrap();
        board.add_piece(2, Color::Red).unwrap();
        let score = h.evaluate(&board, Color::Red);
        assert!(score > 40.0, "3-in-a-row should score high, got {score}");
    }

    #[test]
    fn window_scores_wins() {
        let h = WindowEvaluator;
        let mut board = Board::standard();
        for _ in 0..4 {
            board.add_piece(6, Color::Black).unwrap();
        }
        assert_eq!(h.evaluate(&board, Color::Black), WIN_SCORE);
        assert_eq!(h.evaluate(&board, Color::Red), -WIN_SCORE);
    }

    #[test]
    fn heuristic_names_round_trip() {
        for heuristic in [Heuristic::Streak, Heuristic::Window] {
            assert_eq!(heuristic.name().parse::<Heuristic>().unwrap(), heuristic);
        }
        assert_eq!(" Window ".parse::<Heuristic>().unwrap(), Heuristic::Window);
        let err = "material".parse::<Heuristic>().unwrap_err();
        assert!(matches!(err, AgentError::UnrecognizedEvaluator(ref name) if name == "material"));
    }

    #[test]
    fn heuristic_builds_matching_evaluator() {
        let mut board = Board::standard();
        for col in [0, 1, 2, 3] {
            board.add_piece(col, Color::Black).unwrap();
        }
        for heuristic in [Heuristic::Streak, Heuristic::Window] {
            let eval = heuristic.build();
            assert!(eval.evaluate(&board, Color::Black) >= WIN_SCORE, "{heuristic}");
        }

        let mut quiet = Board::standard();
        quiet.add_piece(3, Color::Red).unwrap();
        let window = Heuristic::Window.build().evaluate(&quiet, Color::Red);
        assert_eq!(window, WindowEvaluator.evaluate(&quiet, Color::Red));
    }
}
