//! Core Connect-K game logic: colors, the board, the turn-taking game loop
//! and outcome tallies.

mod board;
mod color;
pub mod session;
pub mod stats;

pub use board::{Board, Cell, Grid, MoveError, ScratchMove, COLS, CONNECT, ROWS};
pub use color::Color;
pub use session::{Game, GameConfig, GameOutcome, GameRecord};
pub use stats::TrialStats;
