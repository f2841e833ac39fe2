use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::Agent;
use crate::error::GameError;

use super::board::{Board, CONNECT, COLS, ROWS};
use super::color::Color;

/// Board shape and turn rules for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub height: usize,
    pub width: usize,
    pub connect: usize,
    /// Illegal move requests tolerated per turn before the game is abandoned.
    pub max_illegal_attempts: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            height: ROWS,
            width: COLS,
            connect: CONNECT,
            max_illegal_attempts: 3,
        }
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Color),
    Draw,
}

/// What happened in a finished game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub outcome: GameOutcome,
    pub num_moves: usize,
    /// Columns played, oldest first.
    pub moves: Vec<usize>,
}

/// Turn-taking driver between two agents. The first agent plays Red.
pub struct Game {
    config: GameConfig,
    board: Board,
    players: [Box<dyn Agent>; 2],
}

impl Game {
    pub fn new(config: GameConfig, mut first: Box<dyn Agent>, mut second: Box<dyn Agent>) -> Self {
        first.set_color(Color::Red);
        second.set_color(Color::Black);
        Game {
            board: Board::new(config.height, config.width, config.connect),
            config,
            players: [first, second],
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self, color: Color) -> &dyn Agent {
        self.players[Self::seat(color)].as_ref()
    }

    fn seat(color: Color) -> usize {
        match color {
            Color::Red => 0,
            Color::Black => 1,
        }
    }

    /// Play a fresh game to completion.
    pub fn play(&mut self) -> Result<GameRecord, GameError> {
        self.play_with(|_, _, _| {})
    }

    /// Play a fresh game, calling `observer(board, mover, column)` after
    /// every applied move.
    pub fn play_with<F>(&mut self, mut observer: F) -> Result<GameRecord, GameError>
    where
        F: FnMut(&Board, Color, usize),
    {
        self.board = Board::new(self.config.height, self.config.width, self.config.connect);
        for player in &mut self.players {
            player.new_game();
        }

        let outcome = loop {
            let color = self.board.next_color();
            let col = self.request_move(color)?;
            if self.board.add_piece(col, color).is_err() {
                return Err(self.illegal_moves_error(color, self.config.max_illegal_attempts));
            }
            debug!(%color, col, moves = self.board.num_moves(), "move applied");
            observer(&self.board, color, col);

            if let Some(winner) = self.board.contains_k_in_a_row() {
                break GameOutcome::Winner(winner);
            }
            if self.board.is_full() {
                break GameOutcome::Draw;
            }
        };

        match outcome {
            GameOutcome::Winner(color) => info!(
                winner = %color,
                player = self.player(color).name(),
                moves = self.board.num_moves(),
                "game over"
            ),
            GameOutcome::Draw => info!(moves = self.board.num_moves(), "game over, draw"),
        }

        Ok(GameRecord {
            outcome,
            num_moves: self.board.num_moves(),
            moves: self.board.moves().to_vec(),
        })
    }

    /// Ask `color`'s agent for a legal column, re-asking after illegal answers.
    fn request_move(&mut self, color: Color) -> Result<usize, GameError> {
        let max = self.config.max_illegal_attempts;
        let seat = Self::seat(color);

        for attempt in 1..=max {
            match self.players[seat].get_move(&self.board)? {
                Some(col) if self.board.is_legal_move(col) => return Ok(col),
                Some(col) => warn!(%color, col, attempt, "illegal move rejected"),
                None => warn!(%color, attempt, "no move returned on an open board"),
            }
        }
        Err(self.illegal_moves_error(color, max))
    }

    fn illegal_moves_error(&self, color: Color, attempts: usize) -> GameError {
        GameError::TooManyIllegalMoves {
            player: self.player(color).name().to_string(),
            color,
            attempts,
        }
    }
}
