use crate::error::AgentError;
use crate::game::{Board, Color};

/// Uniform interface the game loop uses to query every kind of player.
pub trait Agent {
    /// Choose a column to play on `board`.
    ///
    /// `Ok(None)` means no move is possible (the board is full). The board is
    /// only borrowed; hypothetical exploration happens on private copies.
    fn get_move(&mut self, board: &Board) -> Result<Option<usize>, AgentError>;

    /// Assign the color this player moves with.
    fn set_color(&mut self, color: Color);

    /// Color currently assigned, if any.
    fn color(&self) -> Option<Color>;

    /// Return the player's display name.
    fn name(&self) -> &str;

    /// Called by the game loop before the first move of every game.
    fn new_game(&mut self) {}

    /// Whether moves come from a person rather than an algorithm.
    fn is_human(&self) -> bool {
        false
    }
}
