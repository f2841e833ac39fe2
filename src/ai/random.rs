use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::error::AgentError;
use crate::game::{Board, Color};

use super::agent::Agent;

/// An agent that selects uniformly at random from legal moves.
pub struct RandomAgent {
    name: String,
    color: Option<Color>,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            name: "Random".to_string(),
            color: None,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomAgent {
            rng: StdRng::seed_from_u64(seed),
            ..Self::new()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn get_move(&mut self, board: &Board) -> Result<Option<usize>, AgentError> {
        Ok(board.legal_moves().choose(&mut self.rng).copied())
    }

    fn set_color(&mut self, color: Color) {
        self.color = Some(color);
    }

    fn color(&self) -> Option<Color> {
        self.color
    }

    fn name(&self) -> &str {
        &self.name
    }
}
