use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

use crate::config::{AppConfig, PlayerConfig};
use crate::error::AgentError;
use crate::game::{Board, Color};

use super::agent::Agent;
use super::evaluator::Evaluator;
use super::human::HumanPlayer;
use super::learned::LearnedEvaluator;
use super::mcts::MctsSession;
use super::naive::naive_move;
use super::negamax::{SearchMode, Searcher};
use super::random::RandomAgent;

/// Every player type a configuration can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Human,
    Random,
    Naive,
    Minimax,
    AlphaBeta,
    Expectimax,
    Mcts,
    /// Alpha-beta scored by the learned evaluator.
    Learned,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 8] = [
        StrategyKind::Human,
        StrategyKind::Random,
        StrategyKind::Naive,
        StrategyKind::Minimax,
        StrategyKind::AlphaBeta,
        StrategyKind::Expectimax,
        StrategyKind::Mcts,
        StrategyKind::Learned,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Human => "human",
            StrategyKind::Random => "random",
            StrategyKind::Naive => "naive",
            StrategyKind::Minimax => "minimax",
            StrategyKind::AlphaBeta => "alphabeta",
            StrategyKind::Expectimax => "expectimax",
            StrategyKind::Mcts => "mcts",
            StrategyKind::Learned => "learned",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "human" => StrategyKind::Human,
            "random" => StrategyKind::Random,
            "naive" => StrategyKind::Naive,
            "minimax" => StrategyKind::Minimax,
            "alphabeta" | "alpha-beta" => StrategyKind::AlphaBeta,
            "expectimax" => StrategyKind::Expectimax,
            "mcts" => StrategyKind::Mcts,
            "learned" | "td-alphabeta" => StrategyKind::Learned,
            _ => return Err(AgentError::UnrecognizedStrategy(s.to_string())),
        };
        Ok(kind)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Move policy of a [`ComputerAgent`], fixed for the agent's lifetime.
pub enum Strategy {
    Naive,
    Search {
        searcher: Searcher,
        depth: usize,
        mode: SearchMode,
    },
    Mcts(MctsSession),
}

/// A computer player dispatching every move request to its [`Strategy`].
pub struct ComputerAgent {
    name: String,
    color: Option<Color>,
    strategy: Strategy,
}

impl ComputerAgent {
    pub fn new(name: impl Into<String>, strategy: Strategy) -> Self {
        ComputerAgent {
            name: name.into(),
            color: None,
            strategy,
        }
    }

    pub fn search(
        name: impl Into<String>,
        evaluator: Box<dyn Evaluator>,
        depth: usize,
        mode: SearchMode,
        seed: Option<u64>,
    ) -> Self {
        let searcher = match seed {
            Some(seed) => Searcher::with_seed(evaluator, seed),
            None => Searcher::new(evaluator),
        };
        Self::new(
            name,
            Strategy::Search {
                searcher,
                depth,
                mode,
            },
        )
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }
}

impl Agent for ComputerAgent {
    fn get_move(&mut self, board: &Board) -> Result<Option<usize>, AgentError> {
        let color = self.color.ok_or(AgentError::ColorNotAssigned)?;
        let col = match &mut self.strategy {
            Strategy::Naive => naive_move(board),
            Strategy::Search {
                searcher,
                depth,
                mode,
            } => searcher.search(*depth, board, color, *mode).map(|(col, _)| col),
            Strategy::Mcts(session) => session.choose_move(board, color),
        };
        Ok(col)
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

    fn new_game(&mut self) {
        if let Strategy::Mcts(session) = &mut self.strategy {
            session.reset();
        }
    }
}

/// Build the player described by `player`, using the shared search, MCTS and
/// learned settings of `config`. Minimax, alpha-beta and expectimax players
/// score leaves with `config.search.evaluator`.
///
/// Learned weights are read here so malformed files fail before play starts.
pub fn build_player(
    player: &PlayerConfig,
    config: &AppConfig,
) -> Result<Box<dyn Agent>, AgentError> {
    let kind: StrategyKind = player.strategy.parse()?;
    let name = player.display_name();
    let depth = config.search.depth;
    let seed = config.search.seed;

    let agent: Box<dyn Agent> = match kind {
        StrategyKind::Human => Box::new(HumanPlayer::stdio(name)),
        StrategyKind::Random => {
            let agent = match seed {
                Some(seed) => RandomAgent::with_seed(seed),
                None => RandomAgent::new(),
            };
            Box::new(agent.named(name))
        }
        StrategyKind::Naive => Box::new(ComputerAgent::new(name, Strategy::Naive)),
        StrategyKind::Minimax => Box::new(ComputerAgent::search(
            name,
            config.search.evaluator.build(),
            depth,
            SearchMode::Minimax,
            seed,
        )),
        StrategyKind::AlphaBeta => Box::new(ComputerAgent::search(
            name,
            config.search.evaluator.build(),
            depth,
            SearchMode::AlphaBeta,
            seed,
        )),
        StrategyKind::Expectimax => Box::new(ComputerAgent::search(
            name,
            config.search.evaluator.build(),
            depth,
            SearchMode::Expectimax,
            seed,
        )),
        StrategyKind::Mcts => Box::new(ComputerAgent::new(
            name,
            Strategy::Mcts(MctsSession::new(config.mcts_config())),
        )),
        StrategyKind::Learned => {
            let evaluator = learned_evaluator(config)?;
            Box::new(ComputerAgent::search(
                name,
                Box::new(evaluator),
                depth,
                SearchMode::AlphaBeta,
                seed,
            ))
        }
    };
    Ok(agent)
}

fn learned_evaluator(config: &AppConfig) -> Result<LearnedEvaluator, AgentError> {
    let (height, width) = (config.board.height, config.board.width);
    if let Some(path) = &config.learned.weights {
        return Ok(LearnedEvaluator::load(path, height, width)?);
    }

    warn!("no learned weights configured, using randomly initialized weights");
    let mut rng = match config.search.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    Ok(LearnedEvaluator::random(height, width, &mut rng))
}
