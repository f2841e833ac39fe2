mod agent;
pub mod evaluator;
mod human;
pub mod learned;
pub mod mcts;
mod naive;
pub mod negamax;
mod random;
pub mod state_encoding;
pub mod strategy;

pub use agent::Agent;
pub use evaluator::{
    Evaluator, Heuristic, StreakEvaluator, StreakWeights, WindowEvaluator, WIN_SCORE,
};
pub use human::HumanPlayer;
pub use learned::{LearnedEvaluator, ValueNetwork, ValueNetworkConfig};
pub use mcts::{MctsConfig, MctsSession, StackState};
pub use naive::naive_move;
pub use negamax::{SearchMode, Searcher};
pub use random::RandomAgent;
pub use strategy::{build_player, ComputerAgent, Strategy, StrategyKind};
