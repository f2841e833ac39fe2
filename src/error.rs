use std::path::PathBuf;

use crate::game::Color;

/// Errors raised while building or querying a player.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("unrecognized strategy '{0}'")]
    UnrecognizedStrategy(String),

    #[error("unrecognized evaluator '{0}'")]
    UnrecognizedEvaluator(String),

    #[error("player has no color assigned")]
    ColorNotAssigned,

    #[error("input closed before a move was entered")]
    InputClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("evaluator error: {0}")]
    Evaluator(#[from] EvaluatorError),
}

/// Errors raised while loading or saving learned evaluator parameters.
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("weights have {actual} entries, expected {expected}")]
    WeightsShape { expected: usize, actual: usize },

    #[error("failed to load weights from {path}: {reason}")]
    WeightsLoad { path: PathBuf, reason: String },

    #[error("failed to save weights: {0}")]
    WeightsSave(String),
}

/// Errors that end a game early.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("{player} ({color}) made {attempts} illegal move attempts")]
    TooManyIllegalMoves {
        player: String,
        color: Color,
        attempts: usize,
    },

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_error_display() {
        let err = AgentError::UnrecognizedStrategy("greedy".to_string());
        assert_eq!(err.to_string(), "unrecognized strategy 'greedy'");
    }

    #[test]
    fn test_game_error_display() {
        let err = GameError::TooManyIllegalMoves {
            player: "Computer".to_string(),
            color: Color::Black,
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "Computer (Black) made 3 illegal move attempts"
        );
    }

    #[test]
    fn test_evaluator_error_display() {
        let err = EvaluatorError::WeightsShape {
            expected: 42,
            actual: 40,
        };
        assert_eq!(err.to_string(), "weights have 40 entries, expected 42");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("search.depth must be >= 1".to_string());
        assert_eq!(
            err.to_string(),
            "config validation error: search.depth must be >= 1"
        );
    }
}
