use std::path::{Path, PathBuf};

use tracing::warn;

use crate::ai::evaluator::Heuristic;
use crate::ai::mcts::MctsConfig;
use crate::ai::strategy::StrategyKind;
use crate::error::{AgentError, ConfigError};
use crate::game::session::GameConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub board: BoardConfig,
    pub search: SearchConfig,
    pub mcts: MctsConfig,
    pub learned: LearnedConfig,
    pub game: PlayConfig,
    pub players: PlayersConfig,
}

/// Board dimensions and the run length needed to win.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub height: usize,
    pub width: usize,
    pub connect: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            height: crate::game::ROWS,
            width: crate::game::COLS,
            connect: crate::game::CONNECT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Plies searched by minimax, alpha-beta, expectimax and learned players.
    pub depth: usize,
    /// Static evaluator scoring search leaves: "streak" or "window".
    pub evaluator: Heuristic,
    /// Seed for tie-breaks and random players; fresh entropy when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            depth: 4,
            evaluator: Heuristic::Streak,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LearnedConfig {
    /// Saved value-network record. Random weights are drawn when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    pub max_illegal_attempts: usize,
    /// Games played per run.
    pub trials: usize,
}

impl Default for PlayConfig {
    fn default() -> Self {
        PlayConfig {
            max_illegal_attempts: 3,
            trials: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    /// Moves first.
    pub red: PlayerConfig,
    pub black: PlayerConfig,
}

impl Default for PlayersConfig {
    fn default() -> Self {
        PlayersConfig {
            red: PlayerConfig::new("human"),
            black: PlayerConfig::new("alphabeta"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PlayerConfig {
    pub fn new(strategy: impl Into<String>) -> Self {
        PlayerConfig {
            strategy: strategy.into(),
            name: None,
        }
    }

    pub fn kind(&self) -> Result<StrategyKind, AgentError> {
        self.strategy.parse()
    }

    /// Configured name, or "Human"/"Computer" by strategy.
    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match self.strategy.parse::<StrategyKind>() {
            Ok(StrategyKind::Human) => "Human".to_string(),
            Ok(StrategyKind::Random) => "Random".to_string(),
            _ => "Computer".to_string(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig::new("alphabeta")
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.board;
        if b.height == 0 || b.width == 0 {
            return Err(ConfigError::Validation(
                "board.height and board.width must be >= 1".into(),
            ));
        }
        if b.connect < 2 || b.connect > b.height.max(b.width) {
            return Err(ConfigError::Validation(format!(
                "board.connect must be in [2, {}]",
                b.height.max(b.width)
            )));
        }
        if self.search.depth == 0 {
            return Err(ConfigError::Validation("search.depth must be >= 1".into()));
        }
        if self.mcts.simulations == 0 {
            return Err(ConfigError::Validation(
                "mcts.simulations must be >= 1".into(),
            ));
        }
        if !(self.mcts.exploration > 0.0 && self.mcts.exploration.is_finite()) {
            return Err(ConfigError::Validation(
                "mcts.exploration must be > 0".into(),
            ));
        }
        if self.game.trials == 0 {
            return Err(ConfigError::Validation("game.trials must be >= 1".into()));
        }
        if self.game.max_illegal_attempts == 0 {
            return Err(ConfigError::Validation(
                "game.max_illegal_attempts must be >= 1".into(),
            ));
        }

        for (side, player) in [("red", &self.players.red), ("black", &self.players.black)] {
            player
                .kind()
                .map_err(|e| ConfigError::Validation(format!("players.{side}.strategy: {e}")))?;
        }

        Ok(())
    }

    /// Game loop settings derived from the board and game sections.
    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            height: self.board.height,
            width: self.board.width,
            connect: self.board.connect,
            max_illegal_attempts: self.game.max_illegal_attempts,
        }
    }

    /// MCTS settings sharing the search seed.
    pub fn mcts_config(&self) -> MctsConfig {
        MctsConfig {
            seed: self.search.seed,
            ..self.mcts.clone()
        }
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}
