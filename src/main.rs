#![recursion_limit = "256"]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use connect_k::ai::{build_player, Heuristic};
use connect_k::config::{AppConfig, PlayerConfig};
use connect_k::game::{Color, Game, GameOutcome, GameRecord, TrialStats};

/// Play Connect-K between humans and computer players.
#[derive(Parser)]
#[command(name = "connect-k", about = "Play Connect-Four and Connect-K")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "connect_k.toml")]
    config: PathBuf,

    /// Red player's strategy: human, random, naive, minimax, alphabeta,
    /// expectimax, mcts or learned
    #[arg(long)]
    red: Option<String>,

    /// Black player's strategy
    #[arg(long)]
    black: Option<String>,

    /// Override search depth
    #[arg(long)]
    depth: Option<usize>,

    /// Leaf evaluator for minimax, alpha-beta and expectimax: streak or window
    #[arg(long)]
    evaluator: Option<Heuristic>,

    /// Override MCTS simulations per move
    #[arg(long)]
    simulations: Option<usize>,

    /// Number of games to play
    #[arg(long)]
    trials: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    #[arg(long)]
    width: Option<usize>,

    /// Pieces in a row needed to win
    #[arg(long)]
    connect: Option<usize>,

    /// Seed for reproducible tie-breaks and random players
    #[arg(long)]
    seed: Option<u64>,

    /// Saved learned-evaluator weights
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Print the board after every move
    #[arg(long)]
    show: bool,

    /// Print a JSON summary instead of text
    #[arg(long)]
    json: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct Summary<'a> {
    red: &'a str,
    black: &'a str,
    stats: &'a TrialStats,
    games: &'a [GameRecord],
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    // Load configuration
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli);
    config.validate().context("invalid configuration")?;

    let red_name = config.players.red.display_name();
    let black_name = config.players.black.display_name();
    let red = build_player(&config.players.red, &config).context("building red player")?;
    let black = build_player(&config.players.black, &config).context("building black player")?;
    let humans = [red.is_human(), black.is_human()];

    let mut game = Game::new(config.game_config(), red, black);
    let mut stats = TrialStats::new();
    let mut records = Vec::with_capacity(config.game.trials);

    for trial in 1..=config.game.trials {
        let result = if cli.show {
            game.play_with(|board, color, col| println!("{color} plays {col}\n{board}\n"))
        } else {
            game.play()
        };
        let record = result.with_context(|| format!("game {trial} ended early"))?;

        if !cli.json {
            let message = match record.outcome {
                GameOutcome::Winner(color) => {
                    let (name, human) = match color {
                        Color::Red => (&red_name, humans[0]),
                        Color::Black => (&black_name, humans[1]),
                    };
                    if human {
                        format!("Congratulations! {name} won.")
                    } else {
                        format!("Game over. {name} ({color}) won.")
                    }
                }
                GameOutcome::Draw => "Game over. It's a draw!".to_string(),
            };
            println!("Game {trial}: {message} ({} moves)", record.num_moves);
        }

        stats.record(&record);
        records.push(record);
    }

    if cli.json {
        let summary = Summary {
            red: &red_name,
            black: &black_name,
            stats: &stats,
            games: &records,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if config.game.trials > 1 {
        println!(
            "{red_name} (Red) {} wins, {black_name} (Black) {} wins, {} draws, {:.1} moves per game",
            stats.red_wins,
            stats.black_wins,
            stats.draws,
            stats.average_length()
        );
    }

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(strategy) = &cli.red {
        config.players.red = PlayerConfig {
            name: config.players.red.name.clone(),
            ..PlayerConfig::new(strategy.clone())
        };
    }
    if let Some(strategy) = &cli.black {
        config.players.black = PlayerConfig {
            name: config.players.black.name.clone(),
            ..PlayerConfig::new(strategy.clone())
        };
    }
    if let Some(depth) = cli.depth {
        config.search.depth = depth;
    }
    if let Some(evaluator) = cli.evaluator {
        config.search.evaluator = evaluator;
    }
    if let Some(simulations) = cli.simulations {
        config.mcts.simulations = simulations;
    }
    if let Some(trials) = cli.trials {
        config.game.trials = trials;
    }
    if let Some(height) = cli.height {
        config.board.height = height;
    }
    if let Some(width) = cli.width {
        config.board.width = width;
    }
    if let Some(connect) = cli.connect {
        config.board.connect = connect;
    }
    if cli.seed.is_some() {
        config.search.seed = cli.seed;
    }
    if cli.weights.is_some() {
        config.learned.weights = cli.weights.clone();
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
