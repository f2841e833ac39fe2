//! # Connect K
//!
//! Connect-Four and its generalization to K in a row on any board, played
//! between humans, random players and several computer searchers. Search runs
//! minimax, alpha-beta or expectimax over pluggable evaluators (including a
//! learned linear value network built on Burn), or Monte-Carlo tree search.
//!
//! ## Modules
//!
//! - [`game`] — Board, colors, the game loop and trial statistics
//! - [`ai`] — Agent trait, evaluators, tree searchers, MCTS and player strategies
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
