//! snake-2048: a 2048 move engine and an Expectimax advisor built on a
//! tunable snake-pattern heuristic.
//!
//! This crate provides:
//! - A `Board` type with the real game's move and merge rules (`engine` module)
//! - Tunable heuristic weights with presets and a TOML loader (`weights` module)
//! - An Expectimax AI (`expectimax` module) with single-threaded and parallel variants
//! - An instrumented search that reports every leaf it scores (`trace` module)
//! - A game driver that plays with any `Policy` (`driver` module)
//!
//! Quick start:
//! ```
//! use snake_2048::driver::{play, Game};
//! use snake_2048::expectimax::{Expectimax, ExpectimaxConfig};
//! use snake_2048::weights::Preset;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic game with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut game = Game::new(4, &mut rng);
//!
//! let mut ai = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
//! ai.weights_mut().apply_preset(Preset::Strong);
//! let summary = play(&mut game, &mut ai, &mut rng, Some(10), |_| {});
//! assert_eq!(summary.moves, 10);
//! ```
//!
//! The search is pure: it reads a `Board` snapshot and never touches the live
//! game. Weights live in the searcher's `ExpectimaxConfig` and can be changed
//! between searches.
//!
pub mod driver;
pub mod engine;
pub mod expectimax;
pub mod trace;
pub mod weights;
