//! Expectimax search policy (single-threaded and parallel) for 2048.
//!
//! This module provides two policy implementations:
//! - [`Expectimax`]: single-threaded expectimax.
//! - [`ExpectimaxParallel`]: rayon fan-out over the root directions.
//!
//! Both walk the same tree: player layers take the best legal move, chance
//! layers average over a 2-tile spawned in every empty cell. Both also pick
//! the same move, including on exact ties, where the later direction in
//! [`Move::ALL`] wins.
//!
//! Quick start
//! ```
//! use snake_2048::engine::Board;
//! use snake_2048::expectimax::{Expectimax, ExpectimaxConfig, ExpectimaxParallel};
//!
//! let b = Board::from_rows(&[[2, 4, 8, 2], [4, 8, 2, 4], [8, 2, 4, 2], [0, 0, 2, 4]]);
//! let cfg = ExpectimaxConfig { depth: 1, ..Default::default() };
//!
//! let mut ex = Expectimax::with_config(cfg.clone());
//! let m = ex.best_move(&b);
//! assert!(m.is_some());
//!
//! let mut ex_par = ExpectimaxParallel::with_config(cfg);
//! assert_eq!(ex_par.best_move(&b), m);
//! ```

use crate::engine::{Board, Move};
use crate::weights::HeuristicWeights;

mod heuristic;
mod search_par;
mod search_seq;

pub use heuristic::{
    aggressive_score, corner_snake_score, evaluate, evaluate_with, explain, is_monotonic, snake_weight,
    Explanation, HeuristicKind, SnakeAnchor,
};
pub use search_par::ExpectimaxParallel;
pub use search_seq::Expectimax;

/// Whole player turns searched from the root.
pub const DEFAULT_DEPTH: u32 = 3;

/// Configurable knobs for Expectimax.
///
/// - `depth`: whole player turns below the root.
/// - `weights`: heuristic weights, read by every leaf evaluation.
/// - `heuristic`: which leaf evaluation to use.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectimaxConfig {
    pub depth: u32,
    pub weights: HeuristicWeights,
    pub heuristic: HeuristicKind,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self { depth: DEFAULT_DEPTH, weights: HeuristicWeights::default(), heuristic: HeuristicKind::default() }
    }
}

/// Score of a search node and the root direction it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub score: f64,
    pub direction: Option<Move>,
}

impl SearchResult {
    pub(crate) const DEAD: SearchResult = SearchResult { score: f64::NEG_INFINITY, direction: None };
}

/// Per-branch expected value at the root.
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op; `ev` is then -inf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

impl BranchEval {
    #[inline]
    pub(crate) fn illegal(dir: Move) -> Self { BranchEval { dir, ev: f64::NEG_INFINITY, legal: false } }
}

/// Basic search stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
    pub leaves: u64,
}

impl std::ops::AddAssign for SearchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes += rhs.nodes;
        self.leaves += rhs.leaves;
    }
}

/// Anything that can pick the next move for a board.
pub trait Policy {
    fn next_move(&mut self, board: &Board) -> Option<Move>;
    /// Stats from the most recent `next_move`.
    fn stats(&self) -> SearchStats;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Player,
    Chance,
}

/// Half-plies for `depth` whole turns; the search stops when this reaches 0.
///
/// `depth` player layers below the root plus the root itself, each followed
/// by a chance layer, except the last which is cut off.
#[inline]
fn half_plies(depth: u32) -> u32 { 2 * depth + 1 }

/// Best legal branch, later directions winning exact ties.
fn pick_best(branches: &[BranchEval; 4]) -> SearchResult {
    branches
        .iter()
        .filter(|b| b.legal)
        .fold(SearchResult::DEAD, |best, b| {
            if b.ev >= best.score {
                SearchResult { score: b.ev, direction: Some(b.dir) }
            } else {
                best
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_best_prefers_later_on_ties() {
        let branches = [
            BranchEval { dir: Move::Up, ev: 5.0, legal: true },
            BranchEval { dir: Move::Right, ev: 7.0, legal: true },
            BranchEval::illegal(Move::Down),
            BranchEval { dir: Move::Left, ev: 7.0, legal: true },
        ];
        assert_eq!(pick_best(&branches), SearchResult { score: 7.0, direction: Some(Move::Left) });
    }

    #[test]
    fn pick_best_takes_dead_branches() {
        let branches = [
            BranchEval { dir: Move::Up, ev: f64::NEG_INFINITY, legal: true },
            BranchEval::illegal(Move::Right),
            BranchEval::illegal(Move::Down),
            BranchEval::illegal(Move::Left),
        ];
        assert_eq!(pick_best(&branches).direction, Some(Move::Up));
        let none = Move::ALL.map(BranchEval::illegal);
        assert_eq!(pick_best(&none), SearchResult::DEAD);
    }

    #[test]
    fn half_ply_schedule() {
        // 3, 2.5, 2, 1.5, 1, 0.5, 0 then cutoff.
        assert_eq!(half_plies(3), 7);
        assert_eq!(half_plies(0), 1);
    }
}
