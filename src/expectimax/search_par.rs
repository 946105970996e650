use rayon::prelude::*;
use tracing::debug;

use crate::engine::{Board, Move};
use crate::weights::HeuristicWeights;

use super::search_seq::Searcher;
use super::{half_plies, pick_best, BranchEval, ExpectimaxConfig, Policy, SearchResult, SearchStats, Turn};

/// Parallel Expectimax: the root directions are searched on the rayon pool.
///
/// Each subtree is walked by its own [`Searcher`] over its own cloned board;
/// only the config is shared, read-only. Picks exactly what [`super::Expectimax`] picks.
pub struct ExpectimaxParallel {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl ExpectimaxParallel {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self { Self { cfg, stats: SearchStats::default() } }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    #[inline]
    pub fn weights(&self) -> &HeuristicWeights { &self.cfg.weights }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut HeuristicWeights { &mut self.cfg.weights }

    /// Root search built from [`Self::branch_evals`].
    pub fn search(&mut self, board: &Board) -> SearchResult {
        let branches = self.branch_evals(board);
        let result = pick_best(&branches);
        debug!(
            direction = ?result.direction,
            score = result.score,
            nodes = self.stats.nodes,
            leaves = self.stats.leaves,
            "parallel expectimax search complete"
        );
        result
    }

    /// Compute the best move using parallel expectimax.
    #[inline]
    pub fn best_move(&mut self, board: &Board) -> Option<Move> { self.search(board).direction }

    /// Back-compat shim.
    ///
    /// Equivalent to [`Self::best_move`].
    #[inline]
    pub fn get_next_move(&mut self, board: &Board) -> Option<Move> { self.best_move(board) }

    /// Convenience: both the best move and all branch evaluations from one search.
    pub fn best_move_with_branches(&mut self, board: &Board) -> (Option<Move>, [BranchEval; 4]) {
        let branches = self.branch_evals(board);
        (pick_best(&branches).direction, branches)
    }

    /// Core function: compute EV for each direction in parallel.
    ///
    /// Returns a fixed array in order `[Up, Right, Down, Left]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: &Board) -> [BranchEval; 4] {
        let plies = half_plies(self.cfg.depth) - 1;
        let cfg = &self.cfg;
        let evaluated: Vec<(BranchEval, SearchStats)> = Move::ALL
            .par_iter()
            .map(|&dir| match board.shifted(dir) {
                Some(next) => {
                    let mut searcher = Searcher::new(cfg);
                    let ev = searcher.expectimax(&next, Turn::Chance, plies, Some(dir)).score;
                    (BranchEval { dir, ev, legal: true }, searcher.stats)
                }
                None => (BranchEval::illegal(dir), SearchStats::default()),
            })
            .collect();

        // Indexed collect keeps enumeration order.
        let mut out = Move::ALL.map(BranchEval::illegal);
        let mut stats = SearchStats { nodes: 1, leaves: 0 };
        for (slot, (branch, branch_stats)) in out.iter_mut().zip(evaluated) {
            *slot = branch;
            stats += branch_stats;
        }
        self.stats = stats;
        out
    }

    /// EV at root (max node), equivalent to the best branch EV.
    pub fn state_value(&mut self, board: &Board) -> f64 { self.search(board).score }

    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }
}

impl Default for ExpectimaxParallel {
    fn default() -> Self { Self::new() }
}

impl Policy for ExpectimaxParallel {
    fn next_move(&mut self, board: &Board) -> Option<Move> { self.best_move(board) }
    fn stats(&self) -> SearchStats { self.stats }
}
