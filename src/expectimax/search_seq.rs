use tracing::debug;

use crate::engine::{Board, Move};
use crate::weights::HeuristicWeights;

use super::heuristic::evaluate_with;
use super::{half_plies, BranchEval, ExpectimaxConfig, Policy, SearchResult, SearchStats, Turn};

/// One tree walk: borrows the config and counts what it visits.
pub(super) struct Searcher<'a> {
    cfg: &'a ExpectimaxConfig,
    pub(super) stats: SearchStats,
}

impl<'a> Searcher<'a> {
    pub(super) fn new(cfg: &'a ExpectimaxConfig) -> Self { Self { cfg, stats: SearchStats::default() } }

    /// Walk the subtree rooted at `board` with `plies` half-plies left.
    ///
    /// `direction` is the root move this subtree descends from; chance and
    /// cutoff nodes hand it back unchanged.
    pub(super) fn expectimax(&mut self, board: &Board, turn: Turn, plies: u32, direction: Option<Move>) -> SearchResult {
        self.stats.nodes += 1;
        if plies == 0 || board.is_terminated() {
            return SearchResult { score: self.leaf(board), direction };
        }
        match turn {
            Turn::Player => self.evaluate_player(board, plies),
            Turn::Chance => self.evaluate_chance(board, plies, direction),
        }
    }

    #[inline]
    fn leaf(&mut self, board: &Board) -> f64 {
        self.stats.leaves += 1;
        evaluate_with(self.cfg.heuristic, board, &self.cfg.weights)
    }

    fn evaluate_player(&mut self, board: &Board, plies: u32) -> SearchResult {
        let mut best = SearchResult::DEAD;
        for direction in Move::ALL {
            let Some(next) = board.shifted(direction) else { continue };
            let score = self.expectimax(&next, Turn::Chance, plies - 1, Some(direction)).score;
            if score >= best.score {
                best = SearchResult { score, direction: Some(direction) };
            }
        }
        best
    }

    fn evaluate_chance(&mut self, board: &Board, plies: u32, direction: Option<Move>) -> SearchResult {
        let cells = board.available_cells();
        if cells.is_empty() {
            return SearchResult { score: self.leaf(board), direction };
        }
        // Only 2-tiles are spawned; 4-tiles are left out of the model.
        let mut total = 0.0;
        for cell in &cells {
            let mut next = board.clone();
            next.add_tile(cell.x, cell.y, 2);
            total += self.expectimax(&next, Turn::Player, plies - 1, direction).score;
        }
        SearchResult { score: total / cells.len() as f64, direction }
    }

    /// Expected value of each root direction, in [`Move::ALL`] order.
    pub(super) fn root_branches(&mut self, board: &Board) -> [BranchEval; 4] {
        let plies = half_plies(self.cfg.depth) - 1;
        Move::ALL.map(|dir| match board.shifted(dir) {
            Some(next) => {
                let ev = self.expectimax(&next, Turn::Chance, plies, Some(dir)).score;
                BranchEval { dir, ev, legal: true }
            }
            None => BranchEval::illegal(dir),
        })
    }
}

/// Single-threaded Expectimax search.
///
/// Owns its configuration; weights may be retuned between searches through
/// [`Expectimax::weights_mut`].
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(ExpectimaxConfig::default()) }

    pub fn with_config(cfg: ExpectimaxConfig) -> Self { Self { cfg, stats: SearchStats::default() } }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig { &self.cfg }

    #[inline]
    pub fn weights(&self) -> &HeuristicWeights { &self.cfg.weights }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut HeuristicWeights { &mut self.cfg.weights }

    /// Full root search: score of the best line and the direction leading to it.
    ///
    /// A board with no legal move yields `(-inf, None)`.
    ///
    /// ```
    /// use snake_2048::engine::Board;
    /// use snake_2048::expectimax::Expectimax;
    /// let res = Expectimax::new().search(&Board::default());
    /// assert_eq!(res.direction, None);
    /// assert_eq!(res.score, f64::NEG_INFINITY);
    /// ```
    pub fn search(&mut self, board: &Board) -> SearchResult {
        let mut searcher = Searcher::new(&self.cfg);
        let result = searcher.expectimax(board, Turn::Player, half_plies(self.cfg.depth), None);
        self.record(searcher.stats);
        debug!(
            direction = ?result.direction,
            score = result.score,
            nodes = self.stats.nodes,
            leaves = self.stats.leaves,
            "expectimax search complete"
        );
        result
    }

    /// Compute the best move using expectimax.
    #[inline]
    pub fn best_move(&mut self, board: &Board) -> Option<Move> { self.search(board).direction }

    /// Back-compat shim.
    ///
    /// Equivalent to [`Self::best_move`].
    #[inline]
    pub fn get_next_move(&mut self, board: &Board) -> Option<Move> { self.best_move(board) }

    /// Compute EV for each direction.
    ///
    /// Returns a fixed array in order `[Up, Right, Down, Left]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: &Board) -> [BranchEval; 4] {
        let mut searcher = Searcher::new(&self.cfg);
        let out = searcher.root_branches(board);
        self.record(searcher.stats);
        out
    }

    /// EV at root (max node), equivalent to the best branch EV.
    pub fn state_value(&mut self, board: &Board) -> f64 { self.search(board).score }

    /// Statistics collected from the last call to [`search`](Self::search),
    /// [`branch_evals`](Self::branch_evals) or [`state_value`](Self::state_value).
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Reset stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) { self.stats = SearchStats::default(); }

    #[inline]
    fn record(&mut self, stats: SearchStats) { self.stats = stats; }
}

impl Default for Expectimax {
    fn default() -> Self { Self::new() }
}

impl Policy for Expectimax {
    fn next_move(&mut self, board: &Board) -> Option<Move> { self.best_move(board) }
    fn stats(&self) -> SearchStats { self.stats }
}
