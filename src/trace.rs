//! Instrumented search for inspecting what the heuristic sees.
//!
//! [`trace_top_level_scores`] walks the same player/chance tree as the
//! search, but keeps every leaf: the path of moves and spawns that led there,
//! the leaf score and the board. It reports the best leaf score reachable
//! under each root direction.
//!
//! ```
//! use snake_2048::engine::{Board, Move};
//! use snake_2048::trace::{trace_top_level_scores, DirectionScore};
//! use snake_2048::weights::HeuristicWeights;
//!
//! let b = Board::from_rows(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
//! let report = trace_top_level_scores(&b, &HeuristicWeights::default(), 0);
//! assert_eq!(report.score_for(Move::Up), DirectionScore::Illegal);
//! assert!(report.recommended().is_some());
//! println!("{report}");
//! ```

use std::fmt;

use tracing::trace;

use crate::engine::{Board, Move};
use crate::expectimax::evaluate;
use crate::weights::HeuristicWeights;

/// One edge on the way to a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    Move(Move),
    Spawn { x: usize, y: usize, value: u32 },
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Move(m) => write!(f, "{m}"),
            PathStep::Spawn { x, y, value } => write!(f, "Add({value} @ {x},{y})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceLeaf {
    pub path: Vec<PathStep>,
    pub score: f64,
    pub board: Board,
}

impl TraceLeaf {
    pub fn path_label(&self) -> String {
        self.path.iter().map(ToString::to_string).collect::<Vec<_>>().join(" | ")
    }
}

/// Best leaf score under a root direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectionScore {
    /// The root move does not change the board.
    Illegal,
    /// Best leaf score; -inf when every leaf is a dead end.
    Best(f64),
}

impl DirectionScore {
    /// The score, if the move is legal and leads somewhere alive.
    pub fn finite(self) -> Option<f64> {
        match self {
            DirectionScore::Best(s) if s > f64::NEG_INFINITY => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for DirectionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.finite() {
            Some(s) => write!(f, "{s:.3e}"),
            None => f.write_str("Invalid"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceReport {
    pub leaves: Vec<TraceLeaf>,
    top_scores: [(Move, DirectionScore); 4],
}

impl TraceReport {
    /// Direction → best leaf score, in [`Move::ALL`] order.
    #[inline]
    pub fn summary(&self) -> [(Move, DirectionScore); 4] { self.top_scores }

    #[inline]
    pub fn score_for(&self, dir: Move) -> DirectionScore { self.top_scores[dir.index()].1 }

    /// Highest finite direction; the earlier direction wins ties.
    pub fn recommended(&self) -> Option<(Move, f64)> {
        self.top_scores
            .iter()
            .filter_map(|&(dir, s)| s.finite().map(|v| (dir, v)))
            .fold(None, |best, (dir, v)| match best {
                Some((_, b)) if v <= b => best,
                _ => Some((dir, v)),
            })
    }
}

impl fmt::Display for TraceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for leaf in &self.leaves {
            let indent = "  ".repeat(leaf.path.len());
            writeln!(f, "Path: {}", leaf.path_label())?;
            writeln!(f, " Score: {:.3e}", leaf.score)?;
            for line in leaf.board.to_string().lines().filter(|l| !l.is_empty()) {
                writeln!(f, "{indent}{line}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "Max terminal scores per direction:")?;
        for (dir, score) in self.top_scores {
            writeln!(f, "  {dir} : {score}")?;
        }
        match self.recommended() {
            Some((dir, score)) => writeln!(f, "Recommended direction: {dir} (score: {score:.3e})"),
            None => writeln!(f, "No valid directions available"),
        }
    }
}

struct Tracer<'a> {
    weights: &'a HeuristicWeights,
    leaves: Vec<TraceLeaf>,
    best: f64,
}

impl Tracer<'_> {
    fn recurse(&mut self, board: &Board, plies: u32, player: bool, path: &mut Vec<PathStep>) {
        if plies == 0 || board.is_terminated() {
            let score = evaluate(board, self.weights);
            if score > self.best {
                self.best = score;
            }
            let leaf = TraceLeaf { path: path.clone(), score, board: board.clone() };
            trace!(path = %leaf.path_label(), score, "traced leaf");
            self.leaves.push(leaf);
            return;
        }
        if player {
            for dir in Move::ALL {
                let Some(next) = board.shifted(dir) else { continue };
                path.push(PathStep::Move(dir));
                self.recurse(&next, plies - 1, false, path);
                path.pop();
            }
        } else {
            for cell in board.available_cells() {
                let mut next = board.clone();
                next.add_tile(cell.x, cell.y, 2);
                path.push(PathStep::Spawn { x: cell.x, y: cell.y, value: 2 });
                self.recurse(&next, plies - 1, true, path);
                path.pop();
            }
        }
    }
}

/// Exhaustively trace every root direction down to `max_depth` whole turns.
///
/// Each legal root move is followed by `2 * max_depth` half-plies, starting
/// with a chance layer, matching the search's schedule below the root.
pub fn trace_top_level_scores(board: &Board, weights: &HeuristicWeights, max_depth: u32) -> TraceReport {
    let mut leaves = Vec::new();
    let mut top_scores = Move::ALL.map(|dir| (dir, DirectionScore::Illegal));
    for dir in Move::ALL {
        let Some(next) = board.shifted(dir) else {
            trace!(direction = %dir, "direction is invalid");
            continue;
        };
        let mut tracer = Tracer { weights, leaves: Vec::new(), best: f64::NEG_INFINITY };
        let mut path = vec![PathStep::Move(dir)];
        tracer.recurse(&next, 2 * max_depth, false, &mut path);
        top_scores[dir.index()].1 = DirectionScore::Best(tracer.best);
        leaves.append(&mut tracer.leaves);
    }
    TraceReport { leaves, top_scores }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::{Expectimax, ExpectimaxConfig};

    #[test]
    fn depth_zero_scores_each_root_move() {
        let w = HeuristicWeights::default();
        let b = Board::from_rows(&[[0, 2, 0, 0], [0, 4, 0, 0], [0; 4], [0; 4]]);
        let report = trace_top_level_scores(&b, &w, 0);
        for dir in Move::ALL {
            match b.shifted(dir) {
                Some(next) => assert_eq!(report.score_for(dir), DirectionScore::Best(evaluate(&next, &w))),
                None => assert_eq!(report.score_for(dir), DirectionScore::Illegal),
            }
        }
        assert_eq!(report.score_for(Move::Up), DirectionScore::Illegal);
        assert_eq!(report.leaves.len(), 3);
        assert_eq!(report.leaves[0].path, vec![PathStep::Move(Move::Right)]);
    }

    #[test]
    fn depth_one_leaf_count_and_paths() {
        let w = HeuristicWeights::default();
        let b = Board::from_rows(&[[2, 4, 8, 16], [4, 8, 16, 32], [8, 16, 32, 64], [0, 0, 0, 2]]);
        let report = trace_top_level_scores(&b, &w, 1);

        let mut expected = 0;
        for dir in Move::ALL {
            let Some(next) = b.shifted(dir) else { continue };
            for cell in next.available_cells() {
                let mut spawned = next.clone();
                spawned.add_tile(cell.x, cell.y, 2);
                expected += Move::ALL.iter().filter(|&&m| spawned.shifted(m).is_some()).count().max(
                    // A spawn that kills the board is itself a leaf.
                    usize::from(spawned.is_terminated()),
                );
            }
        }
        assert_eq!(report.leaves.len(), expected);
        for leaf in &report.leaves {
            assert!(matches!(leaf.path[0], PathStep::Move(_)));
            assert!(matches!(leaf.path.get(1), Some(PathStep::Spawn { value: 2, .. })));
        }
        let label = report.leaves[0].path_label();
        assert!(label.contains("Add(2 @ "), "{label}");
    }

    #[test]
    fn best_leaf_bounds_search_value() {
        // The averaged search value of a branch can't beat its best leaf.
        let w = HeuristicWeights::default();
        let b = Board::from_rows(&[[2, 0, 0, 2], [0, 4, 0, 0], [0, 0, 8, 0], [0; 4]]);
        let report = trace_top_level_scores(&b, &w, 1);
        let mut ex = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
        for be in ex.branch_evals(&b) {
            match report.score_for(be.dir) {
                DirectionScore::Best(s) => assert!(be.legal && be.ev <= s + s.abs() * 1e-12),
                DirectionScore::Illegal => assert!(!be.legal),
            }
        }
    }

    #[test]
    fn dead_board_has_no_recommendation() {
        let dead = Board::from_rows(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let report = trace_top_level_scores(&dead, &HeuristicWeights::default(), 2);
        assert!(report.leaves.is_empty());
        assert_eq!(report.recommended(), None);
        let text = report.to_string();
        assert!(text.contains("↑ : Invalid"));
        assert!(text.ends_with("No valid directions available\n"));
    }

    #[test]
    fn recommended_prefers_earlier_on_ties() {
        let report = TraceReport {
            leaves: Vec::new(),
            top_scores: [
                (Move::Up, DirectionScore::Illegal),
                (Move::Right, DirectionScore::Best(3.0)),
                (Move::Down, DirectionScore::Best(f64::NEG_INFINITY)),
                (Move::Left, DirectionScore::Best(3.0)),
            ],
        };
        assert_eq!(report.recommended(), Some((Move::Right, 3.0)));
        assert!(report.to_string().contains("↓ : Invalid"));
    }
}
