use std::fmt;

use crate::engine::{Board, Position};
use crate::weights::HeuristicWeights;

/// Which leaf evaluation the search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HeuristicKind {
    /// Weighted space / monotonicity / corner / snake score driven by [`HeuristicWeights`].
    #[default]
    Configurable,
    /// Fixed gradient towards the top-left corner, doubled per empty cell. 4x4 only.
    CornerSnake,
    /// Game score scaled by empty space, monotonic rows and a cornered maximum.
    Aggressive,
}

/// Corner a snake path is anchored at, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeAnchor {
    TopLeft,
    BottomLeft,
    BottomRight,
    TopRight,
}

impl SnakeAnchor {
    pub const ALL: [SnakeAnchor; 4] =
        [SnakeAnchor::TopLeft, SnakeAnchor::BottomLeft, SnakeAnchor::BottomRight, SnakeAnchor::TopRight];

    pub fn position(self, size: usize) -> Position {
        let last = size - 1;
        match self {
            SnakeAnchor::TopLeft => Position { x: 0, y: 0 },
            SnakeAnchor::BottomLeft => Position { x: 0, y: last },
            SnakeAnchor::BottomRight => Position { x: last, y: last },
            SnakeAnchor::TopRight => Position { x: last, y: 0 },
        }
    }
}

impl fmt::Display for SnakeAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnakeAnchor::TopLeft => "top-left",
            SnakeAnchor::BottomLeft => "bottom-left",
            SnakeAnchor::BottomRight => "bottom-right",
            SnakeAnchor::TopRight => "top-right",
        };
        f.write_str(name)
    }
}

/// Weight of cell `(x, y)` on the snake anchored at `anchor`.
///
/// The path runs column by column away from the anchor, reversing direction
/// in every other column. The anchor weighs `size²` and each step one less.
#[inline]
pub fn snake_weight(size: usize, anchor: SnakeAnchor, x: usize, y: usize) -> u64 {
    let start = anchor.position(size);
    let col = x.abs_diff(start.x);
    let along = y.abs_diff(start.y);
    let row = if col % 2 == 0 { along } else { size - 1 - along };
    (size * size - (col * size + row)) as u64
}

/// True if the non-zero entries never go both up and down.
///
/// ```
/// use snake_2048::expectimax::is_monotonic;
/// assert!(is_monotonic(&[4, 2, 2, 0]));
/// assert!(!is_monotonic(&[2, 4, 2, 0]));
/// assert!(is_monotonic(&[]));
/// ```
pub fn is_monotonic(line: &[u32]) -> bool {
    let mut increasing = true;
    let mut decreasing = true;
    let mut prev: Option<u32> = None;
    for &v in line.iter().filter(|&&v| v != 0) {
        if let Some(p) = prev {
            if v > p {
                decreasing = false;
            }
            if v < p {
                increasing = false;
            }
        }
        prev = Some(v);
    }
    increasing || decreasing
}

/// Every row and column of the board, as value vectors.
fn lines(board: &Board) -> impl Iterator<Item = Vec<u32>> + '_ {
    let n = board.size();
    let by_x = (0..n).map(move |x| (0..n).map(|y| board.value_at(x, y)).collect::<Vec<u32>>());
    let by_y = (0..n).map(move |y| (0..n).map(|x| board.value_at(x, y)).collect::<Vec<u32>>());
    by_x.chain(by_y)
}

/// Largest tile and where it is. Earliest in x-major scan order wins ties.
fn max_tile(board: &Board) -> (u32, Position) {
    let n = board.size();
    let mut best = (0, Position { x: 0, y: 0 });
    for x in 0..n {
        for y in 0..n {
            let v = board.value_at(x, y);
            if v > best.0 {
                best = (v, Position { x, y });
            }
        }
    }
    best
}

#[inline]
fn is_corner(size: usize, p: Position) -> bool {
    (p.x == 0 || p.x == size - 1) && (p.y == 0 || p.y == size - 1)
}

fn best_snake(board: &Board) -> (f64, SnakeAnchor) {
    let n = board.size();
    let mut best = (0.0, SnakeAnchor::TopLeft);
    for anchor in SnakeAnchor::ALL {
        let dot: u64 = board
            .tiles()
            .map(|t| u64::from(t.value) * snake_weight(n, anchor, t.x, t.y))
            .sum();
        let dot = dot as f64;
        if dot > best.0 {
            best = (dot, anchor);
        }
    }
    best
}

#[derive(Debug, Clone, Copy)]
struct Terms {
    base: f64,
    empty_cells: usize,
    empty_bonus: f64,
    empty_multiplied: bool,
    monotonic_count: usize,
    monotonic_bonus: f64,
    max_value: u32,
    max_position: Position,
    in_corner: bool,
    best_snake_score: f64,
    best_snake_anchor: SnakeAnchor,
    snake_bonus: f64,
    total: f64,
}

fn configurable_terms(board: &Board, w: &HeuristicWeights) -> Terms {
    let base = board.score() as f64 * w.base_score_weight;
    let mut score = base;

    let empty_cells = board.count_empty().min(8);
    let empty_bonus = empty_cells as f64 * w.empty_cell_bonus;
    score += empty_bonus;
    let empty_multiplied = empty_cells as f64 >= w.empty_cell_threshold;
    if empty_multiplied {
        score *= w.empty_cell_multiplier;
    }

    let monotonic_count = lines(board).filter(|l| is_monotonic(l)).count();
    let monotonic_bonus = monotonic_count as f64 * w.monotonic_bonus;
    score += monotonic_bonus;

    let (max_value, max_position) = max_tile(board);
    let in_corner = is_corner(board.size(), max_position);
    if in_corner {
        score *= w.corner_multiplier;
    }

    let (best_snake_score, best_snake_anchor) = best_snake(board);
    let snake_bonus = (best_snake_score / w.snake_weight) * w.snake_bonus;
    score += snake_bonus;

    Terms {
        base,
        empty_cells,
        empty_bonus,
        empty_multiplied,
        monotonic_count,
        monotonic_bonus,
        max_value,
        max_position,
        in_corner,
        best_snake_score,
        best_snake_anchor,
        snake_bonus,
        total: score,
    }
}

/// Score a leaf with the configurable snake heuristic.
///
/// Terminated boards score negative infinity so no live line is ever worse.
///
/// ```
/// use snake_2048::engine::Board;
/// use snake_2048::expectimax::evaluate;
/// use snake_2048::weights::HeuristicWeights;
/// let dead = Board::from_rows(&[[2, 4], [4, 2]]);
/// assert_eq!(evaluate(&dead, &HeuristicWeights::default()), f64::NEG_INFINITY);
/// ```
#[inline]
pub fn evaluate(board: &Board, weights: &HeuristicWeights) -> f64 {
    if board.is_terminated() {
        return f64::NEG_INFINITY;
    }
    configurable_terms(board, weights).total
}

/// Dispatch on [`HeuristicKind`]. Every kind returns -inf for a terminated board.
pub fn evaluate_with(kind: HeuristicKind, board: &Board, weights: &HeuristicWeights) -> f64 {
    match kind {
        HeuristicKind::Configurable => evaluate(board, weights),
        HeuristicKind::CornerSnake => corner_snake_score(board),
        HeuristicKind::Aggressive => aggressive_score(board),
    }
}

const CORNER_GRADIENT: [[f64; 4]; 4] = [
    [65536.0, 32768.0, 16384.0, 8192.0],
    [512.0, 1024.0, 2048.0, 4096.0],
    [256.0, 128.0, 64.0, 32.0],
    [2.0, 4.0, 8.0, 16.0],
];

/// Gradient dot product (indexed `[x][y]`), doubled once per empty cell.
pub fn corner_snake_score(board: &Board) -> f64 {
    assert_eq!(board.size(), 4, "corner snake gradient is defined for 4x4 boards");
    if board.is_terminated() {
        return f64::NEG_INFINITY;
    }
    let dot: f64 = board.tiles().map(|t| f64::from(t.value) * CORNER_GRADIENT[t.x][t.y]).sum();
    dot * 2f64.powi(board.count_empty() as i32)
}

/// Game score times `2^e` for `e = min(empty, 8) >= 4`, doubled per monotonic
/// fixed-x line, and times 100 when the largest tile is cornered.
pub fn aggressive_score(board: &Board) -> f64 {
    if board.is_terminated() {
        return f64::NEG_INFINITY;
    }
    let n = board.size();
    let mut score = board.score() as f64;
    let empty = board.count_empty().min(8);
    if empty >= 4 {
        score *= 2f64.powi(empty as i32);
    }
    for x in 0..n {
        let column: Vec<u32> = (0..n).map(|y| board.value_at(x, y)).collect();
        if is_monotonic(&column) {
            score *= 2.0;
        }
    }
    if is_corner(n, max_tile(board).1) {
        score *= 100.0;
    }
    score
}

/// Breakdown of a configurable evaluation, for tracing and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub final_score: f64,
    pub base_score: f64,
    /// Human-readable contributions in application order.
    pub components: Vec<String>,
    pub empty_cells: usize,
    pub monotonic_count: usize,
    pub max_value: u32,
    pub max_position: Position,
    pub in_corner: bool,
    pub best_snake_score: f64,
    pub best_snake_anchor: SnakeAnchor,
}

/// Same computation as [`evaluate`], keeping every intermediate term.
pub fn explain(board: &Board, w: &HeuristicWeights) -> Explanation {
    if board.is_terminated() {
        let (max_value, max_position) = max_tile(board);
        return Explanation {
            final_score: f64::NEG_INFINITY,
            base_score: board.score() as f64 * w.base_score_weight,
            components: Vec::new(),
            empty_cells: 0,
            monotonic_count: 0,
            max_value,
            max_position,
            in_corner: is_corner(board.size(), max_position),
            best_snake_score: 0.0,
            best_snake_anchor: SnakeAnchor::TopLeft,
        };
    }
    let t = configurable_terms(board, w);
    let mut components = vec![format!(
        "space reward: {} × {} = +{}",
        t.empty_cells, w.empty_cell_bonus, t.empty_bonus
    )];
    if t.empty_multiplied {
        components.push(format!(
            "space multiplier: ×{} (≥{} spaces)",
            w.empty_cell_multiplier, w.empty_cell_threshold
        ));
    }
    components.push(format!(
        "monotonicity: {} × {} = +{}",
        t.monotonic_count, w.monotonic_bonus, t.monotonic_bonus
    ));
    if t.in_corner {
        components.push(format!(
            "corner reward: ×{} (max value {} in corner [{},{}])",
            w.corner_multiplier, t.max_value, t.max_position.x, t.max_position.y
        ));
    }
    components.push(format!(
        "snake path: {} ÷ {} × {} = +{:.2} ({})",
        t.best_snake_score, w.snake_weight, w.snake_bonus, t.snake_bonus, t.best_snake_anchor
    ));
    Explanation {
        final_score: t.total,
        base_score: t.base,
        components,
        empty_cells: t.empty_cells,
        monotonic_count: t.monotonic_count,
        max_value: t.max_value,
        max_position: t.max_position,
        in_corner: t.in_corner,
        best_snake_score: t.best_snake_score,
        best_snake_anchor: t.best_snake_anchor,
    }
}
