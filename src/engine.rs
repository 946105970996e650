use rand::Rng;
use std::fmt;

/// A direction to move/merge tiles.
///
/// The declaration order is the search's enumeration order and therefore its
/// tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Right,
    Down,
    Left,
}

impl Move {
    /// All directions in enumeration order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Right, Move::Down, Move::Left];

    /// Unit vector `(dx, dy)`; `y` grows downwards.
    #[inline]
    pub fn vector(self) -> (isize, isize) {
        match self {
            Move::Up => (0, -1),
            Move::Right => (1, 0),
            Move::Down => (0, 1),
            Move::Left => (-1, 0),
        }
    }

    /// Position of this direction in [`Move::ALL`].
    #[inline]
    pub fn index(self) -> usize { self as usize }

    #[inline]
    pub fn arrow(self) -> char {
        match self {
            Move::Up => '↑',
            Move::Right => '→',
            Move::Down => '↓',
            Move::Left => '←',
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.arrow()) }
}

/// Grid coordinate. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

/// An occupied cell. `value` is a power of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub x: usize,
    pub y: usize,
    pub value: u32,
}

impl Tile {
    #[inline]
    pub fn position(&self) -> Position { Position { x: self.x, y: self.y } }
}

/// Read-only view of an externally owned game, used to seed a [`Board`].
pub trait LiveState {
    fn size(&self) -> usize;
    fn score(&self) -> u64;
    fn tiles(&self) -> Vec<Tile>;
}

/// Default grid width/height.
pub const DEFAULT_SIZE: usize = 4;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseBoardError {
    #[error("invalid tile value {0:?}")]
    InvalidValue(String),
    #[error("tile value {0} is not a power of two")]
    NotPowerOfTwo(u32),
    #[error("{0} cells do not form a square grid")]
    NotSquare(usize),
}

/// Square 2048 grid plus cumulative score.
///
/// Cells are stored x-major (`x * size + y`), so a linear scan visits them in
/// the same order as [`Board::available_cells`]. Boards are plain values: the
/// search clones before mutating and never shares a board between siblings.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Option<Tile>>,
    score: u64,
}

impl Default for Board {
    fn default() -> Self { Board::new(DEFAULT_SIZE) }
}

impl Board {
    /// An empty `size`×`size` board with zero score.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "board size must be positive");
        Board { size, cells: vec![None; size * size], score: 0 }
    }

    /// Copy the grid and score out of a live game. The source is only read.
    pub fn from_live<S: LiveState + ?Sized>(state: &S) -> Self {
        let mut board = Board::new(state.size());
        board.score = state.score();
        for tile in state.tiles() {
            board.add_tile(tile.x, tile.y, tile.value);
        }
        board
    }

    /// Build a board from row-major literals (`rows[y][x]`), 0 meaning empty.
    ///
    /// ```
    /// use snake_2048::engine::Board;
    /// let b = Board::from_rows(&[[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 4]]);
    /// assert_eq!(b.value_at(3, 3), 4);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Self {
        let mut board = Board::new(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            assert_eq!(row.len(), board.size, "row {y} has the wrong width");
            for (x, &value) in row.iter().enumerate() {
                if value != 0 {
                    board.add_tile(x, y, value);
                }
            }
        }
        board
    }

    /// Parse a row-major list of cell values separated by commas and/or whitespace.
    ///
    /// ```
    /// use snake_2048::engine::Board;
    /// let b = Board::parse("2,2,0,0 0,0,0,0 0,0,0,0 0,0,0,4").unwrap();
    /// assert_eq!(b.size(), 4);
    /// assert_eq!(b.highest_tile(), 4);
    /// ```
    pub fn parse(s: &str) -> Result<Self, ParseBoardError> {
        let values = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|tok| !tok.is_empty())
            .map(|tok| tok.parse::<u32>().map_err(|_| ParseBoardError::InvalidValue(tok.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let size = (values.len() as f64).sqrt() as usize;
        if size == 0 || size * size != values.len() {
            return Err(ParseBoardError::NotSquare(values.len()));
        }
        if let Some(&bad) = values.iter().find(|&&v| v != 0 && !v.is_power_of_two()) {
            return Err(ParseBoardError::NotPowerOfTwo(bad));
        }
        let rows: Vec<&[u32]> = values.chunks(size).collect();
        Ok(Board::from_rows(&rows))
    }

    /// Same board with its score replaced.
    #[inline]
    pub fn with_score(mut self, score: u64) -> Self {
        self.score = score;
        self
    }

    #[inline]
    pub fn size(&self) -> usize { self.size }

    #[inline]
    pub fn score(&self) -> u64 { self.score }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(x < self.size && y < self.size, "cell ({x}, {y}) outside a {0}x{0} board", self.size);
        x * self.size + y
    }

    /// True if `(x, y)` lies on the grid.
    #[inline]
    pub fn within_bounds(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> Option<Tile> { self.cells[self.index(x, y)] }

    /// Tile value at `(x, y)`, 0 when empty.
    #[inline]
    pub fn value_at(&self, x: usize, y: usize) -> u32 { self.cell(x, y).map_or(0, |t| t.value) }

    /// Place a tile, overwriting whatever was there.
    ///
    /// Game validity (the cell being empty) is the caller's business.
    #[inline]
    pub fn add_tile(&mut self, x: usize, y: usize, value: u32) {
        assert!(value.is_power_of_two(), "tile value {value} is not a power of two");
        let idx = self.index(x, y);
        self.cells[idx] = Some(Tile { x, y, value });
    }

    /// Empty positions, x outer and y inner.
    pub fn available_cells(&self) -> Vec<Position> {
        let mut out = Vec::with_capacity(self.cells.len());
        for x in 0..self.size {
            for y in 0..self.size {
                if self.cells[x * self.size + y].is_none() {
                    out.push(Position { x, y });
                }
            }
        }
        out
    }

    #[inline]
    pub fn count_empty(&self) -> usize { self.cells.iter().filter(|c| c.is_none()).count() }

    /// Occupied cells in scan order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ { self.cells.iter().flatten() }

    /// Highest tile value, 0 on an empty board.
    pub fn highest_tile(&self) -> u32 { self.tiles().map(|t| t.value).max().unwrap_or(0) }

    /// Value matrix indexed `[x][y]`, 0 for empty cells.
    pub fn grid(&self) -> Vec<Vec<u32>> {
        (0..self.size)
            .map(|x| (0..self.size).map(|y| self.value_at(x, y)).collect())
            .collect()
    }

    /// True iff the board is full and no horizontal or vertical neighbours match.
    ///
    /// ```
    /// use snake_2048::engine::Board;
    /// assert!(!Board::default().is_terminated());
    /// ```
    pub fn is_terminated(&self) -> bool {
        if self.cells.iter().any(Option::is_none) {
            return false;
        }
        for x in 0..self.size {
            for y in 0..self.size {
                let value = self.value_at(x, y);
                if x + 1 < self.size && self.value_at(x + 1, y) == value {
                    return false;
                }
                if y + 1 < self.size && self.value_at(x, y + 1) == value {
                    return false;
                }
            }
        }
        true
    }

    /// Walk from `from` along `direction` through empty cells.
    ///
    /// Returns the last empty position reached (`from` itself if blocked at
    /// once) and the blocking cell beyond it, or `None` when the walk hit the edge.
    pub fn find_farthest_position(&self, from: Position, direction: Move) -> (Position, Option<Position>) {
        let (dx, dy) = direction.vector();
        let mut farthest = from;
        loop {
            let nx = farthest.x as isize + dx;
            let ny = farthest.y as isize + dy;
            if !self.within_bounds(nx, ny) {
                return (farthest, None);
            }
            let next = Position { x: nx as usize, y: ny as usize };
            if self.cell(next.x, next.y).is_some() {
                return (farthest, Some(next));
            }
            farthest = next;
        }
    }

    fn traversals(&self, direction: Move) -> (Vec<usize>, Vec<usize>) {
        let (dx, dy) = direction.vector();
        let mut xs: Vec<usize> = (0..self.size).collect();
        let mut ys: Vec<usize> = (0..self.size).collect();
        // Farthest cells in the direction of travel go first.
        if dx == 1 {
            xs.reverse();
        }
        if dy == 1 {
            ys.reverse();
        }
        (xs, ys)
    }

    /// Slide and merge every tile towards `direction`, adding merged values to the score.
    ///
    /// A tile produced by a merge cannot merge again in the same call, so
    /// `[2, 2, 2, 2]` becomes `[4, 4, 0, 0]`. Returns whether anything moved.
    ///
    /// ```
    /// use snake_2048::engine::{Board, Move};
    /// let mut b = Board::from_rows(&[[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
    /// assert!(b.shift(Move::Left));
    /// assert_eq!(b.grid()[1][0], 4);
    /// assert_eq!(b.score(), 8);
    /// ```
    pub fn shift(&mut self, direction: Move) -> bool {
        let (xs, ys) = self.traversals(direction);
        let mut merged = vec![false; self.cells.len()];
        let mut moved = false;
        for &x in &xs {
            for &y in &ys {
                let origin = self.index(x, y);
                let Some(tile) = self.cells[origin] else { continue };
                let (farthest, next) = self.find_farthest_position(tile.position(), direction);

                let merge_at = next.filter(|p| {
                    let idx = self.index(p.x, p.y);
                    !merged[idx] && self.cells[idx].is_some_and(|other| other.value == tile.value)
                });
                if let Some(at) = merge_at {
                    let target = self.index(at.x, at.y);
                    let value = tile.value * 2;
                    self.cells[origin] = None;
                    self.cells[target] = Some(Tile { x: at.x, y: at.y, value });
                    merged[target] = true;
                    self.score += u64::from(value);
                    moved = true;
                } else if farthest != tile.position() {
                    let target = self.index(farthest.x, farthest.y);
                    self.cells[origin] = None;
                    self.cells[target] = Some(Tile { x: farthest.x, y: farthest.y, value: tile.value });
                    moved = true;
                }
            }
        }
        moved
    }

    /// Clone and shift; `None` when the move would be a no-op.
    #[inline]
    pub fn shifted(&self, direction: Move) -> Option<Board> {
        let mut next = self.clone();
        next.shift(direction).then_some(next)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty slot.
    ///
    /// Returns the position used, or `None` if the board is full.
    ///
    /// ```
    /// use snake_2048::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let mut b = Board::default();
    /// b.add_random_tile(&mut rng);
    /// b.add_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn add_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Position> {
        let empty = self.available_cells();
        if empty.is_empty() {
            return None;
        }
        let pos = empty[rng.gen_range(0..empty.len())];
        self.add_tile(pos.x, pos.y, generate_random_tile(rng));
        Some(pos)
    }
}

impl LiveState for Board {
    fn size(&self) -> usize { self.size }
    fn score(&self) -> u64 { self.score }
    fn tiles(&self) -> Vec<Tile> { self.cells.iter().flatten().copied().collect() }
}

fn generate_random_tile<R: Rng + ?Sized>(rng: &mut R) -> u32 { if rng.gen_range(0..10) < 9 { 2 } else { 4 } }

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<u32>> = (0..self.size)
            .map(|y| (0..self.size).map(|x| self.value_at(x, y)).collect())
            .collect();
        write!(f, "Board(score={}, {:?})", self.score, rows)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.size * 8);
        writeln!(f)?;
        for y in 0..self.size {
            if y > 0 {
                writeln!(f, "{rule}")?;
            }
            let row: Vec<String> = (0..self.size).map(|x| format_val(self.value_at(x, y))).collect();
            writeln!(f, "{}", row.join("|"))?;
        }
        Ok(())
    }
}

fn format_val(val: u32) -> String {
    match val {
        0 => String::from("       "),
        x => format!("{:^7}", x),
    }
}
