//! The live game and the loop that plays it.
//!
//! [`Game`] owns the real board and applies full game rules (random 2/4
//! spawns). The search never sees it directly: every turn it gets a fresh
//! [`Board`] snapshot through [`LiveState`].

use rand::Rng;
use tracing::{debug, info};

use crate::engine::{Board, LiveState, Move, Tile};
use crate::expectimax::Policy;

/// A game in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    moves: u64,
}

impl Game {
    /// New `size`×`size` game with two random starting tiles.
    pub fn new<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut board = Board::new(size);
        board.add_random_tile(rng);
        board.add_random_tile(rng);
        Self { board, moves: 0 }
    }

    /// Resume from a known position.
    pub fn from_board(board: Board) -> Self { Self { board, moves: 0 } }

    #[inline]
    pub fn board(&self) -> &Board { &self.board }

    #[inline]
    pub fn moves(&self) -> u64 { self.moves }

    #[inline]
    pub fn is_over(&self) -> bool { self.board.is_terminated() }

    /// Play `direction` and spawn a random tile if anything moved.
    ///
    /// Returns false, leaving the game untouched, for a no-op move.
    pub fn apply<R: Rng + ?Sized>(&mut self, direction: Move, rng: &mut R) -> bool {
        if !self.board.shift(direction) {
            return false;
        }
        self.moves += 1;
        self.board.add_random_tile(rng);
        true
    }
}

impl LiveState for Game {
    fn size(&self) -> usize { self.board.size() }
    fn score(&self) -> u64 { self.board.score() }
    fn tiles(&self) -> Vec<Tile> { self.board.tiles().copied().collect() }
}

/// How a finished (or stopped) game ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub moves: u64,
    pub score: u64,
    pub highest_tile: u32,
    /// Search nodes visited over the whole game.
    pub nodes: u64,
}

impl GameSummary {
    fn of(game: &Game, nodes: u64) -> Self {
        Self { moves: game.moves(), score: game.board().score(), highest_tile: game.board().highest_tile(), nodes }
    }
}

/// Drive `game` with `policy` until it ends, the policy gives up, or
/// `max_moves` moves have been played.
///
/// `on_move` is called after every applied move; the binary uses it for its
/// status line.
pub fn play<P, R, F>(game: &mut Game, policy: &mut P, rng: &mut R, max_moves: Option<u64>, mut on_move: F) -> GameSummary
where
    P: Policy + ?Sized,
    R: Rng + ?Sized,
    F: FnMut(&Game),
{
    let mut nodes = 0u64;
    loop {
        if game.is_over() {
            break;
        }
        if max_moves.is_some_and(|limit| game.moves() >= limit) {
            debug!(moves = game.moves(), "step limit reached");
            break;
        }
        let snapshot = Board::from_live(&*game);
        let Some(direction) = policy.next_move(&snapshot) else {
            debug!("policy returned no move");
            break;
        };
        nodes += policy.stats().nodes;
        if !game.apply(direction, rng) {
            // A searcher only returns legal moves; anything else ends the game.
            debug!(%direction, "policy chose a no-op move");
            break;
        }
        on_move(game);
    }
    let summary = GameSummary::of(game, nodes);
    info!(
        moves = summary.moves,
        score = summary.score,
        highest_tile = summary.highest_tile,
        nodes = summary.nodes,
        over = game.is_over(),
        "game finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::{Expectimax, ExpectimaxConfig, ExpectimaxParallel, SearchStats};
    use rand::{rngs::StdRng, SeedableRng};

    /// Always tries the same direction.
    struct Stubborn(Move);

    impl Policy for Stubborn {
        fn next_move(&mut self, _: &Board) -> Option<Move> { Some(self.0) }
        fn stats(&self) -> SearchStats { SearchStats { nodes: 1, leaves: 1 } }
    }

    #[test]
    fn new_game_has_two_tiles() {
        let mut rng = StdRng::seed_from_u64(7);
        let game = Game::new(4, &mut rng);
        assert_eq!(game.board().tiles().count(), 2);
        assert_eq!(game.moves(), 0);
        assert!(game.board().tiles().all(|t| t.value == 2 || t.value == 4));
        assert_eq!(LiveState::tiles(&game).len(), 2);
    }

    #[test]
    fn noop_move_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let b = Board::from_rows(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let mut game = Game::from_board(b.clone());
        assert!(!game.apply(Move::Up, &mut rng));
        assert_eq!(game.board(), &b);
        assert!(game.apply(Move::Down, &mut rng));
        assert_eq!(game.moves(), 1);
        assert_eq!(game.board().tiles().count(), 2);
    }

    #[test]
    fn step_limit_stops_play() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut game = Game::new(4, &mut rng);
        let mut ex = Expectimax::with_config(ExpectimaxConfig { depth: 1, ..Default::default() });
        let mut seen = 0;
        let summary = play(&mut game, &mut ex, &mut rng, Some(5), |_| seen += 1);
        assert_eq!(summary.moves, 5);
        assert_eq!(seen, 5);
        assert!(summary.nodes > 0);
        assert_eq!(summary.score, game.board().score());
    }

    #[test]
    fn stubborn_policy_stops_on_noop() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = Game::from_board(Board::from_rows(&[[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]));
        let summary = play(&mut game, &mut Stubborn(Move::Up), &mut rng, None, |_| {});
        assert_eq!(summary.moves, 0);
        assert_eq!(summary.highest_tile, 2);
    }

    #[test]
    fn dead_game_plays_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let dead = Board::from_rows(&[[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let mut game = Game::from_board(dead);
        let mut ex = ExpectimaxParallel::new();
        let summary = play(&mut game, &mut ex, &mut rng, None, |_| {});
        assert_eq!(summary, GameSummary { moves: 0, score: 0, highest_tile: 4, nodes: 0 });
    }

    #[test]
    fn seeded_games_are_reproducible() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(2048);
            let mut game = Game::new(4, &mut rng);
            let mut ex = ExpectimaxParallel::with_config(ExpectimaxConfig { depth: 0, ..Default::default() });
            play(&mut game, &mut ex, &mut rng, Some(40), |_| {})
        };
        assert_eq!(run(), run());
    }
}
