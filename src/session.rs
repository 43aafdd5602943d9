// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

use crate::{Board, BoardListener, BoardValue, Direction, MoveResponse, SpawnError, Tick};
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use core::time::Duration;
use rand::Rng;
use rand::rngs::SmallRng;

/// The key the high score is stored under.
pub const HIGH_SCORE_KEY: &str = "hiscore";

/// Integer storage that outlives a game, e.g. the host's preferences.
pub trait KeyValueStore {
    /// The integer stored under `key`, or `default` if there is none.
    fn get_int(&self, key: &str, default: i64) -> i64;

    /// Store `value` under `key`.
    fn set_int(&mut self, key: &str, value: i64);
}

/// A [`KeyValueStore`] kept in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(BTreeMap<String, i64>);

impl KeyValueStore for MemoryStore {
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.0.get(key).copied().unwrap_or(default)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.0.insert(key.to_string(), value);
    }
}

#[derive(Debug)]
struct Scoreboard<S> {
    score: u64,
    game_over: bool,
    store: S,
}

impl<S> Scoreboard<S>
where
    S: KeyValueStore,
{
    fn high_score(&self) -> u64 {
        u64::try_from(self.store.get_int(HIGH_SCORE_KEY, 0)).unwrap_or(0)
    }

    fn set_score(&mut self, score: u64) {
        self.score = score;
        self.save_high_score();
    }

    fn save_high_score(&mut self) {
        if self.score > self.high_score() {
            log::debug!("new high score: {}", self.score);
            self.store
                .set_int(HIGH_SCORE_KEY, i64::try_from(self.score).unwrap_or(i64::MAX));
        }
    }

    fn game_over(&mut self) {
        log::debug!("game over at {} points", self.score);
        self.game_over = true;
    }
}

impl<V, S> BoardListener<V> for Scoreboard<S>
where
    S: KeyValueStore,
{
    fn on_score_delta(&mut self, points: u64) {
        self.set_score(self.score + points);
    }

    fn on_game_over(&mut self) {
        self.game_over();
    }
}

/// A game session: a board plus the score, high score and game-over state around it.
#[derive(Debug)]
pub struct Session<V, R = SmallRng, S = MemoryStore> {
    board: Board<V, R>,
    scores: Scoreboard<S>,
}

impl<V, R, S> Session<V, R, S>
where
    V: BoardValue,
    R: Rng,
    S: KeyValueStore,
{
    /// Wrap a board. Call [`Session::new_game`] to set up the opening tiles.
    pub fn new(board: Board<V, R>, store: S) -> Self {
        Self {
            board,
            scores: Scoreboard {
                score: 0,
                game_over: false,
                store,
            },
        }
    }

    /// Reset the score, empty the board and spawn the opening tiles.
    pub fn new_game(&mut self) -> Result<(), SpawnError> {
        self.scores.set_score(0);
        self.scores.game_over = false;
        self.board.clear_board();
        for _ in 0..self.board.config().opening_tiles {
            self.board.create_tile()?;
        }
        log::debug!("new game, high score {}:\n{}", self.high_score(), self.board);
        Ok(())
    }

    /// Hand a move to the board, unless the game is over.
    pub fn request_move(&mut self, dir: Direction) -> MoveResponse {
        if self.scores.game_over {
            return MoveResponse::Ignored;
        }
        self.board.request_move(dir, &mut self.scores)
    }

    /// Advance the board by one tick of the host's loop; see [`Board::update`].
    pub fn update(&mut self, input: Option<Direction>, elapsed: Duration) -> Tick {
        let input = input.filter(|_| !self.scores.game_over);
        self.board.update(input, elapsed, &mut self.scores)
    }

    /// Finish a pending move immediately; see [`Board::settle_now`].
    pub fn settle_now(&mut self) -> Option<bool> {
        self.board.settle_now(&mut self.scores)
    }

    /// Add `points` to the score, saving the high score if it was beaten.
    pub fn increase_score(&mut self, points: u64) {
        self.scores.set_score(self.scores.score + points);
    }

    /// Store the current score as the high score if it beats the stored one.
    pub fn save_high_score(&mut self) {
        self.scores.save_high_score();
    }

    /// End the game: further moves are ignored until the next [`Session::new_game`].
    pub fn game_over(&mut self) {
        self.scores.game_over();
    }

    /// The score of the current game.
    pub fn score(&self) -> u64 {
        self.scores.score
    }

    /// The best score stored so far.
    pub fn high_score(&self) -> u64 {
        self.scores.high_score()
    }

    /// Whether the current game has ended.
    pub fn is_game_over(&self) -> bool {
        self.scores.game_over
    }

    /// The board being played.
    pub fn board(&self) -> &Board<V, R> {
        &self.board
    }

    /// The store holding the high score.
    pub fn store(&self) -> &S {
        &self.scores.store
    }
}
