// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

use crate::grid::Grid;
use crate::tile::{Tile, TileSet, is_tile_value};
use crate::{BoardConfig, BoardValue, Dimensions, Direction, Position, TileId};
use alloc::vec::Vec;
use core::error::Error;
use core::fmt::{Display, Formatter};
use core::time::Duration;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Receives what happens on a board. Every method defaults to doing nothing, so implementors only
/// pick the events they care about; `()` ignores everything.
#[allow(unused_variables)]
pub trait BoardListener<V> {
    /// A merge produced a tile worth `points`.
    fn on_score_delta(&mut self, points: u64) {}

    /// The board filled up with no merge left. Reported once per game.
    fn on_game_over(&mut self) {}

    /// A tile of `value` appeared at `position`.
    fn on_tile_spawned(&mut self, tile: TileId, position: Position<V>, value: u64) {}

    /// A tile slid from `from` to the empty cell `to`.
    fn on_tile_moved(&mut self, tile: TileId, from: Position<V>, to: Position<V>) {}

    /// `consumed` slid into `into` at `position`, which now holds `value`. `consumed` is gone.
    fn on_tile_merged(
        &mut self,
        consumed: TileId,
        into: TileId,
        position: Position<V>,
        value: u64,
    ) {
    }
}

impl<V> BoardListener<V> for () {}

/// How the board reacted to a move request.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MoveResponse {
    /// The board was still settling the previous move, or the game is over; nothing happened.
    Ignored,
    /// No tile could move in that direction.
    Unchanged,
    /// Tiles moved; the spawn and game-over check follow once the settle delay has passed.
    Settling,
    /// Tiles moved and the board settled right away.
    Settled {
        /// Whether the board ended up in a terminal state.
        game_over: bool,
    },
}

/// The outcome of one [`Board::update`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Tick {
    /// Set if a pending move settled during this tick; holds whether the game ended.
    pub settled: Option<bool>,
    /// Set if an input was handed to the board during this tick.
    pub response: Option<MoveResponse>,
}

/// An error returned when a tile is spawned on a full grid.
#[derive(Debug)]
pub enum SpawnError {
    /// Every cell was occupied.
    GridFull,
}

impl Display for SpawnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            SpawnError::GridFull => f.write_str("cannot spawn a tile because the grid is full"),
        }
    }
}

impl Error for SpawnError {}

/// A type of invalid placement, associated with a [`PlacementError`].
#[derive(Debug)]
pub enum PlacementErrorType {
    /// The position lies outside of the grid.
    OutOfBounds,
    /// The tile with the provided identifier already occupies the position.
    Occupied(TileId),
    /// The value is not a power of two of at least two.
    InvalidValue(u64),
}

/// An error which denotes that a tile could not be placed.
#[derive(Debug)]
pub struct PlacementError<V> {
    position: Position<V>,
    variant: PlacementErrorType,
}

impl<V> PlacementError<V> {
    /// The position the tile was meant for.
    pub fn position(&self) -> &Position<V> {
        &self.position
    }

    /// Why the placement failed.
    pub fn variant(&self) -> &PlacementErrorType {
        &self.variant
    }
}

impl<V> Display for PlacementError<V>
where
    V: BoardValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.variant {
            PlacementErrorType::OutOfBounds => f.write_fmt(format_args!(
                "cannot place a tile at {} because it lies outside of the grid",
                self.position
            )),
            PlacementErrorType::Occupied(other) => f.write_fmt(format_args!(
                "cannot place a tile at {} because tile {other} already occupies it",
                self.position
            )),
            PlacementErrorType::InvalidValue(value) => f.write_fmt(format_args!(
                "cannot place a tile of value {value} at {} because it is not a power of two",
                self.position
            )),
        }
    }
}

impl<V> Error for PlacementError<V> where V: BoardValue {}

/// The tiles of a settled board, suitable for saving and restoring a game.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: BoardValue"))]
pub struct Snapshot<V> {
    dim: Dimensions<V>,
    tiles: Vec<(Position<V>, u64)>,
}

impl<V> Snapshot<V> {
    /// The dimensions of the captured grid.
    pub fn dimensions(&self) -> &Dimensions<V> {
        &self.dim
    }

    /// The position and value of every captured tile, row by row from the top.
    pub fn tiles(&self) -> &[(Position<V>, u64)] {
        &self.tiles
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Settling { waited: Duration },
    GameOver,
}

/// The board: a grid, the tiles on it, and the rules moving them.
#[derive(Debug)]
pub struct Board<V, R = SmallRng> {
    config: BoardConfig<V>,
    grid: Grid<V>,
    tiles: TileSet<V>,
    phase: Phase,
    rng: R,
}

impl<V> Board<V, SmallRng>
where
    V: BoardValue,
{
    /// An empty board whose spawns are reproducible from `seed`.
    pub fn seeded(config: BoardConfig<V>, seed: u64) -> Self {
        Self::new(config, SmallRng::seed_from_u64(seed))
    }
}

impl<V, R> Board<V, R>
where
    V: BoardValue,
    R: Rng,
{
    /// An empty board drawing spawn positions from `rng`.
    pub fn new(config: BoardConfig<V>, rng: R) -> Self {
        let grid = Grid::new(config.dimensions);
        let tiles = TileSet::with_capacity(grid.size());
        Self {
            config,
            grid,
            tiles,
            phase: Phase::Idle,
            rng,
        }
    }

    /// Rebuild a board from a snapshot. The snapshot's dimensions replace those of `config`.
    pub fn restore(
        mut config: BoardConfig<V>,
        rng: R,
        snapshot: &Snapshot<V>,
    ) -> Result<Self, PlacementError<V>> {
        config.dimensions = snapshot.dim;
        let mut board = Self::new(config, rng);
        for (position, value) in &snapshot.tiles {
            board.insert_tile(*position, *value)?;
        }
        if board.check_for_game_over() {
            board.phase = Phase::GameOver;
        }
        Ok(board)
    }

    /// Capture the tiles of the board.
    pub fn snapshot(&self) -> Snapshot<V> {
        let tiles = self
            .grid
            .cells()
            .iter()
            .filter_map(|cell| {
                let tile = self.tiles.get(cell.tile()?)?;
                Some((*cell.position(), tile.value()))
            })
            .collect();
        Snapshot {
            dim: *self.grid.dimensions(),
            tiles,
        }
    }

    /// Remove every tile and reopen the board for moves.
    pub fn clear_board(&mut self) {
        self.grid.clear();
        self.tiles.clear();
        self.phase = Phase::Idle;
    }

    /// Spawn a tile of the configured spawn value on a random empty cell.
    ///
    /// The caller must make sure the board is not full; if it is, [`SpawnError::GridFull`] is
    /// returned and nothing changes.
    pub fn create_tile(&mut self) -> Result<TileId, SpawnError> {
        self.spawn(&mut ()).ok_or(SpawnError::GridFull)
    }

    fn spawn<L: BoardListener<V>>(&mut self, listener: &mut L) -> Option<TileId> {
        let position = *self
            .grid
            .random_empty_cell(&mut self.rng, self.config.spawn_strategy)?
            .position();
        let value = self.config.spawn_value;
        let id = self.tiles.insert(Tile::new(value, 0));
        self.occupy(id, position);
        log::debug!("spawned {value} at {position}");
        listener.on_tile_spawned(id, position, value);
        Some(id)
    }

    /// Place a tile of an explicit value, e.g. to set up a position.
    pub fn insert_tile<P: Into<Position<V>>>(
        &mut self,
        position: P,
        value: u64,
    ) -> Result<TileId, PlacementError<V>> {
        let position = position.into();
        let Some(cell) = self.grid.get_cell(position) else {
            return Err(PlacementError {
                position,
                variant: PlacementErrorType::OutOfBounds,
            });
        };
        if let Some(other) = cell.tile() {
            return Err(PlacementError {
                position,
                variant: PlacementErrorType::Occupied(other),
            });
        }
        if !is_tile_value(value) {
            return Err(PlacementError {
                position,
                variant: PlacementErrorType::InvalidValue(value),
            });
        }
        let id = self
            .tiles
            .insert(Tile::new(value, self.config.tier_of(value)));
        self.occupy(id, position);
        Ok(id)
    }

    fn occupy(&mut self, id: TileId, position: Position<V>) {
        if let Some(tile) = self.tiles.get_mut(id) {
            if let Some(previous) = tile.take_cell() {
                self.grid.set_occupant(&previous, None);
            }
            tile.place(position);
            self.grid.set_occupant(&position, Some(id));
        }
    }

    /// Handle a move command: sweep the board unless it is still settling or the game is over,
    /// then settle right away if the settle delay is zero.
    pub fn request_move<L: BoardListener<V>>(
        &mut self,
        dir: Direction,
        listener: &mut L,
    ) -> MoveResponse {
        if self.phase != Phase::Idle {
            log::trace!("dropped move {dir}: board is busy");
            return MoveResponse::Ignored;
        }
        if !self.move_tiles(dir, listener) {
            return MoveResponse::Unchanged;
        }
        if self.config.settle_delay.is_zero() {
            MoveResponse::Settled {
                game_over: self.settle(listener),
            }
        } else {
            self.phase = Phase::Settling {
                waited: Duration::ZERO,
            };
            MoveResponse::Settling
        }
    }

    /// Advance the board by one tick of the host's loop. A pending move settles once `elapsed`
    /// has added up to the settle delay; afterwards, `input` is handed to [`Board::request_move`].
    pub fn update<L: BoardListener<V>>(
        &mut self,
        input: Option<Direction>,
        elapsed: Duration,
        listener: &mut L,
    ) -> Tick {
        let due = if let Phase::Settling { waited } = &mut self.phase {
            *waited = waited.saturating_add(elapsed);
            *waited >= self.config.settle_delay
        } else {
            false
        };
        let settled = due.then(|| self.settle(listener));
        let response = input.map(|dir| self.request_move(dir, listener));
        Tick { settled, response }
    }

    /// Finish a pending move immediately, for hosts that time the settle delay themselves.
    /// Returns whether the game ended, or `None` if no move was pending.
    pub fn settle_now<L: BoardListener<V>>(&mut self, listener: &mut L) -> Option<bool> {
        matches!(self.phase, Phase::Settling { .. }).then(|| self.settle(listener))
    }

    fn settle<L: BoardListener<V>>(&mut self, listener: &mut L) -> bool {
        self.phase = Phase::Idle;
        for tile in self.tiles.iter_mut() {
            tile.unlock();
        }
        if !self.is_full() {
            self.spawn(listener);
        }
        let game_over = self.check_for_game_over();
        if game_over {
            log::debug!("game over with {} tiles:\n{self}", self.tiles.len());
            self.phase = Phase::GameOver;
            listener.on_game_over();
        }
        game_over
    }

    /// Sweep every tile as far as it goes in direction `dir`, merging equal tiles, and report
    /// whether anything changed. This is the bare sweep: it neither consults nor starts the
    /// settle phase, and tiles that merged stay locked until the board settles.
    pub fn move_tiles<L: BoardListener<V>>(&mut self, dir: Direction, listener: &mut L) -> bool {
        let mut changed = false;
        for idx in self.sweep_order(dir) {
            if let Some(id) = self.grid.cells()[idx].tile() {
                changed |= self.move_tile(id, dir, listener);
            }
        }
        log::debug!("swept {dir}, changed: {changed}");
        changed
    }

    // Starts at the destination edge and walks away from it, so every tile meets the tiles in
    // front of it already in their final place. The edge row or column itself cannot move.
    fn sweep_order(&self, dir: Direction) -> Vec<usize> {
        let width: usize = (*self.grid.width()).into();
        let height: usize = (*self.grid.height()).into();
        let columns: Vec<usize> = match dir {
            Direction::Left => (1..width).collect(),
            Direction::Right => (0..width - 1).rev().collect(),
            Direction::Up | Direction::Down => (0..width).collect(),
        };
        let rows: Vec<usize> = match dir {
            Direction::Up => (1..height).collect(),
            Direction::Down => (0..height - 1).rev().collect(),
            Direction::Left | Direction::Right => (0..height).collect(),
        };
        columns
            .iter()
            .flat_map(|&x| rows.iter().map(move |&y| y * width + x))
            .collect()
    }

    fn move_tile<L: BoardListener<V>>(
        &mut self,
        id: TileId,
        dir: Direction,
        listener: &mut L,
    ) -> bool {
        let Some(from) = self.tiles.get(id).and_then(|tile| tile.cell().copied()) else {
            return false;
        };
        let mut target = None;
        let mut next = self.grid.adjacent(&from, dir);
        while let Some(position) = next {
            if let Some(other) = self.grid.occupant(&position) {
                if self.can_merge(id, other) {
                    self.merge(id, other, listener);
                    return true;
                }
                break;
            }
            target = Some(position);
            next = self.grid.adjacent(&position, dir);
        }

        if let Some(to) = target {
            self.occupy(id, to);
            log::trace!("tile {id} slid {dir} from {from} to {to}");
            listener.on_tile_moved(id, from, to);
            true
        } else {
            false
        }
    }

    fn can_merge(&self, a: TileId, b: TileId) -> bool {
        match (self.tiles.get(a), self.tiles.get(b)) {
            (Some(a), Some(b)) => b.accepts(a),
            _ => false,
        }
    }

    fn merge<L: BoardListener<V>>(&mut self, a: TileId, b: TileId, listener: &mut L) {
        let Some(mut consumed) = self.tiles.remove(a) else {
            return;
        };
        if let Some(cell) = consumed.take_cell() {
            self.grid.set_occupant(&cell, None);
        }
        let max_tier = self.config.max_tier();
        let Some(survivor) = self.tiles.get_mut(b) else {
            return;
        };
        let value = survivor.absorb(max_tier);
        let Some(position) = survivor.cell().copied() else {
            return;
        };
        log::trace!("tile {a} merged into {b} at {position}, now {value}");
        listener.on_tile_merged(a, b, position, value);
        listener.on_score_delta(value);
    }

    /// Whether the game is over: every cell is occupied and no tile has a neighbour it can
    /// merge with.
    pub fn check_for_game_over(&self) -> bool {
        if !self.is_full() {
            return false;
        }
        !self.tiles.iter().any(|(id, tile)| {
            tile.cell().is_some_and(|position| {
                Direction::ALL.iter().any(|&dir| {
                    self.grid
                        .adjacent(position, dir)
                        .and_then(|neighbour| self.grid.occupant(&neighbour))
                        .is_some_and(|other| self.can_merge(id, other))
                })
            })
        })
    }
}

impl<V, R> Board<V, R>
where
    V: BoardValue,
{
    /// The grid of the board.
    pub fn grid(&self) -> &Grid<V> {
        &self.grid
    }

    /// The settings of the board.
    pub fn config(&self) -> &BoardConfig<V> {
        &self.config
    }

    /// The live tile with the provided identifier.
    pub fn tile(&self, id: TileId) -> Option<&Tile<V>> {
        self.tiles.get(id)
    }

    /// Every live tile, in no particular order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileId, &Tile<V>)> {
        self.tiles.iter()
    }

    /// The number of live tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// The value of the tile at `position`, if any.
    pub fn value_at<P: Into<Position<V>>>(&self, position: P) -> Option<u64> {
        self.grid
            .get_cell(position)
            .and_then(|cell| cell.tile())
            .and_then(|id| self.tiles.get(id))
            .map(Tile::value)
    }

    /// Whether every cell holds a tile.
    pub fn is_full(&self) -> bool {
        self.tiles.len() == self.grid.size()
    }

    /// Whether a move is still settling; moves are refused meanwhile.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Settling { .. })
    }

    /// Whether the board reached its terminal state.
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }
}

impl<V, R> Display for Board<V, R>
where
    V: BoardValue,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let num_width = self
            .tiles
            .iter()
            .map(|(_, tile)| tile.value().checked_ilog10().map_or(1, |d| d as usize + 1))
            .max()
            .unwrap_or(1);
        let width: usize = (*self.grid.width()).into();
        for row in self.grid.cells().chunks(width) {
            for (x, cell) in row.iter().enumerate() {
                if x > 0 {
                    write!(f, " ")?;
                }
                match cell.tile().and_then(|id| self.tiles.get(id)) {
                    Some(tile) => write!(f, "{:>num_width$}", tile.value())?,
                    None => write!(f, "{:>num_width$}", ".")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
