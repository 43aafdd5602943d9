// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

//! tile-merge: the board rules of a 2048-style sliding tile puzzle.
//!
//! This library implements the simulation core of the game: tiles slide across a rectangular grid
//! in one of four directions, equal tiles merge into one tile of double the value, a new tile
//! spawns after every move that changed the board, and the game ends once the grid is full and no
//! two neighbouring tiles can merge. Rendering, animation and input handling are left to the host;
//! the host drives a [`Board`] (or a [`Session`], which adds scoring) through explicit calls and
//! learns about what happened through a [`BoardListener`].
//!
//! Coordinates follow screen conventions: `(0, 0)` is the top-left cell, `x` grows to the right
//! and `y` grows downwards, so [`Direction::Up`] moves tiles towards row `0`.

#![no_std]

use core::cmp::Ordering;
use core::error::Error;
use core::fmt::{Debug, Display, Formatter};
use core::num::IntErrorKind;
use core::ops::{Add, AddAssign, Neg};
use num_traits::{CheckedAdd, CheckedMul, CheckedSub, One, Unsigned, Zero};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

extern crate alloc;

mod board;
mod config;
mod grid;
mod session;
mod tile;

pub use board::{
    Board, BoardListener, MoveResponse, PlacementError, PlacementErrorType, Snapshot, SpawnError,
    Tick,
};
pub use config::{BoardConfig, SpawnStrategy, SpawnValueError};
pub use grid::{Cell, Grid};
pub use session::{HIGH_SCORE_KEY, KeyValueStore, MemoryStore, Session};
pub use tile::{Tile, TileId};

/// A direction for a move. A direction may be flipped with [`Neg`] (i.e. `-`).
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum Direction {
    /// Towards the top edge (row `0`).
    Up,
    /// Towards the bottom edge.
    Down,
    /// Towards the left edge (column `0`).
    Left,
    /// Towards the right edge.
    Right,
}

impl Direction {
    /// Every direction, in the order adjacency checks visit them.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// The logical unit vector of this direction, with `y` pointing up: `Up` is `(0, 1)`. Grid
    /// coordinates grow downwards, so stepping in a direction maps to `(x + dx, y - dy)`.
    pub fn vector(&self) -> (i8, i8) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        })
    }
}

impl Neg for Direction {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Marker trait: specifies that a value may be used for grid coordinates and dimensions.
pub trait BoardValue:
    One
    + Ord
    + Add<Output = Self>
    + CheckedAdd
    + CheckedSub
    + AddAssign
    + Copy
    + Into<usize>
    + Zero
    + CheckedMul
    + Debug
    + Display
    + Unsigned
    + DeserializeOwned
    + Serialize
    + 'static
{
}

impl<V> BoardValue for V where
    V: One
        + Ord
        + Add<Output = Self>
        + CheckedAdd
        + CheckedSub
        + AddAssign
        + Copy
        + Into<usize>
        + Zero
        + CheckedMul
        + Debug
        + Display
        + Unsigned
        + DeserializeOwned
        + Serialize
        + 'static
{
}

/// A position in the grid (eff., a coordinate pair).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Position<V> {
    x: V,
    y: V,
}

impl<V> Position<V> {
    /// The column of the position.
    pub fn x(&self) -> &V {
        &self.x
    }

    /// The row of the position.
    pub fn y(&self) -> &V {
        &self.y
    }
}

impl<V> Position<V>
where
    V: BoardValue,
{
    /// The position encoded as a row-major index into a grid with the provided dimensions, or
    /// `None` if the position lies outside of it.
    pub fn as_index(&self, dim: &Dimensions<V>) -> Option<usize> {
        if self.x >= dim.width || self.y >= dim.height {
            return None;
        }
        let x: usize = self.x.into();
        let y: usize = self.y.into();
        Some(y * dim.width.into() + x)
    }

    /// Get the position one unit away from this position in the provided direction `dir`, or
    /// `None` if the step would leave the coordinate space. The result is not bounds-checked
    /// against any grid; see [`Grid::adjacent`].
    pub fn shift(&self, dir: Direction) -> Option<Self> {
        let (dx, dy) = dir.vector();
        Some(Self {
            x: step(self.x, dx)?,
            y: step(self.y, -dy)?,
        })
    }
}

fn step<V>(coordinate: V, delta: i8) -> Option<V>
where
    V: BoardValue,
{
    match delta.cmp(&0) {
        Ordering::Greater => coordinate.checked_add(&V::one()),
        Ordering::Less => coordinate.checked_sub(&V::one()),
        Ordering::Equal => Some(coordinate),
    }
}

impl<V> From<(V, V)> for Position<V> {
    fn from((x, y): (V, V)) -> Self {
        Self { x, y }
    }
}

impl<V> Display for Position<V>
where
    V: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The dimensions of a grid in terms of columns (width) and rows (height). Deserializing applies
/// the same checks as [`Dimensions::try_from`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(
    try_from = "RawDimensions<V>",
    bound(deserialize = "V: BoardValue")
)]
pub struct Dimensions<V> {
    width: V,
    height: V,
}

#[derive(Deserialize)]
struct RawDimensions<V> {
    width: V,
    height: V,
}

impl<V> Dimensions<V> {
    /// The number of columns.
    pub fn width(&self) -> &V {
        &self.width
    }

    /// The number of rows.
    pub fn height(&self) -> &V {
        &self.height
    }
}

impl<V> Dimensions<V>
where
    V: BoardValue,
{
    /// The number of cells covered by these dimensions.
    pub fn area(&self) -> usize {
        let width: usize = self.width.into();
        let height: usize = self.height.into();
        width * height
    }
}

/// An error associated with the creation of the dimensions.
#[derive(Debug)]
pub struct DimensionError(IntErrorKind);

impl Display for DimensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let reason = match self.0 {
            IntErrorKind::PosOverflow => "the dimensions were too large",
            IntErrorKind::Zero => "the dimensions have zero area",
            _ => unreachable!(),
        };
        f.write_fmt(format_args!("dimensions could not be used: {reason}"))
    }
}

impl Error for DimensionError {}

impl<V> TryFrom<(V, V)> for Dimensions<V>
where
    V: BoardValue,
{
    type Error = DimensionError;

    fn try_from((width, height): (V, V)) -> Result<Self, Self::Error> {
        if let Some(size) = width.checked_mul(&height) {
            if size.is_zero() {
                Err(DimensionError(IntErrorKind::Zero))
            } else {
                Ok(Self { width, height })
            }
        } else {
            Err(DimensionError(IntErrorKind::PosOverflow))
        }
    }
}

impl<V> TryFrom<RawDimensions<V>> for Dimensions<V>
where
    V: BoardValue,
{
    type Error = DimensionError;

    fn try_from(raw: RawDimensions<V>) -> Result<Self, Self::Error> {
        Self::try_from((raw.width, raw.height))
    }
}
