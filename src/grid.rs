// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

use crate::{BoardValue, Dimensions, Direction, Position, SpawnStrategy, TileId};
use alloc::vec::Vec;
use rand::Rng;

/// A single location of the grid. Its coordinates never change; only the tile occupying it does.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell<V> {
    position: Position<V>,
    tile: Option<TileId>,
}

impl<V> Cell<V> {
    /// The coordinates of this cell.
    pub fn position(&self) -> &Position<V> {
        &self.position
    }

    /// The tile occupying this cell, if any.
    pub fn tile(&self) -> Option<TileId> {
        self.tile
    }

    /// Whether no tile occupies this cell.
    pub fn is_empty(&self) -> bool {
        self.tile.is_none()
    }

    /// Whether a tile occupies this cell.
    pub fn is_occupied(&self) -> bool {
        self.tile.is_some()
    }
}

/// A fixed rectangle of cells, stored row-major.
#[derive(Clone, Debug)]
pub struct Grid<V> {
    dim: Dimensions<V>,
    cells: Vec<Cell<V>>,
}

impl<V> Grid<V>
where
    V: BoardValue,
{
    /// Create a grid of empty cells.
    pub fn new(dim: Dimensions<V>) -> Self {
        let mut cells = Vec::with_capacity(dim.area());
        let mut y = V::zero();
        while y < dim.height {
            let mut x = V::zero();
            while x < dim.width {
                cells.push(Cell {
                    position: Position { x, y },
                    tile: None,
                });
                x += V::one();
            }
            y += V::one();
        }
        Self { dim, cells }
    }

    /// Fetches the cell at the requested position, or [`None`] if the position lies outside of the
    /// grid.
    pub fn get_cell<P: Into<Position<V>>>(&self, position: P) -> Option<&Cell<V>> {
        position
            .into()
            .as_index(&self.dim)
            .and_then(|idx| self.cells.get(idx))
    }

    /// Fetches the neighbour of `cell` in direction `dir`, or [`None`] at the edge of the grid.
    pub fn get_adjacent_cell(&self, cell: &Cell<V>, dir: Direction) -> Option<&Cell<V>> {
        self.adjacent(&cell.position, dir)
            .and_then(|position| self.get_cell(position))
    }

    /// The position next to `position` in direction `dir`, if it lies within the grid.
    pub fn adjacent(&self, position: &Position<V>, dir: Direction) -> Option<Position<V>> {
        position
            .shift(dir)
            .filter(|next| next.as_index(&self.dim).is_some())
    }

    /// The tile occupying `position`, if the position exists and is occupied.
    pub fn occupant(&self, position: &Position<V>) -> Option<TileId> {
        self.get_cell(*position).and_then(Cell::tile)
    }

    /// Picks an empty cell using the provided strategy, or [`None`] if the grid is full.
    pub fn random_empty_cell<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        strategy: SpawnStrategy,
    ) -> Option<&Cell<V>> {
        if self.is_full() {
            return None;
        }
        match strategy {
            SpawnStrategy::RotationScan => {
                let size = self.cells.len();
                let start = rng.random_range(0..size);
                (0..size)
                    .map(|offset| &self.cells[(start + offset) % size])
                    .find(|cell| cell.is_empty())
            }
            SpawnStrategy::Uniform => {
                let empty = self.empty_count();
                let pick = rng.random_range(0..empty);
                self.cells.iter().filter(|cell| cell.is_empty()).nth(pick)
            }
        }
    }

    pub(crate) fn set_occupant(&mut self, position: &Position<V>, tile: Option<TileId>) {
        if let Some(cell) = position
            .as_index(&self.dim)
            .and_then(|idx| self.cells.get_mut(idx))
        {
            cell.tile = tile;
        }
    }

    pub(crate) fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.tile = None;
        }
    }
}

impl<V> Grid<V> {
    /// The dimensions of the grid.
    pub fn dimensions(&self) -> &Dimensions<V> {
        &self.dim
    }

    /// The number of columns.
    pub fn width(&self) -> &V {
        &self.dim.width
    }

    /// The number of rows.
    pub fn height(&self) -> &V {
        &self.dim.height
    }

    /// The number of cells.
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// Every cell, row by row from the top.
    pub fn cells(&self) -> &[Cell<V>] {
        &self.cells
    }

    /// The number of cells without a tile.
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    /// Whether every cell holds a tile.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Cell::is_occupied)
    }
}
