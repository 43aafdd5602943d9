// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

use crate::Position;
use alloc::vec::Vec;
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// Identifies a live tile. Identifiers of consumed tiles never resolve again, even after their
/// storage has been reused by a newer tile.
#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct TileId {
    slot: usize,
    generation: u32,
}

impl Display for TileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}v{}", self.slot, self.generation)
    }
}

// Powers of two from 2 upwards.
pub(crate) fn is_tile_value(value: u64) -> bool {
    value >= 2 && value.is_power_of_two()
}

/// A numbered piece on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tile<V> {
    value: u64,
    tier: usize,
    cell: Option<Position<V>>,
    locked: bool,
}

impl<V> Tile<V> {
    pub(crate) fn new(value: u64, tier: usize) -> Self {
        Self {
            value,
            tier,
            cell: None,
            locked: false,
        }
    }

    /// The number shown on the tile.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// The appearance tier of the tile: `0` for freshly spawned tiles, advanced by one with every
    /// merge and capped by [`crate::BoardConfig::tier_count`].
    pub fn tier(&self) -> usize {
        self.tier
    }

    /// The position of the cell this tile occupies.
    pub fn cell(&self) -> Option<&Position<V>> {
        self.cell.as_ref()
    }

    /// Whether this tile already absorbed another tile during the current move.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub(crate) fn place(&mut self, cell: Position<V>) {
        self.cell = Some(cell);
    }

    pub(crate) fn take_cell(&mut self) -> Option<Position<V>> {
        self.cell.take()
    }

    /// Whether `other` can slide into this tile. The doubled value has to fit in a `u64`.
    pub(crate) fn accepts(&self, other: &Tile<V>) -> bool {
        self.value == other.value && !self.locked && self.value.checked_mul(2).is_some()
    }

    pub(crate) fn absorb(&mut self, max_tier: usize) -> u64 {
        self.value *= 2;
        self.tier = (self.tier + 1).min(max_tier);
        self.locked = true;
        self.value
    }

    pub(crate) fn unlock(&mut self) {
        self.locked = false;
    }
}

#[derive(Clone, Debug)]
struct Slot<V> {
    generation: u32,
    tile: Option<Tile<V>>,
}

/// The live tiles of a board, with constant-time insertion and removal by identity.
#[derive(Clone, Debug)]
pub(crate) struct TileSet<V> {
    slots: Vec<Slot<V>>,
    free: Vec<usize>,
    len: usize,
}

impl<V> TileSet<V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(&mut self, tile: Tile<V>) -> TileId {
        self.len += 1;
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot];
            entry.tile = Some(tile);
            TileId {
                slot,
                generation: entry.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                tile: Some(tile),
            });
            TileId {
                slot: self.slots.len() - 1,
                generation: 0,
            }
        }
    }

    pub(crate) fn remove(&mut self, id: TileId) -> Option<Tile<V>> {
        let entry = self.slots.get_mut(id.slot)?;
        if entry.generation != id.generation {
            return None;
        }
        let tile = entry.tile.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.slot);
        self.len -= 1;
        Some(tile)
    }

    pub(crate) fn get(&self, id: TileId) -> Option<&Tile<V>> {
        self.slots
            .get(id.slot)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.tile.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: TileId) -> Option<&mut Tile<V>> {
        self.slots
            .get_mut(id.slot)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.tile.as_mut())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (TileId, &Tile<V>)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| {
            entry.tile.as_ref().map(|tile| {
                (
                    TileId {
                        slot,
                        generation: entry.generation,
                    },
                    tile,
                )
            })
        })
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile<V>> {
        self.slots.iter_mut().filter_map(|entry| entry.tile.as_mut())
    }

    pub(crate) fn clear(&mut self) {
        for slot in 0..self.slots.len() {
            let entry = &mut self.slots[slot];
            if entry.tile.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(slot);
            }
        }
        self.len = 0;
    }
}

#[cfg(test)]
mod test {
    use crate::tile::{Tile, TileSet, is_tile_value};

    #[test]
    fn consumed_ids_stay_dead() {
        let mut tiles = TileSet::<u8>::with_capacity(4);
        let first = tiles.insert(Tile::new(2, 0));
        let second = tiles.insert(Tile::new(4, 1));
        assert_eq!(2, tiles.len());

        assert_eq!(Some(2), tiles.remove(first).map(|t| t.value()));
        assert!(tiles.get(first).is_none());
        assert!(tiles.remove(first).is_none());

        let reused = tiles.insert(Tile::new(8, 2));
        assert_ne!(first, reused);
        assert!(tiles.get(first).is_none());
        assert_eq!(Some(8), tiles.get(reused).map(|t| t.value()));
        assert_eq!(Some(4), tiles.get(second).map(|t| t.value()));
        assert_eq!(2, tiles.iter().count());

        tiles.clear();
        assert_eq!(0, tiles.len());
        assert!(tiles.get(second).is_none());
        assert_eq!(0, tiles.iter().count());
    }

    #[test]
    fn absorbing_doubles_and_caps_the_tier() {
        let mut tile = Tile::<u8>::new(2, 0);
        assert_eq!(4, tile.absorb(1));
        assert!(tile.is_locked());
        assert_eq!(8, tile.absorb(1));
        assert_eq!(1, tile.tier());
        tile.unlock();
        assert!(!tile.is_locked());
    }

    #[test]
    fn only_fitting_equal_unlocked_tiles_accept() {
        let mut blocker = Tile::<u8>::new(4, 1);
        assert!(blocker.accepts(&Tile::new(4, 1)));
        assert!(!blocker.accepts(&Tile::new(2, 0)));
        blocker.absorb(10);
        assert!(!blocker.accepts(&Tile::new(8, 2)));

        let top = Tile::<u8>::new(1 << 63, 10);
        assert!(!top.accepts(&Tile::new(1 << 63, 10)));
        assert!(Tile::<u8>::new(1 << 62, 10).accepts(&Tile::new(1 << 62, 10)));
    }

    #[test]
    fn tile_values_are_powers_of_two_from_two() {
        assert!(!is_tile_value(0));
        assert!(!is_tile_value(1));
        assert!(!is_tile_value(3));
        assert!(is_tile_value(2));
        assert!(is_tile_value(1 << 63));
    }
}
