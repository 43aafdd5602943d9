// Copyright (c) Addison Crump, 2025, licensed under the EUPL-1.2-or-later.

use crate::tile::is_tile_value;
use crate::{BoardValue, Dimensions};
use core::error::Error;
use core::fmt::{Display, Formatter};
use core::time::Duration;
use serde::{Deserialize, Deserializer, Serialize};

/// How a spawned tile picks its cell.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum SpawnStrategy {
    /// Start at a uniformly random cell and scan forwards (wrapping around) to the first empty
    /// one. Empty cells that follow a run of occupied cells are picked more often than others.
    #[default]
    RotationScan,
    /// Pick uniformly among all empty cells.
    Uniform,
}

/// Settings of a [`crate::Board`]. Everything but the dimensions has a default when deserialized.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(bound(deserialize = "V: BoardValue"))]
pub struct BoardConfig<V> {
    /// The size of the grid.
    pub dimensions: Dimensions<V>,
    /// How long tiles take to slide after a move. Moves are refused until this has passed.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: Duration,
    /// The value of spawned tiles, a power of two of at least 2. Deserializing rejects anything
    /// else; see [`BoardConfig::with_spawn_value`].
    #[serde(
        default = "default_spawn_value",
        deserialize_with = "deserialize_spawn_value"
    )]
    pub spawn_value: u64,
    /// The number of distinct tile appearances the host can show; merged tiles stop advancing
    /// their tier at the last one.
    #[serde(default = "default_tier_count")]
    pub tier_count: usize,
    /// Where spawned tiles land.
    #[serde(default)]
    pub spawn_strategy: SpawnStrategy,
    /// How many tiles a new game starts with.
    #[serde(default = "default_opening_tiles")]
    pub opening_tiles: usize,
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_spawn_value() -> u64 {
    2
}

fn deserialize_spawn_value<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = u64::deserialize(deserializer)?;
    if is_tile_value(value) {
        Ok(value)
    } else {
        let error = SpawnValueError(value);
        Err(<D::Error as serde::de::Error>::custom(error))
    }
}

// 2 through 2048
fn default_tier_count() -> usize {
    11
}

fn default_opening_tiles() -> usize {
    2
}

impl<V> BoardConfig<V> {
    /// A configuration with default settings for the provided dimensions.
    pub fn new(dimensions: Dimensions<V>) -> Self {
        Self {
            dimensions,
            settle_delay: default_settle_delay(),
            spawn_value: default_spawn_value(),
            tier_count: default_tier_count(),
            spawn_strategy: SpawnStrategy::default(),
            opening_tiles: default_opening_tiles(),
        }
    }

    /// Replace the settle delay. A zero delay settles every move synchronously.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Replace the spawn value, which must be a power of two of at least 2.
    pub fn with_spawn_value(mut self, spawn_value: u64) -> Result<Self, SpawnValueError> {
        if !is_tile_value(spawn_value) {
            return Err(SpawnValueError(spawn_value));
        }
        self.spawn_value = spawn_value;
        Ok(self)
    }

    /// Replace the spawn strategy.
    pub fn with_spawn_strategy(mut self, spawn_strategy: SpawnStrategy) -> Self {
        self.spawn_strategy = spawn_strategy;
        self
    }

    /// The highest tier a tile can reach.
    pub fn max_tier(&self) -> usize {
        self.tier_count.saturating_sub(1)
    }

    /// The tier a tile of `value` has, derived from how many merges separate it from a spawned
    /// tile.
    pub fn tier_of(&self, value: u64) -> usize {
        let merges = value
            .trailing_zeros()
            .saturating_sub(self.spawn_value.trailing_zeros());
        (merges as usize).min(self.max_tier())
    }
}

/// An error returned for a spawn value that is not a power of two of at least 2.
#[derive(Debug, Eq, PartialEq)]
pub struct SpawnValueError(u64);

impl SpawnValueError {
    /// The rejected value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Display for SpawnValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "cannot spawn tiles of value {} because it is not a power of two of at least 2",
            self.0
        )
    }
}

impl Error for SpawnValueError {}

impl<V> Default for BoardConfig<V>
where
    V: BoardValue,
{
    /// The classic 4 × 4 game.
    fn default() -> Self {
        let two = V::one() + V::one();
        Self::new(Dimensions {
            width: two + two,
            height: two + two,
        })
    }
}
