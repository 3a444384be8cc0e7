//! Fairness-weighted picker.
//!
//! Items picked less often are more likely to come up next: after the first
//! (uniform) pick, each item weighs `1 / (1 + count)`. Every 50th pick decays
//! all counts by 10% so an early streak does not pin the distribution forever.
//!
//! `total_selections` counts picks plus the seed amounts of items added later.
//! Decay recomputes it as the sum of the decayed counts, so the "picks plus
//! seeds" relation holds up to the first decay.

use std::hash::Hash;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use crate::domain::CueError;

/// Picks between decays.
pub const DECAY_EVERY: u64 = 50;

/// Fraction removed from every count on decay.
pub const DECAY_FACTOR: f64 = 0.1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickerError {
    #[error("picker has no items")]
    Empty,
    #[error("weighted draw fell through without selecting an item")]
    SelectionFellThrough,
}

impl From<PickerError> for CueError {
    fn from(err: PickerError) -> Self {
        match err {
            PickerError::Empty => CueError::InvalidRequest(err.to_string()),
            PickerError::SelectionFellThrough => CueError::InternalInvariant(err.to_string()),
        }
    }
}

pub struct WeightedPicker<K, R = StdRng> {
    counts: IndexMap<K, u64>,
    total: u64,
    selections: u64,
    rng: R,
}

impl<K: Eq + Hash + Clone> WeightedPicker<K, StdRng> {
    pub fn with_seed(items: impl IntoIterator<Item = K>, seed: u64) -> Self {
        Self::new(items, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(items: impl IntoIterator<Item = K>) -> Self {
        Self::new(items, StdRng::from_entropy())
    }
}

impl<K: Eq + Hash + Clone, R: Rng> WeightedPicker<K, R> {
    /// Every item starts with a count of zero.
    pub fn new(items: impl IntoIterator<Item = K>, rng: R) -> Self {
        Self {
            counts: items.into_iter().map(|item| (item, 0)).collect(),
            total: 0,
            selections: 0,
            rng,
        }
    }

    pub fn pick(&mut self) -> Result<K, PickerError> {
        if self.counts.is_empty() {
            return Err(PickerError::Empty);
        }

        let index = if self.selections == 0 {
            self.rng.gen_range(0..self.counts.len())
        } else {
            self.weighted_index()?
        };

        let (item, count) = self
            .counts
            .get_index_mut(index)
            .ok_or(PickerError::SelectionFellThrough)?;
        *count += 1;
        let item = item.clone();
        self.total += 1;
        self.selections += 1;

        if self.selections % DECAY_EVERY == 0 {
            self.apply_decay();
        }
        Ok(item)
    }

    fn weighted_index(&mut self) -> Result<usize, PickerError> {
        let weight = |count: u64| 1.0 / (1.0 + count as f64);
        let total_weight: f64 = self.counts.values().map(|c| weight(*c)).sum();
        let target = self.rng.r#gen::<f64>() * total_weight;

        let mut cumulative = 0.0;
        for (index, count) in self.counts.values().enumerate() {
            cumulative += weight(*count);
            if target < cumulative {
                return Ok(index);
            }
        }
        Err(PickerError::SelectionFellThrough)
    }

    fn apply_decay(&mut self) {
        for count in self.counts.values_mut() {
            *count = ((*count as f64 * (1.0 - DECAY_FACTOR)).floor() as u64).max(1);
        }
        self.total = self.counts.values().sum();
        debug!(selections = self.selections, total = self.total, "picker counts decayed");
    }

    /// Add `item` seeded at the rounded average count (at least 1).
    /// Returns false, changing nothing, when the item is already known.
    pub fn add_item(&mut self, item: K) -> bool {
        if self.counts.contains_key(&item) {
            return false;
        }
        let average = if self.counts.is_empty() {
            0.0
        } else {
            self.counts.values().sum::<u64>() as f64 / self.counts.len() as f64
        };
        let seed = (average.round() as u64).max(1);
        self.counts.insert(item, seed);
        self.total += seed;
        true
    }

    pub fn count(&self, item: &K) -> Option<u64> {
        self.counts.get(item).copied()
    }

    /// Items and their counts, in insertion order.
    pub fn counts(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(item, count)| (item, *count))
    }

    pub fn total_selections(&self) -> u64 {
        self.total
    }

    /// Number of `pick` calls so far.
    pub fn selections(&self) -> u64 {
        self.selections
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
