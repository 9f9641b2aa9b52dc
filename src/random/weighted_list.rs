// src/random/weighted_list.rs

use rand::Rng;

use crate::error::WeightError;

/// A list of values drawn proportionally to their weights.
///
/// Entries keep insertion order and store the running cumulative weight, so a
/// draw is a binary search over an ascending sequence.
#[derive(Debug, Clone)]
pub struct WeightedList<T> {
    entries: Vec<Entry<T>>,
    total: f64,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    weight: f64,
    cumulative: f64,
}

impl<T> Default for WeightedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeightedList<T> {
    pub fn new() -> Self {
        WeightedList {
            entries: Vec::new(),
            total: 0.0,
        }
    }

    /// Appends `value` with `weight`. Zero weights are kept but never drawn.
    pub fn put(&mut self, value: T, weight: f64) -> Result<(), WeightError> {
        if weight.is_nan() || weight < 0.0 {
            return Err(WeightError::NegativeWeight(weight));
        }
        self.total += weight;
        self.entries.push(Entry {
            value,
            weight,
            cumulative: self.total,
        });
        Ok(())
    }

    /// Draws `u * total` for a uniform `u` in `[0, 1)` and returns the first
    /// entry whose cumulative weight exceeds it.
    pub fn weighted_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&T, WeightError> {
        if self.entries.is_empty() || self.total <= 0.0 {
            return Err(WeightError::EmptyDistribution);
        }
        let draw = rng.random::<f64>() * self.total;
        let idx = self.entries.partition_point(|e| e.cumulative <= draw);
        if let Some(entry) = self.entries.get(idx) {
            return Ok(&entry.value);
        }
        // Float rounding left draw == total; take the last drawable entry.
        self.entries
            .iter()
            .rfind(|e| e.weight > 0.0)
            .map(|e| &e.value)
            .ok_or(WeightError::EmptyDistribution)
    }

    /// Read-only `(value, weight)` view in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.entries.iter().map(|e| (&e.value, e.weight))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    /// True when nothing can ever be drawn.
    pub fn has_no_weight(&self) -> bool {
        self.total <= 0.0
    }
}
