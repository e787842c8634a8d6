//! Rotating content queue
//!
//! Hands out a pool's items in shuffled order without repeats; once every
//! item has been offered the pool is reshuffled and rotation starts over.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

/// Shuffled, no-repeat-until-exhausted view over a fixed pool
#[derive(Debug, Clone)]
pub struct RotatingQueue<T> {
    pool: Vec<T>,
    pending: VecDeque<T>,
}

impl<T: Clone> RotatingQueue<T> {
    /// Create a queue over `pool`; nothing is pending until the first reshuffle
    pub fn new(pool: Vec<T>) -> Self {
        Self {
            pool,
            pending: VecDeque::new(),
        }
    }

    /// Discard any remaining order and shuffle the whole pool again
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order = self.pool.clone();
        order.shuffle(rng);
        self.pending = order.into();
    }

    /// Next item, reshuffling first if the current rotation is exhausted
    ///
    /// Returns `None` only when the pool itself is empty.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<T> {
        if self.pending.is_empty() {
            self.reshuffle(rng);
        }
        self.pending.pop_front()
    }

    /// Items left before the next reshuffle
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
