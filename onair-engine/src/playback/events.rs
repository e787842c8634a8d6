//! Per-station timed action queue
//!
//! The scheduler never fires anything directly. Every play, duck and
//! now-playing action is pushed here with its absolute due time, and the
//! station's runner pops due actions in time order. Actions due at the same
//! instant come out in the order they were pushed.

use crate::loader::TimedBuffer;
use crate::playback::Bus;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// What to do when an action comes due
#[derive(Debug, Clone, PartialEq)]
pub enum StationAction {
    /// Start `buffer` on `bus` at the action's due time
    Play { bus: Bus, buffer: TimedBuffer },

    /// A narration is about to start
    DuckStart,

    /// A narration finished
    DuckEnd,

    /// Guarded release of the duck, valid only for the armed generation
    ReleaseDuck { generation: u64 },

    /// A music track starts
    NowPlaying {
        asset_id: String,
        name: String,
        cover_art: Option<String>,
    },
}

/// An action with its absolute due time
#[derive(Debug, Clone)]
pub struct TimedAction {
    /// Engine time (seconds) at which the action is due
    pub at: f64,
    /// Insertion sequence, breaks ties between equal due times
    seq: u64,
    pub action: StationAction,
}

impl PartialEq for TimedAction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimedAction {}

impl Ord for TimedAction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earliest first, then insertion order
        self.at.total_cmp(&other.at).then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for TimedAction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of [`TimedAction`]s
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<TimedAction>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` for time `at`
    pub fn push(&mut self, at: f64, action: StationAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(TimedAction { at, seq, action }));
    }

    /// Due time of the earliest queued action
    pub fn next_due(&self) -> Option<f64> {
        self.heap.peek().map(|Reverse(a)| a.at)
    }

    /// Remove and return the earliest action if it is due at `now`
    pub fn pop_due(&mut self, now: f64) -> Option<TimedAction> {
        match self.heap.peek() {
            Some(Reverse(a)) if a.at <= now => self.heap.pop().map(|Reverse(a)| a),
            _ => None,
        }
    }

    /// Remove and return every action due at `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> Vec<TimedAction> {
        let mut due = Vec::new();
        while let Some(action) = self.pop_due(now) {
            due.push(action);
        }
        due
    }

    /// Snapshot of all queued actions in due order
    pub fn pending(&self) -> Vec<TimedAction> {
        let mut all: Vec<TimedAction> = self.heap.iter().map(|Reverse(a)| a.clone()).collect();
        all.sort();
        all
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
