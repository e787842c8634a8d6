//! Engine clock
//!
//! The timeline is expressed in seconds since the engine started, the same
//! units the output sink uses to place buffers. Runner sleeps go through
//! tokio's timer, so tests that pause tokio time also freeze this clock.

use tokio::time::Instant;

/// Source of the current engine time in seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Seconds elapsed since construction, measured on tokio's clock
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}
