//! onair-engine: continuous multi-station radio sequencing
//!
//! Each configured station runs its own loop that composes short sequence
//! jobs (music, ids, ads, news, narration overlays), loads them off the
//! async runtime, places them on an absolute timeline with crossfade
//! overlaps and feeds the resulting actions to an [`playback::OutputSink`].
//! One station is audible at a time; the rest keep running silently so a
//! switch lands mid-programme.

pub mod api;
pub mod clock;
pub mod director;
pub mod error;
pub mod loader;
pub mod playback;
pub mod random;
pub mod runner;
pub mod sequence;
pub mod state;
pub mod station;

pub use director::{Director, EngineResources, StationSummary};
pub use error::{Error, Result};
