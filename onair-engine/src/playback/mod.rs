//! Playback scheduling
//!
//! Everything between a loaded job and the output sink:
//! - `fusion`: crossfade overlap between adjacent assets
//! - `timeline`: absolute placement of items and narration overlays
//! - `events`: per-station time-ordered action queue
//! - `ducking`: music gain state machine under narration
//! - `output`: sink trait and the dispatcher that applies due actions

pub mod ducking;
pub mod events;
pub mod fusion;
pub mod output;
pub mod timeline;

pub use ducking::{DuckCommand, DuckingController, GainEnvelope};
pub use events::{EventQueue, StationAction, TimedAction};
pub use fusion::{AssetClass, AssetClassifier, Classification, FusionCalculator};
pub use output::{GainRamp, OutputSink, StationOutput, TracingSink};
pub use timeline::TimelineScheduler;

use serde::Serialize;

/// Gain stage a buffer or ramp applies to
///
/// Each station has a master bus feeding the device and two sub-buses
/// feeding the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bus {
    Master,
    Music,
    Narration,
}
