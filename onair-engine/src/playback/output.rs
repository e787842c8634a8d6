//! Output sink and action dispatch
//!
//! [`OutputSink`] is the seam to whatever actually mixes audio. The
//! [`StationOutput`] dispatcher applies due [`TimedAction`]s: play actions
//! go straight to the sink, duck actions go through the station's
//! [`DuckingController`], and now-playing actions update the shared state
//! and notify listeners when the station is audible.

use crate::loader::TimedBuffer;
use crate::playback::ducking::{DuckCommand, DuckingController};
use crate::playback::events::{EventQueue, StationAction, TimedAction};
use crate::playback::Bus;
use crate::state::{NowPlaying, StationState};
use onair_common::events::{EventBus, OnAirEvent};
use onair_common::FadeCurve;
use std::sync::Arc;
use tracing::{debug, info};

/// A gain move on one bus
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRamp {
    pub bus: Bus,
    /// Starting level (None: from whatever the bus is at)
    pub from: Option<f32>,
    pub target: f32,
    /// Engine time the ramp starts
    pub at: f64,
    pub duration: f64,
    pub curve: FadeCurve,
}

/// Receives playback and gain instructions for every station
pub trait OutputSink: Send + Sync {
    /// Start `buffer` on `bus` of `station_id` at engine time `at`
    fn play(&self, station_id: &str, bus: Bus, buffer: &TimedBuffer, at: f64);

    /// Apply a gain ramp to a bus of `station_id`
    fn ramp_gain(&self, station_id: &str, ramp: GainRamp);
}

/// Sink that only logs what it would do
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn play(&self, station_id: &str, bus: Bus, buffer: &TimedBuffer, at: f64) {
        info!(
            "[{}] play {} on {:?} at {:.3}s ({:.2}s)",
            station_id,
            buffer.asset_id,
            bus,
            at,
            buffer.duration()
        );
    }

    fn ramp_gain(&self, station_id: &str, ramp: GainRamp) {
        debug!(
            "[{}] ramp {:?} {:?} -> {:.2} at {:.3}s over {:.2}s",
            station_id, ramp.bus, ramp.from, ramp.target, ramp.at, ramp.duration
        );
    }
}

/// Applies a station's due actions
pub struct StationOutput {
    sink: Arc<dyn OutputSink>,
    ducking: DuckingController,
    events: EventBus,
    state: Arc<StationState>,
}

impl StationOutput {
    pub fn new(
        sink: Arc<dyn OutputSink>,
        ducking: DuckingController,
        events: EventBus,
        state: Arc<StationState>,
    ) -> Self {
        Self {
            sink,
            ducking,
            events,
            state,
        }
    }

    pub fn ducking(&self) -> &DuckingController {
        &self.ducking
    }

    pub fn state(&self) -> &Arc<StationState> {
        &self.state
    }

    /// Apply every action in `queue` due at `now`; returns how many ran
    ///
    /// Actions queued while dispatching (duck releases) are picked up in the
    /// same pass if they are already due.
    pub async fn dispatch_due(&mut self, now: f64, queue: &mut EventQueue) -> usize {
        let mut count = 0;
        while let Some(action) = queue.pop_due(now) {
            self.apply(action, queue).await;
            count += 1;
        }
        count
    }

    /// Apply one action; follow-up actions are pushed onto `queue`
    pub async fn apply(&mut self, timed: TimedAction, queue: &mut EventQueue) {
        let station_id = self.state.station_id.clone();
        let at = timed.at;
        match timed.action {
            StationAction::Play { bus, buffer } => {
                self.sink.play(&station_id, bus, &buffer, at);
            }
            StationAction::DuckStart => {
                let cmd = self.ducking.duck_start(at);
                self.execute(&station_id, cmd, queue);
            }
            StationAction::DuckEnd => {
                if let Some(cmd) = self.ducking.duck_end(at) {
                    self.execute(&station_id, cmd, queue);
                }
            }
            StationAction::ReleaseDuck { generation } => {
                if let Some(cmd) = self.ducking.release(generation, at) {
                    self.execute(&station_id, cmd, queue);
                }
            }
            StationAction::NowPlaying {
                asset_id,
                name,
                cover_art,
            } => {
                let now_playing = NowPlaying {
                    asset_id,
                    name,
                    cover_art,
                    started_at: at,
                };
                self.state.set_now_playing(now_playing.clone()).await;
                if self.state.is_audible() {
                    self.events.emit_lossy(OnAirEvent::NowPlaying {
                        station_id,
                        asset_id: Some(now_playing.asset_id),
                        name: Some(now_playing.name),
                        cover_art: now_playing
                            .cover_art
                            .unwrap_or_else(|| self.state.default_cover_art.clone()),
                        timestamp: onair_common::time::now(),
                    });
                }
            }
        }
    }

    fn execute(&self, station_id: &str, cmd: DuckCommand, queue: &mut EventQueue) {
        match cmd {
            DuckCommand::Ramp {
                from,
                target,
                at,
                duration,
                curve,
            } => self.sink.ramp_gain(
                station_id,
                GainRamp {
                    bus: Bus::Music,
                    from: Some(from),
                    target,
                    at,
                    duration,
                    curve,
                },
            ),
            DuckCommand::ArmRelease { generation, due } => {
                queue.push(due, StationAction::ReleaseDuck { generation });
            }
        }
    }
}
