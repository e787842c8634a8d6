//! Shared station state
//!
//! Each runner owns its station outright; this is the small read-mostly
//! slice of it that the director and the HTTP API need to see.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Runner lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerPhase {
    /// Shuffling queues and loading the first job
    Starting,
    /// Scheduling, preloading and waiting in a loop
    SteadyLoop,
    /// Waiting out the backoff after a failed iteration
    RetryBackoff,
}

/// Track currently on air for a station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    pub asset_id: String,
    pub name: String,
    pub cover_art: Option<String>,
    /// Engine time the track started
    pub started_at: f64,
}

/// State shared between a station's runner and its observers
#[derive(Debug)]
pub struct StationState {
    pub station_id: String,
    pub name: String,
    pub default_cover_art: String,
    audible: AtomicBool,
    pub now_playing: RwLock<Option<NowPlaying>>,
    pub phase: RwLock<RunnerPhase>,
    /// Projected timeline end after the last scheduling call
    pub timeline_end: RwLock<f64>,
    jobs_scheduled: AtomicU64,
}

impl StationState {
    pub fn new(station_id: &str, name: &str, default_cover_art: &str) -> Self {
        Self {
            station_id: station_id.to_string(),
            name: name.to_string(),
            default_cover_art: default_cover_art.to_string(),
            audible: AtomicBool::new(false),
            now_playing: RwLock::new(None),
            phase: RwLock::new(RunnerPhase::Starting),
            timeline_end: RwLock::new(0.0),
            jobs_scheduled: AtomicU64::new(0),
        }
    }

    pub fn is_audible(&self) -> bool {
        self.audible.load(Ordering::Acquire)
    }

    pub fn set_audible(&self, audible: bool) {
        self.audible.store(audible, Ordering::Release);
    }

    pub async fn get_now_playing(&self) -> Option<NowPlaying> {
        self.now_playing.read().await.clone()
    }

    pub async fn set_now_playing(&self, now_playing: NowPlaying) {
        *self.now_playing.write().await = Some(now_playing);
    }

    pub async fn get_phase(&self) -> RunnerPhase {
        *self.phase.read().await
    }

    pub async fn set_phase(&self, phase: RunnerPhase) {
        *self.phase.write().await = phase;
    }

    pub async fn get_timeline_end(&self) -> f64 {
        *self.timeline_end.read().await
    }

    pub async fn set_timeline_end(&self, end: f64) {
        *self.timeline_end.write().await = end;
    }

    pub fn record_job_scheduled(&self) {
        self.jobs_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn jobs_scheduled(&self) -> u64 {
        self.jobs_scheduled.load(Ordering::Relaxed)
    }

    /// Cover art to show for this station right now
    pub async fn current_cover_art(&self) -> String {
        self.now_playing
            .read()
            .await
            .as_ref()
            .and_then(|np| np.cover_art.clone())
            .unwrap_or_else(|| self.default_cover_art.clone())
    }
}
