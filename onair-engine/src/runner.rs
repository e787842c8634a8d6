//! Per-station control loop
//!
//! Each station runs one [`StationRunner`] task. The runner owns the
//! station, its event queue and its output dispatcher outright. While the
//! current job plays out, the next job is composed in place and handed to a
//! blocking loader task; the loader's `JoinHandle` is the only slot between
//! the two, so at most one job is ever in flight.
//!
//! ```text
//! Starting ──▶ SteadyLoop ◀──▶ RetryBackoff
//! ```

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::loader::{load_job, AssetLoader};
use crate::playback::{EventQueue, StationOutput, TimelineScheduler};
use crate::sequence::{CompositionContext, LoadedJob, SequenceComposer};
use crate::state::{RunnerPhase, StationState};
use crate::station::Station;
use onair_common::config::RunnerConfig;
use onair_common::events::{EventBus, OnAirEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Actions due within this margin of "now" are dispatched together
const DISPATCH_TOLERANCE: f64 = 1e-6;

/// Sleep used when nothing is queued and the loader is still busy
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// Supplies the wall-clock facts used by composition
pub type ContextSource = Arc<dyn Fn() -> CompositionContext + Send + Sync>;

/// Runner delays, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerSettings {
    pub start_lead: f64,
    pub wake_lead: f64,
    pub fallback_delay: f64,
    pub failure_backoff: f64,
}

impl RunnerSettings {
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            start_lead: config.start_lead_secs,
            wake_lead: config.wake_lead_secs,
            fallback_delay: config.fallback_delay_ms as f64 / 1000.0,
            failure_backoff: config.failure_backoff_ms as f64 / 1000.0,
        }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

/// Collaborators shared by every station's runner
#[derive(Clone)]
pub struct RunnerDeps {
    pub composer: SequenceComposer,
    pub scheduler: Arc<TimelineScheduler>,
    pub loader: Arc<dyn AssetLoader>,
    pub clock: Arc<dyn Clock>,
    pub events: EventBus,
    pub settings: RunnerSettings,
    pub context: ContextSource,
}

/// Control loop for one station
pub struct StationRunner {
    station: Station,
    queue: EventQueue,
    output: StationOutput,
    deps: RunnerDeps,
}

impl StationRunner {
    pub fn new(station: Station, output: StationOutput, deps: RunnerDeps) -> Self {
        Self {
            station,
            queue: EventQueue::new(),
            output,
            deps,
        }
    }

    fn state(&self) -> Arc<StationState> {
        self.output.state().clone()
    }

    /// Run until the task is aborted
    pub async fn run(mut self) {
        let state = self.state();
        info!("[{}] Station runner starting", self.station.id());
        state.set_phase(RunnerPhase::Starting).await;

        self.station.timeline_end = self.deps.clock.now() + self.deps.settings.start_lead;
        let first = self.spawn_next();
        let mut current = self.finish_load(first).await;

        loop {
            current = match current {
                Ok(job) => {
                    state.set_phase(RunnerPhase::SteadyLoop).await;
                    self.iterate(job).await
                }
                Err(e) => {
                    self.back_off(&e).await;
                    let handle = self.spawn_next();
                    self.finish_load(handle).await
                }
            };
        }
    }

    /// Schedule `job`, preload its successor and wait until it is due
    async fn iterate(&mut self, job: LoadedJob) -> Result<LoadedJob> {
        let now = self.deps.clock.now();
        let end = self.deps.scheduler.schedule(
            &mut self.station,
            &job,
            now,
            &mut self.queue,
            Some(&self.deps.events),
        );
        let state = self.state();
        state.set_timeline_end(end).await;
        state.record_job_scheduled();
        debug!(
            "[{}] Scheduled '{}' ({} items), timeline end {:.3}s",
            self.station.id(),
            job.template,
            job.items.len(),
            end
        );

        let handle = self.spawn_next();
        self.pump_until(end - self.deps.settings.wake_lead).await;
        self.finish_load(handle).await
    }

    /// Compose the next job and start loading it off the runtime
    fn spawn_next(&mut self) -> JoinHandle<LoadedJob> {
        let ctx = (self.deps.context)();
        let job = self.deps.composer.compose(&mut self.station, &ctx);
        let loader = self.deps.loader.clone();
        tokio::task::spawn_blocking(move || load_job(loader.as_ref(), job))
    }

    /// Wait for a load, retrying once after the fallback delay if it came back empty
    async fn finish_load(&mut self, handle: JoinHandle<LoadedJob>) -> Result<LoadedJob> {
        let job = self.pump_while(handle).await?;
        if !job.is_empty() {
            return Ok(job);
        }

        warn!(
            "[{}] Loaded job '{}' is empty, recomposing in {:.1}s",
            self.station.id(),
            job.template,
            self.deps.settings.fallback_delay
        );
        self.pump_for(self.deps.settings.fallback_delay).await;

        let handle = self.spawn_next();
        let job = self.pump_while(handle).await?;
        if job.is_empty() {
            return Err(Error::EmptyJob(self.station.id().to_string()));
        }
        Ok(job)
    }

    async fn back_off(&mut self, err: &Error) {
        let state = self.state();
        error!(
            "[{}] Runner iteration failed: {}; retrying in {:.1}s",
            self.station.id(),
            err,
            self.deps.settings.failure_backoff
        );
        state.set_phase(RunnerPhase::RetryBackoff).await;
        self.deps.events.emit_lossy(OnAirEvent::StationBackoff {
            station_id: self.station.id().to_string(),
            reason: err.to_string(),
            timestamp: onair_common::time::now(),
        });
        self.pump_for(self.deps.settings.failure_backoff).await;
    }

    async fn dispatch_due(&mut self) {
        let now = self.deps.clock.now() + DISPATCH_TOLERANCE;
        self.output.dispatch_due(now, &mut self.queue).await;
    }

    /// Dispatch events until engine time reaches `deadline`
    async fn pump_until(&mut self, deadline: f64) {
        loop {
            self.dispatch_due().await;
            let now = self.deps.clock.now();
            if now >= deadline {
                return;
            }
            let wake = self
                .queue
                .next_due()
                .map_or(deadline, |next| next.min(deadline));
            tokio::time::sleep(Duration::from_secs_f64((wake - now).max(0.0))).await;
        }
    }

    async fn pump_for(&mut self, secs: f64) {
        let deadline = self.deps.clock.now() + secs;
        self.pump_until(deadline).await;
    }

    /// Dispatch events until the loader task finishes
    async fn pump_while(&mut self, mut handle: JoinHandle<LoadedJob>) -> Result<LoadedJob> {
        loop {
            self.dispatch_due().await;
            let wait = match self.queue.next_due() {
                Some(next) => Duration::from_secs_f64((next - self.deps.clock.now()).max(0.0)),
                None => IDLE_WAIT,
            };
            tokio::select! {
                joined = &mut handle => {
                    return joined.map_err(|e| Error::Runner(format!("loader task failed: {}", e)));
                }
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }
}
