//! Station directory and active-station selection
//!
//! The director builds every configured station, spawns one runner per
//! station and decides which station is audible. All stations keep running
//! while silent; switching only moves master gain and audibility.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::loader::AssetLoader;
use crate::playback::ducking::{DuckingController, DuckingSettings};
use crate::playback::output::GainRamp;
use crate::playback::timeline::TimelineScheduler;
use crate::playback::{AssetClassifier, Bus, FusionCalculator, OutputSink, StationOutput};
use crate::runner::{ContextSource, RunnerDeps, RunnerSettings, StationRunner};
use crate::sequence::{CompositionContext, NarrationResolver, SequenceComposer};
use crate::state::{NowPlaying, RunnerPhase, StationState};
use crate::station::{Station, StationProfile};
use onair_common::catalog::StationCatalog;
use onair_common::config::{SwitchConfig, TomlConfig};
use onair_common::events::{EventBus, OnAirEvent};
use onair_common::metadata::{FadeMetadataIndex, NarrationDurations};
use onair_common::news::{DayEligibility, NewsCalendar};
use onair_common::FadeCurve;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Data the stations are built from
#[derive(Clone)]
pub struct EngineResources {
    pub fade_metadata: Arc<FadeMetadataIndex>,
    pub durations: Arc<NarrationDurations>,
    pub news: Arc<dyn DayEligibility>,
    /// Catalog per station id; stations without one get an empty catalog
    pub catalogs: HashMap<String, Arc<StationCatalog>>,
    pub context: ContextSource,
}

impl EngineResources {
    pub fn new() -> Self {
        Self {
            fade_metadata: Arc::new(FadeMetadataIndex::default()),
            durations: Arc::new(NarrationDurations::new()),
            news: Arc::new(NewsCalendar::default()),
            catalogs: HashMap::new(),
            context: Arc::new(CompositionContext::now),
        }
    }

    pub fn with_catalog(mut self, station_id: &str, catalog: StationCatalog) -> Self {
        self.catalogs.insert(station_id.to_string(), Arc::new(catalog));
        self
    }
}

impl Default for EngineResources {
    fn default() -> Self {
        Self::new()
    }
}

/// Station summary for the control API
#[derive(Debug, Clone, Serialize)]
pub struct StationSummary {
    pub id: String,
    pub name: String,
    pub audible: bool,
    pub phase: RunnerPhase,
    pub now_playing: Option<NowPlaying>,
    pub cover_art: String,
    pub timeline_end: f64,
    pub jobs_scheduled: u64,
}

struct StationHandle {
    state: Arc<StationState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Owns every station and the audible selection
pub struct Director {
    order: Vec<String>,
    stations: HashMap<String, StationHandle>,
    active: RwLock<String>,
    events: EventBus,
    sink: Arc<dyn OutputSink>,
    clock: Arc<dyn Clock>,
    switching: SwitchConfig,
}

impl Director {
    /// Build every configured station and spawn its runner
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &TomlConfig,
        resources: EngineResources,
        loader: Arc<dyn AssetLoader>,
        sink: Arc<dyn OutputSink>,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Result<Self> {
        config.validate()?;
        let active_id = config
            .active_station_id()
            .ok_or_else(|| Error::Config("no active station".to_string()))?
            .to_string();

        let home_marker = config.home_station_config().map(|s| s.base_path.clone());
        let classifier = Arc::new(AssetClassifier::new(config.classification.clone(), home_marker));
        let fusion = Arc::new(FusionCalculator::new(classifier, resources.fade_metadata.clone()));
        let scheduler = Arc::new(
            TimelineScheduler::new(fusion).with_leads(config.ducking.lead_secs, config.runner.start_lead_secs),
        );
        let composer = SequenceComposer::new(
            NarrationResolver::new(resources.durations.clone()),
            resources.news.clone(),
        );
        let deps = RunnerDeps {
            composer,
            scheduler,
            loader,
            clock: clock.clone(),
            events: events.clone(),
            settings: RunnerSettings::from_config(&config.runner),
            context: resources.context.clone(),
        };

        // every profile must parse before any runner is spawned
        let profiles = config
            .stations
            .iter()
            .map(StationProfile::from_config)
            .collect::<Result<Vec<_>>>()?;

        let now = clock.now();
        let mut order = Vec::with_capacity(config.stations.len());
        let mut stations = HashMap::with_capacity(config.stations.len());

        for (index, (station_config, profile)) in config.stations.iter().zip(profiles).enumerate() {
            let profile = Arc::new(profile);
            let catalog = match resources.catalogs.get(&station_config.id) {
                Some(c) => c.clone(),
                None => {
                    warn!("Station '{}' has no catalog, it will stay silent", station_config.id);
                    Arc::new(StationCatalog::default())
                }
            };
            let rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                None => StdRng::from_entropy(),
            };

            let state = Arc::new(StationState::new(
                &profile.id,
                &profile.name,
                &profile.default_cover_art,
            ));
            let audible = station_config.id == active_id;
            state.set_audible(audible);
            sink.ramp_gain(
                &profile.id,
                GainRamp {
                    bus: Bus::Master,
                    from: None,
                    target: if audible { 1.0 } else { 0.0 },
                    at: now,
                    duration: 0.0,
                    curve: FadeCurve::Linear,
                },
            );

            let ducking = DuckingController::new(DuckingSettings::from_config(
                &config.ducking,
                profile.duck_target,
            ));
            let output = StationOutput::new(sink.clone(), ducking, events.clone(), state.clone());
            let station = Station::new(profile, catalog, rng);
            let runner = StationRunner::new(station, output, deps.clone());
            let task = tokio::spawn(runner.run());

            info!(
                "Station '{}' started{}",
                station_config.id,
                if audible { " (audible)" } else { "" }
            );
            order.push(station_config.id.clone());
            stations.insert(
                station_config.id.clone(),
                StationHandle {
                    state,
                    task: Mutex::new(Some(task)),
                },
            );
        }

        Ok(Self {
            order,
            stations,
            active: RwLock::new(active_id),
            events,
            sink,
            clock,
            switching: config.switching.clone(),
        })
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn active_station(&self) -> String {
        self.active.read().await.clone()
    }

    /// Whether `station_id` is the audible station
    pub fn is_audible(&self, station_id: &str) -> Result<bool> {
        self.stations
            .get(station_id)
            .map(|h| h.state.is_audible())
            .ok_or_else(|| Error::NotFound(format!("station '{}'", station_id)))
    }

    pub fn station_state(&self, station_id: &str) -> Option<Arc<StationState>> {
        self.stations.get(station_id).map(|h| h.state.clone())
    }

    /// Make `station_id` the audible station
    ///
    /// Selecting the station that is already active does nothing.
    pub async fn set_active_station(&self, station_id: &str) -> Result<()> {
        let new_handle = self
            .stations
            .get(station_id)
            .ok_or_else(|| Error::NotFound(format!("station '{}'", station_id)))?;

        let mut active = self.active.write().await;
        if *active == station_id {
            return Ok(());
        }
        let old_id = std::mem::replace(&mut *active, station_id.to_string());
        let now = self.clock.now();

        if let Some(old_handle) = self.stations.get(&old_id) {
            old_handle.state.set_audible(false);
            self.sink.ramp_gain(
                &old_id,
                GainRamp {
                    bus: Bus::Master,
                    from: None,
                    target: 0.0,
                    at: now,
                    duration: self.switching.fade_out_secs,
                    curve: FadeCurve::Linear,
                },
            );
        }
        new_handle.state.set_audible(true);
        self.sink.ramp_gain(
            station_id,
            GainRamp {
                bus: Bus::Master,
                from: None,
                target: 1.0,
                at: now,
                duration: self.switching.fade_in_secs,
                curve: FadeCurve::Linear,
            },
        );
        drop(active);

        info!("Active station changed: {} -> {}", old_id, station_id);
        self.events.emit_lossy(OnAirEvent::ActiveStationChanged {
            old_station: Some(old_id),
            new_station: station_id.to_string(),
            timestamp: onair_common::time::now(),
        });

        let now_playing = new_handle.state.get_now_playing().await;
        let cover_art = new_handle.state.current_cover_art().await;
        self.events.emit_lossy(OnAirEvent::NowPlaying {
            station_id: station_id.to_string(),
            asset_id: now_playing.as_ref().map(|np| np.asset_id.clone()),
            name: now_playing.map(|np| np.name),
            cover_art,
            timestamp: onair_common::time::now(),
        });
        Ok(())
    }

    /// Summaries in configuration order
    pub async fn stations(&self) -> Vec<StationSummary> {
        let mut out = Vec::with_capacity(self.order.len());
        for id in &self.order {
            if let Some(handle) = self.stations.get(id) {
                out.push(summarize(&handle.state).await);
            }
        }
        out
    }

    pub async fn station(&self, station_id: &str) -> Result<StationSummary> {
        let handle = self
            .stations
            .get(station_id)
            .ok_or_else(|| Error::NotFound(format!("station '{}'", station_id)))?;
        Ok(summarize(&handle.state).await)
    }

    /// Stop every runner
    pub fn shutdown(&self) {
        for (id, handle) in &self.stations {
            if let Ok(mut task) = handle.task.lock() {
                if let Some(task) = task.take() {
                    task.abort();
                    info!("Station '{}' stopped", id);
                }
            }
        }
    }
}

impl Drop for Director {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn summarize(state: &StationState) -> StationSummary {
    StationSummary {
        id: state.station_id.clone(),
        name: state.name.clone(),
        audible: state.is_audible(),
        phase: state.get_phase().await,
        now_playing: state.get_now_playing().await,
        cover_art: state.current_cover_art().await,
        timeline_end: state.get_timeline_end().await,
        jobs_scheduled: state.jobs_scheduled(),
    }
}
