//! Shared fixtures for onair-engine integration tests
//!
//! - RecordingSink: captures every play and gain ramp
//! - LengthLoader: fixed lengths per asset class, no files needed
//! - catalog/config builders for small test stations
//! - narrated variants with intro/outro zones and known narration lengths

#![allow(dead_code)]

use onair_common::catalog::{MusicDescriptor, StationCatalog};
use onair_common::config::{StationConfig, StationPreset, TomlConfig};
use onair_common::events::EventBus;
use onair_common::metadata::NarrationDurations;
use onair_engine::clock::MonotonicClock;
use onair_engine::loader::{AssetLoader, TimedBuffer};
use onair_engine::playback::output::GainRamp;
use onair_engine::playback::{Bus, OutputSink};
use onair_engine::sequence::CompositionContext;
use onair_engine::{Director, EngineResources, Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SR: u64 = 48_000;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayRecord {
    pub station_id: String,
    pub bus: Bus,
    pub asset_id: String,
    pub at: f64,
    pub duration: f64,
}

#[derive(Default)]
pub struct RecordingSink {
    plays: Mutex<Vec<PlayRecord>>,
    ramps: Mutex<Vec<(String, GainRamp)>>,
}

impl RecordingSink {
    pub fn plays_for(&self, station_id: &str) -> Vec<PlayRecord> {
        self.plays
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.station_id == station_id)
            .cloned()
            .collect()
    }

    pub fn music_plays_for(&self, station_id: &str) -> Vec<PlayRecord> {
        self.plays_for(station_id)
            .into_iter()
            .filter(|p| p.bus == Bus::Music)
            .collect()
    }

    pub fn ramps_for(&self, station_id: &str, bus: Bus) -> Vec<GainRamp> {
        self.ramps
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, r)| id == station_id && r.bus == bus)
            .map(|(_, r)| *r)
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn play(&self, station_id: &str, bus: Bus, buffer: &TimedBuffer, at: f64) {
        self.plays.lock().unwrap().push(PlayRecord {
            station_id: station_id.to_string(),
            bus,
            asset_id: buffer.asset_id.clone(),
            at,
            duration: buffer.duration(),
        });
    }

    fn ramp_gain(&self, station_id: &str, ramp: GainRamp) {
        self.ramps.lock().unwrap().push((station_id.to_string(), ramp));
    }
}

/// Music is 30s, everything else 3s
#[derive(Default)]
pub struct LengthLoader;

impl AssetLoader for LengthLoader {
    fn load(&self, asset_id: &str) -> Result<TimedBuffer> {
        let secs = if asset_id.contains("/musicas/") { 30 } else { 3 };
        Ok(TimedBuffer::new(asset_id, asset_id, secs * SR))
    }
}

/// Every load fails
pub struct FailingLoader;

impl AssetLoader for FailingLoader {
    fn load(&self, asset_id: &str) -> Result<TimedBuffer> {
        Err(Error::load(asset_id, "unreadable"))
    }
}

pub fn music(base: &str, name: &str) -> MusicDescriptor {
    MusicDescriptor {
        file: format!("{}/musicas/{}.wav", base, name),
        name: name.to_string(),
        cover: Some(format!("{}/capas/{}.jpg", base, name)),
        ..Default::default()
    }
}

/// Four tracks plus a couple of each short asset type
pub fn catalog(base: &str) -> StationCatalog {
    StationCatalog {
        music: ["one", "two", "three", "four"]
            .iter()
            .map(|n| music(base, n))
            .collect(),
        ids: vec![format!("{}/ID_01.wav", base), format!("{}/ID_02.wav", base)],
        solos: vec![format!("{}/MONO_SOLO_01.wav", base)],
        ads: vec![format!("{}/adv/ad_01.wav", base)],
        ..Default::default()
    }
}

pub fn config(stations: &[(&str, &str)]) -> TomlConfig {
    TomlConfig {
        seed: Some(42),
        stations: stations
            .iter()
            .map(|(id, base)| StationConfig::new(id, id, base, StationPreset::Standard))
            .collect(),
        ..Default::default()
    }
}

pub fn resources(stations: &[(&str, &str)]) -> EngineResources {
    let mut res = EngineResources::new();
    res.context = Arc::new(|| CompositionContext::new(12, 1));
    for (id, base) in stations {
        res = res.with_catalog(id, catalog(base));
    }
    res
}

pub const TWO_STATIONS: &[(&str, &str)] = &[("rock", "ROCK"), ("pop", "POP")];

/// Start a director over `stations`, all catalogs populated
pub fn start(
    stations: &[(&str, &str)],
    sink: Arc<RecordingSink>,
    loader: Arc<dyn AssetLoader>,
    events: EventBus,
) -> Director {
    Director::start(
        &config(stations),
        resources(stations),
        loader,
        sink,
        Arc::new(MonotonicClock::new()),
        events,
    )
    .expect("director should start")
}

/// Intro zone of every narrated track, in seconds
pub const INTRO_ZONE: (u64, u64) = (0, 8);
/// Outro zone of every narrated track, in seconds
pub const OUTRO_ZONE: (u64, u64) = (20, 28);

/// [`catalog`] whose tracks carry both zones and whose narration pools are
/// all populated
pub fn narrated_catalog(base: &str) -> StationCatalog {
    let mut catalog = catalog(base);
    for m in &mut catalog.music {
        m.intro_start = Some(INTRO_ZONE.0 * SR);
        m.intro_end = Some(INTRO_ZONE.1 * SR);
        m.outro_start = Some(OUTRO_ZONE.0 * SR);
        m.outro_end = Some(OUTRO_ZONE.1 * SR);
    }
    catalog.general = vec![
        format!("{}/narr/{}_GENERAL_01.wav", base, base),
        format!("{}/narr/{}_GENERAL_02.wav", base, base),
    ];
    catalog.intro_narrations = catalog
        .music
        .iter()
        .map(|m| (m.name.clone(), vec![format!("{}/narr/{}_INTRO_{}.wav", base, base, m.name)]))
        .collect();
    let mut subgroups = HashMap::new();
    subgroups.insert("to-ad".to_string(), vec![format!("{}/narr/{}_TO_AD_01.wav", base, base)]);
    catalog.outro_subgroups = subgroups;
    catalog
}

/// Lengths matching what [`LengthLoader`] returns for every narration
pub fn narration_durations(catalogs: &[&StationCatalog]) -> NarrationDurations {
    let mut durations = NarrationDurations::new();
    for c in catalogs {
        for id in c.narration_ids() {
            durations.insert(id, 3 * SR);
        }
    }
    durations
}

/// Narrated stations that attempt a narration in every zone
pub fn start_narrated(stations: &[(&str, &str)], sink: Arc<RecordingSink>, events: EventBus) -> Director {
    let mut cfg = config(stations);
    for s in &mut cfg.stations {
        s.narration_acceptance = Some(1.0);
    }
    let catalogs: Vec<StationCatalog> = stations.iter().map(|(_, base)| narrated_catalog(base)).collect();
    let mut res = EngineResources::new();
    res.context = Arc::new(|| CompositionContext::new(12, 1));
    res.durations = Arc::new(narration_durations(&catalogs.iter().collect::<Vec<_>>()));
    for ((id, _), c) in stations.iter().zip(catalogs) {
        res = res.with_catalog(id, c);
    }
    Director::start(
        &cfg,
        res,
        Arc::new(LengthLoader),
        sink,
        Arc::new(MonotonicClock::new()),
        events,
    )
    .expect("director should start")
}
