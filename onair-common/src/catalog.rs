//! Station content catalog
//!
//! A catalog lists every asset a station can draw from. Catalogs are plain
//! JSON documents, one per station, loaded once at startup and shared
//! read-only by the station's composer.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Half-open sample range `[start, end)` inside a music track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub start: u64,
    pub end: u64,
}

impl Zone {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Zone length in samples (0 for an inverted zone)
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which narration zone of a track is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Intro,
    Outro,
}

/// A music track with its cover art and narration zones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicDescriptor {
    /// Asset identifier of the audio file
    pub file: String,
    /// Track name, used as the key for track-specific intro narrations
    pub name: String,
    /// Cover art reference shown while the track plays
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub intro_start: Option<u64>,
    #[serde(default)]
    pub intro_end: Option<u64>,
    #[serde(default)]
    pub outro_start: Option<u64>,
    #[serde(default)]
    pub outro_end: Option<u64>,
}

impl MusicDescriptor {
    /// Zone of the requested kind; absent unless both bounds are present
    pub fn zone(&self, kind: ZoneKind) -> Option<Zone> {
        let (start, end) = match kind {
            ZoneKind::Intro => (self.intro_start, self.intro_end),
            ZoneKind::Outro => (self.outro_start, self.outro_end),
        };
        Some(Zone::new(start?, end?))
    }
}

/// Time-of-day narration pools
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimePools {
    #[serde(default)]
    pub morning: Vec<String>,
    #[serde(default)]
    pub evening: Vec<String>,
}

/// All content pools of one station
///
/// Every field is optional in the JSON document; a missing pool is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationCatalog {
    pub music: Vec<MusicDescriptor>,
    pub ids: Vec<String>,
    pub solos: Vec<String>,
    pub ads: Vec<String>,
    pub news: Vec<String>,
    /// General narrations usable in any zone
    pub general: Vec<String>,
    /// Track-specific intro narrations keyed by track name
    pub intro_narrations: HashMap<String, Vec<String>>,
    pub time_pools: TimePools,
    /// Outro narrations keyed by follow-up subgroup tag
    pub outro_subgroups: HashMap<String, Vec<String>>,
    pub short_ids: Vec<String>,
    pub long_ids: Vec<String>,
    pub jingles: Vec<String>,
}

impl StationCatalog {
    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog: StationCatalog = serde_json::from_str(&content)?;
        Ok(catalog)
    }

    /// Track-specific intro pool for `name` (empty when absent)
    pub fn intro_pool(&self, name: &str) -> &[String] {
        self.intro_narrations
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every narration identifier in every narration pool
    pub fn narration_ids(&self) -> impl Iterator<Item = &str> {
        self.general
            .iter()
            .chain(self.intro_narrations.values().flatten())
            .chain(self.time_pools.morning.iter())
            .chain(self.time_pools.evening.iter())
            .chain(self.outro_subgroups.values().flatten())
            .map(String::as_str)
    }

    /// Outro subgroup pool for `tag` (empty when absent)
    pub fn outro_subgroup_pool(&self, tag: &str) -> &[String] {
        self.outro_subgroups
            .get(tag)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Final path component of an asset identifier
pub fn basename(asset_id: &str) -> &str {
    asset_id.rsplit('/').next().unwrap_or(asset_id)
}

/// Basename with its extension removed
pub fn stem(asset_id: &str) -> &str {
    let name = basename(asset_id);
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

/// Validate that a catalog's music descriptors have well-formed zones
pub fn validate(catalog: &StationCatalog) -> Result<()> {
    for m in &catalog.music {
        for kind in [ZoneKind::Intro, ZoneKind::Outro] {
            if let Some(zone) = m.zone(kind) {
                if zone.end < zone.start {
                    return Err(Error::InvalidInput(format!(
                        "{} has inverted {:?} zone ({} > {})",
                        m.file, kind, zone.start, zone.end
                    )));
                }
            }
        }
    }
    Ok(())
}
