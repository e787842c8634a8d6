//! Stations
//!
//! A station is a policy ([`StationProfile`]) plus the mutable state its
//! runner owns: rotating queues, the timeline cursor, the follow-up hint and
//! a seeded random source.

pub mod queue;
pub mod template;

pub use queue::RotatingQueue;
pub use template::{Template, Token};

use crate::error::{Error, Result};
use onair_common::catalog::{MusicDescriptor, StationCatalog};
use onair_common::config::{StationConfig, StationPreset};
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::sync::Arc;

/// Follow-up tag set by an outro narration that announces an ad break
pub const HINT_TO_AD: &str = "to-ad";
/// Follow-up tag set by an outro narration that announces the news
pub const HINT_TO_NEWS: &str = "to-news";

/// How outro narrations are chosen
#[derive(Debug, Clone, PartialEq)]
pub enum OutroPolicy {
    /// General pool with the given probability, otherwise no narration
    GeneralOnly { general_probability: f64 },
    /// General pool with the given probability, otherwise a weighted
    /// subgroup pool whose tag becomes the job's follow-up hint
    Subgroups {
        general_probability: f64,
        subgroups: Vec<(String, u32)>,
    },
}

/// Immutable per-station policy
#[derive(Debug, Clone)]
pub struct StationProfile {
    pub id: String,
    pub name: String,
    pub base_path: String,
    pub default_cover_art: String,
    /// Weighted template table
    pub templates: Vec<(Template, u32)>,
    /// Follow-up hint → template replacing the weighted draw
    pub followup_overrides: HashMap<String, Template>,
    /// Probability that a zone gets a narration attempt at all
    pub narration_acceptance: f64,
    pub outro: OutroPolicy,
    /// Probability that a station-id token picks a long id
    pub long_id_probability: f64,
    /// Music gain while narration is active
    pub duck_target: f32,
}

impl StationProfile {
    /// Music/ids/ads/news rotation with ad and news follow-ups
    pub fn standard(id: &str, name: &str, base_path: &str) -> Result<Self> {
        let templates = weighted_templates(&[
            ("solo+music", 4),
            ("music", 4),
            ("id+music", 3),
            ("ad+id+music", 2),
            ("solo+id+music", 1),
        ])?;
        let mut followup_overrides = HashMap::new();
        followup_overrides.insert(HINT_TO_AD.to_string(), Template::parse("ad+id+music")?);
        followup_overrides.insert(HINT_TO_NEWS.to_string(), Template::parse("news+id+music")?);

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            base_path: base_path.to_string(),
            default_cover_art: format!("{}/capas/default.jpg", base_path),
            templates,
            followup_overrides,
            narration_acceptance: 0.9,
            outro: OutroPolicy::Subgroups {
                general_probability: 0.7,
                subgroups: vec![(HINT_TO_AD.to_string(), 3), (HINT_TO_NEWS.to_string(), 2)],
            },
            long_id_probability: 0.7,
            duck_target: 0.3,
        })
    }

    /// Jingles and long/short station ids, no follow-up overrides
    pub fn home(id: &str, name: &str, base_path: &str) -> Result<Self> {
        let templates = weighted_templates(&[
            ("station-id+music", 4),
            ("music", 4),
            ("jingle+station-id+music", 3),
            ("solo+music", 2),
            ("jingle+solo+music", 1),
        ])?;

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            base_path: base_path.to_string(),
            default_cover_art: format!("{}/capas/default.jpg", base_path),
            templates,
            followup_overrides: HashMap::new(),
            narration_acceptance: 0.7,
            outro: OutroPolicy::GeneralOnly {
                general_probability: 0.7,
            },
            long_id_probability: 0.7,
            duck_target: 0.5,
        })
    }

    /// Build a profile from its preset and apply the entry's overrides
    pub fn from_config(config: &StationConfig) -> Result<Self> {
        let mut profile = match config.preset {
            StationPreset::Standard => Self::standard(&config.id, &config.name, &config.base_path)?,
            StationPreset::Home => Self::home(&config.id, &config.name, &config.base_path)?,
        };
        if let Some(target) = config.duck_target {
            profile.duck_target = target;
        }
        if let Some(p) = config.narration_acceptance {
            profile.narration_acceptance = p;
        }
        if let Some(table) = &config.templates {
            let entries: Vec<(&str, u32)> = table.iter().map(|(s, w)| (s.as_str(), *w)).collect();
            profile.templates = weighted_templates(&entries)
                .map_err(|e| for_station(&config.id, e))?;
        }
        if let Some(overrides) = &config.followup_overrides {
            profile.followup_overrides = overrides
                .iter()
                .map(|(hint, s)| Template::parse(s).map(|t| (hint.clone(), t)))
                .collect::<Result<HashMap<_, _>>>()
                .map_err(|e| for_station(&config.id, e))?;
        }
        profile.default_cover_art = config.default_cover_art();
        Ok(profile)
    }
}

fn for_station(id: &str, err: Error) -> Error {
    match err {
        Error::Config(msg) => Error::Config(format!("station '{}': {}", id, msg)),
        other => other,
    }
}

fn weighted_templates(entries: &[(&str, u32)]) -> Result<Vec<(Template, u32)>> {
    let templates = entries
        .iter()
        .map(|(s, w)| Template::parse(s).map(|t| (t, *w)))
        .collect::<Result<Vec<_>>>()?;
    if templates.iter().all(|(_, w)| *w == 0) {
        return Err(Error::Config("template table has no positive weight".to_string()));
    }
    Ok(templates)
}

/// Runtime state of one station, owned by its runner
pub struct Station {
    pub(crate) profile: Arc<StationProfile>,
    pub(crate) catalog: Arc<StationCatalog>,
    pub(crate) music_queue: RotatingQueue<MusicDescriptor>,
    pub(crate) id_queue: RotatingQueue<String>,
    pub(crate) ad_queue: RotatingQueue<String>,
    /// Absolute time at which the last scheduled item ends
    pub timeline_end: f64,
    /// Asset identifier of the last scheduled item (crossfade predecessor)
    pub last_asset: Option<String>,
    /// Follow-up tag left by the most recently scheduled job
    pub followup_hint: Option<String>,
    pub(crate) rng: StdRng,
}

impl Station {
    /// Build a station and shuffle all of its queues
    pub fn new(profile: Arc<StationProfile>, catalog: Arc<StationCatalog>, mut rng: StdRng) -> Self {
        let mut music_queue = RotatingQueue::new(catalog.music.clone());
        let mut id_queue = RotatingQueue::new(catalog.ids.clone());
        let mut ad_queue = RotatingQueue::new(catalog.ads.clone());
        music_queue.reshuffle(&mut rng);
        id_queue.reshuffle(&mut rng);
        ad_queue.reshuffle(&mut rng);

        Self {
            profile,
            catalog,
            music_queue,
            id_queue,
            ad_queue,
            timeline_end: 0.0,
            last_asset: None,
            followup_hint: None,
            rng,
        }
    }

    pub fn id(&self) -> &str {
        &self.profile.id
    }

    pub fn profile(&self) -> &StationProfile {
        &self.profile
    }

    pub fn catalog(&self) -> &StationCatalog {
        &self.catalog
    }
}
