//! Sequence jobs
//!
//! A job is the unit of work a station composes, loads and schedules in one
//! runner cycle: a short ordered list of items such as `id + music`.

pub mod composer;
pub mod narration;

pub use composer::SequenceComposer;
pub use narration::NarrationResolver;

use crate::loader::TimedBuffer;
use crate::playback::Bus;
use onair_common::catalog::{MusicDescriptor, ZoneKind};
use serde::Serialize;
use uuid::Uuid;

/// Content type of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Music,
    Id,
    Ad,
    News,
    Solo,
    Jingle,
    ShortId,
    LongId,
}

impl ItemKind {
    /// Bus the item plays on: music on the music bus, everything else on
    /// the narration bus
    pub fn bus(&self) -> Bus {
        match self {
            ItemKind::Music => Bus::Music,
            _ => Bus::Narration,
        }
    }
}

/// A narration chosen for one zone of a music track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationCandidate {
    pub asset_id: String,
    /// Length in samples at the working rate (never exceeds the zone length)
    pub duration_samples: u64,
    /// Follow-up tag of the pool it was drawn from
    pub subgroup: Option<String>,
}

/// One composed item, not yet loaded
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub kind: ItemKind,
    pub asset_id: String,
    pub music: Option<MusicDescriptor>,
    pub intro: Option<NarrationCandidate>,
    pub outro: Option<NarrationCandidate>,
}

impl Item {
    pub fn new(kind: ItemKind, asset_id: impl Into<String>) -> Self {
        Self {
            kind,
            asset_id: asset_id.into(),
            music: None,
            intro: None,
            outro: None,
        }
    }

    pub fn narration(&self, zone: ZoneKind) -> Option<&NarrationCandidate> {
        match zone {
            ZoneKind::Intro => self.intro.as_ref(),
            ZoneKind::Outro => self.outro.as_ref(),
        }
    }
}

/// Composed job
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceJob {
    pub id: Uuid,
    /// Name of the template the job was built from
    pub template: String,
    pub items: Vec<Item>,
    /// Follow-up hint for the next composition
    pub followup_hint: Option<String>,
}

impl SequenceJob {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            template: template.into(),
            items: Vec::new(),
            followup_hint: None,
        }
    }
}

/// Item with its buffers loaded
#[derive(Debug, Clone)]
pub struct LoadedItem {
    pub item: Item,
    pub buffer: TimedBuffer,
    pub intro_buffer: Option<TimedBuffer>,
    pub outro_buffer: Option<TimedBuffer>,
}

impl LoadedItem {
    pub fn narration_buffer(&self, zone: ZoneKind) -> Option<&TimedBuffer> {
        match zone {
            ZoneKind::Intro => self.intro_buffer.as_ref(),
            ZoneKind::Outro => self.outro_buffer.as_ref(),
        }
    }
}

/// Job whose unloadable items have been dropped
#[derive(Debug, Clone)]
pub struct LoadedJob {
    pub id: Uuid,
    pub template: String,
    pub items: Vec<LoadedItem>,
    pub followup_hint: Option<String>,
}

impl LoadedJob {
    /// Job with nothing to play
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            template: String::new(),
            items: Vec::new(),
            followup_hint: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of item durations in seconds
    pub fn total_duration(&self) -> f64 {
        self.items.iter().map(|i| i.buffer.duration()).sum()
    }
}

/// Wall-clock facts that influence composition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositionContext {
    /// Local hour of day (0-23)
    pub hour: u32,
    /// Local day of month (1-31)
    pub day_of_month: u32,
}

impl CompositionContext {
    pub fn new(hour: u32, day_of_month: u32) -> Self {
        Self { hour, day_of_month }
    }

    /// Context for the current local time
    pub fn now() -> Self {
        let (hour, day_of_month) = onair_common::time::local_hour_and_day();
        Self { hour, day_of_month }
    }
}
