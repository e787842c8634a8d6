//! Asset metadata indexes
//!
//! Two read-only lookup tables consulted while composing and scheduling:
//! - [`FadeMetadataIndex`]: per-asset start/end fade behavior
//! - [`NarrationDurations`]: narration lengths in samples, merged from
//!   one or more JSON files

use crate::catalog::{basename, stem};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// Fade metadata
// ============================================================================

/// How an asset begins or ends, as far as crossfading is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FadeKind {
    /// Clean edge, safe to overlap
    Normal,
    /// Hard cut at the edge
    Abrupt,
    /// Audio already fades out on its own
    FadeOut,
    /// Must not overlap at all
    None,
    /// Any value not recognized above
    #[serde(other)]
    Other,
}

/// Fade behavior of one asset; a missing field stays unspecified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FadeEntry {
    #[serde(default, rename = "fusionStartType", alias = "start")]
    pub start: Option<FadeKind>,
    #[serde(default, rename = "fusionEndType", alias = "end")]
    pub end: Option<FadeKind>,
}

/// Asset identifier → fade entry
#[derive(Debug, Clone, Default)]
pub struct FadeMetadataIndex {
    entries: HashMap<String, FadeEntry>,
}

impl FadeMetadataIndex {
    pub fn new(entries: HashMap<String, FadeEntry>) -> Self {
        Self { entries }
    }

    /// Load the index from a JSON object of `id → {fusionStartType, fusionEndType}`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: HashMap<String, FadeEntry> = serde_json::from_str(&content)?;
        debug!("Loaded fade metadata for {} assets from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    /// Load the index, degrading to an empty one if the file is missing or malformed
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(index) => index,
            Err(e) => {
                warn!("Fade metadata unavailable ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn get(&self, asset_id: &str) -> Option<&FadeEntry> {
        self.entries.get(asset_id)
    }

    pub fn insert(&mut self, asset_id: impl Into<String>, entry: FadeEntry) {
        self.entries.insert(asset_id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Narration durations
// ============================================================================

/// Narration length index with fallback-key lookup
///
/// Lookup order for an identifier is: the full identifier, then its
/// basename, then its extension-stripped stem. Different files can share a
/// basename; when merging produces two different lengths for the same key,
/// the key is recorded as conflicting and every lookup that lands on it is
/// logged at warn level. The last merged value is kept.
///
/// Separately, two distinct narrations can fall back onto the same key
/// (`A/narr/X.wav` and `B/narr/X.wav` both reaching `X.wav`) and silently
/// share one length. [`flag_ambiguous_keys`](Self::flag_ambiguous_keys)
/// finds those keys once the catalogs are known.
#[derive(Debug, Clone, Default)]
pub struct NarrationDurations {
    entries: HashMap<String, u64>,
    conflicts: HashSet<String>,
    ambiguous: HashSet<String>,
}

impl NarrationDurations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one JSON document of `key → samples`
    ///
    /// Non-numeric or negative values are skipped.
    pub fn merge_json(&mut self, content: &str) -> Result<usize> {
        let raw: HashMap<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut merged = 0;
        for (key, value) in raw {
            let samples = value
                .as_u64()
                .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64));
            match samples {
                Some(samples) => {
                    self.insert(key, samples);
                    merged += 1;
                }
                None => debug!("Skipping non-numeric narration duration for {}", key),
            }
        }
        Ok(merged)
    }

    /// Insert one entry, recording a conflict if the key already holds another value
    pub fn insert(&mut self, key: impl Into<String>, samples: u64) {
        let key = key.into();
        if let Some(previous) = self.entries.insert(key.clone(), samples) {
            if previous != samples {
                warn!(
                    "Narration duration conflict for {}: {} vs {} samples (keeping {})",
                    key, previous, samples, samples
                );
                self.conflicts.insert(key);
            }
        }
    }

    /// Load and merge every readable file in `paths`
    ///
    /// Missing or malformed files are skipped with a warning; an index with
    /// no files loaded at all is valid but makes every narration ineligible.
    pub fn load_files(paths: &[PathBuf]) -> Self {
        let mut index = Self::new();
        let mut loaded = 0;
        for path in paths {
            let outcome = std::fs::read_to_string(path)
                .map_err(crate::Error::from)
                .and_then(|content| index.merge_json(&content));
            match outcome {
                Ok(count) => {
                    debug!("Merged {} narration durations from {}", count, path.display());
                    loaded += 1;
                }
                Err(e) => warn!("Skipping narration durations {}: {}", path.display(), e),
            }
        }
        if loaded == 0 {
            warn!("No narration duration files loaded; narrations will not be scheduled");
        }
        index
    }

    /// Duration of `asset_id` in samples, if known under any fallback key
    pub fn lookup(&self, asset_id: &str) -> Option<u64> {
        for key in [asset_id, basename(asset_id), stem(asset_id)] {
            if let Some(samples) = self.entries.get(key) {
                if self.conflicts.contains(key) {
                    warn!(
                        "Narration {} resolved through conflicting key {} ({} samples)",
                        asset_id, key, samples
                    );
                }
                return Some(*samples);
            }
        }
        None
    }

    /// Keys that received different values from different sources
    pub fn conflicts(&self) -> &HashSet<String> {
        &self.conflicts
    }

    /// Record every fallback key that more than one distinct identifier
    /// resolves through, warning once per key
    ///
    /// Returns the number of newly flagged keys.
    pub fn flag_ambiguous_keys<'a>(&mut self, asset_ids: impl IntoIterator<Item = &'a str>) -> usize {
        let mut reached: HashMap<&str, HashSet<&'a str>> = HashMap::new();
        for id in asset_ids {
            if self.entries.contains_key(id) {
                continue;
            }
            let fallback = [basename(id), stem(id)]
                .into_iter()
                .find_map(|key| self.entries.get_key_value(key).map(|(k, _)| k.as_str()));
            if let Some(key) = fallback {
                reached.entry(key).or_default().insert(id);
            }
        }

        let mut flagged: Vec<(String, Vec<&str>)> = reached
            .into_iter()
            .filter(|(key, ids)| ids.len() > 1 && !self.ambiguous.contains(*key))
            .map(|(key, ids)| (key.to_string(), ids.into_iter().collect()))
            .collect();
        flagged.sort();
        for (key, ids) in &mut flagged {
            ids.sort_unstable();
            warn!(
                "Narration duration key {} is shared by {} assets: {}",
                key,
                ids.len(),
                ids.join(", ")
            );
        }
        let count = flagged.len();
        self.ambiguous.extend(flagged.into_iter().map(|(key, _)| key));
        count
    }

    /// Fallback keys reached by more than one distinct identifier
    pub fn ambiguous(&self) -> &HashSet<String> {
        &self.ambiguous
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
