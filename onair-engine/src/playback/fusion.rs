//! Crossfade overlap calculation
//!
//! Decides how many seconds the next asset overlaps the previous one. The
//! decision depends on what each asset is (classified from its identifier)
//! and how it begins or ends (fade metadata).

use onair_common::config::ClassificationConfig;
use onair_common::metadata::{FadeKind, FadeMetadataIndex};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Content class derived from an asset identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetClass {
    AdJingle,
    LongId,
    /// Id belonging to the home station
    ShortId,
    News,
    Ad,
    Music,
    Id,
    Solo,
    General,
}

/// Class plus whether the asset belongs to the home station
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub class: AssetClass,
    pub home: bool,
}

/// Substring classifier with a per-identifier cache
#[derive(Debug)]
pub struct AssetClassifier {
    rules: ClassificationConfig,
    home_marker: Option<String>,
    cache: RwLock<HashMap<String, Classification>>,
}

impl AssetClassifier {
    /// `home_marker` is the home station's base path, if there is one
    pub fn new(rules: ClassificationConfig, home_marker: Option<String>) -> Self {
        Self {
            rules,
            home_marker: home_marker.filter(|m| !m.is_empty()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn rules(&self) -> &ClassificationConfig {
        &self.rules
    }

    pub fn classify(&self, asset_id: &str) -> Classification {
        if let Ok(cache) = self.cache.read() {
            if let Some(c) = cache.get(asset_id) {
                return *c;
            }
        }
        let c = self.classify_uncached(asset_id);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(asset_id.to_string(), c);
        }
        c
    }

    fn classify_uncached(&self, asset_id: &str) -> Classification {
        let r = &self.rules;
        let has = |marker: &str| !marker.is_empty() && asset_id.contains(marker);
        let home = self.home_marker.as_deref().is_some_and(has);

        let class = if r.ad_jingle_markers.iter().any(|m| has(m.as_str())) {
            AssetClass::AdJingle
        } else if r.long_id_markers.iter().any(|m| has(m.as_str())) {
            AssetClass::LongId
        } else if home && has(r.id_marker.as_str()) {
            AssetClass::ShortId
        } else if has(r.news_marker.as_str()) {
            AssetClass::News
        } else if has(r.ad_marker.as_str()) {
            AssetClass::Ad
        } else if has(r.music_marker.as_str()) {
            AssetClass::Music
        } else if has(r.id_marker.as_str()) {
            AssetClass::Id
        } else if has(r.solo_marker.as_str()) {
            AssetClass::Solo
        } else {
            AssetClass::General
        };

        Classification { class, home }
    }
}

/// Crossfade rank of a home-station music edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rank {
    Normal,
    Possible,
    Blocked,
    Unranked,
}

/// Computes the overlap, in seconds, between two adjacent assets
#[derive(Debug, Clone)]
pub struct FusionCalculator {
    classifier: Arc<AssetClassifier>,
    metadata: Arc<FadeMetadataIndex>,
}

impl FusionCalculator {
    pub fn new(classifier: Arc<AssetClassifier>, metadata: Arc<FadeMetadataIndex>) -> Self {
        Self { classifier, metadata }
    }

    pub fn classifier(&self) -> &AssetClassifier {
        &self.classifier
    }

    /// Overlap between `prev` (if any) and `next`
    ///
    /// The first matching rule wins.
    pub fn overlap(&self, prev: Option<&str>, next: &str) -> f64 {
        let Some(prev) = prev else {
            return 0.0;
        };

        let a = self.classifier.classify(prev);
        let b = self.classifier.classify(next);

        if a.class == AssetClass::News || b.class == AssetClass::News {
            return 0.2;
        }

        let end_a = self.end_kind(prev);
        let start_b = self.start_kind(next);
        let normal = |k: Option<FadeKind>| k == Some(FadeKind::Normal);
        let none = |k: Option<FadeKind>| k == Some(FadeKind::None);

        if a.class == AssetClass::Music && a.home {
            let rank_a = if end_a == Some(FadeKind::FadeOut) {
                Rank::Normal
            } else {
                Rank::Possible
            };
            let rank_b = match start_b {
                Some(FadeKind::Normal) => Rank::Normal,
                Some(FadeKind::None) => Rank::Blocked,
                _ => Rank::Unranked,
            };
            return if rank_a == Rank::Blocked || rank_b == Rank::Blocked {
                0.5
            } else if rank_a == Rank::Normal && rank_b == Rank::Normal {
                1.5
            } else {
                1.0
            };
        }

        if a.class == AssetClass::ShortId || b.class == AssetClass::ShortId {
            return 1.0;
        }
        if a.class == AssetClass::LongId {
            return 2.0;
        }
        if b.class == AssetClass::LongId {
            return 1.0;
        }
        if a.class == AssetClass::AdJingle || b.class == AssetClass::AdJingle {
            return 0.5;
        }

        if none(end_a) || none(start_b) {
            return 0.0;
        }

        match a.class {
            AssetClass::Music => match end_a {
                Some(FadeKind::FadeOut) => {
                    if normal(start_b) {
                        1.5
                    } else {
                        1.0
                    }
                }
                Some(FadeKind::Abrupt) => {
                    if normal(start_b) {
                        1.0
                    } else {
                        0.5
                    }
                }
                _ => 0.2,
            },
            AssetClass::Ad if b.class == AssetClass::Id => {
                if normal(end_a) && normal(start_b) {
                    0.5
                } else {
                    0.2
                }
            }
            AssetClass::Solo | AssetClass::Id | AssetClass::General => {
                if normal(end_a) && normal(start_b) {
                    1.0
                } else {
                    0.5
                }
            }
            _ => 0.2,
        }
    }

    /// End behavior of `asset_id`; absent metadata means abrupt for music
    /// paths and normal otherwise
    fn end_kind(&self, asset_id: &str) -> Option<FadeKind> {
        match self.metadata.get(asset_id) {
            Some(entry) => entry.end,
            None => {
                let marker = &self.classifier.rules().music_marker;
                if !marker.is_empty() && asset_id.contains(marker.as_str()) {
                    Some(FadeKind::Abrupt)
                } else {
                    Some(FadeKind::Normal)
                }
            }
        }
    }

    /// Start behavior of `asset_id`; absent metadata means normal
    fn start_kind(&self, asset_id: &str) -> Option<FadeKind> {
        match self.metadata.get(asset_id) {
            Some(entry) => entry.start,
            None => Some(FadeKind::Normal),
        }
    }
}
