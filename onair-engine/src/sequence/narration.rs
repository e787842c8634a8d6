//! Narration zone resolution
//!
//! Given a music track and one of its zones, decide whether a narration
//! plays there and which one. Every candidate must fit inside the zone.

use crate::random::{chance, pick, weighted_pick};
use crate::sequence::{CompositionContext, NarrationCandidate};
use crate::station::{OutroPolicy, StationProfile};
use onair_common::catalog::{MusicDescriptor, StationCatalog, ZoneKind};
use onair_common::metadata::NarrationDurations;
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::trace;

/// Intro draws below this use the general pool
const INTRO_GENERAL_THRESHOLD: f64 = 0.4;
/// Intro draws below this (and above the general threshold) use the track pool
const INTRO_TRACK_THRESHOLD: f64 = 0.8;

const MORNING_HOURS: RangeInclusive<u32> = 4..=10;
const EVENING_HOURS: RangeInclusive<u32> = 17..=21;

const NO_POOL: &[String] = &[];

/// Chooses narrations for intro and outro zones
#[derive(Debug, Clone)]
pub struct NarrationResolver {
    durations: Arc<NarrationDurations>,
}

impl NarrationResolver {
    pub fn new(durations: Arc<NarrationDurations>) -> Self {
        Self { durations }
    }

    /// Resolve a narration for `zone_kind` of `music`, or `None`
    ///
    /// Random draws happen in a fixed order: acceptance gate, pool draw,
    /// subgroup draw (outro only, when needed), candidate pick.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        profile: &StationProfile,
        catalog: &StationCatalog,
        music: &MusicDescriptor,
        zone_kind: ZoneKind,
        ctx: &CompositionContext,
        rng: &mut R,
    ) -> Option<NarrationCandidate> {
        let zone = music.zone(zone_kind).filter(|z| !z.is_empty())?;

        if !chance(rng, profile.narration_acceptance) {
            return None;
        }

        let r: f64 = rng.gen();
        let (pool, subgroup): (&[String], Option<String>) = match zone_kind {
            ZoneKind::Intro => (intro_pool(catalog, music, ctx, r), None),
            ZoneKind::Outro => match &profile.outro {
                OutroPolicy::GeneralOnly { general_probability } => {
                    if r < *general_probability {
                        (catalog.general.as_slice(), None)
                    } else {
                        (NO_POOL, None)
                    }
                }
                OutroPolicy::Subgroups {
                    general_probability,
                    subgroups,
                } => {
                    if r < *general_probability {
                        (catalog.general.as_slice(), None)
                    } else {
                        match weighted_pick(rng, subgroups) {
                            Some(tag) => (catalog.outro_subgroup_pool(tag), Some(tag.clone())),
                            None => (NO_POOL, None),
                        }
                    }
                }
            },
        };

        let candidates = self.filter_candidates(pool, zone.len());
        let chosen = pick(rng, &candidates)?;
        trace!(
            "{:?} narration for {}: {} ({} samples)",
            zone_kind,
            music.name,
            chosen.0,
            chosen.1
        );
        Some(NarrationCandidate {
            asset_id: chosen.0.clone(),
            duration_samples: chosen.1,
            subgroup,
        })
    }

    /// Entries of `pool` with a known duration that fits in `zone_len` samples
    pub fn filter_candidates(&self, pool: &[String], zone_len: u64) -> Vec<(String, u64)> {
        pool.iter()
            .filter_map(|id| {
                let samples = self.durations.lookup(id)?;
                (samples <= zone_len).then(|| (id.clone(), samples))
            })
            .collect()
    }
}

fn intro_pool<'a>(
    catalog: &'a StationCatalog,
    music: &MusicDescriptor,
    ctx: &CompositionContext,
    r: f64,
) -> &'a [String] {
    if r < INTRO_GENERAL_THRESHOLD {
        catalog.general.as_slice()
    } else if r < INTRO_TRACK_THRESHOLD {
        catalog.intro_pool(&music.name)
    } else if MORNING_HOURS.contains(&ctx.hour) {
        catalog.time_pools.morning.as_slice()
    } else if EVENING_HOURS.contains(&ctx.hour) {
        catalog.time_pools.evening.as_slice()
    } else {
        NO_POOL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onair_common::catalog::TimePools;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn music() -> MusicDescriptor {
        MusicDescriptor {
            file: "R/musicas/song.wav".to_string(),
            name: "song".to_string(),
            cover: None,
            intro_start: Some(0),
            intro_end: Some(48_000),
            outro_start: Some(480_000),
            outro_end: Some(960_000),
        }
    }

    fn durations(entries: &[(&str, u64)]) -> Arc<NarrationDurations> {
        let mut d = NarrationDurations::new();
        for (k, v) in entries {
            d.insert(*k, *v);
        }
        Arc::new(d)
    }

    fn always(mut profile: StationProfile) -> StationProfile {
        profile.narration_acceptance = 1.0;
        profile
    }

    #[test]
    fn test_filter_excludes_unknown_and_too_long() {
        let resolver = NarrationResolver::new(durations(&[("fits.wav", 100), ("long.wav", 1000)]));
        let pool = vec![
            "N/fits.wav".to_string(),
            "N/long.wav".to_string(),
            "N/unknown.wav".to_string(),
        ];
        let out = resolver.filter_candidates(&pool, 500);
        assert_eq!(out, vec![("N/fits.wav".to_string(), 100)]);
    }

    #[test]
    fn test_zone_boundary_is_inclusive() {
        let resolver = NarrationResolver::new(durations(&[("exact.wav", 500)]));
        let out = resolver.filter_candidates(&["exact.wav".to_string()], 500);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_missing_zone_resolves_none() {
        let resolver = NarrationResolver::new(durations(&[("g.wav", 10)]));
        let profile = always(StationProfile::standard("s", "S", "S").unwrap());
        let catalog = StationCatalog {
            general: vec!["g.wav".to_string()],
            ..Default::default()
        };
        let mut m = music();
        m.intro_end = None;
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = CompositionContext::new(12, 1);
        assert!(resolver
            .resolve(&profile, &catalog, &m, ZoneKind::Intro, &ctx, &mut rng)
            .is_none());
    }

    #[test]
    fn test_zero_length_zone_resolves_none() {
        let resolver = NarrationResolver::new(durations(&[("blip.wav", 0)]));
        let profile = always(StationProfile::standard("s", "S", "S").unwrap());
        let catalog = StationCatalog {
            general: vec!["blip.wav".to_string()],
            ..Default::default()
        };
        let mut m = music();
        m.intro_end = m.intro_start;
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = CompositionContext::new(12, 1);
        for _ in 0..20 {
            assert!(resolver
                .resolve(&profile, &catalog, &m, ZoneKind::Intro, &ctx, &mut rng)
                .is_none());
        }
    }

    #[test]
    fn test_zero_acceptance_never_narrates() {
        let resolver = NarrationResolver::new(durations(&[("g.wav", 10)]));
        let mut profile = StationProfile::standard("s", "S", "S").unwrap();
        profile.narration_acceptance = 0.0;
        let catalog = StationCatalog {
            general: vec!["g.wav".to_string()],
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let ctx = CompositionContext::new(12, 1);
        for _ in 0..50 {
            assert!(resolver
                .resolve(&profile, &catalog, &music(), ZoneKind::Intro, &ctx, &mut rng)
                .is_none());
        }
    }

    #[test]
    fn test_candidates_never_exceed_zone() {
        let resolver = NarrationResolver::new(durations(&[
            ("short.wav", 20_000),
            ("long.wav", 60_000),
            ("track.wav", 30_000),
            ("morning.wav", 47_000),
        ]));
        let profile = always(StationProfile::standard("s", "S", "S").unwrap());
        let mut intro = HashMap::new();
        intro.insert("song".to_string(), vec!["track.wav".to_string(), "long.wav".to_string()]);
        let catalog = StationCatalog {
            general: vec!["short.wav".to_string(), "long.wav".to_string()],
            intro_narrations: intro,
            time_pools: TimePools {
                morning: vec!["morning.wav".to_string(), "long.wav".to_string()],
                evening: vec![],
            },
            ..Default::default()
        };
        let ctx = CompositionContext::new(8, 1);
        let mut rng = StdRng::seed_from_u64(11);
        let mut resolved = 0;
        for _ in 0..200 {
            if let Some(c) =
                resolver.resolve(&profile, &catalog, &music(), ZoneKind::Intro, &ctx, &mut rng)
            {
                assert!(c.duration_samples <= 48_000);
                assert_ne!(c.asset_id, "long.wav");
                assert!(c.subgroup.is_none());
                resolved += 1;
            }
        }
        assert!(resolved > 0);
    }

    #[test]
    fn test_time_of_day_pool_outside_windows_is_empty() {
        let catalog = StationCatalog {
            time_pools: TimePools {
                morning: vec!["m.wav".to_string()],
                evening: vec!["e.wav".to_string()],
            },
            ..Default::default()
        };
        let m = music();
        assert_eq!(intro_pool(&catalog, &m, &CompositionContext::new(4, 1), 0.9), &["m.wav".to_string()]);
        assert_eq!(intro_pool(&catalog, &m, &CompositionContext::new(10, 1), 0.9), &["m.wav".to_string()]);
        assert_eq!(intro_pool(&catalog, &m, &CompositionContext::new(17, 1), 0.9), &["e.wav".to_string()]);
        assert!(intro_pool(&catalog, &m, &CompositionContext::new(13, 1), 0.9).is_empty());
        assert!(intro_pool(&catalog, &m, &CompositionContext::new(23, 1), 0.9).is_empty());
    }

    #[test]
    fn test_outro_subgroup_sets_tag() {
        let resolver = NarrationResolver::new(durations(&[("toad.wav", 1000), ("tonews.wav", 1000)]));
        let mut profile = always(StationProfile::standard("s", "S", "S").unwrap());
        profile.outro = OutroPolicy::Subgroups {
            general_probability: 0.0,
            subgroups: vec![("to-ad".to_string(), 1), ("to-news".to_string(), 1)],
        };
        let mut subgroups = HashMap::new();
        subgroups.insert("to-ad".to_string(), vec!["toad.wav".to_string()]);
        subgroups.insert("to-news".to_string(), vec!["tonews.wav".to_string()]);
        let catalog = StationCatalog {
            outro_subgroups: subgroups,
            ..Default::default()
        };
        let ctx = CompositionContext::new(12, 1);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let c = resolver
                .resolve(&profile, &catalog, &music(), ZoneKind::Outro, &ctx, &mut rng)
                .unwrap();
            match c.subgroup.as_deref() {
                Some("to-ad") => assert_eq!(c.asset_id, "toad.wav"),
                Some("to-news") => assert_eq!(c.asset_id, "tonews.wav"),
                other => panic!("unexpected subgroup {:?}", other),
            }
        }
    }

    #[test]
    fn test_home_outro_without_general_draw_is_none() {
        let resolver = NarrationResolver::new(durations(&[("g.wav", 10)]));
        let mut profile = always(StationProfile::home("k", "K", "K").unwrap());
        profile.outro = OutroPolicy::GeneralOnly {
            general_probability: 0.0,
        };
        let catalog = StationCatalog {
            general: vec!["g.wav".to_string()],
            ..Default::default()
        };
        let ctx = CompositionContext::new(12, 1);
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            assert!(resolver
                .resolve(&profile, &catalog, &music(), ZoneKind::Outro, &ctx, &mut rng)
                .is_none());
        }
    }
}
