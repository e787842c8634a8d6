//! Timeline placement
//!
//! Turns a loaded job into absolute-time actions on the station's event
//! queue. Items are chained back to back, each one pulled earlier by its
//! crossfade overlap with the previous asset. Narration overlays are
//! back-timed so they finish at the end of their zone.

use crate::playback::events::{EventQueue, StationAction};
use crate::playback::fusion::FusionCalculator;
use crate::playback::Bus;
use crate::sequence::{ItemKind, LoadedItem, LoadedJob};
use crate::station::Station;
use onair_common::catalog::ZoneKind;
use onair_common::events::{EventBus, OnAirEvent};
use onair_common::timing::offset_to_seconds;
use std::sync::Arc;
use tracing::debug;

/// Default lead of a duck-start ahead of its narration (seconds)
pub const DEFAULT_DUCK_LEAD: f64 = 0.05;

/// Default gap before the first item when the timeline has fallen behind
pub const DEFAULT_START_LEAD: f64 = 0.1;

/// Places loaded jobs on a station's timeline
pub struct TimelineScheduler {
    fusion: Arc<FusionCalculator>,
    duck_lead: f64,
    start_lead: f64,
}

impl TimelineScheduler {
    pub fn new(fusion: Arc<FusionCalculator>) -> Self {
        Self {
            fusion,
            duck_lead: DEFAULT_DUCK_LEAD,
            start_lead: DEFAULT_START_LEAD,
        }
    }

    pub fn with_leads(mut self, duck_lead: f64, start_lead: f64) -> Self {
        self.duck_lead = duck_lead;
        self.start_lead = start_lead;
        self
    }

    pub fn fusion(&self) -> &FusionCalculator {
        &self.fusion
    }

    /// Schedule every item of `job`; returns the new timeline end
    ///
    /// An empty job leaves the station untouched.
    pub fn schedule(
        &self,
        station: &mut Station,
        job: &LoadedJob,
        now: f64,
        queue: &mut EventQueue,
        events: Option<&EventBus>,
    ) -> f64 {
        if job.is_empty() {
            return station.timeline_end;
        }

        if station.timeline_end < now {
            debug!(
                "[{}] timeline fell behind ({:.3} < {:.3}), restarting",
                station.id(),
                station.timeline_end,
                now
            );
            station.timeline_end = now + self.start_lead;
            station.last_asset = None;
        }

        for loaded in &job.items {
            let duration = loaded.buffer.duration();
            let overlap = self
                .fusion
                .overlap(station.last_asset.as_deref(), &loaded.item.asset_id)
                .min(duration);
            let start = station.timeline_end - overlap;
            station.timeline_end = start + duration;
            station.last_asset = Some(loaded.item.asset_id.clone());

            debug!(
                "[{}] {} at {:.3}s (overlap {:.2}s, {:.2}s long)",
                station.id(),
                loaded.item.asset_id,
                start,
                overlap,
                duration
            );

            if loaded.item.kind == ItemKind::Music {
                let (name, cover_art) = match &loaded.item.music {
                    Some(m) => (m.name.clone(), m.cover.clone()),
                    None => (loaded.item.asset_id.clone(), None),
                };
                queue.push(
                    start,
                    StationAction::NowPlaying {
                        asset_id: loaded.item.asset_id.clone(),
                        name,
                        cover_art,
                    },
                );
            }

            queue.push(
                start,
                StationAction::Play {
                    bus: loaded.item.kind.bus(),
                    buffer: loaded.buffer.clone(),
                },
            );

            if loaded.item.kind == ItemKind::Music {
                for zone in [ZoneKind::Intro, ZoneKind::Outro] {
                    self.schedule_overlay(loaded, zone, start, now, queue);
                }
            }
        }

        station.followup_hint = job.followup_hint.clone();

        if let Some(bus) = events {
            bus.emit_lossy(OnAirEvent::JobScheduled {
                station_id: station.id().to_string(),
                job_id: job.id,
                template: job.template.clone(),
                item_count: job.items.len(),
                timeline_end: station.timeline_end,
                timestamp: onair_common::time::now(),
            });
        }

        station.timeline_end
    }

    fn schedule_overlay(
        &self,
        loaded: &LoadedItem,
        zone_kind: ZoneKind,
        item_start: f64,
        now: f64,
        queue: &mut EventQueue,
    ) {
        let Some(buffer) = loaded.narration_buffer(zone_kind) else {
            return;
        };
        let Some(zone) = loaded.item.music.as_ref().and_then(|m| m.zone(zone_kind)) else {
            return;
        };

        // Finish at the zone end, but never begin before the zone does
        let offset = (zone.end as i64 - buffer.length_samples as i64).max(zone.start as i64);
        let at = item_start + offset_to_seconds(offset);

        queue.push(
            at,
            StationAction::Play {
                bus: Bus::Narration,
                buffer: buffer.clone(),
            },
        );
        queue.push((at - self.duck_lead).max(now), StationAction::DuckStart);
        queue.push(at + buffer.duration(), StationAction::DuckEnd);
    }
}
