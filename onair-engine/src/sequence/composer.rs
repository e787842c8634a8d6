//! Sequence composition
//!
//! Turns a station's weighted template table into a concrete job by
//! resolving every template token against the station's pools and queues.

use crate::random::{chance, pick, weighted_pick};
use crate::sequence::{CompositionContext, Item, ItemKind, NarrationResolver, SequenceJob};
use crate::station::{Station, Template, Token};
use onair_common::catalog::{stem, ZoneKind};
use onair_common::news::DayEligibility;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds sequence jobs for any station
#[derive(Clone)]
pub struct SequenceComposer {
    narration: NarrationResolver,
    news: Arc<dyn DayEligibility>,
}

impl SequenceComposer {
    pub fn new(narration: NarrationResolver, news: Arc<dyn DayEligibility>) -> Self {
        Self { narration, news }
    }

    /// Compose the station's next job
    ///
    /// Tokens that resolve to nothing (empty pool, no eligible news) are
    /// dropped, so a job may be shorter than its template or even empty.
    pub fn compose(&self, station: &mut Station, ctx: &CompositionContext) -> SequenceJob {
        let Some(template) = self.choose_template(station) else {
            warn!("[{}] no template to compose from", station.id());
            return SequenceJob::new("");
        };
        let mut job = SequenceJob::new(template.name());

        for token in template.tokens() {
            if let Some(item) = self.resolve_token(station, *token, ctx, &mut job) {
                job.items.push(item);
            }
        }

        debug!(
            "[{}] composed {} ({} items, hint {:?})",
            station.id(),
            job.template,
            job.items.len(),
            job.followup_hint
        );
        job
    }

    /// Weighted draw, replaced by the follow-up override if one matches
    ///
    /// The weighted draw always happens so that the random stream does not
    /// depend on whether a hint was pending.
    fn choose_template(&self, station: &mut Station) -> Option<Template> {
        let drawn = weighted_pick(&mut station.rng, &station.profile.templates).cloned();

        match station
            .followup_hint
            .as_ref()
            .and_then(|hint| station.profile.followup_overrides.get(hint))
        {
            Some(forced) => Some(forced.clone()),
            None => drawn,
        }
    }

    fn resolve_token(
        &self,
        station: &mut Station,
        token: Token,
        ctx: &CompositionContext,
        job: &mut SequenceJob,
    ) -> Option<Item> {
        let catalog = Arc::clone(&station.catalog);
        match token {
            Token::Id => station
                .id_queue
                .next(&mut station.rng)
                .map(|id| Item::new(ItemKind::Id, id)),
            Token::Ad => station
                .ad_queue
                .next(&mut station.rng)
                .map(|id| Item::new(ItemKind::Ad, id)),
            Token::Solo => pick(&mut station.rng, &catalog.solos).map(|id| Item::new(ItemKind::Solo, id.clone())),
            Token::Jingle => {
                pick(&mut station.rng, &catalog.jingles).map(|id| Item::new(ItemKind::Jingle, id.clone()))
            }
            Token::StationId => {
                let long = chance(&mut station.rng, station.profile.long_id_probability);
                let (pool, kind) = if long {
                    (&catalog.long_ids, ItemKind::LongId)
                } else {
                    (&catalog.short_ids, ItemKind::ShortId)
                };
                pick(&mut station.rng, pool).map(|id| Item::new(kind, id.clone()))
            }
            Token::News => {
                let available: Vec<&String> = catalog
                    .news
                    .iter()
                    .filter(|id| self.news.is_eligible(ctx.day_of_month, stem(id)))
                    .collect();
                pick(&mut station.rng, &available).map(|id| Item::new(ItemKind::News, (*id).clone()))
            }
            Token::Music => {
                let music = station.music_queue.next(&mut station.rng)?;
                let intro = self.narration.resolve(
                    &station.profile,
                    &catalog,
                    &music,
                    ZoneKind::Intro,
                    ctx,
                    &mut station.rng,
                );
                let outro = self.narration.resolve(
                    &station.profile,
                    &catalog,
                    &music,
                    ZoneKind::Outro,
                    ctx,
                    &mut station.rng,
                );
                if let Some(outro) = &outro {
                    job.followup_hint = outro.subgroup.clone();
                }
                Some(Item {
                    kind: ItemKind::Music,
                    asset_id: music.file.clone(),
                    music: Some(music),
                    intro,
                    outro,
                })
            }
        }
    }
}
