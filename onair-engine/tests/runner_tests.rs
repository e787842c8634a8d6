//! Station runner behaviour over virtual time

mod helpers;

use helpers::*;
use onair_common::events::{EventBus, OnAirEvent};
use onair_engine::playback::Bus;
use onair_engine::state::RunnerPhase;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn drain(rx: &mut tokio::sync::broadcast::Receiver<OnAirEvent>) -> Vec<OnAirEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test(start_paused = true)]
async fn test_music_plays_back_to_back() {
    let sink = Arc::new(RecordingSink::default());
    let director = start(
        &[("rock", "ROCK")],
        sink.clone(),
        Arc::new(LengthLoader),
        EventBus::new(1024),
    );

    tokio::time::sleep(Duration::from_secs(300)).await;

    let music = sink.music_plays_for("rock");
    assert!(music.len() >= 5, "only {} music plays", music.len());
    for pair in music.windows(2) {
        assert!(pair[1].at > pair[0].at);
    }

    // the first pass through the pool never repeats a track
    let first: HashSet<_> = music.iter().take(4).map(|p| p.asset_id.clone()).collect();
    assert_eq!(first.len(), 4);

    // first item lands at the start lead
    let plays = sink.plays_for("rock");
    assert!((plays[0].at - 0.1).abs() < 1e-6);

    let state = director.station_state("rock").unwrap();
    assert_eq!(state.get_phase().await, RunnerPhase::SteadyLoop);
    assert!(state.jobs_scheduled() >= 3);
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_next_job_scheduled_before_timeline_runs_out() {
    let sink = Arc::new(RecordingSink::default());
    let director = start(
        &[("rock", "ROCK")],
        sink.clone(),
        Arc::new(LengthLoader),
        EventBus::new(1024),
    );

    tokio::time::sleep(Duration::from_secs(200)).await;

    // every play starts no later than the previous item ends, so there is
    // never dead air between jobs
    let plays = sink.plays_for("rock");
    let mut end = plays[0].at;
    for p in &plays {
        assert!(p.at <= end + 1e-6, "gap before {} at {}", p.asset_id, p.at);
        end = end.max(p.at + p.duration);
    }
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_now_playing_only_from_audible_station() {
    let sink = Arc::new(RecordingSink::default());
    let events = EventBus::new(4096);
    let mut rx = events.subscribe();
    let director = start(TWO_STATIONS, sink.clone(), Arc::new(LengthLoader), events);

    tokio::time::sleep(Duration::from_secs(120)).await;

    let now_playing: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            OnAirEvent::NowPlaying { station_id, cover_art, .. } => Some((station_id, cover_art)),
            _ => None,
        })
        .collect();
    assert!(!now_playing.is_empty());
    assert!(now_playing.iter().all(|(id, _)| id == "rock"));
    assert!(now_playing.iter().all(|(_, cover)| cover.starts_with("ROCK/capas/")));

    // the silent station still runs and tracks its own now-playing record
    assert!(!sink.music_plays_for("pop").is_empty());
    let pop = director.station_state("pop").unwrap();
    assert!(pop.get_now_playing().await.is_some());
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_unloadable_content_backs_off() {
    let sink = Arc::new(RecordingSink::default());
    let events = EventBus::new(256);
    let mut rx = events.subscribe();
    let director = start(&[("rock", "ROCK")], sink.clone(), Arc::new(FailingLoader), events);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let state = director.station_state("rock").unwrap();
    assert_eq!(state.get_phase().await, RunnerPhase::RetryBackoff);

    // fallback (0.5s) then backoff (5s), repeated
    tokio::time::sleep(Duration::from_secs(12)).await;
    let backoffs = drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, OnAirEvent::StationBackoff { station_id, .. } if station_id == "rock"))
        .count();
    assert!(backoffs >= 2, "only {} backoffs", backoffs);
    assert!(sink.plays_for("rock").is_empty());
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_station_without_catalog_keeps_retrying() {
    let sink = Arc::new(RecordingSink::default());
    let stations = [("rock", "ROCK"), ("empty", "EMPTY")];
    let director = onair_engine::Director::start(
        &config(&stations),
        resources(&stations[..1]),
        Arc::new(LengthLoader),
        sink.clone(),
        Arc::new(onair_engine::clock::MonotonicClock::new()),
        EventBus::new(1024),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(sink.plays_for("empty").is_empty());
    assert!(!sink.plays_for("rock").is_empty());
    let empty = director.station_state("empty").unwrap();
    assert_eq!(empty.get_phase().await, RunnerPhase::RetryBackoff);
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_same_seed_same_programme() {
    let a = Arc::new(RecordingSink::default());
    let b = Arc::new(RecordingSink::default());
    let da = start(&[("rock", "ROCK")], a.clone(), Arc::new(LengthLoader), EventBus::new(1024));
    let db = start(&[("rock", "ROCK")], b.clone(), Arc::new(LengthLoader), EventBus::new(1024));

    tokio::time::sleep(Duration::from_secs(150)).await;
    da.shutdown();
    db.shutdown();

    let ids = |s: &RecordingSink| -> Vec<String> {
        s.plays_for("rock").into_iter().map(|p| p.asset_id).collect()
    };
    let (pa, pb) = (ids(&a), ids(&b));
    let n = pa.len().min(pb.len());
    assert!(n > 3);
    assert_eq!(pa[..n], pb[..n]);
}

#[tokio::test(start_paused = true)]
async fn test_narrations_overlay_zones_and_duck_music() {
    let sink = Arc::new(RecordingSink::default());
    let director = start_narrated(&[("rock", "ROCK")], sink.clone(), EventBus::new(4096));

    tokio::time::sleep(Duration::from_secs(400)).await;

    let music = sink.music_plays_for("rock");
    let narrations: Vec<PlayRecord> = sink
        .plays_for("rock")
        .into_iter()
        .filter(|p| p.asset_id.contains("/narr/"))
        .collect();
    assert!(narrations.len() >= 3, "only {} narrations", narrations.len());
    assert!(music.len() >= 8);

    let eps = 1e-6;
    let inside = |p: &PlayRecord, (start, end): (u64, u64)| {
        music.iter().any(|m| {
            p.at >= m.at + start as f64 - eps && p.at + p.duration <= m.at + end as f64 + eps
        })
    };
    for p in &narrations {
        assert_eq!(p.bus, Bus::Narration);
        assert!((p.duration - 3.0).abs() < eps);
        assert!(
            inside(p, INTRO_ZONE) || inside(p, OUTRO_ZONE),
            "{} at {} outside every zone",
            p.asset_id,
            p.at
        );
    }

    // overlays end exactly at their zone end
    let zone_ends: Vec<f64> = narrations.iter().map(|p| p.at + p.duration).collect();
    assert!(zone_ends.iter().all(|end| music.iter().any(|m| {
        (end - (m.at + INTRO_ZONE.1 as f64)).abs() < eps || (end - (m.at + OUTRO_ZONE.1 as f64)).abs() < eps
    })));

    let ramps = sink.ramps_for("rock", Bus::Music);
    for p in &narrations {
        // duck-down lands 50ms ahead of the narration
        assert!(
            ramps
                .iter()
                .any(|r| (r.target - 0.3).abs() < 1e-6 && (r.at - (p.at - 0.05)).abs() < eps),
            "no duck for narration at {}",
            p.at
        );
        // release after the 10ms guard, back to full level
        let end = p.at + p.duration;
        if end > 399.0 {
            continue;
        }
        assert!(
            ramps
                .iter()
                .any(|r| (r.target - 1.0).abs() < 1e-6 && r.at >= end - eps && r.at <= end + 0.02),
            "no release after narration ending at {}",
            end
        );
    }
    let ducks = ramps.iter().filter(|r| (r.target - 0.3).abs() < 1e-6).count();
    let releases = ramps.iter().filter(|r| (r.target - 1.0).abs() < 1e-6).count();
    assert!(ducks >= narrations.len() && ducks <= narrations.len() + 1);
    assert!(releases <= ducks);

    director.shutdown();
}
