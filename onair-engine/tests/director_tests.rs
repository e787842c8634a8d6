//! Active-station selection

mod helpers;

use helpers::*;
use onair_common::events::{EventBus, OnAirEvent};
use onair_engine::playback::Bus;
use onair_engine::clock::MonotonicClock;
use onair_engine::{Director, Error};
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
async fn test_initial_master_gains() {
    let sink = Arc::new(RecordingSink::default());
    let director = start(TWO_STATIONS, sink.clone(), Arc::new(LengthLoader), EventBus::new(64));

    assert_eq!(director.active_station().await, "rock");
    assert!(director.is_audible("rock").unwrap());
    assert!(!director.is_audible("pop").unwrap());
    assert_eq!(sink.ramps_for("rock", Bus::Master)[0].target, 1.0);
    assert_eq!(sink.ramps_for("pop", Bus::Master)[0].target, 0.0);
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_station() {
    let sink = Arc::new(RecordingSink::default());
    let director = start(TWO_STATIONS, sink, Arc::new(LengthLoader), EventBus::new(64));

    let err = director.set_active_station("jazz").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(matches!(director.is_audible("jazz"), Err(Error::NotFound(_))));
    assert_eq!(director.active_station().await, "rock");
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_reselecting_active_station_is_noop() {
    let sink = Arc::new(RecordingSink::default());
    let events = EventBus::new(256);
    let mut rx = events.subscribe();
    let director = start(TWO_STATIONS, sink.clone(), Arc::new(LengthLoader), events);

    director.set_active_station("rock").await.unwrap();

    assert!(!drain(&mut rx)
        .iter()
        .any(|e| matches!(e, OnAirEvent::ActiveStationChanged { .. })));
    assert_eq!(sink.ramps_for("rock", Bus::Master).len(), 1);
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_switch_fades_and_reannounces() {
    let sink = Arc::new(RecordingSink::default());
    let events = EventBus::new(4096);
    let mut rx = events.subscribe();
    let director = start(TWO_STATIONS, sink.clone(), Arc::new(LengthLoader), events);

    tokio::time::sleep(Duration::from_secs(40)).await;
    drain(&mut rx);

    director.set_active_station("pop").await.unwrap();
    assert!(!director.is_audible("rock").unwrap());
    assert!(director.is_audible("pop").unwrap());
    assert_eq!(director.active_station().await, "pop");

    let fade_out = *sink.ramps_for("rock", Bus::Master).last().unwrap();
    assert_eq!(fade_out.target, 0.0);
    assert!((fade_out.duration - 0.2).abs() < 1e-9);
    let fade_in = *sink.ramps_for("pop", Bus::Master).last().unwrap();
    assert_eq!(fade_in.target, 1.0);
    assert!((fade_in.duration - 1.0).abs() < 1e-9);

    let events = drain(&mut rx);
    let changed = events
        .iter()
        .position(|e| matches!(
            e,
            OnAirEvent::ActiveStationChanged { old_station: Some(old), new_station, .. }
                if old == "rock" && new_station == "pop"
        ))
        .expect("ActiveStationChanged emitted");
    let announced = events[changed..]
        .iter()
        .find_map(|e| match e {
            OnAirEvent::NowPlaying { station_id, asset_id, cover_art, .. } if station_id == "pop" => {
                Some((asset_id.clone(), cover_art.clone()))
            }
            _ => None,
        })
        .expect("NowPlaying re-announced");
    let current = director
        .station_state("pop")
        .unwrap()
        .get_now_playing()
        .await
        .unwrap();
    assert_eq!(announced.0.as_deref(), Some(current.asset_id.as_str()));
    assert!(announced.1.starts_with("POP/capas/"));

    // from here on only the new station announces tracks
    tokio::time::sleep(Duration::from_secs(120)).await;
    let later: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            OnAirEvent::NowPlaying { station_id, .. } => Some(station_id),
            _ => None,
        })
        .collect();
    assert!(!later.is_empty());
    assert!(later.iter().all(|id| id == "pop"));
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_switch_before_first_track_uses_default_cover() {
    let sink = Arc::new(RecordingSink::default());
    let events = EventBus::new(256);
    let mut rx = events.subscribe();
    let stations = [("rock", "ROCK"), ("empty", "EMPTY")];
    let director = onair_engine::Director::start(
        &config(&stations),
        resources(&stations[..1]),
        Arc::new(LengthLoader),
        sink,
        Arc::new(onair_engine::clock::MonotonicClock::new()),
        events,
    )
    .unwrap();

    director.set_active_station("empty").await.unwrap();
    let cover = drain(&mut rx).into_iter().find_map(|e| match e {
        OnAirEvent::NowPlaying { station_id, asset_id, cover_art, .. } if station_id == "empty" => {
            Some((asset_id, cover_art))
        }
        _ => None,
    });
    assert_eq!(cover, Some((None, "EMPTY/capas/default.jpg".to_string())));
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_station_summaries_in_config_order() {
    let sink = Arc::new(RecordingSink::default());
    let director = start(TWO_STATIONS, sink, Arc::new(LengthLoader), EventBus::new(1024));
    tokio::time::sleep(Duration::from_secs(10)).await;

    let summaries = director.stations().await;
    let ids: Vec<_> = summaries.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["rock", "pop"]);
    assert!(summaries[0].audible);
    assert!(!summaries[1].audible);
    assert!(summaries.iter().all(|s| s.jobs_scheduled >= 1));
    director.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_template_token_fails_start() {
    let sink = Arc::new(RecordingSink::default());
    let mut cfg = config(TWO_STATIONS);
    cfg.stations[1].templates = Some(vec![("id+weather".to_string(), 3)]);

    let result = Director::start(
        &cfg,
        resources(TWO_STATIONS),
        Arc::new(LengthLoader),
        sink.clone(),
        Arc::new(MonotonicClock::new()),
        EventBus::new(64),
    );
    assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("pop") && msg.contains("weather")));
    // no station was brought up
    assert!(sink.ramps_for("rock", Bus::Master).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_configured_template_table_drives_station() {
    let sink = Arc::new(RecordingSink::default());
    let mut cfg = config(&[("rock", "ROCK")]);
    cfg.stations[0].templates = Some(vec![("id+music".to_string(), 1)]);

    let director = Director::start(
        &cfg,
        resources(&[("rock", "ROCK")]),
        Arc::new(LengthLoader),
        sink.clone(),
        Arc::new(MonotonicClock::new()),
        EventBus::new(1024),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_secs(70)).await;

    let plays = sink.plays_for("rock");
    assert!(plays.len() >= 4);
    for pair in plays.chunks(2).filter(|c| c.len() == 2) {
        assert!(pair[0].asset_id.contains("/ID_0"));
        assert!(pair[1].asset_id.contains("/musicas/"));
    }
    director.shutdown();
}
