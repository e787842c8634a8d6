//! Event types for the on-air event system
//!
//! Provides the shared [`OnAirEvent`] enum and the broadcast [`EventBus`]
//! that carries it to the HTTP/SSE layer and any other listener.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// On-air event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OnAirEvent {
    /// A music track started on the audible station
    ///
    /// Also re-emitted for the newly selected station on a station switch,
    /// so listeners can restore its cover art.
    NowPlaying {
        station_id: String,
        /// Asset identifier of the track (None when only the fallback cover is known)
        asset_id: Option<String>,
        /// Track name
        name: Option<String>,
        /// Cover art reference to display
        cover_art: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The audible station changed
    ActiveStationChanged {
        old_station: Option<String>,
        new_station: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A station placed a sequence job on its timeline
    JobScheduled {
        station_id: String,
        job_id: Uuid,
        template: String,
        item_count: usize,
        /// Projected timeline end (engine clock, seconds)
        timeline_end: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A station iteration failed and the station entered backoff
    StationBackoff {
        station_id: String,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl OnAirEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            OnAirEvent::NowPlaying { .. } => "NowPlaying",
            OnAirEvent::ActiveStationChanged { .. } => "ActiveStationChanged",
            OnAirEvent::JobScheduled { .. } => "JobScheduled",
            OnAirEvent::StationBackoff { .. } => "StationBackoff",
        }
    }
}

/// Broadcast bus for [`OnAirEvent`]s
///
/// Events emitted with no subscribers are dropped.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OnAirEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per slow receiver
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<OnAirEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: OnAirEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
