//! Adapter seam between the upstream transport clients and the pipeline.
//!
//! The real protocol clients live outside the core; they drive a
//! [`SourceAdapter`] through `on_event`/`on_connect`/`on_disconnect`/
//! `on_error`, and tests drive fakes through the same surface.

pub mod chat;
pub mod eventsub;
pub mod helix;

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::events::bus::{EventBus, TransportKind};
use crate::events::pipeline::{IncomingEvent, IngestSender};
use crate::events::types::{EventPayload, EventType, EventUser};
use crate::session::SessionState;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The transport delivered a type the system does not route.
    #[error("unroutable event type `{0}`")]
    Unroutable(String),
    /// Known type, but the data payload does not match its shape.
    #[error("malformed `{kind}` payload: {source}")]
    MalformedPayload {
        kind: EventType,
        #[source]
        source: serde_json::Error,
    },
}

/// Transport-agnostic raw event as delivered off the wire: a string type
/// tag, the sender's identity, and an opaque data object.
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub event_type: String,
    pub user_id: String,
    pub username: String,
    pub display_name: String,
    pub data: Value,
}

/// Map a raw event into the pipeline's typed shape. Rejects unknown types
/// and mismatched payloads before they reach the pipeline.
pub fn map_raw(raw: RawEvent) -> Result<IncomingEvent, SourceError> {
    let kind: EventType = raw
        .event_type
        .parse()
        .map_err(|_| SourceError::Unroutable(raw.event_type.clone()))?;

    let tagged = serde_json::json!({ "type": kind, "data": raw.data });
    let payload: EventPayload = serde_json::from_value(tagged)
        .map_err(|source| SourceError::MalformedPayload { kind, source })?;

    Ok(IncomingEvent {
        user: EventUser {
            user_id: raw.user_id,
            username: raw.username,
            display_name: raw.display_name,
        },
        payload,
    })
}

/// One adapter per upstream transport. Forwards mapped events into the
/// ingestion queue and mirrors connection transitions onto the bus and the
/// session state.
pub struct SourceAdapter {
    kind: TransportKind,
    ingest: IngestSender,
    bus: EventBus,
    session: Arc<SessionState>,
}

impl SourceAdapter {
    pub fn new(
        kind: TransportKind,
        ingest: IngestSender,
        bus: EventBus,
        session: Arc<SessionState>,
    ) -> Self {
        Self {
            kind,
            ingest,
            bus,
            session,
        }
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Raw path: map and enqueue, or drop with a log line. A bad event from
    /// the transport never disturbs its neighbors.
    pub async fn on_event(&self, raw: RawEvent) {
        match map_raw(raw) {
            Ok(event) => self.ingest.send(event).await,
            Err(err) => {
                warn!(transport = %self.kind, error = %err, "dropping event");
            }
        }
    }

    /// Typed path used by the per-transport mapping helpers.
    pub async fn submit(&self, event: IncomingEvent) {
        self.ingest.send(event).await;
    }

    pub fn on_connect(&self, channel: &str) {
        info!(transport = %self.kind, channel, "transport connected");
        self.session.transport_connected(self.kind, channel);
        self.bus.emit_connected(self.kind, channel);
    }

    pub fn on_disconnect(&self, reason: Option<String>) {
        info!(
            transport = %self.kind,
            reason = reason.as_deref().unwrap_or("unknown"),
            "transport disconnected"
        );
        self.session.transport_disconnected(self.kind);
        self.bus.emit_disconnected(self.kind, reason);
    }

    pub fn on_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(transport = %self.kind, error = %message, "transport error");
        self.bus.emit_error(self.kind, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::pipeline::ingest_channel;

    fn raw(event_type: &str, data: Value) -> RawEvent {
        RawEvent {
            event_type: event_type.into(),
            user_id: "42".into(),
            username: "viewer".into(),
            display_name: "Viewer".into(),
            data,
        }
    }

    #[test]
    fn maps_known_types() {
        let event = map_raw(raw(
            "bits",
            serde_json::json!({"amount": 250, "message": null}),
        ))
        .unwrap();

        assert_eq!(event.payload.kind(), EventType::Bits);
        assert_eq!(event.user.user_id, "42");
    }

    #[test]
    fn rejects_unroutable_types() {
        let err = map_raw(raw("host", Value::Object(Default::default()))).unwrap_err();
        assert!(matches!(err, SourceError::Unroutable(t) if t == "host"));
    }

    #[test]
    fn rejects_payloads_that_do_not_match_their_type() {
        let err = map_raw(raw("bits", serde_json::json!({"viewers": 3}))).unwrap_err();
        assert!(matches!(
            err,
            SourceError::MalformedPayload {
                kind: EventType::Bits,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn adapter_forwards_good_events_and_drops_bad_ones() {
        let (ingest, mut rx) = ingest_channel(8);
        let adapter = SourceAdapter::new(
            TransportKind::Chat,
            ingest,
            EventBus::new(8),
            Arc::new(SessionState::new()),
        );

        adapter
            .on_event(raw("follow", serde_json::json!({"followedAt": "2026-08-08T00:00:00Z"})))
            .await;
        adapter
            .on_event(raw("host", Value::Object(Default::default())))
            .await;

        let forwarded = rx.recv().await.unwrap();
        assert_eq!(forwarded.payload.kind(), EventType::Follow);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn connection_transitions_reach_bus_and_session() {
        let (ingest, _rx) = ingest_channel(8);
        let bus = EventBus::new(8);
        let session = Arc::new(SessionState::new());
        let adapter = SourceAdapter::new(
            TransportKind::EventSub,
            ingest,
            bus.clone(),
            session.clone(),
        );

        let mut connected = bus.subscribe_connected();
        let mut disconnected = bus.subscribe_disconnected();

        adapter.on_connect("somechannel");
        assert!(session.status().push_connected);
        assert_eq!(connected.recv().await.unwrap().channel, "somechannel");

        adapter.on_disconnect(Some("socket closed".into()));
        assert!(!session.status().push_connected);
        assert_eq!(
            disconnected.recv().await.unwrap().reason.as_deref(),
            Some("socket closed")
        );
    }
}
