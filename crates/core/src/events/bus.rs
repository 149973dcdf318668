use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::NormalizedEvent;

/// Past this many receivers on one channel a subscription is logged as
/// suspicious. Design-time capacity, not a performance limit.
const SUBSCRIBER_WARN_THRESHOLD: usize = 20;

/// Which upstream transport a connection signal or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Chat,
    #[serde(rename = "eventsub")]
    EventSub,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Chat => f.write_str("chat"),
            TransportKind::EventSub => f.write_str("eventsub"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedSignal {
    pub transport: TransportKind,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectedSignal {
    pub transport: TransportKind,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportErrorSignal {
    pub transport: TransportKind,
    pub message: String,
}

/// In-process publish/subscribe hub backed by `tokio::broadcast`.
///
/// Four channels: normalized events, transport connects, transport
/// disconnects, transport errors. Delivery is FIFO per channel; receivers
/// are independent, so one misbehaving subscriber cannot affect the others.
/// Constructed once at startup and passed around by handle.
#[derive(Debug, Clone)]
pub struct EventBus {
    events: broadcast::Sender<NormalizedEvent>,
    connected: broadcast::Sender<ConnectedSignal>,
    disconnected: broadcast::Sender<DisconnectedSignal>,
    errors: broadcast::Sender<TransportErrorSignal>,
}

impl EventBus {
    /// Create a new event bus with the given per-channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let (connected, _) = broadcast::channel(capacity);
        let (disconnected, _) = broadcast::channel(capacity);
        let (errors, _) = broadcast::channel(capacity);
        Self {
            events,
            connected,
            disconnected,
            errors,
        }
    }

    /// Publish a normalized event to all current subscribers.
    /// A bus with no subscribers is not an error.
    pub fn emit_event(&self, event: NormalizedEvent) {
        let _ = self.events.send(event);
    }

    pub fn emit_connected(&self, transport: TransportKind, channel: impl Into<String>) {
        let _ = self.connected.send(ConnectedSignal {
            transport,
            channel: channel.into(),
        });
    }

    pub fn emit_disconnected(&self, transport: TransportKind, reason: Option<String>) {
        let _ = self.disconnected.send(DisconnectedSignal { transport, reason });
    }

    pub fn emit_error(&self, transport: TransportKind, message: impl Into<String>) {
        let _ = self.errors.send(TransportErrorSignal {
            transport,
            message: message.into(),
        });
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<NormalizedEvent> {
        Self::check_fanout("event", self.events.receiver_count());
        self.events.subscribe()
    }

    pub fn subscribe_connected(&self) -> broadcast::Receiver<ConnectedSignal> {
        Self::check_fanout("connected", self.connected.receiver_count());
        self.connected.subscribe()
    }

    pub fn subscribe_disconnected(&self) -> broadcast::Receiver<DisconnectedSignal> {
        Self::check_fanout("disconnected", self.disconnected.receiver_count());
        self.disconnected.subscribe()
    }

    pub fn subscribe_errors(&self) -> broadcast::Receiver<TransportErrorSignal> {
        Self::check_fanout("error", self.errors.receiver_count());
        self.errors.subscribe()
    }

    /// Number of active subscribers on the event channel.
    pub fn event_subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn check_fanout(channel: &str, current: usize) {
        if current >= SUBSCRIBER_WARN_THRESHOLD {
            tracing::warn!(channel, subscribers = current + 1, "unusually high bus fan-out");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::test_event;
    use crate::events::types::EventType;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe_events();

        bus.emit_event(test_event(1, EventType::Follow));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), EventType::Follow);
        assert_eq!(event.id, 1);
    }

    #[tokio::test]
    async fn multiple_subscribers_each_get_every_event() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe_events();
        let mut rx2 = bus.subscribe_events();

        assert_eq!(bus.event_subscriber_count(), 2);

        bus.emit_event(test_event(1, EventType::Bits));

        assert_eq!(rx1.recv().await.unwrap().id, 1);
        assert_eq!(rx2.recv().await.unwrap().id, 1);
    }

    #[tokio::test]
    async fn per_channel_fifo_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe_events();

        for id in 1..=5 {
            bus.emit_event(test_event(id, EventType::Chat));
        }
        for id in 1..=5 {
            assert_eq!(rx.recv().await.unwrap().id, id);
        }
    }

    #[tokio::test]
    async fn connection_signals_carry_transport_tags() {
        let bus = EventBus::new(16);
        let mut connected = bus.subscribe_connected();
        let mut disconnected = bus.subscribe_disconnected();
        let mut errors = bus.subscribe_errors();

        bus.emit_connected(TransportKind::Chat, "somechannel");
        bus.emit_disconnected(TransportKind::EventSub, Some("ws closed".into()));
        bus.emit_error(TransportKind::Chat, "login failed");

        let c = connected.recv().await.unwrap();
        assert_eq!(c.transport, TransportKind::Chat);
        assert_eq!(c.channel, "somechannel");

        let d = disconnected.recv().await.unwrap();
        assert_eq!(d.transport, TransportKind::EventSub);
        assert_eq!(d.reason.as_deref(), Some("ws closed"));

        let e = errors.recv().await.unwrap();
        assert_eq!(e.message, "login failed");
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let bus = EventBus::new(16);
        bus.emit_event(test_event(1, EventType::Raid));
        bus.emit_disconnected(TransportKind::Chat, None);
    }
}
