use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::buffer::EventBuffer;
use super::bus::EventBus;
use super::types::{EventPayload, EventUser, NormalizedEvent};
use crate::store::EventStore;

/// External profile lookup for users without a cached image. Failures are
/// never fatal to event processing.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    async fn profile_image_url(&self, user_id: &str) -> anyhow::Result<Option<String>>;
}

/// One raw-but-typed event handed over by a source adapter. The pipeline
/// assigns the id, timestamp and enrichment.
#[derive(Debug, Clone)]
pub struct IncomingEvent {
    pub user: EventUser,
    pub payload: EventPayload,
}

/// Cloneable ingestion handle given to the source adapters. Both upstream
/// transports feed the same bounded channel, which serializes their
/// callbacks into one processing order.
#[derive(Debug, Clone)]
pub struct IngestSender {
    tx: mpsc::Sender<IncomingEvent>,
}

impl IngestSender {
    pub async fn send(&self, event: IncomingEvent) {
        if self.tx.send(event).await.is_err() {
            warn!("ingest channel closed, dropping event");
        }
    }
}

/// The ingestion queue. The receiver goes to [`EventPipeline::run`].
pub fn ingest_channel(capacity: usize) -> (IngestSender, mpsc::Receiver<IncomingEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (IngestSender { tx }, rx)
}

/// Normalization and aggregation pipeline.
///
/// For every incoming event: upsert the user (enriching with a profile
/// image when none is cached), apply aggregate counters, persist non-chat
/// events, push onto the ring buffer, then publish on the bus. The order
/// matters: bus consumers only ever see events whose durable record
/// already exists. Persistence and enrichment failures are logged and the
/// event keeps flowing; the live feed wins over strict durability.
pub struct EventPipeline {
    store: EventStore,
    buffer: Arc<EventBuffer>,
    bus: EventBus,
    profiles: Option<Arc<dyn ProfileLookup>>,
    seq: AtomicI64,
}

impl EventPipeline {
    pub fn new(
        store: EventStore,
        buffer: Arc<EventBuffer>,
        bus: EventBus,
        profiles: Option<Arc<dyn ProfileLookup>>,
    ) -> Self {
        Self {
            store,
            buffer,
            bus,
            profiles,
            seq: AtomicI64::new(1),
        }
    }

    /// Consume the ingestion queue until every sender is gone. Events are
    /// processed strictly one at a time in arrival order.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<IncomingEvent>) {
        while let Some(incoming) = rx.recv().await {
            self.handle_event(incoming).await;
        }
        debug!("ingest channel drained, pipeline stopping");
    }

    /// Process one event to completion. Never fails from the caller's
    /// perspective; returns the fully-enriched event as published.
    pub async fn handle_event(&self, incoming: IncomingEvent) -> NormalizedEvent {
        let IncomingEvent { user, payload } = incoming;
        let kind = payload.kind();
        debug!(%kind, user = %user.display_name, "processing event");

        let id = self.seq.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();

        let profile_image_url = self.resolve_profile_image(&user.user_id).await;

        if let Err(err) = self
            .store
            .record_event(&user, &payload, profile_image_url.as_deref(), now)
            .await
        {
            warn!(%kind, user_id = %user.user_id, error = %err,
                "persistence failed, event continues to buffer and bus");
        }

        let event = NormalizedEvent {
            id,
            payload,
            user_id: user.user_id,
            username: user.username,
            display_name: user.display_name,
            profile_image_url,
            created_at: now,
        };

        self.buffer.push(event.clone());
        self.bus.emit_event(event.clone());
        event
    }

    /// Cached image if the user has one, otherwise a best-effort external
    /// lookup. Any failure leaves the event unenriched.
    async fn resolve_profile_image(&self, user_id: &str) -> Option<String> {
        match self.store.profile_image(user_id).await {
            Ok(Some(url)) => return Some(url),
            Ok(None) => {}
            Err(err) => {
                warn!(user_id, error = %err, "profile image read failed");
                return None;
            }
        }

        let lookup = self.profiles.as_ref()?;
        match lookup.profile_image_url(user_id).await {
            Ok(url) => url,
            Err(err) => {
                warn!(user_id, error = %err, "profile lookup failed, continuing without image");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::testing::{sample_payload, sample_user};
    use crate::events::types::{BitsData, EventType};

    struct FixedLookup(Option<String>);

    #[async_trait]
    impl ProfileLookup for FixedLookup {
        async fn profile_image_url(&self, _user_id: &str) -> anyhow::Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingLookup;

    #[async_trait]
    impl ProfileLookup for FailingLookup {
        async fn profile_image_url(&self, _user_id: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("upstream api unreachable")
        }
    }

    async fn pipeline_with(lookup: Option<Arc<dyn ProfileLookup>>) -> (Arc<EventPipeline>, Arc<EventBuffer>, EventBus, EventStore) {
        let store = EventStore::in_memory().await.unwrap();
        let buffer = Arc::new(EventBuffer::new(1000));
        let bus = EventBus::new(64);
        let pipeline = Arc::new(EventPipeline::new(
            store.clone(),
            buffer.clone(),
            bus.clone(),
            lookup,
        ));
        (pipeline, buffer, bus, store)
    }

    fn bits_event(amount: i64) -> IncomingEvent {
        IncomingEvent {
            user: sample_user(),
            payload: EventPayload::Bits(BitsData {
                amount,
                message: None,
            }),
        }
    }

    #[tokio::test]
    async fn bits_scenario_aggregates_buffers_and_persists() {
        let (pipeline, buffer, _bus, store) = pipeline_with(None).await;

        for amount in [100, 50, 25] {
            pipeline.handle_event(bits_event(amount)).await;
        }

        let user = store.get_user("test-user-123").await.unwrap().unwrap();
        assert_eq!(user.bits_total, 175);

        let recent = buffer.recent(3);
        let amounts: Vec<i64> = recent
            .iter()
            .map(|e| match &e.payload {
                EventPayload::Bits(d) => d.amount,
                other => panic!("unexpected payload {other:?}"),
            })
            .collect();
        assert_eq!(amounts, vec![100, 50, 25]);

        let (records, total) = store.query_events(1, 10, &[]).await.unwrap();
        assert_eq!(total, 3);
        assert!(records.iter().all(|r| r.event_type == EventType::Bits));
    }

    #[tokio::test]
    async fn ids_are_monotonic_across_events() {
        let (pipeline, _buffer, _bus, _store) = pipeline_with(None).await;

        let a = pipeline.handle_event(bits_event(1)).await;
        let b = pipeline
            .handle_event(IncomingEvent {
                user: sample_user(),
                payload: sample_payload(EventType::Chat),
            })
            .await;

        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn chat_reaches_buffer_and_bus_but_not_the_log() {
        let (pipeline, buffer, bus, store) = pipeline_with(None).await;
        let mut rx = bus.subscribe_events();

        pipeline
            .handle_event(IncomingEvent {
                user: sample_user(),
                payload: sample_payload(EventType::Chat),
            })
            .await;

        assert_eq!(buffer.len(), 1);
        assert_eq!(rx.recv().await.unwrap().kind(), EventType::Chat);

        let (_, total) = store.query_events(1, 10, &[]).await.unwrap();
        assert_eq!(total, 0);

        let user = store.get_user("test-user-123").await.unwrap().unwrap();
        assert_eq!(user.message_count, 1);
    }

    #[tokio::test]
    async fn profile_lookup_enriches_event_and_aggregate() {
        let lookup: Arc<dyn ProfileLookup> =
            Arc::new(FixedLookup(Some("https://cdn/img.png".into())));
        let (pipeline, _buffer, _bus, store) = pipeline_with(Some(lookup)).await;

        let event = pipeline.handle_event(bits_event(10)).await;
        assert_eq!(event.profile_image_url.as_deref(), Some("https://cdn/img.png"));

        let user = store.get_user("test-user-123").await.unwrap().unwrap();
        assert_eq!(user.profile_image_url.as_deref(), Some("https://cdn/img.png"));
    }

    #[tokio::test]
    async fn failed_profile_lookup_is_not_fatal() {
        let lookup: Arc<dyn ProfileLookup> = Arc::new(FailingLookup);
        let (pipeline, buffer, _bus, store) = pipeline_with(Some(lookup)).await;

        let event = pipeline.handle_event(bits_event(10)).await;
        assert_eq!(event.profile_image_url, None);
        assert_eq!(buffer.len(), 1);

        let user = store.get_user("test-user-123").await.unwrap().unwrap();
        assert_eq!(user.bits_total, 10);
    }

    #[tokio::test]
    async fn cached_image_skips_the_external_lookup() {
        let lookup: Arc<dyn ProfileLookup> =
            Arc::new(FixedLookup(Some("https://cdn/other.png".into())));
        let (pipeline, _buffer, _bus, store) = pipeline_with(Some(lookup)).await;

        let user = sample_user();
        store
            .upsert_user(&user, Some("https://cdn/cached.png"), Utc::now())
            .await
            .unwrap();

        let event = pipeline.handle_event(bits_event(1)).await;
        assert_eq!(
            event.profile_image_url.as_deref(),
            Some("https://cdn/cached.png")
        );
    }

    #[tokio::test]
    async fn run_consumes_the_ingest_queue_in_order() {
        let (pipeline, buffer, _bus, _store) = pipeline_with(None).await;
        let (ingest, rx) = ingest_channel(16);

        let worker = tokio::spawn(pipeline.clone().run(rx));

        for amount in [1, 2, 3] {
            ingest.send(bits_event(amount)).await;
        }
        drop(ingest);
        worker.await.unwrap();

        let amounts: Vec<i64> = buffer
            .all()
            .iter()
            .map(|e| match &e.payload {
                EventPayload::Bits(d) => d.amount,
                other => panic!("unexpected payload {other:?}"),
            })
            .collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }
}
