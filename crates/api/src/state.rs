use std::sync::Arc;

use integron_core::events::buffer::EventBuffer;
use integron_core::events::bus::EventBus;
use integron_core::events::pipeline::IngestSender;
use integron_core::session::SessionState;
use integron_core::store::EventStore;

use crate::config::AppConfig;
use crate::gateway::BroadcastGateway;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor. Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: EventStore,
    buffer: Arc<EventBuffer>,
    bus: EventBus,
    gateway: BroadcastGateway,
    session: Arc<SessionState>,
    ingest: IngestSender,
    config: AppConfig,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: EventStore,
        buffer: Arc<EventBuffer>,
        bus: EventBus,
        gateway: BroadcastGateway,
        session: Arc<SessionState>,
        ingest: IngestSender,
        config: AppConfig,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState {
                store,
                buffer,
                bus,
                gateway,
                session,
                ingest,
                config,
            }),
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.inner.store
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.inner.buffer
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    pub fn gateway(&self) -> &BroadcastGateway {
        &self.inner.gateway
    }

    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    pub fn ingest(&self) -> &IngestSender {
        &self.inner.ingest
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }
}
