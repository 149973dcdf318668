//! WebSocket broadcast gateway for overlay clients.
//!
//! Every event published on the bus is fanned out to all open sockets.
//! Each client is served by its own task with its own bus receiver, so a
//! slow or dead client can never block publishing or its neighbors: a
//! lagging receiver simply misses events (no per-client backlog), and a
//! failed write evicts only that client.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use integron_core::events::bus::EventBus;
use integron_core::events::types::NormalizedEvent;
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// Outbound wire messages.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Outbound<'a> {
    #[serde(rename_all = "camelCase")]
    Connected {
        client_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Event {
        event: &'a NormalizedEvent,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct BroadcastGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    bus: EventBus,
    heartbeat: Duration,
    clients: Mutex<HashMap<Uuid, ClientInfo>>,
    shutdown: watch::Sender<bool>,
}

impl BroadcastGateway {
    pub fn new(bus: EventBus, heartbeat: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(GatewayInner {
                bus,
                heartbeat,
                clients: Mutex::new(HashMap::new()),
                shutdown,
            }),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.lock_clients().len()
    }

    pub fn clients(&self) -> Vec<ClientInfo> {
        self.lock_clients().values().cloned().collect()
    }

    /// Close every live client with a normal-closure frame and clear the
    /// live set. Safe to call concurrently with in-flight broadcasts; by
    /// the time this returns no socket or heartbeat timer is left running.
    pub async fn stop(&self) {
        let _ = self.inner.shutdown.send(true);

        // Client tasks flush their close frames and deregister themselves.
        for _ in 0..100 {
            if self.connection_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.lock_clients().clear();
        info!("broadcast gateway stopped");
    }

    /// Serve one upgraded socket until it closes, errors, falls off the
    /// heartbeat, or the gateway stops.
    pub async fn serve(&self, socket: WebSocket) {
        if *self.inner.shutdown.borrow() {
            return;
        }

        let client_id = Uuid::new_v4();
        let connected_at = Utc::now();
        self.lock_clients().insert(
            client_id,
            ClientInfo {
                id: client_id,
                connected_at,
            },
        );
        info!(%client_id, total = self.connection_count(), "overlay client connected");

        // Subscribe before the welcome goes out: anything published after
        // the client sees the welcome is guaranteed to reach it.
        let mut events = self.inner.bus.subscribe_events();
        let mut shutdown = self.inner.shutdown.subscribe();

        let mut heartbeat = tokio::time::interval(self.inner.heartbeat);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        heartbeat.tick().await; // swallow the immediate first tick

        let (mut sender, mut receiver) = socket.split();

        let welcome = Outbound::Connected {
            client_id,
            timestamp: connected_at,
        };
        let connected = match serde_json::to_string(&welcome) {
            Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
            Err(_) => false,
        };

        if connected {
            loop {
                tokio::select! {
                    event = events.recv() => match event {
                        Ok(event) => {
                            let outbound = Outbound::Event {
                                event: &event,
                                timestamp: Utc::now(),
                            };
                            let Ok(json) = serde_json::to_string(&outbound) else {
                                continue;
                            };
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                            debug!(%client_id, kind = %event.kind(), "event broadcast");
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            // Best effort, no backlog: the client just
                            // misses those events.
                            warn!(%client_id, missed, "slow overlay client skipped events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = heartbeat.tick() => {
                        if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                            break;
                        }
                    }
                    _ = shutdown.changed() => {
                        let frame = CloseFrame {
                            code: close_code::NORMAL,
                            reason: "server shutting down".into(),
                        };
                        let _ = sender.send(Message::Close(Some(frame))).await;
                        break;
                    }
                    incoming = receiver.next() => match incoming {
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        // Pongs and any chatter from overlays are ignored.
                        Some(Ok(_)) => {}
                    },
                }
            }
        }

        self.lock_clients().remove(&client_id);
        info!(%client_id, total = self.connection_count(), "overlay client disconnected");
    }

    fn lock_clients(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ClientInfo>> {
        self.inner
            .clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

/// `GET /ws` upgrade endpoint.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let gateway = state.gateway().clone();
    ws.on_upgrade(move |socket| async move { gateway.serve(socket).await })
}
