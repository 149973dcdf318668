use std::sync::Arc;

use integron_api::config::AppConfig;
use integron_api::gateway::BroadcastGateway;
use integron_api::{middleware, routes, state};
use integron_core::events::buffer::EventBuffer;
use integron_core::events::bus::EventBus;
use integron_core::events::pipeline::{ingest_channel, EventPipeline, ProfileLookup};
use integron_core::session::SessionState;
use integron_core::sources::helix::HelixProfileLookup;
use integron_core::store::{backup, EventStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    tracing::info!("Starting Integron activity hub");

    // Back up an existing database before touching it
    match backup::create_backup(&config.database_path, &config.backup_dir) {
        Ok(Some(path)) => tracing::info!(path = %path.display(), "database backed up"),
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "database backup failed"),
    }

    let store = EventStore::open(&config.database_path, config.db_max_connections)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {e}"))?;

    tracing::info!("Database ready");

    // Explicitly owned instances, handed around by handle. No globals.
    let bus = EventBus::new(config.event_bus_capacity);
    let buffer = Arc::new(EventBuffer::new(config.buffer_capacity));
    let session = Arc::new(SessionState::new());
    let gateway = BroadcastGateway::new(bus.clone(), config.heartbeat());

    let profiles: Option<Arc<dyn ProfileLookup>> =
        match (config.client_id.clone(), config.access_token.clone()) {
            (Some(client_id), Some(token)) => {
                Some(Arc::new(HelixProfileLookup::new(client_id, token)))
            }
            _ => {
                tracing::info!("no platform credentials configured, profile enrichment disabled");
                None
            }
        };

    // Both upstream transports feed this queue; the pipeline task drains it
    // in arrival order.
    let (ingest, ingest_rx) = ingest_channel(config.ingest_capacity);
    let pipeline = Arc::new(EventPipeline::new(
        store.clone(),
        buffer.clone(),
        bus.clone(),
        profiles,
    ));
    tokio::spawn(pipeline.run(ingest_rx));

    // Build application state
    let state = state::AppState::new(
        store,
        buffer,
        bus,
        gateway.clone(),
        session,
        ingest,
        config.clone(),
    );

    // Build router with middleware
    let app = routes::build_router(state)
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer());

    // Start server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    gateway.stop().await;
    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received Ctrl+C, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}
