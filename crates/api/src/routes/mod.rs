pub mod events;
pub mod health;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::gateway;
use crate::state::AppState;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(events::routes())
        .merge(users::routes())
        .route("/ws", get(gateway::ws_handler))
        .with_state(state)
}
