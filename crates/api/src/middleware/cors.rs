use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// CORS for browser overlays served from other local origins. The surface
/// is read-only apart from the test-fire endpoint, so only GET and POST
/// are allowed.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}
