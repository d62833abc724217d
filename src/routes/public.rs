use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Plain-text banner identifying the service.
        .route("/", get(handlers::root))
        // GET /health
        // Liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/login
        // Exchanges credentials for a signed access token.
        .route("/api/login", post(handlers::login))
}
