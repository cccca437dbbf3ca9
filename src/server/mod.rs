pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// HTTP surface over the engine. CORS is open: the UI is served elsewhere.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/premiums", post(routes::post_premiums))
        .route("/api/profit-zones", post(routes::post_profit_zones))
        .route("/api/profit-loss", post(routes::post_profit_loss))
        .route("/api/profit-zone/check", post(routes::post_profit_zone_check))
        .route(
            "/api/cache",
            get(routes::get_cache_stats).delete(routes::delete_cache),
        )
        .route("/api/reference", get(routes::get_reference))
        .route("/api/counters", get(routes::get_counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
