pub mod docs;
pub mod health;
pub mod opportunities;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{cors::permissive_cors, rate_limit};
use crate::AppState;

pub fn router(state: AppState, trigger_rps: u32) -> Router {
    let trigger = Router::new()
        .route("/create", post(opportunities::create_opportunities))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::RateLimiter::new(trigger_rps),
            rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/", get(health::index))
        .route("/health", get(health::health))
        .route("/opportunities", get(opportunities::list_opportunities))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .merge(trigger)
        .with_state(state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
}
