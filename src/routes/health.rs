use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::dto::opportunity_dto::{ApiResponse, WelcomeMessage};
use crate::AppState;

pub const WELCOME: &str = "Welcome to Creative Opportunities API";

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service greeting", body = WelcomeMessage)
    )
)]
#[axum::debug_handler]
pub async fn index() -> impl IntoResponse {
    Json(ApiResponse::new(WelcomeMessage {
        message: WELCOME.to_string(),
    }))
}

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "store": state.store.backend_name(),
    });
    (StatusCode::OK, Json(body))
}
