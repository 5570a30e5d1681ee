use axum::{extract::State, response::IntoResponse, Json};
use tracing::info;

use crate::{
    dto::opportunity_dto::{ApiResponse, FetchOutcome},
    error::Result,
    models::opportunity::Opportunity,
    AppState,
};

#[utoipa::path(
    get,
    path = "/opportunities",
    responses(
        (status = 200, description = "Every stored opportunity", body = [Opportunity]),
        (status = 503, description = "Store unavailable")
    )
)]
#[axum::debug_handler]
pub async fn list_opportunities(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let opportunities = state.store.list_all().await?;
    info!(count = opportunities.len(), "listing opportunities");
    Ok(Json(ApiResponse::new(opportunities)))
}

#[utoipa::path(
    post,
    path = "/create",
    responses(
        (status = 200, description = "Fetch cycle finished", body = FetchOutcome),
        (status = 429, description = "Trigger rate limit exceeded"),
        (status = 502, description = "Discovery failed")
    )
)]
#[axum::debug_handler]
pub async fn create_opportunities(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let outcome = state.fetch.fetch_and_persist().await?;
    Ok(Json(ApiResponse::new(outcome)))
}
