use axum::Json;
use utoipa::OpenApi;

use crate::dto::opportunity_dto::{FetchOutcome, WelcomeMessage};
use crate::models::opportunity::{Opportunity, Payment};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::index,
        crate::routes::opportunities::list_opportunities,
        crate::routes::opportunities::create_opportunities,
    ),
    components(schemas(Opportunity, Payment, FetchOutcome, WelcomeMessage)),
    tags((name = "opportunities", description = "Creative opportunity discovery"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
