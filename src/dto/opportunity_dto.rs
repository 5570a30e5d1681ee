use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Success envelope shared by every endpoint: `{"data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WelcomeMessage {
    pub message: String,
}

/// Summary of one fetch cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    /// Records returned by the discovery pipeline.
    pub candidates: usize,
    pub saved_count: usize,
    /// Writes rejected by the store.
    pub failed_count: usize,
    /// Records dropped because their link did not verify.
    pub skipped_count: usize,
    pub ids: Vec<String>,
    pub message: String,
}

impl FetchOutcome {
    pub fn nothing_new() -> Self {
        Self {
            message: "No new opportunities found".to_string(),
            ..Default::default()
        }
    }
}
