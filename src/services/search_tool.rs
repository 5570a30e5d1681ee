use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

const SERPER_BASE_URL: &str = "https://google.serper.dev";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, num: u32) -> Result<Vec<SearchHit>>;
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchHit>,
}

/// Google search through the Serper API.
#[derive(Clone)]
pub struct SerperSearch {
    client: Client,
    api_key: String,
    base_url: String,
}

impl SerperSearch {
    pub fn new(api_key: String, client: Client) -> Self {
        Self {
            client,
            api_key,
            base_url: SERPER_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl WebSearch for SerperSearch {
    async fn search(&self, query: &str, num: u32) -> Result<Vec<SearchHit>> {
        let res = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query, "num": num }))
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Pipeline(format!(
                "Serper API Error {}: {}",
                status, text
            )));
        }

        let body: SerperResponse = res.json().await?;
        Ok(body
            .organic
            .into_iter()
            .filter(|h| !h.link.trim().is_empty())
            .collect())
    }
}
