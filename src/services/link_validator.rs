use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use tracing::debug;
use url::Url;

/// Existence check for an application link.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkChecker: Send + Sync {
    /// `true` iff the link answers with a status below 400. Never fails.
    async fn is_valid_link(&self, url: &str) -> bool;
}

#[derive(Clone)]
pub struct LinkValidator {
    client: Client,
    timeout: Duration,
}

impl LinkValidator {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("creative-opportunities/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirect(redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, timeout }
    }
}

#[async_trait]
impl LinkChecker for LinkValidator {
    async fn is_valid_link(&self, url: &str) -> bool {
        let parsed = match Url::parse(url.trim()) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            _ => {
                debug!(url, "link rejected: not an http(s) url");
                return false;
            }
        };

        match self
            .client
            .head(parsed)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status();
                debug!(url, status = status.as_u16(), "link checked");
                status.as_u16() < 400
            }
            Err(e) => {
                debug!(url, error = %e, "link check failed");
                false
            }
        }
    }
}
