use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};

const TEXT_SELECTORS: &str = "h1, h2, h3, h4, p, li, td, dt, dd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExcerpt {
    pub status: u16,
    pub title: Option<String>,
    pub text: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageScrape: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<PageExcerpt>;
}

/// Fetches a page and reduces it to readable text for the filter stage.
#[derive(Clone)]
pub struct PageScraper {
    client: Client,
    timeout: Duration,
    max_chars: usize,
}

impl PageScraper {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Self::DEFAULT_TIMEOUT,
            max_chars: 2_000,
        }
    }
}

#[async_trait]
impl PageScrape for PageScraper {
    async fn scrape(&self, url: &str) -> Result<PageExcerpt> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        if status >= 400 {
            return Err(Error::Pipeline(format!("{} answered {}", url, status)));
        }
        let html = response.text().await?;
        let (title, text) = extract_text(&html, self.max_chars);
        debug!(url, status, chars = text.len(), "page scraped");
        Ok(PageExcerpt {
            status,
            title,
            text,
        })
    }
}

/// Page title plus the visible text of headings, paragraphs and list items,
/// whitespace-collapsed and cut at `max_chars`.
pub fn extract_text(html: &str, max_chars: usize) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|el| collapse_ws(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    });

    let mut text = String::new();
    if let Ok(sel) = Selector::parse(TEXT_SELECTORS) {
        for el in document.select(&sel) {
            let chunk = collapse_ws(&el.text().collect::<Vec<_>>().join(" "));
            if chunk.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&chunk);
            if text.chars().count() >= max_chars {
                break;
            }
        }
    }

    if text.chars().count() > max_chars {
        text = text.chars().take(max_chars).collect();
    }
    (title, text)
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
