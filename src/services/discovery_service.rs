use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::opportunity::{Opportunity, OpportunityList};
use crate::services::ai_service::LanguageModel;
use crate::services::prompts;
use crate::services::scrape_tool::{PageExcerpt, PageScrape};
use crate::services::search_tool::{SearchHit, WebSearch};
use crate::utils::{time, validation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSchema {
    Deadline,
    StartEnd,
}

/// Tunable parameters of one discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryProfile {
    pub name: String,
    pub audience: String,
    pub queries: Vec<String>,
    pub results_per_query: u32,
    pub search_target: usize,
    pub filter_target: usize,
    pub final_target: usize,
    pub scrape_limit: usize,
    pub min_payment: i64,
    pub payment_currency: String,
    pub deadline_window_days: i64,
    pub date_schema: DateSchema,
    /// Survivors sent to the format stage per model call, keeping each
    /// reply within the model's output budget.
    #[serde(default = "default_format_batch_size")]
    pub format_batch_size: usize,
}

fn default_format_batch_size() -> usize {
    10
}

const DEFAULT_QUERIES: [&str; 10] = [
    "Music funding opportunities today",
    "Startup funding and grants opportunities",
    "Music grants for Nigerians",
    "funding for Arts development in Nigeria",
    "Music industry jobs Nigeria",
    "Festivals and Fellowships in Nigeria",
    "Music production jobs Africa",
    "Writing opportunities in Africa",
    "Content creator jobs remote",
    "Film production jobs Africa",
];

impl DiscoveryProfile {
    pub fn builtin(name: &str) -> Option<Self> {
        let standard = Self {
            name: "standard".to_string(),
            audience: "creatives in Nigeria".to_string(),
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            results_per_query: 10,
            search_target: 30,
            filter_target: 20,
            final_target: 10,
            scrape_limit: 20,
            min_payment: 1000,
            payment_currency: "USD".to_string(),
            deadline_window_days: 90,
            date_schema: DateSchema::Deadline,
            format_batch_size: default_format_batch_size(),
        };

        match name.to_ascii_lowercase().as_str() {
            "standard" => Some(standard),
            "quick" => Some(Self {
                name: "quick".to_string(),
                queries: standard.queries.iter().take(3).cloned().collect(),
                results_per_query: 5,
                search_target: 10,
                filter_target: 5,
                final_target: 3,
                scrape_limit: 5,
                ..standard
            }),
            "extended" => Some(Self {
                name: "extended".to_string(),
                results_per_query: 20,
                search_target: 100,
                filter_target: 60,
                final_target: 50,
                scrape_limit: 40,
                min_payment: 500,
                date_schema: DateSchema::StartEnd,
                ..standard
            }),
            _ => None,
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read discovery profile {}: {}", path.display(), e))
        })?;
        let profile: Self = serde_json::from_str(&raw).map_err(|e| {
            Error::Config(format!("Invalid discovery profile {}: {}", path.display(), e))
        })?;
        if profile.queries.is_empty() || profile.final_target == 0 {
            return Err(Error::Config(format!(
                "Discovery profile {} needs at least one query and a positive final_target",
                path.display()
            )));
        }
        Ok(profile)
    }
}

/// Produces candidate opportunities for one fetch cycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryPipeline: Send + Sync {
    async fn discover(&self) -> Result<OpportunityList>;
}

/// Search → filter → format plan driven by a language model and two web tools.
pub struct AgentDiscoveryPipeline {
    profile: DiscoveryProfile,
    search: Arc<dyn WebSearch>,
    scraper: Arc<dyn PageScrape>,
    llm: Arc<dyn LanguageModel>,
}

impl AgentDiscoveryPipeline {
    pub fn new(
        profile: DiscoveryProfile,
        search: Arc<dyn WebSearch>,
        scraper: Arc<dyn PageScrape>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            profile,
            search,
            scraper,
            llm,
        }
    }

    async fn search_stage(&self) -> Result<Vec<SearchHit>> {
        let mut hits = Vec::new();
        let mut seen = HashSet::new();
        let mut failures = 0usize;

        for query in &self.profile.queries {
            match self.search.search(query, self.profile.results_per_query).await {
                Ok(found) => {
                    for hit in found {
                        if seen.insert(hit.link.clone()) {
                            hits.push(hit);
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    warn!(query = %query, error = %e, "search query failed");
                }
            }
            if hits.len() >= self.profile.search_target {
                break;
            }
        }

        if failures > 0 && failures == self.profile.queries.len() {
            return Err(Error::Pipeline("Every search query failed".to_string()));
        }
        hits.truncate(self.profile.search_target);
        Ok(hits)
    }

    async fn scrape_pages(&self, hits: &[SearchHit]) -> HashMap<String, Result<PageExcerpt>> {
        let mut set = JoinSet::new();
        for hit in hits.iter().take(self.profile.scrape_limit) {
            let scraper = self.scraper.clone();
            let link = hit.link.clone();
            set.spawn(async move {
                let res = scraper.scrape(&link).await;
                (link, res)
            });
        }

        let mut pages = HashMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((link, res)) => {
                    pages.insert(link, res);
                }
                Err(e) => warn!(error = %e, "scrape task aborted"),
            }
        }
        pages
    }

    async fn filter_stage(&self, hits: Vec<SearchHit>, today: NaiveDate) -> Result<Vec<JsonValue>> {
        let pages = self.scrape_pages(&hits).await;

        let candidates: Vec<JsonValue> = hits
            .iter()
            .map(|hit| {
                let mut entry = json!({
                    "title": hit.title,
                    "link": hit.link,
                    "snippet": hit.snippet,
                    "date": hit.date,
                });
                match pages.get(&hit.link) {
                    Some(Ok(page)) => {
                        entry["page_status"] = json!(page.status);
                        entry["page_title"] = json!(page.title);
                        entry["page_excerpt"] = json!(page.text);
                    }
                    Some(Err(e)) => entry["page_error"] = json!(e.to_string()),
                    None => {}
                }
                entry
            })
            .collect();

        let prompt = prompts::filter_prompt(
            &self.profile,
            today,
            &serde_json::to_string_pretty(&candidates)?,
        );
        let reply = self
            .llm
            .complete_json(&prompts::agent_system_prompt(&self.profile), &prompt)
            .await?;

        let kept: Vec<String> = reply
            .get("links")
            .and_then(|v| v.as_array())
            .ok_or_else(|| Error::Pipeline("Filter stage reply lacks 'links'".to_string()))?
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| s.starts_with("http"))
            .collect();

        let by_link: HashMap<&str, &JsonValue> = candidates
            .iter()
            .filter_map(|c| c.get("link").and_then(|l| l.as_str()).map(|l| (l, c)))
            .collect();

        let mut seen = HashSet::new();
        Ok(kept
            .into_iter()
            .filter(|link| seen.insert(link.clone()))
            .map(|link| {
                by_link
                    .get(link.as_str())
                    .map(|c| (*c).clone())
                    .unwrap_or_else(|| json!({ "link": link }))
            })
            .take(self.profile.filter_target)
            .collect())
    }

    /// Formats the survivors in batches and merges the replies into one
    /// `{"opportunities": [...]}` document.
    async fn format_stage(&self, survivors: &[JsonValue], today: NaiveDate) -> Result<JsonValue> {
        let system = prompts::agent_system_prompt(&self.profile);
        let mut merged = Vec::new();

        for batch in survivors.chunks(self.profile.format_batch_size.max(1)) {
            let prompt = prompts::format_prompt(
                &self.profile,
                today,
                batch.len(),
                &serde_json::to_string_pretty(batch)?,
            );
            let reply = self.llm.complete_json(&system, &prompt).await?;
            match reply.get("opportunities") {
                Some(JsonValue::Array(items)) => merged.extend(items.iter().cloned()),
                _ => {
                    return Err(Error::Pipeline(
                        "Discovery result lacks 'opportunities'".to_string(),
                    ))
                }
            }
        }

        Ok(json!({ "opportunities": merged }))
    }
}

#[async_trait]
impl DiscoveryPipeline for AgentDiscoveryPipeline {
    #[instrument(skip(self), fields(profile = %self.profile.name))]
    async fn discover(&self) -> Result<OpportunityList> {
        let today = time::today();

        let hits = self.search_stage().await?;
        info!(hits = hits.len(), "search stage finished");
        if hits.is_empty() {
            return Ok(OpportunityList::default());
        }

        let survivors = self.filter_stage(hits, today).await?;
        info!(survivors = survivors.len(), "filter stage finished");
        if survivors.is_empty() {
            return Ok(OpportunityList::default());
        }

        let raw = self.format_stage(&survivors, today).await?;
        let (list, rejected) = post_process(&self.profile, raw, today)?;
        info!(
            opportunities = list.len(),
            rejected, "format stage finished"
        );
        Ok(list)
    }
}

/// Decodes the format-stage reply and applies the deterministic guards:
/// schema invariants, closing date not past, minimum payment in the profile
/// currency, and the final count. Returns the list and how many entries were
/// dropped.
pub fn post_process(
    profile: &DiscoveryProfile,
    raw: JsonValue,
    today: NaiveDate,
) -> Result<(OpportunityList, usize)> {
    let entries = match raw {
        JsonValue::Object(mut map) => match map.remove("opportunities") {
            Some(JsonValue::Array(items)) => items,
            Some(_) => {
                return Err(Error::Pipeline(
                    "'opportunities' is not a list".to_string(),
                ))
            }
            None => {
                return Err(Error::Pipeline(
                    "Discovery result lacks 'opportunities'".to_string(),
                ))
            }
        },
        _ => {
            return Err(Error::Pipeline(
                "Discovery result is not a JSON object".to_string(),
            ))
        }
    };

    let mut rejected = 0usize;
    let mut opportunities = Vec::with_capacity(entries.len());
    for entry in entries {
        let opp: Opportunity = match validation::decode_validated(entry) {
            Ok(o) => o,
            Err(e) => {
                rejected += 1;
                warn!(error = %e, "dropping malformed opportunity");
                continue;
            }
        };

        let expired = opp
            .closing_date()
            .and_then(time::parse_listing_date)
            .is_some_and(|d| d < today);
        if expired {
            rejected += 1;
            warn!(title = %opp.title, "dropping opportunity past its deadline");
            continue;
        }

        let underpaid = opp
            .payment
            .currency
            .eq_ignore_ascii_case(&profile.payment_currency)
            && opp.payment.total < profile.min_payment;
        if underpaid {
            rejected += 1;
            warn!(title = %opp.title, total = opp.payment.total, "dropping underpaid opportunity");
            continue;
        }

        opportunities.push(opp);
    }

    if opportunities.len() > profile.final_target {
        rejected += opportunities.len() - profile.final_target;
        opportunities.truncate(profile.final_target);
    }

    Ok((OpportunityList { opportunities }, rejected))
}
