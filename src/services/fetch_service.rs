use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::dto::opportunity_dto::FetchOutcome;
use crate::error::{Error, Result};
use crate::services::discovery_service::DiscoveryPipeline;
use crate::services::link_validator::LinkChecker;
use crate::services::opportunity_store::DynOpportunityStore;

/// What to do with a record whose link does not verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPolicy {
    /// Persist it with `linkVerified: false`.
    #[default]
    Flag,
    /// Leave it out and count it as skipped.
    Drop,
}

/// One fetch cycle: discover, verify links, persist.
#[derive(Clone)]
pub struct FetchService {
    pipeline: Arc<dyn DiscoveryPipeline>,
    links: Arc<dyn LinkChecker>,
    store: DynOpportunityStore,
    policy: LinkPolicy,
    discovery_timeout: Duration,
}

impl FetchService {
    pub fn new(
        pipeline: Arc<dyn DiscoveryPipeline>,
        links: Arc<dyn LinkChecker>,
        store: DynOpportunityStore,
        policy: LinkPolicy,
        discovery_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            links,
            store,
            policy,
            discovery_timeout,
        }
    }

    /// Runs discovery and writes every surviving record. Individual write
    /// failures are logged and counted; only a failed discovery fails the cycle.
    #[instrument(skip(self), fields(backend = self.store.backend_name()))]
    pub async fn fetch_and_persist(&self) -> Result<FetchOutcome> {
        let list = match tokio::time::timeout(self.discovery_timeout, self.pipeline.discover()).await
        {
            Ok(Ok(list)) => list,
            Ok(Err(e @ Error::Pipeline(_))) => return Err(e),
            Ok(Err(e)) => return Err(Error::Pipeline(e.to_string())),
            Err(_) => {
                return Err(Error::Pipeline(format!(
                    "Discovery did not finish within {}s",
                    self.discovery_timeout.as_secs()
                )))
            }
        };

        if list.is_empty() {
            info!("discovery returned no opportunities");
            return Ok(FetchOutcome::nothing_new());
        }

        let mut outcome = FetchOutcome {
            candidates: list.len(),
            ..Default::default()
        };

        for mut opportunity in list.opportunities {
            let verified = self.links.is_valid_link(&opportunity.link).await;
            if !verified {
                match self.policy {
                    LinkPolicy::Drop => {
                        warn!(link = %opportunity.link, "skipping opportunity with dead link");
                        outcome.skipped_count += 1;
                        continue;
                    }
                    LinkPolicy::Flag => {
                        warn!(link = %opportunity.link, "link did not verify, saving flagged");
                    }
                }
            }
            opportunity.link_verified = Some(verified);

            match self.store.save(&opportunity.without_id()).await {
                Ok(receipt) => {
                    info!(id = %receipt.id, title = %opportunity.title, "opportunity saved");
                    outcome.saved_count += 1;
                    outcome.ids.push(receipt.id);
                }
                Err(e) => {
                    error!(title = %opportunity.title, error = %e, "failed to save opportunity");
                    outcome.failed_count += 1;
                }
            }
        }

        outcome.message = format!(
            "Saved {} of {} opportunities",
            outcome.saved_count, outcome.candidates
        );
        info!(
            saved = outcome.saved_count,
            failed = outcome.failed_count,
            skipped = outcome.skipped_count,
            "fetch cycle finished"
        );
        Ok(outcome)
    }
}
