pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

use crate::config::{Config, StoreConfig};
use crate::database::pool::{create_pool, run_migrations};
use crate::error::Result;
use crate::services::{
    ai_service::AIService,
    discovery_service::AgentDiscoveryPipeline,
    fetch_service::FetchService,
    firestore_opportunity_store::FirestoreOpportunityStore,
    link_validator::LinkValidator,
    opportunity_store::{DynOpportunityStore, MemoryOpportunityStore},
    pg_opportunity_store::PgOpportunityStore,
    scrape_tool::PageScraper,
    search_tool::SerperSearch,
};

const DEFAULT_EMULATOR_PROJECT: &str = "creative-opportunities";

#[derive(Clone)]
pub struct AppState {
    pub store: DynOpportunityStore,
    pub fetch: FetchService,
}

impl AppState {
    pub fn new(store: DynOpportunityStore, fetch: FetchService) -> Self {
        Self { store, fetch }
    }

    /// Wires the configured store, the discovery tools and the fetch service.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        let store = build_store(&config.store, http_client.clone()).await?;

        let llm = AIService::new(
            config.anthropic_api_key.clone(),
            config.llm_model.clone(),
            config.llm_temperature,
            http_client.clone(),
        )
        .with_max_tokens(config.llm_max_tokens);
        info!(model = llm.model(), profile = %config.profile.name, "discovery pipeline configured");
        let pipeline = AgentDiscoveryPipeline::new(
            config.profile.clone(),
            Arc::new(SerperSearch::new(
                config.serper_api_key.clone(),
                http_client.clone(),
            )),
            Arc::new(PageScraper::new(http_client)),
            Arc::new(llm),
        );

        let fetch = FetchService::new(
            Arc::new(pipeline),
            Arc::new(LinkValidator::new(config.link_check_timeout)),
            store.clone(),
            config.link_policy,
            config.discovery_timeout,
        );

        Ok(Self::new(store, fetch))
    }
}

pub async fn build_store(store: &StoreConfig, client: Client) -> Result<DynOpportunityStore> {
    let built: DynOpportunityStore = match store {
        StoreConfig::Firestore {
            emulator_host: Some(host),
            project_id,
            ..
        } => {
            let project = project_id.as_deref().unwrap_or(DEFAULT_EMULATOR_PROJECT);
            info!(host = %host, project, "using Firestore emulator");
            Arc::new(FirestoreOpportunityStore::emulator(host, project, client))
        }
        StoreConfig::Firestore {
            service_account_path,
            ..
        } => Arc::new(FirestoreOpportunityStore::from_service_account(
            service_account_path,
            client,
        )?),
        StoreConfig::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            run_migrations(&pool).await?;
            Arc::new(PgOpportunityStore::new(pool))
        }
        StoreConfig::Memory => Arc::new(MemoryOpportunityStore::new()),
    };
    info!(backend = built.backend_name(), "opportunity store ready");
    Ok(built)
}
