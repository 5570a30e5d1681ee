#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    routing::{get, head},
    Router,
};
use creative_opportunities::{
    error::{Error, Result},
    models::opportunity::{Opportunity, OpportunityList},
    services::{
        discovery_service::DiscoveryPipeline,
        fetch_service::{FetchService, LinkPolicy},
        link_validator::LinkChecker,
        opportunity_store::{
            DynOpportunityStore, MemoryOpportunityStore, OpportunityStore, SaveReceipt,
        },
    },
    AppState,
};
use serde_json::json;
use tokio::net::TcpListener;

pub fn opportunity(title: &str, link: &str) -> Opportunity {
    serde_json::from_value(json!({
        "title": title,
        "company": "Nigerian Creative Fund",
        "companyEmail": "apply@ncf.example",
        "event": "Open Call",
        "eventDescription": "Funding for emerging creatives",
        "description": "Submit a short proposal",
        "jobLocation": "Remote",
        "payment": { "currency": "USD", "total": 2500 },
        "deadline": "2099-06-30",
        "tags": ["Music", "Film"],
        "deliverables": ["Proposal", "Budget"],
        "link": link
    }))
    .expect("fixture opportunity")
}

/// Always returns the same list.
pub struct StaticPipeline(pub Vec<Opportunity>);

#[async_trait]
impl DiscoveryPipeline for StaticPipeline {
    async fn discover(&self) -> Result<OpportunityList> {
        Ok(OpportunityList {
            opportunities: self.0.clone(),
        })
    }
}

pub struct FailingPipeline;

#[async_trait]
impl DiscoveryPipeline for FailingPipeline {
    async fn discover(&self) -> Result<OpportunityList> {
        Err(Error::Pipeline("search API unreachable".into()))
    }
}

pub struct AllLinksValid;

#[async_trait]
impl LinkChecker for AllLinksValid {
    async fn is_valid_link(&self, _url: &str) -> bool {
        true
    }
}

/// Memory store whose N-th save (1-based) fails.
pub struct FlakyStore {
    inner: MemoryOpportunityStore,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: MemoryOpportunityStore::new(),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn save_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OpportunityStore for FlakyStore {
    async fn save(&self, opportunity: &Opportunity) -> Result<SaveReceipt> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(Error::Store("deadline exceeded".into()));
        }
        self.inner.save(opportunity).await
    }

    async fn list_all(&self) -> Result<Vec<Opportunity>> {
        self.inner.list_all().await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

/// Store that cannot be read.
pub struct UnreachableStore;

#[async_trait]
impl OpportunityStore for UnreachableStore {
    async fn save(&self, _opportunity: &Opportunity) -> Result<SaveReceipt> {
        Err(Error::Store("connection refused".into()))
    }

    async fn list_all(&self) -> Result<Vec<Opportunity>> {
        Err(Error::Store("connection refused".into()))
    }

    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
}

pub fn fetch_service(
    pipeline: Arc<dyn DiscoveryPipeline>,
    links: Arc<dyn LinkChecker>,
    store: DynOpportunityStore,
) -> FetchService {
    FetchService::new(
        pipeline,
        links,
        store,
        LinkPolicy::Flag,
        Duration::from_secs(5),
    )
}

pub fn app_state(pipeline: Arc<dyn DiscoveryPipeline>, store: DynOpportunityStore) -> AppState {
    let fetch = fetch_service(pipeline, Arc::new(AllLinksValid), store.clone());
    AppState::new(store, fetch)
}

/// Local site with one healthy page and one that never answers in time.
pub async fn spawn_link_site() -> String {
    let app = Router::new()
        .route("/live", head(|| async { StatusCode::OK }).get(|| async { "ok" }))
        .route(
            "/hanging",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}
