use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;
use crate::models::opportunity::Opportunity;

pub const COLLECTION: &str = "opportunities";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveReceipt {
    pub id: String,
    pub status: String,
}

impl SaveReceipt {
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: "success".to_string(),
        }
    }
}

/// Append-only document collection of opportunities.
///
/// Every `save` is an independent write; callers must tolerate partial
/// success across a batch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    /// Writes one record as a new document; the backend assigns the id.
    async fn save(&self, opportunity: &Opportunity) -> Result<SaveReceipt>;

    /// Every stored record, each carrying its assigned id.
    async fn list_all(&self) -> Result<Vec<Opportunity>>;

    fn backend_name(&self) -> &'static str;
}

pub type DynOpportunityStore = Arc<dyn OpportunityStore>;

#[derive(Clone, Default)]
pub struct MemoryOpportunityStore {
    documents: Arc<RwLock<Vec<Opportunity>>>,
}

impl MemoryOpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl OpportunityStore for MemoryOpportunityStore {
    async fn save(&self, opportunity: &Opportunity) -> Result<SaveReceipt> {
        let id = Uuid::new_v4().to_string();
        let mut doc = opportunity.without_id();
        doc.id = Some(id.clone());
        self.documents.write().await.push(doc);
        Ok(SaveReceipt::success(id))
    }

    async fn list_all(&self) -> Result<Vec<Opportunity>> {
        Ok(self.documents.read().await.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
