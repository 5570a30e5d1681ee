use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{instrument, warn};

use crate::database::firestore_auth::{ServiceAccount, ServiceAccountAuth};
use crate::database::firestore_value::{document_id, from_firestore_fields, to_firestore_fields};
use crate::error::{Error, Result};
use crate::models::opportunity::Opportunity;
use crate::services::opportunity_store::{OpportunityStore, SaveReceipt, COLLECTION};

const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_PAGE_SIZE: u32 = 300;

enum FirestoreAuth {
    ServiceAccount(ServiceAccountAuth),
    Emulator,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Opportunities stored in a Cloud Firestore collection through the REST API.
pub struct FirestoreOpportunityStore {
    client: Client,
    base_url: String,
    project_id: String,
    collection: String,
    page_size: u32,
    auth: FirestoreAuth,
}

impl FirestoreOpportunityStore {
    pub fn from_service_account(path: &Path, client: Client) -> Result<Self> {
        let account = ServiceAccount::load(path)?;
        let project_id = account.project_id.clone();
        Ok(Self {
            client: client.clone(),
            base_url: FIRESTORE_BASE_URL.to_string(),
            project_id,
            collection: COLLECTION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            auth: FirestoreAuth::ServiceAccount(ServiceAccountAuth::new(account, client)),
        })
    }

    /// Talks to a local Firestore emulator (`FIRESTORE_EMULATOR_HOST`), unauthenticated.
    pub fn emulator(host: &str, project_id: &str, client: Client) -> Self {
        let host = host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}/v1", host)
        } else {
            format!("http://{}/v1", host)
        };
        Self {
            client,
            base_url,
            project_id: project_id.to_string(),
            collection: COLLECTION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            auth: FirestoreAuth::Emulator,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url, self.project_id, self.collection
        )
    }

    async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.auth {
            FirestoreAuth::ServiceAccount(auth) => Ok(req.bearer_auth(auth.access_token().await?)),
            FirestoreAuth::Emulator => Ok(req.bearer_auth("owner")),
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<JsonValue> {
        let res = self
            .authorize(req)
            .await?
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| Error::Store(format!("Firestore unreachable: {}", e)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Store(format!("Firestore API Error {}: {}", status, text)));
        }
        res.json()
            .await
            .map_err(|e| Error::Store(format!("Unreadable Firestore response: {}", e)))
    }
}

#[async_trait]
impl OpportunityStore for FirestoreOpportunityStore {
    #[instrument(skip(self, opportunity), fields(title = %opportunity.title))]
    async fn save(&self, opportunity: &Opportunity) -> Result<SaveReceipt> {
        let plain = serde_json::to_value(opportunity.without_id())?;
        let map = plain
            .as_object()
            .ok_or_else(|| Error::Internal("Opportunity did not serialize to an object".into()))?;
        let body = json!({ "fields": to_firestore_fields(map) });

        let created = self
            .send(self.client.post(self.collection_url()).json(&body))
            .await?;
        let doc: Document = serde_json::from_value(created)
            .map_err(|e| Error::Store(format!("Unexpected Firestore create response: {}", e)))?;
        let id = document_id(&doc.name)
            .ok_or_else(|| Error::Store(format!("Unexpected document name {}", doc.name)))?;
        Ok(SaveReceipt::success(id))
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Opportunity>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", self.page_size.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }
            let raw = self
                .send(self.client.get(self.collection_url()).query(&query))
                .await?;
            let page: ListDocumentsResponse = serde_json::from_value(raw)
                .map_err(|e| Error::Store(format!("Unexpected Firestore list response: {}", e)))?;

            for doc in page.documents {
                let Some(id) = document_id(&doc.name).map(str::to_string) else {
                    continue;
                };
                let plain = match doc.fields.as_ref() {
                    Some(fields) => from_firestore_fields(fields),
                    None => Ok(json!({})),
                };
                match plain.and_then(|v| Ok(serde_json::from_value::<Opportunity>(v)?)) {
                    Ok(mut opp) => {
                        opp.id = Some(id);
                        out.push(opp);
                    }
                    Err(e) => warn!(%id, error = %e, "skipping undecodable opportunity document"),
                }
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(out)
    }

    fn backend_name(&self) -> &'static str {
        "firestore"
    }
}
