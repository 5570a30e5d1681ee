use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::models::opportunity::Opportunity;
use crate::services::opportunity_store::{OpportunityStore, SaveReceipt};

/// Opportunities kept as JSONB documents in PostgreSQL.
#[derive(Clone)]
pub struct PgOpportunityStore {
    pool: PgPool,
}

impl PgOpportunityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OpportunityStore for PgOpportunityStore {
    async fn save(&self, opportunity: &Opportunity) -> Result<SaveReceipt> {
        let document = serde_json::to_value(opportunity.without_id())?;
        let row = sqlx::query(
            r#"
            INSERT INTO opportunities (document)
            VALUES ($1)
            RETURNING id
            "#,
        )
        .bind(document)
        .fetch_one(&self.pool)
        .await?;
        let id: Uuid = row.try_get("id")?;
        Ok(SaveReceipt::success(id.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Opportunity>> {
        let rows = sqlx::query(r#"SELECT id, document FROM opportunities ORDER BY created_at ASC"#)
            .fetch_all(&self.pool)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: Uuid = row.try_get("id")?;
            let document: JsonValue = row.try_get("document")?;
            match serde_json::from_value::<Opportunity>(document) {
                Ok(mut opp) => {
                    opp.id = Some(id.to_string());
                    out.push(opp);
                }
                Err(e) => warn!(%id, error = %e, "skipping undecodable opportunity document"),
            }
        }
        Ok(out)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
