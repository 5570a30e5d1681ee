use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Payment {
    #[validate(length(min = 1))]
    pub currency: String,
    #[validate(range(min = 0))]
    pub total: i64,
}

/// One discovered creative-economy listing.
///
/// Depending on the discovery profile the record carries either `deadline`
/// or the `startDate`/`endDate` pair; absent date fields are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[serde(default)]
    pub company_email: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub event_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub job_location: String,
    #[validate(nested)]
    pub payment: Payment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[validate(length(min = 1))]
    pub tags: Vec<String>,
    #[validate(length(min = 1))]
    pub deliverables: Vec<String>,
    #[validate(url)]
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_verified: Option<bool>,
}

impl Opportunity {
    /// Last day the opportunity accepts applications, whichever schema it uses.
    pub fn closing_date(&self) -> Option<&str> {
        self.deadline
            .as_deref()
            .or(self.end_date.as_deref())
            .filter(|d| !d.trim().is_empty())
    }

    /// Copy of the record as it is written to a store: no id, link flag kept.
    pub fn without_id(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OpportunityList {
    pub opportunities: Vec<Opportunity>,
}

impl OpportunityList {
    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn sample(title: &str, link: &str) -> Opportunity {
    Opportunity {
        id: None,
        title: title.to_string(),
        company: "Lagos Arts Council".to_string(),
        company_email: "grants@lagosarts.example".to_string(),
        event: "Open Call 2026".to_string(),
        event_description: "Annual open call for visual artists".to_string(),
        description: "Submit a portfolio and project proposal".to_string(),
        job_location: "Remote".to_string(),
        payment: Payment {
            currency: "USD".to_string(),
            total: 5000,
        },
        deadline: Some("2099-12-31".to_string()),
        start_date: None,
        end_date: None,
        tags: vec!["Visual Arts".to_string()],
        deliverables: vec!["Portfolio of 10 works".to_string()],
        link: link.to_string(),
        link_verified: None,
    }
}
