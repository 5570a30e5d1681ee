//! Prompt text for the discovery agent. Numbers and dates come from the
//! active profile so every variant shares one set of instructions.

use chrono::NaiveDate;

use crate::services::discovery_service::{DateSchema, DiscoveryProfile};

pub fn agent_system_prompt(profile: &DiscoveryProfile) -> String {
    format!(
        r#"You are "Global Opportunity Agent", an expert creative opportunity researcher.
You specialize in finding opportunities for {audience}: fellowships, company and startup funding,
music and art funding, grants, competitions, partnerships, exhibitions, festivals and open calls
across music, writing, architecture, content creation, fashion, film, visual arts and photography.
You only trust credible, active listings published by the organisers themselves. You never
invent details: when a field is not stated on the source, leave it as an empty string.
Always answer with a single JSON object and nothing else."#,
        audience = profile.audience
    )
}

pub fn filter_prompt(profile: &DiscoveryProfile, today: NaiveDate, candidates_json: &str) -> String {
    format!(
        r#"Today is {today}. Below are candidate opportunities found with the web search tool.
Each entry may carry a page_excerpt scraped from its link with the HTTP page_status it answered, or a page_error when the page could not be loaded.

Keep a candidate only if ALL of the following hold:
- the application link loads (no page_error, no 404 page) and belongs to the organisation offering the opportunity;
- the deadline has not passed and falls within {window} days from today;
- it is not a blog aggregator, news article or listicle;
- the payment, grant or prize is at least {min} {currency} or its equivalent in local currency;
- it is currently open and paid.

Return at most {target} candidates as:
{{"links": ["<application link>", ...]}}

Candidates:
{candidates_json}"#,
        window = profile.deadline_window_days,
        min = profile.min_payment,
        currency = profile.payment_currency,
        target = profile.filter_target,
    )
}

pub fn format_prompt(
    profile: &DiscoveryProfile,
    today: NaiveDate,
    limit: usize,
    survivors_json: &str,
) -> String {
    let dates = match profile.date_schema {
        DateSchema::Deadline => {
            r#""deadline": "YYYY-MM-DD, last day to apply","#
        }
        DateSchema::StartEnd => {
            r#""startDate": "YYYY-MM-DD, when the opportunity opens or starts",
      "endDate": "YYYY-MM-DD, when applications close","#
        }
    };

    format!(
        r#"Today is {today}. For each verified opportunity below collect the basic info (title, company),
the details (event description, what the creative must do, deliverables), the requirements
(location, dates), the payment (amount and currency) and the direct application link.

Return at most {target} opportunities in exactly this JSON structure:
{{
  "opportunities": [
    {{
      "title": "title of the opportunity",
      "company": "organisation or company name",
      "companyEmail": "official contact email, empty if none is published",
      "event": "name of the event on the site",
      "eventDescription": "detailed description of the opportunity from the site",
      "description": "summary of what the creative is expected to do or submit",
      "jobLocation": "Remote, Onsite (<city>) or Hybrid",
      "payment": {{ "currency": "ISO currency code", "total": <whole number> }},
      {dates}
      "tags": ["relevant tags such as Writers, Fashion, Filmmakers"],
      "deliverables": ["each expected submission or participation item"],
      "link": "direct link to apply"
    }}
  ]
}}

Verified opportunities:
{survivors_json}"#,
        target = limit.min(profile.final_target),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_carry_profile_parameters() {
        let mut profile = DiscoveryProfile::builtin("standard").unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

        let filter = filter_prompt(&profile, today, "[]");
        assert!(filter.contains("Today is 2026-10-18"));
        assert!(filter.contains("at least 1000 USD"));
        assert!(filter.contains("within 90 days"));

        let format = format_prompt(&profile, today, 4, "[]");
        assert!(format.contains("Return at most 4 opportunities"));
        assert!(format.contains("\"deadline\""));
        assert!(!format.contains("\"startDate\""));

        profile.date_schema = DateSchema::StartEnd;
        let format = format_prompt(&profile, today, 4, "[]");
        assert!(format.contains("\"startDate\""));
        assert!(format.contains("\"endDate\""));
    }
}
