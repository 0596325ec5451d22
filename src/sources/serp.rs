use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetcher::CachedClient;
use crate::sources::{extract_domain, parse_year, round2};
use crate::traits::DataSource;
use crate::types::{CompanyIdentity, Field, PartialPayload, Result, SourceId};

const SEARCH_URL: &str = "https://serpapi.com/search.json";

/// General web-search adapter: company overview from the knowledge graph
/// plus a second query estimating hiring activity from job postings.
pub struct SerpSource {
    client: Arc<CachedClient>,
    api_key: String,
}

impl SerpSource {
    pub fn new(client: Arc<CachedClient>, api_key: String) -> Self {
        Self { client, api_key }
    }

    fn map_overview(&self, identity: &CompanyIdentity, data: &Value, payload: &mut PartialPayload) {
        let company = &mut payload.company;
        company.name = Field::Known(identity.name.clone());

        let knowledge = &data["knowledge_graph"];
        if knowledge.is_object() {
            let description = knowledge["description"]
                .as_str()
                .or_else(|| knowledge["title"].as_str());
            company.description = description.map(str::to_string).into();
            if let Some(website) = knowledge["website"].as_str() {
                company.domain = extract_domain(website).into();
            }
            if let Some(founded) = knowledge["founding_date"].as_str() {
                company.founded_year = parse_year(founded).into();
            }
            if let Some(headquarters) = knowledge["headquarters_location"].as_str() {
                company.headquarters = Field::Known(headquarters.to_string());
            }
            if let Some(categories) = knowledge["categories"].as_array() {
                let names: Vec<String> = categories
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                if !names.is_empty() {
                    company.market_size = Field::Known(market_bucket(&names));
                    company.categories = Field::Known(names);
                }
            }
        }

        if let Some(top) = data["organic_results"].get(0) {
            if company.description.is_unknown() {
                company.description = top["snippet"].as_str().map(str::to_string).into();
            }
            if company.domain.is_unknown() {
                if let Some(link) = top["link"].as_str() {
                    company.domain = extract_domain(link).into();
                }
            }
        }

        if company.domain.is_unknown() {
            company.domain = identity.domain.clone().into();
        }
    }

    fn map_job_postings(&self, data: &Value, payload: &mut PartialPayload) {
        let total_results = data["search_information"]["total_results"]
            .as_u64()
            .or_else(|| {
                data["search_information"]["total_results"]
                    .as_str()
                    .and_then(|raw| raw.replace(',', "").parse().ok())
            });

        let empty = Vec::new();
        let organic = data["organic_results"].as_array().unwrap_or(&empty);
        let job_hits: Vec<&Value> = organic
            .iter()
            .filter(|item| hit_text(item).contains("job"))
            .collect();

        payload.hiring.job_postings = total_results.into();
        if job_hits.is_empty() {
            return;
        }

        let net_new_roles = (job_hits.len() as u32 * 3).min(40);
        let senior_mentions = job_hits
            .iter()
            .filter(|item| {
                let text = hit_text(item);
                ["senior", "lead", "principal"]
                    .iter()
                    .any(|word| text.contains(word))
            })
            .count();
        payload.hiring.net_new_roles_last_quarter = Field::Known(net_new_roles);
        payload.hiring.senior_ratio =
            Field::Known(round2(senior_mentions as f64 / job_hits.len() as f64));
    }
}

#[async_trait]
impl DataSource for SerpSource {
    fn source_id(&self) -> SourceId {
        SourceId::Serp
    }

    async fn fetch(&self, identity: &CompanyIdentity) -> Result<PartialPayload> {
        let mut payload = PartialPayload::default();

        let overview_params = [
            ("engine", "google".to_string()),
            ("q", identity.name.clone()),
            ("num", "5".to_string()),
            ("api_key", self.api_key.clone()),
        ];
        let overview = self
            .client
            .get_json(SEARCH_URL, &overview_params, &[])
            .await?;
        self.map_overview(identity, &overview, &mut payload);
        debug!(company = %identity.name, "mapped search overview");

        // Hiring signals are best-effort; a failed second query only leaves
        // the hiring section unset.
        let jobs_params = [
            ("engine", "google".to_string()),
            ("q", format!("\"{}\" jobs", identity.name)),
            ("num", "10".to_string()),
            ("api_key", self.api_key.clone()),
        ];
        match self.client.get_json(SEARCH_URL, &jobs_params, &[]).await {
            Ok(jobs) => self.map_job_postings(&jobs, &mut payload),
            Err(err) => warn!(company = %identity.name, error = %err, "job-posting query failed"),
        }

        Ok(payload)
    }
}

fn hit_text(item: &Value) -> String {
    format!(
        "{}{}",
        item["title"].as_str().unwrap_or_default(),
        item["snippet"].as_str().unwrap_or_default()
    )
    .to_lowercase()
}

/// Coarse market-size bucket from category labels.
pub(crate) fn market_bucket(categories: &[String]) -> String {
    let normalized: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();
    let matches_any = |names: &[&str]| normalized.iter().any(|c| names.contains(&c.as_str()));

    if matches_any(&["artificial intelligence", "machine learning", "ai"]) {
        "Large".to_string()
    } else if matches_any(&["fintech", "financial services"]) {
        "Large".to_string()
    } else if matches_any(&["security", "privacy", "compliance"]) {
        "Medium".to_string()
    } else {
        "Small".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_bucket_prefers_ai_categories() {
        let bucket = market_bucket(&["Artificial Intelligence".to_string()]);
        assert_eq!(bucket, "Large");
        assert_eq!(market_bucket(&["Security".to_string()]), "Medium");
        assert_eq!(market_bucket(&["Gardening".to_string()]), "Small");
    }
}
