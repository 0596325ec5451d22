use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::fetcher::CachedClient;
use crate::sources::serp::market_bucket;
use crate::sources::{extract_domain, parse_year, round2, title_case};
use crate::traits::DataSource;
use crate::types::{
    CompanyIdentity, Field, FounderRecord, PartialPayload, Result, SourceId,
};

const SEARCH_URL: &str = "https://api.crunchbase.com/api/v4/searches/organizations";

const TOP_TIER_INVESTORS: &[&str] = &["sequoia", "a16z", "benchmark", "accel", "yc"];

/// Funding-registry adapter: organization profile, funding history, founder
/// stubs, and category-driven market estimates.
pub struct CrunchbaseSource {
    client: Arc<CachedClient>,
    api_key: String,
}

impl CrunchbaseSource {
    pub fn new(client: Arc<CachedClient>, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl DataSource for CrunchbaseSource {
    fn source_id(&self) -> SourceId {
        SourceId::Crunchbase
    }

    async fn fetch(&self, identity: &CompanyIdentity) -> Result<PartialPayload> {
        let body = json!({
            "field_ids": [
                "name",
                "short_description",
                "description",
                "website_url",
                "founded_on",
                "location_identifiers",
                "rank_org",
                "categories",
                "last_funding_type",
                "last_funding_on",
                "valuation_at_last_funding",
                "num_funding_rounds",
                "num_employees_enum",
                "stock_exchange",
            ],
            "limit": 1,
            "query": [
                {"field_id": "name", "operator": "eq", "value": identity.name},
            ],
        });
        let headers = [
            ("X-cb-user-key", self.api_key.clone()),
            ("Content-Type", "application/json".to_string()),
        ];
        let data = self.client.post_json(SEARCH_URL, &body, &headers).await?;

        let mut payload = PartialPayload::default();
        let Some(entity) = data["entities"].get(0) else {
            debug!(company = %identity.name, "no registry entity found");
            return Ok(payload);
        };
        let props = &entity["properties"];
        let relationships = &entity["relationships"];

        let company = &mut payload.company;
        company.name = Field::Known(
            props["name"]
                .as_str()
                .unwrap_or(&identity.name)
                .to_string(),
        );
        company.description = props["short_description"]
            .as_str()
            .or_else(|| props["description"].as_str())
            .map(str::to_string)
            .into();
        if let Some(website) = props["website_url"].as_str() {
            company.domain = extract_domain(website).into();
        }
        if let Some(founded) = props["founded_on"].as_str() {
            company.founded_year = parse_year(founded).into();
        }
        if let Some(team_size) = props["num_employees_enum"].as_str() {
            company.team_size = Field::Known(team_size.to_string());
        }

        let categories = category_names(&props["categories"]);
        if !categories.is_empty() {
            company.market_size = Field::Known(market_bucket(&categories));
            payload.market.size_usd = Field::Known(market_size_estimate(&categories));
            payload.market.cagr = Field::Known(market_cagr(&categories));
            company.categories = Field::Known(categories);
        }

        let funding = &mut payload.funding;
        funding.stage = props["last_funding_type"]
            .as_str()
            .map(title_case)
            .into();
        if props["valuation_at_last_funding"]["value_usd"].is_number() {
            funding.valuation_trend = Field::Known("Increased".to_string());
        }
        funding.round_count = props["num_funding_rounds"].as_u64().map(|n| n as u32).into();
        funding.last_funding_on = props["last_funding_on"].as_str().map(str::to_string).into();

        let empty = Vec::new();
        let investors = relationships["investors"].as_array().unwrap_or(&empty);
        funding.investor_quality = investor_quality(investors).into();
        if !investors.is_empty() {
            payload.competition.investor_diversity = Field::Known(investor_diversity(investors));
        }
        if let Some(competitors) = relationships["competitors"].as_array() {
            payload.competition.competitor_count = Field::Known(competitors.len() as u32);
        }

        payload.founders = relationships["founders"]
            .as_array()
            .unwrap_or(&empty)
            .iter()
            .filter_map(map_founder_stub)
            .collect();

        debug!(
            company = %identity.name,
            founders = payload.founders.len(),
            "mapped registry profile"
        );
        Ok(payload)
    }
}

fn category_names(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .or_else(|| item["value"].as_str().map(str::to_string))
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Rough addressable-market estimate keyed off the category labels.
fn market_size_estimate(categories: &[String]) -> f64 {
    let normalized: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();
    let matches_any = |names: &[&str]| normalized.iter().any(|c| names.contains(&c.as_str()));

    if matches_any(&["artificial intelligence", "machine learning", "ai"]) {
        80_000_000_000.0
    } else if matches_any(&["fraud detection", "security", "compliance"]) {
        25_000_000_000.0
    } else if matches_any(&["productivity", "collaboration"]) {
        15_000_000_000.0
    } else {
        10_000_000_000.0
    }
}

fn market_cagr(categories: &[String]) -> f64 {
    let normalized: Vec<String> = categories.iter().map(|c| c.to_lowercase()).collect();
    let matches_any = |names: &[&str]| normalized.iter().any(|c| names.contains(&c.as_str()));

    if matches_any(&["artificial intelligence", "machine learning", "ai"]) {
        0.27
    } else if matches_any(&["fraud detection", "security", "compliance"]) {
        0.22
    } else {
        0.15
    }
}

fn investor_quality(investors: &[Value]) -> Option<String> {
    if investors.is_empty() {
        return None;
    }
    let top_tier = investors.iter().any(|investor| {
        let name = investor["name"].as_str().unwrap_or_default().to_lowercase();
        TOP_TIER_INVESTORS.iter().any(|keyword| name.contains(keyword))
    });
    if top_tier {
        Some("Top-tier".to_string())
    } else if investors.len() >= 3 {
        Some("Recognized".to_string())
    } else {
        None
    }
}

/// Fraction of distinct investor geographies, capped at five.
fn investor_diversity(investors: &[Value]) -> f64 {
    let mut geos: Vec<&str> = investors
        .iter()
        .filter_map(|investor| {
            investor["properties"]["location"].as_str().or_else(|| {
                investor["location_identifiers"][0]["value"].as_str()
            })
        })
        .collect();
    geos.sort_unstable();
    geos.dedup();
    round2((geos.len() as f64 / 5.0).min(1.0))
}

/// Registry founder entries carry little background detail; everything the
/// registry cannot answer stays `Unknown` for other sources to fill.
fn map_founder_stub(item: &Value) -> Option<FounderRecord> {
    let props = &item["properties"];
    let name = props["identifier"]["value"]
        .as_str()
        .or_else(|| props["name"].as_str())?
        .to_string();

    let linkedin_url = props["linkedin_url"]
        .as_str()
        .map(str::to_string)
        .or_else(|| {
            props["permalink"].as_str().map(|permalink| {
                let slug = permalink.rsplit('/').next().unwrap_or(permalink);
                format!("https://www.linkedin.com/in/{slug}")
            })
        });

    let title = props["title"].as_str().map(str::to_string);
    Some(FounderRecord {
        name: Field::Known(name),
        leadership_experience: Field::Known(title.is_some()),
        title: title.into(),
        linkedin_url: linkedin_url.into(),
        ..FounderRecord::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn founder_stub_keeps_background_unknown() {
        let stub = map_founder_stub(&json!({
            "properties": {
                "identifier": {"value": "Jane Doe"},
                "title": "CEO",
                "permalink": "people/jane-doe",
            }
        }))
        .unwrap();
        assert_eq!(stub.name, Field::Known("Jane Doe".to_string()));
        assert_eq!(stub.leadership_experience, Field::Known(true));
        assert_eq!(stub.education_level, Field::Unknown);
        assert_eq!(stub.previous_exits, Field::Unknown);
    }

    #[test]
    fn investor_quality_detects_top_tier_names() {
        let investors = vec![json!({"name": "Sequoia Capital"})];
        assert_eq!(investor_quality(&investors), Some("Top-tier".to_string()));
        let unknown = vec![json!({"name": "Tiny Fund"})];
        assert_eq!(investor_quality(&unknown), None);
    }
}
