use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::fetcher::CachedClient;
use crate::sources::round2;
use crate::traits::DataSource;
use crate::types::{CompanyIdentity, Field, FounderRecord, PartialPayload, Result, SourceId};

const EMPLOYEE_SEARCH_URL: &str =
    "https://nubela.co/proxycurl/api/linkedin/company/employees/search/";
const PROFILE_URL: &str = "https://nubela.co/proxycurl/api/v2/linkedin";

const TIER_1_SCHOOLS: &[&str] = &[
    "stanford",
    "mit",
    "harvard",
    "oxford",
    "cambridge",
    "berkeley",
    "princeton",
];
const TIER_2_SCHOOLS: &[&str] = &[
    "waterloo",
    "imperial",
    "cornell",
    "columbia",
    "ucla",
    "tsinghua",
];
const TOP_COMPANIES: &[&str] = &[
    "google",
    "meta",
    "microsoft",
    "amazon",
    "apple",
    "openai",
    "mckinsey",
];
const LEADERSHIP_TITLES: &[&str] = &["ceo", "cto", "founder", "head"];
const ALIGNED_ROLES: &[&str] = &["ai", "ml", "product", "research", "engineering"];

/// Professional-profile adapter: finds founders through the company domain
/// and enriches each with education and career background.
pub struct ProfileLookupSource {
    client: Arc<CachedClient>,
    api_key: String,
}

impl ProfileLookupSource {
    pub fn new(client: Arc<CachedClient>, api_key: String) -> Self {
        Self { client, api_key }
    }

    fn auth_headers(&self) -> [(&'static str, String); 1] {
        [("Authorization", format!("Bearer {}", self.api_key))]
    }

    async fn founder_profile_urls(&self, domain: &str) -> Result<Vec<String>> {
        let params = [
            ("employment_role", "founder".to_string()),
            ("company_domain", domain.to_string()),
            ("page_size", "5".to_string()),
        ];
        let search = self
            .client
            .get_json(EMPLOYEE_SEARCH_URL, &params, &self.auth_headers())
            .await?;
        let urls = search["employees"]
            .as_array()
            .map(|employees| {
                employees
                    .iter()
                    .filter_map(|employee| employee["profile_url"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(urls)
    }
}

#[async_trait]
impl DataSource for ProfileLookupSource {
    fn source_id(&self) -> SourceId {
        SourceId::ProfileLookup
    }

    async fn fetch(&self, identity: &CompanyIdentity) -> Result<PartialPayload> {
        let mut payload = PartialPayload::default();
        let Some(domain) = identity.domain.as_deref() else {
            debug!(company = %identity.name, "no domain, skipping founder lookup");
            return Ok(payload);
        };

        let urls = self.founder_profile_urls(domain).await?;
        debug!(company = %identity.name, candidates = urls.len(), "found founder profiles");

        for url in urls {
            let params = [("url", url.clone())];
            match self
                .client
                .get_json(PROFILE_URL, &params, &self.auth_headers())
                .await
            {
                Ok(profile) => payload
                    .founders
                    .push(map_profile(&profile, identity.industry.as_deref())),
                Err(err) => {
                    // One unreachable profile only loses that founder's detail.
                    warn!(profile = %url, error = %err, "profile enrichment failed");
                }
            }
        }
        Ok(payload)
    }
}

fn map_profile(profile: &Value, industry: Option<&str>) -> FounderRecord {
    let mut record = FounderRecord {
        name: profile["full_name"].as_str().map(str::to_string).into(),
        ..FounderRecord::default()
    };

    if let Some(highest) = profile["education"].get(0) {
        let degree = highest["degree_name"].as_str().unwrap_or_default().to_lowercase();
        record.education_level = education_level(&degree).into();
        if let Some(school) = highest["school"].as_str() {
            record.school_tier = Field::Known(school_tier(school));
        }
    }

    let empty = Vec::new();
    let experience = profile["experience"].as_array().unwrap_or(&empty);
    if !experience.is_empty() {
        let leadership = experience.iter().any(|exp| {
            let title = exp["title"].as_str().unwrap_or_default().to_lowercase();
            LEADERSHIP_TITLES.iter().any(|word| title.contains(word))
        });
        let top_company = experience.iter().any(|exp| {
            let company = exp["company"].as_str().unwrap_or_default().to_lowercase();
            TOP_COMPANIES.iter().any(|keyword| company.contains(keyword))
        });
        let exits = experience
            .iter()
            .filter(|exp| {
                exp["description"]
                    .as_str()
                    .unwrap_or_default()
                    .to_lowercase()
                    .contains("acquired")
            })
            .count();
        record.leadership_experience = Field::Known(leadership);
        record.top_company_experience = Field::Known(top_company);
        record.previous_exits = Field::Known(exits as u32);
        record.role_alignment = role_alignment(experience).into();
        record.domain_experience = domain_experience(experience, industry).into();
    }

    record
}

fn education_level(degree: &str) -> Option<String> {
    if degree.is_empty() {
        None
    } else if degree.contains("phd") || degree.contains("doctor") {
        Some("PhD".to_string())
    } else if degree.contains("master") || degree.contains("msc") {
        Some("Masters".to_string())
    } else if degree.contains("bachelor") || degree.contains("bsc") {
        Some("Bachelors".to_string())
    } else {
        Some(crate::sources::title_case(degree))
    }
}

fn school_tier(school: &str) -> String {
    let name = school.to_lowercase();
    if TIER_1_SCHOOLS.iter().any(|keyword| name.contains(keyword)) {
        "Tier-1".to_string()
    } else if TIER_2_SCHOOLS.iter().any(|keyword| name.contains(keyword)) {
        "Tier-2".to_string()
    } else {
        "Tier-3".to_string()
    }
}

/// Share of current roles whose title matches the venture-building
/// disciplines; `None` when no role is marked current.
fn role_alignment(experience: &[Value]) -> Option<f64> {
    let current: Vec<&Value> = experience
        .iter()
        .filter(|exp| exp["current"].as_bool().unwrap_or(false))
        .collect();
    if current.is_empty() {
        return None;
    }
    let aligned = current
        .iter()
        .filter(|exp| {
            let title = exp["title"].as_str().unwrap_or_default().to_lowercase();
            ALIGNED_ROLES.iter().any(|keyword| title.contains(keyword))
        })
        .count();
    Some((aligned as f64 / current.len() as f64).min(1.0))
}

/// Share of career entries touching the venture's industry; `None` without
/// an industry label to match against.
fn domain_experience(experience: &[Value], industry: Option<&str>) -> Option<f64> {
    let industry = industry?.to_lowercase();
    if industry.is_empty() {
        return None;
    }
    let matching = experience
        .iter()
        .filter(|exp| {
            let text = format!(
                "{} {} {}",
                exp["title"].as_str().unwrap_or_default(),
                exp["company"].as_str().unwrap_or_default(),
                exp["description"].as_str().unwrap_or_default()
            )
            .to_lowercase();
            text.contains(&industry)
        })
        .count();
    Some(round2(matching as f64 / experience.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_education_and_career_flags() {
        let profile = json!({
            "full_name": "Jane Doe",
            "education": [{"degree_name": "PhD in CS", "school": "Stanford University"}],
            "experience": [
                {"title": "CTO", "company": "Scam AI", "current": true},
                {"title": "Engineer", "company": "Google", "description": "Team was acquired."},
            ],
        });
        let record = map_profile(&profile, Some("AI"));
        assert_eq!(record.education_level, Field::Known("PhD".to_string()));
        assert_eq!(record.school_tier, Field::Known("Tier-1".to_string()));
        assert_eq!(record.leadership_experience, Field::Known(true));
        assert_eq!(record.top_company_experience, Field::Known(true));
        assert_eq!(record.previous_exits, Field::Known(1));
    }

    #[test]
    fn missing_current_roles_leave_alignment_unknown() {
        let profile = json!({
            "full_name": "Sam Lee",
            "experience": [{"title": "Advisor", "company": "Somewhere"}],
        });
        let record = map_profile(&profile, None);
        assert_eq!(record.role_alignment, Field::Unknown);
        assert_eq!(record.domain_experience, Field::Unknown);
    }
}
