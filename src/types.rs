use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Explicit absence marker used for every leaf of the profile schema.
///
/// Serializes `Unknown` as JSON `null`; a missing or `null` value
/// deserializes back to `Unknown`, so round-tripping never invents data.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Field<T> {
    Known(T),
    #[default]
    Unknown,
}

impl<T> Field<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Field::Known(_))
    }

    pub fn is_unknown(&self) -> bool {
        !self.is_known()
    }

    pub fn known(self) -> Option<T> {
        match self {
            Field::Known(value) => Some(value),
            Field::Unknown => None,
        }
    }

    pub fn known_ref(&self) -> Option<&T> {
        match self {
            Field::Known(value) => Some(value),
            Field::Unknown => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
        match self {
            Field::Known(value) => Field::Known(f(value)),
            Field::Unknown => Field::Unknown,
        }
    }

    /// Falls back to `other` when this field is `Unknown`.
    pub fn or(self, other: Field<T>) -> Field<T> {
        match self {
            Field::Known(value) => Field::Known(value),
            Field::Unknown => other,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Field::Known(value),
            None => Field::Unknown,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Field::Known(value) => value.serialize(serializer),
            Field::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

/// Caller-supplied identity of the company under collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    pub name: String,
    pub domain: Option<String>,
    pub industry: Option<String>,
    pub stage: Option<String>,
    pub region: Option<String>,
}

impl CompanyIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: None,
            industry: None,
            stage: None,
            region: None,
        }
    }
}

/// Identifier of the origin of a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Serp,
    NewsApi,
    Crunchbase,
    ProductHunt,
    ProfileLookup,
    OpenCorporates,
    Offline,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceId::Serp => "serp",
            SourceId::NewsApi => "news_api",
            SourceId::Crunchbase => "crunchbase",
            SourceId::ProductHunt => "product_hunt",
            SourceId::ProfileLookup => "profile_lookup",
            SourceId::OpenCorporates => "open_corporates",
            SourceId::Offline => "offline",
        };
        f.write_str(name)
    }
}

/// Category a schema leaf belongs to, used to look up source trust ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    Company,
    Funding,
    Founders,
    Market,
    Competition,
    Sentiment,
    Hiring,
    Product,
    Compliance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompanySection {
    pub name: Field<String>,
    pub legal_name: Field<String>,
    pub domain: Field<String>,
    pub description: Field<String>,
    pub founded_year: Field<i32>,
    pub headquarters: Field<String>,
    pub categories: Field<Vec<String>>,
    pub market_size: Field<String>,
    pub team_size: Field<String>,
    pub timing: Field<String>,
    pub industry_growth: Field<String>,
    pub market_growth_rate: Field<f64>,
    pub update_frequency_per_month: Field<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FundingSection {
    pub stage: Field<String>,
    pub valuation_trend: Field<String>,
    pub investor_quality: Field<String>,
    pub round_count: Field<u32>,
    pub last_funding_on: Field<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FounderRecord {
    pub name: Field<String>,
    pub title: Field<String>,
    pub linkedin_url: Field<String>,
    pub education_level: Field<String>,
    pub school_tier: Field<String>,
    pub leadership_experience: Field<bool>,
    pub top_company_experience: Field<bool>,
    pub previous_exits: Field<u32>,
    pub role_alignment: Field<f64>,
    pub domain_experience: Field<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketSection {
    pub size_usd: Field<f64>,
    pub cagr: Field<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompetitionSection {
    pub competitor_count: Field<u32>,
    pub investor_diversity: Field<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentimentSection {
    pub overall: Field<String>,
    pub average: Field<f64>,
    pub article_count: Field<u32>,
    pub sources: Field<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HiringSection {
    pub job_postings: Field<u64>,
    pub net_new_roles_last_quarter: Field<u32>,
    pub senior_ratio: Field<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductSection {
    pub tagline: Field<String>,
    pub pmf: Field<String>,
    pub innovation_mentions: Field<String>,
    pub frontier_tech_usage: Field<String>,
    pub reviews: Field<String>,
    pub pivot_history: Field<String>,
    pub release_frequency_per_quarter: Field<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComplianceSection {
    pub jurisdiction: Field<String>,
    pub incorporation_date: Field<String>,
    pub company_number: Field<String>,
    pub patent_count: Field<u32>,
    pub regulation_mentions: Field<u32>,
}

/// The shared field vocabulary every adapter maps its provider onto.
///
/// Every leaf is a [`Field`], so a payload with nothing to say is simply all
/// `Unknown` rather than structurally different. The hand-curated offline
/// profile uses the same shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialPayload {
    pub company: CompanySection,
    pub funding: FundingSection,
    pub founders: Vec<FounderRecord>,
    pub market: MarketSection,
    pub competition: CompetitionSection,
    pub sentiment: SentimentSection,
    pub hiring: HiringSection,
    pub product: ProductSection,
    pub compliance: ComplianceSection,
}

/// Manually curated ground truth supplied by the caller; same shape as an
/// adapter payload and always wins during resolution.
pub type OfflineProfile = PartialPayload;

/// A single adapter's failure, recorded as a diagnostic instead of aborting
/// the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source_id: SourceId,
    pub reason: String,
}

/// Outcome of one adapter's fetch during fan-out.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source_id: SourceId,
    /// Position in the resolver's fixed source order; secondary tie-break key.
    pub order: usize,
    pub fetched_at: DateTime<Utc>,
    pub outcome: std::result::Result<PartialPayload, SourceFailure>,
}

/// Origin of one resolved field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceEntry {
    pub path: String,
    pub source: SourceId,
}

/// Canonical per-run record produced by the aggregator.
///
/// Invariant: every schema leaf is present, with `Unknown` marking what no
/// source could determine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedProfile {
    pub run_id: Uuid,
    pub identity: CompanyIdentity,
    pub collected_at: DateTime<Utc>,
    pub data: PartialPayload,
    pub provenance: Vec<ProvenanceEntry>,
    pub failures: Vec<SourceFailure>,
}

impl MergedProfile {
    /// Profile with every field `Unknown`, useful as a base when deriving
    /// features from hand-assembled data.
    pub fn empty(identity: CompanyIdentity) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            identity,
            collected_at: Utc::now(),
            data: PartialPayload::default(),
            provenance: Vec::new(),
            failures: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("offline profile {path:?} is malformed: {reason}")]
    OfflineProfile { path: PathBuf, reason: String },

    #[error("upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, CollectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_round_trips_unknown_as_null() {
        let json = serde_json::to_string(&Field::<f64>::Unknown).unwrap();
        assert_eq!(json, "null");
        let back: Field<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Field::Unknown);
    }

    #[test]
    fn missing_leaves_deserialize_to_unknown() {
        let payload: PartialPayload =
            serde_json::from_str(r#"{"market": {"size_usd": 1000.0}}"#).unwrap();
        assert_eq!(payload.market.size_usd, Field::Known(1000.0));
        assert_eq!(payload.market.cagr, Field::Unknown);
        assert!(payload.founders.is_empty());
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let result = serde_json::from_str::<PartialPayload>(r#"{"markett": {}}"#);
        assert!(result.is_err());
    }
}
