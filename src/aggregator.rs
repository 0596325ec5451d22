use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{RuntimeConfig, TieBreak};
use crate::features::{ExternalBlock, FeatureArtifacts, FounderBlock, PredictionBlock};
use crate::fetcher::CachedClient;
use crate::sources::active_sources;
use crate::traits::DataSource;
use crate::types::{
    CollectorError, CompanyIdentity, Field, FieldCategory, FounderRecord, MergedProfile,
    OfflineProfile, PartialPayload, ProvenanceEntry, Result, SourceFailure, SourceId,
    SourceReport,
};
use crate::writer::write_artifacts;

/// Per-field-category trust ordering; a higher rank wins disagreements.
/// Generalist sources sit at rank 1 so they still resolve fields no
/// specialist proposed.
pub(crate) fn trust_rank(source: SourceId, category: FieldCategory) -> u8 {
    use FieldCategory::*;
    match (category, source) {
        (Company, SourceId::Crunchbase) => 3,
        (Company, SourceId::OpenCorporates) => 2,
        (Funding, SourceId::Crunchbase) => 3,
        (Founders, SourceId::ProfileLookup) => 3,
        (Founders, SourceId::Crunchbase) => 2,
        (Market, SourceId::Crunchbase) => 3,
        (Competition, SourceId::Crunchbase) => 3,
        (Sentiment, SourceId::NewsApi) => 3,
        (Hiring, SourceId::Serp) => 3,
        (Product, SourceId::ProductHunt) => 3,
        (Compliance, SourceId::OpenCorporates) => 3,
        _ => 1,
    }
}

/// Loads and validates the hand-curated profile. This is the one fatal
/// error path: bad manual data must stop the run before any fetch.
pub fn load_offline_profile(path: &Path) -> Result<OfflineProfile> {
    let raw = std::fs::read_to_string(path).map_err(|err| CollectorError::OfflineProfile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|err| CollectorError::OfflineProfile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// A successful adapter payload with its fan-out metadata.
struct Candidate<'a> {
    source_id: SourceId,
    order: usize,
    fetched_at: DateTime<Utc>,
    payload: &'a PartialPayload,
}

/// Coordinates the active data sources and the feature builders.
pub struct FeatureCollector {
    config: RuntimeConfig,
    sources: Vec<Box<dyn DataSource>>,
    prediction: PredictionBlock,
    founder: FounderBlock,
    external: ExternalBlock,
}

impl FeatureCollector {
    /// Collector over an explicit source list; the list order is the fixed
    /// order used for deterministic tie-breaking.
    pub fn with_sources(config: RuntimeConfig, sources: Vec<Box<dyn DataSource>>) -> Self {
        let founder = FounderBlock::new(config.fifs_range);
        Self {
            config,
            sources,
            prediction: PredictionBlock,
            founder,
            external: ExternalBlock,
        }
    }

    /// Collector over whichever sources the configured credentials enable.
    pub fn from_config(config: RuntimeConfig) -> Result<Self> {
        let client = Arc::new(CachedClient::new(&config)?);
        let sources = active_sources(&config.credentials, client);
        Ok(Self::with_sources(config, sources))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// One complete collection cycle: concurrent fan-out, then deterministic
    /// resolution against the offline profile.
    pub async fn collect(
        &self,
        identity: &CompanyIdentity,
        offline: Option<&OfflineProfile>,
    ) -> MergedProfile {
        info!(company = %identity.name, sources = self.sources.len(), "starting collection run");
        let reports = self.fan_out(identity).await;
        let profile = self.resolve(identity, offline, &reports);
        info!(
            company = %identity.name,
            resolved = profile.provenance.len(),
            failed = profile.failures.len(),
            "collection run complete"
        );
        profile
    }

    /// Derive all three feature records from one merged profile. The blocks
    /// are pure and independent of each other.
    pub fn build_features(&self, profile: &MergedProfile) -> FeatureArtifacts {
        FeatureArtifacts {
            prediction: self.prediction.build(profile),
            founder: self.founder.build(profile),
            external: self.external.build(profile),
        }
    }

    async fn fan_out(&self, identity: &CompanyIdentity) -> Vec<SourceReport> {
        let budget = self.config.source_timeout;
        let tasks = self.sources.iter().enumerate().map(|(order, source)| async move {
            let source_id = source.source_id();
            let outcome = match tokio::time::timeout(budget, source.fetch(identity)).await {
                Ok(Ok(payload)) => Ok(payload),
                Ok(Err(err)) => {
                    warn!(source = %source_id, error = %err, "source fetch failed");
                    Err(SourceFailure {
                        source_id,
                        reason: err.to_string(),
                    })
                }
                Err(_) => {
                    warn!(source = %source_id, timeout = ?budget, "source fetch timed out");
                    Err(SourceFailure {
                        source_id,
                        reason: format!("timed out after {budget:?}"),
                    })
                }
            };
            SourceReport {
                source_id,
                order,
                fetched_at: Utc::now(),
                outcome,
            }
        });
        join_all(tasks).await
    }

    fn resolve(
        &self,
        identity: &CompanyIdentity,
        offline: Option<&OfflineProfile>,
        reports: &[SourceReport],
    ) -> MergedProfile {
        let mut provenance = Vec::new();
        let mut failures = Vec::new();
        let mut candidates = Vec::new();
        for report in reports {
            match &report.outcome {
                Ok(payload) => candidates.push(Candidate {
                    source_id: report.source_id,
                    order: report.order,
                    fetched_at: report.fetched_at,
                    payload,
                }),
                Err(failure) => failures.push(failure.clone()),
            }
        }

        let mut data = PartialPayload::default();

        macro_rules! leaf {
            ($path:literal, $category:expr, $($accessor:tt)+) => {
                data.$($accessor)+ = self.resolve_leaf(
                    $path,
                    $category,
                    offline.map(|profile| &profile.$($accessor)+),
                    &candidates,
                    |payload| &payload.$($accessor)+,
                    &mut provenance,
                );
            };
        }

        use FieldCategory::*;
        leaf!("company.name", Company, company.name);
        leaf!("company.legal_name", Company, company.legal_name);
        leaf!("company.domain", Company, company.domain);
        leaf!("company.description", Company, company.description);
        leaf!("company.founded_year", Company, company.founded_year);
        leaf!("company.headquarters", Company, company.headquarters);
        leaf!("company.categories", Company, company.categories);
        leaf!("company.market_size", Market, company.market_size);
        leaf!("company.team_size", Company, company.team_size);
        leaf!("company.timing", Company, company.timing);
        leaf!("company.industry_growth", Market, company.industry_growth);
        leaf!("company.market_growth_rate", Market, company.market_growth_rate);
        leaf!(
            "company.update_frequency_per_month",
            Product,
            company.update_frequency_per_month
        );

        leaf!("funding.stage", Funding, funding.stage);
        leaf!("funding.valuation_trend", Funding, funding.valuation_trend);
        leaf!("funding.investor_quality", Funding, funding.investor_quality);
        leaf!("funding.round_count", Funding, funding.round_count);
        leaf!("funding.last_funding_on", Funding, funding.last_funding_on);

        leaf!("market.size_usd", Market, market.size_usd);
        leaf!("market.cagr", Market, market.cagr);

        leaf!("competition.competitor_count", Competition, competition.competitor_count);
        leaf!("competition.investor_diversity", Competition, competition.investor_diversity);

        leaf!("sentiment.overall", Sentiment, sentiment.overall);
        leaf!("sentiment.average", Sentiment, sentiment.average);
        leaf!("sentiment.article_count", Sentiment, sentiment.article_count);
        leaf!("sentiment.sources", Sentiment, sentiment.sources);

        leaf!("hiring.job_postings", Hiring, hiring.job_postings);
        leaf!(
            "hiring.net_new_roles_last_quarter",
            Hiring,
            hiring.net_new_roles_last_quarter
        );
        leaf!("hiring.senior_ratio", Hiring, hiring.senior_ratio);

        leaf!("product.tagline", Product, product.tagline);
        leaf!("product.pmf", Product, product.pmf);
        leaf!("product.innovation_mentions", Product, product.innovation_mentions);
        leaf!("product.frontier_tech_usage", Product, product.frontier_tech_usage);
        leaf!("product.reviews", Product, product.reviews);
        leaf!("product.pivot_history", Product, product.pivot_history);
        leaf!(
            "product.release_frequency_per_quarter",
            Product,
            product.release_frequency_per_quarter
        );

        leaf!("compliance.jurisdiction", Compliance, compliance.jurisdiction);
        leaf!("compliance.incorporation_date", Compliance, compliance.incorporation_date);
        leaf!("compliance.company_number", Compliance, compliance.company_number);
        leaf!("compliance.patent_count", Compliance, compliance.patent_count);
        leaf!("compliance.regulation_mentions", Compliance, compliance.regulation_mentions);

        data.founders = self.resolve_founders(offline, &candidates, &mut provenance);

        MergedProfile {
            run_id: Uuid::new_v4(),
            identity: identity.clone(),
            collected_at: Utc::now(),
            data,
            provenance,
            failures,
        }
    }

    /// Resolution order for one leaf: offline wins outright, then the
    /// highest-ranked adapter proposing a value, then the tie-break policy.
    fn resolve_leaf<T: Clone>(
        &self,
        path: &str,
        category: FieldCategory,
        offline: Option<&Field<T>>,
        candidates: &[Candidate<'_>],
        extract: impl Fn(&PartialPayload) -> &Field<T>,
        provenance: &mut Vec<ProvenanceEntry>,
    ) -> Field<T> {
        if let Some(Field::Known(value)) = offline {
            provenance.push(ProvenanceEntry {
                path: path.to_string(),
                source: SourceId::Offline,
            });
            return Field::Known(value.clone());
        }

        let mut best: Option<(&Candidate<'_>, &T, u8)> = None;
        for candidate in candidates {
            let Field::Known(value) = extract(candidate.payload) else {
                continue;
            };
            let rank = trust_rank(candidate.source_id, category);
            let wins = match &best {
                None => true,
                Some((current, _, current_rank)) => {
                    rank > *current_rank
                        || (rank == *current_rank && self.breaks_tie(candidate, current))
                }
            };
            if wins {
                best = Some((candidate, value, rank));
            }
        }

        match best {
            Some((candidate, value, _)) => {
                provenance.push(ProvenanceEntry {
                    path: path.to_string(),
                    source: candidate.source_id,
                });
                Field::Known(value.clone())
            }
            None => Field::Unknown,
        }
    }

    /// Whether `challenger` beats `current` at equal trust rank. Both
    /// policies bottom out in the fixed source order, so resolution stays
    /// deterministic even with identical timestamps.
    fn breaks_tie(&self, challenger: &Candidate<'_>, current: &Candidate<'_>) -> bool {
        match self.config.tie_break {
            TieBreak::PreferRecent => match challenger.fetched_at.cmp(&current.fetched_at) {
                Ordering::Greater => true,
                Ordering::Equal => challenger.order < current.order,
                Ordering::Less => false,
            },
            TieBreak::PreferFixedOrder => challenger.order < current.order,
        }
    }

    /// Founders resolve as a list: the offline list wins whole, otherwise
    /// the highest-ranked non-empty list is the base and lower-ranked lists
    /// fill per-founder gaps matched by name.
    fn resolve_founders(
        &self,
        offline: Option<&OfflineProfile>,
        candidates: &[Candidate<'_>],
        provenance: &mut Vec<ProvenanceEntry>,
    ) -> Vec<FounderRecord> {
        if let Some(profile) = offline {
            if !profile.founders.is_empty() {
                provenance.push(ProvenanceEntry {
                    path: "founders".to_string(),
                    source: SourceId::Offline,
                });
                return profile.founders.clone();
            }
        }

        let mut best: Option<(&Candidate<'_>, u8)> = None;
        for candidate in candidates {
            if candidate.payload.founders.is_empty() {
                continue;
            }
            let rank = trust_rank(candidate.source_id, FieldCategory::Founders);
            let wins = match &best {
                None => true,
                Some((current, current_rank)) => {
                    rank > *current_rank
                        || (rank == *current_rank && self.breaks_tie(candidate, current))
                }
            };
            if wins {
                best = Some((candidate, rank));
            }
        }
        let Some((base, _)) = best else {
            return Vec::new();
        };

        provenance.push(ProvenanceEntry {
            path: "founders".to_string(),
            source: base.source_id,
        });
        let mut founders = base.payload.founders.clone();

        let mut others: Vec<&Candidate<'_>> = candidates
            .iter()
            .filter(|candidate| {
                candidate.source_id != base.source_id && !candidate.payload.founders.is_empty()
            })
            .collect();
        others.sort_by(|a, b| {
            let rank_a = trust_rank(a.source_id, FieldCategory::Founders);
            let rank_b = trust_rank(b.source_id, FieldCategory::Founders);
            rank_b
                .cmp(&rank_a)
                .then_with(|| if self.breaks_tie(a, b) { Ordering::Less } else { Ordering::Greater })
        });

        for other in others {
            for record in &mut founders {
                let Some(name) = record.name.known_ref() else {
                    continue;
                };
                let key = name.to_lowercase();
                let matched = other.payload.founders.iter().find(|extra| {
                    extra
                        .name
                        .known_ref()
                        .map(|n| n.to_lowercase() == key)
                        .unwrap_or(false)
                });
                if let Some(extra) = matched {
                    merge_founder(record, extra, other.source_id, provenance);
                }
            }
        }
        founders
    }
}

/// Fills the `Unknown` leaves of `record` from a lower-precedence sighting
/// of the same founder.
fn merge_founder(
    record: &mut FounderRecord,
    extra: &FounderRecord,
    source: SourceId,
    provenance: &mut Vec<ProvenanceEntry>,
) {
    let founder = record
        .name
        .known_ref()
        .map(|name| name.to_lowercase())
        .unwrap_or_default();

    macro_rules! fill {
        ($field:ident) => {
            if record.$field.is_unknown() {
                if let Field::Known(value) = &extra.$field {
                    record.$field = Field::Known(value.clone());
                    provenance.push(ProvenanceEntry {
                        path: format!("founders.{founder}.{}", stringify!($field)),
                        source,
                    });
                }
            }
        };
    }

    fill!(title);
    fill!(linkedin_url);
    fill!(education_level);
    fill!(school_tier);
    fill!(leadership_experience);
    fill!(top_company_experience);
    fill!(previous_exits);
    fill!(role_alignment);
    fill!(domain_experience);
}

/// Convenience entry point: collect, derive, and persist in one call.
pub async fn collect_features(
    collector: &FeatureCollector,
    identity: &CompanyIdentity,
    offline: Option<&OfflineProfile>,
    output_dir: &Path,
) -> Result<(MergedProfile, FeatureArtifacts)> {
    let merged = collector.collect(identity, offline).await;
    let artifacts = collector.build_features(&merged);
    write_artifacts(output_dir, &artifacts)?;
    Ok((merged, artifacts))
}
