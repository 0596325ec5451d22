use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::json;

use startup_collector::{
    CollectorError, CompanyIdentity, DataSource, FeatureCollector, Field, OfflineProfile,
    PartialPayload, Result, RuntimeConfig, SourceId, TieBreak,
};

/// Source that always returns the same payload.
struct StaticSource {
    id: SourceId,
    payload: PartialPayload,
}

#[async_trait]
impl DataSource for StaticSource {
    fn source_id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self, _identity: &CompanyIdentity) -> Result<PartialPayload> {
        Ok(self.payload.clone())
    }
}

/// Source that always fails, standing in for a timed-out provider.
struct FailingSource {
    id: SourceId,
}

#[async_trait]
impl DataSource for FailingSource {
    fn source_id(&self) -> SourceId {
        self.id
    }

    async fn fetch(&self, _identity: &CompanyIdentity) -> Result<PartialPayload> {
        Err(CollectorError::General("simulated timeout".to_string()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn collector_with(sources: Vec<Box<dyn DataSource>>) -> FeatureCollector {
    FeatureCollector::with_sources(RuntimeConfig::default(), sources)
}

fn market_payload(size_usd: f64) -> PartialPayload {
    let mut payload = PartialPayload::default();
    payload.market.size_usd = Field::Known(size_usd);
    payload
}

fn scam_ai_offline() -> OfflineProfile {
    serde_json::from_value(json!({
        "market": {"size_usd": 10_600_000_000.0, "cagr": 0.156},
        "founders": [
            {
                "name": "Alex Rivera",
                "leadership_experience": true,
                "top_company_experience": true,
                "role_alignment": 0.8,
            },
            {
                "name": "Priya Shah",
                "leadership_experience": true,
                "top_company_experience": false,
                "role_alignment": 0.6,
            },
        ],
    }))
    .expect("offline profile should deserialize")
}

fn temp_output_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "startup-collector-{label}-{}",
        std::process::id()
    ))
}

#[tokio::test]
async fn zero_sources_yield_fully_unknown_profile() {
    init_tracing();
    let collector = collector_with(Vec::new());
    let identity = CompanyIdentity::named("Scam AI");

    let merged = collector.collect(&identity, None).await;
    assert_eq!(merged.data, PartialPayload::default());
    assert!(merged.provenance.is_empty());
    assert!(merged.failures.is_empty());

    // Every block still emits a fully-populated placeholder record.
    let artifacts = collector.build_features(&merged);
    assert_eq!(artifacts.prediction.market_size, "Unknown");
    assert_eq!(artifacts.prediction.sentiment, "Unknown");
    assert_eq!(artifacts.prediction.execution_capability, "Unknown");
    assert_eq!(artifacts.founder.founder_level, "Unknown");
    assert_eq!(artifacts.founder.team_fifs, Field::Unknown);
    assert_eq!(artifacts.founder.founder_count, 0);
    assert_eq!(artifacts.external.market.size_usd, Field::Unknown);
    assert!(artifacts.external.knowledge.data_gaps.contains(&"market.size_usd".to_string()));
}

#[tokio::test]
async fn offline_profile_outranks_adapter_values() {
    init_tracing();
    let collector = collector_with(vec![Box::new(StaticSource {
        id: SourceId::Crunchbase,
        payload: market_payload(5_000_000_000.0),
    })]);
    let identity = CompanyIdentity::named("Scam AI");
    let offline = scam_ai_offline();

    let merged = collector.collect(&identity, Some(&offline)).await;
    assert_eq!(merged.data.market.size_usd, Field::Known(10_600_000_000.0));
    let entry = merged
        .provenance
        .iter()
        .find(|entry| entry.path == "market.size_usd")
        .expect("market.size_usd should carry provenance");
    assert_eq!(entry.source, SourceId::Offline);
}

#[tokio::test]
async fn failing_source_is_masked_by_offline_precedence() {
    init_tracing();
    let collector = collector_with(vec![Box::new(FailingSource {
        id: SourceId::Crunchbase,
    })]);
    let identity = CompanyIdentity::named("Scam AI");
    let offline = scam_ai_offline();

    let merged = collector.collect(&identity, Some(&offline)).await;
    assert_eq!(merged.data.market.size_usd, Field::Known(10_600_000_000.0));
    assert_eq!(merged.failures.len(), 1);
    assert_eq!(merged.failures[0].source_id, SourceId::Crunchbase);
}

#[tokio::test]
async fn one_failure_never_touches_other_sources_fields() {
    init_tracing();
    let mut sentiment = PartialPayload::default();
    sentiment.sentiment.overall = Field::Known("Positive".to_string());
    sentiment.sentiment.average = Field::Known(0.4);

    let collector = collector_with(vec![
        Box::new(FailingSource {
            id: SourceId::Crunchbase,
        }),
        Box::new(StaticSource {
            id: SourceId::NewsApi,
            payload: sentiment,
        }),
    ]);
    let identity = CompanyIdentity::named("Scam AI");

    let merged = collector.collect(&identity, None).await;
    assert_eq!(merged.data.sentiment.overall, Field::Known("Positive".to_string()));
    assert_eq!(merged.data.sentiment.average, Field::Known(0.4));
    assert_eq!(merged.data.market.size_usd, Field::Unknown);
    assert_eq!(merged.failures.len(), 1);
}

#[tokio::test]
async fn trust_rank_beats_fetch_recency() {
    init_tracing();
    // The generalist search adapter reports after the funding registry, but
    // the registry holds the higher rank for market fields.
    let collector = collector_with(vec![
        Box::new(StaticSource {
            id: SourceId::Crunchbase,
            payload: market_payload(80_000_000_000.0),
        }),
        Box::new(StaticSource {
            id: SourceId::Serp,
            payload: market_payload(1_000_000.0),
        }),
    ]);
    let identity = CompanyIdentity::named("Scam AI");

    let merged = collector.collect(&identity, None).await;
    assert_eq!(merged.data.market.size_usd, Field::Known(80_000_000_000.0));
    let entry = merged
        .provenance
        .iter()
        .find(|entry| entry.path == "market.size_usd")
        .unwrap();
    assert_eq!(entry.source, SourceId::Crunchbase);
}

#[tokio::test]
async fn fixed_order_tie_break_prefers_earlier_source() {
    init_tracing();
    let mut first = PartialPayload::default();
    first.company.description = Field::Known("from the first source".to_string());
    let mut second = PartialPayload::default();
    second.company.description = Field::Known("from the second source".to_string());

    let config = RuntimeConfig {
        tie_break: TieBreak::PreferFixedOrder,
        ..RuntimeConfig::default()
    };
    let collector = FeatureCollector::with_sources(
        config,
        vec![
            Box::new(StaticSource {
                id: SourceId::Serp,
                payload: first,
            }),
            Box::new(StaticSource {
                id: SourceId::NewsApi,
                payload: second,
            }),
        ],
    );
    let identity = CompanyIdentity::named("Scam AI");

    let merged = collector.collect(&identity, None).await;
    assert_eq!(
        merged.data.company.description,
        Field::Known("from the first source".to_string())
    );
}

#[tokio::test]
async fn resolution_is_deterministic_across_runs() {
    init_tracing();
    let build = || {
        collector_with(vec![
            Box::new(StaticSource {
                id: SourceId::Crunchbase,
                payload: market_payload(80_000_000_000.0),
            }) as Box<dyn DataSource>,
            Box::new(FailingSource {
                id: SourceId::NewsApi,
            }),
        ])
    };
    let identity = CompanyIdentity::named("Scam AI");
    let offline = scam_ai_offline();

    let first = build().collect(&identity, Some(&offline)).await;
    let second = build().collect(&identity, Some(&offline)).await;

    // Resolved content is identical; only the run id and timestamp differ.
    assert_eq!(
        serde_json::to_string(&first.data).unwrap(),
        serde_json::to_string(&second.data).unwrap()
    );
    assert_eq!(first.provenance, second.provenance);
    assert_eq!(first.failures, second.failures);
}

#[tokio::test]
async fn founder_lists_merge_by_name_across_sources() {
    init_tracing();
    let enriched: PartialPayload = serde_json::from_value(json!({
        "founders": [{
            "name": "Alex Rivera",
            "education_level": "PhD",
            "school_tier": "Tier-1",
            "leadership_experience": true,
        }],
    }))
    .unwrap();
    let stubs: PartialPayload = serde_json::from_value(json!({
        "founders": [{
            "name": "alex rivera",
            "title": "CEO",
            "linkedin_url": "https://www.linkedin.com/in/alex-rivera",
        }],
    }))
    .unwrap();

    let collector = collector_with(vec![
        Box::new(StaticSource {
            id: SourceId::Crunchbase,
            payload: stubs,
        }),
        Box::new(StaticSource {
            id: SourceId::ProfileLookup,
            payload: enriched,
        }),
    ]);
    let identity = CompanyIdentity::named("Scam AI");

    let merged = collector.collect(&identity, None).await;
    assert_eq!(merged.data.founders.len(), 1);
    let founder = &merged.data.founders[0];
    // Profile lookup outranks the registry for founders, so its record is
    // the base and the registry fills the gaps.
    assert_eq!(founder.education_level, Field::Known("PhD".to_string()));
    assert_eq!(founder.title, Field::Known("CEO".to_string()));
}

#[tokio::test]
async fn scam_ai_offline_run_end_to_end() {
    init_tracing();
    let collector = collector_with(Vec::new());
    let identity = CompanyIdentity::named("Scam AI");
    let offline = scam_ai_offline();
    let output_dir = temp_output_dir("scam-ai");

    let (merged, artifacts) = startup_collector::collect_features(
        &collector,
        &identity,
        Some(&offline),
        &output_dir,
    )
    .await
    .expect("run should complete");

    // Offline market figures survive verbatim with offline provenance.
    assert_eq!(
        artifacts.external.market.size_usd,
        Field::Known(10_600_000_000.0)
    );
    assert_eq!(artifacts.external.market.cagr, Field::Known(0.156));
    for path in ["market.size_usd", "market.cagr"] {
        let entry = merged
            .provenance
            .iter()
            .find(|entry| entry.path == path)
            .unwrap();
        assert_eq!(entry.source, SourceId::Offline);
    }

    // Two founder rows with the curated flags.
    assert_eq!(artifacts.founder.founder_count, 2);
    let rows = &artifacts.founder.founders;
    assert_eq!(rows[0].leadership_experience, Field::Known(true));
    assert_eq!(rows[0].top_company_experience, Field::Known(true));
    assert_eq!(rows[1].top_company_experience, Field::Known(false));

    // Team FIFS is the mean of the two individually computed scores.
    let individual: Vec<f64> = rows
        .iter()
        .map(|row| row.fifs.known_ref().copied().unwrap())
        .collect();
    let expected = individual.iter().sum::<f64>() / individual.len() as f64;
    let team = artifacts.founder.team_fifs.known_ref().copied().unwrap();
    assert!((team - expected).abs() < 1e-9);

    // All three artifacts land on disk.
    for file in [
        "features_prediction.json",
        "features_founder.json",
        "features_external.json",
    ] {
        assert!(output_dir.join(file).exists(), "{file} should be written");
    }
    std::fs::remove_dir_all(&output_dir).ok();
}

#[tokio::test]
async fn malformed_offline_profile_is_fatal() {
    init_tracing();
    let path = temp_output_dir("bad-profile").join("profile.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"markett": {"size_usd": 1.0}}"#).unwrap();

    let error = startup_collector::load_offline_profile(&path).unwrap_err();
    assert!(matches!(error, CollectorError::OfflineProfile { .. }));
    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}
