use serde_json::json;

use startup_collector::{
    CompanyIdentity, ExternalBlock, Field, FifsRange, FounderBlock, MergedProfile,
    PartialPayload, PredictionBlock, ProvenanceEntry, SourceId,
};

fn profile_with(data: PartialPayload) -> MergedProfile {
    let mut profile = MergedProfile::empty(CompanyIdentity::named("Scam AI"));
    profile.data = data;
    profile
}

#[test]
fn prediction_block_maps_strong_signals() {
    let data: PartialPayload = serde_json::from_value(json!({
        "company": {
            "market_size": "Large",
            "market_growth_rate": 0.3,
            "update_frequency_per_month": 10.0,
            "timing": "JustRight",
        },
        "product": {
            "pivot_history": "Rarely",
            "pmf": "Strong",
            "innovation_mentions": "Often",
            "frontier_tech_usage": "Emphasized",
            "reviews": "Positive",
            "release_frequency_per_quarter": 6.0,
        },
        "funding": {
            "stage": "Series A",
            "valuation_trend": "Increased",
            "investor_quality": "Top-tier",
        },
        "sentiment": {"overall": "Positive"},
        "hiring": {"net_new_roles_last_quarter": 8, "senior_ratio": 0.6},
    }))
    .unwrap();

    let features = PredictionBlock.build(&profile_with(data));
    assert_eq!(features.market_size, "Large");
    assert_eq!(features.industry_growth, "Yes");
    // 10 * 0.6 + 8 * 0.4 = 9.2, past the "Faster" threshold.
    assert_eq!(features.growth_speed, "Faster");
    // 6 / 4 + 0.6 * 2 = 2.7, past the "Excellent" threshold.
    assert_eq!(features.execution_capability, "Excellent");
    assert_eq!(features.funding_amount, "Series A");
    assert_eq!(features.sentiment, "Positive");
    assert_eq!(features.market_adaptability, "Rarely");
}

#[test]
fn prediction_block_never_guesses_missing_slots() {
    let features = PredictionBlock.build(&profile_with(PartialPayload::default()));
    assert_eq!(features.industry_growth, "Unknown");
    assert_eq!(features.growth_speed, "Unknown");
    assert_eq!(features.execution_capability, "Unknown");
    assert_eq!(features.valuation_trend, "Unknown");
    assert_eq!(features.reviews, "Unknown");
}

#[test]
fn founder_block_classifies_accomplished_team() {
    let data: PartialPayload = serde_json::from_value(json!({
        "founders": [{
            "name": "Jane Doe",
            "education_level": "PhD",
            "school_tier": "Tier-1",
            "leadership_experience": true,
            "top_company_experience": true,
            "previous_exits": 1,
            "role_alignment": 0.8,
        }],
    }))
    .unwrap();

    let features = FounderBlock::new(FifsRange::ZeroToOne).build(&profile_with(data));
    assert_eq!(features.founder_level, "L5");
    assert_eq!(features.founder_count, 1);
    let fifs = features.founders[0].fifs.known_ref().copied().unwrap();
    let expected = (0.5 * 0.8 + 0.2 * 1.0) / 0.7;
    assert!((fifs - expected).abs() < 1e-9);
}

#[test]
fn team_fifs_averages_only_scored_founders() {
    let data: PartialPayload = serde_json::from_value(json!({
        "founders": [
            {"name": "Scored", "role_alignment": 0.6},
            {"name": "Unscored"},
        ],
    }))
    .unwrap();

    let features = FounderBlock::new(FifsRange::ZeroToOne).build(&profile_with(data));
    assert_eq!(features.founder_count, 2);
    assert_eq!(features.founders[1].fifs, Field::Unknown);
    // The unscored founder is excluded, not counted as zero.
    assert_eq!(features.team_fifs, Field::Known(0.6));
}

#[test]
fn team_fifs_is_unknown_with_zero_scored_founders() {
    let data: PartialPayload = serde_json::from_value(json!({
        "founders": [{"name": "A"}, {"name": "B"}],
    }))
    .unwrap();

    let features = FounderBlock::new(FifsRange::ZeroToOne).build(&profile_with(data));
    assert_eq!(features.team_fifs, Field::Unknown);
}

#[test]
fn external_block_passes_figures_through_with_provenance() {
    let data: PartialPayload = serde_json::from_value(json!({
        "market": {"size_usd": 1_000_000_000.0, "cagr": 0.2},
        "competition": {"competitor_count": 10, "investor_diversity": 0.6},
        "sentiment": {"average": 0.3, "overall": "Positive", "article_count": 12},
        "compliance": {"patent_count": 4, "regulation_mentions": 2},
    }))
    .unwrap();
    let mut profile = profile_with(data);
    profile.provenance.push(ProvenanceEntry {
        path: "market.size_usd".to_string(),
        source: SourceId::Offline,
    });

    let knowledge = ExternalBlock.build(&profile);
    assert_eq!(knowledge.market.size_usd, Field::Known(1_000_000_000.0));
    assert_eq!(knowledge.sentiment.average, Field::Known(0.3));
    assert_eq!(knowledge.compliance.patent_count, Field::Known(4));
    assert_eq!(knowledge.knowledge.provenance, profile.provenance);
    assert!(knowledge.knowledge.summary.contains("$1.0B"));
    assert!(!knowledge.knowledge.data_gaps.contains(&"market.size_usd".to_string()));
    assert!(knowledge.knowledge.data_gaps.contains(&"product.pmf".to_string()));
}

#[test]
fn external_block_flags_risks_and_gaps() {
    let data: PartialPayload = serde_json::from_value(json!({
        "sentiment": {"average": -0.5, "overall": "Negative", "article_count": 3},
        "competition": {"competitor_count": 30},
        "compliance": {"regulation_mentions": 1},
    }))
    .unwrap();

    let knowledge = ExternalBlock.build(&profile_with(data));
    let risks = &knowledge.knowledge.risks;
    assert!(risks.iter().any(|risk| risk.contains("negative")));
    assert!(risks.iter().any(|risk| risk.contains("crowded")));
    assert!(risks.iter().any(|risk| risk.contains("funding")));
    assert!(risks.iter().any(|risk| risk.contains("regulatory")));
    assert!(knowledge.knowledge.data_gaps.contains(&"market.size_usd".to_string()));
}
