use serde::{Deserialize, Serialize};

use crate::types::{Field, MergedProfile, PartialPayload, ProvenanceEntry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutlook {
    pub size_usd: Field<f64>,
    pub cagr: Field<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveLandscape {
    pub competitor_count: Field<u32>,
    pub investor_diversity: Field<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub overall: Field<String>,
    pub average: Field<f64>,
    pub article_count: Field<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceSignals {
    pub jurisdiction: Field<String>,
    pub incorporation_date: Field<String>,
    pub patent_count: Field<u32>,
    pub regulation_mentions: Field<u32>,
}

/// Free-text synthesis plus the traceability lists: which claims rest on
/// which source, and which fields stayed undetermined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSynthesis {
    pub summary: String,
    pub risks: Vec<String>,
    pub data_gaps: Vec<String>,
    pub source_links: Vec<String>,
    pub provenance: Vec<ProvenanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalKnowledge {
    pub market: MarketOutlook,
    pub competitive_landscape: CompetitiveLandscape,
    pub sentiment: SentimentSummary,
    pub compliance: ComplianceSignals,
    pub knowledge: KnowledgeSynthesis,
}

/// Synthesizes the external knowledge document from merged market,
/// competition, sentiment, and compliance fields plus provenance.
pub struct ExternalBlock;

impl ExternalBlock {
    pub fn build(&self, profile: &MergedProfile) -> ExternalKnowledge {
        let data = &profile.data;
        ExternalKnowledge {
            market: MarketOutlook {
                size_usd: data.market.size_usd,
                cagr: data.market.cagr,
            },
            competitive_landscape: CompetitiveLandscape {
                competitor_count: data.competition.competitor_count,
                investor_diversity: data.competition.investor_diversity,
            },
            sentiment: SentimentSummary {
                overall: data.sentiment.overall.clone(),
                average: data.sentiment.average,
                article_count: data.sentiment.article_count,
            },
            compliance: ComplianceSignals {
                jurisdiction: data.compliance.jurisdiction.clone(),
                incorporation_date: data.compliance.incorporation_date.clone(),
                patent_count: data.compliance.patent_count,
                regulation_mentions: data.compliance.regulation_mentions,
            },
            knowledge: KnowledgeSynthesis {
                summary: compose_summary(profile),
                risks: assess_risks(data),
                data_gaps: data_gaps(data),
                source_links: data.sentiment.sources.known_ref().cloned().unwrap_or_default(),
                provenance: profile.provenance.clone(),
            },
        }
    }
}

fn compose_summary(profile: &MergedProfile) -> String {
    let data = &profile.data;
    let mut summary = String::new();

    let name = data
        .company
        .name
        .known_ref()
        .cloned()
        .unwrap_or_else(|| profile.identity.name.clone());
    match data.company.description.known_ref() {
        Some(description) => summary.push_str(&format!("{name}: {description}\n")),
        None => summary.push_str(&format!("{name}: no public description found.\n")),
    }

    match (data.market.size_usd.known_ref(), data.market.cagr.known_ref()) {
        (Some(size), Some(cagr)) => summary.push_str(&format!(
            "Market: {} growing at {:.1}% a year.\n",
            format_usd(*size),
            cagr * 100.0
        )),
        (Some(size), None) => {
            summary.push_str(&format!("Market: {} (growth rate unknown).\n", format_usd(*size)))
        }
        _ => summary.push_str("Market: sizing unavailable.\n"),
    }

    if let Field::Known(stage) = &data.funding.stage {
        summary.push_str(&format!("Funding: last round {stage}"));
        if let Field::Known(quality) = &data.funding.investor_quality {
            summary.push_str(&format!(", investor quality {quality}"));
        }
        summary.push_str(".\n");
    }

    if !data.founders.is_empty() {
        let leaders = data
            .founders
            .iter()
            .filter(|founder| founder.leadership_experience == Field::Known(true))
            .count();
        summary.push_str(&format!(
            "Team: {} founder(s) on record, {} with prior leadership roles.\n",
            data.founders.len(),
            leaders
        ));
    }

    if let Field::Known(overall) = &data.sentiment.overall {
        let count = data.sentiment.article_count.known_ref().copied().unwrap_or(0);
        summary.push_str(&format!(
            "Press sentiment: {overall} across {count} recent article(s).\n"
        ));
    }

    summary
}

fn assess_risks(data: &PartialPayload) -> Vec<String> {
    let mut risks = Vec::new();
    if let Field::Known(average) = data.sentiment.average {
        if average < -0.2 {
            risks.push("recent press sentiment is negative".to_string());
        }
    }
    if let Field::Known(count) = data.competition.competitor_count {
        if count > 20 {
            risks.push("crowded competitive field".to_string());
        }
    }
    if data.funding.stage.is_unknown() {
        risks.push("no funding signal on record".to_string());
    }
    if let Field::Known(mentions) = data.compliance.regulation_mentions {
        if mentions > 0 {
            risks.push("regulatory attention in public filings".to_string());
        }
    }
    risks
}

/// Key fields still `Unknown` after resolution, so a consumer can see what
/// the numbers do not cover.
fn data_gaps(data: &PartialPayload) -> Vec<String> {
    let mut gaps = Vec::new();
    let mut check = |unknown: bool, path: &str| {
        if unknown {
            gaps.push(path.to_string());
        }
    };
    check(data.market.size_usd.is_unknown(), "market.size_usd");
    check(data.market.cagr.is_unknown(), "market.cagr");
    check(data.competition.competitor_count.is_unknown(), "competition.competitor_count");
    check(data.sentiment.average.is_unknown(), "sentiment.average");
    check(data.funding.stage.is_unknown(), "funding.stage");
    check(data.product.pmf.is_unknown(), "product.pmf");
    check(data.compliance.jurisdiction.is_unknown(), "compliance.jurisdiction");
    check(data.founders.is_empty(), "founders");
    gaps
}

fn format_usd(value: f64) -> String {
    if value >= 1e9 {
        format!("${:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.1}M", value / 1e6)
    } else {
        format!("${value:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_usd_scales_units() {
        assert_eq!(format_usd(10_600_000_000.0), "$10.6B");
        assert_eq!(format_usd(25_000_000.0), "$25.0M");
        assert_eq!(format_usd(950.0), "$950");
    }
}
