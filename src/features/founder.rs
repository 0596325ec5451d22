use serde::{Deserialize, Serialize};

use crate::config::FifsRange;
use crate::features::CATEGORICAL_UNKNOWN;
use crate::types::{Field, FounderRecord, MergedProfile};

pub const FOUNDER_LEVELS: [&str; 5] = ["L1", "L2", "L3", "L4", "L5"];

/// One founder's derived row: tier classifications plus the FIFS score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FounderFeatureRow {
    pub name: Field<String>,
    pub education_level: Field<String>,
    pub school_tier: Field<String>,
    pub leadership_experience: Field<bool>,
    pub top_company_experience: Field<bool>,
    pub previous_exits: Field<u32>,
    /// Background strength driving the L1-L5 level classification.
    pub background_score: f64,
    pub fifs: Field<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FounderFeatures {
    /// Team-level L1-L5 classification, `Unknown` without founder data.
    pub founder_level: String,
    pub founder_count: usize,
    pub founders: Vec<FounderFeatureRow>,
    /// Mean FIFS over founders with a computable score; `Unknown` when no
    /// founder could be scored, never 0.
    pub team_fifs: Field<f64>,
}

/// Founder segmentation: tier classifications per founder and the
/// Founder-Idea Fit Score, a bounded blend of role alignment, domain
/// experience, and leadership signal.
pub struct FounderBlock {
    range: FifsRange,
}

impl FounderBlock {
    pub fn new(range: FifsRange) -> Self {
        Self { range }
    }

    pub fn build(&self, profile: &MergedProfile) -> FounderFeatures {
        let founders = &profile.data.founders;
        if founders.is_empty() {
            return FounderFeatures {
                founder_level: CATEGORICAL_UNKNOWN.to_string(),
                founder_count: 0,
                founders: Vec::new(),
                team_fifs: Field::Unknown,
            };
        }

        let rows: Vec<FounderFeatureRow> =
            founders.iter().map(|founder| self.build_row(founder)).collect();

        let scored: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.fifs.known_ref().copied())
            .collect();
        let team_fifs = if scored.is_empty() {
            Field::Unknown
        } else {
            Field::Known(scored.iter().sum::<f64>() / scored.len() as f64)
        };

        FounderFeatures {
            founder_level: founder_level(&rows),
            founder_count: rows.len(),
            team_fifs,
            founders: rows,
        }
    }

    fn build_row(&self, founder: &FounderRecord) -> FounderFeatureRow {
        FounderFeatureRow {
            name: founder.name.clone(),
            education_level: founder.education_level.clone(),
            school_tier: founder.school_tier.clone(),
            leadership_experience: founder.leadership_experience,
            top_company_experience: founder.top_company_experience,
            previous_exits: founder.previous_exits,
            background_score: background_score(founder),
            fifs: self.fifs(founder),
        }
    }

    /// Weighted blend with `Unknown` components excluded and the remaining
    /// weights renormalized; all components `Unknown` yields `Unknown`.
    fn fifs(&self, founder: &FounderRecord) -> Field<f64> {
        let mut weighted = 0.0;
        let mut weights = 0.0;
        if let Field::Known(alignment) = founder.role_alignment {
            weighted += 0.5 * alignment;
            weights += 0.5;
        }
        if let Field::Known(domain) = founder.domain_experience {
            weighted += 0.3 * domain;
            weights += 0.3;
        }
        if let Field::Known(leadership) = founder.leadership_experience {
            weighted += 0.2 * if leadership { 1.0 } else { 0.0 };
            weights += 0.2;
        }
        if weights == 0.0 {
            return Field::Unknown;
        }
        let score = (weighted / weights).clamp(0.0, 1.0);
        Field::Known(match self.range {
            FifsRange::ZeroToOne => score,
            FifsRange::SymmetricUnit => score * 2.0 - 1.0,
        })
    }
}

/// Background credit for one founder; unknown signals contribute nothing.
fn background_score(founder: &FounderRecord) -> f64 {
    let mut score = education_score(&founder.education_level, &founder.school_tier);
    if founder.leadership_experience == Field::Known(true) {
        score += 1.0;
    }
    if founder.top_company_experience == Field::Known(true) {
        score += 1.5;
    }
    if let Field::Known(exits) = founder.previous_exits {
        score += exits.min(2) as f64 * 1.5;
    }
    score
}

fn education_score(level: &Field<String>, tier: &Field<String>) -> f64 {
    let base = match level.known_ref().map(|l| l.to_lowercase()).as_deref() {
        Some("phd") => 2.5,
        Some("masters") => 2.0,
        Some("bachelors") => 1.5,
        Some("associate") => 1.0,
        _ => 0.5,
    };
    let bonus = match tier.known_ref().map(|t| t.to_lowercase()).as_deref() {
        Some("tier-1") => 1.5,
        Some("tier-2") => 1.0,
        Some("tier-3") => 0.5,
        _ => 0.0,
    };
    base + bonus
}

fn founder_level(rows: &[FounderFeatureRow]) -> String {
    let average =
        rows.iter().map(|row| row.background_score).sum::<f64>() / rows.len().max(1) as f64;
    let level = if average >= 5.0 {
        "L5"
    } else if average >= 4.0 {
        "L4"
    } else if average >= 3.0 {
        "L3"
    } else if average >= 1.5 {
        "L2"
    } else {
        "L1"
    };
    level.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong_founder() -> FounderRecord {
        FounderRecord {
            name: Field::Known("Jane Doe".to_string()),
            education_level: Field::Known("PhD".to_string()),
            school_tier: Field::Known("Tier-1".to_string()),
            leadership_experience: Field::Known(true),
            top_company_experience: Field::Known(true),
            previous_exits: Field::Known(1),
            role_alignment: Field::Known(0.8),
            ..FounderRecord::default()
        }
    }

    #[test]
    fn strong_background_classifies_l5() {
        let founder = strong_founder();
        // 2.5 + 1.5 education, 1.0 leadership, 1.5 top company, 1.5 exit.
        assert_eq!(background_score(&founder), 8.0);
        let row = FounderBlock::new(FifsRange::ZeroToOne).build_row(&founder);
        assert_eq!(founder_level(std::slice::from_ref(&row)), "L5");
    }

    #[test]
    fn fifs_renormalizes_over_known_components() {
        let block = FounderBlock::new(FifsRange::ZeroToOne);
        let founder = strong_founder();
        // role 0.5 * 0.8 + leadership 0.2 * 1.0 over weight 0.7.
        let expected = (0.5 * 0.8 + 0.2) / 0.7;
        let fifs = block.fifs(&founder).known().unwrap();
        assert!((fifs - expected).abs() < 1e-9);
    }

    #[test]
    fn fifs_is_unknown_without_any_component() {
        let block = FounderBlock::new(FifsRange::ZeroToOne);
        let founder = FounderRecord {
            name: Field::Known("Sam Lee".to_string()),
            ..FounderRecord::default()
        };
        assert_eq!(block.fifs(&founder), Field::Unknown);
    }

    #[test]
    fn symmetric_range_rescales() {
        let block = FounderBlock::new(FifsRange::SymmetricUnit);
        let founder = FounderRecord {
            role_alignment: Field::Known(1.0),
            ..FounderRecord::default()
        };
        assert_eq!(block.fifs(&founder), Field::Known(1.0));
        let weak = FounderRecord {
            role_alignment: Field::Known(0.0),
            ..FounderRecord::default()
        };
        assert_eq!(block.fifs(&weak), Field::Known(-1.0));
    }
}
