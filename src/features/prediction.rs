use serde::{Deserialize, Serialize};

use crate::types::{CompanySection, Field, HiringSection, MergedProfile, ProductSection};

/// Member of every categorical domain marking an underivable slot.
pub const CATEGORICAL_UNKNOWN: &str = "Unknown";

/// The fixed enumeration of 14 categorical slots consumed by the
/// prediction models, one column each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFeatures {
    pub industry_growth: String,
    pub market_size: String,
    pub growth_speed: String,
    pub market_adaptability: String,
    pub execution_capability: String,
    pub funding_amount: String,
    pub valuation_trend: String,
    pub investor_quality: String,
    pub pmf_strength: String,
    pub innovation_mentions: String,
    pub frontier_tech_usage: String,
    pub timing: String,
    pub sentiment: String,
    pub reviews: String,
}

/// Builds the categorical prediction slots. Every slot is a pure rule over
/// merged fields; a slot whose inputs are all `Unknown` stays `Unknown`.
pub struct PredictionBlock;

impl PredictionBlock {
    pub fn build(&self, profile: &MergedProfile) -> PredictionFeatures {
        let data = &profile.data;
        PredictionFeatures {
            industry_growth: industry_growth(&data.company),
            market_size: categorical(&data.company.market_size),
            growth_speed: growth_speed(&data.company, &data.hiring),
            market_adaptability: categorical(&data.product.pivot_history),
            execution_capability: execution_capability(&data.product, &data.hiring),
            funding_amount: categorical(&data.funding.stage),
            valuation_trend: categorical(&data.funding.valuation_trend),
            investor_quality: categorical(&data.funding.investor_quality),
            pmf_strength: categorical(&data.product.pmf),
            innovation_mentions: categorical(&data.product.innovation_mentions),
            frontier_tech_usage: categorical(&data.product.frontier_tech_usage),
            timing: categorical(&data.company.timing),
            sentiment: categorical(&data.sentiment.overall),
            reviews: categorical(&data.product.reviews),
        }
    }
}

fn categorical(field: &Field<String>) -> String {
    field
        .known_ref()
        .cloned()
        .unwrap_or_else(|| CATEGORICAL_UNKNOWN.to_string())
}

fn industry_growth(company: &CompanySection) -> String {
    if let Field::Known(trend) = &company.industry_growth {
        return trend.clone();
    }
    match company.market_growth_rate {
        Field::Known(rate) if rate >= 0.15 => "Yes".to_string(),
        Field::Known(rate) if rate <= 0.0 => "No".to_string(),
        Field::Known(_) => "N/A".to_string(),
        Field::Unknown => CATEGORICAL_UNKNOWN.to_string(),
    }
}

/// Blend of product update cadence and hiring velocity.
fn growth_speed(company: &CompanySection, hiring: &HiringSection) -> String {
    let updates = company.update_frequency_per_month.known_ref().copied();
    let hires = hiring
        .net_new_roles_last_quarter
        .known_ref()
        .map(|count| *count as f64);
    if updates.is_none() && hires.is_none() {
        return CATEGORICAL_UNKNOWN.to_string();
    }
    let score = updates.unwrap_or(0.0) * 0.6 + hires.unwrap_or(0.0) * 0.4;
    if score > 8.0 {
        "Faster".to_string()
    } else if score < 3.0 {
        "Slower".to_string()
    } else {
        "Same".to_string()
    }
}

/// Release cadence plus seniority of recent hires.
fn execution_capability(product: &ProductSection, hiring: &HiringSection) -> String {
    let releases = product.release_frequency_per_quarter.known_ref().copied();
    let senior_ratio = hiring.senior_ratio.known_ref().copied();
    if releases.is_none() && senior_ratio.is_none() {
        return CATEGORICAL_UNKNOWN.to_string();
    }
    let mut score = 0.0;
    if let Some(releases) = releases {
        score += releases / 4.0;
    }
    if let Some(ratio) = senior_ratio {
        score += ratio * 2.0;
    }
    if score > 1.6 {
        "Excellent".to_string()
    } else if score < 0.8 {
        "Poor".to_string()
    } else {
        "Average".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_speed_requires_at_least_one_signal() {
        let company = CompanySection::default();
        let hiring = HiringSection::default();
        assert_eq!(growth_speed(&company, &hiring), CATEGORICAL_UNKNOWN);
    }

    #[test]
    fn industry_growth_thresholds() {
        let mut company = CompanySection::default();
        company.market_growth_rate = Field::Known(0.3);
        assert_eq!(industry_growth(&company), "Yes");
        company.market_growth_rate = Field::Known(-0.1);
        assert_eq!(industry_growth(&company), "No");
        company.market_growth_rate = Field::Known(0.05);
        assert_eq!(industry_growth(&company), "N/A");
    }
}
