use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::fetcher::CachedClient;
use crate::traits::DataSource;
use crate::types::{CompanyIdentity, Field, PartialPayload, Result, SourceId};

const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";

const POSITIVE_WORDS: &[&str] = &[
    "growth",
    "record",
    "expansion",
    "partnership",
    "award",
    "funding",
    "increase",
    "positive",
    "leader",
];

const NEGATIVE_WORDS: &[&str] = &[
    "scam",
    "fraud",
    "lawsuit",
    "decline",
    "layoff",
    "negative",
    "loss",
    "risk",
    "slowdown",
];

/// News adapter scoring recent press coverage with a keyword lexicon.
pub struct NewsSource {
    client: Arc<CachedClient>,
    api_key: String,
}

impl NewsSource {
    pub fn new(client: Arc<CachedClient>, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl DataSource for NewsSource {
    fn source_id(&self) -> SourceId {
        SourceId::NewsApi
    }

    async fn fetch(&self, identity: &CompanyIdentity) -> Result<PartialPayload> {
        let keyword = if identity.name.is_empty() {
            identity.domain.as_deref().unwrap_or_default()
        } else {
            identity.name.as_str()
        };
        let params = [
            ("q", keyword.to_string()),
            ("language", "en".to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", "20".to_string()),
            ("apiKey", self.api_key.clone()),
        ];
        let data = self.client.get_json(EVERYTHING_URL, &params, &[]).await?;

        let empty = Vec::new();
        let articles = data["articles"].as_array().unwrap_or(&empty);
        let mut scores = Vec::new();
        let mut links = Vec::new();
        for article in articles {
            let text = [&article["title"], &article["description"], &article["content"]]
                .iter()
                .filter_map(|part| part.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                continue;
            }
            scores.push(sentiment_score(&text));
            if let Some(url) = article["url"].as_str() {
                links.push(url.to_string());
            }
        }

        let average = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        let label = if average > 0.2 {
            "Positive"
        } else if average < -0.2 {
            "Negative"
        } else {
            "Neutral"
        };
        debug!(company = %identity.name, articles = scores.len(), average, "scored news sentiment");

        links.truncate(10);
        let mut payload = PartialPayload::default();
        payload.sentiment.overall = Field::Known(label.to_string());
        payload.sentiment.average = Field::Known((average * 1000.0).round() / 1000.0);
        payload.sentiment.article_count = Field::Known(scores.len() as u32);
        payload.sentiment.sources = Field::Known(links);
        Ok(payload)
    }
}

/// Net lexicon polarity in [-1, 1]; 0 when no lexicon word occurs.
fn sentiment_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let count = |words: &[&str]| -> i64 {
        words
            .iter()
            .map(|word| lower.matches(word).count() as i64)
            .sum()
    };
    let positive = count(POSITIVE_WORDS);
    let negative = count(NEGATIVE_WORDS);
    let total = positive + negative;
    if total == 0 {
        0.0
    } else {
        (positive - negative) as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_score_balances_lexicons() {
        assert!(sentiment_score("record growth and a major partnership") > 0.9);
        assert!(sentiment_score("lawsuit after layoff round") < -0.9);
        assert_eq!(sentiment_score("the weather was mild"), 0.0);
    }

    #[test]
    fn mixed_text_scores_between_poles() {
        let score = sentiment_score("funding secured despite lawsuit");
        assert!(score.abs() < 1.0);
    }
}
