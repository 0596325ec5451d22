use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::fetcher::CachedClient;
use crate::traits::DataSource;
use crate::types::{CompanyIdentity, Field, PartialPayload, Result, SourceId};

const GRAPHQL_URL: &str = "https://api.producthunt.com/v2/api/graphql";

const POST_QUERY: &str = r#"
query ProductSignal($term: String!) {
  posts(order: RANKING, first: 1, query: $term) {
    edges {
      node {
        name
        tagline
        votesCount
        commentsCount
        featuredAt
        reviewsRating
      }
    }
  }
}
"#;

/// Product-launch platform adapter: community traction signals for the
/// company's highest-ranked launch.
pub struct ProductHuntSource {
    client: Arc<CachedClient>,
    token: String,
}

impl ProductHuntSource {
    pub fn new(client: Arc<CachedClient>, token: String) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl DataSource for ProductHuntSource {
    fn source_id(&self) -> SourceId {
        SourceId::ProductHunt
    }

    async fn fetch(&self, identity: &CompanyIdentity) -> Result<PartialPayload> {
        let body = json!({
            "query": POST_QUERY,
            "variables": {"term": identity.name},
        });
        let headers = [
            ("Authorization", format!("Bearer {}", self.token)),
            ("Content-Type", "application/json".to_string()),
        ];
        let data = self.client.post_json(GRAPHQL_URL, &body, &headers).await?;

        let mut payload = PartialPayload::default();
        let Some(node) = data["data"]["posts"]["edges"][0].get("node") else {
            debug!(company = %identity.name, "no launch found");
            return Ok(payload);
        };

        let votes = node["votesCount"].as_u64().unwrap_or(0);
        let comments = node["commentsCount"].as_u64().unwrap_or(0);
        let rating = node["reviewsRating"].as_f64().unwrap_or(0.0);
        let featured = node["featuredAt"].as_str().is_some();
        debug!(company = %identity.name, votes, comments, rating, "mapped launch signals");

        let product = &mut payload.product;
        product.tagline = node["tagline"].as_str().map(str::to_string).into();
        product.pmf = Field::Known(pmf_from_votes(votes, rating));
        product.innovation_mentions = Field::Known(
            if rating >= 3.5 { "Often" } else { "Sometimes" }.to_string(),
        );
        product.frontier_tech_usage = Field::Known(
            if votes > 200 { "Emphasized" } else { "Mentioned" }.to_string(),
        );
        product.reviews = Field::Known(
            if rating >= 3.5 { "Positive" } else { "Mixed" }.to_string(),
        );
        product.pivot_history = Field::Known(
            if comments > 10 { "Sometimes" } else { "Rarely" }.to_string(),
        );
        // A launch featured within the platform's ranking window implies a
        // higher release cadence.
        product.release_frequency_per_quarter = Field::Known(if featured { 6.0 } else { 2.0 });

        Ok(payload)
    }
}

fn pmf_from_votes(votes: u64, rating: f64) -> String {
    let score = votes as f64 + rating * 20.0;
    if score > 500.0 {
        "Strong".to_string()
    } else if score > 150.0 {
        "Moderate".to_string()
    } else {
        "Weak".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pmf_thresholds() {
        assert_eq!(pmf_from_votes(600, 0.0), "Strong");
        assert_eq!(pmf_from_votes(200, 2.0), "Moderate");
        assert_eq!(pmf_from_votes(10, 1.0), "Weak");
    }
}
