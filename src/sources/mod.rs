use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::ApiCredentials;
use crate::fetcher::CachedClient;
use crate::traits::DataSource;

pub mod crunchbase;
pub mod news;
pub mod open_corporates;
pub mod product_hunt;
pub mod profile_lookup;
pub mod serp;

pub use crunchbase::CrunchbaseSource;
pub use news::NewsSource;
pub use open_corporates::OpenCorporatesSource;
pub use product_hunt::ProductHuntSource;
pub use profile_lookup::ProfileLookupSource;
pub use serp::SerpSource;

/// Credential resolver: constructs exactly the adapters whose credential
/// slots hold a value, in a fixed deterministic order.
///
/// A missing credential deactivates only that provider; it never fails the
/// run. The corporate registry works without a token, so it is always
/// active and the token is passed through when present.
pub fn active_sources(
    credentials: &ApiCredentials,
    client: Arc<CachedClient>,
) -> Vec<Box<dyn DataSource>> {
    let mut sources: Vec<Box<dyn DataSource>> = Vec::new();

    if let Some(key) = ApiCredentials::present(&credentials.serpapi_key) {
        sources.push(Box::new(SerpSource::new(client.clone(), key.to_string())));
    }
    if let Some(key) = ApiCredentials::present(&credentials.newsapi_key) {
        sources.push(Box::new(NewsSource::new(client.clone(), key.to_string())));
    }
    if let Some(key) = ApiCredentials::present(&credentials.crunchbase_key) {
        sources.push(Box::new(CrunchbaseSource::new(client.clone(), key.to_string())));
    }
    if let Some(token) = ApiCredentials::present(&credentials.producthunt_token) {
        sources.push(Box::new(ProductHuntSource::new(client.clone(), token.to_string())));
    }
    if let Some(key) = ApiCredentials::present(&credentials.proxycurl_key) {
        sources.push(Box::new(ProfileLookupSource::new(client.clone(), key.to_string())));
    }
    sources.push(Box::new(OpenCorporatesSource::new(
        client,
        ApiCredentials::present(&credentials.opencorporates_token).map(str::to_string),
    )));

    info!(active = sources.len(), "resolved active data sources");
    sources
}

// Shared response-mapping helpers -----------------------------------------

/// Hostname of a URL, tolerating bare domains without a scheme.
pub(crate) fn extract_domain(raw: &str) -> Option<String> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    url::Url::parse(&candidate)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}

/// Leading four-digit year of a date string such as "2019-04-01".
pub(crate) fn parse_year(value: &str) -> Option<i32> {
    value.get(..4).and_then(|year| year.parse().ok())
}

/// Numeric value that some providers return as a string with separators.
pub(crate) fn as_f64_lenient(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.replace(',', "").trim().parse().ok(),
        _ => None,
    }
}

/// "series_a" -> "Series A".
pub(crate) fn title_case(raw: &str) -> String {
    raw.split(['_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Two-decimal rounding for ratios surfaced in payloads.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_domain_handles_bare_hosts() {
        assert_eq!(extract_domain("scam.ai"), Some("scam.ai".to_string()));
        assert_eq!(
            extract_domain("https://www.scam.ai/about"),
            Some("www.scam.ai".to_string())
        );
    }

    #[test]
    fn title_case_normalizes_funding_stages() {
        assert_eq!(title_case("series_a"), "Series A");
        assert_eq!(title_case("seed"), "Seed");
    }

    #[test]
    fn lenient_numbers_accept_strings() {
        assert_eq!(as_f64_lenient(&Value::String("1,234".into())), Some(1234.0));
        assert_eq!(as_f64_lenient(&serde_json::json!(12)), Some(12.0));
        assert_eq!(as_f64_lenient(&Value::Null), None);
    }
}
