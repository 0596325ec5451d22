use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use backoff::backoff::Backoff;
use backoff::exponential::ExponentialBackoff;
use reqwest::{Client, Method};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::types::{CollectorError, Result};

struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

/// HTTP client with an in-memory response cache keyed by request shape.
///
/// Within the TTL a repeated request returns the stored body without I/O,
/// which keeps the fan-out polite towards rate-limited providers. Failures
/// are never cached.
pub struct CachedClient {
    client: Client,
    cache: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl CachedClient {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            cache: RwLock::new(HashMap::new()),
            ttl: config.cache_ttl,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// Returns the cached response for `key` when younger than `ttl`,
    /// otherwise awaits `fetch_fn` and stores its result on success.
    ///
    /// The cache lock is never held across the fetch await.
    pub async fn get_or_fetch<F, Fut>(&self, key: String, ttl: Duration, fetch_fn: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if entry.stored_at.elapsed() < ttl {
                    debug!(key = %key, "cache hit");
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = fetch_fn().await?;

        let mut cache = self.cache.write().await;
        cache.insert(
            key,
            CacheEntry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// GET a JSON document, with caching and bounded retries. Headers do not
    /// participate in the cache key.
    pub async fn get_json(
        &self,
        url: &str,
        params: &[(&str, String)],
        headers: &[(&str, String)],
    ) -> Result<Value> {
        let key = request_key("GET", url, params, None);
        self.get_or_fetch(key, self.ttl, || {
            self.request_with_retry(Method::GET, url, params, None, headers)
        })
        .await
    }

    /// POST a JSON body, with caching and bounded retries.
    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, String)],
    ) -> Result<Value> {
        let key = request_key("POST", url, &[], Some(body));
        self.get_or_fetch(key, self.ttl, || {
            self.request_with_retry(Method::POST, url, &[], Some(body), headers)
        })
        .await
    }

    async fn request_with_retry(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
        headers: &[(&str, String)],
    ) -> Result<Value> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: self.retry_delay,
            initial_interval: self.retry_delay,
            max_interval: self.retry_delay * 16,
            multiplier: 2.0,
            max_elapsed_time: Some(self.retry_delay * 60),
            ..Default::default()
        };

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.request_once(method.clone(), url, params, body, headers).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    warn!(url = %url, attempt = attempt + 1, error = %err, "request failed");
                    last_error = Some(err);
                    if attempt < self.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| CollectorError::General(format!("request to {url} failed"))))
    }

    async fn request_once(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
        headers: &[(&str, String)],
    ) -> Result<Value> {
        let mut request = self.client.request(method, url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Deterministic cache key: method, URL, sorted query parameters, and body.
fn request_key(method: &str, url: &str, params: &[(&str, String)], body: Option<&Value>) -> String {
    let mut sorted: Vec<(&str, &str)> = params
        .iter()
        .map(|(name, value)| (*name, value.as_str()))
        .collect();
    sorted.sort();
    serde_json::json!({
        "method": method,
        "url": url,
        "params": sorted,
        "body": body,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_key_ignores_parameter_order() {
        let a = request_key(
            "GET",
            "https://example.com",
            &[("b", "2".into()), ("a", "1".into())],
            None,
        );
        let b = request_key(
            "GET",
            "https://example.com",
            &[("a", "1".into()), ("b", "2".into())],
            None,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn request_key_distinguishes_method_and_body() {
        let get = request_key("GET", "https://example.com", &[], None);
        let post = request_key(
            "POST",
            "https://example.com",
            &[],
            Some(&serde_json::json!({"q": "x"})),
        );
        assert_ne!(get, post);
    }
}
