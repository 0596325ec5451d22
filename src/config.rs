use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Credential slots for the supported providers.
///
/// A slot left empty deactivates only that provider's adapter; it is never
/// an error. The corporate registry token is optional even for an active
/// adapter, it only lifts rate limits.
#[derive(Debug, Clone, Default)]
pub struct ApiCredentials {
    pub serpapi_key: Option<String>,
    pub newsapi_key: Option<String>,
    pub crunchbase_key: Option<String>,
    pub producthunt_token: Option<String>,
    pub proxycurl_key: Option<String>,
    pub opencorporates_token: Option<String>,
}

impl ApiCredentials {
    pub fn from_env() -> Self {
        Self {
            serpapi_key: env::var("SERPAPI_KEY").ok(),
            newsapi_key: env::var("NEWSAPI_KEY").ok(),
            crunchbase_key: env::var("CRUNCHBASE_KEY").ok(),
            producthunt_token: env::var("PRODUCTHUNT_TOKEN").ok(),
            proxycurl_key: env::var("PROXYCURL_API_KEY").ok(),
            opencorporates_token: env::var("OPENCORPORATES_APP_TOKEN").ok(),
        }
    }

    /// A slot counts as present only when it holds a non-empty value.
    pub fn present(slot: &Option<String>) -> Option<&str> {
        slot.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Policy for breaking ties between adapters of equal trust rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// The more recently fetched value wins; equal timestamps fall back to
    /// the fixed source order.
    #[default]
    PreferRecent,
    /// The adapter listed earlier in the resolver's fixed order wins.
    PreferFixedOrder,
}

/// Output range for the Founder-Idea Fit Score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FifsRange {
    #[default]
    ZeroToOne,
    /// Scores rescaled to [-1, 1].
    SymmetricUnit,
}

/// Runtime options for one collection run.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub output_dir: PathBuf,
    pub user_agent: String,
    /// Timeout applied to each individual HTTP request.
    pub request_timeout: Duration,
    /// Budget for one adapter's whole fetch; expiry cancels only that adapter.
    pub source_timeout: Duration,
    pub cache_ttl: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub tie_break: TieBreak,
    pub fifs_range: FifsRange,
    pub credentials: ApiCredentials,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            user_agent: "startup-collector/0.1".to_string(),
            request_timeout: Duration::from_secs(20),
            source_timeout: Duration::from_secs(45),
            cache_ttl: Duration::from_secs(900),
            max_retries: 2,
            retry_delay: Duration::from_secs(2),
            tie_break: TieBreak::default(),
            fifs_range: FifsRange::default(),
            credentials: ApiCredentials::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn load_from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var("OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(timeout) = env_secs("REQUEST_TIMEOUT") {
            config.request_timeout = timeout;
        }
        if let Some(timeout) = env_secs("SOURCE_TIMEOUT") {
            config.source_timeout = timeout;
        }
        if let Some(ttl) = env_secs("CACHE_TTL") {
            config.cache_ttl = ttl;
        }
        if let Some(retries) = env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()) {
            config.max_retries = retries;
        }
        config.credentials = ApiCredentials::from_env();
        config
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}
