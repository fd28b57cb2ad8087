use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

pub const GOOGLE_BOOKS_VOLUMES_URL: &str = "https://www.googleapis.com/books/v1/volumes";
pub const USER_AGENT: &str = "BookManager/1.0";

/// Runtime configuration.
///
/// Layered as: built-in defaults, then `config.toml` (if present), then
/// `BOOKSHELF_*` environment variables. Nested keys use `__`, e.g.
/// `BOOKSHELF_METADATA__API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Cookie encryption key material; at least 64 bytes or a random key is used.
    pub secret_key: Option<String>,
    pub proxy: Option<Url>,
    pub metadata: MetadataConfig,
}

/// Lookup API and resilience tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub api_url: Url,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub min_request_interval_ms: u64,
    /// Total attempts per lookup, including the first.
    pub max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub breaker_threshold: u32,
    pub breaker_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8000".to_string(),
            database_url: "sqlite:books.db".to_string(),
            loglevel: "info".to_string(),
            secret_key: None,
            proxy: None,
            metadata: MetadataConfig::default(),
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(GOOGLE_BOOKS_VOLUMES_URL).expect("valid built-in URL"),
            api_key: None,
            timeout_secs: 10,
            min_request_interval_ms: 100,
            max_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 8000,
            breaker_threshold: 5,
            breaker_timeout_secs: 300,
        }
    }
}

impl MetadataConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms.max(self.retry_base_delay_ms))
    }

    pub fn breaker_timeout(&self) -> Duration {
        Duration::from_secs(self.breaker_timeout_secs)
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("BOOKSHELF_").split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| panic!("invalid bookshelf configuration: {e}"))
});
