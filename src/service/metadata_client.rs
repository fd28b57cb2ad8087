use crate::api::GoogleBooksApi;
use crate::config::{MetadataConfig, USER_AGENT};
use crate::error::{IsRetryable, LookupError, ShelfError};
use crate::isbn::Isbn;
use crate::service::circuit_breaker::CircuitBreaker;
use crate::types::BookMetadata;
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Why a lookup degraded to placeholder metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackInfo {
    pub error: LookupError,
    pub warning: String,
    pub retry_later: bool,
}

impl FallbackInfo {
    fn from_error(error: LookupError) -> Self {
        let warning = format!(
            "Could not retrieve book information from Google Books API: {}. \
             Basic book record created.",
            error.user_message().trim_end_matches('.')
        );
        Self {
            retry_later: error.should_retry_later(),
            warning,
            error,
        }
    }
}

/// Metadata ready to persist, with a note when it is only a placeholder.
#[derive(Debug, Clone)]
pub struct MetadataLookup {
    pub metadata: BookMetadata,
    pub fallback: Option<FallbackInfo>,
}

impl MetadataLookup {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Google Books client with rate limiting, retries and a circuit breaker.
///
/// Cheap to clone; the limiter and breaker are shared between clones.
#[derive(Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    cfg: MetadataConfig,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    breaker: Arc<CircuitBreaker>,
}

impl MetadataClient {
    pub fn new(cfg: MetadataConfig, proxy: Option<&Url>) -> Result<Self, ShelfError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(cfg.timeout())
            .timeout(cfg.timeout());
        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }
        let http = builder.build()?;

        let limiter = Quota::with_period(cfg.min_request_interval())
            .map(|q| Arc::new(RateLimiter::direct(q)));
        let breaker = Arc::new(CircuitBreaker::new(
            cfg.breaker_threshold,
            cfg.breaker_timeout(),
        ));
        info!(
            api_url = %cfg.api_url,
            max_attempts = cfg.max_attempts,
            breaker_threshold = cfg.breaker_threshold,
            "metadata client ready"
        );
        Ok(Self {
            http,
            cfg,
            limiter,
            breaker,
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.cfg.retry_base_delay())
            .with_max_delay(self.cfg.retry_max_delay())
            .with_factor(2.0)
            .with_max_times(self.cfg.max_attempts.saturating_sub(1))
    }

    async fn attempt(&self, isbn: &Isbn) -> Result<BookMetadata, LookupError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        let volumes = self
            .breaker
            .call(|| {
                GoogleBooksApi::search_by_isbn(
                    &self.http,
                    &self.cfg.api_url,
                    self.cfg.api_key.as_deref(),
                    isbn,
                )
            })
            .await?;
        let info = volumes.first_volume().ok_or(LookupError::NotFound)?;
        Ok(BookMetadata::from(info))
    }

    /// Fetch metadata for `isbn`, retrying transient failures.
    pub async fn lookup(&self, isbn: &Isbn) -> Result<BookMetadata, LookupError> {
        let meta = (|| async { self.attempt(isbn).await })
            .retry(self.retry_policy())
            .when(|e: &LookupError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!(isbn = %isbn, error = %err, "google books lookup retrying after {:?}", dur);
            })
            .await?;
        debug!(isbn = %isbn, title = ?meta.title, "google books lookup succeeded");
        Ok(meta)
    }

    /// Like [`lookup`](Self::lookup), but never fails: any error yields placeholder metadata.
    pub async fn lookup_with_fallback(&self, isbn: &Isbn) -> MetadataLookup {
        match self.lookup(isbn).await {
            Ok(metadata) => MetadataLookup {
                metadata,
                fallback: None,
            },
            Err(e) => {
                warn!(isbn = %isbn, error = %e, "using fallback metadata");
                MetadataLookup {
                    metadata: BookMetadata::fallback(isbn),
                    fallback: Some(FallbackInfo::from_error(e)),
                }
            }
        }
    }
}
