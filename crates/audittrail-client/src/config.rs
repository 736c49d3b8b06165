//! Client configuration
//!
//! Everything the client needs is supplied by the embedding application; no
//! environment variables or files are read.

use crate::retry::RetryPolicy;
use crate::ConfigError;
use reqwest::Url;
use std::fmt;
use std::time::Duration;

/// How `X-Request-ID` values are assigned across retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestIdPolicy {
    /// Every HTTP exchange, retries included, gets a fresh identifier
    #[default]
    PerAttempt,
    /// All attempts of one logical call share a single identifier
    PerCall,
}

/// Configuration for [`AuditClient`](crate::AuditClient)
///
/// # Examples
/// ```
/// use audittrail_client::{ClientConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://api.example.com", "jwt-token")
///     .with_timeout(Duration::from_secs(5))
///     .with_retry(RetryPolicy::new(5));
///
/// assert_eq!(config.retry.max_retries, 5);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base service URL (e.g., "https://api.example.com")
    pub base_url: String,
    /// Bearer credential sent with every request
    pub token: String,
    /// Per-exchange timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Retry behavior
    pub retry: RetryPolicy,
    /// Correlation identifier assignment
    pub request_id_policy: RequestIdPolicy,
}

impl ClientConfig {
    /// Create a config with default transport settings
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            user_agent: format!("audittrail-client/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryPolicy::default(),
            request_id_policy: RequestIdPolicy::default(),
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set how correlation identifiers are assigned
    pub fn with_request_id_policy(mut self, policy: RequestIdPolicy) -> Self {
        self.request_id_policy = policy;
        self
    }

    /// Parse and check the base URL
    pub fn parsed_base_url(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.base_url)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("retry", &self.retry)
            .field("request_id_policy", &self.request_id_policy)
            .finish()
    }
}

/// Validate a base URL: non-empty, absolute, and able to carry a path
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingBaseUrl);
    }

    let url = Url::parse(trimmed).map_err(|e| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "URL cannot be used as a base".to_string(),
        });
    }

    Ok(url)
}
