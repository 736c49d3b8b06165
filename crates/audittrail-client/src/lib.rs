//! AuditTrail API client
//!
//! This crate provides a thin async client for the AuditTrail audit-logging
//! service: bearer-token authentication, JSON encoding of log entries, and a
//! bounded retry policy with capped exponential backoff.
//!
//! # Examples
//! ```no_run
//! use audittrail_client::{AuditClient, Details};
//! use std::collections::HashMap;
//!
//! async fn example() -> audittrail_client::Result<()> {
//!     let client = AuditClient::from_parts("https://api.example.com", "jwt-token")?;
//!
//!     let mut details = Details::new();
//!     details.insert("ip".to_string(), "192.168.1.1".into());
//!     let created = client.create_log("login", Some(details)).await?;
//!     println!("created: {:?}", created);
//!
//!     let mut params = HashMap::new();
//!     params.insert("page".to_string(), "1".to_string());
//!     let page = client.list_logs(&params).await?;
//!     println!("{} logs in total", page.count);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod retry;
pub mod types;

pub use client::AuditClient;
pub use config::{ClientConfig, RequestIdPolicy};
pub use retry::RetryPolicy;
pub use types::{CreateLogRequest, Details, LogEntry, LogListResponse};

/// Result type for AuditTrail client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for AuditTrail client operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client could not be constructed from the given configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An HTTP exchange failed and no further retries were allowed
    #[error("Failed to {operation} after {attempts} attempt(s): {source}")]
    Request {
        /// Logical operation, e.g. "create log"
        operation: &'static str,
        /// Number of HTTP exchanges performed
        attempts: usize,
        /// Failure of the last attempt
        #[source]
        source: RequestError,
    },
}

impl Error {
    /// Check if this is a construction-time configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }

    /// Get the underlying request failure, if any
    pub fn request_error(&self) -> Option<&RequestError> {
        match self {
            Error::Request { source, .. } => Some(source),
            Error::Config(_) => None,
        }
    }

    /// Number of HTTP exchanges performed before giving up
    pub fn attempts(&self) -> Option<usize> {
        match self {
            Error::Request { attempts, .. } => Some(*attempts),
            Error::Config(_) => None,
        }
    }
}

/// Invalid client configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Base URL was empty
    #[error("base URL is required")]
    MissingBaseUrl,

    /// Base URL is not an absolute URL usable as a base
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The rejected input
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A configured value cannot be sent as an HTTP header
    #[error("invalid value for header {name}: {reason}")]
    InvalidHeader {
        /// Header name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// The HTTP transport could not be built
    #[error("failed to build HTTP client: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Failure of a single HTTP exchange
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Connection, timeout or transfer failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Request or response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RequestError {
    /// HTTP status code, when the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Network(err) => err.status().map(|s| s.as_u16()),
            RequestError::Json(_) => None,
        }
    }

    /// Check if this failure is transient and the exchange may be retried
    ///
    /// Network failures and the statuses accepted by
    /// [`retry::is_retryable_status`] are retried. Other statuses and JSON
    /// failures are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            RequestError::Network(err) => !(err.is_builder() || err.is_redirect()),
            RequestError::Status { status, .. } => retry::is_retryable_status(*status),
            RequestError::Json(_) => false,
        }
    }
}
