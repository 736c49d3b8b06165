//! AuditTrail HTTP client
//!
//! Wraps a preconfigured `reqwest::Client` (bearer auth and JSON content type
//! as default headers) and runs every exchange through the retry loop.

use crate::config::{ClientConfig, RequestIdPolicy};
use crate::retry::{self, RetryPolicy};
use crate::types::{CreateLogRequest, Details, LogListResponse};
use crate::{ConfigError, Error, RequestError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// Log creation endpoint, relative to the base URL
pub const CREATE_LOG_PATH: &str = "/api/logs/";

/// Log listing endpoint, relative to the base URL
pub const LIST_LOGS_PATH: &str = "/api/logs/list/";

/// Correlation header attached to every exchange
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest error body kept in [`RequestError::Status`], in bytes
pub const MAX_ERROR_BODY_LEN: usize = 1024;

/// One logical API call, possibly sent several times
#[derive(Debug)]
struct ApiCall<'a> {
    operation: &'static str,
    method: Method,
    url: &'a Url,
    params: Option<&'a HashMap<String, String>>,
    body: Option<Vec<u8>>,
}

/// Client for the AuditTrail API
///
/// Cheap to clone; clones share the connection pool.
///
/// # Examples
/// ```no_run
/// use audittrail_client::{AuditClient, ClientConfig};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let client = AuditClient::new(ClientConfig::new("https://api.example.com", "jwt-token"))?;
///
///     let response = client.create_log("logout", None).await?;
///     println!("{:?}", response);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuditClient {
    /// HTTP client
    http: ReqwestClient,
    base_url: Url,
    create_url: Url,
    list_url: Url,
    retry: RetryPolicy,
    request_id_policy: RequestIdPolicy,
}

impl AuditClient {
    /// Create a new client
    ///
    /// Validates the configuration and builds the transport. No network I/O
    /// happens here.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.parsed_base_url()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|e| {
            ConfigError::InvalidHeader {
                name: "Authorization",
                reason: e.to_string(),
            }
        })?;
        auth.set_sensitive(true);

        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|e| ConfigError::InvalidHeader {
                name: "User-Agent",
                reason: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(ConfigError::Transport)?;

        Ok(Self {
            http,
            create_url: endpoint(&base_url, CREATE_LOG_PATH),
            list_url: endpoint(&base_url, LIST_LOGS_PATH),
            base_url,
            retry: config.retry,
            request_id_policy: config.request_id_policy,
        })
    }

    /// Create a client with default transport settings
    pub fn from_parts(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(base_url, token))
    }

    /// Record an audit log entry
    ///
    /// `details` is omitted from the request body when `None`. The action is
    /// sent as given; the server decides whether it is acceptable.
    pub async fn create_log(
        &self,
        action: impl Into<String>,
        details: Option<Details>,
    ) -> Result<HashMap<String, String>> {
        let request = CreateLogRequest {
            action: action.into(),
            details,
        };
        self.submit_log(&request).await
    }

    /// Record a prepared log creation request
    pub async fn submit_log(&self, request: &CreateLogRequest) -> Result<HashMap<String, String>> {
        const OPERATION: &str = "create log";

        let body = serde_json::to_vec(request).map_err(|e| Error::Request {
            operation: OPERATION,
            attempts: 0,
            source: RequestError::Json(e),
        })?;

        self.execute(ApiCall {
            operation: OPERATION,
            method: Method::POST,
            url: &self.create_url,
            params: None,
            body: Some(body),
        })
        .await
    }

    /// List audit log entries
    ///
    /// `params` are sent verbatim as query parameters (filters, `page`,
    /// `page_size`, ...). Only the requested page is fetched.
    pub async fn list_logs(&self, params: &HashMap<String, String>) -> Result<LogListResponse> {
        self.execute(ApiCall {
            operation: "list logs",
            method: Method::GET,
            url: &self.list_url,
            params: Some(params),
            body: None,
        })
        .await
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the retry policy
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Get the correlation identifier policy
    pub fn request_id_policy(&self) -> RequestIdPolicy {
        self.request_id_policy
    }

    /// Run a call through the retry loop
    async fn execute<T>(&self, call: ApiCall<'_>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let call_id = Uuid::new_v4();
        let mut attempts = 0;

        let outcome = retry::retry(&self.retry, RequestError::is_retryable, || {
            attempts += 1;
            let request_id = match self.request_id_policy {
                RequestIdPolicy::PerAttempt => Uuid::new_v4(),
                RequestIdPolicy::PerCall => call_id,
            };
            self.send_once(&call, attempts, request_id)
        })
        .await;

        outcome.map_err(|source| {
            debug!(operation = call.operation, attempts, error = %source, "Audit API call failed");
            Error::Request {
                operation: call.operation,
                attempts,
                source,
            }
        })
    }

    /// Perform a single HTTP exchange
    async fn send_once<T>(
        &self,
        call: &ApiCall<'_>,
        attempt: usize,
        request_id: Uuid,
    ) -> std::result::Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        debug!(
            operation = call.operation,
            attempt,
            request_id = %request_id,
            url = %call.url,
            "Sending audit API request"
        );

        let mut req = self
            .http
            .request(call.method.clone(), call.url.clone())
            .header(REQUEST_ID_HEADER, request_id.to_string());

        if let Some(params) = call.params.filter(|p| !p.is_empty()) {
            req = req.query(params);
        }

        if let Some(body) = &call.body {
            req = req.body(body.clone());
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let bytes = response.bytes().await?;

        // 204 and blank 2xx bodies decode as an empty object
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_slice(b"{}")?);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Cut an error body down to [`MAX_ERROR_BODY_LEN`] on a char boundary
fn truncate_body(mut body: String) -> String {
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body;
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body.truncate(end);
    body.push_str("...");
    body
}

/// Join an endpoint path onto the base URL, keeping any base path prefix
fn endpoint(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_query(None);
    url.set_fragment(None);
    url
}
