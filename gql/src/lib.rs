//! Client for the platform's persisted-query GraphQL endpoint.
//!
//! # Architecture
//!
//! The endpoint exposes named operations identified by fixed SHA-256 hashes
//! rather than query text. Every request is a POST of the same envelope:
//!
//! ```json
//! {
//!   "extensions": { "persistedQuery": { "sha256Hash": "...", "version": 1 } },
//!   "operationName": "...",
//!   "variables": { ... }
//! }
//! ```
//!
//! carrying the six scraped [`AuthHeaders`]. One operation per module:
//!
//! - [`user`] - resolve a login to a [`UserId`] (`GetUserID`)
//! - [`videos`] - resolve the Nth-most-recent archived broadcast to a
//!   [`StreamWindow`](chatlog_types::StreamWindow) (`FilterableVideoTower_Videos`)
//! - [`chat_log`] - page a sender's chat-log edges
//!   (`ViewerCardModLogsMessagesBySender`)
//!
//! # Error Handling
//!
//! All operations return [`GqlError`]. The endpoint signals a stale or
//! tampered auth bundle out of band from HTTP status (a top-level `"error"`
//! key or a `"failed integrity check"` GraphQL error), which maps to the
//! dedicated [`GqlError::IntegrityCheck`] variant so the UI can tell the
//! user to re-scrape their auth data.

pub mod chat_log;
pub mod retry;
pub mod user;
pub mod videos;

use std::sync::OnceLock;
use std::time::Duration;

use chatlog_types::AuthHeaders;
use serde::Serialize;

/// Canonical GraphQL endpoint.
pub const GQL_API_URL: &str = "https://gql.twitch.tv/gql";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const TCP_KEEPALIVE_SECS: u64 = 60;
const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

pub(crate) fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|e| {
                tracing::error!("Failed to build tuned HTTP client: {e}. Using defaults.");
                reqwest::Client::new()
            })
    })
}

#[derive(Debug, thiserror::Error)]
pub enum GqlError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        source: reqwest::Error,
    },

    #[error("API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed integrity check; auth data is probably out of date")]
    IntegrityCheck,

    #[error("API error: {0}")]
    Api(String),

    #[error("malformed response: missing {0}")]
    MissingData(&'static str),

    #[error("unparsable timestamp {0:?}")]
    BadTimestamp(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("channel has no archived broadcasts")]
    NoBroadcasts,
}

/// A named operation with its fixed persisted-query hash.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Operation {
    pub name: &'static str,
    pub hash: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestBody<'a> {
    extensions: Extensions<'a>,
    operation_name: &'a str,
    variables: serde_json::Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Extensions<'a> {
    persisted_query: PersistedQuery<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedQuery<'a> {
    sha256_hash: &'a str,
    version: u32,
}

/// Handle bundling the endpoint, auth headers, and retry policy.
///
/// Cheap to clone; the underlying HTTP client is process-wide.
#[derive(Debug, Clone)]
pub struct GqlClient {
    endpoint: String,
    headers: AuthHeaders,
    retry: retry::RetryConfig,
}

impl GqlClient {
    #[must_use]
    pub fn new(headers: AuthHeaders) -> Self {
        Self::with_endpoint(headers, GQL_API_URL)
    }

    /// Point the client at a non-default endpoint (tests, proxies).
    #[must_use]
    pub fn with_endpoint(headers: AuthHeaders, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers,
            retry: retry::RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: retry::RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// POST one persisted-query operation and return the decoded body.
    pub(crate) async fn execute(
        &self,
        op: Operation,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, GqlError> {
        let body = RequestBody {
            extensions: Extensions {
                persisted_query: PersistedQuery {
                    sha256_hash: op.hash,
                    version: 1,
                },
            },
            operation_name: op.name,
            variables,
        };
        let body = serde_json::to_value(&body)?;

        let build_request = || {
            let mut request = http_client().post(&self.endpoint).json(&body);
            for (name, value) in self.headers.iter() {
                request = request.header(name, value);
            }
            request
        };

        let response = match retry::send_with_retry(build_request, &self.retry).await {
            retry::RetryOutcome::Success(response) => response,
            retry::RetryOutcome::HttpError(response) => {
                let status = response.status();
                let body = read_capped_error_body(response).await;
                tracing::warn!(%status, operation = op.name, "GraphQL request rejected");
                return Err(GqlError::Status { status, body });
            }
            retry::RetryOutcome::ConnectionError { attempts, source } => {
                return Err(GqlError::Exhausted { attempts, source });
            }
            retry::RetryOutcome::NonRetryable(e) => return Err(GqlError::Transport(e)),
        };

        let value = response.json::<serde_json::Value>().await?;
        check_rejection(&value)?;
        Ok(value)
    }
}

/// Detect the endpoint's out-of-band rejection shapes.
///
/// A top-level `"error"` key, or a GraphQL error whose message is exactly
/// `"failed integrity check"`, means the scraped auth bundle is no longer
/// accepted. Any other GraphQL error is surfaced verbatim.
fn check_rejection(value: &serde_json::Value) -> Result<(), GqlError> {
    if value.get("error").is_some() {
        return Err(GqlError::IntegrityCheck);
    }

    if let Some(errors) = value.get("errors").and_then(serde_json::Value::as_array) {
        let message = errors
            .first()
            .and_then(|e| e.get("message"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown GraphQL error");
        if message == "failed integrity check" {
            return Err(GqlError::IntegrityCheck);
        }
        return Err(GqlError::Api(message.to_string()));
    }

    Ok(())
}

pub(crate) async fn read_capped_error_body(response: reqwest::Response) -> String {
    match response.bytes().await {
        Ok(bytes) => {
            let mut bytes = bytes.to_vec();
            if bytes.len() > MAX_ERROR_BODY_BYTES {
                bytes.truncate(MAX_ERROR_BODY_BYTES);
                format!("{}...(truncated)", String::from_utf8_lossy(&bytes))
            } else {
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
        Err(_) => "<unable to read response body>".to_string(),
    }
}

pub(crate) fn parse_rfc3339(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, GqlError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|_| GqlError::BadTimestamp(raw.to_string()))
}
