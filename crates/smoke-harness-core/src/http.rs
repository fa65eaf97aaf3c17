// crates/smoke-harness-core/src/http.rs
// ============================================================================
// Module: HTTP Transport
// Description: reqwest-backed implementation of the smoke transport seam.
// Purpose: Issue bounded smoke-test requests and classify network failures.
// Dependencies: async-trait, reqwest
// ============================================================================

//! ## Overview
//! [`ReqwestTransport`] sends [`HttpRequest`]s with a per-request timeout and
//! reads bodies under a hard size limit. Failures are classified into
//! [`TransportError`] variants so reports can distinguish timeouts from
//! refused connections.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Method;
use reqwest::redirect::Policy;

use crate::runner::HttpReply;
use crate::runner::HttpRequest;
use crate::runner::HttpTransport;
use crate::runner::TransportError;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Settings for the shared HTTP client.
///
/// # Invariants
/// - `max_body_bytes` is a hard upper bound on buffered response bodies.
/// - `max_redirects = 0` disables redirect following.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientSettings {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Maximum number of redirects followed per request.
    pub max_redirects: usize,
    /// Maximum response body size, in bytes.
    pub max_body_bytes: usize,
    /// Connect timeout applied to every request.
    pub connect_timeout: Duration,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("smoke-harness/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 10,
            max_body_bytes: 8 * 1024 * 1024,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Smoke transport backed by a single shared [`reqwest::Client`].
pub struct ReqwestTransport {
    /// Shared HTTP client.
    client: Client,
    /// Maximum response body size, in bytes.
    max_body_bytes: usize,
}

impl ReqwestTransport {
    /// Builds a transport from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] when the client cannot be created.
    pub fn new(settings: &HttpClientSettings) -> Result<Self, TransportError> {
        let redirect = if settings.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(settings.max_redirects)
        };
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .redirect(redirect)
            .build()
            .map_err(|err| TransportError::Request(format!("http client build failed: {err}")))?;
        Ok(Self {
            client,
            max_body_bytes: settings.max_body_bytes,
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError> {
        let method = Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|err| TransportError::Request(err.to_string()))?;
        let mut builder = self.client.request(method, &request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        let mut response =
            builder.send().await.map_err(|err| classify(&err, request.timeout))?;
        let status = response.status().as_u16();
        let mut body = Vec::new();
        loop {
            let Some(chunk) =
                response.chunk().await.map_err(|err| body_error(&err, request.timeout))?
            else {
                break;
            };
            if body.len().saturating_add(chunk.len()) > self.max_body_bytes {
                return Err(TransportError::Body(format!(
                    "response exceeds size limit of {} bytes",
                    self.max_body_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(HttpReply {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a reqwest error into the transport taxonomy.
fn classify(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout {
            timeout_ms: duration_millis(timeout),
        };
    }
    if err.is_connect() {
        return TransportError::Connect(err.to_string());
    }
    TransportError::Request(err.to_string())
}

/// Maps a body read failure, keeping timeouts distinct.
fn body_error(err: &reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout {
            timeout_ms: duration_millis(timeout),
        };
    }
    TransportError::Body(err.to_string())
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
