// crates/smoke-harness-core/src/runner.rs
// ============================================================================
// Module: HTTP Smoke Runner
// Description: Ordered, fail-fast execution of HTTP smoke-test cases.
// Purpose: Turn a case list and a base URL into a suite report.
// Dependencies: async-trait, serde, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! A [`TestCase`] names a method, a path relative to the base URL, optional
//! headers and body, the expected status, and an optional body substring.
//! [`SmokeRunner`] issues them one at a time through an [`HttpTransport`] and
//! stops at the first network error, status mismatch, or body mismatch.
//!
//! Invariants:
//! - Cases execute strictly in order; case `k + 1` is never sent when case `k`
//!   fails.
//! - Every request carries the context's request timeout.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::context::HarnessContext;
use crate::report::CaseFailure;
use crate::report::CaseResult;
use crate::report::ReportSink;
use crate::report::SuiteReport;

// ============================================================================
// SECTION: Test Cases
// ============================================================================

/// HTTP methods accepted in harness files.
///
/// # Invariants
/// - Variants are stable for config parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    #[default]
    Get,
    /// HEAD.
    Head,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// PATCH.
    Patch,
    /// DELETE.
    Delete,
    /// OPTIONS.
    Options,
}

impl HttpMethod {
    /// Returns the canonical method token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

/// Default expected status for cases that omit one.
const fn default_expected_status() -> u16 {
    200
}

/// One HTTP smoke-test case.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Human-readable description printed with the result.
    pub description: String,
    /// Request method.
    #[serde(default)]
    pub method: HttpMethod,
    /// Path relative to the base URL.
    pub path: String,
    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional request body.
    #[serde(default)]
    pub body: Option<String>,
    /// Expected response status.
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
    /// Optional substring the response body must contain.
    #[serde(default)]
    pub body_contains: Option<String>,
}

impl TestCase {
    /// Builds a GET case expecting 200.
    #[must_use]
    pub fn get(description: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            method: HttpMethod::Get,
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            expected_status: default_expected_status(),
            body_contains: None,
        }
    }

    /// Replaces the expected status.
    #[must_use]
    pub const fn expect_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    /// Requires the body to contain `needle`.
    #[must_use]
    pub fn expect_body(mut self, needle: impl Into<String>) -> Self {
        self.body_contains = Some(needle.into());
        self
    }

    /// Renders the expectation for reports.
    #[must_use]
    pub fn expectation(&self) -> String {
        match &self.body_contains {
            Some(needle) => {
                format!("status {} with body containing \"{needle}\"", self.expected_status)
            }
            None => format!("status {}", self.expected_status),
        }
    }
}

// ============================================================================
// SECTION: Transport Seam
// ============================================================================

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Request headers in deterministic order.
    pub headers: Vec<(String, String)>,
    /// Optional body.
    pub body: Option<String>,
    /// Timeout for the whole exchange.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Builds a bodiless GET request.
    #[must_use]
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// Response status code.
    pub status: u16,
    /// Response body decoded lossily as UTF-8.
    pub body: String,
}

/// Failures that prevented a response from being received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The exchange exceeded its timeout.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout {
        /// Applied timeout in milliseconds.
        timeout_ms: u64,
    },
    /// The server could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),
    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),
    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Sends one request and returns the response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends `request` and waits for the full response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no complete response was received.
    async fn send(&self, request: &HttpRequest) -> Result<HttpReply, TransportError>;
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Fail-fast executor for [`TestCase`] sequences.
pub struct SmokeRunner<'a> {
    /// Transport used for every request.
    transport: &'a dyn HttpTransport,
    /// Run configuration.
    context: &'a HarnessContext,
}

impl<'a> SmokeRunner<'a> {
    /// Creates a runner over `transport`.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport, context: &'a HarnessContext) -> Self {
        Self {
            transport,
            context,
        }
    }

    /// Runs `cases` against `base_url`, stopping at the first failure.
    pub async fn run(
        &self,
        base_url: &str,
        cases: &[TestCase],
        sink: &mut dyn ReportSink,
    ) -> SuiteReport {
        let started = Instant::now();
        let mut results = Vec::with_capacity(cases.len());
        for (index, case) in cases.iter().enumerate() {
            let result = self.run_case(base_url, case).await;
            sink.case_finished(index, &result);
            let failed = !result.is_pass();
            results.push(result);
            if failed {
                break;
            }
        }
        SuiteReport::new(results, started.elapsed())
    }

    /// Executes a single case.
    async fn run_case(&self, base_url: &str, case: &TestCase) -> CaseResult {
        let request = build_request(base_url, case, self.context.request_timeout);
        debug!(method = request.method.as_str(), url = %request.url, "sending smoke request");
        let reply = match self.transport.send(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                debug!(url = %request.url, error = %err, "smoke request failed");
                return CaseResult::failed(
                    case.description.as_str(),
                    case.expectation(),
                    err.to_string(),
                    CaseFailure::Network {
                        message: err.to_string(),
                    },
                );
            }
        };
        if self.context.verbose {
            debug!(
                status = reply.status,
                body = %self.context.preview(&reply.body),
                "smoke response received"
            );
        }
        evaluate(case, &reply, self.context)
    }
}

/// Compares a response against the case expectation.
fn evaluate(case: &TestCase, reply: &HttpReply, context: &HarnessContext) -> CaseResult {
    let actual = format!("status {}", reply.status);
    if reply.status != case.expected_status {
        return CaseResult::failed(
            case.description.as_str(),
            case.expectation(),
            actual,
            CaseFailure::Status {
                expected: case.expected_status,
                actual: reply.status,
            },
        );
    }
    if let Some(needle) = &case.body_contains
        && !reply.body.contains(needle.as_str())
    {
        let snippet = context.preview(&reply.body);
        return CaseResult::failed(
            case.description.as_str(),
            case.expectation(),
            format!("{actual} with body \"{snippet}\""),
            CaseFailure::Body {
                expected: needle.clone(),
                snippet,
            },
        );
    }
    CaseResult::passed(case.description.as_str(), case.expectation(), actual)
}

/// Resolves a case into a concrete request.
fn build_request(base_url: &str, case: &TestCase, timeout: Duration) -> HttpRequest {
    HttpRequest {
        method: case.method,
        url: join_url(base_url, &case.path),
        headers: case.headers.iter().map(|(name, value)| (name.clone(), value.clone())).collect(),
        body: case.body.clone(),
        timeout,
    }
}

/// Joins a base URL and a relative path with exactly one separating slash.
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn join_url_collapses_duplicate_slashes() {
        assert_eq!(
            join_url("http://localhost:9080/rest/", "/health"),
            "http://localhost:9080/rest/health"
        );
        assert_eq!(join_url("http://localhost:9080", "health"), "http://localhost:9080/health");
    }

    #[test]
    fn join_url_with_empty_path_keeps_trailing_slash() {
        assert_eq!(join_url("http://localhost:8080/app", ""), "http://localhost:8080/app/");
    }

    #[test]
    fn evaluate_reports_status_mismatch() {
        let case = TestCase::get("health", "/health");
        let reply = HttpReply {
            status: 503,
            body: "down".to_string(),
        };
        let result = evaluate(&case, &reply, &HarnessContext::default());
        assert_eq!(
            result.failure(),
            Some(&CaseFailure::Status {
                expected: 200,
                actual: 503,
            })
        );
        assert_eq!(result.failure().unwrap().to_string(), "expected status 200, got 503");
    }

    #[test]
    fn evaluate_truncates_body_snippet() {
        let case = TestCase::get("home", "/").expect_body("Welcome");
        let reply = HttpReply {
            status: 200,
            body: "x".repeat(500),
        };
        let context = HarnessContext {
            body_preview_bytes: 10,
            ..HarnessContext::default()
        };
        let result = evaluate(&case, &reply, &context);
        match result.failure() {
            Some(CaseFailure::Body {
                expected,
                snippet,
            }) => {
                assert_eq!(expected, "Welcome");
                assert_eq!(snippet, "xxxxxxxxxx...");
            }
            other => panic!("unexpected failure: {other:?}"),
        }
    }

    #[test]
    fn test_case_defaults_apply_when_omitted() {
        let case = parse_case(r#"{"description":"quote","path":"/rest/quotes/s:0"}"#);
        assert_eq!(case.method, HttpMethod::Get);
        assert_eq!(case.expected_status, 200);
        assert!(case.body_contains.is_none());
    }

    fn parse_case(json: &str) -> TestCase {
        serde_json::from_str(json).expect("parse case")
    }
}
