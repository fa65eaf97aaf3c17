// crates/smoke-harness-core/tests/http_smoke.rs
// ============================================================================
// Module: HTTP Smoke Integration Tests
// Description: Runs the reqwest transport against local tiny_http servers.
// Purpose: Verify status, body, timeout, and connect failure classification.
// ============================================================================

//! ## Overview
//! Exercises [`ReqwestTransport`] end to end: the `/health` pass and fail
//! scenarios, body substring checks, the body size limit, request timeouts,
//! refused connections, and discovery through [`HttpProbe`].

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use smoke_harness_core::BaseUrlCandidates;
use smoke_harness_core::CaseFailure;
use smoke_harness_core::CaseResult;
use smoke_harness_core::FallbackPolicy;
use smoke_harness_core::HarnessContext;
use smoke_harness_core::HarnessWarning;
use smoke_harness_core::HttpClientSettings;
use smoke_harness_core::HttpProbe;
use smoke_harness_core::HttpRequest;
use smoke_harness_core::HttpTransport;
use smoke_harness_core::ReportSink;
use smoke_harness_core::ReqwestTransport;
use smoke_harness_core::SmokeRunner;
use smoke_harness_core::TestCase;
use smoke_harness_core::TransportError;
use smoke_harness_core::discover_base_url;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Sink that keeps everything it is given.
#[derive(Default)]
struct CollectingSink {
    results: Vec<CaseResult>,
    warnings: Vec<HarnessWarning>,
}

impl ReportSink for CollectingSink {
    fn case_finished(&mut self, _index: usize, result: &CaseResult) {
        self.results.push(result.clone());
    }

    fn warning(&mut self, warning: &HarnessWarning) {
        self.warnings.push(warning.clone());
    }
}

/// Serves `requests` requests from a fixed route table and returns the base URL.
fn serve(routes: &[(&str, u16, &str)], requests: usize) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let routes: Vec<(String, u16, String)> = routes
        .iter()
        .map(|(path, status, body)| ((*path).to_string(), *status, (*body).to_string()))
        .collect();
    thread::spawn(move || {
        for _ in 0 .. requests {
            let Ok(request) = server.recv() else {
                return;
            };
            let (status, body) = routes
                .iter()
                .find(|(path, _, _)| path == request.url())
                .map_or((404, "not found".to_string()), |(_, status, body)| (*status, body.clone()));
            let _ = request.respond(Response::from_string(body).with_status_code(status));
        }
    });
    format!("http://{addr}")
}

/// Returns a URL on a port nothing listens on.
fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(&HttpClientSettings::default()).unwrap()
}

// ============================================================================
// SECTION: Runner
// ============================================================================

#[tokio::test]
async fn health_check_passes_on_200_ok() {
    let base = serve(&[("/health", 200, "OK")], 1);
    let transport = transport();
    let context = HarnessContext::default();
    let mut sink = CollectingSink::default();
    let cases = vec![TestCase::get("health", "/health").expect_body("OK")];
    let report = SmokeRunner::new(&transport, &context).run(&base, &cases, &mut sink).await;
    assert!(report.passed(), "{report:?}");
    assert_eq!(report.exit().code(), 0);
    assert_eq!(sink.results.len(), 1);
}

#[tokio::test]
async fn health_check_fails_on_503() {
    let base = serve(&[("/health", 503, "Service Unavailable")], 1);
    let transport = transport();
    let context = HarnessContext::default();
    let mut sink = CollectingSink::default();
    let cases = vec![TestCase::get("health", "/health"), TestCase::get("quotes", "/quotes")];
    let report = SmokeRunner::new(&transport, &context).run(&base, &cases, &mut sink).await;
    assert_eq!(report.exit().code(), 1);
    assert_eq!(report.results().len(), 1);
    let (_, failed) = report.failure().unwrap();
    assert_eq!(failed.failure().unwrap().to_string(), "expected status 200, got 503");
}

#[tokio::test]
async fn body_mismatch_reports_snippet() {
    let base = serve(&[("/", 200, "<html><title>Trade</title></html>")], 1);
    let transport = transport();
    let context = HarnessContext::default();
    let mut sink = CollectingSink::default();
    let cases = vec![TestCase::get("home", "/").expect_body("DayTrader")];
    let report = SmokeRunner::new(&transport, &context).run(&base, &cases, &mut sink).await;
    let (_, failed) = report.failure().unwrap();
    assert_eq!(
        failed.failure(),
        Some(&CaseFailure::Body {
            expected: "DayTrader".to_string(),
            snippet: "<html><title>Trade</title></html>".to_string(),
        })
    );
}

#[tokio::test]
async fn refused_connection_is_a_network_failure() {
    let transport = transport();
    let context = HarnessContext::default();
    let mut sink = CollectingSink::default();
    let cases = vec![TestCase::get("health", "/health")];
    let report = SmokeRunner::new(&transport, &context).run(&refused_url(), &cases, &mut sink).await;
    assert!(matches!(report.results()[0].failure(), Some(CaseFailure::Network { .. })));
    assert_eq!(report.exit().code(), 1);
}

// ============================================================================
// SECTION: Transport Limits
// ============================================================================

#[tokio::test]
async fn oversized_body_is_rejected() {
    let body = "x".repeat(256);
    let base = serve(&[("/big", 200, body.as_str())], 1);
    let transport = ReqwestTransport::new(&HttpClientSettings {
        max_body_bytes: 64,
        ..HttpClientSettings::default()
    })
    .unwrap();
    let request = HttpRequest::get(format!("{base}/big"), Duration::from_secs(5));
    let err = transport.send(&request).await.unwrap_err();
    assert!(matches!(err, TransportError::Body(_)), "{err:?}");
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    thread::spawn(move || {
        if let Ok(request) = server.recv() {
            thread::sleep(Duration::from_millis(1_500));
            let _ = request.respond(Response::from_string("late"));
        }
    });
    let request = HttpRequest::get(format!("http://{addr}/slow"), Duration::from_millis(200));
    let err = transport().send(&request).await.unwrap_err();
    assert_eq!(
        err,
        TransportError::Timeout {
            timeout_ms: 200,
        }
    );
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

#[tokio::test]
async fn discovery_probes_until_a_server_answers() {
    let live = serve(&[("/", 200, "OK")], 1);
    let candidates = BaseUrlCandidates::from_override(Some(refused_url()), &[format!("{live}/")]);
    let transport = transport();
    let context = HarnessContext::default();
    let probe = HttpProbe::new(&transport, &context);
    let mut sink = CollectingSink::default();
    let discovery = discover_base_url(&candidates, &probe, FallbackPolicy::FirstNonEmpty, &mut sink)
        .await
        .unwrap();
    assert_eq!(discovery.url, format!("{live}/"));
    assert!(discovery.validated);
    assert!(sink.warnings.is_empty());
}

#[tokio::test]
async fn error_status_does_not_validate_candidate() {
    let base = serve(&[("/", 500, "boom")], 1);
    let candidates = BaseUrlCandidates::from_override(None, &[base.clone()]);
    let transport = transport();
    let context = HarnessContext::default();
    let probe = HttpProbe::new(&transport, &context);
    let mut sink = CollectingSink::default();
    let discovery = discover_base_url(&candidates, &probe, FallbackPolicy::FirstNonEmpty, &mut sink)
        .await
        .unwrap();
    assert!(!discovery.validated);
    assert_eq!(discovery.url, base);
    assert_eq!(sink.warnings.len(), 1);
}
