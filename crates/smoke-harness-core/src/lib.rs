// crates/smoke-harness-core/src/lib.rs
// ============================================================================
// Module: Smoke Harness Core Library
// Description: Readiness polling, base URL discovery, and smoke-test runners.
// Purpose: Provide the reusable mechanics behind the benchmark smoke harness.
// Dependencies: async-trait, regex, reqwest, serde, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! `smoke-harness-core` implements the cross-cutting harness used by every
//! benchmark application: discover a base URL from ordered candidates, wait
//! for a framework readiness marker in container logs, run a fail-fast
//! sequence of HTTP or browser assertions, and map the outcome to an exit code.
//!
//! Invariants:
//! - At most one base URL candidate is selected per discovery.
//! - Case results are immutable once produced.
//! - A failed suite contains exactly one failing result, and it is the last one.
//! - Readiness waits are always bounded by an explicit deadline.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod browser;
pub mod container;
pub mod context;
pub mod discovery;
pub mod http;
pub mod readiness;
pub mod report;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use browser::BrowserDriver;
pub use browser::BrowserError;
pub use browser::BrowserKind;
pub use browser::BrowserStep;
pub use browser::WebDriverClient;
pub use browser::WebDriverConfig;
pub use browser::run_browser_suite;
pub use container::ContainerError;
pub use container::ContainerLogs;
pub use container::ContainerRuntime;
pub use container::ContainerSpec;
pub use container::DockerCli;
pub use container::run_local;
pub use context::FallbackPolicy;
pub use context::HarnessContext;
pub use discovery::BaseUrlCandidates;
pub use discovery::Discovery;
pub use discovery::DiscoveryError;
pub use discovery::HttpProbe;
pub use discovery::Probe;
pub use discovery::discover_base_url;
pub use http::HttpClientSettings;
pub use http::ReqwestTransport;
pub use readiness::LogSource;
pub use readiness::MarkerError;
pub use readiness::MarkerMatcher;
pub use readiness::ReadinessError;
pub use readiness::ReadinessMarker;
pub use readiness::ReadinessPolicy;
pub use readiness::ReadyReport;
pub use readiness::wait_for_ready;
pub use report::CaseFailure;
pub use report::CaseResult;
pub use report::HarnessExit;
pub use report::HarnessWarning;
pub use report::ReportSink;
pub use report::SuiteReport;
pub use runner::HttpMethod;
pub use runner::HttpReply;
pub use runner::HttpRequest;
pub use runner::HttpTransport;
pub use runner::SmokeRunner;
pub use runner::TestCase;
pub use runner::TransportError;
pub use runner::join_url;
