// crates/smoke-harness-core/src/report.rs
// ============================================================================
// Module: Smoke Reports
// Description: Case results, suite reports, warnings, and exit code mapping.
// Purpose: Give runners one immutable result model and one reporting seam.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Runners never print. They hand each [`CaseResult`] and [`HarnessWarning`]
//! to a [`ReportSink`] and return a [`SuiteReport`]; the caller decides how to
//! render them. [`HarnessExit`] pins the process exit codes.
//!
//! Invariants:
//! - [`CaseResult`] fields are private; a result cannot change after creation.
//! - A [`SuiteReport`] never contains a result after its first failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Process exit codes used by the harness.
///
/// # Invariants
/// - Numeric values are part of the CLI contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessExit {
    /// All cases passed.
    Success,
    /// A case failed or an unexpected error occurred.
    Failure,
    /// No usable base URL candidate existed.
    NoBaseUrl,
    /// The readiness marker did not appear before the deadline.
    NotReady,
}

impl HarnessExit {
    /// Returns the numeric exit code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::NoBaseUrl => 2,
            Self::NotReady => 3,
        }
    }
}

// ============================================================================
// SECTION: Case Results
// ============================================================================

/// Reason a single case failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaseFailure {
    /// The request never produced a response.
    #[error("network error: {message}")]
    Network {
        /// Transport error text.
        message: String,
    },
    /// The response status differed from the expectation.
    #[error("expected status {expected}, got {actual}")]
    Status {
        /// Expected status code.
        expected: u16,
        /// Observed status code.
        actual: u16,
    },
    /// The response or element text lacked the expected substring.
    #[error("expected body to contain \"{expected}\", got \"{snippet}\"")]
    Body {
        /// Expected substring.
        expected: String,
        /// Bounded preview of the observed text.
        snippet: String,
    },
    /// A browser automation command failed.
    #[error("browser error: {message}")]
    Browser {
        /// Driver error text.
        message: String,
    },
}

/// Outcome of one executed case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    /// Human-readable case description.
    description: String,
    /// Rendered expectation.
    expected: String,
    /// Rendered observation.
    actual: String,
    /// Failure detail when the case did not pass.
    failure: Option<CaseFailure>,
}

impl CaseResult {
    /// Builds a passing result.
    #[must_use]
    pub fn passed(
        description: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            expected: expected.into(),
            actual: actual.into(),
            failure: None,
        }
    }

    /// Builds a failing result.
    #[must_use]
    pub fn failed(
        description: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
        failure: CaseFailure,
    ) -> Self {
        Self {
            description: description.into(),
            expected: expected.into(),
            actual: actual.into(),
            failure: Some(failure),
        }
    }

    /// Case description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Rendered expectation.
    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Rendered observation.
    #[must_use]
    pub fn actual(&self) -> &str {
        &self.actual
    }

    /// Returns true when the case passed.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        self.failure.is_none()
    }

    /// Failure detail, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&CaseFailure> {
        self.failure.as_ref()
    }
}

// ============================================================================
// SECTION: Suite Reports
// ============================================================================

/// Ordered results of one fail-fast run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    /// Executed case results, in order.
    results: Vec<CaseResult>,
    /// Wall-clock time spent executing the cases.
    elapsed: Duration,
}

impl SuiteReport {
    /// Builds a report, dropping anything recorded after the first failure.
    #[must_use]
    pub fn new(mut results: Vec<CaseResult>, elapsed: Duration) -> Self {
        if let Some(index) = results.iter().position(|result| !result.is_pass()) {
            results.truncate(index + 1);
        }
        Self {
            results,
            elapsed,
        }
    }

    /// Executed results, in order.
    #[must_use]
    pub fn results(&self) -> &[CaseResult] {
        &self.results
    }

    /// Wall-clock time spent executing the cases.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns true when every executed case passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.results.iter().all(CaseResult::is_pass)
    }

    /// Returns the failing result and its zero-based position.
    #[must_use]
    pub fn failure(&self) -> Option<(usize, &CaseResult)> {
        self.results.iter().enumerate().find(|(_, result)| !result.is_pass())
    }

    /// Maps the report to its exit code.
    #[must_use]
    pub fn exit(&self) -> HarnessExit {
        if self.passed() { HarnessExit::Success } else { HarnessExit::Failure }
    }

    /// Appends a follow-up report, summing elapsed time.
    ///
    /// The follow-up is discarded when this report already failed.
    #[must_use]
    pub fn then(self, next: Self) -> Self {
        if !self.passed() {
            return self;
        }
        let mut results = self.results;
        results.extend(next.results);
        Self::new(results, self.elapsed.saturating_add(next.elapsed))
    }
}

// ============================================================================
// SECTION: Warnings
// ============================================================================

/// Non-fatal conditions surfaced to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessWarning {
    /// Discovery fell back to a candidate that did not pass its probe.
    #[error("no base URL candidate responded; falling back to unvalidated {url}")]
    UnvalidatedBaseUrl {
        /// Selected fallback URL.
        url: String,
    },
    /// The browser session could not be released cleanly.
    #[error("failed to close browser session {session}: {message}")]
    SessionLeak {
        /// WebDriver session identifier.
        session: String,
        /// Driver error text.
        message: String,
    },
}

// ============================================================================
// SECTION: Reporting Seam
// ============================================================================

/// Receives progress from discovery and runners.
pub trait ReportSink: Send {
    /// Called once per executed case, in order.
    fn case_finished(&mut self, index: usize, result: &CaseResult);

    /// Called for non-fatal conditions.
    fn warning(&mut self, warning: &HarnessWarning);
}
