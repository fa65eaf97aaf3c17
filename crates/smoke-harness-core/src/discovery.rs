// crates/smoke-harness-core/src/discovery.rs
// ============================================================================
// Module: Base URL Discovery
// Description: Selects the active base URL from ordered candidates.
// Purpose: Pick the first reachable target with a single probe per candidate.
// Dependencies: async-trait, thiserror, tracing
// ============================================================================

//! ## Overview
//! Candidates are ordered: the application's `<APP>_BASE_URL` override first,
//! then the fixed fallbacks from the harness file. Each non-empty candidate is
//! probed exactly once, in order; the first success wins. When none succeed
//! the [`FallbackPolicy`] decides between an unvalidated fallback (with a
//! warning) and a hard failure.
//!
//! Invariants:
//! - At most one candidate is selected.
//! - An empty candidate set fails before any probe is issued.
//! - There is no retry or backoff.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::context::FallbackPolicy;
use crate::context::HarnessContext;
use crate::report::HarnessExit;
use crate::report::HarnessWarning;
use crate::report::ReportSink;
use crate::runner::HttpRequest;
use crate::runner::HttpTransport;

// ============================================================================
// SECTION: Candidates
// ============================================================================

/// Ordered base URL candidates; blank entries count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseUrlCandidates {
    /// Candidates in priority order.
    entries: Vec<Option<String>>,
}

impl BaseUrlCandidates {
    /// Builds candidates from an optional override followed by fallbacks.
    #[must_use]
    pub fn from_override(override_url: Option<String>, fallbacks: &[String]) -> Self {
        let mut entries = Vec::with_capacity(fallbacks.len() + 1);
        entries.push(override_url);
        entries.extend(fallbacks.iter().cloned().map(Some));
        Self {
            entries,
        }
    }

    /// Builds candidates from raw entries.
    #[must_use]
    pub const fn new(entries: Vec<Option<String>>) -> Self {
        Self {
            entries,
        }
    }

    /// Iterates over non-empty candidates in order, trimmed.
    pub fn non_empty(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| {
            entry.as_deref().map(str::trim).filter(|candidate| !candidate.is_empty())
        })
    }

    /// Returns true when no non-empty candidate exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.non_empty().next().is_none()
    }
}

// ============================================================================
// SECTION: Probe Seam
// ============================================================================

/// Validates that a candidate base URL is serving.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Returns true when `url` answers with a non-error status.
    async fn probe(&self, url: &str) -> bool;
}

/// Probe that issues one `GET` per candidate through an [`HttpTransport`].
pub struct HttpProbe<'a> {
    /// Transport shared with the runner.
    transport: &'a dyn HttpTransport,
    /// Run configuration (timeout).
    context: &'a HarnessContext,
}

impl<'a> HttpProbe<'a> {
    /// Creates a probe over `transport`.
    #[must_use]
    pub fn new(transport: &'a dyn HttpTransport, context: &'a HarnessContext) -> Self {
        Self {
            transport,
            context,
        }
    }
}

#[async_trait]
impl Probe for HttpProbe<'_> {
    async fn probe(&self, url: &str) -> bool {
        let request = HttpRequest::get(url, self.context.request_timeout);
        match self.transport.send(&request).await {
            Ok(reply) => {
                debug!(url, status = reply.status, "base url probe answered");
                reply.status < 400
            }
            Err(err) => {
                debug!(url, error = %err, "base url probe failed");
                false
            }
        }
    }
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Selected base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Selected URL.
    pub url: String,
    /// True when the URL passed its probe.
    pub validated: bool,
}

/// Discovery failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// No non-empty candidate was configured.
    #[error("no base URL candidates available")]
    NoCandidates,
    /// Every candidate failed its probe and the policy forbids fallback.
    #[error("none of the {attempted} base URL candidates responded")]
    NoneReachable {
        /// Number of probed candidates.
        attempted: usize,
    },
}

impl DiscoveryError {
    /// Maps the error to its exit code.
    #[must_use]
    pub const fn exit(&self) -> HarnessExit {
        match self {
            Self::NoCandidates => HarnessExit::NoBaseUrl,
            Self::NoneReachable {
                ..
            } => HarnessExit::Failure,
        }
    }
}

/// Returns the first candidate whose probe succeeds.
///
/// # Errors
///
/// Returns [`DiscoveryError::NoCandidates`] without probing when every
/// candidate is absent, and [`DiscoveryError::NoneReachable`] when none
/// validate under [`FallbackPolicy::Strict`].
pub async fn discover_base_url(
    candidates: &BaseUrlCandidates,
    probe: &dyn Probe,
    policy: FallbackPolicy,
    sink: &mut dyn ReportSink,
) -> Result<Discovery, DiscoveryError> {
    let mut first_non_empty: Option<&str> = None;
    let mut attempted = 0usize;
    for candidate in candidates.non_empty() {
        if first_non_empty.is_none() {
            first_non_empty = Some(candidate);
        }
        attempted += 1;
        if probe.probe(candidate).await {
            debug!(url = candidate, "selected validated base url");
            return Ok(Discovery {
                url: candidate.to_string(),
                validated: true,
            });
        }
    }
    let Some(fallback) = first_non_empty else {
        return Err(DiscoveryError::NoCandidates);
    };
    match policy {
        FallbackPolicy::FirstNonEmpty => {
            sink.warning(&HarnessWarning::UnvalidatedBaseUrl {
                url: fallback.to_string(),
            });
            Ok(Discovery {
                url: fallback.to_string(),
                validated: false,
            })
        }
        FallbackPolicy::Strict => Err(DiscoveryError::NoneReachable {
            attempted,
        }),
    }
}
