// crates/smoke-harness-core/src/context.rs
// ============================================================================
// Module: Harness Context
// Description: Explicit run configuration threaded into discovery and runners.
// Purpose: Replace process-wide verbosity and timeout state with a value.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`HarnessContext`] carries the per-run knobs (verbosity, request timeout,
//! discovery fallback policy, body preview size). It is built once by the
//! caller and passed by reference; nothing in this crate reads globals.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-request timeout for smoke-test requests and discovery probes.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default number of body bytes quoted in failure messages and diagnostics.
pub const DEFAULT_BODY_PREVIEW_BYTES: usize = 200;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Behavior when no base URL candidate passes its probe.
///
/// # Invariants
/// - Variants are stable for config parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Use the first non-empty candidate and emit a warning.
    #[default]
    FirstNonEmpty,
    /// Treat an unreachable candidate set as a hard failure.
    Strict,
}

/// Explicit configuration for one harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessContext {
    /// Emit request/response diagnostics.
    pub verbose: bool,
    /// Timeout applied to each request and probe.
    pub request_timeout: Duration,
    /// Discovery fallback behavior.
    pub fallback: FallbackPolicy,
    /// Maximum body bytes quoted in failure messages.
    pub body_preview_bytes: usize,
}

impl Default for HarnessContext {
    fn default() -> Self {
        Self {
            verbose: false,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fallback: FallbackPolicy::FirstNonEmpty,
            body_preview_bytes: DEFAULT_BODY_PREVIEW_BYTES,
        }
    }
}

impl HarnessContext {
    /// Returns a bounded, char-boundary-safe preview of `body`.
    #[must_use]
    pub fn preview(&self, body: &str) -> String {
        preview(body, self.body_preview_bytes)
    }
}

/// Truncates `body` to at most `limit` bytes on a char boundary.
#[must_use]
pub fn preview(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        return body.to_string();
    }
    let mut end = limit;
    while end > 0 && !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[.. end])
}
