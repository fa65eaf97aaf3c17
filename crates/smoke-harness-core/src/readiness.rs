// crates/smoke-harness-core/src/readiness.rs
// ============================================================================
// Module: Readiness Poller
// Description: Bounded wait for a framework readiness marker in container logs.
// Purpose: Block startup flows until the hosted application can serve traffic.
// Dependencies: async-trait, regex, serde, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! Every supported hosting framework prints one recognizable line when it is
//! ready. [`ReadinessMarker`] is the closed set of those markers plus two
//! escape hatches for application-specific text. [`wait_for_ready`] re-reads
//! the accumulated log at a fixed interval until the marker matches or the
//! deadline passes.
//!
//! Invariants:
//! - The first log read happens immediately; later reads are `interval` apart.
//! - The wait never exceeds `timeout` (plus one in-flight log read).
//! - Polling never mutates container state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::debug;

use crate::container::ContainerError;
use crate::http::duration_millis;
use crate::report::HarnessExit;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Open Liberty "server is ready to run a smarter planet" message id.
pub const OPEN_LIBERTY_READY: &str = "CWWKF0011I";
/// Quarkus startup line: logger field plus "started in ... Listening on:".
pub const QUARKUS_READY_PATTERN: &str = r"\[io\.quarkus\]\s.*started in .*Listening on:";
/// Spring Boot startup line: embedded Tomcat port or application start time.
pub const SPRING_BOOT_READY_PATTERN: &str =
    r"Tomcat started on port(?:\(s\))?:?\s*\d+|Started \S+ in \S+ seconds";
/// Default delay between log reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default readiness deadline.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// SECTION: Markers
// ============================================================================

/// Readiness marker kinds, tagged by `kind` in harness files.
///
/// # Invariants
/// - Framework variants match their constants verbatim against raw log text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ReadinessMarker {
    /// Open Liberty: literal [`OPEN_LIBERTY_READY`].
    OpenLiberty,
    /// Quarkus: regex [`QUARKUS_READY_PATTERN`].
    Quarkus,
    /// Spring Boot: regex [`SPRING_BOOT_READY_PATTERN`].
    SpringBoot,
    /// Application-specific literal substring.
    Substring(String),
    /// Application-specific regular expression.
    Pattern(String),
}

impl ReadinessMarker {
    /// Stable label used in reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::OpenLiberty => "open_liberty",
            Self::Quarkus => "quarkus",
            Self::SpringBoot => "spring_boot",
            Self::Substring(_) => "substring",
            Self::Pattern(_) => "pattern",
        }
    }

    /// Compiles the marker into a matcher.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError`] when a pattern does not compile or a substring
    /// is empty.
    pub fn compile(&self) -> Result<MarkerMatcher, MarkerError> {
        let matcher = match self {
            Self::OpenLiberty => Matcher::Literal(OPEN_LIBERTY_READY.to_string()),
            Self::Quarkus => Matcher::Regex(compile_pattern(QUARKUS_READY_PATTERN)?),
            Self::SpringBoot => Matcher::Regex(compile_pattern(SPRING_BOOT_READY_PATTERN)?),
            Self::Substring(text) => {
                if text.is_empty() {
                    return Err(MarkerError::Empty);
                }
                Matcher::Literal(text.clone())
            }
            Self::Pattern(pattern) => {
                if pattern.is_empty() {
                    return Err(MarkerError::Empty);
                }
                Matcher::Regex(compile_pattern(pattern)?)
            }
        };
        Ok(MarkerMatcher {
            label: self.label(),
            matcher,
        })
    }
}

/// Marker compilation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    /// The pattern is not a valid regular expression.
    #[error("invalid readiness pattern {pattern}: {message}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Regex compiler message.
        message: String,
    },
    /// The marker text is empty.
    #[error("readiness marker text must not be empty")]
    Empty,
}

/// Compiled matching strategy.
#[derive(Debug, Clone)]
enum Matcher {
    /// Plain substring search.
    Literal(String),
    /// Regular expression search.
    Regex(Regex),
}

/// A compiled [`ReadinessMarker`].
#[derive(Debug, Clone)]
pub struct MarkerMatcher {
    /// Label of the source marker.
    label: &'static str,
    /// Matching strategy.
    matcher: Matcher,
}

impl MarkerMatcher {
    /// Returns true when `logs` contains the marker.
    #[must_use]
    pub fn is_match(&self, logs: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(text) => logs.contains(text.as_str()),
            Matcher::Regex(regex) => regex.is_match(logs),
        }
    }

    /// Label of the source marker.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }
}

/// Compiles a regex, mapping failures into [`MarkerError`].
fn compile_pattern(pattern: &str) -> Result<Regex, MarkerError> {
    Regex::new(pattern).map_err(|err| MarkerError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })
}

// ============================================================================
// SECTION: Log Sources
// ============================================================================

/// Supplies a container's accumulated log output.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Returns everything the container has logged so far.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] when the logs cannot be read.
    async fn read_logs(&self) -> Result<String, ContainerError>;
}

// ============================================================================
// SECTION: Polling
// ============================================================================

/// Interval and deadline for a readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Delay between log reads.
    pub interval: Duration,
    /// Maximum total wait.
    pub timeout: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

/// Successful wait summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyReport {
    /// Time until the marker was observed.
    pub elapsed: Duration,
    /// Number of log reads performed.
    pub polls: u32,
}

/// Readiness failures.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The marker did not appear before the deadline.
    #[error("readiness marker {marker} not observed within {timeout_ms} ms ({polls} log reads)")]
    Timeout {
        /// Label of the awaited marker.
        marker: &'static str,
        /// Applied deadline in milliseconds.
        timeout_ms: u64,
        /// Number of log reads performed.
        polls: u32,
    },
    /// The container logs could not be read.
    #[error("failed to read container logs: {0}")]
    Logs(#[source] ContainerError),
}

impl ReadinessError {
    /// Maps the error to its exit code.
    #[must_use]
    pub const fn exit(&self) -> HarnessExit {
        match self {
            Self::Timeout {
                ..
            } => HarnessExit::NotReady,
            Self::Logs(_) => HarnessExit::Failure,
        }
    }
}

/// Blocks until `matcher` matches the logs from `source`, bounded by `policy`.
///
/// # Errors
///
/// Returns [`ReadinessError::Timeout`] when the deadline passes and
/// [`ReadinessError::Logs`] on the first failed log read.
pub async fn wait_for_ready(
    source: &dyn LogSource,
    matcher: &MarkerMatcher,
    policy: ReadinessPolicy,
) -> Result<ReadyReport, ReadinessError> {
    let started = Instant::now();
    let polls = AtomicU32::new(0);
    let poll_loop = async {
        loop {
            let attempt = polls.fetch_add(1, Ordering::Relaxed).saturating_add(1);
            let logs = source.read_logs().await.map_err(ReadinessError::Logs)?;
            if matcher.is_match(&logs) {
                return Ok::<(), ReadinessError>(());
            }
            debug!(marker = matcher.label(), attempt, "readiness marker not yet observed");
            sleep(policy.interval).await;
        }
    };
    match timeout(policy.timeout, poll_loop).await {
        Ok(Ok(())) => Ok(ReadyReport {
            elapsed: started.elapsed(),
            polls: polls.load(Ordering::Relaxed),
        }),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(ReadinessError::Timeout {
            marker: matcher.label(),
            timeout_ms: duration_millis(policy.timeout),
            polls: polls.load(Ordering::Relaxed),
        }),
    }
}
