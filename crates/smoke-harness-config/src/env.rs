// crates/smoke-harness-config/src/env.rs
// ============================================================================
// Module: Harness Environment
// Description: Environment-backed overrides for harness runs.
// Purpose: Centralize env parsing with strict UTF-8 validation.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Environment values are parsed with strict UTF-8 enforcement so a garbled
//! override fails closed instead of being silently ignored. Parsing is done
//! over a lookup function so it can be exercised without touching the
//! process environment.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Environment Keys
// ============================================================================

/// Environment keys read by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessEnvKey {
    /// Harness file path override.
    Config,
    /// Diagnostics switch; enabled only by the value `1`.
    Verbose,
    /// Readiness deadline override in seconds (positive integer).
    ReadyTimeoutSeconds,
    /// Per-request timeout override in seconds (positive integer).
    RequestTimeoutSeconds,
    /// Container CLI program override (for example `podman`).
    DockerProgram,
}

impl HarnessEnvKey {
    /// Returns the canonical environment variable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "SMOKE_HARNESS_CONFIG",
            Self::Verbose => "VERBOSE",
            Self::ReadyTimeoutSeconds => "SMOKE_HARNESS_READY_TIMEOUT_SEC",
            Self::RequestTimeoutSeconds => "SMOKE_HARNESS_REQUEST_TIMEOUT_SEC",
            Self::DockerProgram => "SMOKE_HARNESS_DOCKER",
        }
    }
}

// ============================================================================
// SECTION: Environment Snapshot
// ============================================================================

/// Typed overrides read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarnessEnv {
    /// Diagnostics requested via `VERBOSE=1`.
    pub verbose: bool,
    /// Readiness deadline override.
    pub ready_timeout: Option<Duration>,
    /// Per-request timeout override.
    pub request_timeout: Option<Duration>,
    /// Container CLI program override.
    pub docker_program: Option<String>,
}

impl HarnessEnv {
    /// Loads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is not valid UTF-8 or
    /// fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(read_env_strict)
    }

    /// Loads overrides through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<Option<String>, ConfigError>,
    {
        let verbose = parse_verbose(lookup(HarnessEnvKey::Verbose.as_str())?.as_deref());
        let ready_timeout = lookup(HarnessEnvKey::ReadyTimeoutSeconds.as_str())?
            .map(|raw| parse_timeout_seconds(HarnessEnvKey::ReadyTimeoutSeconds.as_str(), &raw))
            .transpose()?;
        let request_timeout = lookup(HarnessEnvKey::RequestTimeoutSeconds.as_str())?
            .map(|raw| parse_timeout_seconds(HarnessEnvKey::RequestTimeoutSeconds.as_str(), &raw))
            .transpose()?;
        let docker_program = match lookup(HarnessEnvKey::DockerProgram.as_str())? {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Invalid(format!(
                    "{} must not be empty",
                    HarnessEnvKey::DockerProgram.as_str()
                )));
            }
            other => other,
        };
        Ok(Self {
            verbose,
            ready_timeout,
            request_timeout,
            docker_program,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads an environment variable and enforces UTF-8 validity.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the variable contains invalid UTF-8.
pub fn read_env_strict(name: &str) -> Result<Option<String>, ConfigError> {
    std::env::var_os(name).map_or(Ok(None), |raw| {
        raw.into_string()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(format!("{name} must be valid UTF-8")))
    })
}

/// Returns true only for the exact value `1`.
#[must_use]
pub fn parse_verbose(raw: Option<&str>) -> bool {
    raw == Some("1")
}

/// Parses a positive timeout value in whole seconds.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when the value is empty, non-numeric, or zero.
pub fn parse_timeout_seconds(name: &str, raw: &str) -> Result<Duration, ConfigError> {
    let trimmed = raw.trim();
    let secs: u64 = trimmed.parse().map_err(|_| {
        ConfigError::Invalid(format!("{name} must be a positive integer number of seconds"))
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
