// crates/smoke-harness-config/src/config.rs
// ============================================================================
// Module: Harness Configuration
// Description: Loading and validation of per-application harness files.
// Purpose: Provide strict, fail-closed parsing of smoke-harness.toml.
// Dependencies: serde, smoke-harness-core, thiserror, toml
// ============================================================================

//! ## Overview
//! A harness file describes one benchmark application: how its container is
//! built and started, which readiness marker it prints, where it may be
//! reached, and which smoke cases prove it works. Files are loaded with hard
//! path and size limits and rejected when any field is unknown or invalid.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use smoke_harness_core::BaseUrlCandidates;
use smoke_harness_core::BrowserKind;
use smoke_harness_core::BrowserStep;
use smoke_harness_core::ContainerSpec;
use smoke_harness_core::FallbackPolicy;
use smoke_harness_core::HarnessContext;
use smoke_harness_core::ReadinessMarker;
use smoke_harness_core::ReadinessPolicy;
use smoke_harness_core::TestCase;
use smoke_harness_core::WebDriverConfig;
use smoke_harness_core::browser::DEFAULT_WEBDRIVER_ENDPOINT;
use thiserror::Error;

use crate::env::HarnessEnv;
use crate::env::HarnessEnvKey;
use crate::env::read_env_strict;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default harness filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "smoke-harness.toml";
/// Maximum harness file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum readiness timeout in seconds.
pub(crate) const MAX_READY_TIMEOUT_SECS: u64 = 3_600;
/// Minimum readiness poll interval in milliseconds.
pub(crate) const MIN_POLL_INTERVAL_MS: u64 = 10;
/// Maximum readiness poll interval in milliseconds.
pub(crate) const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Maximum per-request timeout in seconds.
pub(crate) const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
/// Maximum body preview size in bytes.
pub(crate) const MAX_BODY_PREVIEW_BYTES: usize = 64 * 1024;
/// Maximum number of HTTP cases.
pub(crate) const MAX_CASES: usize = 256;
/// Maximum number of browser steps.
pub(crate) const MAX_BROWSER_STEPS: usize = 256;
/// Maximum browser wait in milliseconds.
pub(crate) const MAX_BROWSER_WAIT_MS: u64 = 300_000;
/// Maximum WebDriver command timeout in seconds.
pub(crate) const MAX_COMMAND_TIMEOUT_SECS: u64 = 300;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default readiness marker.
const fn default_marker() -> ReadinessMarker {
    ReadinessMarker::OpenLiberty
}

/// Default readiness poll interval in milliseconds.
const fn default_interval_ms() -> u64 {
    1_000
}

/// Default readiness timeout in seconds.
const fn default_ready_timeout_secs() -> u64 {
    300
}

/// Default request timeout in seconds.
const fn default_request_timeout_secs() -> u64 {
    10
}

/// Default body preview size in bytes.
const fn default_body_preview_bytes() -> usize {
    200
}

/// Default build context.
fn default_context() -> PathBuf {
    PathBuf::from(".")
}

/// Default WebDriver endpoint.
fn default_endpoint() -> String {
    DEFAULT_WEBDRIVER_ENDPOINT.to_string()
}

/// Serde helper for `true` defaults.
const fn default_true() -> bool {
    true
}

/// Default WebDriver command timeout in seconds.
const fn default_command_timeout_secs() -> u64 {
    30
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// One application's harness file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Application identity and local execution.
    pub app: AppConfig,
    /// Container build and run settings.
    #[serde(default)]
    pub container: Option<ContainerConfig>,
    /// Readiness marker and deadline.
    #[serde(default)]
    pub readiness: ReadinessConfig,
    /// HTTP runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// HTTP smoke cases, executed in order.
    #[serde(default)]
    pub cases: Vec<TestCase>,
    /// Optional browser smoke suite.
    #[serde(default)]
    pub browser: Option<BrowserConfig>,
}

/// `[app]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application name; also the source of the default override variable.
    pub name: String,
    /// Explicit base URL override variable name.
    #[serde(default)]
    pub base_url_env: Option<String>,
    /// Fallback base URLs, in priority order.
    #[serde(default)]
    pub candidates: Vec<String>,
    /// Command for running the application without a container.
    #[serde(default)]
    pub run_command: Vec<String>,
    /// Working directory for `run_command`.
    #[serde(default)]
    pub workdir: Option<PathBuf>,
    /// Extra environment for `run_command`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[container]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Container name.
    pub name: String,
    /// Image tag.
    pub image: String,
    /// Build context directory.
    #[serde(default = "default_context")]
    pub context: PathBuf,
    /// Dockerfile path.
    #[serde(default)]
    pub dockerfile: Option<PathBuf>,
    /// Published ports (`host:container`).
    #[serde(default)]
    pub ports: Vec<String>,
    /// Container environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Image build arguments.
    #[serde(default)]
    pub build_args: BTreeMap<String, String>,
    /// Smoke command executed inside the running container by `test`.
    #[serde(default)]
    pub test_command: Vec<String>,
}

/// `[readiness]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessConfig {
    /// Marker that signals readiness.
    #[serde(default = "default_marker")]
    pub marker: ReadinessMarker,
    /// Delay between log reads, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Readiness deadline, in seconds.
    #[serde(default = "default_ready_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            interval_ms: default_interval_ms(),
            timeout_secs: default_ready_timeout_secs(),
        }
    }
}

/// `[runner]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Discovery behavior when no candidate responds.
    #[serde(default)]
    pub fallback: FallbackPolicy,
    /// Body bytes quoted in failure messages.
    #[serde(default = "default_body_preview_bytes")]
    pub body_preview_bytes: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            fallback: FallbackPolicy::default(),
            body_preview_bytes: default_body_preview_bytes(),
        }
    }
}

/// `[browser]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BrowserConfig {
    /// WebDriver endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Browser to request.
    #[serde(default)]
    pub browser: BrowserKind,
    /// Run the browser headless.
    #[serde(default = "default_true")]
    pub headless: bool,
    /// Per-command timeout, in seconds.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Steps, executed in order.
    #[serde(default)]
    pub steps: Vec<BrowserStep>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl HarnessConfig {
    /// Loads a harness file using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `SMOKE_HARNESS_CONFIG`, then
    /// `smoke-harness.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates harness TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.app.validate()?;
        if let Some(container) = &self.container {
            container.validate()?;
        }
        self.readiness.validate()?;
        self.runner.validate()?;
        if self.cases.len() > MAX_CASES {
            return Err(ConfigError::Invalid(format!("cases exceeds {MAX_CASES} entries")));
        }
        for (index, case) in self.cases.iter().enumerate() {
            validate_case(index, case)?;
        }
        if let Some(browser) = &self.browser {
            browser.validate()?;
        }
        Ok(())
    }

    /// Applies environment overrides to the loaded file and revalidates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override falls outside the
    /// bounds enforced for the file itself.
    pub fn apply_env(&mut self, env: &HarnessEnv) -> Result<(), ConfigError> {
        if let Some(timeout) = env.ready_timeout {
            self.readiness.timeout_secs = timeout.as_secs();
        }
        if let Some(timeout) = env.request_timeout {
            self.runner.request_timeout_secs = timeout.as_secs();
        }
        self.validate()
    }

    /// Returns the base URL override variable name.
    ///
    /// Uses `app.base_url_env` when set, otherwise the upper-cased application
    /// name with non-alphanumerics mapped to `_`, suffixed with `_BASE_URL`.
    #[must_use]
    pub fn base_url_env_name(&self) -> String {
        if let Some(name) = &self.app.base_url_env {
            return name.clone();
        }
        derive_base_url_env(&self.app.name)
    }

    /// Builds discovery candidates: `override_url` first, then the file's fallbacks.
    #[must_use]
    pub fn candidates(&self, override_url: Option<String>) -> BaseUrlCandidates {
        BaseUrlCandidates::from_override(override_url, &self.app.candidates)
    }

    /// Reads the override variable and builds discovery candidates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the variable is not valid UTF-8.
    pub fn candidates_from_env(&self) -> Result<BaseUrlCandidates, ConfigError> {
        let override_url = read_env_strict(&self.base_url_env_name())?;
        Ok(self.candidates(override_url))
    }

    /// Builds the run context.
    #[must_use]
    pub fn context(&self, verbose: bool) -> HarnessContext {
        HarnessContext {
            verbose,
            request_timeout: Duration::from_secs(self.runner.request_timeout_secs),
            fallback: self.runner.fallback,
            body_preview_bytes: self.runner.body_preview_bytes,
        }
    }

    /// Builds the readiness policy.
    #[must_use]
    pub const fn readiness_policy(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            interval: Duration::from_millis(self.readiness.interval_ms),
            timeout: Duration::from_secs(self.readiness.timeout_secs),
        }
    }

    /// Returns the `[container]` section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the section is absent.
    pub fn require_container(&self) -> Result<&ContainerConfig, ConfigError> {
        self.container.as_ref().ok_or_else(|| {
            ConfigError::Invalid(format!("{} has no [container] section", self.app.name))
        })
    }

    /// Builds the container spec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the `[container]` section is absent.
    pub fn container_spec(&self) -> Result<ContainerSpec, ConfigError> {
        let container = self.require_container()?;
        Ok(ContainerSpec {
            name: container.name.clone(),
            image: container.image.clone(),
            context: container.context.clone(),
            dockerfile: container.dockerfile.clone(),
            ports: container.ports.clone(),
            env: container.env.clone(),
            build_args: container.build_args.clone(),
        })
    }

    /// Builds the WebDriver settings when a browser suite is configured.
    #[must_use]
    pub fn webdriver_config(&self) -> Option<WebDriverConfig> {
        self.browser.as_ref().map(|browser| WebDriverConfig {
            endpoint: browser.endpoint.clone(),
            browser: browser.browser,
            headless: browser.headless,
            command_timeout: Duration::from_secs(browser.command_timeout_secs),
        })
    }
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

impl AppConfig {
    /// Validates the `[app]` section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("app.name must be non-empty".to_string()));
        }
        if let Some(name) = &self.base_url_env {
            validate_env_name("app.base_url_env", name)?;
        }
        for candidate in &self.candidates {
            validate_url("app.candidates", candidate)?;
        }
        if self.run_command.iter().any(|arg| arg.is_empty()) {
            return Err(ConfigError::Invalid(
                "app.run_command entries must be non-empty".to_string(),
            ));
        }
        if let Some(workdir) = &self.workdir {
            validate_path_string("app.workdir", &workdir.to_string_lossy())?;
        }
        for key in self.env.keys() {
            validate_env_name("app.env", key)?;
        }
        Ok(())
    }
}

impl ContainerConfig {
    /// Validates the `[container]` section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_container_name(&self.name)?;
        if self.image.trim().is_empty() || self.image.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(
                "container.image must be non-empty without whitespace".to_string(),
            ));
        }
        validate_path_string("container.context", &self.context.to_string_lossy())?;
        if let Some(dockerfile) = &self.dockerfile {
            validate_path_string("container.dockerfile", &dockerfile.to_string_lossy())?;
        }
        for port in &self.ports {
            validate_port_mapping(port)?;
        }
        for key in self.env.keys() {
            validate_env_name("container.env", key)?;
        }
        for key in self.build_args.keys() {
            if key.trim().is_empty() || key.contains('=') {
                return Err(ConfigError::Invalid(format!(
                    "container.build_args key {key} is invalid"
                )));
            }
        }
        if self.test_command.iter().any(|arg| arg.is_empty()) {
            return Err(ConfigError::Invalid(
                "container.test_command entries must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl ReadinessConfig {
    /// Validates the `[readiness]` section.
    fn validate(&self) -> Result<(), ConfigError> {
        self.marker
            .compile()
            .map_err(|err| ConfigError::Invalid(format!("readiness.marker: {err}")))?;
        if !(MIN_POLL_INTERVAL_MS ..= MAX_POLL_INTERVAL_MS).contains(&self.interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "readiness.interval_ms must be between {MIN_POLL_INTERVAL_MS} and \
                 {MAX_POLL_INTERVAL_MS}"
            )));
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_READY_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "readiness.timeout_secs must be between 1 and {MAX_READY_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }
}

impl RunnerConfig {
    /// Validates the `[runner]` section.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "runner.request_timeout_secs must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}"
            )));
        }
        if self.body_preview_bytes == 0 || self.body_preview_bytes > MAX_BODY_PREVIEW_BYTES {
            return Err(ConfigError::Invalid(format!(
                "runner.body_preview_bytes must be between 1 and {MAX_BODY_PREVIEW_BYTES}"
            )));
        }
        Ok(())
    }
}

impl BrowserConfig {
    /// Validates the `[browser]` section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_url("browser.endpoint", &self.endpoint)?;
        if self.command_timeout_secs == 0 || self.command_timeout_secs > MAX_COMMAND_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "browser.command_timeout_secs must be between 1 and {MAX_COMMAND_TIMEOUT_SECS}"
            )));
        }
        if self.steps.len() > MAX_BROWSER_STEPS {
            return Err(ConfigError::Invalid(format!(
                "browser.steps exceeds {MAX_BROWSER_STEPS} entries"
            )));
        }
        for (index, step) in self.steps.iter().enumerate() {
            validate_step(index, step)?;
        }
        Ok(())
    }
}

/// Validates one HTTP case.
fn validate_case(index: usize, case: &TestCase) -> Result<(), ConfigError> {
    if case.description.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("cases[{index}].description must be non-empty")));
    }
    if !case.path.starts_with('/') {
        return Err(ConfigError::Invalid(format!("cases[{index}].path must start with /")));
    }
    if !(100 ..= 599).contains(&case.expected_status) {
        return Err(ConfigError::Invalid(format!(
            "cases[{index}].expected_status must be between 100 and 599"
        )));
    }
    for name in case.headers.keys() {
        if name.is_empty() || !name.bytes().all(is_header_token_byte) {
            return Err(ConfigError::Invalid(format!(
                "cases[{index}].headers has invalid header name {name}"
            )));
        }
    }
    if case.body_contains.as_deref().is_some_and(str::is_empty) {
        return Err(ConfigError::Invalid(format!(
            "cases[{index}].body_contains must be non-empty when set"
        )));
    }
    Ok(())
}

/// Validates one browser step.
fn validate_step(index: usize, step: &BrowserStep) -> Result<(), ConfigError> {
    let selector = match step {
        BrowserStep::Navigate {
            path,
        } => {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "browser.steps[{index}].path must start with /"
                )));
            }
            return Ok(());
        }
        BrowserStep::WaitFor {
            selector,
            timeout_ms,
        } => {
            if *timeout_ms == 0 || *timeout_ms > MAX_BROWSER_WAIT_MS {
                return Err(ConfigError::Invalid(format!(
                    "browser.steps[{index}].timeout_ms must be between 1 and {MAX_BROWSER_WAIT_MS}"
                )));
            }
            selector
        }
        BrowserStep::Fill {
            selector,
            ..
        }
        | BrowserStep::Click {
            selector,
        }
        | BrowserStep::ExpectText {
            selector,
            ..
        } => selector,
    };
    if selector.trim().is_empty() {
        return Err(ConfigError::Invalid(format!(
            "browser.steps[{index}].selector must be non-empty"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Harness configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Derives `<APP>_BASE_URL` from an application name.
#[must_use]
pub fn derive_base_url_env(app_name: &str) -> String {
    let mut name: String = app_name
        .trim()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_uppercase() } else { '_' })
        .collect();
    name.push_str("_BASE_URL");
    name
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Some(env_path) = read_env_strict(HarnessEnvKey::Config.as_str())? {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an environment variable name (`[A-Z_][A-Z0-9_]*`, any case).
fn validate_env_name(field: &str, name: &str) -> Result<(), ConfigError> {
    let mut bytes = name.bytes();
    let valid = bytes.next().is_some_and(|first| first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_');
    if !valid {
        return Err(ConfigError::Invalid(format!("{field} has invalid variable name {name}")));
    }
    Ok(())
}

/// Validates an absolute HTTP(S) URL.
fn validate_url(field: &str, url: &str) -> Result<(), ConfigError> {
    let rest = url.strip_prefix("http://").or_else(|| url.strip_prefix("https://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::Invalid(format!("{field} entry {url} must be an http(s) URL"))),
    }
}

/// Validates a container name (`[a-zA-Z0-9][a-zA-Z0-9_.-]*`).
fn validate_container_name(name: &str) -> Result<(), ConfigError> {
    let mut bytes = name.bytes();
    let valid = bytes.next().is_some_and(|first| first.is_ascii_alphanumeric())
        && bytes.all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'.' | b'-'));
    if !valid {
        return Err(ConfigError::Invalid(format!("container.name {name} is invalid")));
    }
    Ok(())
}

/// Validates a `[ip:]host:container[/proto]` port mapping.
fn validate_port_mapping(mapping: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Invalid(format!("container.ports entry {mapping} is invalid"));
    let (ports, protocol) = match mapping.split_once('/') {
        Some((ports, protocol)) => (ports, Some(protocol)),
        None => (mapping, None),
    };
    if protocol.is_some_and(|protocol| protocol != "tcp" && protocol != "udp") {
        return Err(invalid());
    }
    let parts: Vec<&str> = ports.rsplitn(3, ':').collect();
    if parts.len() < 2 {
        return Err(invalid());
    }
    for port in parts.iter().take(2) {
        match port.parse::<u16>() {
            Ok(value) if value > 0 => {}
            _ => return Err(invalid()),
        }
    }
    if parts.get(2).is_some_and(|ip| ip.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

/// Returns true for RFC 7230 token characters.
const fn is_header_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

// ============================================================================
// SECTION: Tests
// ============================================================================
