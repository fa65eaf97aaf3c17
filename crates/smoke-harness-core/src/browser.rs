// crates/smoke-harness-core/src/browser.rs
// ============================================================================
// Module: Browser Smoke Runner
// Description: Fail-fast browser steps over the W3C WebDriver HTTP protocol.
// Purpose: Exercise applications whose smoke tests need a real browser.
// Dependencies: async-trait, reqwest, serde, serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! [`BrowserStep`]s are executed in order against one WebDriver session,
//! with the same fail-fast contract and [`SuiteReport`] as the HTTP runner.
//! [`WebDriverClient`] speaks the W3C wire protocol to chromedriver,
//! geckodriver, or a Selenium endpoint.
//!
//! Invariants:
//! - Exactly one session is opened per suite and it is always released.
//! - Step `k + 1` is never executed when step `k` fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Method;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tokio::time::sleep;
use tracing::debug;
use tracing::warn;

use crate::context::HarnessContext;
use crate::report::CaseFailure;
use crate::report::CaseResult;
use crate::report::HarnessWarning;
use crate::report::ReportSink;
use crate::report::SuiteReport;
use crate::runner::join_url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// W3C web element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// WebDriver error code for a missing element.
const NO_SUCH_ELEMENT: &str = "no such element";
/// Default `wait_for` timeout in milliseconds.
pub(crate) const DEFAULT_WAIT_MS: u64 = 10_000;
/// Delay between element lookups while waiting.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Default WebDriver endpoint (chromedriver).
pub const DEFAULT_WEBDRIVER_ENDPOINT: &str = "http://localhost:9515";

// ============================================================================
// SECTION: Steps
// ============================================================================

/// Returns the default `wait_for` timeout.
const fn default_wait_ms() -> u64 {
    DEFAULT_WAIT_MS
}

/// One browser smoke step, tagged by `action` in harness files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BrowserStep {
    /// Load a path relative to the base URL.
    Navigate {
        /// Relative path.
        path: String,
    },
    /// Type text into the element matching `selector`.
    Fill {
        /// CSS selector.
        selector: String,
        /// Text to type.
        text: String,
    },
    /// Click the element matching `selector`.
    Click {
        /// CSS selector.
        selector: String,
    },
    /// Wait until an element matching `selector` exists.
    WaitFor {
        /// CSS selector.
        selector: String,
        /// Maximum wait in milliseconds.
        #[serde(default = "default_wait_ms")]
        timeout_ms: u64,
    },
    /// Require the element text to contain `contains`.
    ExpectText {
        /// CSS selector.
        selector: String,
        /// Expected substring.
        contains: String,
    },
}

impl BrowserStep {
    /// Human-readable description used in reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Navigate {
                path,
            } => format!("navigate to {path}"),
            Self::Fill {
                selector,
                ..
            } => format!("fill {selector}"),
            Self::Click {
                selector,
            } => format!("click {selector}"),
            Self::WaitFor {
                selector,
                timeout_ms,
            } => format!("wait for {selector} ({timeout_ms} ms)"),
            Self::ExpectText {
                selector,
                contains,
            } => format!("expect {selector} to contain \"{contains}\""),
        }
    }

    /// Rendered expectation for reports.
    fn expectation(&self) -> String {
        match self {
            Self::Navigate {
                ..
            } => "page loaded".to_string(),
            Self::Fill {
                ..
            }
            | Self::Click {
                ..
            }
            | Self::WaitFor {
                ..
            } => "element present".to_string(),
            Self::ExpectText {
                contains,
                ..
            } => format!("text containing \"{contains}\""),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Browser automation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    /// The WebDriver endpoint could not be reached or timed out.
    #[error("webdriver transport error: {0}")]
    Transport(String),
    /// The WebDriver endpoint returned a protocol error.
    #[error("webdriver error {error}: {message}")]
    Protocol {
        /// W3C error code.
        error: String,
        /// Driver message.
        message: String,
    },
    /// The response did not have the expected shape.
    #[error("invalid webdriver response: {0}")]
    InvalidResponse(String),
    /// No element matched the selector.
    #[error("no element matches {selector}")]
    MissingElement {
        /// CSS selector.
        selector: String,
    },
    /// The element did not appear before the wait deadline.
    #[error("element {selector} did not appear within {timeout_ms} ms")]
    WaitTimeout {
        /// CSS selector.
        selector: String,
        /// Applied timeout in milliseconds.
        timeout_ms: u64,
    },
}

// ============================================================================
// SECTION: Driver Seam
// ============================================================================

/// Minimal WebDriver command set used by the browser runner.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Opens a session and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] when no session could be created.
    async fn open_session(&self) -> Result<String, BrowserError>;

    /// Navigates the session to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] when navigation fails.
    async fn navigate(&self, session: &str, url: &str) -> Result<(), BrowserError>;

    /// Finds the first element matching a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] for failures other than a missing element.
    async fn find(&self, session: &str, selector: &str) -> Result<Option<String>, BrowserError>;

    /// Types `text` into an element.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] when the command fails.
    async fn send_keys(&self, session: &str, element: &str, text: &str) -> Result<(), BrowserError>;

    /// Clicks an element.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] when the command fails.
    async fn click(&self, session: &str, element: &str) -> Result<(), BrowserError>;

    /// Returns the rendered text of an element.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] when the command fails.
    async fn text(&self, session: &str, element: &str) -> Result<String, BrowserError>;

    /// Deletes the session.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError`] when the session cannot be deleted.
    async fn close_session(&self, session: &str) -> Result<(), BrowserError>;
}

// ============================================================================
// SECTION: WebDriver Client
// ============================================================================

/// Browsers with known capability layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserKind {
    /// Chrome or Chromium via chromedriver.
    #[default]
    Chrome,
    /// Firefox via geckodriver.
    Firefox,
}

impl BrowserKind {
    /// W3C `browserName` capability value.
    #[must_use]
    pub const fn capability_name(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }
}

/// WebDriver endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDriverConfig {
    /// Endpoint base URL.
    pub endpoint: String,
    /// Browser to request.
    pub browser: BrowserKind,
    /// Request a headless browser.
    pub headless: bool,
    /// Timeout for each WebDriver command.
    pub command_timeout: Duration,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WEBDRIVER_ENDPOINT.to_string(),
            browser: BrowserKind::Chrome,
            headless: true,
            command_timeout: Duration::from_secs(30),
        }
    }
}

/// [`BrowserDriver`] speaking the W3C WebDriver HTTP protocol.
pub struct WebDriverClient {
    /// HTTP client for WebDriver commands.
    client: Client,
    /// Endpoint settings.
    config: WebDriverConfig,
}

impl WebDriverClient {
    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BrowserError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: WebDriverConfig) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .timeout(config.command_timeout)
            .build()
            .map_err(|err| BrowserError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            config,
        })
    }

    /// Sends one command and returns the unwrapped `value` member.
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = join_url(&self.config.endpoint, path);
        debug!(method = %method, url = %url, "sending webdriver command");
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response =
            request.send().await.map_err(|err| BrowserError::Transport(err.to_string()))?;
        let text = response.text().await.map_err(|err| BrowserError::Transport(err.to_string()))?;
        let payload: Value = serde_json::from_str(&text)
            .map_err(|err| BrowserError::InvalidResponse(err.to_string()))?;
        unwrap_value(payload)
    }

    /// Session-scoped command path.
    fn session_path(session: &str, suffix: &str) -> String {
        format!("session/{session}{suffix}")
    }
}

#[async_trait]
impl BrowserDriver for WebDriverClient {
    async fn open_session(&self) -> Result<String, BrowserError> {
        let body = capabilities(self.config.browser, self.config.headless);
        let value = self.command(Method::POST, "session", Some(body)).await?;
        session_id(&value)
    }

    async fn navigate(&self, session: &str, url: &str) -> Result<(), BrowserError> {
        let path = Self::session_path(session, "/url");
        self.command(Method::POST, &path, Some(json!({ "url": url }))).await.map(|_| ())
    }

    async fn find(&self, session: &str, selector: &str) -> Result<Option<String>, BrowserError> {
        let path = Self::session_path(session, "/element");
        let body = json!({ "using": "css selector", "value": selector });
        match self.command(Method::POST, &path, Some(body)).await {
            Ok(value) => element_id(&value).map(Some),
            Err(BrowserError::Protocol {
                error,
                ..
            }) if error == NO_SUCH_ELEMENT => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn send_keys(&self, session: &str, element: &str, text: &str) -> Result<(), BrowserError> {
        let path = Self::session_path(session, &format!("/element/{element}/value"));
        self.command(Method::POST, &path, Some(json!({ "text": text }))).await.map(|_| ())
    }

    async fn click(&self, session: &str, element: &str) -> Result<(), BrowserError> {
        let path = Self::session_path(session, &format!("/element/{element}/click"));
        self.command(Method::POST, &path, Some(json!({}))).await.map(|_| ())
    }

    async fn text(&self, session: &str, element: &str) -> Result<String, BrowserError> {
        let path = Self::session_path(session, &format!("/element/{element}/text"));
        let value = self.command(Method::GET, &path, None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BrowserError::InvalidResponse("element text is not a string".to_string()))
    }

    async fn close_session(&self, session: &str) -> Result<(), BrowserError> {
        let path = Self::session_path(session, "");
        self.command(Method::DELETE, &path, None).await.map(|_| ())
    }
}

// ============================================================================
// SECTION: Wire Helpers
// ============================================================================

/// Builds the new-session capabilities payload.
#[must_use]
pub fn capabilities(browser: BrowserKind, headless: bool) -> Value {
    let mut always_match = json!({ "browserName": browser.capability_name() });
    if headless {
        let (key, options) = match browser {
            BrowserKind::Chrome => {
                ("goog:chromeOptions", json!({ "args": ["--headless=new", "--no-sandbox"] }))
            }
            BrowserKind::Firefox => ("moz:firefoxOptions", json!({ "args": ["-headless"] })),
        };
        if let Some(map) = always_match.as_object_mut() {
            map.insert(key.to_string(), options);
        }
    }
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Extracts `value`, converting W3C error payloads into [`BrowserError`].
fn unwrap_value(mut payload: Value) -> Result<Value, BrowserError> {
    let Some(value) = payload.get_mut("value").map(Value::take) else {
        return Err(BrowserError::InvalidResponse("missing value member".to_string()));
    };
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value.get("message").and_then(Value::as_str).unwrap_or_default();
        return Err(BrowserError::Protocol {
            error: error.to_string(),
            message: message.to_string(),
        });
    }
    Ok(value)
}

/// Reads the session identifier from a new-session response value.
fn session_id(value: &Value) -> Result<String, BrowserError> {
    value
        .get("sessionId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BrowserError::InvalidResponse("missing sessionId".to_string()))
}

/// Reads the element reference from a find-element response value.
fn element_id(value: &Value) -> Result<String, BrowserError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BrowserError::InvalidResponse("missing element reference".to_string()))
}

// ============================================================================
// SECTION: Session Scope
// ============================================================================

/// Owns an open session until it is explicitly closed or dropped.
struct SessionGuard {
    /// Driver that owns the session.
    driver: Arc<dyn BrowserDriver>,
    /// Open session identifier; `None` once closed.
    session: Option<String>,
}

impl SessionGuard {
    /// Session identifier.
    fn id(&self) -> &str {
        self.session.as_deref().unwrap_or_default()
    }

    /// Closes the session, converting a failure into a leak warning.
    async fn close(mut self) -> Result<(), HarnessWarning> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        self.driver.close_session(&session).await.map_err(|err| HarnessWarning::SessionLeak {
            session,
            message: err.to_string(),
        })
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            warn!(session = %session, "browser session leaked without a runtime");
            return;
        };
        let driver = Arc::clone(&self.driver);
        drop(handle.spawn(async move {
            if let Err(err) = driver.close_session(&session).await {
                warn!(session = %session, error = %err, "best-effort browser session close failed");
            }
        }));
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Runs `steps` in one browser session, stopping at the first failure.
///
/// The session is closed on every return path; a failed close is reported as
/// [`HarnessWarning::SessionLeak`] without changing the suite outcome.
pub async fn run_browser_suite(
    driver: Arc<dyn BrowserDriver>,
    base_url: &str,
    steps: &[BrowserStep],
    context: &HarnessContext,
    sink: &mut dyn ReportSink,
) -> SuiteReport {
    let started = Instant::now();
    let session = match driver.open_session().await {
        Ok(session) => session,
        Err(err) => {
            let result = CaseResult::failed(
                "open browser session",
                "session created",
                err.to_string(),
                CaseFailure::Browser {
                    message: err.to_string(),
                },
            );
            sink.case_finished(0, &result);
            return SuiteReport::new(vec![result], started.elapsed());
        }
    };
    debug!(session = %session, "browser session opened");
    let guard = SessionGuard {
        driver: Arc::clone(&driver),
        session: Some(session),
    };
    let mut results = Vec::with_capacity(steps.len());
    for (index, step) in steps.iter().enumerate() {
        let result = run_step(driver.as_ref(), guard.id(), base_url, step, context).await;
        sink.case_finished(index, &result);
        let failed = !result.is_pass();
        results.push(result);
        if failed {
            break;
        }
    }
    if let Err(warning) = guard.close().await {
        sink.warning(&warning);
    }
    SuiteReport::new(results, started.elapsed())
}

/// Executes one step and converts the outcome into a [`CaseResult`].
async fn run_step(
    driver: &dyn BrowserDriver,
    session: &str,
    base_url: &str,
    step: &BrowserStep,
    context: &HarnessContext,
) -> CaseResult {
    let description = step.describe();
    let expected = step.expectation();
    match execute(driver, session, base_url, step).await {
        Ok(StepOutcome::Done(actual)) => CaseResult::passed(description, expected, actual),
        Ok(StepOutcome::TextMismatch {
            needle,
            text,
        }) => {
            let snippet = context.preview(&text);
            CaseResult::failed(
                description,
                expected,
                format!("text \"{snippet}\""),
                CaseFailure::Body {
                    expected: needle,
                    snippet,
                },
            )
        }
        Err(err) => CaseResult::failed(
            description,
            expected,
            err.to_string(),
            CaseFailure::Browser {
                message: err.to_string(),
            },
        ),
    }
}

/// Result of a step that reached the driver successfully.
enum StepOutcome {
    /// The step passed; carries the rendered observation.
    Done(String),
    /// Element text lacked the expected substring.
    TextMismatch {
        /// Expected substring.
        needle: String,
        /// Observed element text.
        text: String,
    },
}

/// Issues the driver commands for one step.
async fn execute(
    driver: &dyn BrowserDriver,
    session: &str,
    base_url: &str,
    step: &BrowserStep,
) -> Result<StepOutcome, BrowserError> {
    match step {
        BrowserStep::Navigate {
            path,
        } => {
            let url = join_url(base_url, path);
            driver.navigate(session, &url).await?;
            Ok(StepOutcome::Done(format!("loaded {url}")))
        }
        BrowserStep::Fill {
            selector,
            text,
        } => {
            let element = require(driver, session, selector).await?;
            driver.send_keys(session, &element, text).await?;
            Ok(StepOutcome::Done("element filled".to_string()))
        }
        BrowserStep::Click {
            selector,
        } => {
            let element = require(driver, session, selector).await?;
            driver.click(session, &element).await?;
            Ok(StepOutcome::Done("element clicked".to_string()))
        }
        BrowserStep::WaitFor {
            selector,
            timeout_ms,
        } => {
            let deadline = Instant::now() + Duration::from_millis(*timeout_ms);
            loop {
                if driver.find(session, selector).await?.is_some() {
                    return Ok(StepOutcome::Done("element present".to_string()));
                }
                if Instant::now() >= deadline {
                    return Err(BrowserError::WaitTimeout {
                        selector: selector.clone(),
                        timeout_ms: *timeout_ms,
                    });
                }
                sleep(WAIT_POLL_INTERVAL).await;
            }
        }
        BrowserStep::ExpectText {
            selector,
            contains,
        } => {
            let element = require(driver, session, selector).await?;
            let text = driver.text(session, &element).await?;
            if text.contains(contains.as_str()) {
                Ok(StepOutcome::Done(format!("text contains \"{contains}\"")))
            } else {
                Ok(StepOutcome::TextMismatch {
                    needle: contains.clone(),
                    text,
                })
            }
        }
    }
}

/// Finds an element or fails with [`BrowserError::MissingElement`].
async fn require(
    driver: &dyn BrowserDriver,
    session: &str,
    selector: &str,
) -> Result<String, BrowserError> {
    driver.find(session, selector).await?.ok_or_else(|| BrowserError::MissingElement {
        selector: selector.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
