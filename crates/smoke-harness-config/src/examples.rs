// crates/smoke-harness-config/src/examples.rs
// ============================================================================
// Module: Harness Examples
// Description: Canonical example harness file.
// Purpose: Deterministic template for `smoke-harness init` and docs.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for a harness file. The output is deterministic and is
//! validated by tests so the template never drifts from the model.

/// Returns a canonical example `smoke-harness.toml`.
#[must_use]
pub fn harness_toml_example() -> String {
    String::from(
        r##"[app]
name = "daytrader-liberty"
# base_url_env = "DAYTRADER_LIBERTY_BASE_URL"
candidates = ["http://localhost:9080/daytrader/", "http://127.0.0.1:9080/daytrader/"]
run_command = ["mvn", "liberty:run"]
workdir = "."

[container]
name = "daytrader-liberty"
image = "daytrader-liberty:latest"
context = "."
dockerfile = "Dockerfile"
ports = ["9080:9080", "9443:9443"]
test_command = ["curl", "-fsS", "http://localhost:9080/daytrader/"]

[container.env]
WLP_LOGGING_CONSOLE_FORMAT = "SIMPLE"

[readiness]
marker = { kind = "open_liberty" }
# marker = { kind = "quarkus" }
# marker = { kind = "spring_boot" }
# marker = { kind = "pattern", value = "Started .* in .* seconds" }
interval_ms = 1000
timeout_secs = 300

[runner]
request_timeout_secs = 10
fallback = "first_non_empty"
body_preview_bytes = 200

[[cases]]
description = "home page renders"
path = "/"
expected_status = 200
body_contains = "DayTrader"

[[cases]]
description = "quote lookup"
method = "GET"
path = "/rest/quotes/s:0"
expected_status = 200

[browser]
endpoint = "http://localhost:9515"
browser = "chrome"
headless = true
command_timeout_secs = 30

[[browser.steps]]
action = "navigate"
path = "/app"

[[browser.steps]]
action = "wait_for"
selector = "input[name=uid]"
timeout_ms = 10000

[[browser.steps]]
action = "fill"
selector = "input[name=uid]"
text = "uid:0"

[[browser.steps]]
action = "click"
selector = "input[type=submit]"

[[browser.steps]]
action = "expect_text"
selector = "body"
contains = "Welcome"
"##,
    )
}
