// crates/smoke-harness-cli/tests/smoke_command.rs
// ============================================================================
// Module: CLI Smoke Command Tests
// Description: Integration tests for smoke, discover, init, and validate.
// Purpose: Ensure the binary prints results and maps outcomes to exit codes.
// Dependencies: smoke-harness-cli binary, tempfile, tiny_http
// ============================================================================

//! CLI smoke command integration tests.

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

use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::thread;

use tempfile::TempDir;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Environment variables that would leak host settings into a run.
const ISOLATED_ENV: &[&str] = &[
    "DEMO_BASE_URL",
    "SMOKE_HARNESS_CONFIG",
    "SMOKE_HARNESS_LANG",
    "SMOKE_HARNESS_READY_TIMEOUT_SEC",
    "SMOKE_HARNESS_REQUEST_TIMEOUT_SEC",
    "SMOKE_HARNESS_DOCKER",
    "VERBOSE",
];

fn harness_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_smoke-harness"))
}

fn command() -> Command {
    let mut command = Command::new(harness_bin());
    for name in ISOLATED_ENV {
        command.env_remove(name);
    }
    command
}

fn run(config: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = command();
    command.arg("--config").arg(config).args(args);
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("run smoke-harness")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Serves a fixed route table on a background thread and returns the base URL.
fn serve(routes: &[(&str, u16, &str)]) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let routes: Vec<(String, u16, String)> = routes
        .iter()
        .map(|(path, status, body)| ((*path).to_string(), *status, (*body).to_string()))
        .collect();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let (status, body) = routes
                .iter()
                .find(|(path, _, _)| path == request.url())
                .map_or((404, "not found".to_string()), |(_, status, body)| (*status, body.clone()));
            let _ = request.respond(Response::from_string(body).with_status_code(status));
        }
    });
    format!("http://{addr}")
}

fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Writes a harness file with two checks and the given `[app]` extras.
fn write_config(dir: &TempDir, app_extra: &str, runner_extra: &str) -> PathBuf {
    let path = dir.path().join("smoke-harness.toml");
    let content = format!(
        r#"[app]
name = "demo"
{app_extra}

[runner]
request_timeout_secs = 2
{runner_extra}

[[cases]]
description = "health"
path = "/health"
expected_status = 200
body_contains = "OK"

[[cases]]
description = "home"
path = "/"
body_contains = "Welcome"
"#
    );
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// SECTION: Smoke
// ============================================================================

#[test]
fn smoke_passes_against_healthy_server() {
    let base = serve(&[("/health", 200, "OK"), ("/", 200, "Welcome to demo")]);
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "", "");
    let output = run(&config, &["smoke"], &[("DEMO_BASE_URL", base.as_str())]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "stdout: {out}\nstderr: {}", stderr(&output));
    assert!(out.contains(&format!("Testing demo at {base}")));
    assert!(out.contains("PASS [1] health"));
    assert!(out.contains("PASS [2] home"));
    assert!(out.contains("All 2 checks passed"));
}

#[test]
fn smoke_fails_fast_on_unhealthy_status() {
    let base = serve(&[("/health", 503, "Service Unavailable"), ("/", 200, "Welcome")]);
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "", "");
    let output = run(&config, &["smoke"], &[("DEMO_BASE_URL", base.as_str())]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "stdout: {out}");
    assert!(out.contains("FAIL [1] health: expected status 200, got 503"));
    assert!(!out.contains("home"));
    assert!(out.contains("Smoke test failed at check 1 of 2"));
}

#[test]
fn smoke_without_candidates_exits_two() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "", "");
    let output = run(&config, &["smoke"], &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("DEMO_BASE_URL"));
}

#[test]
fn empty_override_falls_through_to_candidates() {
    let base = serve(&[("/health", 200, "OK"), ("/", 200, "Welcome")]);
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &format!("candidates = [\"{base}\"]"), "");
    let output = run(&config, &["smoke"], &[("DEMO_BASE_URL", "")]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
}

#[test]
fn unreachable_candidates_fall_back_with_warning() {
    let dead = refused_url();
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &format!("candidates = [\"{dead}\"]"), "");
    let output = run(&config, &["smoke"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains(&format!("falling back to unvalidated {dead}")));
    assert!(stdout(&output).contains("FAIL [1] health: network error"));
}

#[test]
fn strict_fallback_refuses_unreachable_candidates() {
    let dead = refused_url();
    let dir = TempDir::new().unwrap();
    let config =
        write_config(&dir, &format!("candidates = [\"{dead}\"]"), "fallback = \"strict\"");
    let output = run(&config, &["smoke"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Base URL discovery failed"));
    assert!(!stdout(&output).contains("FAIL"));
}

#[test]
fn base_url_flag_takes_precedence() {
    let base = serve(&[("/health", 200, "OK"), ("/", 200, "Welcome")]);
    let dead = refused_url();
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "", "");
    let output =
        run(&config, &["smoke", "--base-url", base.as_str()], &[("DEMO_BASE_URL", dead.as_str())]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
}

#[test]
fn verbose_one_logs_requests_to_stderr() {
    let base = serve(&[("/health", 200, "OK"), ("/", 200, "Welcome")]);
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "", "");
    let output = run(&config, &["smoke"], &[("DEMO_BASE_URL", base.as_str()), ("VERBOSE", "1")]);
    let err = stderr(&output);
    assert_eq!(output.status.code(), Some(0), "stderr: {err}");
    assert!(err.contains("sending smoke request"), "stderr: {err}");
    assert!(!err.contains('\u{1b}'), "piped stderr carried escape codes: {err}");
}

#[test]
fn verbose_other_than_one_stays_quiet() {
    let base = serve(&[("/health", 200, "OK"), ("/", 200, "Welcome")]);
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "", "");
    let output =
        run(&config, &["smoke"], &[("DEMO_BASE_URL", base.as_str()), ("VERBOSE", "true")]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).is_empty(), "stderr: {}", stderr(&output));
}

// ============================================================================
// SECTION: Discover
// ============================================================================

#[test]
fn discover_prints_selected_url() {
    let base = serve(&[("/", 200, "Welcome")]);
    let dead = refused_url();
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &format!("candidates = [\"{dead}\", \"{base}\"]"), "");
    let output = run(&config, &["discover"], &[]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), base);
    assert!(stderr(&output).is_empty(), "{}", stderr(&output));
}

// ============================================================================
// SECTION: Files and Flags
// ============================================================================

#[test]
fn init_then_validate_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("harness.toml");
    let output = run(&path, &["init"], &[]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(path.exists());

    let output = run(&path, &["validate"], &[]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("daytrader-liberty"));

    let output = run(&path, &["init"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("--force"));
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("smoke-harness.toml");
    fs::write(&path, "[app]\nname = \"demo\"\nunknown = 1\n").unwrap();
    let output = run(&path, &["validate"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Failed to load harness file"));
}

#[test]
fn out_of_range_timeout_override_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "", "");
    let output =
        run(&config, &["validate"], &[("SMOKE_HARNESS_REQUEST_TIMEOUT_SEC", "999999999")]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Invalid environment override"), "stderr: {err}");
    assert!(err.contains("runner.request_timeout_secs"), "stderr: {err}");

    let output = run(&config, &["validate"], &[("SMOKE_HARNESS_READY_TIMEOUT_SEC", "3601")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("readiness.timeout_secs"));
}

#[test]
fn version_flag_prints_version() {
    let output = command().arg("--version").output().expect("run smoke-harness");
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), format!("smoke-harness {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn catalan_output_carries_disclaimer() {
    let output = command().args(["--lang", "ca", "--version"]).output().expect("run smoke-harness");
    assert!(output.status.success());
    assert!(stderr(&output).contains("traduïda automàticament"));
}
