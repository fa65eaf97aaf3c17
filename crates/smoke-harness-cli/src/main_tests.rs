// crates/smoke-harness-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for command orchestration in the CLI entry point.
// Purpose: Pin lifecycle ordering, teardown, and exit code mapping.
// Dependencies: smoke-harness-cli main helpers
// ============================================================================

//! ## Overview
//! Drives the lifecycle commands against an in-memory container runtime so the
//! call order, readiness exit codes, and unconditional teardown of `cycle` are
//! checked without a container engine.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use clap::Parser;
use smoke_harness_cli::i18n::Locale;
use smoke_harness_config::HarnessConfig;
use smoke_harness_core::ContainerError;
use smoke_harness_core::ContainerRuntime;
use smoke_harness_core::ContainerSpec;
use smoke_harness_core::HarnessExit;

use super::BuildCommand;
use super::Cli;
use super::Commands;
use super::InitCommand;
use super::LangArg;
use super::Session;
use super::SessionCommands;
use super::command_cycle;
use super::command_init;
use super::command_test;
use super::command_up;
use super::resolve_locale;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Container runtime that records every call.
///
/// With `fail_remove` set, removal fails once a container has been started.
struct FakeRuntime {
    calls: Arc<Mutex<Vec<String>>>,
    logs: String,
    exec_code: i32,
    fail_remove: bool,
}

impl FakeRuntime {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn build(&self, spec: &ContainerSpec, no_cache: bool) -> Result<(), ContainerError> {
        self.record(format!("build {} no_cache={no_cache}", spec.image));
        Ok(())
    }

    async fn start(&self, spec: &ContainerSpec) -> Result<(), ContainerError> {
        self.record(format!("start {}", spec.name));
        Ok(())
    }

    async fn logs(&self, name: &str) -> Result<String, ContainerError> {
        self.record(format!("logs {name}"));
        Ok(self.logs.clone())
    }

    async fn follow_logs(&self, name: &str) -> Result<i32, ContainerError> {
        self.record(format!("follow {name}"));
        Ok(0)
    }

    async fn exec(&self, name: &str, argv: &[String]) -> Result<i32, ContainerError> {
        self.record(format!("exec {name} {}", argv.join(" ")));
        Ok(self.exec_code)
    }

    async fn stop_and_remove(&self, name: &str) -> Result<(), ContainerError> {
        let running = self.calls.lock().unwrap().iter().any(|call| call.starts_with("start"));
        self.record(format!("rm {name}"));
        if self.fail_remove && running {
            return Err(ContainerError::Failed {
                command: "docker rm -f demo".to_string(),
                code: 1,
                stderr: "daemon unavailable".to_string(),
            });
        }
        Ok(())
    }
}

const DEMO_TOML: &str = r#"
[app]
name = "demo"

[container]
name = "demo"
image = "demo:latest"
test_command = ["curl", "-fsS", "http://localhost:9080/"]

[readiness]
marker = { kind = "substring", value = "READY" }
interval_ms = 10
timeout_secs = 1
"#;

/// Builds a session over a fake runtime and returns its call log.
fn session(logs: &str, exec_code: i32, fail_remove: bool) -> (Session, Arc<Mutex<Vec<String>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let runtime = FakeRuntime {
        calls: Arc::clone(&calls),
        logs: logs.to_string(),
        exec_code,
        fail_remove,
    };
    let session = Session {
        config: HarnessConfig::from_toml(DEMO_TOML).expect("demo config"),
        verbose: false,
        runtime: Box::new(runtime),
    };
    (session, calls)
}

fn calls(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn temp_file(label: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("clock drift").as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("smoke-harness-cli-{label}-{nanos}.toml"));
    path
}

// ============================================================================
// SECTION: Locale
// ============================================================================

#[test]
fn flag_locale_wins_over_environment() {
    let locale = resolve_locale(Some(LangArg::Ca), Some("en")).unwrap();
    assert_eq!(locale, Locale::Ca);
    assert_eq!(resolve_locale(None, Some("ca_ES")).unwrap(), Locale::Ca);
    assert_eq!(resolve_locale(None, None).unwrap(), Locale::En);
}

#[test]
fn invalid_environment_locale_is_rejected() {
    let err = resolve_locale(None, Some("klingon")).unwrap_err();
    assert!(err.message.contains("SMOKE_HARNESS_LANG"));
    assert_eq!(err.exit, HarnessExit::Failure);
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[tokio::test]
async fn up_replaces_container_then_waits_for_marker() {
    let (session, log) = session("booting\nREADY\n", 0, false);
    let exit = command_up(&session).await.unwrap();
    assert_eq!(exit, HarnessExit::Success);
    assert_eq!(calls(&log), vec!["rm demo", "start demo", "logs demo"]);
}

#[tokio::test]
async fn up_without_marker_exits_not_ready() {
    let (session, log) = session("booting\n", 0, false);
    let err = command_up(&session).await.unwrap_err();
    assert_eq!(err.exit, HarnessExit::NotReady);
    assert_eq!(err.exit.code(), 3);
    assert!(calls(&log).iter().filter(|call| *call == "logs demo").count() >= 2);
}

#[tokio::test]
async fn test_command_failure_is_reported() {
    let (session, log) = session("READY", 7, false);
    let err = command_test(&session).await.unwrap_err();
    assert!(err.message.contains("status 7"), "{}", err.message);
    assert_eq!(calls(&log), vec!["exec demo curl -fsS http://localhost:9080/"]);
}

#[tokio::test]
async fn cycle_runs_every_phase_in_order() {
    let (session, log) = session("READY", 0, false);
    let exit = command_cycle(&session, &BuildCommand::default()).await.unwrap();
    assert_eq!(exit, HarnessExit::Success);
    assert_eq!(
        calls(&log),
        vec![
            "build demo:latest no_cache=false",
            "rm demo",
            "start demo",
            "logs demo",
            "exec demo curl -fsS http://localhost:9080/",
            "rm demo",
        ]
    );
}

#[tokio::test]
async fn cycle_tears_down_after_failed_test() {
    let (session, log) = session("READY", 1, false);
    let err = command_cycle(&session, &BuildCommand::default()).await.unwrap_err();
    assert_eq!(err.exit, HarnessExit::Failure);
    assert_eq!(calls(&log).last().map(String::as_str), Some("rm demo"));
}

#[tokio::test]
async fn cycle_tears_down_after_readiness_timeout() {
    let (session, log) = session("still starting", 0, false);
    let err = command_cycle(&session, &BuildCommand::default()).await.unwrap_err();
    assert_eq!(err.exit, HarnessExit::NotReady);
    let log = calls(&log);
    assert_eq!(log.last().map(String::as_str), Some("rm demo"));
    assert!(!log.iter().any(|call| call.starts_with("exec")));
}

#[tokio::test]
async fn cycle_teardown_failure_fails_a_passing_run() {
    let (session, log) = session("READY", 0, true);
    let exit = command_cycle(&session, &BuildCommand::default()).await.unwrap();
    assert_eq!(exit, HarnessExit::Failure);
    assert_eq!(calls(&log).last().map(String::as_str), Some("rm demo"));
}

// ============================================================================
// SECTION: Init
// ============================================================================

#[test]
fn init_dispatches_without_a_harness_session() {
    let cli = Cli::try_parse_from(["smoke-harness", "init", "--force"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Init(InitCommand {
            force: true,
        }))
    ));
    let cli = Cli::try_parse_from(["smoke-harness", "smoke", "--no-browser"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Session(SessionCommands::Smoke(_)))));
    let cli = Cli::try_parse_from(["smoke-harness", "validate"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::Session(SessionCommands::Validate))));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let path = temp_file("init");
    fs::write(&path, "keep me").unwrap();
    let err = command_init(
        Some(&path),
        &InitCommand {
            force: false,
        },
    )
    .unwrap_err();
    assert!(err.message.contains("--force"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "keep me");

    command_init(
        Some(&path),
        &InitCommand {
            force: true,
        },
    )
    .unwrap();
    let written = fs::read_to_string(&path).unwrap();
    assert!(HarnessConfig::from_toml(&written).is_ok());
    let _ = fs::remove_file(&path);
}
