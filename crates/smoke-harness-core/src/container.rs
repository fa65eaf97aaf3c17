// crates/smoke-harness-core/src/container.rs
// ============================================================================
// Module: Container Runtime
// Description: Build, start, inspect, exec, and teardown via a container CLI.
// Purpose: Provide the orchestration collaborator the harness depends on.
// Dependencies: async-trait, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! [`ContainerRuntime`] is the seam between the harness and whatever container
//! engine hosts the application. [`DockerCli`] drives the `docker` (or a
//! compatible `podman`) command line. Argument construction is kept in pure
//! functions so it can be tested without an engine.
//!
//! Invariants:
//! - The runtime owns container state; nothing here caches it.
//! - Removing an absent container is not an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::readiness::LogSource;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default container CLI program.
pub const DEFAULT_DOCKER_PROGRAM: &str = "docker";
/// Engine error text for a missing container.
const NO_SUCH_CONTAINER: &str = "No such container";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Everything needed to build and start one application container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name.
    pub name: String,
    /// Image tag.
    pub image: String,
    /// Build context directory.
    pub context: PathBuf,
    /// Optional Dockerfile path.
    pub dockerfile: Option<PathBuf>,
    /// Published port mappings (`host:container`).
    pub ports: Vec<String>,
    /// Container environment.
    pub env: BTreeMap<String, String>,
    /// Image build arguments.
    pub build_args: BTreeMap<String, String>,
}

/// Container runtime failures.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The runtime program could not be started.
    #[error("failed to run {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// OS error text.
        message: String,
    },
    /// The runtime command exited unsuccessfully.
    #[error("{command} exited with status {code}: {stderr}")]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit code, or -1 when terminated by a signal.
        code: i32,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// The command argument list was empty.
    #[error("command must not be empty")]
    EmptyCommand,
}

/// Orchestration surface the harness requires from a container engine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Builds the image for `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] when the build fails.
    async fn build(&self, spec: &ContainerSpec, no_cache: bool) -> Result<(), ContainerError>;

    /// Starts a detached container for `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] when the container cannot be started.
    async fn start(&self, spec: &ContainerSpec) -> Result<(), ContainerError>;

    /// Returns the container's accumulated logs (stdout then stderr).
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] when the logs cannot be read.
    async fn logs(&self, name: &str) -> Result<String, ContainerError>;

    /// Streams logs to the terminal until interrupted; returns the exit code.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] when the runtime cannot be started.
    async fn follow_logs(&self, name: &str) -> Result<i32, ContainerError>;

    /// Runs `argv` inside the container; returns its exit code.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] when the runtime cannot be started.
    async fn exec(&self, name: &str, argv: &[String]) -> Result<i32, ContainerError>;

    /// Stops and removes the container; absent containers are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ContainerError`] when stop or removal fails.
    async fn stop_and_remove(&self, name: &str) -> Result<(), ContainerError>;
}

// ============================================================================
// SECTION: Docker CLI
// ============================================================================

/// [`ContainerRuntime`] backed by the `docker` command line.
#[derive(Debug, Clone)]
pub struct DockerCli {
    /// Runtime program (for example `docker` or `podman`).
    program: String,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_PROGRAM)
    }
}

impl DockerCli {
    /// Creates a runtime that invokes `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs the program with inherited stdio and returns its exit code.
    async fn status(&self, args: &[String]) -> Result<i32, ContainerError> {
        debug!(program = %self.program, args = %args.join(" "), "running container command");
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|err| self.spawn_error(&err))?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Runs the program capturing output; non-zero exits become errors.
    async fn output(&self, args: &[String]) -> Result<(String, String), ContainerError> {
        debug!(program = %self.program, args = %args.join(" "), "running container command");
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| self.spawn_error(&err))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ContainerError::Failed {
                command: render_command(&self.program, args),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok((stdout, stderr))
    }

    /// Requires a zero exit from an inherited-stdio command.
    async fn checked_status(&self, args: &[String]) -> Result<(), ContainerError> {
        let code = self.status(args).await?;
        if code != 0 {
            return Err(ContainerError::Failed {
                command: render_command(&self.program, args),
                code,
                stderr: String::new(),
            });
        }
        Ok(())
    }

    /// Builds a spawn error for this program.
    fn spawn_error(&self, err: &std::io::Error) -> ContainerError {
        ContainerError::Spawn {
            program: self.program.clone(),
            message: err.to_string(),
        }
    }

    /// Runs a teardown step, treating a missing container as success.
    async fn ignore_missing(&self, args: &[String]) -> Result<(), ContainerError> {
        match self.output(args).await {
            Ok(_) => Ok(()),
            Err(ContainerError::Failed {
                stderr,
                ..
            }) if stderr.contains(NO_SUCH_CONTAINER) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn build(&self, spec: &ContainerSpec, no_cache: bool) -> Result<(), ContainerError> {
        self.checked_status(&build_args(spec, no_cache)).await
    }

    async fn start(&self, spec: &ContainerSpec) -> Result<(), ContainerError> {
        self.output(&run_args(spec)).await.map(|_| ())
    }

    async fn logs(&self, name: &str) -> Result<String, ContainerError> {
        let (stdout, stderr) = self.output(&["logs".to_string(), name.to_string()]).await?;
        Ok(format!("{stdout}{stderr}"))
    }

    async fn follow_logs(&self, name: &str) -> Result<i32, ContainerError> {
        self.status(&["logs".to_string(), "-f".to_string(), name.to_string()]).await
    }

    async fn exec(&self, name: &str, argv: &[String]) -> Result<i32, ContainerError> {
        if argv.is_empty() {
            return Err(ContainerError::EmptyCommand);
        }
        let mut args = vec!["exec".to_string(), name.to_string()];
        args.extend(argv.iter().cloned());
        self.status(&args).await
    }

    async fn stop_and_remove(&self, name: &str) -> Result<(), ContainerError> {
        self.ignore_missing(&["stop".to_string(), name.to_string()]).await?;
        self.ignore_missing(&["rm".to_string(), name.to_string()]).await
    }
}

// ============================================================================
// SECTION: Log Adapter
// ============================================================================

/// [`LogSource`] reading one named container through a runtime.
pub struct ContainerLogs<'a> {
    /// Runtime used to read logs.
    runtime: &'a dyn ContainerRuntime,
    /// Container name.
    name: &'a str,
}

impl<'a> ContainerLogs<'a> {
    /// Creates a log source for `name`.
    #[must_use]
    pub fn new(runtime: &'a dyn ContainerRuntime, name: &'a str) -> Self {
        Self {
            runtime,
            name,
        }
    }
}

#[async_trait]
impl LogSource for ContainerLogs<'_> {
    async fn read_logs(&self) -> Result<String, ContainerError> {
        self.runtime.logs(self.name).await
    }
}

// ============================================================================
// SECTION: Local Execution
// ============================================================================

/// Runs the application directly on the host with inherited stdio.
///
/// # Errors
///
/// Returns [`ContainerError::EmptyCommand`] for an empty `argv` and
/// [`ContainerError::Spawn`] when the program cannot be started.
pub async fn run_local(
    argv: &[String],
    workdir: Option<&Path>,
    env: &BTreeMap<String, String>,
) -> Result<i32, ContainerError> {
    let Some((program, args)) = argv.split_first() else {
        return Err(ContainerError::EmptyCommand);
    };
    let mut command = Command::new(program);
    command.args(args).envs(env.iter().map(|(key, value)| (OsStr::new(key), OsStr::new(value))));
    if let Some(dir) = workdir {
        command.current_dir(dir);
    }
    debug!(program = %program, "running application locally");
    let status = command.status().await.map_err(|err| ContainerError::Spawn {
        program: program.clone(),
        message: err.to_string(),
    })?;
    Ok(status.code().unwrap_or(-1))
}

// ============================================================================
// SECTION: Argument Builders
// ============================================================================

/// Builds `docker build` arguments for `spec`.
#[must_use]
pub fn build_args(spec: &ContainerSpec, no_cache: bool) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    if no_cache {
        args.push("--no-cache".to_string());
    }
    args.push("-t".to_string());
    args.push(spec.image.clone());
    if let Some(dockerfile) = &spec.dockerfile {
        args.push("-f".to_string());
        args.push(dockerfile.display().to_string());
    }
    for (key, value) in &spec.build_args {
        args.push("--build-arg".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(spec.context.display().to_string());
    args
}

/// Builds `docker run` arguments for `spec`.
#[must_use]
pub fn run_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-d".to_string(), "--name".to_string(), spec.name.clone()];
    for port in &spec.ports {
        args.push("-p".to_string());
        args.push(port.clone());
    }
    for (key, value) in &spec.env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    args.push(spec.image.clone());
    args
}

/// Renders a command line for error messages.
fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use super::*;

    fn spec() -> ContainerSpec {
        let mut env = BTreeMap::new();
        env.insert("JAVA_OPTS".to_string(), "-Xmx512m".to_string());
        let mut build_args = BTreeMap::new();
        build_args.insert("PROFILE".to_string(), "bench".to_string());
        ContainerSpec {
            name: "daytrader".to_string(),
            image: "daytrader-liberty:latest".to_string(),
            context: PathBuf::from("apps/daytrader"),
            dockerfile: Some(PathBuf::from("apps/daytrader/Dockerfile")),
            ports: vec!["9080:9080".to_string()],
            env,
            build_args,
        }
    }

    #[test]
    fn build_args_place_context_last() {
        let args = build_args(&spec(), true);
        assert_eq!(
            args,
            vec![
                "build",
                "--no-cache",
                "-t",
                "daytrader-liberty:latest",
                "-f",
                "apps/daytrader/Dockerfile",
                "--build-arg",
                "PROFILE=bench",
                "apps/daytrader",
            ]
        );
    }

    #[test]
    fn run_args_publish_ports_and_env() {
        let args = run_args(&spec());
        assert_eq!(
            args,
            vec![
                "run",
                "-d",
                "--name",
                "daytrader",
                "-p",
                "9080:9080",
                "-e",
                "JAVA_OPTS=-Xmx512m",
                "daytrader-liberty:latest",
            ]
        );
    }

    #[tokio::test]
    async fn run_local_rejects_empty_command() {
        let err = run_local(&[], None, &BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, ContainerError::EmptyCommand));
    }
}
