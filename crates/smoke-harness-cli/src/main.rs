// crates/smoke-harness-cli/src/main.rs
// ============================================================================
// Module: Smoke Harness CLI Entry Point
// Description: Command dispatcher for container lifecycle and smoke runs.
// Purpose: Provide one localized CLI for build, run, readiness, and testing.
// Dependencies: clap, smoke-harness-config, smoke-harness-core, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The smoke-harness CLI drives an application through its container
//! lifecycle (`build`, `rebuild`, `up`, `logs`, `down`, `test`, `cycle`),
//! runs it on the host (`run-local`), and checks it from the host (`smoke`,
//! `discover`). All user-facing strings are routed through the i18n catalog.
//!
//! Exit codes: `0` success, `1` failure, `2` no usable base URL, `3` the
//! readiness marker never appeared.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::IsTerminal;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use smoke_harness_cli::console::ConsoleReporter;
use smoke_harness_cli::console::format_elapsed;
use smoke_harness_cli::i18n::Locale;
use smoke_harness_cli::i18n::set_locale;
use smoke_harness_cli::t;
use smoke_harness_config::DEFAULT_CONFIG_NAME;
use smoke_harness_config::HarnessConfig;
use smoke_harness_config::HarnessEnv;
use smoke_harness_config::harness_toml_example;
use smoke_harness_core::BrowserDriver;
use smoke_harness_core::ContainerError;
use smoke_harness_core::ContainerLogs;
use smoke_harness_core::ContainerRuntime;
use smoke_harness_core::Discovery;
use smoke_harness_core::DiscoveryError;
use smoke_harness_core::DockerCli;
use smoke_harness_core::HarnessContext;
use smoke_harness_core::HarnessExit;
use smoke_harness_core::HttpClientSettings;
use smoke_harness_core::HttpProbe;
use smoke_harness_core::ReportSink;
use smoke_harness_core::ReqwestTransport;
use smoke_harness_core::SmokeRunner;
use smoke_harness_core::WebDriverClient;
use smoke_harness_core::discover_base_url;
use smoke_harness_core::run_browser_suite;
use smoke_harness_core::run_local;
use smoke_harness_core::wait_for_ready;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "SMOKE_HARNESS_LANG";
/// Log filter applied when diagnostics are enabled.
const VERBOSE_FILTER: &str = "warn,smoke_harness_core=debug,smoke_harness=debug";
/// Log filter applied otherwise.
const QUIET_FILTER: &str = "warn";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "smoke-harness", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `SMOKE_HARNESS_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Harness file (overrides `SMOKE_HARNESS_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Emit request and readiness diagnostics (same as `VERBOSE=1`).
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    verbose: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an example harness file.
    Init(InitCommand),
    /// Commands that load the harness file.
    #[command(flatten)]
    Session(SessionCommands),
}

/// Subcommands that run against a loaded harness file.
#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Build the application image.
    Build(BuildCommand),
    /// Remove the container and rebuild the image without cache.
    Rebuild,
    /// Start the container and wait for the readiness marker.
    Up,
    /// Follow the container logs.
    Logs,
    /// Stop and remove the container.
    Down,
    /// Run the configured smoke command inside the container.
    Test,
    /// Run the application on the host without a container.
    RunLocal,
    /// Discover the base URL and run the smoke checks from the host.
    Smoke(SmokeCommand),
    /// Print the discovered base URL.
    Discover(DiscoverCommand),
    /// Build, start, test, and tear down in one pass.
    Cycle(BuildCommand),
    /// Validate the harness file.
    Validate,
}

/// Arguments for image builds.
#[derive(Args, Debug, Default)]
struct BuildCommand {
    /// Build without the layer cache.
    #[arg(long, action = ArgAction::SetTrue)]
    no_cache: bool,
}

/// Arguments for host smoke runs.
#[derive(Args, Debug, Default)]
struct SmokeCommand {
    /// Base URL to test; takes precedence over the override variable.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Skip the browser suite even when one is configured.
    #[arg(long, action = ArgAction::SetTrue)]
    no_browser: bool,
}

/// Arguments for base URL discovery.
#[derive(Args, Debug)]
struct DiscoverCommand {
    /// Base URL to probe first; takes precedence over the override variable.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

/// Arguments for writing the example harness file.
#[derive(Args, Debug)]
struct InitCommand {
    /// Replace an existing file.
    #[arg(long, action = ArgAction::SetTrue)]
    force: bool,
}

/// Supported CLI language selections.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Catalan.
    Ca,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Ca => Self::Ca,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Exit code reported for this error.
    exit: HarnessExit,
}

impl CliError {
    /// Constructs a general failure from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
            exit: HarnessExit::Failure,
        }
    }

    /// Constructs an error with a specific exit code.
    const fn with_exit(message: String, exit: HarnessExit) -> Self {
        Self {
            message,
            exit,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Session
// ============================================================================

/// Loaded harness file plus the runtime it drives.
struct Session {
    /// Validated harness file with environment overrides applied.
    config: HarnessConfig,
    /// Diagnostics switch.
    verbose: bool,
    /// Container engine.
    runtime: Box<dyn ContainerRuntime>,
}

impl Session {
    /// Loads the environment and harness file.
    fn load(path: Option<&Path>, verbose_flag: bool) -> CliResult<Self> {
        let env = HarnessEnv::load()
            .map_err(|err| CliError::new(t!("config.env_failed", error = err)))?;
        let mut config = HarnessConfig::load(path)
            .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
        config
            .apply_env(&env)
            .map_err(|err| CliError::new(t!("config.env_failed", error = err)))?;
        let runtime = env.docker_program.map_or_else(DockerCli::default, DockerCli::new);
        Ok(Self {
            config,
            verbose: verbose_flag || env.verbose,
            runtime: Box::new(runtime),
        })
    }

    /// Name of the configured container.
    fn container_name(&self) -> CliResult<&str> {
        self.config
            .require_container()
            .map(|container| container.name.as_str())
            .map_err(|err| CliError::new(t!("config.load_failed", error = err)))
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(exit) => ExitCode::from(exit.code()),
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<HarnessExit> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        emit_stderr(&t!("i18n.disclaimer.machine_translated"))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        emit_stdout(&t!("main.version", version = version))?;
        return Ok(HarnessExit::Success);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(HarnessExit::Success);
    };

    let command = match command {
        Commands::Init(command) => return command_init(cli.config.as_deref(), &command),
        Commands::Session(command) => command,
    };

    let session = Session::load(cli.config.as_deref(), cli.verbose)?;
    init_tracing(session.verbose);
    debug!(app = %session.config.app.name, "harness file loaded");

    match command {
        SessionCommands::Build(command) => command_build(&session, &command).await,
        SessionCommands::Rebuild => command_rebuild(&session).await,
        SessionCommands::Up => command_up(&session).await,
        SessionCommands::Logs => command_logs(&session).await,
        SessionCommands::Down => command_down(&session).await,
        SessionCommands::Test => command_test(&session).await,
        SessionCommands::RunLocal => command_run_local(&session).await,
        SessionCommands::Smoke(command) => command_smoke(&session, &command).await,
        SessionCommands::Discover(command) => command_discover(&session, command).await,
        SessionCommands::Cycle(command) => command_cycle(&session, &command).await,
        SessionCommands::Validate => command_validate(&session),
    }
}

/// Installs the stderr log subscriber.
fn init_tracing(verbose: bool) {
    let filter = if verbose { VERBOSE_FILTER } else { QUIET_FILTER };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

// ============================================================================
// SECTION: Container Commands
// ============================================================================

/// Builds the application image.
async fn command_build(session: &Session, command: &BuildCommand) -> CliResult<HarnessExit> {
    let spec = session.config.container_spec().map_err(config_failed)?;
    session.runtime.build(&spec, command.no_cache).await.map_err(container_failed)?;
    emit_stdout(&t!("build.ok", image = spec.image))?;
    Ok(HarnessExit::Success)
}

/// Removes the container and rebuilds the image without cache.
async fn command_rebuild(session: &Session) -> CliResult<HarnessExit> {
    let name = session.container_name()?;
    session.runtime.stop_and_remove(name).await.map_err(container_failed)?;
    command_build(
        session,
        &BuildCommand {
            no_cache: true,
        },
    )
    .await
}

/// Starts a fresh container and waits for its readiness marker.
async fn command_up(session: &Session) -> CliResult<HarnessExit> {
    let config = &session.config;
    let spec = config.container_spec().map_err(config_failed)?;
    let matcher = config
        .readiness
        .marker
        .compile()
        .map_err(|err| CliError::new(t!("up.marker_invalid", error = err)))?;
    session.runtime.stop_and_remove(&spec.name).await.map_err(container_failed)?;
    session.runtime.start(&spec).await.map_err(container_failed)?;
    let policy = config.readiness_policy();
    emit_stdout(&t!(
        "up.started",
        name = spec.name,
        marker = matcher.label(),
        timeout = format_elapsed(policy.timeout)
    ))?;
    let logs = ContainerLogs::new(session.runtime.as_ref(), &spec.name);
    let ready = wait_for_ready(&logs, &matcher, policy).await.map_err(|err| {
        let exit = err.exit();
        CliError::with_exit(t!("up.not_ready", error = err), exit)
    })?;
    emit_stdout(&t!(
        "up.ready",
        name = spec.name,
        elapsed = format_elapsed(ready.elapsed),
        polls = ready.polls
    ))?;
    Ok(HarnessExit::Success)
}

/// Streams container logs until interrupted.
async fn command_logs(session: &Session) -> CliResult<HarnessExit> {
    let name = session.container_name()?;
    let code = session.runtime.follow_logs(name).await.map_err(container_failed)?;
    Ok(if code == 0 { HarnessExit::Success } else { HarnessExit::Failure })
}

/// Stops and removes the container.
async fn command_down(session: &Session) -> CliResult<HarnessExit> {
    let name = session.container_name()?;
    session.runtime.stop_and_remove(name).await.map_err(container_failed)?;
    emit_stdout(&t!("down.ok", name = name))?;
    Ok(HarnessExit::Success)
}

/// Runs the configured smoke command inside the container.
async fn command_test(session: &Session) -> CliResult<HarnessExit> {
    let container = session.config.require_container().map_err(config_failed)?;
    if container.test_command.is_empty() {
        return Err(CliError::new(t!("test.no_command", name = container.name)));
    }
    let code = session
        .runtime
        .exec(&container.name, &container.test_command)
        .await
        .map_err(container_failed)?;
    if code != 0 {
        return Err(CliError::new(t!("test.failed", code = code)));
    }
    emit_stdout(&t!("test.ok"))?;
    Ok(HarnessExit::Success)
}

/// Builds, starts, tests, and always tears the container down.
async fn command_cycle(session: &Session, command: &BuildCommand) -> CliResult<HarnessExit> {
    command_build(session, command).await?;
    let outcome = cycle_checks(session).await;
    let name = session.container_name()?;
    if let Err(err) = session.runtime.stop_and_remove(name).await {
        emit_stderr(&t!("cycle.teardown_failed", error = err))?;
        if matches!(outcome, Ok(HarnessExit::Success)) {
            return Ok(HarnessExit::Failure);
        }
    }
    outcome
}

/// Readiness plus the in-container command, or the host smoke run when none is set.
async fn cycle_checks(session: &Session) -> CliResult<HarnessExit> {
    command_up(session).await?;
    let container = session.config.require_container().map_err(config_failed)?;
    if container.test_command.is_empty() {
        command_smoke(session, &SmokeCommand::default()).await
    } else {
        command_test(session).await
    }
}

// ============================================================================
// SECTION: Host Commands
// ============================================================================

/// Runs the application directly on the host.
async fn command_run_local(session: &Session) -> CliResult<HarnessExit> {
    let app = &session.config.app;
    if app.run_command.is_empty() {
        return Err(CliError::new(t!("run_local.no_command", name = app.name)));
    }
    let code =
        run_local(&app.run_command, app.workdir.as_deref(), &app.env).await.map_err(container_failed)?;
    if code != 0 {
        return Err(CliError::new(t!("run_local.exit", code = code)));
    }
    Ok(HarnessExit::Success)
}

/// Discovers the base URL and runs the HTTP cases, then the browser suite.
async fn command_smoke(session: &Session, command: &SmokeCommand) -> CliResult<HarnessExit> {
    let config = &session.config;
    let browser = if command.no_browser {
        None
    } else {
        config.browser.as_ref().filter(|browser| !browser.steps.is_empty())
    };
    let planned = config.cases.len() + browser.map_or(0, |browser| browser.steps.len());
    if planned == 0 {
        return Err(CliError::new(t!("smoke.no_checks", name = config.app.name)));
    }
    let context = config.context(session.verbose);
    let transport = http_transport()?;
    let mut reporter = ConsoleReporter::stdio();
    let discovery =
        discover(session, command.base_url.clone(), &transport, &context, &mut reporter).await?;
    reporter.line(&t!("smoke.base_url", name = config.app.name, url = discovery.url));
    let mut report =
        SmokeRunner::new(&transport, &context).run(&discovery.url, &config.cases, &mut reporter).await;
    if report.passed()
        && let Some(browser) = browser
    {
        let settings = config.webdriver_config().unwrap_or_default();
        let client = WebDriverClient::new(settings)
            .map_err(|err| CliError::new(t!("smoke.browser_failed", error = err)))?;
        let driver: Arc<dyn BrowserDriver> = Arc::new(client);
        let browser_report =
            run_browser_suite(driver, &discovery.url, &browser.steps, &context, &mut reporter).await;
        report = report.then(browser_report);
    }
    reporter.summary(&report, planned);
    reporter.finish().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(report.exit())
}

/// Prints the selected base URL.
async fn command_discover(session: &Session, command: DiscoverCommand) -> CliResult<HarnessExit> {
    let context = session.config.context(session.verbose);
    let transport = http_transport()?;
    let mut reporter = ConsoleReporter::stdio();
    let discovery = discover(session, command.base_url, &transport, &context, &mut reporter).await?;
    reporter.line(&discovery.url);
    reporter.finish().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(HarnessExit::Success)
}

/// Runs discovery over the flag, the override variable, and the file's fallbacks.
async fn discover(
    session: &Session,
    override_url: Option<String>,
    transport: &ReqwestTransport,
    context: &HarnessContext,
    sink: &mut dyn ReportSink,
) -> CliResult<Discovery> {
    let config = &session.config;
    let candidates = match override_url {
        Some(url) => config.candidates(Some(url)),
        None => config
            .candidates_from_env()
            .map_err(|err| CliError::new(t!("config.env_failed", error = err)))?,
    };
    let probe = HttpProbe::new(transport, context);
    discover_base_url(&candidates, &probe, context.fallback, sink).await.map_err(|err| {
        let message = match &err {
            DiscoveryError::NoCandidates => t!("discover.none", env = config.base_url_env_name()),
            DiscoveryError::NoneReachable {
                ..
            } => t!("discover.failed", error = err),
        };
        CliError::with_exit(message, err.exit())
    })
}

/// Builds the HTTP transport.
fn http_transport() -> CliResult<ReqwestTransport> {
    ReqwestTransport::new(&HttpClientSettings::default())
        .map_err(|err| CliError::new(t!("smoke.transport_failed", error = err)))
}

// ============================================================================
// SECTION: File Commands
// ============================================================================

/// Confirms the harness file loaded and validated.
fn command_validate(session: &Session) -> CliResult<HarnessExit> {
    emit_stdout(&t!("config.valid", name = session.config.app.name))?;
    Ok(HarnessExit::Success)
}

/// Writes the example harness file.
fn command_init(path: Option<&Path>, command: &InitCommand) -> CliResult<HarnessExit> {
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME), Path::to_path_buf);
    if path.exists() && !command.force {
        return Err(CliError::new(t!("init.exists", path = path.display())));
    }
    fs::write(&path, harness_toml_example()).map_err(|err| {
        CliError::new(t!("init.write_failed", path = path.display(), error = err))
    })?;
    emit_stdout(&t!("init.written", path = path.display()))?;
    Ok(HarnessExit::Success)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

/// Maps a harness file error.
fn config_failed(err: impl std::fmt::Display) -> CliError {
    CliError::new(t!("config.load_failed", error = err))
}

/// Maps a container engine error.
fn container_failed(err: ContainerError) -> CliError {
    CliError::new(t!("container.failed", error = err))
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    emit_stdout("")
}

/// Writes a line to stdout, mapping failures.
fn emit_stdout(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stderr, mapping failures.
fn emit_stderr(message: &str) -> CliResult<()> {
    write_stderr_line(message).map_err(|err| CliError::new(output_error("stderr", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = write_stderr_line(&err.message);
    ExitCode::from(err.exit.code())
}
