// crates/fitslim-cli/src/main.rs
// ============================================================================
// Module: FitSlim CLI
// Description: Command-line entry point for the Slim execution server.
// Purpose: Serve Slim sessions and inspect configuration from the shell.
// Dependencies: clap, fitslim-config, fitslim-server, tokio
// ============================================================================

//! ## Overview
//! `fitslim serve` loads configuration, registers the bundled demo fixtures
//! and runs the Slim server on the configured transport. `fitslim config
//! validate` checks a configuration file without serving, and `fitslim
//! exclusions check` reports which test file names the configured exclusion
//! patterns would skip.
//!
//! Security posture: CLI inputs are untrusted; configuration is validated
//! before any listener is bound.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod demo;


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use fitslim_config::FitSlimConfig;
use fitslim_config::ServerTransport;
use fitslim_server::SlimServer;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Arguments
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "fitslim", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Slim server.
    Serve(ServeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// File exclusion utilities.
    Exclusions {
        /// Selected exclusions subcommand.
        #[command(subcommand)]
        command: ExclusionsCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to fitslim.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Serve over TCP at this address instead of the configured transport.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a FitSlim configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to fitslim.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Exclusions subcommands.
#[derive(Subcommand, Debug)]
enum ExclusionsCommand {
    /// Report whether each test file name is excluded.
    Check(ExclusionsCheckCommand),
}

/// Arguments for `exclusions check`.
#[derive(Args, Debug)]
struct ExclusionsCheckCommand {
    /// Optional config file path (defaults to fitslim.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Test file names to check.
    #[arg(value_name = "NAME", required = true)]
    names: Vec<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Exclusions {
            command,
        } => command_exclusions(command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let config = apply_bind_override(config, command.bind);
    if config.server.transport == ServerTransport::Tcp {
        let bind = config.server.bind.as_deref().unwrap_or_default();
        write_stderr_line(&format!("fitslim: serving Slim over tcp at {bind}"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    let server = SlimServer::from_config(config, demo::registry())
        .map_err(|err| CliError::new(format!("failed to start server: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server stopped: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Switches the config to TCP on `bind` when an override is given.
fn apply_bind_override(mut config: FitSlimConfig, bind: Option<String>) -> FitSlimConfig {
    if let Some(bind) = bind {
        config.server.transport = ServerTransport::Tcp;
        config.server.bind = Some(bind);
    }
    config
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line("config ok").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Exclusions Commands
// ============================================================================

/// Dispatches exclusions subcommands.
fn command_exclusions(command: ExclusionsCommand) -> CliResult<ExitCode> {
    match command {
        ExclusionsCommand::Check(command) => command_exclusions_check(&command),
    }
}

/// Reports one line per name: `excluded NAME (PATTERN)` or `included NAME`.
fn command_exclusions_check(command: &ExclusionsCheckCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let exclusions = config
        .file_exclusions()
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let mut output = String::new();
    for name in &command.names {
        let line = exclusion_line(name, exclusions.matching_pattern(name));
        output.push_str(&line);
        output.push('\n');
    }
    write_stdout_bytes(output.as_bytes())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Formats the report line for one name.
fn exclusion_line(name: &str, pattern: Option<&str>) -> String {
    match pattern {
        Some(pattern) => format!("excluded {name} ({pattern})"),
        None => format!("included {name}"),
    }
}

// ============================================================================
// SECTION: Config Helpers
// ============================================================================

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<FitSlimConfig> {
    FitSlimConfig::load(path).map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
