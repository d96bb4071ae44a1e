// crates/vmb-testgen-cli/src/main.rs
// ============================================================================
// Module: VMB Test Generator CLI Entry Point
// Description: Command dispatcher for vector generation and drift checks.
// Purpose: Wire configuration, the compiler bridge, and the bundle writer.
// Dependencies: clap, vmb-testgen-core, vmb-testgen-config, vmb-testgen-bundle
// ============================================================================

//! ## Overview
//! `vmb-testgen generate` loads the configured definition files, expands them
//! through the external compiler, and writes the vector files. `check` does
//! the same but compares against the existing output instead of writing.
//! `plan` and `short-id` are offline helpers that never start the compiler.
//!
//! Results go to stdout, errors to stderr with a failure exit code, and
//! generation events to the sink selected by `[log]`.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bitcoin::hex::FromHex;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use vmb_testgen_bundle::BundleBuilder;
use vmb_testgen_config::LogConfig;
use vmb_testgen_config::LogSinkKind;
use vmb_testgen_config::VmbTestgenConfig;
use vmb_testgen_core::FileLogSink;
use vmb_testgen_core::GenerationLogSink;
use vmb_testgen_core::NoopLogSink;
use vmb_testgen_core::ProcessScenarioCompiler;
use vmb_testgen_core::StderrLogSink;
use vmb_testgen_core::TestSetOverrideLabel;
use vmb_testgen_core::VmbTest;
use vmb_testgen_core::VmbTestDefinitionGroup;
use vmb_testgen_core::VmbTestGenerator;
use vmb_testgen_core::load_definition_file;
use vmb_testgen_core::resolve_test_plan;
use vmb_testgen_core::short_id;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "vmb-testgen", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file (overrides `VMB_TESTGEN_CONFIG` and `./vmb-testgen.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Expand definitions and write the vector files.
    Generate(GenerationArgs),
    /// Expand definitions and verify the vector files are up to date.
    Check(GenerationArgs),
    /// Print the test plan resolved from override labels.
    Plan(PlanCommand),
    /// Compute the short id of an encoded transaction and its source outputs.
    ShortId(ShortIdCommand),
}

/// Inputs shared by `generate` and `check`.
#[derive(Args, Debug)]
struct GenerationArgs {
    /// Definition files (overrides `definitions.paths`).
    #[arg(long = "definitions", value_name = "PATH", num_args = 1..)]
    definitions: Vec<PathBuf>,
    /// Output directory (overrides `output.directory`).
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
}

/// Arguments for `plan`.
#[derive(Args, Debug)]
struct PlanCommand {
    /// Test set override label, e.g. `2023_invalid`; repeatable.
    #[arg(long = "label", value_name = "LABEL")]
    labels: Vec<TestSetOverrideLabel>,
}

/// Arguments for `short-id`.
#[derive(Args, Debug)]
struct ShortIdCommand {
    /// Encoded transaction, hex.
    #[arg(long, value_name = "HEX")]
    transaction: String,
    /// Encoded source outputs, hex.
    #[arg(long = "source-outputs", value_name = "HEX")]
    source_outputs: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a human-readable message.
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

/// CLI entry point.
fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Commands::Generate(args) => command_generate(cli.config.as_deref(), &args),
        Commands::Check(args) => command_check(cli.config.as_deref(), &args),
        Commands::Plan(command) => command_plan(&command),
        Commands::ShortId(command) => command_short_id(&command),
    }
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Writes the vector files.
fn command_generate(config_path: Option<&Path>, args: &GenerationArgs) -> CliResult<ExitCode> {
    let session = GenerationSession::prepare(config_path, args)?;
    let master = session.generate()?;
    let manifest = session
        .bundle_builder()
        .write_to(&master, &session.output_dir)
        .map_err(|err| CliError::new(format!("failed to write vectors: {err}")))?;
    write_stdout_line(&format!(
        "wrote {} vectors in {} test sets to {}",
        manifest.test_count,
        manifest.test_sets.len(),
        session.output_dir.display()
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Verifies the vector files without writing.
fn command_check(config_path: Option<&Path>, args: &GenerationArgs) -> CliResult<ExitCode> {
    let session = GenerationSession::prepare(config_path, args)?;
    let master = session.generate()?;
    session.bundle_builder().verify_output(&master, &session.output_dir).map_err(|err| {
        CliError::new(format!(
            "{} is out of date: {err}; run `vmb-testgen generate`",
            session.output_dir.display()
        ))
    })?;
    write_stdout_line(&format!("{} is up to date", session.output_dir.display()))?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the resolved test plan as JSON.
fn command_plan(command: &PlanCommand) -> CliResult<ExitCode> {
    let labels = (!command.labels.is_empty()).then_some(command.labels.as_slice());
    let plan = resolve_test_plan(labels).map_err(|err| CliError::new(err.to_string()))?;
    let rendered = serde_json::to_string_pretty(&plan)
        .map_err(|err| CliError::new(format!("failed to render plan: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the short id for hex-encoded inputs.
fn command_short_id(command: &ShortIdCommand) -> CliResult<ExitCode> {
    let transaction = decode_hex("--transaction", &command.transaction)?;
    let source_outputs = decode_hex("--source-outputs", &command.source_outputs)?;
    write_stdout_line(&short_id(&transaction, &source_outputs))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Generation Session
// ============================================================================

/// Resolved inputs for one `generate` or `check` run.
struct GenerationSession {
    /// Loaded configuration.
    config: VmbTestgenConfig,
    /// Definition groups from every input file, in file order.
    groups: Vec<VmbTestDefinitionGroup>,
    /// Directory holding the vector files.
    output_dir: PathBuf,
    /// Sink shared by the generator and the bundle writer.
    log_sink: Arc<dyn GenerationLogSink>,
}

impl GenerationSession {
    /// Loads config and definitions, applying command-line overrides.
    fn prepare(config_path: Option<&Path>, args: &GenerationArgs) -> CliResult<Self> {
        let config = VmbTestgenConfig::load(config_path)
            .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
        let paths = if args.definitions.is_empty() {
            config.definitions.paths.clone()
        } else {
            args.definitions.clone()
        };
        if paths.is_empty() {
            return Err(CliError::new(
                "no definition files: pass --definitions or set definitions.paths".to_string(),
            ));
        }
        let groups = load_groups(&paths)?;
        let output_dir = args.output.clone().unwrap_or_else(|| config.output.directory.clone());
        let log_sink = build_log_sink(&config.log)?;
        Ok(Self {
            config,
            groups,
            output_dir,
            log_sink,
        })
    }

    /// Starts the compiler and expands every definition into the master list.
    fn generate(&self) -> CliResult<Vec<VmbTest>> {
        let compiler_config = &self.config.compiler;
        if compiler_config.command.is_empty() {
            return Err(CliError::new(
                "compiler.command is not configured; point it at a scenario compiler".to_string(),
            ));
        }
        let compiler = ProcessScenarioCompiler::spawn(
            &compiler_config.command,
            compiler_config.max_response_bytes,
        )
        .map_err(|err| CliError::new(err.to_string()))?;
        VmbTestGenerator::new(compiler)
            .with_supported(compiler_config.supported.clone())
            .with_log_sink(Arc::clone(&self.log_sink))
            .generate(&self.groups)
            .map_err(|err| CliError::new(format!("generation failed: {err}")))
    }

    /// Returns a bundle builder for the configured prefix.
    fn bundle_builder(&self) -> BundleBuilder {
        BundleBuilder::new(self.config.output.file_prefix.clone())
            .with_log_sink(Arc::clone(&self.log_sink))
    }
}

/// Loads every definition file, concatenating groups in path order.
fn load_groups(paths: &[PathBuf]) -> CliResult<Vec<VmbTestDefinitionGroup>> {
    let mut groups = Vec::new();
    for path in paths {
        groups.extend(load_definition_file(path).map_err(|err| CliError::new(err.to_string()))?);
    }
    Ok(groups)
}

/// Builds the generation event sink selected by `[log]`.
fn build_log_sink(log: &LogConfig) -> CliResult<Arc<dyn GenerationLogSink>> {
    match (log.sink, log.path.as_deref()) {
        (LogSinkKind::Stderr, _) => Ok(Arc::new(StderrLogSink)),
        (LogSinkKind::None, _) => Ok(Arc::new(NoopLogSink)),
        (LogSinkKind::File, Some(path)) => FileLogSink::new(path)
            .map(|sink| Arc::new(sink) as Arc<dyn GenerationLogSink>)
            .map_err(|err| {
                CliError::new(format!("failed to open log file {}: {err}", path.display()))
            }),
        (LogSinkKind::File, None) => {
            Err(CliError::new("log.sink = \"file\" requires log.path".to_string()))
        }
    }
}

/// Decodes a hex argument.
fn decode_hex(flag: &str, value: &str) -> CliResult<Vec<u8>> {
    Vec::<u8>::from_hex(value.trim())
        .map_err(|err| CliError::new(format!("{flag} is not valid hex: {err}")))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
