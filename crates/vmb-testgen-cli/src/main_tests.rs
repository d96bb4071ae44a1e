// crates/vmb-testgen-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and session preparation.
// Purpose: Ensure overrides apply and bad inputs fail before any compiler runs.
// Dependencies: vmb-testgen-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Covers clap parsing of every subcommand, definition and output overrides,
//! log sink selection, and hex argument decoding.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use vmb_testgen_config::LogConfig;
use vmb_testgen_config::LogSinkKind;
use vmb_testgen_core::Expectation;
use vmb_testgen_core::VmVersion;

use super::Cli;
use super::Commands;
use super::GenerationArgs;
use super::GenerationSession;
use super::build_log_sink;
use super::decode_hex;
use super::load_groups;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const DEFINITIONS: &str = r#"[["Equality", [["<1>", "<1> OP_EQUAL", "one equals one"]]]]"#;

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("vmb-testgen.toml");
    fs::write(&path, body).unwrap();
    path
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn parses_generate_overrides() {
    let cli = Cli::try_parse_from([
        "vmb-testgen",
        "--config",
        "custom.toml",
        "generate",
        "--definitions",
        "a.json",
        "b.ron",
        "--output",
        "out",
    ])
    .unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    let Commands::Generate(args) = cli.command else {
        panic!("expected generate");
    };
    assert_eq!(args.definitions, vec![PathBuf::from("a.json"), PathBuf::from("b.ron")]);
    assert_eq!(args.output, Some(PathBuf::from("out")));
}

#[test]
fn parses_plan_labels() {
    let cli =
        Cli::try_parse_from(["vmb-testgen", "plan", "--label", "2023_invalid", "--label", "2025_standard"])
            .unwrap();
    let Commands::Plan(command) = cli.command else {
        panic!("expected plan");
    };
    assert_eq!(command.labels.len(), 2);
    assert_eq!(command.labels[0].version, VmVersion::Bch2023);
    assert_eq!(command.labels[0].expectation, Expectation::Invalid);
}

#[test]
fn rejects_unknown_labels_at_parse_time() {
    assert!(Cli::try_parse_from(["vmb-testgen", "plan", "--label", "2024_invalid"]).is_err());
    assert!(Cli::try_parse_from(["vmb-testgen", "plan", "--label", "invalid"]).is_err());
}

#[test]
fn short_id_requires_both_inputs() {
    assert!(Cli::try_parse_from(["vmb-testgen", "short-id", "--transaction", "00"]).is_err());
    assert!(
        Cli::try_parse_from([
            "vmb-testgen",
            "short-id",
            "--transaction",
            "00",
            "--source-outputs",
            "00"
        ])
        .is_ok()
    );
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

#[test]
fn command_line_definitions_override_config() {
    let dir = tempfile::tempdir().unwrap();
    let definitions = dir.path().join("core.json");
    fs::write(&definitions, DEFINITIONS).unwrap();
    let config = write_config(
        dir.path(),
        "[definitions]\npaths = [\"missing.json\"]\n[output]\ndirectory = \"configured\"\n[log]\nsink = \"none\"\n",
    );
    let args = GenerationArgs {
        definitions: vec![definitions],
        output: None,
    };
    let session = GenerationSession::prepare(Some(&config), &args).unwrap();
    assert_eq!(session.groups.len(), 1);
    assert_eq!(session.groups[0].tests.len(), 1);
    assert_eq!(session.output_dir, PathBuf::from("configured"));
}

#[test]
fn sessions_need_definitions() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), "[log]\nsink = \"none\"\n");
    let args = GenerationArgs {
        definitions: Vec::new(),
        output: None,
    };
    let Err(err) = GenerationSession::prepare(Some(&config), &args) else {
        panic!("expected missing definitions to fail");
    };
    assert!(err.to_string().contains("no definition files"), "{err}");
}

#[test]
fn generation_needs_a_compiler_command() {
    let dir = tempfile::tempdir().unwrap();
    let definitions = dir.path().join("core.json");
    fs::write(&definitions, DEFINITIONS).unwrap();
    let config = write_config(dir.path(), "[log]\nsink = \"none\"\n");
    let args = GenerationArgs {
        definitions: vec![definitions],
        output: Some(dir.path().join("out")),
    };
    let session = GenerationSession::prepare(Some(&config), &args).unwrap();
    let Err(err) = session.generate() else {
        panic!("expected missing compiler to fail");
    };
    assert!(err.to_string().contains("compiler.command"), "{err}");
}

#[test]
fn definition_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let definitions = dir.path().join("broken.json");
    fs::write(&definitions, r#"[["Equality", [["<1>"]]]]"#).unwrap();
    let Err(err) = load_groups(&[definitions]) else {
        panic!("expected malformed definitions to fail");
    };
    assert!(err.to_string().contains("broken.json"), "{err}");
}

// ============================================================================
// SECTION: Helpers Under Test
// ============================================================================

#[test]
fn file_log_sink_opens_the_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");
    let log = LogConfig {
        sink: LogSinkKind::File,
        path: Some(path.clone()),
    };
    assert!(build_log_sink(&log).is_ok());
    assert!(path.exists());

    let missing_dir = LogConfig {
        sink: LogSinkKind::File,
        path: Some(dir.path().join("absent").join("events.jsonl")),
    };
    assert!(build_log_sink(&missing_dir).is_err());
}

#[test]
fn hex_arguments_are_decoded() {
    assert_eq!(decode_hex("--transaction", " 0a0b ").unwrap(), vec![0x0a, 0x0b]);
    let err = decode_hex("--source-outputs", "xyz").unwrap_err();
    assert!(err.to_string().starts_with("--source-outputs is not valid hex"), "{err}");
}
