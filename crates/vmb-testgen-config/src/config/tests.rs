// crates/vmb-testgen-config/src/config/tests.rs
// ============================================================================
// Module: Config Resolution Unit Tests
// Description: Path resolution order and missing-file handling.
// Dependencies: vmb-testgen-config, tempfile
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based helpers for clarity."
)]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use super::ConfigError;
use super::ConfigSource;
use super::DEFAULT_CONFIG_NAME;
use super::MAX_TOTAL_PATH_LENGTH;
use super::VmbTestgenConfig;
use super::resolve_path;

#[test]
fn explicit_path_wins_over_environment() {
    let source = resolve_path(Some(Path::new("cli.toml")), Some("env.toml".to_string())).unwrap();
    assert_eq!(source, ConfigSource::Required(PathBuf::from("cli.toml")));
}

#[test]
fn environment_path_is_required() {
    let source = resolve_path(None, Some("env.toml".to_string())).unwrap();
    assert_eq!(source, ConfigSource::Required(PathBuf::from("env.toml")));
}

#[test]
fn default_name_is_optional() {
    let source = resolve_path(None, None).unwrap();
    assert_eq!(source, ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_NAME)));
}

#[test]
fn oversized_environment_path_is_rejected() {
    let long = "a".repeat(MAX_TOTAL_PATH_LENGTH + 1);
    assert!(matches!(resolve_path(None, Some(long)), Err(ConfigError::Invalid(_))));
}

#[test]
fn missing_default_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let source = ConfigSource::Default(dir.path().join(DEFAULT_CONFIG_NAME));
    assert_eq!(VmbTestgenConfig::load_from(&source).unwrap(), VmbTestgenConfig::default());
}

#[test]
fn missing_required_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = ConfigSource::Required(dir.path().join("absent.toml"));
    assert!(matches!(VmbTestgenConfig::load_from(&source), Err(ConfigError::Io(_))));
}

#[test]
fn present_default_file_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_NAME);
    fs::write(&path, "[output]\nfile_prefix = \"vmb\"\n").unwrap();
    let config = VmbTestgenConfig::load_from(&ConfigSource::Default(path)).unwrap();
    assert_eq!(config.output.file_prefix, "vmb");
}
