// crates/vmb-testgen-config/src/config.rs
// ============================================================================
// Module: VMB Test Generator Configuration
// Description: Configuration loading and validation for the generator.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, vmb-testgen-core
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The file is resolved from an explicit path, then the `VMB_TESTGEN_CONFIG`
//! environment variable, then `vmb-testgen.toml` in the working directory.
//! Only the last may be absent, in which case built-in defaults apply.
//! Unknown keys and invalid values fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use vmb_testgen_core::DEFAULT_SUPPORTED_VM;
use vmb_testgen_core::MAX_COMPILER_RESPONSE_BYTES;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "vmb-testgen.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "VMB_TESTGEN_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of definition files.
pub(crate) const MAX_DEFINITION_PATHS: usize = 256;
/// Maximum number of compiler command arguments (program included).
pub(crate) const MAX_COMPILER_ARGS: usize = 64;
/// Upper bound accepted for `compiler.max_response_bytes`.
pub(crate) const MAX_COMPILER_RESPONSE_LIMIT: usize = 64 * 1024 * 1024;
/// Maximum length of the output file prefix.
pub(crate) const MAX_FILE_PREFIX_LENGTH: usize = 64;

/// Default output directory.
const DEFAULT_OUTPUT_DIRECTORY: &str = "generated/vmb";
/// Default output file prefix.
const DEFAULT_FILE_PREFIX: &str = "bch_vmb_tests";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Root generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VmbTestgenConfig {
    /// Definition inputs.
    #[serde(default)]
    pub definitions: DefinitionsConfig,
    /// Output directory layout.
    #[serde(default)]
    pub output: OutputConfig,
    /// External compiler process.
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Generation event logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// Definition file inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionsConfig {
    /// Definition files, expanded in order.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Output directory layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving generated files.
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    /// Prefix of every generated vector file.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// External compiler process settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Program and arguments; empty when no compiler is configured.
    #[serde(default)]
    pub command: Vec<String>,
    /// VM identifiers placed in every compiler configuration.
    #[serde(default = "default_supported")]
    pub supported: Vec<String>,
    /// Maximum size of one compiler response line.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            supported: default_supported(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// Destination of generation events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `log.path`.
    File,
    /// Events discarded.
    None,
}

/// Generation event logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Event destination.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file for the `file` sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Where the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfigSource {
    /// A path that must exist.
    Required(PathBuf),
    /// The default file name, which may be absent.
    Default(PathBuf),
}

impl VmbTestgenConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let source = resolve_path(path, env::var(CONFIG_ENV_VAR).ok())?;
        Self::load_from(&source)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a resolved source.
    pub(crate) fn load_from(source: &ConfigSource) -> Result<Self, ConfigError> {
        let (path, required) = match source {
            ConfigSource::Required(path) => (path, true),
            ConfigSource::Default(path) => (path, false),
        };
        validate_path(path)?;
        let bytes = match read_config_bytes(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound && !required => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => {
                return Err(ConfigError::Io(format!("{}: {err}", path.display())));
            }
        };
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.definitions.validate()?;
        self.output.validate()?;
        self.compiler.validate()?;
        self.log.validate()
    }
}

impl DefinitionsConfig {
    /// Validates definition paths.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.len() > MAX_DEFINITION_PATHS {
            return Err(ConfigError::Invalid(format!(
                "definitions.paths exceeds {MAX_DEFINITION_PATHS} entries"
            )));
        }
        for path in &self.paths {
            validate_path_string("definitions.paths", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

impl OutputConfig {
    /// Validates the output layout.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("output.directory", &self.directory.to_string_lossy())?;
        let prefix = &self.file_prefix;
        if prefix.is_empty() || prefix.len() > MAX_FILE_PREFIX_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "output.file_prefix must be 1 to {MAX_FILE_PREFIX_LENGTH} characters"
            )));
        }
        if !prefix.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
            return Err(ConfigError::Invalid(
                "output.file_prefix may only contain ascii letters, digits, '_' and '-'"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

impl CompilerConfig {
    /// Validates compiler process settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.command.len() > MAX_COMPILER_ARGS {
            return Err(ConfigError::Invalid(format!(
                "compiler.command exceeds {MAX_COMPILER_ARGS} entries"
            )));
        }
        if self.command.iter().any(|arg| arg.is_empty()) {
            return Err(ConfigError::Invalid(
                "compiler.command entries must be non-empty".to_string(),
            ));
        }
        if self.supported.is_empty() || self.supported.iter().any(|vm| vm.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "compiler.supported must list at least one non-empty VM identifier".to_string(),
            ));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_COMPILER_RESPONSE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "compiler.max_response_bytes must be between 1 and {MAX_COMPILER_RESPONSE_LIMIT}"
            )));
        }
        Ok(())
    }
}

impl LogConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("log.sink = \"file\" requires log.path".to_string()))
            }
            (LogSinkKind::File, Some(path)) => {
                validate_path_string("log.path", &path.to_string_lossy())
            }
            (LogSinkKind::Stderr | LogSinkKind::None, Some(_)) => Err(ConfigError::Invalid(
                "log.path is only valid with log.sink = \"file\"".to_string(),
            )),
            (LogSinkKind::Stderr | LogSinkKind::None, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default output directory.
fn default_output_directory() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIRECTORY)
}

/// Default output file prefix.
fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

/// Default supported VM identifiers.
fn default_supported() -> Vec<String> {
    vec![DEFAULT_SUPPORTED_VM.to_string()]
}

/// Default compiler response limit.
const fn default_max_response_bytes() -> usize {
    MAX_COMPILER_RESPONSE_BYTES
}

/// Resolves the config source from an explicit path, the environment, or the
/// default file name.
pub(crate) fn resolve_path(
    path: Option<&Path>,
    env_path: Option<String>,
) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource::Required(path.to_path_buf()));
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource::Required(PathBuf::from(env_path)));
    }
    Ok(ConfigSource::Default(PathBuf::from(DEFAULT_CONFIG_NAME)))
}

/// Reads at most one byte past the size limit so oversized files are caught
/// without reading them whole.
fn read_config_bytes(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = fs::File::open(path)?;
    let limit = u64::try_from(MAX_CONFIG_FILE_SIZE).unwrap_or(u64::MAX).saturating_add(1);
    let mut bytes = Vec::new();
    file.take(limit).read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
