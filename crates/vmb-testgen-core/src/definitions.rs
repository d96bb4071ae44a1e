// crates/vmb-testgen-core/src/definitions.rs
// ============================================================================
// Module: Test Definitions
// Description: Compact test definitions, groups, and definition file loading.
// Purpose: Parse authoring inputs into validated definitions.
// Dependencies: ron, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A definition names an unlocking script, a redeem-or-locking script, and a
//! description, optionally followed by test set override labels, a scenario
//! override, and additional scripts. Definitions are written either as a
//! compact positional array:
//!
//! ```json
//! ["<1>", "<1> OP_EQUAL", "one equals one", ["2022_invalid"], null, {}]
//! ```
//!
//! or as an object with the camelCase field names of [`VmbTestDefinition`].
//! Groups are `[description, [definitions...]]` or
//! `{"description": ..., "tests": [...]}`. A definition file holds a list of
//! groups in JSON or RON; JSON is canonical.
//!
//! Definition files are untrusted input: reads are size-limited and every
//! parse or validation failure is reported with its group and test position.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::labels::TestSetOverrideLabel;
use crate::template::LOCKING_SCRIPT_ID;
use crate::template::SCENARIO_ID;
use crate::template::TemplateScript;
use crate::template::UNLOCKING_SCRIPT_ID;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum definition file size accepted by the loader.
pub const MAX_DEFINITION_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Minimum number of entries in a compact definition.
const COMPACT_MIN_ENTRIES: usize = 3;
/// Maximum number of entries in a compact definition.
const COMPACT_MAX_ENTRIES: usize = 6;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Supported definition file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    /// Canonical JSON.
    Json,
    /// Human-friendly RON.
    Ron,
}

impl DefinitionFormat {
    /// Returns the lowercase label for the format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ron => "ron",
        }
    }

    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "ron" => Some(Self::Ron),
            _ => None,
        }
    }
}

impl fmt::Display for DefinitionFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading definitions.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// IO failure while reading a definition file.
    #[error("definition io error: {0}")]
    Io(String),
    /// Definition file exceeds the size limit.
    #[error("definition file {path} exceeds {limit} bytes")]
    TooLarge {
        /// Offending file.
        path: String,
        /// Size limit in bytes.
        limit: u64,
    },
    /// Definition file extension is not a supported format.
    #[error("unsupported definition file format: {0}")]
    UnsupportedFormat(String),
    /// Input could not be parsed.
    #[error("failed to parse {format} definitions: {error}")]
    Parse {
        /// Format being parsed.
        format: DefinitionFormat,
        /// Parser message.
        error: String,
    },
    /// Input does not have the expected shape.
    #[error("malformed definition: {0}")]
    Malformed(String),
    /// Input is well-formed but semantically invalid.
    #[error("invalid definition: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Compact definition of one VMB test.
///
/// # Invariants
/// - `description` is non-empty.
/// - `additional_scripts` never uses the reserved ids `lock`, `unlock`, or
///   `vmb_scenario`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDefinition")]
pub struct VmbTestDefinition {
    /// Unlocking script source.
    pub unlocking_script: String,
    /// Redeem script (P2SH modes) or locking script (bare mode) source.
    pub redeem_or_locking_script: String,
    /// Human-readable test description.
    pub description: String,
    /// Override labels steering test set placement.
    pub test_set_overrides: Option<Vec<TestSetOverrideLabel>>,
    /// Scenario override passed to the compiler untouched.
    pub scenario: Option<Value>,
    /// Extra scripts the definition's scripts may reference.
    pub additional_scripts: BTreeMap<String, TemplateScript>,
}

impl VmbTestDefinition {
    /// Creates a definition with no overrides, scenario, or extra scripts.
    #[must_use]
    pub fn new(
        unlocking_script: impl Into<String>,
        redeem_or_locking_script: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            unlocking_script: unlocking_script.into(),
            redeem_or_locking_script: redeem_or_locking_script.into(),
            description: description.into(),
            test_set_overrides: None,
            scenario: None,
            additional_scripts: BTreeMap::new(),
        }
    }

    /// Validates the definition invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Invalid`] when an invariant is broken.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.description.trim().is_empty() {
            return Err(DefinitionError::Invalid("description must be non-empty".to_string()));
        }
        for reserved in [LOCKING_SCRIPT_ID, UNLOCKING_SCRIPT_ID, SCENARIO_ID] {
            if self.additional_scripts.contains_key(reserved) {
                return Err(DefinitionError::Invalid(format!(
                    "additional script id \"{reserved}\" is reserved (in \"{}\")",
                    self.description
                )));
            }
        }
        Ok(())
    }

    /// Builds a definition from its compact positional form.
    fn from_compact(entries: Vec<Value>) -> Result<Self, DefinitionError> {
        if !(COMPACT_MIN_ENTRIES ..= COMPACT_MAX_ENTRIES).contains(&entries.len()) {
            return Err(DefinitionError::Malformed(format!(
                "compact definitions hold {COMPACT_MIN_ENTRIES} to {COMPACT_MAX_ENTRIES} \
                 entries, found {}",
                entries.len()
            )));
        }
        let mut entries = entries.into_iter();
        let unlocking_script = required_string(entries.next(), "unlocking script")?;
        let redeem_or_locking_script =
            required_string(entries.next(), "redeem or locking script")?;
        let description = required_string(entries.next(), "description")?;
        let test_set_overrides = optional_entry(entries.next(), "test set overrides")?;
        let scenario = optional_entry(entries.next(), "scenario")?;
        let additional_scripts =
            optional_entry(entries.next(), "additional scripts")?.unwrap_or_default();
        Ok(Self {
            unlocking_script,
            redeem_or_locking_script,
            description,
            test_set_overrides,
            scenario,
            additional_scripts,
        })
    }
}

/// Either accepted shape of a definition.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDefinition {
    /// Positional array.
    Compact(Vec<Value>),
    /// Object with named fields.
    Expanded(ExpandedDefinition),
}

/// Object form of a definition.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ExpandedDefinition {
    /// Unlocking script source.
    unlocking_script: String,
    /// Redeem or locking script source.
    redeem_or_locking_script: String,
    /// Test description.
    description: String,
    /// Override labels.
    #[serde(default)]
    test_set_overrides: Option<Vec<TestSetOverrideLabel>>,
    /// Scenario override.
    #[serde(default)]
    scenario: Option<Value>,
    /// Extra scripts.
    #[serde(default)]
    additional_scripts: BTreeMap<String, TemplateScript>,
}

impl TryFrom<RawDefinition> for VmbTestDefinition {
    type Error = DefinitionError;

    fn try_from(raw: RawDefinition) -> Result<Self, Self::Error> {
        let definition = match raw {
            RawDefinition::Compact(entries) => Self::from_compact(entries)?,
            RawDefinition::Expanded(expanded) => Self {
                unlocking_script: expanded.unlocking_script,
                redeem_or_locking_script: expanded.redeem_or_locking_script,
                description: expanded.description,
                test_set_overrides: expanded.test_set_overrides,
                scenario: expanded.scenario.filter(|value| !value.is_null()),
                additional_scripts: expanded.additional_scripts,
            },
        };
        definition.validate()?;
        Ok(definition)
    }
}

/// Reads a required string entry of a compact definition.
fn required_string(value: Option<Value>, field: &str) -> Result<String, DefinitionError> {
    match value {
        Some(Value::String(text)) => Ok(text),
        _ => Err(DefinitionError::Malformed(format!("{field} must be a string"))),
    }
}

/// Reads an optional entry of a compact definition; `null` counts as absent.
fn optional_entry<T: DeserializeOwned>(
    value: Option<Value>,
    field: &str,
) -> Result<Option<T>, DefinitionError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| DefinitionError::Malformed(format!("{field}: {err}"))),
    }
}

// ============================================================================
// SECTION: Groups
// ============================================================================

/// Described group of definitions.
///
/// # Invariants
/// - `description` is not blank.
/// - `tests` is non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct VmbTestDefinitionGroup {
    /// Group description, prefixed to every test description.
    pub description: String,
    /// Definitions in authoring order.
    pub tests: Vec<VmbTestDefinition>,
}

/// Either accepted shape of a group, with unparsed definitions.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroup {
    /// `[description, [definitions...]]`.
    Compact(String, Vec<Value>),
    /// `{"description": ..., "tests": [...]}`.
    Expanded(ExpandedGroup),
}

/// Object form of a group.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpandedGroup {
    /// Group description.
    description: String,
    /// Unparsed definitions.
    tests: Vec<Value>,
}

/// Converts one group value, reporting failures by position.
fn parse_group(index: usize, value: Value) -> Result<VmbTestDefinitionGroup, DefinitionError> {
    let raw: RawGroup = serde_json::from_value(value).map_err(|_| {
        DefinitionError::Malformed(format!(
            "group {index} must be [description, [tests...]] or {{description, tests}}"
        ))
    })?;
    let (description, tests) = match raw {
        RawGroup::Compact(description, tests) => (description, tests),
        RawGroup::Expanded(group) => (group.description, group.tests),
    };
    if description.trim().is_empty() {
        return Err(DefinitionError::Invalid(format!("group {index} has an empty description")));
    }
    if tests.is_empty() {
        return Err(DefinitionError::Invalid(format!(
            "group {index} (\"{description}\") has no tests"
        )));
    }
    let mut definitions = Vec::with_capacity(tests.len());
    for (test_index, test) in tests.into_iter().enumerate() {
        let definition: VmbTestDefinition = serde_json::from_value(test).map_err(|err| {
            DefinitionError::Malformed(format!(
                "group {index} (\"{description}\") test {test_index}: {err}"
            ))
        })?;
        definitions.push(definition);
    }
    Ok(VmbTestDefinitionGroup {
        description,
        tests: definitions,
    })
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Parses a definition document (a list of groups).
///
/// # Errors
///
/// Returns [`DefinitionError`] when parsing or validation fails.
pub fn parse_definition_groups(
    input: &str,
    format: DefinitionFormat,
) -> Result<Vec<VmbTestDefinitionGroup>, DefinitionError> {
    let value: Value = match format {
        DefinitionFormat::Json => serde_json::from_str(input).map_err(|err| {
            DefinitionError::Parse {
                format,
                error: err.to_string(),
            }
        })?,
        DefinitionFormat::Ron => ron::from_str(input).map_err(|err| DefinitionError::Parse {
            format,
            error: err.to_string(),
        })?,
    };
    let Value::Array(groups) = value else {
        return Err(DefinitionError::Malformed(
            "definition documents must be a list of groups".to_string(),
        ));
    };
    groups.into_iter().enumerate().map(|(index, group)| parse_group(index, group)).collect()
}

/// Loads a definition file, detecting its format from the extension.
///
/// # Errors
///
/// Returns [`DefinitionError`] when the file cannot be read, exceeds
/// [`MAX_DEFINITION_FILE_BYTES`], or fails to parse.
pub fn load_definition_file(path: &Path) -> Result<Vec<VmbTestDefinitionGroup>, DefinitionError> {
    let format = DefinitionFormat::from_path(path)
        .ok_or_else(|| DefinitionError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = read_definition_bytes(path)?;
    let input = std::str::from_utf8(&bytes).map_err(|_| DefinitionError::Parse {
        format,
        error: "input must be utf-8".to_string(),
    })?;
    parse_definition_groups(input, format).map_err(|err| match err {
        DefinitionError::Malformed(message) => {
            DefinitionError::Malformed(format!("{}: {message}", path.display()))
        }
        DefinitionError::Invalid(message) => {
            DefinitionError::Invalid(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Reads a definition file with size limits to avoid memory exhaustion.
fn read_definition_bytes(path: &Path) -> Result<Vec<u8>, DefinitionError> {
    let too_large = || DefinitionError::TooLarge {
        path: path.display().to_string(),
        limit: MAX_DEFINITION_FILE_BYTES,
    };
    let io_error = |err: std::io::Error| DefinitionError::Io(format!("{}: {err}", path.display()));
    let file = fs::File::open(path).map_err(io_error)?;
    let metadata = file.metadata().map_err(io_error)?;
    if metadata.len() > MAX_DEFINITION_FILE_BYTES {
        return Err(too_large());
    }
    let mut bytes = Vec::new();
    let mut limited = file.take(MAX_DEFINITION_FILE_BYTES + 1);
    limited.read_to_end(&mut bytes).map_err(io_error)?;
    let size = u64::try_from(bytes.len()).map_err(|_| too_large())?;
    if size > MAX_DEFINITION_FILE_BYTES {
        return Err(too_large());
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
