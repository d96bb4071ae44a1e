// crates/vmb-testgen-core/src/labels.rs
// ============================================================================
// Module: Test Set Labels
// Description: VM versions, evaluation modes, test set identifiers, and labels.
// Purpose: Provide the stable vocabulary shared by plans, vectors, and files.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Every generated vector is filed under one or more test sets named
//! `{version}_{class}` (for example `2023_standard`). Definitions steer that
//! placement with override labels named `{version}_{expectation}` (for example
//! `2022_invalid`). The string forms are part of the generated file names and
//! must stay stable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

// ============================================================================
// SECTION: VM Versions
// ============================================================================

/// VM versions that receive their own test sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VmVersion {
    /// The May 2022 VM.
    Bch2022,
    /// The May 2023 VM (P2SH32, token introspection).
    Bch2023,
    /// The May 2025 VM (VM limits, big integers).
    Bch2025,
}

impl VmVersion {
    /// All supported versions in ascending order.
    pub const ALL: [Self; 3] = [Self::Bch2022, Self::Bch2023, Self::Bch2025];

    /// Returns the stable label for the version.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bch2022 => "2022",
            Self::Bch2023 => "2023",
            Self::Bch2025 => "2025",
        }
    }

    /// Returns true when the version recognizes 32-byte P2SH outputs.
    #[must_use]
    pub const fn supports_p2sh32(self) -> bool {
        !matches!(self, Self::Bch2022)
    }

    /// Parses a version label.
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|version| version.as_str() == value)
    }
}

impl fmt::Display for VmVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Evaluation Modes
// ============================================================================

/// Locking script types understood by the scenario compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockingType {
    /// The script is used as the locking bytecode directly.
    Standard,
    /// The script is wrapped in a 20-byte P2SH output.
    P2sh20,
    /// The script is wrapped in a 32-byte P2SH output.
    P2sh32,
}

/// How the redeem-or-locking script of a definition is placed on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TestMode {
    /// Bare locking script.
    #[serde(rename = "nonP2SH")]
    NonP2sh,
    /// Redeem script behind a 20-byte P2SH output.
    #[serde(rename = "P2SH20")]
    P2sh20,
    /// Redeem script behind a 32-byte P2SH output.
    #[serde(rename = "P2SH32")]
    P2sh32,
}

impl TestMode {
    /// All modes in plan order.
    pub const ALL: [Self; 3] = [Self::NonP2sh, Self::P2sh20, Self::P2sh32];

    /// Returns the stable label for the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NonP2sh => "nonP2SH",
            Self::P2sh20 => "P2SH20",
            Self::P2sh32 => "P2SH32",
        }
    }

    /// Returns the compiler locking type used for this mode.
    #[must_use]
    pub const fn locking_type(self) -> LockingType {
        match self {
            Self::NonP2sh => LockingType::Standard,
            Self::P2sh20 => LockingType::P2sh20,
            Self::P2sh32 => LockingType::P2sh32,
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Test Sets
// ============================================================================

/// Expected outcome recorded by a test set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TestSetClass {
    /// Fails validation.
    Invalid,
    /// Valid but rejected by standardness policy.
    Nonstandard,
    /// Valid and standard.
    Standard,
}

impl TestSetClass {
    /// Returns the stable label for the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Nonstandard => "nonstandard",
            Self::Standard => "standard",
        }
    }
}

/// Identifier of a test set, rendered as `{version}_{class}`.
///
/// # Invariants
/// - Ordering is by version, then class, matching the rendered file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestSetId {
    /// VM version evaluated by the set.
    pub version: VmVersion,
    /// Expected outcome class.
    pub class: TestSetClass,
}

impl TestSetId {
    /// Creates a test set identifier.
    #[must_use]
    pub const fn new(version: VmVersion, class: TestSetClass) -> Self {
        Self {
            version,
            class,
        }
    }
}

impl fmt::Display for TestSetId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}_{}", self.version.as_str(), self.class.as_str())
    }
}

impl Serialize for TestSetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// SECTION: Override Labels
// ============================================================================

/// Expected behavior requested by an override label for one VM version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expectation {
    /// Every mode fails.
    Invalid,
    /// Every mode is valid but nonstandard.
    Nonstandard,
    /// Every mode is valid and standard.
    Standard,
    /// Bare scripts are nonstandard, P2SH wrappers are standard.
    P2shStandard,
    /// Only the P2SH wrappers are generated.
    P2shOnly,
    /// Only the bare script is generated, as nonstandard.
    P2shIgnore,
}

impl Expectation {
    /// Expectation applied to versions no label mentions.
    pub const DEFAULT: Self = Self::P2shStandard;

    /// All expectations.
    const ALL: [Self; 6] = [
        Self::Invalid,
        Self::Nonstandard,
        Self::Standard,
        Self::P2shStandard,
        Self::P2shOnly,
        Self::P2shIgnore,
    ];

    /// Returns the stable label for the expectation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Nonstandard => "nonstandard",
            Self::Standard => "standard",
            Self::P2shStandard => "p2sh_standard",
            Self::P2shOnly => "p2sh_only",
            Self::P2shIgnore => "p2sh_ignore",
        }
    }

    /// Parses an expectation label.
    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|expectation| expectation.as_str() == value)
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors raised when parsing override labels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// Label is not of the form `{version}_{expectation}`.
    #[error("malformed test set override label: {0}")]
    Malformed(String),
    /// Label names an unsupported VM version.
    #[error("unknown VM version in test set override label: {0}")]
    UnknownVersion(String),
    /// Label names an unsupported expectation.
    #[error("unknown expectation in test set override label: {0}")]
    UnknownExpectation(String),
}

/// Test set override label, `{version}_{expectation}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestSetOverrideLabel {
    /// VM version the label applies to.
    pub version: VmVersion,
    /// Expected behavior under that version.
    pub expectation: Expectation,
}

impl TestSetOverrideLabel {
    /// Creates an override label.
    #[must_use]
    pub const fn new(version: VmVersion, expectation: Expectation) -> Self {
        Self {
            version,
            expectation,
        }
    }
}

impl FromStr for TestSetOverrideLabel {
    type Err = LabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((version, expectation)) = value.split_once('_') else {
            return Err(LabelError::Malformed(value.to_string()));
        };
        let version =
            VmVersion::parse(version).ok_or_else(|| LabelError::UnknownVersion(value.to_string()))?;
        let expectation = Expectation::parse(expectation)
            .ok_or_else(|| LabelError::UnknownExpectation(value.to_string()))?;
        Ok(Self::new(version, expectation))
    }
}

impl TryFrom<String> for TestSetOverrideLabel {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TestSetOverrideLabel> for String {
    fn from(label: TestSetOverrideLabel) -> Self {
        label.to_string()
    }
}

impl fmt::Display for TestSetOverrideLabel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}_{}", self.version, self.expectation)
    }
}
