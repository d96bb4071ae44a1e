// crates/vmb-testgen-core/src/scenario.rs
// ============================================================================
// Module: Scenario Compiler Interface
// Description: Request/response shapes and the trait for scenario generation.
// Purpose: Isolate the external script compiler behind a narrow seam.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Script compilation, signing, and transaction synthesis live outside this
//! workspace. A [`ScenarioCompiler`] receives a [`CompilerConfiguration`] and a
//! [`ScenarioRequest`] and returns the [`GeneratedScenario`] it built: the
//! spending transaction, the outputs it spends, and the index of the input
//! under test. Hex strings are used for all bytecode and hashes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::template::CompilerConfiguration;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Identifies which scripts and scenario the compiler should use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRequest {
    /// Script id of the locking (or redeem) script.
    pub locking_script_id: String,
    /// Script id of the unlocking script.
    pub unlocking_script_id: String,
    /// Scenario id, or `None` for the compiler's default scenario.
    pub scenario_id: Option<String>,
}

// ============================================================================
// SECTION: Generated Scenarios
// ============================================================================

/// Transaction input produced by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScenarioInput {
    /// Hex transaction hash of the spent outpoint, in display byte order.
    pub outpoint_transaction_hash: String,
    /// Output index of the spent outpoint.
    pub outpoint_index: u32,
    /// Input sequence number.
    pub sequence_number: u32,
    /// Hex unlocking bytecode.
    pub unlocking_bytecode: String,
}

/// Transaction output (or spent source output) produced by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScenarioOutput {
    /// Hex locking bytecode.
    pub locking_bytecode: String,
    /// Output value in satoshis.
    pub value_satoshis: u64,
}

/// Transaction produced by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScenarioTransaction {
    /// Transaction version.
    pub version: u32,
    /// Transaction inputs.
    pub inputs: Vec<ScenarioInput>,
    /// Transaction outputs.
    pub outputs: Vec<ScenarioOutput>,
    /// Transaction locktime.
    pub locktime: u32,
}

/// Scenario program returned by the compiler.
///
/// # Invariants
/// - After [`GeneratedScenario::validate`], there is exactly one source output
///   per input and `input_index` addresses an existing input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneratedScenario {
    /// Spending transaction.
    pub transaction: ScenarioTransaction,
    /// Outputs spent by each input, in input order.
    pub source_outputs: Vec<ScenarioOutput>,
    /// Index of the input under test.
    #[serde(default)]
    pub input_index: usize,
}

impl GeneratedScenario {
    /// Checks the structural invariants of a generated scenario.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::InvalidScenario`] when source outputs do not
    /// line up with inputs or the input index is out of range.
    pub fn validate(&self) -> Result<(), CompilerError> {
        let inputs = self.transaction.inputs.len();
        if self.source_outputs.len() != inputs {
            return Err(CompilerError::InvalidScenario(format!(
                "{} source outputs for {inputs} inputs",
                self.source_outputs.len()
            )));
        }
        if self.input_index >= inputs {
            return Err(CompilerError::InvalidScenario(format!(
                "input index {} out of range for {inputs} inputs",
                self.input_index
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Compiler Trait
// ============================================================================

/// Errors raised by scenario compilers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilerError {
    /// The compiler rejected the scripts or scenario.
    #[error("scenario generation failed: {0}")]
    Scenario(String),
    /// The compiler could not be reached or answered incoherently.
    #[error("compiler transport error: {0}")]
    Transport(String),
    /// The compiler answered with a structurally invalid scenario.
    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

/// External script compiler and scenario generator.
pub trait ScenarioCompiler {
    /// Compiles the configuration and generates the requested scenario.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError`] when compilation or scenario generation fails.
    fn generate_scenario(
        &self,
        configuration: &CompilerConfiguration,
        request: &ScenarioRequest,
    ) -> Result<GeneratedScenario, CompilerError>;
}
