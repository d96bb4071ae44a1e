// crates/vmb-testgen-core/src/expand.rs
// ============================================================================
// Module: Definition Expander
// Description: Expands definitions into test vectors through a compiler.
// Purpose: Run the plan, compile every planned mode, and assemble vectors.
// Dependencies: bitcoin, thiserror
// ============================================================================

//! ## Overview
//! [`VmbTestGenerator`] owns a [`ScenarioCompiler`] and turns each definition
//! into one vector per planned [`TestMode`]:
//!
//! 1. resolve the test plan from the definition's override labels,
//! 2. build a fresh compiler configuration for the mode,
//! 3. generate and validate the scenario,
//! 4. encode the transaction and source outputs and derive the short id.
//!
//! [`VmbTestGenerator::generate`] concatenates every group's vectors into the
//! master list, in definition order, and fails closed on duplicate short ids.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use bitcoin::hex::DisplayHex;
use thiserror::Error;

use crate::definitions::VmbTestDefinition;
use crate::definitions::VmbTestDefinitionGroup;
use crate::encoding::EncodingError;
use crate::encoding::encode_transaction;
use crate::encoding::encode_transaction_outputs;
use crate::events::GenerationEvent;
use crate::events::GenerationEventKind;
use crate::events::GenerationLogSink;
use crate::events::NoopLogSink;
use crate::hashing::short_id;
use crate::labels::TestMode;
use crate::plan::PlanError;
use crate::plan::resolve_test_plan;
use crate::scenario::CompilerError;
use crate::scenario::ScenarioCompiler;
use crate::template::DEFAULT_SUPPORTED_VM;
use crate::template::build_configuration;
use crate::template::build_request;
use crate::vectors::VmbTest;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while expanding definitions.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The definition's override labels do not resolve to a plan.
    #[error("{description}: {source}")]
    Plan {
        /// Full test description.
        description: String,
        /// Plan failure.
        source: PlanError,
    },
    /// The compiler failed for one mode.
    #[error("{description} ({mode}): {source}")]
    Compiler {
        /// Full test description.
        description: String,
        /// Mode being compiled.
        mode: TestMode,
        /// Compiler failure.
        source: CompilerError,
    },
    /// The generated scenario could not be encoded.
    #[error("{description} ({mode}): {source}")]
    Encoding {
        /// Full test description.
        description: String,
        /// Mode being compiled.
        mode: TestMode,
        /// Encoding failure.
        source: EncodingError,
    },
    /// Two vectors hash to the same short id.
    #[error("duplicate short id {short_id}: \"{first}\" and \"{second}\"")]
    DuplicateShortId {
        /// Colliding short id.
        short_id: String,
        /// Description of the earlier vector.
        first: String,
        /// Description of the later vector.
        second: String,
    },
}

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Expands definitions into VMB test vectors.
pub struct VmbTestGenerator<C> {
    /// External scenario compiler.
    compiler: C,
    /// VM identifiers placed in every configuration.
    supported: Vec<String>,
    /// Sink receiving generation events.
    log_sink: Arc<dyn GenerationLogSink>,
}

impl<C: ScenarioCompiler> VmbTestGenerator<C> {
    /// Creates a generator targeting the default VM with events discarded.
    #[must_use]
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            supported: vec![DEFAULT_SUPPORTED_VM.to_string()],
            log_sink: Arc::new(NoopLogSink),
        }
    }

    /// Replaces the VM identifiers placed in every configuration.
    #[must_use]
    pub fn with_supported(mut self, supported: Vec<String>) -> Self {
        self.supported = supported;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_log_sink(mut self, log_sink: Arc<dyn GenerationLogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    /// Returns the wrapped compiler.
    #[cfg(test)]
    pub(crate) const fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Expands one definition into a vector per planned mode.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when the plan, compiler, or encoding fails.
    pub fn expand_definition(
        &self,
        group_description: &str,
        definition: &VmbTestDefinition,
    ) -> Result<Vec<VmbTest>, GenerationError> {
        let description = format!("{group_description}: {}", definition.description);
        let plan = resolve_test_plan(definition.test_set_overrides.as_deref()).map_err(
            |source| GenerationError::Plan {
                description: description.clone(),
                source,
            },
        )?;
        let request = build_request(definition);

        let mut tests = Vec::with_capacity(plan.len());
        let mut modes = Vec::with_capacity(plan.len());
        for item in plan {
            let mode = item.mode;
            modes.push(mode);
            let compiler_error = |source: CompilerError| GenerationError::Compiler {
                description: description.clone(),
                mode,
                source,
            };
            let encoding_error = |source: EncodingError| GenerationError::Encoding {
                description: description.clone(),
                mode,
                source,
            };

            let configuration = build_configuration(definition, mode, &self.supported);
            let scenario = self
                .compiler
                .generate_scenario(&configuration, &request)
                .map_err(compiler_error)?;
            scenario.validate().map_err(compiler_error)?;
            let transaction =
                encode_transaction(&scenario.transaction).map_err(encoding_error)?;
            let source_outputs =
                encode_transaction_outputs(&scenario.source_outputs).map_err(encoding_error)?;

            tests.push(VmbTest {
                short_id: short_id(&transaction, &source_outputs),
                description: format!("{description} ({mode})"),
                unlocking_script: definition.unlocking_script.clone(),
                redeem_or_locking_script: definition.redeem_or_locking_script.clone(),
                transaction_hex: transaction.to_lower_hex_string(),
                source_outputs_hex: source_outputs.to_lower_hex_string(),
                test_sets: item.sets,
                input_index: scenario.input_index,
            });
        }

        self.log_sink.record(&GenerationEvent::new(GenerationEventKind::DefinitionExpanded {
            description,
            modes,
            short_ids: tests.iter().map(|test| test.short_id.clone()).collect(),
        }));
        Ok(tests)
    }

    /// Expands every definition of every group into the master list.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] when any expansion fails or two vectors
    /// share a short id.
    pub fn generate(
        &self,
        groups: &[VmbTestDefinitionGroup],
    ) -> Result<Vec<VmbTest>, GenerationError> {
        let mut master = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut definitions = 0usize;
        for group in groups {
            for definition in &group.tests {
                definitions += 1;
                for test in self.expand_definition(&group.description, definition)? {
                    if let Some(&index) = seen.get(&test.short_id) {
                        let first = master
                            .get(index)
                            .map_or_else(String::new, |earlier: &VmbTest| {
                                earlier.description.clone()
                            });
                        return Err(GenerationError::DuplicateShortId {
                            short_id: test.short_id,
                            first,
                            second: test.description,
                        });
                    }
                    seen.insert(test.short_id.clone(), master.len());
                    master.push(test);
                }
            }
        }

        let test_sets: BTreeSet<_> =
            master.iter().flat_map(|test| test.test_sets.iter().copied()).collect();
        self.log_sink.record(&GenerationEvent::new(GenerationEventKind::GenerationSummary {
            definitions,
            vectors: master.len(),
            test_sets: test_sets.len(),
        }));
        Ok(master)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
