// crates/vmb-testgen-core/src/lib.rs
// ============================================================================
// Module: VMB Test Generator Core Library
// Description: Public API surface for VMB test vector generation.
// Purpose: Expose plans, definitions, the compiler seam, and vector assembly.
// Dependencies: crate::{labels, plan, definitions, template, scenario, ...}
// ============================================================================

//! ## Overview
//! The core expands compact VM bytecode test definitions into exhaustive test
//! vectors. Each definition is compiled once per planned evaluation mode by an
//! external [`ScenarioCompiler`]; the resulting transaction and source outputs
//! are consensus-encoded, identified by a short hash, and filed under the test
//! sets that record their expected validity per VM version.
//!
//! Script compilation and transaction synthesis are out of scope. The crate
//! ships [`ProcessScenarioCompiler`] to reach a compiler running as a child
//! process.
//!
//! ## Index
//! - Plans: [`resolve_test_plan`], [`TestPlanItem`], [`TestSetId`]
//! - Definitions: [`VmbTestDefinition`], [`load_definition_file`]
//! - Expansion: [`VmbTestGenerator`], [`VmbTest`], [`partition_master_list`]
//! - Events: [`GenerationEvent`], [`GenerationLogSink`]

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod definitions;
pub mod encoding;
pub mod events;
pub mod expand;
pub mod hashing;
pub mod labels;
pub mod partition;
pub mod plan;
pub mod process;
pub mod scenario;
pub mod template;
pub mod vectors;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use definitions::DefinitionError;
pub use definitions::DefinitionFormat;
pub use definitions::VmbTestDefinition;
pub use definitions::VmbTestDefinitionGroup;
pub use definitions::load_definition_file;
pub use definitions::parse_definition_groups;
pub use encoding::EncodingError;
pub use encoding::encode_transaction;
pub use encoding::encode_transaction_outputs;
pub use events::FileLogSink;
pub use events::GenerationEvent;
pub use events::GenerationEventKind;
pub use events::GenerationLogSink;
pub use events::NoopLogSink;
pub use events::StderrLogSink;
pub use expand::GenerationError;
pub use expand::VmbTestGenerator;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::short_id;
pub use labels::Expectation;
pub use labels::LabelError;
pub use labels::TestMode;
pub use labels::TestSetClass;
pub use labels::TestSetId;
pub use labels::TestSetOverrideLabel;
pub use labels::VmVersion;
pub use partition::TestSetPartitions;
pub use partition::partition_master_list;
pub use plan::PlanError;
pub use plan::TestPlanItem;
pub use plan::resolve_test_plan;
pub use process::MAX_COMPILER_RESPONSE_BYTES;
pub use process::ProcessScenarioCompiler;
pub use scenario::CompilerError;
pub use scenario::GeneratedScenario;
pub use scenario::ScenarioCompiler;
pub use scenario::ScenarioInput;
pub use scenario::ScenarioOutput;
pub use scenario::ScenarioRequest;
pub use scenario::ScenarioTransaction;
pub use template::CompilerConfiguration;
pub use template::DEFAULT_SUPPORTED_VM;
pub use vectors::PartitionedVmbTest;
pub use vectors::VmbTest;
