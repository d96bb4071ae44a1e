// crates/vmb-testgen-core/src/expand/tests.rs
// ============================================================================
// Module: Definition Expander Unit Tests
// Description: Expansion through a fixture compiler.
// Dependencies: vmb-testgen-core, serde_json
// ============================================================================

//! ## Overview
//! A fixture compiler returns a fixed one-input spend whose locktime counts
//! calls, so every compilation yields a distinct, known short id.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based helpers for clarity."
)]

use std::sync::Arc;
use std::sync::Mutex;

use serde_json::json;

use super::GenerationError;
use super::VmbTestGenerator;
use crate::definitions::VmbTestDefinition;
use crate::definitions::VmbTestDefinitionGroup;
use crate::events::GenerationEvent;
use crate::events::GenerationEventKind;
use crate::events::GenerationLogSink;
use crate::labels::LockingType;
use crate::labels::TestMode;
use crate::labels::TestSetClass;
use crate::labels::TestSetId;
use crate::labels::VmVersion;
use crate::plan::PlanError;
use crate::scenario::CompilerError;
use crate::scenario::GeneratedScenario;
use crate::scenario::ScenarioCompiler;
use crate::scenario::ScenarioInput;
use crate::scenario::ScenarioOutput;
use crate::scenario::ScenarioRequest;
use crate::scenario::ScenarioTransaction;
use crate::template::CompilerConfiguration;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const SOURCE_OUTPUTS_HEX: &str = "0110270000000000000151";

#[derive(Default)]
struct FixtureCompiler {
    calls: Mutex<Vec<(CompilerConfiguration, ScenarioRequest)>>,
    fixed_locktime: Option<u32>,
    fail_on_call: Option<usize>,
    input_index: usize,
}

fn spend(locktime: u32) -> GeneratedScenario {
    GeneratedScenario {
        transaction: ScenarioTransaction {
            version: 2,
            inputs: vec![ScenarioInput {
                outpoint_transaction_hash: format!("{}ff", "00".repeat(31)),
                outpoint_index: 0,
                sequence_number: 0,
                unlocking_bytecode: "51".to_string(),
            }],
            outputs: vec![ScenarioOutput {
                locking_bytecode: "6a".to_string(),
                value_satoshis: 0,
            }],
            locktime,
        },
        source_outputs: vec![ScenarioOutput {
            locking_bytecode: "51".to_string(),
            value_satoshis: 10_000,
        }],
        input_index: 0,
    }
}

impl ScenarioCompiler for FixtureCompiler {
    fn generate_scenario(
        &self,
        configuration: &CompilerConfiguration,
        request: &ScenarioRequest,
    ) -> Result<GeneratedScenario, CompilerError> {
        let mut calls = self.calls.lock().unwrap();
        let call = calls.len();
        calls.push((configuration.clone(), request.clone()));
        if self.fail_on_call == Some(call) {
            return Err(CompilerError::Scenario("unknown identifier".to_string()));
        }
        let locktime = self.fixed_locktime.unwrap_or_else(|| u32::try_from(call).unwrap());
        let mut scenario = spend(locktime);
        if self.input_index > 0 {
            for _ in 0 .. self.input_index {
                scenario.transaction.inputs.push(scenario.transaction.inputs[0].clone());
                scenario.source_outputs.push(scenario.source_outputs[0].clone());
            }
            scenario.input_index = self.input_index;
        }
        Ok(scenario)
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<GenerationEvent>>,
}

impl GenerationLogSink for CollectingSink {
    fn record(&self, event: &GenerationEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn definition(overrides: Option<&[&str]>) -> VmbTestDefinition {
    let mut definition = VmbTestDefinition::new("<1>", "<1> OP_EQUAL", "one equals one");
    definition.test_set_overrides =
        overrides.map(|labels| labels.iter().map(|label| label.parse().unwrap()).collect());
    definition
}

fn set(version: VmVersion, class: TestSetClass) -> TestSetId {
    TestSetId::new(version, class)
}

// ============================================================================
// SECTION: Expansion
// ============================================================================

#[test]
fn default_plan_compiles_every_mode() {
    let generator = VmbTestGenerator::new(FixtureCompiler::default());
    let tests = generator.expand_definition("Equality", &definition(None)).unwrap();

    let ids: Vec<&str> = tests.iter().map(|test| test.short_id.as_str()).collect();
    assert_eq!(ids, vec!["j8j3v", "rxlx3", "rs2sp"]);
    let descriptions: Vec<&str> = tests.iter().map(|test| test.description.as_str()).collect();
    assert_eq!(
        descriptions,
        vec![
            "Equality: one equals one (nonP2SH)",
            "Equality: one equals one (P2SH20)",
            "Equality: one equals one (P2SH32)",
        ]
    );
    assert_eq!(
        tests[0].transaction_hex,
        "0200000001ff0000000000000000000000000000000000000000000000000000000000000000000000015100\
         000000010000000000000000016a00000000"
    );
    assert_eq!(tests[0].source_outputs_hex, SOURCE_OUTPUTS_HEX);
    assert_eq!(tests[0].unlocking_script, "<1>");
    assert_eq!(tests[0].redeem_or_locking_script, "<1> OP_EQUAL");
    assert_eq!(tests[2].test_sets, vec![
        set(VmVersion::Bch2023, TestSetClass::Standard),
        set(VmVersion::Bch2025, TestSetClass::Standard),
    ]);
}

#[test]
fn each_mode_gets_a_fresh_configuration() {
    let generator = VmbTestGenerator::new(FixtureCompiler::default())
        .with_supported(vec!["BCH_2025_05".to_string()]);
    generator.expand_definition("Equality", &definition(None)).unwrap();

    let calls = generator.compiler().calls.lock().unwrap();
    let locking_types: Vec<Option<LockingType>> =
        calls.iter().map(|(configuration, _)| configuration.scripts["lock"].locking_type).collect();
    assert_eq!(
        locking_types,
        vec![Some(LockingType::Standard), Some(LockingType::P2sh20), Some(LockingType::P2sh32)]
    );
    let (configuration, request) = &calls[0];
    assert_eq!(configuration.supported, vec!["BCH_2025_05".to_string()]);
    assert_eq!(configuration.scripts["unlock"].unlocks.as_deref(), Some("lock"));
    assert!(configuration.scenarios.is_empty());
    assert_eq!(request.scenario_id, None);
}

#[test]
fn scenario_overrides_reach_the_compiler() {
    let mut with_scenario = definition(None);
    with_scenario.scenario = Some(json!({"transaction": {"locktime": 500}}));
    let generator = VmbTestGenerator::new(FixtureCompiler::default());
    generator.expand_definition("Scenario", &with_scenario).unwrap();

    let calls = generator.compiler().calls.lock().unwrap();
    let (configuration, request) = &calls[0];
    assert_eq!(request.scenario_id.as_deref(), Some("vmb_scenario"));
    assert_eq!(configuration.scenarios["vmb_scenario"]["transaction"]["locktime"], 500);
}

#[test]
fn override_labels_shape_the_vectors() {
    let generator = VmbTestGenerator::new(FixtureCompiler::default());
    let tests = generator
        .expand_definition("Labels", &definition(Some(&["2022_invalid", "2023_p2sh_only"])))
        .unwrap();
    assert_eq!(tests.len(), 3);
    assert_eq!(tests[0].test_sets, vec![
        set(VmVersion::Bch2022, TestSetClass::Invalid),
        set(VmVersion::Bch2025, TestSetClass::Nonstandard),
    ]);
}

#[test]
fn non_zero_input_index_is_kept() {
    let compiler = FixtureCompiler {
        input_index: 1,
        ..FixtureCompiler::default()
    };
    let generator = VmbTestGenerator::new(compiler);
    let tests = generator.expand_definition("Inputs", &definition(None)).unwrap();
    assert!(tests.iter().all(|test| test.input_index == 1));
    assert!(tests[0].source_outputs_hex.starts_with("02"));
}

// ============================================================================
// SECTION: Failures
// ============================================================================

#[test]
fn compiler_errors_name_the_test_and_mode() {
    let compiler = FixtureCompiler {
        fail_on_call: Some(1),
        ..FixtureCompiler::default()
    };
    let generator = VmbTestGenerator::new(compiler);
    let err = generator.expand_definition("Equality", &definition(None)).unwrap_err();
    assert!(matches!(
        &err,
        GenerationError::Compiler {
            mode: TestMode::P2sh20,
            source: CompilerError::Scenario(_),
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "Equality: one equals one (P2SH20): scenario generation failed: unknown identifier"
    );
}

#[test]
fn conflicting_labels_fail_before_compiling() {
    let generator = VmbTestGenerator::new(FixtureCompiler::default());
    let err = generator
        .expand_definition("Labels", &definition(Some(&["2025_standard", "2025_invalid"])))
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::Plan {
            source: PlanError::ConflictingLabels { .. },
            ..
        }
    ));
    assert!(generator.compiler().calls.lock().unwrap().is_empty());
}

#[test]
fn duplicate_short_ids_are_rejected() {
    let compiler = FixtureCompiler {
        fixed_locktime: Some(7),
        ..FixtureCompiler::default()
    };
    let generator = VmbTestGenerator::new(compiler);
    let groups = [VmbTestDefinitionGroup {
        description: "Dupes".to_string(),
        tests: vec![definition(None)],
    }];
    let err = generator.generate(&groups).unwrap_err();
    let GenerationError::DuplicateShortId {
        first,
        second,
        ..
    } = err
    else {
        panic!("expected duplicate short id, got {err}");
    };
    assert_eq!(first, "Dupes: one equals one (nonP2SH)");
    assert_eq!(second, "Dupes: one equals one (P2SH20)");
}

// ============================================================================
// SECTION: Master List
// ============================================================================

#[test]
fn generate_concatenates_groups_and_logs_events() {
    let sink = Arc::new(CollectingSink::default());
    let generator = VmbTestGenerator::new(FixtureCompiler::default())
        .with_log_sink(Arc::clone(&sink) as Arc<dyn GenerationLogSink>);
    let groups = [
        VmbTestDefinitionGroup {
            description: "First".to_string(),
            tests: vec![definition(Some(&["2022_p2sh_ignore", "2023_p2sh_ignore", "2025_p2sh_ignore"]))],
        },
        VmbTestDefinitionGroup {
            description: "Second".to_string(),
            tests: vec![definition(None)],
        },
    ];
    let master = generator.generate(&groups).unwrap();
    let ids: Vec<&str> = master.iter().map(|test| test.short_id.as_str()).collect();
    assert_eq!(ids, vec!["j8j3v", "rxlx3", "rs2sp", "sr9cd"]);
    assert_eq!(master[1].description, "Second: one equals one (nonP2SH)");

    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0].kind,
        GenerationEventKind::DefinitionExpanded {
            description: "First: one equals one".to_string(),
            modes: vec![TestMode::NonP2sh],
            short_ids: vec!["j8j3v".to_string()],
        }
    );
    assert_eq!(
        events[2].kind,
        GenerationEventKind::GenerationSummary {
            definitions: 2,
            vectors: 4,
            test_sets: 6,
        }
    );
}
