// crates/vmb-testgen-core/src/template.rs
// ============================================================================
// Module: Compiler Configuration
// Description: Wallet-template shaped configuration built per definition/mode.
// Purpose: Hand the external compiler everything one test vector needs.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Each planned compilation gets a fresh configuration: the definition's
//! extra scripts, a locking script wrapped according to the [`TestMode`], an
//! unlocking script that unlocks it, a single `tester` entity holding the
//! keys scripts may reference, and the definition's scenario override.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::definitions::VmbTestDefinition;
use crate::labels::LockingType;
use crate::labels::TestMode;
use crate::scenario::ScenarioRequest;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Script id of the generated locking (or redeem) script.
pub const LOCKING_SCRIPT_ID: &str = "lock";
/// Script id of the generated unlocking script.
pub const UNLOCKING_SCRIPT_ID: &str = "unlock";
/// Scenario id used for a definition's scenario override.
pub const SCENARIO_ID: &str = "vmb_scenario";
/// Entity owning the test keys.
pub const TESTER_ENTITY_ID: &str = "tester";
/// Key variables available to every definition.
pub const TESTER_KEY_IDS: [&str; 3] = ["key1", "key2", "key3"];
/// Variable type of the tester keys.
const TESTER_KEY_TYPE: &str = "HdKey";
/// Compiler VM identifier used when none is configured.
pub const DEFAULT_SUPPORTED_VM: &str = "BCH_SPEC";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Script entry of a compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TemplateScript {
    /// CashAssembly source.
    pub script: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Locking type, present only on locking scripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locking_type: Option<LockingType>,
    /// Script id this script unlocks, present only on unlocking scripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocks: Option<String>,
}

/// Variable owned by an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateVariable {
    /// Variable type understood by the compiler.
    #[serde(rename = "type")]
    pub variable_type: String,
}

/// Entity owning variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateEntity {
    /// Variables keyed by id.
    pub variables: BTreeMap<String, TemplateVariable>,
}

/// Configuration handed to the scenario compiler.
///
/// # Invariants
/// - `scripts` always holds [`LOCKING_SCRIPT_ID`] and [`UNLOCKING_SCRIPT_ID`].
/// - `scenarios` holds at most [`SCENARIO_ID`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompilerConfiguration {
    /// Entities keyed by id.
    pub entities: BTreeMap<String, TemplateEntity>,
    /// Scenarios keyed by id, passed through untouched.
    pub scenarios: BTreeMap<String, Value>,
    /// Scripts keyed by id.
    pub scripts: BTreeMap<String, TemplateScript>,
    /// VM identifiers the configuration targets.
    pub supported: Vec<String>,
    /// Configuration format version.
    pub version: u32,
}

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Builds the compiler configuration for one definition compiled in one mode.
#[must_use]
pub fn build_configuration(
    definition: &VmbTestDefinition,
    mode: TestMode,
    supported: &[String],
) -> CompilerConfiguration {
    let variables = TESTER_KEY_IDS
        .iter()
        .map(|id| {
            let variable = TemplateVariable {
                variable_type: TESTER_KEY_TYPE.to_string(),
            };
            ((*id).to_string(), variable)
        })
        .collect();
    let mut entities = BTreeMap::new();
    entities.insert(
        TESTER_ENTITY_ID.to_string(),
        TemplateEntity {
            variables,
        },
    );

    let mut scenarios = BTreeMap::new();
    if let Some(scenario) = &definition.scenario {
        scenarios.insert(SCENARIO_ID.to_string(), scenario.clone());
    }

    let mut scripts = definition.additional_scripts.clone();
    scripts.insert(
        LOCKING_SCRIPT_ID.to_string(),
        TemplateScript {
            script: definition.redeem_or_locking_script.clone(),
            name: None,
            locking_type: Some(mode.locking_type()),
            unlocks: None,
        },
    );
    scripts.insert(
        UNLOCKING_SCRIPT_ID.to_string(),
        TemplateScript {
            script: definition.unlocking_script.clone(),
            name: None,
            locking_type: None,
            unlocks: Some(LOCKING_SCRIPT_ID.to_string()),
        },
    );

    CompilerConfiguration {
        entities,
        scenarios,
        scripts,
        supported: supported.to_vec(),
        version: 0,
    }
}

/// Builds the scenario request matching [`build_configuration`].
#[must_use]
pub fn build_request(definition: &VmbTestDefinition) -> ScenarioRequest {
    ScenarioRequest {
        locking_script_id: LOCKING_SCRIPT_ID.to_string(),
        unlocking_script_id: UNLOCKING_SCRIPT_ID.to_string(),
        scenario_id: definition.scenario.as_ref().map(|_| SCENARIO_ID.to_string()),
    }
}
