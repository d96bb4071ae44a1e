// crates/vmb-testgen-core/tests/sample_definitions.rs
// ============================================================================
// Module: Sample Definition Tests
// Description: Checks the definition file shipped at the repository root.
// Purpose: Keep the sample loadable and every definition plannable.
// Dependencies: vmb-testgen-core
// ============================================================================

//! ## Overview
//! `definitions/core.json` mixes the compact and object forms; it must load,
//! and every definition in it must resolve to a test plan.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::Path;

use vmb_testgen_core::load_definition_file;
use vmb_testgen_core::resolve_test_plan;

#[test]
fn sample_definitions_load_and_plan() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../definitions/core.json");
    let groups = load_definition_file(&path).unwrap();
    let descriptions: Vec<&str> = groups.iter().map(|group| group.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Push and equality", "Locktime", "Additional scripts"]);

    let mut planned = 0;
    for group in &groups {
        for definition in &group.tests {
            let plan = resolve_test_plan(definition.test_set_overrides.as_deref()).unwrap();
            planned += plan.len();
        }
    }
    assert_eq!(planned, 3 + 3 + 1 + 3 + 3 + 3);
    assert!(groups[2].tests[0].additional_scripts.contains_key("push_true"));
    assert!(groups[1].tests[0].scenario.is_some());
}
