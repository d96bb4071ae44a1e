// crates/vmb-testgen-core/tests/proptest_plan.rs
// ============================================================================
// Module: Plan and Partition Property-Based Tests
// Description: Randomized label sets and master lists.
// Purpose: Check plan and partition invariants over arbitrary inputs.
// ============================================================================

//! ## Overview
//! - Every resolvable label set yields a non-empty plan in mode order whose
//!   sets name each version at most once, and never P2SH32 for 2022.
//! - Label order never changes the plan.
//! - Partitioning places every vector under exactly its own sets, in order.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;

use proptest::prelude::*;
use vmb_testgen_core::Expectation;
use vmb_testgen_core::TestMode;
use vmb_testgen_core::TestSetClass;
use vmb_testgen_core::TestSetId;
use vmb_testgen_core::TestSetOverrideLabel;
use vmb_testgen_core::VmVersion;
use vmb_testgen_core::VmbTest;
use vmb_testgen_core::partition_master_list;
use vmb_testgen_core::resolve_test_plan;

// ============================================================================
// SECTION: Strategies
// ============================================================================

fn version() -> impl Strategy<Value = VmVersion> {
    prop::sample::select(VmVersion::ALL.to_vec())
}

fn expectation() -> impl Strategy<Value = Expectation> {
    prop::sample::select(vec![
        Expectation::Invalid,
        Expectation::Nonstandard,
        Expectation::Standard,
        Expectation::P2shStandard,
        Expectation::P2shOnly,
        Expectation::P2shIgnore,
    ])
}

/// One label per chosen version, so the set never conflicts.
fn label_set() -> impl Strategy<Value = Vec<TestSetOverrideLabel>> {
    prop::collection::btree_map(version(), expectation(), 0 ..= 3).prop_map(|chosen| {
        chosen
            .into_iter()
            .map(|(version, expectation)| TestSetOverrideLabel::new(version, expectation))
            .collect()
    })
}

fn test_set() -> impl Strategy<Value = TestSetId> {
    (
        version(),
        prop::sample::select(vec![
            TestSetClass::Invalid,
            TestSetClass::Nonstandard,
            TestSetClass::Standard,
        ]),
    )
        .prop_map(|(version, class)| TestSetId::new(version, class))
}

fn master_list() -> impl Strategy<Value = Vec<VmbTest>> {
    prop::collection::vec(prop::collection::btree_set(test_set(), 1 ..= 4), 0 .. 12).prop_map(
        |memberships| {
            memberships
                .into_iter()
                .enumerate()
                .map(|(index, sets)| VmbTest {
                    short_id: format!("id{index:03}"),
                    description: format!("vector {index}"),
                    unlocking_script: "<1>".to_string(),
                    redeem_or_locking_script: "<1>".to_string(),
                    transaction_hex: "00".to_string(),
                    source_outputs_hex: "00".to_string(),
                    test_sets: sets.into_iter().collect(),
                    input_index: index % 2,
                })
                .collect()
        },
    )
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn plans_are_well_formed(labels in label_set()) {
        let plan = resolve_test_plan(Some(&labels)).unwrap();
        prop_assert!(!plan.is_empty());
        let modes: Vec<TestMode> = plan.iter().map(|item| item.mode).collect();
        let mut sorted = modes.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(&modes, &sorted);
        for item in &plan {
            prop_assert!(!item.sets.is_empty());
            let versions: BTreeSet<VmVersion> = item.sets.iter().map(|set| set.version).collect();
            prop_assert_eq!(versions.len(), item.sets.len());
            if item.mode == TestMode::P2sh32 {
                prop_assert!(!versions.contains(&VmVersion::Bch2022));
            }
        }
    }

    #[test]
    fn label_order_does_not_matter(labels in label_set()) {
        let mut reversed = labels.clone();
        reversed.reverse();
        prop_assert_eq!(
            resolve_test_plan(Some(&labels)).unwrap(),
            resolve_test_plan(Some(&reversed)).unwrap()
        );
    }

    #[test]
    fn partitions_cover_exactly_each_membership(master in master_list()) {
        let partitions = partition_master_list(&master);
        let total: usize = partitions.values().map(Vec::len).sum();
        let expected: usize = master.iter().map(|test| test.test_sets.len()).sum();
        prop_assert_eq!(total, expected);
        for (set, tests) in &partitions {
            prop_assert!(!tests.is_empty());
            let listed: Vec<&str> = tests.iter().map(|test| test.short_id.as_str()).collect();
            let members: Vec<&str> = master
                .iter()
                .filter(|test| test.test_sets.contains(set))
                .map(|test| test.short_id.as_str())
                .collect();
            prop_assert_eq!(listed, members);
        }
    }
}
