// crates/vmb-testgen-core/src/partition/tests.rs
// ============================================================================
// Module: Partitioning Unit Tests
// Description: Set membership, ordering, and empty-set handling.
// Dependencies: vmb-testgen-core
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions use panic-based helpers for clarity."
)]

use super::partition_master_list;
use crate::labels::TestSetClass;
use crate::labels::TestSetId;
use crate::labels::VmVersion;
use crate::vectors::VmbTest;

fn vector(short_id: &str, sets: &[TestSetId]) -> VmbTest {
    VmbTest {
        short_id: short_id.to_string(),
        description: format!("vector {short_id}"),
        unlocking_script: "<1>".to_string(),
        redeem_or_locking_script: "<1>".to_string(),
        transaction_hex: "00".to_string(),
        source_outputs_hex: "00".to_string(),
        test_sets: sets.to_vec(),
        input_index: 0,
    }
}

const STANDARD_2022: TestSetId = TestSetId::new(VmVersion::Bch2022, TestSetClass::Standard);
const INVALID_2023: TestSetId = TestSetId::new(VmVersion::Bch2023, TestSetClass::Invalid);
const STANDARD_2025: TestSetId = TestSetId::new(VmVersion::Bch2025, TestSetClass::Standard);

#[test]
fn vectors_appear_under_each_of_their_sets_in_order() {
    let master = [
        vector("aaaaa", &[STANDARD_2022, STANDARD_2025]),
        vector("bbbbb", &[INVALID_2023]),
        vector("ccccc", &[STANDARD_2025, STANDARD_2022]),
    ];
    let partitions = partition_master_list(&master);

    let keys: Vec<String> = partitions.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["2022_standard", "2023_invalid", "2025_standard"]);

    let ids = |set: TestSetId| -> Vec<String> {
        partitions[&set].iter().map(|test| test.short_id.clone()).collect()
    };
    assert_eq!(ids(STANDARD_2022), vec!["aaaaa", "ccccc"]);
    assert_eq!(ids(INVALID_2023), vec!["bbbbb"]);
    assert_eq!(ids(STANDARD_2025), vec!["aaaaa", "ccccc"]);
    assert_eq!(partitions[&INVALID_2023][0], master[1].without_test_sets());
}

#[test]
fn empty_master_list_has_no_partitions() {
    assert!(partition_master_list(&[]).is_empty());
}
