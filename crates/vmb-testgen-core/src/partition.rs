// crates/vmb-testgen-core/src/partition.rs
// ============================================================================
// Module: Test Set Partitioning
// Description: Groups master-list vectors by test set.
// Purpose: Produce the per-set vector lists written next to the master list.
// Dependencies: vmb-testgen-core
// ============================================================================

//! ## Overview
//! Every vector appears under each of its test sets, in master-list order,
//! with its set membership removed. Sets no vector belongs to are absent.

use std::collections::BTreeMap;

use crate::labels::TestSetId;
use crate::vectors::PartitionedVmbTest;
use crate::vectors::VmbTest;

/// Test sets keyed by id, in id order.
pub type TestSetPartitions = BTreeMap<TestSetId, Vec<PartitionedVmbTest>>;

/// Partitions the master list by test set.
#[must_use]
pub fn partition_master_list(master: &[VmbTest]) -> TestSetPartitions {
    let mut partitions = TestSetPartitions::new();
    for test in master {
        let partitioned = test.without_test_sets();
        for set in &test.test_sets {
            partitions.entry(*set).or_default().push(partitioned.clone());
        }
    }
    partitions
}

#[cfg(test)]
mod tests;
