// crates/vmb-testgen-core/src/vectors.rs
// ============================================================================
// Module: Test Vectors
// Description: Generated VMB test vectors and their positional JSON form.
// Purpose: Define the records written to the master list and test set files.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Vectors serialize as positional JSON arrays so downstream harnesses in any
//! language can destructure them without a schema:
//!
//! ```text
//! [shortId, description, unlockingScript, redeemOrLockingScript,
//!  txHex, sourceOutputsHex, testSets, inputIndex?]
//! ```
//!
//! `inputIndex` is written only when it is non-zero. Vectors filed under a
//! test set drop the `testSets` entry since the file already names the set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeSeq;

use crate::labels::TestSetId;

// ============================================================================
// SECTION: Master Vectors
// ============================================================================

/// One generated test vector, as listed in the master list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmbTest {
    /// Short id derived from the encoded transaction and source outputs.
    pub short_id: String,
    /// `"{group}: {description} ({mode})"`.
    pub description: String,
    /// Unlocking script source.
    pub unlocking_script: String,
    /// Redeem or locking script source.
    pub redeem_or_locking_script: String,
    /// Hex-encoded transaction.
    pub transaction_hex: String,
    /// Hex-encoded source outputs.
    pub source_outputs_hex: String,
    /// Test sets the vector belongs to.
    pub test_sets: Vec<TestSetId>,
    /// Index of the input under test.
    pub input_index: usize,
}

impl VmbTest {
    /// Returns the vector as filed under a test set.
    #[must_use]
    pub fn without_test_sets(&self) -> PartitionedVmbTest {
        PartitionedVmbTest {
            short_id: self.short_id.clone(),
            description: self.description.clone(),
            unlocking_script: self.unlocking_script.clone(),
            redeem_or_locking_script: self.redeem_or_locking_script.clone(),
            transaction_hex: self.transaction_hex.clone(),
            source_outputs_hex: self.source_outputs_hex.clone(),
            input_index: self.input_index,
        }
    }
}

impl Serialize for VmbTest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.input_index == 0 { 7 } else { 8 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.short_id)?;
        seq.serialize_element(&self.description)?;
        seq.serialize_element(&self.unlocking_script)?;
        seq.serialize_element(&self.redeem_or_locking_script)?;
        seq.serialize_element(&self.transaction_hex)?;
        seq.serialize_element(&self.source_outputs_hex)?;
        seq.serialize_element(&self.test_sets)?;
        if self.input_index != 0 {
            seq.serialize_element(&self.input_index)?;
        }
        seq.end()
    }
}

// ============================================================================
// SECTION: Partitioned Vectors
// ============================================================================

/// A vector as filed under a test set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionedVmbTest {
    /// Short id.
    pub short_id: String,
    /// Description.
    pub description: String,
    /// Unlocking script source.
    pub unlocking_script: String,
    /// Redeem or locking script source.
    pub redeem_or_locking_script: String,
    /// Hex-encoded transaction.
    pub transaction_hex: String,
    /// Hex-encoded source outputs.
    pub source_outputs_hex: String,
    /// Index of the input under test.
    pub input_index: usize,
}

impl Serialize for PartitionedVmbTest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.input_index == 0 { 6 } else { 7 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.short_id)?;
        seq.serialize_element(&self.description)?;
        seq.serialize_element(&self.unlocking_script)?;
        seq.serialize_element(&self.redeem_or_locking_script)?;
        seq.serialize_element(&self.transaction_hex)?;
        seq.serialize_element(&self.source_outputs_hex)?;
        if self.input_index != 0 {
            seq.serialize_element(&self.input_index)?;
        }
        seq.end()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
