// crates/vmb-testgen-core/src/plan.rs
// ============================================================================
// Module: Test Plan Resolver
// Description: Static mapping from override labels to per-mode test set plans.
// Purpose: Decide which modes are generated and which sets each vector joins.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A definition is compiled once per planned [`TestMode`]. Each plan item
//! lists the [`TestSetId`]s the resulting vector belongs to. Resolution is a
//! pure lookup: every VM version takes the expectation named by an override
//! label (or [`Expectation::DEFAULT`]) and the static table in
//! [`planned_class`] turns `(expectation, mode)` into a test set class.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::labels::Expectation;
use crate::labels::TestMode;
use crate::labels::TestSetClass;
use crate::labels::TestSetId;
use crate::labels::TestSetOverrideLabel;
use crate::labels::VmVersion;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One compilation planned for a definition.
///
/// # Invariants
/// - `sets` is non-empty, sorted, and holds at most one class per version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestPlanItem {
    /// Mode used to compile the definition.
    pub mode: TestMode,
    /// Test sets receiving the resulting vector.
    pub sets: Vec<TestSetId>,
}

/// Errors raised when resolving a test plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Two labels request different expectations for the same version.
    #[error("conflicting test set override labels for {version}: {first} and {second}")]
    ConflictingLabels {
        /// Version named by both labels.
        version: VmVersion,
        /// First label seen for the version.
        first: TestSetOverrideLabel,
        /// Conflicting label.
        second: TestSetOverrideLabel,
    },
    /// No mode yields a test set, so nothing would be generated.
    #[error("test set override labels leave no mode to generate")]
    EmptyPlan,
}

// ============================================================================
// SECTION: Static Table
// ============================================================================

/// Returns the test set class a vector joins for an expectation and mode, or
/// `None` when that mode is not generated.
#[must_use]
pub const fn planned_class(expectation: Expectation, mode: TestMode) -> Option<TestSetClass> {
    match (expectation, mode) {
        (Expectation::Invalid, _) => Some(TestSetClass::Invalid),
        (Expectation::Nonstandard, _)
        | (Expectation::P2shStandard | Expectation::P2shIgnore, TestMode::NonP2sh) => {
            Some(TestSetClass::Nonstandard)
        }
        (Expectation::Standard, _)
        | (
            Expectation::P2shStandard | Expectation::P2shOnly,
            TestMode::P2sh20 | TestMode::P2sh32,
        ) => Some(TestSetClass::Standard),
        (Expectation::P2shOnly, TestMode::NonP2sh)
        | (Expectation::P2shIgnore, TestMode::P2sh20 | TestMode::P2sh32) => None,
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves the expectation for every VM version.
///
/// # Errors
///
/// Returns [`PlanError::ConflictingLabels`] when two labels disagree on a
/// version. Repeating an identical label is accepted.
pub fn resolve_expectations(
    labels: Option<&[TestSetOverrideLabel]>,
) -> Result<BTreeMap<VmVersion, Expectation>, PlanError> {
    let mut chosen: BTreeMap<VmVersion, TestSetOverrideLabel> = BTreeMap::new();
    for label in labels.unwrap_or_default() {
        match chosen.get(&label.version) {
            Some(existing) if existing.expectation != label.expectation => {
                return Err(PlanError::ConflictingLabels {
                    version: label.version,
                    first: *existing,
                    second: *label,
                });
            }
            Some(_) => {}
            None => {
                chosen.insert(label.version, *label);
            }
        }
    }
    Ok(VmVersion::ALL
        .into_iter()
        .map(|version| {
            let expectation =
                chosen.get(&version).map_or(Expectation::DEFAULT, |label| label.expectation);
            (version, expectation)
        })
        .collect())
}

/// Resolves the ordered test plan for a definition's override labels.
///
/// Plan items follow [`TestMode::ALL`] order; modes without any set are
/// omitted and `P2SH32` is never planned for versions lacking support.
///
/// # Errors
///
/// Returns [`PlanError`] when the labels conflict or no mode remains.
pub fn resolve_test_plan(
    labels: Option<&[TestSetOverrideLabel]>,
) -> Result<Vec<TestPlanItem>, PlanError> {
    let expectations = resolve_expectations(labels)?;
    let mut plan = Vec::with_capacity(TestMode::ALL.len());
    for mode in TestMode::ALL {
        let sets: Vec<TestSetId> = expectations
            .iter()
            .filter(|(version, _)| mode != TestMode::P2sh32 || version.supports_p2sh32())
            .filter_map(|(version, expectation)| {
                planned_class(*expectation, mode).map(|class| TestSetId::new(*version, class))
            })
            .collect();
        if !sets.is_empty() {
            plan.push(TestPlanItem {
                mode,
                sets,
            });
        }
    }
    if plan.is_empty() {
        return Err(PlanError::EmptyPlan);
    }
    Ok(plan)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
