// crates/vmb-testgen-bundle/src/types.rs
// ============================================================================
// Module: Bundle Types
// Description: Data models for emitted vector files and their manifest.
// Purpose: Provide canonical shapes for the output directory contents.
// Dependencies: vmb-testgen-core, serde
// ============================================================================

//! ## Overview
//! A [`VectorBundle`] is the in-memory form of an output directory: one
//! artifact for the master list, one per non-empty test set, and the
//! [`BundleManifest`] written beside them as `index.json`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use vmb_testgen_core::HashAlgorithm;
use vmb_testgen_core::HashDigest;

// ============================================================================
// SECTION: Manifest Types
// ============================================================================

/// Manifest describing the emitted vector files.
///
/// # Invariants
/// - When produced by [`crate::BundleBuilder`], `generator_version` matches the crate version that
///   generated the files.
/// - When produced by [`crate::BundleBuilder`], `artifacts` are ordered by their `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Generator version identifier (matches the crate version).
    pub generator_version: String,
    /// Hash algorithm used for artifact digests.
    pub hash_algorithm: HashAlgorithm,
    /// Number of vectors in the master list.
    pub test_count: usize,
    /// Test set identifiers with at least one vector, in set order.
    pub test_sets: Vec<String>,
    /// Artifacts included in the bundle, ordered by path.
    pub artifacts: Vec<ManifestArtifact>,
}

/// Manifest entry describing a single artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestArtifact {
    /// File name under the output directory.
    pub path: String,
    /// Artifact content type.
    pub content_type: String,
    /// Number of vectors in the file.
    pub test_count: usize,
    /// Content digest for the artifact payload.
    pub digest: HashDigest,
}

// ============================================================================
// SECTION: Bundle Types
// ============================================================================

/// Generated vector files with manifest metadata.
///
/// # Invariants
/// - When produced by [`crate::BundleBuilder`], `manifest` is derived from `artifacts` and
///   matches their digests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorBundle {
    /// Manifest describing the artifacts.
    pub manifest: BundleManifest,
    /// Artifact payloads included in the bundle.
    pub artifacts: Vec<BundleArtifact>,
}

/// Artifact payload with content bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    /// File name under the output directory.
    pub path: String,
    /// MIME content type for the artifact.
    pub content_type: String,
    /// Number of vectors in the file.
    pub test_count: usize,
    /// Serialized artifact payload bytes.
    pub bytes: Vec<u8>,
}
