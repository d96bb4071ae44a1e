// crates/vmb-testgen-bundle/src/lib.rs
// ============================================================================
// Module: VMB Test Generator Bundle Library
// Description: Emission and verification of generated vector files.
// Purpose: Turn a master list into deterministic JSON files on disk.
// Dependencies: vmb-testgen-core, cap-std, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`BundleBuilder`] serializes a master list and its test-set partitions into
//! pretty-printed JSON files, hashes each file into an `index.json` manifest,
//! and writes everything through capability handles that never follow
//! symlinks. [`BundleBuilder::verify_output`] regenerates the same bytes and
//! reports any drift in an existing output directory.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bundle;
pub mod types;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bundle::BundleBuilder;
pub use bundle::MANIFEST_FILE_NAME;
pub use types::BundleArtifact;
pub use types::BundleManifest;
pub use types::ManifestArtifact;
pub use types::VectorBundle;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while emitting or verifying vector files.
#[derive(Debug, Error)]
pub enum BundleError {
    /// Filesystem I/O failure.
    #[error("bundle io error: {0}")]
    Io(String),
    /// Serialization failure.
    #[error("bundle serialization error: {0}")]
    Serialization(String),
    /// Generation or verification failure.
    #[error("bundle generation error: {0}")]
    Generation(String),
    /// Invalid or unsafe output path.
    #[error("invalid output path: {0}")]
    OutputPath(PathBuf),
}
