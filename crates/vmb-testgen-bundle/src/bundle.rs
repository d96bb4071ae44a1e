// crates/vmb-testgen-bundle/src/bundle.rs
// ============================================================================
// Module: Bundle Builder
// Description: Emitter for the master list and per-test-set vector files.
// Purpose: Assemble deterministic vector files, write them, and detect drift.
// Dependencies: vmb-testgen-core, cap-std, cap-primitives, serde_json
// ============================================================================

//! ## Overview
//! The builder renders the master list into `{prefix}.json` and every
//! partition into `{prefix}_{set}.json`, then records each file's digest in
//! `index.json`. Output is pretty-printed JSON with canonical key ordering and
//! a trailing newline, so identical inputs always produce identical bytes.
//!
//! Writes go through a capability handle on the output directory. No path
//! component is followed through a symlink, and every file is replaced by an
//! atomic rename of a temporary sibling. Files listed by a previous manifest
//! that the new bundle no longer contains are removed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use cap_primitives::fs::FollowSymlinks;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use cap_std::fs::OpenOptions;
use serde::Serialize;
use vmb_testgen_core::GenerationEvent;
use vmb_testgen_core::GenerationEventKind;
use vmb_testgen_core::GenerationLogSink;
use vmb_testgen_core::NoopLogSink;
use vmb_testgen_core::VmbTest;
use vmb_testgen_core::hashing::DEFAULT_HASH_ALGORITHM;
use vmb_testgen_core::hashing::HashAlgorithm;
use vmb_testgen_core::hashing::canonical_json_bytes;
use vmb_testgen_core::hashing::hash_bytes;
use vmb_testgen_core::partition_master_list;

use crate::BundleError;
use crate::types::BundleArtifact;
use crate::types::BundleManifest;
use crate::types::ManifestArtifact;
use crate::types::VectorBundle;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the bundle manifest.
pub const MANIFEST_FILE_NAME: &str = "index.json";

/// Content type of every emitted file.
const JSON_CONTENT_TYPE: &str = "application/json";

/// Upper bound on a previous manifest read while pruning stale files.
const MAX_PREVIOUS_MANIFEST_BYTES: u64 = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Bundle Builder
// ============================================================================

/// Builder for VMB vector files.
///
/// # Invariants
/// - The output directory is treated as a trusted root; every artifact is a plain file name
///   directly inside it.
/// - Artifacts are ordered by file name, and the manifest lists them in that order.
#[derive(Clone)]
pub struct BundleBuilder {
    /// File name prefix shared by every vector file.
    file_prefix: String,
    /// Generator version recorded in the manifest.
    generator_version: String,
    /// Hash algorithm used for artifact digests.
    hash_algorithm: HashAlgorithm,
    /// Sink receiving write and verification events.
    log_sink: Arc<dyn GenerationLogSink>,
}

impl BundleBuilder {
    /// Creates a builder for files named after `file_prefix`.
    #[must_use]
    pub fn new(file_prefix: impl Into<String>) -> Self {
        Self {
            file_prefix: file_prefix.into(),
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            log_sink: Arc::new(NoopLogSink),
        }
    }

    /// Routes write and verification events to `log_sink`.
    #[must_use]
    pub fn with_log_sink(mut self, log_sink: Arc<dyn GenerationLogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    /// Returns the file name of the master list.
    #[must_use]
    pub fn master_file_name(&self) -> String {
        format!("{}.json", self.file_prefix)
    }

    /// Builds the vector bundle without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] when serialization fails or two artifacts share a file name.
    pub fn build(&self, master: &[VmbTest]) -> Result<VectorBundle, BundleError> {
        let partitions = partition_master_list(master);
        let mut artifacts = Vec::with_capacity(partitions.len() + 1);
        artifacts.push(json_artifact(&self.master_file_name(), master.len(), master)?);
        for (set, tests) in &partitions {
            let path = format!("{}_{set}.json", self.file_prefix);
            artifacts.push(json_artifact(&path, tests.len(), tests)?);
        }
        artifacts.sort_by(|lhs, rhs| lhs.path.cmp(&rhs.path));
        ensure_unique_paths(&artifacts)?;
        for artifact in &artifacts {
            validate_file_name(&artifact.path)?;
        }

        let manifest = BundleManifest {
            generator_version: self.generator_version.clone(),
            hash_algorithm: self.hash_algorithm,
            test_count: master.len(),
            test_sets: partitions.keys().map(ToString::to_string).collect(),
            artifacts: artifacts
                .iter()
                .map(|artifact| ManifestArtifact {
                    path: artifact.path.clone(),
                    content_type: artifact.content_type.clone(),
                    test_count: artifact.test_count,
                    digest: hash_bytes(self.hash_algorithm, &artifact.bytes),
                })
                .collect(),
        };
        Ok(VectorBundle {
            manifest,
            artifacts,
        })
    }

    /// Writes the bundle for `master` into `output_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError`] when generation fails or the directory is unsafe or unwritable.
    pub fn write_to(
        &self,
        master: &[VmbTest],
        output_dir: &Path,
    ) -> Result<BundleManifest, BundleError> {
        let bundle = self.build(master)?;
        let output = open_output_dir(output_dir, true)?;
        let stale = stale_artifacts(&output, &bundle)?;
        for artifact in &bundle.artifacts {
            write_file_atomic(&output, &artifact.path, &artifact.bytes)?;
            self.record_written(&artifact.path, &artifact.bytes);
        }
        let manifest_bytes = serialize_json_pretty(&bundle.manifest)?;
        write_file_atomic(&output, MANIFEST_FILE_NAME, &manifest_bytes)?;
        self.record_written(MANIFEST_FILE_NAME, &manifest_bytes);
        for path in stale {
            match output.remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(BundleError::Io(format!("{path}: {err}"))),
            }
        }
        Ok(bundle.manifest)
    }

    /// Verifies that `output_dir` holds exactly the bundle generated for `master`.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Generation`] on drift: a missing, modified, or unexpected file.
    pub fn verify_output(&self, master: &[VmbTest], output_dir: &Path) -> Result<(), BundleError> {
        let bundle = self.build(master)?;
        let output = open_output_dir(output_dir, false)?;
        let result = verify_bundle(&output, &bundle);
        self.log_sink.record(&GenerationEvent::new(GenerationEventKind::OutputVerified {
            directory: output_dir.display().to_string(),
            artifacts: bundle.artifacts.len() + 1,
            up_to_date: result.is_ok(),
        }));
        result
    }

    /// Records an artifact write.
    fn record_written(&self, path: &str, bytes: &[u8]) {
        self.log_sink.record(&GenerationEvent::new(GenerationEventKind::ArtifactWritten {
            path: path.to_string(),
            bytes: bytes.len(),
            digest: hash_bytes(self.hash_algorithm, bytes),
        }));
    }
}

// ============================================================================
// SECTION: Artifact Helpers
// ============================================================================

/// Builds a JSON artifact with deterministic, pretty-printed serialization.
fn json_artifact<T: Serialize + ?Sized>(
    path: &str,
    test_count: usize,
    value: &T,
) -> Result<BundleArtifact, BundleError> {
    Ok(BundleArtifact {
        path: path.to_string(),
        content_type: JSON_CONTENT_TYPE.to_string(),
        test_count,
        bytes: serialize_json_pretty(value)?,
    })
}

/// Serializes a value into pretty JSON bytes with canonical key ordering.
fn serialize_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, BundleError> {
    let canonical =
        canonical_json_bytes(value).map_err(|err| BundleError::Serialization(err.to_string()))?;
    let canonical_value: serde_json::Value = serde_json::from_slice(&canonical)
        .map_err(|err| BundleError::Serialization(err.to_string()))?;
    let mut bytes = serde_json::to_vec_pretty(&canonical_value)
        .map_err(|err| BundleError::Serialization(err.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Ensures artifact paths are unique and never shadow the manifest.
fn ensure_unique_paths(artifacts: &[BundleArtifact]) -> Result<(), BundleError> {
    let mut seen = BTreeSet::new();
    seen.insert(MANIFEST_FILE_NAME);
    for artifact in artifacts {
        if !seen.insert(artifact.path.as_str()) {
            return Err(BundleError::Generation(format!(
                "duplicate artifact path: {}",
                artifact.path
            )));
        }
    }
    Ok(())
}

/// Validates that an artifact path is a single visible file name.
fn validate_file_name(path: &str) -> Result<(), BundleError> {
    if path.trim().is_empty() {
        return Err(BundleError::Generation(String::from("artifact path is empty")));
    }
    let mut components = Path::new(path).components();
    let valid = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !path.starts_with('.');
    if !valid {
        return Err(BundleError::Generation(format!("artifact path must be a file name: {path}")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Output Directory
// ============================================================================

/// Opens the output directory as a capability handle.
///
/// # Errors
///
/// Returns [`BundleError`] when the path is invalid, unsafe, or inaccessible.
fn open_output_dir(output_dir: &Path, create_missing: bool) -> Result<Dir, BundleError> {
    if output_dir.as_os_str().is_empty() {
        return Err(BundleError::OutputPath(output_dir.to_path_buf()));
    }
    let normalized = normalize_output_dir(output_dir)?;
    let (anchor, components) = split_anchor_and_components(&normalized)?;
    if components.is_empty() {
        return Err(BundleError::OutputPath(normalized));
    }
    let mut current = Dir::open_ambient_dir(&anchor, ambient_authority())
        .map_err(|err| BundleError::Io(err.to_string()))?;
    for component in components {
        current = open_or_create_child_dir_nofollow(
            &current,
            Path::new(component.as_os_str()),
            create_missing,
        )
        .map_err(|err| map_open_error(&err, output_dir))?;
    }
    Ok(current)
}

/// Normalizes an output directory into an absolute path.
fn normalize_output_dir(output_dir: &Path) -> Result<PathBuf, BundleError> {
    if output_dir.is_absolute() {
        return Ok(output_dir.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(output_dir))
        .map_err(|err| BundleError::Io(err.to_string()))
}

/// Splits an absolute path into an anchor root and normal child components.
///
/// # Errors
///
/// Returns [`BundleError::OutputPath`] when the path contains parent traversal components.
fn split_anchor_and_components(path: &Path) -> Result<(PathBuf, Vec<OsString>), BundleError> {
    let mut anchor = PathBuf::new();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => anchor.push(component.as_os_str()),
            Component::CurDir => {}
            Component::Normal(value) => components.push(value.to_os_string()),
            Component::ParentDir => return Err(BundleError::OutputPath(path.to_path_buf())),
        }
    }
    if anchor.as_os_str().is_empty() {
        return Err(BundleError::OutputPath(path.to_path_buf()));
    }
    Ok((anchor, components))
}

/// Opens a child directory without following symlinks.
fn open_child_dir_nofollow(parent: &Dir, child: &Path) -> std::io::Result<Dir> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let file = parent.open_with(child, &options)?;
    let metadata = file.metadata()?;
    if !metadata.is_dir() {
        return Err(std::io::Error::new(
            ErrorKind::InvalidInput,
            "path component is not a directory",
        ));
    }
    Ok(Dir::from_std_file(file.into_std()))
}

/// Opens or creates a child directory without following symlinks.
fn open_or_create_child_dir_nofollow(
    parent: &Dir,
    child: &Path,
    create_missing: bool,
) -> std::io::Result<Dir> {
    match open_child_dir_nofollow(parent, child) {
        Ok(dir) => Ok(dir),
        Err(err) if err.kind() == ErrorKind::NotFound && create_missing => {
            parent.create_dir(child)?;
            open_child_dir_nofollow(parent, child)
        }
        Err(err) => Err(err),
    }
}

/// Maps low-level open errors into bundle path errors.
fn map_open_error(err: &std::io::Error, path: &Path) -> BundleError {
    if matches!(
        err.kind(),
        ErrorKind::NotFound
            | ErrorKind::InvalidInput
            | ErrorKind::PermissionDenied
            | ErrorKind::NotADirectory
            | ErrorKind::Unsupported
    ) {
        return BundleError::OutputPath(path.to_path_buf());
    }
    // ELOOP: a symlink was refused.
    #[cfg(unix)]
    if err.raw_os_error() == Some(40) {
        return BundleError::OutputPath(path.to_path_buf());
    }
    #[cfg(windows)]
    if matches!(err.raw_os_error(), Some(681) | Some(1920)) {
        return BundleError::OutputPath(path.to_path_buf());
    }
    BundleError::Io(err.to_string())
}

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Writes file bytes using a temporary sibling and atomic rename.
fn write_file_atomic(parent: &Dir, file_name: &str, bytes: &[u8]) -> Result<(), BundleError> {
    for attempt in 0 .. 64_u32 {
        let temp_name = format!(".tmp-{file_name}.{}.{attempt}", std::process::id());
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        options._cap_fs_ext_follow(FollowSymlinks::No);
        match parent.open_with(&temp_name, &options) {
            Ok(mut temp_file) => {
                let written = temp_file
                    .write_all(bytes)
                    .and_then(|()| temp_file.sync_all())
                    .and_then(|()| parent.rename(&temp_name, parent, file_name));
                if let Err(err) = written {
                    let _ = parent.remove_file(&temp_name);
                    return Err(BundleError::Io(format!("{file_name}: {err}")));
                }
                return Ok(());
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(map_open_error(&err, Path::new(file_name))),
        }
    }
    Err(BundleError::Generation("unable to allocate temporary output file".to_string()))
}

/// Lists files named by an existing manifest that the new bundle drops.
///
/// A missing or unreadable previous manifest prunes nothing.
fn stale_artifacts(output_dir: &Dir, bundle: &VectorBundle) -> Result<Vec<String>, BundleError> {
    let Ok(bytes) = read_file_nofollow(output_dir, MANIFEST_FILE_NAME, MAX_PREVIOUS_MANIFEST_BYTES)
    else {
        return Ok(Vec::new());
    };
    let Ok(previous) = serde_json::from_slice::<BundleManifest>(&bytes) else {
        return Ok(Vec::new());
    };
    let current: BTreeSet<&str> =
        bundle.artifacts.iter().map(|artifact| artifact.path.as_str()).collect();
    let mut stale = Vec::new();
    for artifact in previous.artifacts {
        if current.contains(artifact.path.as_str()) {
            continue;
        }
        validate_file_name(&artifact.path)?;
        if artifact.path != MANIFEST_FILE_NAME {
            stale.push(artifact.path);
        }
    }
    Ok(stale)
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Compares every artifact, the manifest, and the directory listing.
fn verify_bundle(output_dir: &Dir, bundle: &VectorBundle) -> Result<(), BundleError> {
    for artifact in &bundle.artifacts {
        let bytes = read_expected_bytes(output_dir, &artifact.path, artifact.bytes.len())?;
        if bytes != artifact.bytes {
            return Err(BundleError::Generation(format!("artifact mismatch: {}", artifact.path)));
        }
    }
    let manifest_bytes = serialize_json_pretty(&bundle.manifest)?;
    let actual_manifest = read_expected_bytes(output_dir, MANIFEST_FILE_NAME, manifest_bytes.len())?;
    if actual_manifest != manifest_bytes {
        return Err(BundleError::Generation(format!("manifest mismatch: {MANIFEST_FILE_NAME}")));
    }
    let mut expected: BTreeSet<&str> =
        bundle.artifacts.iter().map(|artifact| artifact.path.as_str()).collect();
    expected.insert(MANIFEST_FILE_NAME);
    for name in collect_output_entries(output_dir)? {
        if !expected.contains(name.as_str()) {
            return Err(BundleError::Generation(format!("unexpected artifact: {name}")));
        }
    }
    Ok(())
}

/// Reads a file and verifies its length matches the expected size.
fn read_expected_bytes(
    output_dir: &Dir,
    file_name: &str,
    expected_len: usize,
) -> Result<Vec<u8>, BundleError> {
    let expected_len = u64::try_from(expected_len).map_err(|_| {
        BundleError::Generation(String::from("expected length exceeds addressable size"))
    })?;
    let bytes = read_file_nofollow(output_dir, file_name, expected_len).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            BundleError::Generation(format!("missing artifact: {file_name}"))
        } else {
            map_open_error(&err, Path::new(file_name))
        }
    })?;
    if u64::try_from(bytes.len()).ok() != Some(expected_len) {
        return Err(BundleError::Generation(format!("artifact size mismatch: {file_name}")));
    }
    Ok(bytes)
}

/// Reads at most `limit + 1` bytes of a regular file without following symlinks.
fn read_file_nofollow(output_dir: &Dir, file_name: &str, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut options = OpenOptions::new();
    options.read(true);
    options._cap_fs_ext_follow(FollowSymlinks::No);
    let file = output_dir.open_with(file_name, &options)?;
    if !file.metadata()?.is_file() {
        return Err(std::io::Error::new(ErrorKind::InvalidInput, "artifact is not a regular file"));
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Collects the names of every entry directly under the output directory.
///
/// Subdirectories are reported by name so that they count as drift.
fn collect_output_entries(output_dir: &Dir) -> Result<BTreeSet<String>, BundleError> {
    let mut names = BTreeSet::new();
    let entries = output_dir.entries().map_err(|err| BundleError::Io(err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| BundleError::Io(err.to_string()))?;
        let file_name = PathBuf::from(entry.file_name());
        let file_type = entry.file_type().map_err(|err| BundleError::Io(err.to_string()))?;
        if file_type.is_symlink() {
            return Err(BundleError::OutputPath(file_name));
        }
        let name = file_name.to_str().ok_or_else(|| BundleError::OutputPath(file_name.clone()))?;
        if file_type.is_dir() {
            names.insert(format!("{name}/"));
        } else {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
