// crates/vmb-testgen-core/src/hashing.rs
// ============================================================================
// Module: Hashing
// Description: Short test identifiers and content digests.
// Purpose: Derive stable vector ids and hash generated artifacts.
// Dependencies: bech32, bitcoin, serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! A vector's short id is the SHA-256 of its encoded transaction followed by
//! its encoded source outputs, regrouped into 5-bit groups and rendered with
//! the bech32 alphabet. Only the first [`SHORT_ID_LENGTH`] characters are
//! kept, so ids change whenever the transaction or its inputs change.
//!
//! Generated artifacts are hashed over raw bytes; structured values are hashed
//! over RFC 8785 canonical JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use bech32::primitives::iter::ByteIterExt;
use bitcoin::hex::DisplayHex;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Short Ids
// ============================================================================

/// Number of bech32 characters in a short id.
pub const SHORT_ID_LENGTH: usize = 5;

/// Derives the short id of an encoded transaction and its encoded source
/// outputs.
#[must_use]
pub fn short_id(encoded_transaction: &[u8], encoded_source_outputs: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded_transaction);
    hasher.update(encoded_source_outputs);
    let digest = hasher.finalize();
    digest.iter().copied().bytes_to_fes().take(SHORT_ID_LENGTH).map(|fe| fe.to_char()).collect()
}

// ============================================================================
// SECTION: Content Digests
// ============================================================================

/// Supported hash algorithms for generated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
}

/// Default hash algorithm for artifact manifests.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Content hash with its algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex digest.
    pub value: String,
}

impl HashDigest {
    /// Creates a digest from raw digest bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: bytes.to_lower_hex_string(),
        }
    }
}

/// Errors raised when hashing structured values.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

/// Hashes raw bytes using the provided algorithm.
#[must_use]
pub fn hash_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> HashDigest {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let digest = Sha256::digest(bytes);
            HashDigest::new(HashAlgorithm::Sha256, &digest)
        }
    }
}

/// Returns RFC 8785 canonical JSON bytes for a serializable value.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
