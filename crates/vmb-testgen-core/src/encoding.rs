// crates/vmb-testgen-core/src/encoding.rs
// ============================================================================
// Module: Transaction Encoding
// Description: Consensus encoding of scenario transactions and source outputs.
// Purpose: Produce the exact bytes embedded in test vectors and hashed for ids.
// Dependencies: bitcoin, thiserror
// ============================================================================

//! ## Overview
//! Transactions are encoded in the legacy (pre-segwit) layout: version,
//! inputs, outputs, locktime. The layout is written field by field so a
//! transaction with no inputs never picks up a segwit marker. Outpoint hashes
//! arrive in display (big-endian) order and are written in internal order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use bitcoin::Amount;
use bitcoin::OutPoint;
use bitcoin::ScriptBuf;
use bitcoin::Sequence;
use bitcoin::TxIn;
use bitcoin::TxOut;
use bitcoin::Txid;
use bitcoin::Witness;
use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode::serialize;
use bitcoin::hex::FromHex;
use bitcoin::transaction::Version;
use thiserror::Error;

use crate::scenario::ScenarioInput;
use crate::scenario::ScenarioOutput;
use crate::scenario::ScenarioTransaction;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while encoding scenario data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// A bytecode field is not valid hex.
    #[error("invalid hex in {field}: {error}")]
    Hex {
        /// Field that failed to decode.
        field: String,
        /// Decoder message.
        error: String,
    },
    /// An outpoint transaction hash is not 32 bytes of hex.
    #[error("invalid outpoint transaction hash in input {index}: {error}")]
    OutpointHash {
        /// Input position.
        index: usize,
        /// Decoder message.
        error: String,
    },
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes a scenario transaction.
///
/// # Errors
///
/// Returns [`EncodingError`] when a hash or bytecode field is not valid hex.
pub fn encode_transaction(transaction: &ScenarioTransaction) -> Result<Vec<u8>, EncodingError> {
    let inputs = transaction
        .inputs
        .iter()
        .enumerate()
        .map(|(index, input)| to_tx_in(index, input))
        .collect::<Result<Vec<_>, _>>()?;
    let outputs = to_tx_outs(&transaction.outputs, "output")?;

    let mut bytes = serialize(&Version(i32::from_le_bytes(transaction.version.to_le_bytes())));
    bytes.extend(serialize(&inputs));
    bytes.extend(serialize(&outputs));
    bytes.extend(serialize(&LockTime::from_consensus(transaction.locktime)));
    Ok(bytes)
}

/// Encodes a list of outputs as a compact-size count followed by each output.
///
/// # Errors
///
/// Returns [`EncodingError`] when a locking bytecode field is not valid hex.
pub fn encode_transaction_outputs(outputs: &[ScenarioOutput]) -> Result<Vec<u8>, EncodingError> {
    Ok(serialize(&to_tx_outs(outputs, "source output")?))
}

/// Converts a scenario input to its consensus form.
fn to_tx_in(index: usize, input: &ScenarioInput) -> Result<TxIn, EncodingError> {
    let txid = Txid::from_str(&input.outpoint_transaction_hash).map_err(|err| {
        EncodingError::OutpointHash {
            index,
            error: err.to_string(),
        }
    })?;
    Ok(TxIn {
        previous_output: OutPoint {
            txid,
            vout: input.outpoint_index,
        },
        script_sig: decode_script(&input.unlocking_bytecode, || {
            format!("input {index} unlocking bytecode")
        })?,
        sequence: Sequence(input.sequence_number),
        witness: Witness::new(),
    })
}

/// Converts scenario outputs to their consensus form.
fn to_tx_outs(outputs: &[ScenarioOutput], label: &str) -> Result<Vec<TxOut>, EncodingError> {
    outputs
        .iter()
        .enumerate()
        .map(|(index, output)| {
            Ok(TxOut {
                value: Amount::from_sat(output.value_satoshis),
                script_pubkey: decode_script(&output.locking_bytecode, || {
                    format!("{label} {index} locking bytecode")
                })?,
            })
        })
        .collect()
}

/// Decodes hex bytecode into a script.
fn decode_script(
    hex: &str,
    field: impl FnOnce() -> String,
) -> Result<ScriptBuf, EncodingError> {
    Vec::<u8>::from_hex(hex).map(ScriptBuf::from_bytes).map_err(|err| EncodingError::Hex {
        field: field(),
        error: err.to_string(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
