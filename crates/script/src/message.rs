//! Bitcoin-style signed messages keyed by the network's message magic.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use litewallet_consensus::{ChainParams, Hash256};
use litewallet_primitives::encoding::Encoder;
use litewallet_primitives::hash::sha256d;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey};

use crate::secp::secp256k1;

#[derive(Debug)]
pub enum SignedMessageError {
    InvalidEncoding,
    InvalidSignature,
    InvalidRecoveryId,
    RecoverFailed,
    PubkeyMismatch,
}

impl std::fmt::Display for SignedMessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignedMessageError::InvalidEncoding => write!(f, "signature is not valid base64"),
            SignedMessageError::InvalidSignature => write!(f, "invalid signature"),
            SignedMessageError::InvalidRecoveryId => write!(f, "invalid recovery id"),
            SignedMessageError::RecoverFailed => write!(f, "failed to recover pubkey"),
            SignedMessageError::PubkeyMismatch => write!(f, "pubkey mismatch"),
        }
    }
}

impl std::error::Error for SignedMessageError {}

pub fn signed_message_hash(params: &ChainParams, message: &[u8]) -> Hash256 {
    let mut encoder = Encoder::new();
    encoder.write_var_str(params.message_magic);
    encoder.write_var_bytes(message);
    sha256d(&encoder.into_inner())
}

/// Produces the base64 compact signature understood by `verifymessage`.
pub fn sign_message(params: &ChainParams, secret: &SecretKey, message: &[u8]) -> String {
    let digest = signed_message_hash(params, message);
    let sig = secp256k1().sign_ecdsa_recoverable(&Message::from_digest(digest), secret);
    let (rec_id, bytes) = sig.serialize_compact();
    let mut out = [0u8; 65];
    // Header 31..=34 marks a compressed pubkey.
    out[0] = 31 + rec_id.to_i32() as u8;
    out[1..].copy_from_slice(&bytes);
    BASE64.encode(out)
}

/// Recovers the signer's serialized pubkey from a base64 compact signature.
pub fn recover_signed_message_pubkey(
    params: &ChainParams,
    signature: &str,
    message: &[u8],
) -> Result<Vec<u8>, SignedMessageError> {
    let raw = BASE64
        .decode(signature.trim())
        .map_err(|_| SignedMessageError::InvalidEncoding)?;
    let (recoverable, compressed) = decode_compact_signature(&raw)?;
    let digest = signed_message_hash(params, message);
    let pubkey = secp256k1()
        .recover_ecdsa(&Message::from_digest(digest), &recoverable)
        .map_err(|_| SignedMessageError::RecoverFailed)?;
    Ok(if compressed {
        pubkey.serialize().to_vec()
    } else {
        pubkey.serialize_uncompressed().to_vec()
    })
}

pub fn verify_signed_message(
    params: &ChainParams,
    expected_pubkey: &PublicKey,
    signature: &str,
    message: &[u8],
) -> Result<(), SignedMessageError> {
    let recovered = recover_signed_message_pubkey(params, signature, message)?;
    let matches = recovered == expected_pubkey.serialize().as_slice()
        || recovered == expected_pubkey.serialize_uncompressed().as_slice();
    if !matches {
        return Err(SignedMessageError::PubkeyMismatch);
    }
    Ok(())
}

fn decode_compact_signature(
    signature: &[u8],
) -> Result<(RecoverableSignature, bool), SignedMessageError> {
    if signature.len() != 65 {
        return Err(SignedMessageError::InvalidSignature);
    }
    let header = signature[0];
    if !(27..=34).contains(&header) {
        return Err(SignedMessageError::InvalidSignature);
    }
    let compressed = header >= 31;
    let recovery = if compressed { header - 31 } else { header - 27 };
    let rec_id =
        RecoveryId::from_i32(recovery as i32).map_err(|_| SignedMessageError::InvalidRecoveryId)?;
    let sig = RecoverableSignature::from_compact(&signature[1..65], rec_id)
        .map_err(|_| SignedMessageError::InvalidSignature)?;
    Ok((sig, compressed))
}
