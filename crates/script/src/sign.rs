//! ECDSA signing and verification of P2PKH inputs.

use litewallet_primitives::hash::hash160;
use litewallet_primitives::transaction::Transaction;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, SecretKey};

use crate::secp::secp256k1;
use crate::sighash::{signature_hash, SighashError, SighashType};
use crate::standard::{p2pkh_pubkey_hash, p2pkh_script_sig, parse_p2pkh_script_sig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    Sighash(SighashError),
    /// The previous output is not a P2PKH script paying to the signing key.
    ScriptMismatch { input: usize },
    MalformedScriptSig { input: usize },
    InvalidPubkey { input: usize },
    InvalidSignature { input: usize },
}

impl std::fmt::Display for SigningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningError::Sighash(err) => write!(f, "{err}"),
            SigningError::ScriptMismatch { input } => {
                write!(f, "input {input}: previous output is not spendable by this key")
            }
            SigningError::MalformedScriptSig { input } => {
                write!(f, "input {input}: malformed scriptSig")
            }
            SigningError::InvalidPubkey { input } => write!(f, "input {input}: invalid pubkey"),
            SigningError::InvalidSignature { input } => {
                write!(f, "input {input}: signature does not verify")
            }
        }
    }
}

impl std::error::Error for SigningError {}

impl From<SighashError> for SigningError {
    fn from(err: SighashError) -> Self {
        SigningError::Sighash(err)
    }
}

/// Signs input `input_index` spending `prev_script_pubkey` and installs the scriptSig.
pub fn sign_p2pkh_input(
    tx: &mut Transaction,
    input_index: usize,
    prev_script_pubkey: &[u8],
    secret: &SecretKey,
) -> Result<(), SigningError> {
    let pubkey = PublicKey::from_secret_key(secp256k1(), secret).serialize();
    if p2pkh_pubkey_hash(prev_script_pubkey) != Some(hash160(&pubkey)) {
        return Err(SigningError::ScriptMismatch { input: input_index });
    }

    let sighash_type = SighashType::ALL;
    let digest = signature_hash(tx, input_index, prev_script_pubkey, sighash_type)?;
    let signature = secp256k1().sign_ecdsa(&Message::from_digest(digest), secret);

    let der = signature.serialize_der();
    let mut sig_bytes = Vec::with_capacity(der.len() + 1);
    sig_bytes.extend_from_slice(&der);
    sig_bytes.push(sighash_type.as_byte());

    tx.vin[input_index].script_sig = p2pkh_script_sig(&sig_bytes, &pubkey);
    Ok(())
}

/// Checks the scriptSig of `input_index` against the P2PKH output it spends.
pub fn verify_p2pkh_input(
    tx: &Transaction,
    input_index: usize,
    prev_script_pubkey: &[u8],
) -> Result<(), SigningError> {
    let input = tx
        .vin
        .get(input_index)
        .ok_or(SigningError::Sighash(SighashError::InputIndexOutOfRange))?;
    let (sig_bytes, pubkey_bytes) = parse_p2pkh_script_sig(&input.script_sig)
        .ok_or(SigningError::MalformedScriptSig { input: input_index })?;
    if p2pkh_pubkey_hash(prev_script_pubkey) != Some(hash160(pubkey_bytes)) {
        return Err(SigningError::ScriptMismatch { input: input_index });
    }

    let (&hash_type, der) = sig_bytes
        .split_last()
        .ok_or(SigningError::MalformedScriptSig { input: input_index })?;
    let digest = signature_hash(
        tx,
        input_index,
        prev_script_pubkey,
        SighashType(u32::from(hash_type)),
    )?;
    let pubkey = PublicKey::from_slice(pubkey_bytes)
        .map_err(|_| SigningError::InvalidPubkey { input: input_index })?;
    let mut signature = Signature::from_der(der)
        .map_err(|_| SigningError::InvalidSignature { input: input_index })?;
    signature.normalize_s();
    secp256k1()
        .verify_ecdsa(&Message::from_digest(digest), &signature, &pubkey)
        .map_err(|_| SigningError::InvalidSignature { input: input_index })
}
