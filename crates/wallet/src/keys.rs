//! Passphrase-derived key material.
//!
//! The secret scalar is `sha256(passphrase)`; no salt or stretching is applied,
//! so passphrase strength is entirely the caller's concern.

use litewallet_consensus::ChainParams;
use litewallet_primitives::{
    hash160, p2pkh_script, pubkey_hash_to_address, secret_key_to_wif, sha256, Transaction,
};
use litewallet_script::message::{sign_message, verify_signed_message};
use litewallet_script::sign::{sign_p2pkh_input, SigningError};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use zeroize::Zeroize;

use crate::error::WalletError;

/// Signing key and address of one wallet session. Erased on drop.
pub struct KeyMaterial {
    secret: SecretKey,
    public: PublicKey,
    pubkey_hash: [u8; 20],
    address: String,
    params: ChainParams,
}

impl KeyMaterial {
    pub fn from_passphrase(passphrase: &[u8], params: ChainParams) -> Result<Self, WalletError> {
        let mut digest = sha256(passphrase);
        let secret = SecretKey::from_slice(&digest);
        digest.zeroize();
        let secret = secret
            .map_err(|_| WalletError::SigningFailure("passphrase hash is not a valid key".into()))?;

        let public = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret);
        let pubkey_hash = hash160(&public.serialize());
        let address = pubkey_hash_to_address(&pubkey_hash, &params);
        Ok(Self {
            secret,
            public,
            pubkey_hash,
            address,
            params,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    /// P2PKH script every wallet-owned output pays to.
    pub fn script_pubkey(&self) -> Vec<u8> {
        p2pkh_script(&self.pubkey_hash)
    }

    /// Compressed WIF, importable into the reference node wallets.
    pub fn export_wif(&self) -> String {
        let mut bytes = self.secret.secret_bytes();
        let wif = secret_key_to_wif(&bytes, &self.params, true);
        bytes.zeroize();
        wif
    }

    pub fn sign_message(&self, message: &[u8]) -> String {
        sign_message(&self.params, &self.secret, message)
    }

    pub fn verify_message(&self, signature: &str, message: &[u8]) -> bool {
        verify_signed_message(&self.params, &self.public, signature, message).is_ok()
    }

    pub(crate) fn sign_input(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        prev_script_pubkey: &[u8],
    ) -> Result<(), SigningError> {
        sign_p2pkh_input(tx, input_index, prev_script_pubkey, &self.secret)
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}
