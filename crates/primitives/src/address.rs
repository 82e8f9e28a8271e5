//! Base58Check addresses, standard output scripts and WIF keys.

use litewallet_consensus::ChainParams;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    InvalidLength,
    InvalidCharacter,
    InvalidChecksum,
    UnknownPrefix,
}

impl std::fmt::Display for AddressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressError::InvalidLength => write!(f, "invalid payload length"),
            AddressError::InvalidCharacter => write!(f, "invalid base58 character"),
            AddressError::InvalidChecksum => write!(f, "invalid checksum"),
            AddressError::UnknownPrefix => write!(f, "version byte does not match network"),
        }
    }
}

impl std::error::Error for AddressError {}

impl From<bs58::decode::Error> for AddressError {
    fn from(err: bs58::decode::Error) -> Self {
        match err {
            bs58::decode::Error::InvalidChecksum { .. } => AddressError::InvalidChecksum,
            bs58::decode::Error::InvalidCharacter { .. }
            | bs58::decode::Error::NonAsciiCharacter { .. } => AddressError::InvalidCharacter,
            _ => AddressError::InvalidLength,
        }
    }
}

pub fn address_to_script_pubkey(address: &str, params: &ChainParams) -> Result<Vec<u8>, AddressError> {
    let payload = base58check_decode(address.trim())?;
    let (version, hash) = payload.split_first().ok_or(AddressError::InvalidLength)?;
    let hash: &[u8; 20] = hash.try_into().map_err(|_| AddressError::InvalidLength)?;

    if *version == params.pubkey_address_prefix {
        Ok(p2pkh_script(hash))
    } else if *version == params.script_address_prefix {
        Ok(p2sh_script(hash))
    } else {
        Err(AddressError::UnknownPrefix)
    }
}

pub fn script_pubkey_to_address(script: &[u8], params: &ChainParams) -> Option<String> {
    if is_p2pkh(script) {
        return Some(versioned_hash(params.pubkey_address_prefix, &script[3..23]));
    }
    if is_p2sh(script) {
        return Some(versioned_hash(params.script_address_prefix, &script[2..22]));
    }
    None
}

pub fn pubkey_hash_to_address(hash: &[u8; 20], params: &ChainParams) -> String {
    versioned_hash(params.pubkey_address_prefix, hash)
}

pub fn secret_key_to_wif(secret: &[u8; 32], params: &ChainParams, compressed: bool) -> String {
    let mut payload = Vec::with_capacity(1 + secret.len() + usize::from(compressed));
    payload.push(params.wif_prefix);
    payload.extend_from_slice(secret);
    if compressed {
        payload.push(0x01);
    }
    base58check_encode(&payload)
}

pub fn wif_to_secret_key(wif: &str, params: &ChainParams) -> Result<([u8; 32], bool), AddressError> {
    let payload = base58check_decode(wif.trim())?;
    let (prefix, body) = payload.split_first().ok_or(AddressError::InvalidLength)?;
    if *prefix != params.wif_prefix {
        return Err(AddressError::UnknownPrefix);
    }

    let compressed = match body.len() {
        32 => false,
        33 if body[32] == 0x01 => true,
        _ => return Err(AddressError::InvalidLength),
    };
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&body[..32]);
    Ok((secret, compressed))
}

pub fn p2pkh_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(OP_DUP);
    script.push(OP_HASH160);
    script.push(0x14);
    script.extend_from_slice(hash);
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

fn p2sh_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(23);
    script.push(OP_HASH160);
    script.push(0x14);
    script.extend_from_slice(hash);
    script.push(OP_EQUAL);
    script
}

fn is_p2pkh(script: &[u8]) -> bool {
    script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == 0x14
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
}

fn is_p2sh(script: &[u8]) -> bool {
    script.len() == 23 && script[0] == OP_HASH160 && script[1] == 0x14 && script[22] == OP_EQUAL
}

fn versioned_hash(version: u8, hash: &[u8]) -> String {
    let mut payload = Vec::with_capacity(1 + hash.len());
    payload.push(version);
    payload.extend_from_slice(hash);
    base58check_encode(&payload)
}

fn base58check_decode(input: &str) -> Result<Vec<u8>, AddressError> {
    if input.is_empty() {
        return Err(AddressError::InvalidLength);
    }
    Ok(bs58::decode(input).with_check(None).into_vec()?)
}

fn base58check_encode(payload: &[u8]) -> String {
    bs58::encode(payload).with_check().into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use litewallet_consensus::{chain_params, Currency, Network};

    #[test]
    fn bitcoin_genesis_address() {
        let params = chain_params(Currency::Bitcoin, Network::Mainnet);
        let hash: [u8; 20] = hex::decode("62e907b15cbf27d5425399ebf6f0fb50ebb88f18")
            .expect("hex")
            .try_into()
            .expect("20 bytes");
        let address = pubkey_hash_to_address(&hash, &params);
        assert_eq!(address, "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
        let script = address_to_script_pubkey(&address, &params).expect("script");
        assert_eq!(script, p2pkh_script(&hash));
    }

    #[test]
    fn rejects_address_of_other_currency() {
        let btc = chain_params(Currency::Bitcoin, Network::Mainnet);
        let doge = chain_params(Currency::Doge, Network::Mainnet);
        let err = address_to_script_pubkey("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", &doge).unwrap_err();
        assert_eq!(err, AddressError::UnknownPrefix);
        assert!(address_to_script_pubkey("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb", &btc).is_err());
    }
}
