//! Standard script classification and P2PKH unlocking scripts.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScriptType {
    P2Pk,
    P2Pkh,
    P2Sh,
    NullData,
    Unknown,
}

const OP_RETURN: u8 = 0x6a;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_PUSHDATA1: u8 = 0x4c;

pub fn classify_script_pubkey(script: &[u8]) -> ScriptType {
    if is_p2pkh(script) {
        ScriptType::P2Pkh
    } else if is_p2sh(script) {
        ScriptType::P2Sh
    } else if is_p2pk(script) {
        ScriptType::P2Pk
    } else if script.first() == Some(&OP_RETURN) {
        ScriptType::NullData
    } else {
        ScriptType::Unknown
    }
}

/// `<sig> <pubkey>` as minimal pushes.
pub fn p2pkh_script_sig(signature: &[u8], pubkey: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(signature.len() + pubkey.len() + 4);
    push_data(&mut script, signature);
    push_data(&mut script, pubkey);
    script
}

/// Splits a P2PKH scriptSig back into its signature and pubkey pushes.
pub fn parse_p2pkh_script_sig(script: &[u8]) -> Option<(&[u8], &[u8])> {
    let (signature, rest) = read_push(script)?;
    let (pubkey, rest) = read_push(rest)?;
    rest.is_empty().then_some((signature, pubkey))
}

fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    if data.len() < OP_PUSHDATA1 as usize {
        script.push(data.len() as u8);
    } else {
        script.push(OP_PUSHDATA1);
        script.push(data.len() as u8);
    }
    script.extend_from_slice(data);
}

fn read_push(script: &[u8]) -> Option<(&[u8], &[u8])> {
    let (&opcode, rest) = script.split_first()?;
    let (len, rest) = match opcode {
        1..=0x4b => (opcode as usize, rest),
        OP_PUSHDATA1 => {
            let (&len, rest) = rest.split_first()?;
            (len as usize, rest)
        }
        _ => return None,
    };
    (rest.len() >= len).then(|| rest.split_at(len))
}

pub fn p2pkh_pubkey_hash(script: &[u8]) -> Option<[u8; 20]> {
    if !is_p2pkh(script) {
        return None;
    }
    script[3..23].try_into().ok()
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

fn is_p2pk(script: &[u8]) -> bool {
    let key_len = match script.first().copied() {
        Some(len @ 33) => len,
        Some(len @ 65) => len,
        _ => return false,
    };
    script.len() == key_len as usize + 2 && script[script.len() - 1] == OP_CHECKSIG
}
