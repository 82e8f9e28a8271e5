use litewallet_primitives::{hash160, p2pkh_script, OutPoint, Transaction, TxIn, TxOut};
use litewallet_script::sign::{sign_p2pkh_input, verify_p2pkh_input, SigningError};
use secp256k1::{PublicKey, Secp256k1, SecretKey};

fn key(byte: u8) -> (SecretKey, Vec<u8>) {
    let secret = SecretKey::from_slice(&[byte; 32]).expect("secret");
    let pubkey = PublicKey::from_secret_key(&Secp256k1::new(), &secret);
    let script = p2pkh_script(&hash160(&pubkey.serialize()));
    (secret, script)
}

fn spend(inputs: usize) -> Transaction {
    Transaction {
        version: 1,
        vin: (0..inputs)
            .map(|idx| TxIn {
                prevout: OutPoint {
                    hash: [idx as u8 + 1; 32],
                    index: idx as u32,
                },
                script_sig: Vec::new(),
                sequence: u32::MAX,
            })
            .collect(),
        vout: vec![TxOut {
            value: 1_000,
            script_pubkey: vec![0x51],
        }],
        lock_time: 0,
    }
}

#[test]
fn signs_and_verifies_every_input() {
    let (secret, script) = key(7);
    let mut tx = spend(2);
    for idx in 0..2 {
        sign_p2pkh_input(&mut tx, idx, &script, &secret).expect("sign");
    }
    for idx in 0..2 {
        verify_p2pkh_input(&tx, idx, &script).expect("verify");
    }
    // Signing is deterministic (RFC 6979).
    let mut again = spend(2);
    for idx in 0..2 {
        sign_p2pkh_input(&mut again, idx, &script, &secret).expect("sign");
    }
    assert_eq!(tx, again);
}

#[test]
fn tampered_output_breaks_signature() {
    let (secret, script) = key(9);
    let mut tx = spend(1);
    sign_p2pkh_input(&mut tx, 0, &script, &secret).expect("sign");
    tx.vout[0].value += 1;
    assert_eq!(
        verify_p2pkh_input(&tx, 0, &script),
        Err(SigningError::InvalidSignature { input: 0 })
    );
}

#[test]
fn refuses_foreign_output() {
    let (secret, _) = key(3);
    let (_, other_script) = key(4);
    let mut tx = spend(1);
    assert_eq!(
        sign_p2pkh_input(&mut tx, 0, &other_script, &secret),
        Err(SigningError::ScriptMismatch { input: 0 })
    );
    assert!(tx.vin[0].script_sig.is_empty());
}

#[test]
fn unsigned_input_is_malformed() {
    let (_, script) = key(5);
    let tx = spend(1);
    assert_eq!(
        verify_p2pkh_input(&tx, 0, &script),
        Err(SigningError::MalformedScriptSig { input: 0 })
    );
}
