use litewallet_primitives::{OutPoint, Transaction, TxIn, TxOut};
use litewallet_script::sighash::{
    signature_hash, SighashError, SighashType, SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_NONE,
    SIGHASH_SINGLE,
};

fn two_in_one_out() -> Transaction {
    let input = |byte: u8| TxIn {
        prevout: OutPoint {
            hash: [byte; 32],
            index: 0,
        },
        script_sig: Vec::new(),
        sequence: u32::MAX,
    };
    Transaction {
        version: 1,
        vin: vec![input(1), input(2)],
        vout: vec![TxOut {
            value: 5_000,
            script_pubkey: vec![0x51],
        }],
        lock_time: 0,
    }
}

#[test]
fn sighash_type_flags() {
    let combined = SighashType(SIGHASH_ALL | SIGHASH_ANYONECANPAY);
    assert_eq!(combined.base_type(), SIGHASH_ALL);
    assert!(combined.has_anyone_can_pay());
    assert_eq!(combined.as_byte(), 0x81);

    let none = SighashType(SIGHASH_NONE);
    assert_eq!(none.base_type(), SIGHASH_NONE);
    assert!(!none.has_anyone_can_pay());

    let single = SighashType(SIGHASH_SINGLE | SIGHASH_ANYONECANPAY);
    assert_eq!(single.base_type(), SIGHASH_SINGLE);
    assert!(single.has_anyone_can_pay());
}

#[test]
fn digest_commits_to_input_position_and_script_code() {
    let tx = two_in_one_out();
    let first = signature_hash(&tx, 0, &[0xac], SighashType::ALL).expect("sighash");
    let second = signature_hash(&tx, 1, &[0xac], SighashType::ALL).expect("sighash");
    let other_code = signature_hash(&tx, 0, &[0x51], SighashType::ALL).expect("sighash");
    assert_ne!(first, second);
    assert_ne!(first, other_code);
}

#[test]
fn digest_ignores_existing_script_sigs() {
    let tx = two_in_one_out();
    let mut signed = tx.clone();
    signed.vin[1].script_sig = vec![0x01, 0x02];
    assert_eq!(
        signature_hash(&tx, 0, &[0xac], SighashType::ALL).expect("sighash"),
        signature_hash(&signed, 0, &[0xac], SighashType::ALL).expect("sighash"),
    );
}

#[test]
fn digest_commits_to_outputs_under_sighash_all() {
    let tx = two_in_one_out();
    let mut changed = tx.clone();
    changed.vout[0].value += 1;
    assert_ne!(
        signature_hash(&tx, 0, &[0xac], SighashType::ALL).expect("sighash"),
        signature_hash(&changed, 0, &[0xac], SighashType::ALL).expect("sighash"),
    );
    // SIGHASH_NONE leaves outputs unsigned.
    let none = SighashType(SIGHASH_NONE);
    assert_eq!(
        signature_hash(&tx, 0, &[0xac], none).expect("sighash"),
        signature_hash(&changed, 0, &[0xac], none).expect("sighash"),
    );
}

#[test]
fn rejects_out_of_range_indices() {
    let tx = two_in_one_out();
    assert_eq!(
        signature_hash(&tx, 2, &[], SighashType::ALL),
        Err(SighashError::InputIndexOutOfRange)
    );
    assert_eq!(
        signature_hash(&tx, 1, &[], SighashType(SIGHASH_SINGLE)),
        Err(SighashError::MissingOutput)
    );
}
