use litewallet_primitives::encoding::DecodeError;
use litewallet_primitives::{
    transaction_from_hex, txid_from_hex, txid_from_raw_hex, txid_to_hex, OutPoint, Transaction,
    TransactionDecodeError, TxIn, TxOut,
};

const GENESIS_COINBASE_HEX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";
const GENESIS_COINBASE_TXID: &str =
    "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

#[test]
fn genesis_coinbase_txid() {
    let tx = transaction_from_hex(GENESIS_COINBASE_HEX).expect("decode genesis coinbase");
    assert_eq!(tx.version, 1);
    assert_eq!(tx.vin.len(), 1);
    assert_eq!(tx.vout.len(), 1);
    assert_eq!(tx.vout[0].value, 50 * 100_000_000);
    assert_eq!(hex::encode(tx.consensus_encode()), GENESIS_COINBASE_HEX);
    assert_eq!(tx.txid_hex(), GENESIS_COINBASE_TXID);
    assert_eq!(
        txid_from_raw_hex(GENESIS_COINBASE_HEX).expect("hex"),
        GENESIS_COINBASE_TXID
    );
}

#[test]
fn serialize_legacy_layout() {
    let tx = Transaction {
        version: 1,
        vin: vec![TxIn {
            prevout: OutPoint {
                hash: [0xab; 32],
                index: 2,
            },
            script_sig: vec![0x51],
            sequence: 0xffff_ffff,
        }],
        vout: vec![TxOut {
            value: 1_000,
            script_pubkey: vec![0x6a],
        }],
        lock_time: 0,
    };

    let mut expected = Vec::new();
    expected.extend_from_slice(&1i32.to_le_bytes());
    expected.push(1);
    expected.extend_from_slice(&[0xab; 32]);
    expected.extend_from_slice(&2u32.to_le_bytes());
    expected.extend_from_slice(&[1, 0x51]);
    expected.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
    expected.push(1);
    expected.extend_from_slice(&1_000i64.to_le_bytes());
    expected.extend_from_slice(&[1, 0x6a]);
    expected.extend_from_slice(&0u32.to_le_bytes());

    let encoded = tx.consensus_encode();
    assert_eq!(encoded, expected);
    assert_eq!(Transaction::consensus_decode(&encoded).expect("decode"), tx);
}

#[test]
fn decode_rejects_trailing_bytes_and_segwit() {
    let mut bytes = hex::decode(GENESIS_COINBASE_HEX).expect("hex");
    bytes.push(0);
    let err = Transaction::consensus_decode(&bytes).unwrap_err();
    assert!(matches!(
        err,
        TransactionDecodeError::Decode(DecodeError::TrailingBytes)
    ));

    let segwit = hex::decode("0200000000010100").expect("hex");
    let err = Transaction::consensus_decode(&segwit).unwrap_err();
    assert!(matches!(
        err,
        TransactionDecodeError::Decode(DecodeError::InvalidData(_))
    ));
}

#[test]
fn txid_hex_is_byte_reversed() {
    let txid = txid_from_hex(GENESIS_COINBASE_TXID).expect("txid");
    assert_eq!(txid[31], 0x4a);
    assert_eq!(txid[0], 0x3b);
    assert_eq!(txid_to_hex(&txid), GENESIS_COINBASE_TXID);
    assert!(txid_from_hex("abcd").is_err());
}
