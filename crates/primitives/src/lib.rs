//! Transaction types, consensus serialization and address encoding.

pub mod address;
pub mod encoding;
pub mod hash;
pub mod outpoint;
pub mod transaction;

pub use address::{
    address_to_script_pubkey, p2pkh_script, pubkey_hash_to_address, script_pubkey_to_address,
    secret_key_to_wif, wif_to_secret_key, AddressError,
};
pub use hash::{hash160, sha256, sha256d, txid_from_hex, txid_to_hex, HexError};
pub use outpoint::OutPoint;
pub use transaction::{
    transaction_from_hex, txid_from_raw_hex, Transaction, TransactionDecodeError, TxIn, TxOut,
};
