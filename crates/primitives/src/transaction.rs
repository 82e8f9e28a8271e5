//! Legacy (pre-segwit) transaction types and serialization.

use litewallet_consensus::{Amount, Hash256};

use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::{sha256d, txid_to_hex};
use crate::outpoint::OutPoint;

#[derive(Clone, Debug, PartialEq)]
pub struct TxIn {
    pub prevout: OutPoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

impl Encodable for TxIn {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        self.prevout.consensus_encode(encoder);
        encoder.write_var_bytes(&self.script_sig);
        encoder.write_u32_le(self.sequence);
    }
}

impl Decodable for TxIn {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let prevout = OutPoint::consensus_decode(decoder)?;
        let script_sig = decoder.read_var_bytes()?;
        let sequence = decoder.read_u32_le()?;
        Ok(Self {
            prevout,
            script_sig,
            sequence,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TxOut {
    pub value: Amount,
    pub script_pubkey: Vec<u8>,
}

impl Encodable for TxOut {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_i64_le(self.value);
        encoder.write_var_bytes(&self.script_pubkey);
    }
}

impl Decodable for TxOut {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let value = decoder.read_i64_le()?;
        let script_pubkey = decoder.read_var_bytes()?;
        Ok(Self {
            value,
            script_pubkey,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    pub version: i32,
    pub vin: Vec<TxIn>,
    pub vout: Vec<TxOut>,
    pub lock_time: u32,
}

impl Transaction {
    pub fn consensus_encode(&self) -> Vec<u8> {
        crate::encoding::encode(self)
    }

    pub fn consensus_decode(bytes: &[u8]) -> Result<Self, TransactionDecodeError> {
        Ok(crate::encoding::decode(bytes)?)
    }

    /// Double SHA-256 of the serialized bytes, internal byte order.
    pub fn txid(&self) -> Hash256 {
        sha256d(&self.consensus_encode())
    }

    pub fn txid_hex(&self) -> String {
        txid_to_hex(&self.txid())
    }

    pub fn total_output_value(&self) -> Option<Amount> {
        self.vout
            .iter()
            .try_fold(0 as Amount, |sum, out| sum.checked_add(out.value))
    }
}

impl Encodable for Transaction {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_i32_le(self.version);
        encoder.write_varint(self.vin.len() as u64);
        for input in &self.vin {
            input.consensus_encode(encoder);
        }
        encoder.write_varint(self.vout.len() as u64);
        for output in &self.vout {
            output.consensus_encode(encoder);
        }
        encoder.write_u32_le(self.lock_time);
    }
}

impl Decodable for Transaction {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let version = decoder.read_i32_le()?;
        let input_count = decoder.read_varint()?;
        if input_count == 0 && decoder.peek_u8() == Some(0x01) {
            return Err(DecodeError::InvalidData(
                "segwit serialization is not supported",
            ));
        }
        let vin = read_vec(decoder, input_count)?;
        let output_count = decoder.read_varint()?;
        let vout = read_vec(decoder, output_count)?;
        let lock_time = decoder.read_u32_le()?;
        Ok(Self {
            version,
            vin,
            vout,
            lock_time,
        })
    }
}

fn read_vec<T: Decodable>(decoder: &mut Decoder, count: u64) -> Result<Vec<T>, DecodeError> {
    let count = usize::try_from(count).map_err(|_| DecodeError::SizeTooLarge)?;
    let mut items = Vec::with_capacity(count.min(decoder.remaining()));
    for _ in 0..count {
        items.push(T::consensus_decode(decoder)?);
    }
    Ok(items)
}

#[derive(Debug)]
pub enum TransactionDecodeError {
    Hex(hex::FromHexError),
    Decode(DecodeError),
}

impl From<DecodeError> for TransactionDecodeError {
    fn from(error: DecodeError) -> Self {
        TransactionDecodeError::Decode(error)
    }
}

impl From<hex::FromHexError> for TransactionDecodeError {
    fn from(error: hex::FromHexError) -> Self {
        TransactionDecodeError::Hex(error)
    }
}

impl std::fmt::Display for TransactionDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionDecodeError::Hex(error) => write!(f, "invalid transaction hex: {error}"),
            TransactionDecodeError::Decode(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for TransactionDecodeError {}

/// Decodes a hex-encoded raw transaction as returned by indexers and `build`.
pub fn transaction_from_hex(raw: &str) -> Result<Transaction, TransactionDecodeError> {
    let bytes = hex::decode(raw.trim())?;
    Transaction::consensus_decode(&bytes)
}

/// Computes the network txid of a hex-encoded transaction without decoding it.
pub fn txid_from_raw_hex(raw: &str) -> Result<String, hex::FromHexError> {
    let bytes = hex::decode(raw.trim())?;
    Ok(txid_to_hex(&sha256d(&bytes)))
}
