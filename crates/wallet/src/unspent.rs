//! Spendable outputs of the wallet address, as last reported by the indexer.

use litewallet_consensus::Amount;

use crate::error::WalletError;
use crate::indexer::UnspentRecord;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnspentOutput {
    pub txid: String,
    /// Position within the funding transaction, when the indexer reports it.
    pub output_index: Option<u32>,
    pub amount: Amount,
    pub script_pubkey: Option<Vec<u8>>,
}

impl UnspentOutput {
    /// Rejects zero and negative amounts, which could never fund a spend.
    pub fn new(txid: impl Into<String>, amount: Amount) -> Result<Self, WalletError> {
        let txid = txid.into();
        check_amount(&txid, amount)?;
        Ok(Self {
            txid,
            output_index: None,
            amount,
            script_pubkey: None,
        })
    }

    pub fn with_output_index(mut self, index: u32) -> Self {
        self.output_index = Some(index);
        self
    }

    pub fn with_script_pubkey(mut self, script: Vec<u8>) -> Self {
        self.script_pubkey = Some(script);
        self
    }

    pub fn from_record(record: &UnspentRecord) -> Result<Self, WalletError> {
        // `satoshis` is exact; `amount` is the major-unit fallback.
        let amount = record.satoshis.or(record.amount).ok_or_else(|| {
            WalletError::InvalidUnspent(format!("{} has no amount", record.txid))
        })?;
        check_amount(&record.txid, amount)?;
        let script_pubkey = record
            .script_pubkey
            .as_deref()
            .map(hex::decode)
            .transpose()
            .map_err(|err| {
                WalletError::InvalidUnspent(format!("{} scriptPubKey: {err}", record.txid))
            })?;
        Ok(Self {
            txid: record.txid.clone(),
            output_index: record.vout,
            amount,
            script_pubkey,
        })
    }
}

pub(crate) fn check_amount(txid: &str, amount: Amount) -> Result<(), WalletError> {
    if amount <= 0 {
        return Err(WalletError::InvalidUnspent(format!(
            "{txid} has non-positive amount {amount}"
        )));
    }
    Ok(())
}

/// Replaced wholesale on refresh. Marked stale once a spend is broadcast.
#[derive(Clone, Debug, Default)]
pub struct UnspentOutputSet {
    outputs: Vec<UnspentOutput>,
    stale: bool,
}

impl UnspentOutputSet {
    pub fn new(outputs: Vec<UnspentOutput>) -> Self {
        Self {
            outputs,
            stale: false,
        }
    }

    pub fn from_records(records: &[UnspentRecord]) -> Result<Self, WalletError> {
        let outputs = records
            .iter()
            .map(UnspentOutput::from_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(outputs))
    }

    pub fn replace(&mut self, other: UnspentOutputSet) {
        *self = other;
    }

    pub fn outputs(&self) -> &[UnspentOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn total(&self) -> Amount {
        total_amount(&self.outputs)
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

pub(crate) fn total_amount(outputs: &[UnspentOutput]) -> Amount {
    outputs
        .iter()
        .fold(0 as Amount, |sum, output| sum.saturating_add(output.amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> UnspentRecord {
        serde_json::from_str(json).expect("record")
    }

    #[test]
    fn prefers_exact_satoshis() {
        let output = UnspentOutput::from_record(&record(
            r#"{"txid": "aa", "vout": 2, "amount": 0.1, "satoshis": 10000001}"#,
        ))
        .expect("unspent");
        assert_eq!(output.amount, 10_000_001);
        assert_eq!(output.output_index, Some(2));
        assert!(output.script_pubkey.is_none());
    }

    #[test]
    fn falls_back_to_major_amount() {
        let output = UnspentOutput::from_record(&record(
            r#"{"txid": "aa", "amount": "1.25", "scriptPubKey": "76a914"}"#,
        ))
        .expect("unspent");
        assert_eq!(output.amount, 125_000_000);
        assert_eq!(output.script_pubkey, Some(vec![0x76, 0xa9, 0x14]));
    }

    #[test]
    fn rejects_unusable_records() {
        let err = UnspentOutput::from_record(&record(r#"{"txid": "aa"}"#)).unwrap_err();
        assert!(matches!(err, WalletError::InvalidUnspent(_)));
        let err = UnspentOutput::from_record(&record(
            r#"{"txid": "aa", "satoshis": 5, "scriptPubKey": "zz"}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, WalletError::InvalidUnspent(_)));
    }

    #[test]
    fn constructor_rejects_non_positive_amounts() {
        assert!(matches!(
            UnspentOutput::new("a", 0),
            Err(WalletError::InvalidUnspent(_))
        ));
        assert!(matches!(
            UnspentOutput::new("a", -100),
            Err(WalletError::InvalidUnspent(_))
        ));
        assert_eq!(UnspentOutput::new("a", 1).expect("unspent").amount, 1);
    }

    #[test]
    fn set_tracks_total_and_staleness() {
        let mut set = UnspentOutputSet::new(vec![
            UnspentOutput::new("a", 100).expect("unspent"),
            UnspentOutput::new("b", 50).expect("unspent"),
        ]);
        assert_eq!(set.total(), 150);
        assert!(!set.is_stale());
        set.mark_stale();
        assert!(set.is_stale());
        set.replace(UnspentOutputSet::new(vec![UnspentOutput::new("c", 7).expect("unspent")]));
        assert!(!set.is_stale());
        assert_eq!(set.len(), 1);
    }
}
