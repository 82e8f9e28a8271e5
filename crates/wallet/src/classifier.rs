//! Direction-aware view of indexer transaction records.

use std::collections::BTreeSet;

use litewallet_consensus::Amount;
use serde::Serialize;

use crate::indexer::{RawHistoryPage, RawTransaction};
use crate::sync::HistoryPage;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Error,
}

impl TransactionStatus {
    /// Final statuses are never re-fetched.
    pub fn is_final(self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Error)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Incoming: the wallet is not among the senders.
    To,
    /// Outgoing: the wallet funded at least one input.
    From,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: String,
    pub hash: String,
    pub fee: Amount,
    pub status: TransactionStatus,
    /// Milliseconds since the epoch.
    pub timestamp: u64,
    pub direction: Direction,
    pub senders: BTreeSet<String>,
    pub sender_id: Option<String>,
    pub recipients: BTreeSet<String>,
    pub recipient_id: Option<String>,
    pub amount: Amount,
    pub confirmations: u64,
}

impl TransactionView {
    /// Local view of a transfer the wallet just assembled.
    pub fn outgoing(
        txid: &str,
        sender: &str,
        recipient: &str,
        amount: Amount,
        fee: Amount,
        timestamp: u64,
    ) -> Self {
        let senders = BTreeSet::from([sender.to_string()]);
        let recipients = BTreeSet::from([recipient.to_string()]);
        Self {
            id: txid.to_string(),
            hash: txid.to_string(),
            fee,
            status: TransactionStatus::Pending,
            timestamp,
            direction: Direction::From,
            sender_id: single(&senders),
            senders,
            recipient_id: single(&recipients),
            recipients,
            amount,
            confirmations: 0,
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn needs_refresh(&self) -> bool {
        !self.status.is_final()
    }
}

pub struct TransactionClassifier {
    address: String,
    default_fee: Amount,
}

impl TransactionClassifier {
    pub fn new(address: impl Into<String>, default_fee: Amount) -> Self {
        Self {
            address: address.into(),
            default_fee,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn classify(&self, raw: &RawTransaction) -> TransactionView {
        let senders: BTreeSet<String> = raw.vin.iter().filter_map(|input| input.addr.clone()).collect();
        let direction = if senders.contains(&self.address) {
            Direction::From
        } else {
            Direction::To
        };

        let mut recipients: BTreeSet<String> = raw
            .vout
            .iter()
            .flat_map(|output| output.addresses().iter().cloned())
            .collect();
        if direction == Direction::From {
            // Change back to us is not a recipient.
            recipients.remove(&self.address);
        }

        // Outgoing: what left the wallet. Incoming: what reached it.
        let amount = raw
            .vout
            .iter()
            .filter(|output| {
                let pays_us = output.addresses().iter().any(|addr| *addr == self.address);
                pays_us == (direction == Direction::To)
            })
            .fold(0 as Amount, |sum, output| sum.saturating_add(output.value));

        let status = if raw.confirmations > 0 {
            TransactionStatus::Success
        } else {
            TransactionStatus::Pending
        };

        TransactionView {
            id: raw.txid.clone(),
            hash: raw.txid.clone(),
            fee: raw.fees.filter(|fee| *fee > 0).unwrap_or(self.default_fee),
            status,
            timestamp: raw.time.saturating_mul(1000),
            direction,
            sender_id: single(&senders),
            senders,
            recipient_id: single(&recipients),
            recipients,
            amount,
            confirmations: raw.confirmations,
        }
    }

    pub fn classify_page(&self, raw: &RawHistoryPage) -> HistoryPage {
        HistoryPage {
            items: raw.items.iter().map(|tx| self.classify(tx)).collect(),
            total_items: raw.total_items,
            from: raw.from,
            to: raw.to,
        }
    }
}

fn single(set: &BTreeSet<String>) -> Option<String> {
    if set.len() == 1 {
        set.iter().next().cloned()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litewallet_consensus::COIN;

    const WALLET: &str = "DWallet";

    fn raw(json: &str) -> RawTransaction {
        serde_json::from_str(json).expect("raw transaction")
    }

    fn classifier() -> TransactionClassifier {
        TransactionClassifier::new(WALLET, COIN)
    }

    #[test]
    fn outgoing_payment_with_change() {
        let view = classifier().classify(&raw(
            r#"{
                "txid": "t1",
                "vin": [{"addr": "DWallet"}, {"addr": "DWallet"}],
                "vout": [
                    {"value": "10", "scriptPubKey": {"addresses": ["DBob"]}},
                    {"value": "89", "scriptPubKey": {"addresses": ["DWallet"]}}
                ],
                "confirmations": 0,
                "time": 1700000000
            }"#,
        ));
        assert_eq!(view.direction, Direction::From);
        assert_eq!(view.senders, BTreeSet::from([WALLET.to_string()]));
        assert_eq!(view.sender_id.as_deref(), Some(WALLET));
        assert_eq!(view.recipients, BTreeSet::from(["DBob".to_string()]));
        assert_eq!(view.recipient_id.as_deref(), Some("DBob"));
        assert_eq!(view.amount, 10 * COIN);
        assert_eq!(view.status, TransactionStatus::Pending);
        assert_eq!(view.timestamp, 1_700_000_000_000);
        assert_eq!(view.fee, COIN);
    }

    #[test]
    fn incoming_from_two_senders_has_no_sender_id() {
        let view = classifier().classify(&raw(
            r#"{
                "txid": "t2",
                "vin": [{"addr": "DAlice"}, {"addr": "DCarol"}],
                "vout": [{"value": "5.5", "scriptPubKey": {"addresses": ["DWallet"]}}],
                "confirmations": 12,
                "time": 1,
                "fees": "0.5"
            }"#,
        ));
        assert_eq!(view.direction, Direction::To);
        assert!(view.sender_id.is_none());
        assert_eq!(view.senders.len(), 2);
        assert_eq!(view.recipient_id.as_deref(), Some(WALLET));
        assert_eq!(view.amount, 550_000_000);
        assert_eq!(view.status, TransactionStatus::Success);
        assert_eq!(view.fee, COIN / 2);
    }

    #[test]
    fn incoming_counts_only_outputs_to_wallet() {
        let view = classifier().classify(&raw(
            r#"{
                "txid": "t3",
                "vin": [{"addr": "DAlice"}],
                "vout": [
                    {"value": "3", "scriptPubKey": {"addresses": ["DWallet"]}},
                    {"value": "7", "scriptPubKey": {"addresses": ["DAlice"]}}
                ],
                "confirmations": 1
            }"#,
        ));
        assert_eq!(view.amount, 3 * COIN);
        assert_eq!(view.recipients.len(), 2);
        assert!(view.recipient_id.is_none());
        assert_eq!(view.sender_id.as_deref(), Some("DAlice"));
    }

    #[test]
    fn self_transfer_has_no_recipient() {
        let view = classifier().classify(&raw(
            r#"{
                "txid": "t4",
                "vin": [{"addr": "DWallet"}],
                "vout": [{"value": "1", "scriptPubKey": {"addresses": ["DWallet"]}}],
                "confirmations": 1
            }"#,
        ));
        assert_eq!(view.direction, Direction::From);
        assert!(view.recipients.is_empty());
        assert!(view.recipient_id.is_none());
        assert_eq!(view.amount, 0);
    }

    #[test]
    fn coinbase_has_no_senders() {
        let view = classifier().classify(&raw(
            r#"{"txid": "cb", "vin": [{}], "vout": [{"value": "1", "scriptPubKey": {"addresses": ["DWallet"]}}]}"#,
        ));
        assert!(view.senders.is_empty());
        assert!(view.sender_id.is_none());
        assert_eq!(view.direction, Direction::To);
    }

    #[test]
    fn serializes_like_the_wallet_ui_expects() {
        let view = TransactionView::outgoing("abc", WALLET, "DBob", 10, 1, 5);
        let json = serde_json::to_value(&view).expect("json");
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["direction"], "from");
        assert_eq!(json["senderId"], WALLET);
        assert_eq!(json["recipientId"], "DBob");
        assert_eq!(json["recipients"], serde_json::json!(["DBob"]));

        let failed = view.with_status(TransactionStatus::Error);
        assert!(!failed.needs_refresh());
        assert_eq!(serde_json::to_value(&failed).expect("json")["status"], "ERROR");
    }
}
