//! Coin selection, output layout and signing of transfers.
//!
//! Inputs are taken first-fit in the order the indexer listed them until they
//! cover `amount + fee`. Change returns to the wallet address.

use litewallet_consensus::constants::{LOCK_TIME_NONE, SEQUENCE_FINAL, TX_VERSION};
use litewallet_consensus::{Amount, AmountError};
use litewallet_log::log_debug;
use litewallet_primitives::{
    address_to_script_pubkey, txid_from_hex, txid_from_raw_hex, OutPoint, Transaction, TxIn, TxOut,
};

use crate::error::WalletError;
use crate::keys::KeyMaterial;
use crate::unspent::{check_amount, total_amount, UnspentOutput};

/// Where the spent output index comes from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OutputIndexMode {
    /// The indexer's `vout`; unspents without one are rejected.
    #[default]
    Reported,
    /// The input's position in the selection.
    Sequential,
}

impl OutputIndexMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reported" | "vout" => Some(Self::Reported),
            "sequential" => Some(Self::Sequential),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlannedOutput {
    pub address: String,
    pub amount: Amount,
}

/// Unsigned transfer: the selected inputs and the outputs they fund.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionPlan {
    pub version: i32,
    pub inputs: Vec<UnspentOutput>,
    pub outputs: Vec<PlannedOutput>,
    /// Input total minus output total. Exceeds the flat fee when dust change was dropped.
    pub fee: Amount,
}

impl TransactionPlan {
    pub fn input_total(&self) -> Amount {
        total_amount(&self.inputs)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedTransaction {
    pub hex: String,
    /// Display-order txid, always recomputed from `hex`.
    pub txid: String,
}

pub struct TransactionBuilder<'a> {
    keys: &'a KeyMaterial,
    fee: Amount,
    dust_threshold: Amount,
    output_index: OutputIndexMode,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(keys: &'a KeyMaterial, fee: Amount) -> Self {
        Self {
            keys,
            fee,
            dust_threshold: 0,
            output_index: OutputIndexMode::default(),
        }
    }

    pub fn with_dust_threshold(mut self, threshold: Amount) -> Self {
        self.dust_threshold = threshold;
        self
    }

    pub fn with_output_index(mut self, mode: OutputIndexMode) -> Self {
        self.output_index = mode;
        self
    }

    /// Plans, signs and serializes a transfer of `amount` atomic units to `target`.
    pub fn build(
        &self,
        target: &str,
        amount: Amount,
        unspents: &[UnspentOutput],
    ) -> Result<SignedTransaction, WalletError> {
        let plan = self.plan(target, amount, unspents)?;
        self.sign(&plan)
    }

    pub fn plan(
        &self,
        target: &str,
        amount: Amount,
        unspents: &[UnspentOutput],
    ) -> Result<TransactionPlan, WalletError> {
        if amount < 0 {
            return Err(AmountError::Negative.into());
        }
        if amount == 0 {
            return Err(AmountError::Zero.into());
        }
        let required = amount
            .checked_add(self.fee)
            .ok_or(WalletError::InvalidAmount(AmountError::Overflow))?;

        let mut inputs = Vec::new();
        let mut selected: Amount = 0;
        for unspent in unspents {
            if selected >= required {
                break;
            }
            check_amount(&unspent.txid, unspent.amount)?;
            selected = selected.saturating_add(unspent.amount);
            inputs.push(unspent.clone());
        }
        if selected < required {
            return Err(WalletError::InsufficientFunds {
                required,
                available: total_amount(unspents),
            });
        }

        let change = selected - required;
        let mut outputs = vec![PlannedOutput {
            address: target.to_string(),
            amount,
        }];
        let keep_change = change > 0 && (self.dust_threshold <= 0 || change >= self.dust_threshold);
        if keep_change {
            outputs.push(PlannedOutput {
                address: self.keys.address().to_string(),
                amount: change,
            });
        }
        let fee = if keep_change { self.fee } else { self.fee + change };
        log_debug!(
            "selected {} of {} unspents ({} units) for {} + fee {}, change {}",
            inputs.len(),
            unspents.len(),
            selected,
            amount,
            fee,
            if keep_change { change } else { 0 }
        );

        Ok(TransactionPlan {
            version: TX_VERSION,
            inputs,
            outputs,
            fee,
        })
    }

    /// Signs every input of `plan` in order and returns the wire encoding.
    pub fn sign(&self, plan: &TransactionPlan) -> Result<SignedTransaction, WalletError> {
        let params = self.keys.params();
        let wallet_script = self.keys.script_pubkey();

        let mut tx = Transaction {
            version: plan.version,
            vin: Vec::with_capacity(plan.inputs.len()),
            vout: Vec::with_capacity(plan.outputs.len()),
            lock_time: LOCK_TIME_NONE,
        };

        for (position, input) in plan.inputs.iter().enumerate() {
            let hash = txid_from_hex(&input.txid).map_err(|err| {
                WalletError::InvalidUnspent(format!("txid '{}': {err}", input.txid))
            })?;
            let index = match self.output_index {
                OutputIndexMode::Reported => input.output_index.ok_or_else(|| {
                    WalletError::InvalidUnspent(format!("{} has no output index", input.txid))
                })?,
                OutputIndexMode::Sequential => u32::try_from(position).map_err(|_| {
                    WalletError::InvalidUnspent("too many inputs".to_string())
                })?,
            };
            if let Some(script) = &input.script_pubkey {
                if *script != wallet_script {
                    return Err(WalletError::SigningFailure(format!(
                        "{}:{index} is not locked to {}",
                        input.txid,
                        self.keys.address()
                    )));
                }
            }
            tx.vin.push(TxIn {
                prevout: OutPoint { hash, index },
                script_sig: Vec::new(),
                sequence: SEQUENCE_FINAL,
            });
        }

        for output in &plan.outputs {
            let script_pubkey = if output.address == self.keys.address() {
                wallet_script.clone()
            } else {
                address_to_script_pubkey(&output.address, params)?
            };
            tx.vout.push(TxOut {
                value: output.amount,
                script_pubkey,
            });
        }

        for input_index in 0..tx.vin.len() {
            self.keys.sign_input(&mut tx, input_index, &wallet_script)?;
        }

        let hex = hex::encode(tx.consensus_encode());
        let txid = txid_from_raw_hex(&hex).map_err(|err| WalletError::Encoding(err.to_string()))?;
        Ok(SignedTransaction { hex, txid })
    }
}
