//! Wallet session and the currency-agnostic `WalletApi` capability.

use std::time::{SystemTime, UNIX_EPOCH};

use litewallet_consensus::{parse_amount, Amount, AmountError, Currency};
use litewallet_log::{log_error, log_info, log_trace, log_warn};

use crate::builder::{SignedTransaction, TransactionBuilder};
use crate::classifier::{TransactionClassifier, TransactionStatus, TransactionView};
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::indexer::IndexerClient;
use crate::keys::KeyMaterial;
use crate::sync::{HistoryPage, HistorySource, HistorySynchronizer, PageCursor, SyncReport};
use crate::unspent::UnspentOutputSet;

/// Operations every supported currency offers. Amounts are atomic units
/// except where a major-unit string is taken from the user.
#[allow(async_fn_in_trait)]
pub trait WalletApi {
    fn address(&self) -> &str;

    fn currency(&self) -> Currency;

    async fn get_balance(&self) -> Result<Amount, WalletError>;

    /// Offset window `[from, from + page_size)` of the address history.
    async fn get_transactions(&self, from: usize) -> Result<HistoryPage, WalletError>;

    async fn get_transaction(&self, txid: &str) -> Result<TransactionView, WalletError>;

    /// Builds and signs a transfer of `amount` (major units) from fresh unspents.
    async fn create_transaction(
        &self,
        address: &str,
        amount: &str,
    ) -> Result<SignedTransaction, WalletError>;

    async fn send_transaction(&self, raw_hex: &str) -> Result<String, WalletError>;
}

/// What a transfer notifier is told once a transfer has been broadcast.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferNotice {
    pub currency: Currency,
    pub txid: String,
    pub recipient: String,
    /// Major units, as entered by the user.
    pub amount: String,
}

/// Optional side channel announcing a broadcast transfer.
#[allow(async_fn_in_trait)]
pub trait TransferNotifier {
    async fn notify(&self, notice: &TransferNotice) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// No side channel.
impl TransferNotifier for () {
    async fn notify(&self, _notice: &TransferNotice) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct TransferFailure {
    /// The locally assembled transaction, marked `ERROR`, when the failure came from broadcast.
    pub view: Option<TransactionView>,
    pub error: WalletError,
}

impl std::fmt::Display for TransferFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.view {
            Some(view) => write!(f, "transfer {} failed: {}", view.id, self.error),
            None => write!(f, "transfer failed: {}", self.error),
        }
    }
}

impl std::error::Error for TransferFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<WalletError> for TransferFailure {
    fn from(error: WalletError) -> Self {
        TransferFailure { view: None, error }
    }
}

/// One logged-in wallet. Dropping it erases the key material.
pub struct UtxoWallet<C> {
    client: C,
    keys: KeyMaterial,
    config: WalletConfig,
    classifier: TransactionClassifier,
    unspent: UnspentOutputSet,
    history: HistorySynchronizer,
}

impl<C: IndexerClient> UtxoWallet<C> {
    pub fn open(passphrase: &[u8], config: WalletConfig, client: C) -> Result<Self, WalletError> {
        let keys = KeyMaterial::from_passphrase(passphrase, config.params())?;
        let classifier = TransactionClassifier::new(keys.address(), config.fee);
        let history = HistorySynchronizer::new(config.page_size, config.max_sync_pages);
        log_info!(
            "{} wallet session opened for {}",
            config.currency.ticker(),
            keys.address()
        );
        Ok(Self {
            client,
            keys,
            config,
            classifier,
            unspent: UnspentOutputSet::default(),
            history,
        })
    }

    pub fn keys(&self) -> &KeyMaterial {
        &self.keys
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn unspent(&self) -> &UnspentOutputSet {
        &self.unspent
    }

    pub fn history(&self) -> &HistorySynchronizer {
        &self.history
    }

    pub fn builder(&self) -> TransactionBuilder<'_> {
        TransactionBuilder::new(&self.keys, self.config.fee)
            .with_dust_threshold(self.config.dust_threshold)
            .with_output_index(self.config.output_index)
    }

    pub async fn refresh_unspents(&mut self) -> Result<&UnspentOutputSet, WalletError> {
        let fresh = self.fetch_unspents().await?;
        self.unspent.replace(fresh);
        Ok(&self.unspent)
    }

    pub async fn sync_new(&mut self) -> Result<SyncReport, WalletError> {
        let source = IndexerHistory {
            client: &self.client,
            address: self.keys.address(),
            classifier: &self.classifier,
        };
        self.history.sync_new(&source).await
    }

    pub async fn sync_old(&mut self) -> Result<SyncReport, WalletError> {
        let source = IndexerHistory {
            client: &self.client,
            address: self.keys.address(),
            classifier: &self.classifier,
        };
        self.history.sync_old(&source).await
    }

    /// Re-fetches a held transaction unless it already reached a final status.
    pub async fn refresh_transaction(&mut self, txid: &str) -> Result<TransactionView, WalletError> {
        if let Some(known) = self.history.get(txid).filter(|tx| !tx.needs_refresh()) {
            log_trace!("{txid} is final, not refreshing");
            return Ok(known.clone());
        }
        let view = self.get_transaction(txid).await?;
        self.history.update(view.clone());
        Ok(view)
    }

    /// Refreshes unspents, builds, broadcasts and optionally announces a transfer.
    ///
    /// Broadcast failures return the assembled view with status `ERROR`. The
    /// notifier runs only after a successful broadcast and cannot undo it.
    pub async fn send_transfer<N: TransferNotifier>(
        &mut self,
        address: &str,
        amount: &str,
        notifier: Option<&N>,
    ) -> Result<TransactionView, TransferFailure> {
        let address = address.trim();
        let atomic = parse_positive_amount(amount)?;
        self.refresh_unspents().await?;
        let signed = self.builder().build(address, atomic, self.unspent.outputs())?;

        let view = TransactionView::outgoing(
            &signed.txid,
            self.keys.address(),
            address,
            atomic,
            self.config.fee,
            now_millis(),
        );

        // Whatever the outcome, the selected outputs may now be spent.
        self.unspent.mark_stale();
        match self.client.broadcast(&signed.hex).await {
            Ok(reported) => {
                if reported != signed.txid {
                    log_warn!("indexer reported txid {reported} for {}", signed.txid);
                }
                log_info!(
                    "{} transfer {} broadcast: {} to {address}",
                    self.config.currency.ticker(),
                    signed.txid,
                    amount.trim()
                );
            }
            Err(err) => {
                let error = WalletError::from(err);
                log_error!("{} transfer {} failed: {error}", self.config.currency.ticker(), signed.txid);
                return Err(TransferFailure {
                    view: Some(view.with_status(TransactionStatus::Error)),
                    error,
                });
            }
        }

        if let Some(notifier) = notifier {
            let notice = TransferNotice {
                currency: self.config.currency,
                txid: signed.txid.clone(),
                recipient: address.to_string(),
                amount: amount.trim().to_string(),
            };
            if let Err(err) = notifier.notify(&notice).await {
                log_warn!("transfer {} sent but notification failed: {err}", signed.txid);
            }
        }

        Ok(view)
    }

    async fn fetch_unspents(&self) -> Result<UnspentOutputSet, WalletError> {
        let records = self.client.unspents(self.keys.address()).await?;
        UnspentOutputSet::from_records(&records)
    }
}

impl<C: IndexerClient> WalletApi for UtxoWallet<C> {
    fn address(&self) -> &str {
        self.keys.address()
    }

    fn currency(&self) -> Currency {
        self.config.currency
    }

    async fn get_balance(&self) -> Result<Amount, WalletError> {
        Ok(self.client.balance(self.keys.address()).await?)
    }

    async fn get_transactions(&self, from: usize) -> Result<HistoryPage, WalletError> {
        let raw = self
            .client
            .transactions(self.keys.address(), &PageCursor::Offset(from), self.config.page_size)
            .await?;
        Ok(self.classifier.classify_page(&raw))
    }

    async fn get_transaction(&self, txid: &str) -> Result<TransactionView, WalletError> {
        let raw = self.client.transaction(txid).await?;
        Ok(self.classifier.classify(&raw))
    }

    async fn create_transaction(
        &self,
        address: &str,
        amount: &str,
    ) -> Result<SignedTransaction, WalletError> {
        let atomic = parse_positive_amount(amount)?;
        let unspent = self.fetch_unspents().await?;
        self.builder().build(address.trim(), atomic, unspent.outputs())
    }

    async fn send_transaction(&self, raw_hex: &str) -> Result<String, WalletError> {
        Ok(self.client.broadcast(raw_hex).await?)
    }
}

struct IndexerHistory<'a, C> {
    client: &'a C,
    address: &'a str,
    classifier: &'a TransactionClassifier,
}

impl<C: IndexerClient> HistorySource for IndexerHistory<'_, C> {
    async fn fetch_page(&self, cursor: &PageCursor, limit: usize) -> Result<HistoryPage, WalletError> {
        let raw = self.client.transactions(self.address, cursor, limit).await?;
        Ok(self.classifier.classify_page(&raw))
    }
}

fn parse_positive_amount(raw: &str) -> Result<Amount, WalletError> {
    match parse_amount(raw)? {
        0 => Err(AmountError::Zero.into()),
        amount => Ok(amount),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
