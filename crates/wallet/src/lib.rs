//! Passphrase-derived UTXO wallet: key derivation, coin selection and signing,
//! history classification and incremental history sync against an Insight indexer.

pub mod api;
pub mod builder;
pub mod classifier;
pub mod config;
pub mod error;
pub mod indexer;
pub mod keys;
pub mod sync;
pub mod unspent;

pub use api::{TransferFailure, TransferNotice, TransferNotifier, UtxoWallet, WalletApi};
pub use builder::{
    OutputIndexMode, PlannedOutput, SignedTransaction, TransactionBuilder, TransactionPlan,
};
pub use classifier::{Direction, TransactionClassifier, TransactionStatus, TransactionView};
pub use config::{ConfigError, WalletConfig};
pub use error::WalletError;
pub use indexer::{
    IndexerClient, IndexerError, InsightClient, RawHistoryPage, RawTransaction, UnspentRecord,
};
pub use keys::KeyMaterial;
pub use sync::{HistoryPage, HistorySource, HistorySynchronizer, PageCursor, SyncReport, SyncState};
pub use unspent::{UnspentOutput, UnspentOutputSet};
