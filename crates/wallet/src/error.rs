use litewallet_consensus::{Amount, AmountError};
use litewallet_primitives::{AddressError, TransactionDecodeError};
use litewallet_script::sign::SigningError;

use crate::config::ConfigError;
use crate::indexer::IndexerError;

#[derive(Debug)]
pub enum WalletError {
    InsufficientFunds { required: Amount, available: Amount },
    SigningFailure(String),
    NetworkFailure(String),
    BroadcastRejected(String),
    InvalidAddress(AddressError),
    InvalidAmount(AmountError),
    InvalidUnspent(String),
    Encoding(String),
    Config(ConfigError),
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletError::InsufficientFunds {
                required,
                available,
            } => write!(
                f,
                "insufficient funds (required {required}, available {available})"
            ),
            WalletError::SigningFailure(message) => write!(f, "signing failed: {message}"),
            WalletError::NetworkFailure(message) => write!(f, "indexer unreachable: {message}"),
            WalletError::BroadcastRejected(message) => {
                write!(f, "transaction rejected: {message}")
            }
            WalletError::InvalidAddress(err) => write!(f, "invalid address: {err}"),
            WalletError::InvalidAmount(err) => write!(f, "invalid amount: {err}"),
            WalletError::InvalidUnspent(message) => write!(f, "invalid unspent output: {message}"),
            WalletError::Encoding(message) => write!(f, "{message}"),
            WalletError::Config(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for WalletError {}

impl From<AddressError> for WalletError {
    fn from(err: AddressError) -> Self {
        WalletError::InvalidAddress(err)
    }
}

impl From<AmountError> for WalletError {
    fn from(err: AmountError) -> Self {
        WalletError::InvalidAmount(err)
    }
}

impl From<SigningError> for WalletError {
    fn from(err: SigningError) -> Self {
        WalletError::SigningFailure(err.to_string())
    }
}

impl From<TransactionDecodeError> for WalletError {
    fn from(err: TransactionDecodeError) -> Self {
        WalletError::Encoding(err.to_string())
    }
}

impl From<ConfigError> for WalletError {
    fn from(err: ConfigError) -> Self {
        WalletError::Config(err)
    }
}

impl From<IndexerError> for WalletError {
    fn from(err: IndexerError) -> Self {
        match err {
            IndexerError::Rejected(message) => WalletError::BroadcastRejected(message),
            IndexerError::Decode(message) => WalletError::Encoding(message),
            other => WalletError::NetworkFailure(other.to_string()),
        }
    }
}
