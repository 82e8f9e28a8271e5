//! Network parameters, monetary units and wallet-wide constants.

pub mod constants;
pub mod money;
pub mod params;

pub use money::{format_amount, parse_amount, Amount, AmountError, COIN};
pub use params::{chain_params, Bip32Prefixes, ChainParams, Currency, Network};

/// Raw 32-byte hash in internal (little-endian) byte order.
pub type Hash256 = [u8; 32];
