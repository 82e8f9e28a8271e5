//! Constants shared by transaction construction and history paging.

use crate::money::{Amount, COIN};

/// Transactions are always built as version 1 (legacy serialization).
pub const TX_VERSION: i32 = 1;
/// Sequence number for inputs that opt out of replacement and relative locks.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;
pub const LOCK_TIME_NONE: u32 = 0;

/// Flat per-transaction fee for Dogecoin: 1 DOGE.
pub const DOGE_TX_FEE: Amount = COIN;
/// History page window used by Dogecoin indexers.
pub const DOGE_PAGE_SIZE: usize = 20;

/// Flat per-transaction fee for Bitcoin: 0.0001 BTC.
pub const BTC_TX_FEE: Amount = 10_000;
pub const BTC_PAGE_SIZE: usize = 25;

/// Upper bound on pages fetched by one forward history sync pass.
pub const DEFAULT_MAX_SYNC_PAGES: usize = 50;
