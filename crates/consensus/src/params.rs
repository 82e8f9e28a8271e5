//! Per-currency network parameters.

use crate::constants::{BTC_PAGE_SIZE, BTC_TX_FEE, DOGE_PAGE_SIZE, DOGE_TX_FEE};
use crate::money::Amount;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Currency {
    Doge,
    Bitcoin,
}

impl Currency {
    pub fn ticker(self) -> &'static str {
        match self {
            Self::Doge => "DOGE",
            Self::Bitcoin => "BTC",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "doge" | "dogecoin" => Some(Self::Doge),
            "btc" | "bitcoin" => Some(Self::Bitcoin),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Network {
    Mainnet,
    Testnet,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bip32Prefixes {
    pub public: u32,
    pub private: u32,
}

/// Static address/key encoding parameters plus the wallet defaults of a currency.
#[derive(Clone, Debug)]
pub struct ChainParams {
    pub currency: Currency,
    pub network: Network,
    pub pubkey_address_prefix: u8,
    pub script_address_prefix: u8,
    pub wif_prefix: u8,
    pub bip32: Bip32Prefixes,
    /// Signed-message magic, serialized with a CompactSize length prefix.
    pub message_magic: &'static str,
    pub default_fee: Amount,
    pub page_size: usize,
}

pub fn chain_params(currency: Currency, network: Network) -> ChainParams {
    match (currency, network) {
        (Currency::Doge, Network::Mainnet) => ChainParams {
            currency,
            network,
            pubkey_address_prefix: 0x1e,
            script_address_prefix: 0x16,
            wif_prefix: 0x9e,
            bip32: Bip32Prefixes {
                public: 0x02fa_cafd,
                private: 0x02fa_c398,
            },
            message_magic: "Dogecoin Signed Message:\n",
            default_fee: DOGE_TX_FEE,
            page_size: DOGE_PAGE_SIZE,
        },
        (Currency::Doge, Network::Testnet) => ChainParams {
            currency,
            network,
            pubkey_address_prefix: 0x71,
            script_address_prefix: 0xc4,
            wif_prefix: 0xf1,
            bip32: Bip32Prefixes {
                public: 0x0435_87cf,
                private: 0x0435_8394,
            },
            message_magic: "Dogecoin Signed Message:\n",
            default_fee: DOGE_TX_FEE,
            page_size: DOGE_PAGE_SIZE,
        },
        (Currency::Bitcoin, Network::Mainnet) => ChainParams {
            currency,
            network,
            pubkey_address_prefix: 0x00,
            script_address_prefix: 0x05,
            wif_prefix: 0x80,
            bip32: Bip32Prefixes {
                public: 0x0488_b21e,
                private: 0x0488_ade4,
            },
            message_magic: "Bitcoin Signed Message:\n",
            default_fee: BTC_TX_FEE,
            page_size: BTC_PAGE_SIZE,
        },
        (Currency::Bitcoin, Network::Testnet) => ChainParams {
            currency,
            network,
            pubkey_address_prefix: 0x6f,
            script_address_prefix: 0xc4,
            wif_prefix: 0xef,
            bip32: Bip32Prefixes {
                public: 0x0435_87cf,
                private: 0x0435_8394,
            },
            message_magic: "Bitcoin Signed Message:\n",
            default_fee: BTC_TX_FEE,
            page_size: BTC_PAGE_SIZE,
        },
    }
}
