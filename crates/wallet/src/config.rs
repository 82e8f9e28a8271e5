//! Wallet settings and the `key=value` conf file that overrides them.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use litewallet_consensus::constants::DEFAULT_MAX_SYNC_PAGES;
use litewallet_consensus::{chain_params, parse_amount, Amount, ChainParams, Currency, Network};
use litewallet_log::{Filter as LogFilter, Format as LogFormat, LogConfig};

use crate::builder::OutputIndexMode;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const KNOWN_KEYS: &[&str] = &[
    "currency",
    "testnet",
    "indexer",
    "fee",
    "pagesize",
    "maxsyncpages",
    "dustthreshold",
    "outputindex",
    "timeout",
    "loglevel",
    "logformat",
    "logtimestamps",
    "logfile",
];

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Missing(&'static str),
    InvalidValue { key: &'static str, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "{err}"),
            ConfigError::Missing(key) => write!(f, "missing required setting '{key}'"),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for '{key}': '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub currency: Currency,
    pub network: Network,
    /// Base URL of the Insight API, e.g. `https://host/api`.
    pub indexer_url: String,
    pub fee: Amount,
    pub page_size: usize,
    pub max_sync_pages: usize,
    /// Change below this many atomic units is left to the fee. Zero disables the check.
    pub dust_threshold: Amount,
    pub output_index: OutputIndexMode,
    pub request_timeout: Duration,
    pub log: LogConfig,
}

impl WalletConfig {
    pub fn new(currency: Currency, network: Network, indexer_url: impl Into<String>) -> Self {
        let params = chain_params(currency, network);
        Self {
            currency,
            network,
            indexer_url: indexer_url.into(),
            fee: params.default_fee,
            page_size: params.page_size,
            max_sync_pages: DEFAULT_MAX_SYNC_PAGES,
            dust_threshold: 0,
            output_index: OutputIndexMode::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            log: LogConfig::default(),
        }
    }

    /// Installs the logging settings process-wide.
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        litewallet_log::init(self.log.clone())?;
        Ok(())
    }

    pub fn params(&self) -> ChainParams {
        chain_params(self.currency, self.network)
    }

    /// Reads a conf file and returns the config together with any keys it did not recognise.
    pub fn from_conf_file(path: &Path) -> Result<(Self, Vec<String>), ConfigError> {
        let conf = load_conf(path)?.ok_or(ConfigError::Missing("indexer"))?;
        Self::from_conf(&conf)
    }

    pub fn from_conf(conf: &HashMap<String, Vec<String>>) -> Result<(Self, Vec<String>), ConfigError> {
        let currency = match conf_value(conf, "currency") {
            Some(raw) => Currency::parse(raw).ok_or_else(|| invalid("currency", raw))?,
            None => Currency::Doge,
        };
        let network = match conf_value(conf, "testnet") {
            Some(raw) if parse_conf_bool(raw).ok_or_else(|| invalid("testnet", raw))? => {
                Network::Testnet
            }
            Some(_) => Network::Mainnet,
            None => Network::Mainnet,
        };
        let indexer = conf_value(conf, "indexer")
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::Missing("indexer"))?;
        let mut config = Self::new(currency, network, indexer.trim_end_matches('/'));

        if let Some(raw) = conf_value(conf, "fee") {
            config.fee = parse_amount(raw).map_err(|_| invalid("fee", raw))?;
        }
        if let Some(raw) = conf_value(conf, "pagesize") {
            config.page_size = parse_positive(raw).ok_or_else(|| invalid("pagesize", raw))?;
        }
        if let Some(raw) = conf_value(conf, "maxsyncpages") {
            config.max_sync_pages =
                parse_positive(raw).ok_or_else(|| invalid("maxsyncpages", raw))?;
        }
        if let Some(raw) = conf_value(conf, "dustthreshold") {
            config.dust_threshold = parse_amount(raw).map_err(|_| invalid("dustthreshold", raw))?;
        }
        if let Some(raw) = conf_value(conf, "outputindex") {
            config.output_index =
                OutputIndexMode::parse(raw).ok_or_else(|| invalid("outputindex", raw))?;
        }
        if let Some(raw) = conf_value(conf, "timeout") {
            let secs = parse_positive(raw).ok_or_else(|| invalid("timeout", raw))?;
            config.request_timeout = Duration::from_secs(secs as u64);
        }
        if let Some(raw) = conf_value(conf, "loglevel") {
            config.log.filter = LogFilter::parse(raw).ok_or_else(|| invalid("loglevel", raw))?;
        }
        if let Some(raw) = conf_value(conf, "logformat") {
            config.log.format = LogFormat::parse(raw).ok_or_else(|| invalid("logformat", raw))?;
        }
        if let Some(raw) = conf_value(conf, "logtimestamps") {
            config.log.timestamps =
                parse_conf_bool(raw).ok_or_else(|| invalid("logtimestamps", raw))?;
        }
        if let Some(raw) = conf_value(conf, "logfile").filter(|value| !value.is_empty()) {
            config.log.file = Some(PathBuf::from(raw));
        }

        let mut unknown: Vec<String> = conf
            .keys()
            .filter(|key| !KNOWN_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        unknown.sort();
        Ok((config, unknown))
    }
}

/// Parses `key=value` lines. `#` and `;` start comments, a bare key means `1`,
/// keys are case-insensitive. Returns `None` when the file does not exist.
pub fn load_conf(path: &Path) -> Result<Option<HashMap<String, Vec<String>>>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    for raw_line in contents.lines() {
        let mut line = raw_line.trim();
        if let Some(idx) = line.find(['#', ';']) {
            line = &line[..idx];
        }
        line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, "1"),
        };
        if key.is_empty() {
            continue;
        }
        out.entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
    Ok(Some(out))
}

pub fn parse_conf_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(true);
    }
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn conf_value<'a>(conf: &'a HashMap<String, Vec<String>>, key: &str) -> Option<&'a str> {
    conf.get(key)
        .and_then(|values| values.last())
        .map(|value| value.as_str())
}

fn parse_positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|value| *value > 0)
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}
