//! Indexer records and the Insight HTTP client.

use std::time::Duration;

use litewallet_consensus::{parse_amount, Amount, AmountError, COIN};
use litewallet_log::log_trace;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

use crate::sync::PageCursor;

#[derive(Debug)]
pub enum IndexerError {
    Transport(String),
    Status { code: i32, body: String },
    /// The indexer refused a broadcast.
    Rejected(String),
    Decode(String),
}

impl std::fmt::Display for IndexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexerError::Transport(message) => write!(f, "{message}"),
            IndexerError::Status { code, body } => write!(f, "HTTP {code}: {body}"),
            IndexerError::Rejected(message) => write!(f, "{message}"),
            IndexerError::Decode(message) => write!(f, "malformed indexer response: {message}"),
        }
    }
}

impl std::error::Error for IndexerError {}

/// One entry of `/addr/<address>/utxo`.
#[derive(Clone, Debug, Deserialize)]
pub struct UnspentRecord {
    pub txid: String,
    #[serde(default)]
    pub vout: Option<u32>,
    /// Major units as reported by the indexer.
    #[serde(default, deserialize_with = "optional_amount")]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub satoshis: Option<Amount>,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pubkey: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawTransaction {
    pub txid: String,
    #[serde(default)]
    pub vin: Vec<RawInput>,
    #[serde(default)]
    pub vout: Vec<RawOutput>,
    #[serde(default)]
    pub confirmations: u64,
    /// Seconds since the epoch.
    #[serde(default)]
    pub time: u64,
    #[serde(default, deserialize_with = "optional_amount")]
    pub fees: Option<Amount>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawInput {
    /// Absent for coinbase inputs.
    #[serde(default)]
    pub addr: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawOutput {
    #[serde(deserialize_with = "amount")]
    pub value: Amount,
    #[serde(rename = "scriptPubKey", default)]
    pub script_pubkey: RawScriptPubKey,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawScriptPubKey {
    #[serde(default)]
    pub addresses: Option<Vec<String>>,
}

impl RawOutput {
    pub fn addresses(&self) -> &[String] {
        self.script_pubkey.addresses.as_deref().unwrap_or_default()
    }
}

/// Response of `/addrs/<address>/txs?from=&to=`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistoryPage {
    #[serde(default)]
    pub total_items: Option<usize>,
    #[serde(default)]
    pub from: usize,
    #[serde(default)]
    pub to: usize,
    #[serde(default)]
    pub items: Vec<RawTransaction>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalValue {
    Text(String),
    Number(serde_json::Number),
}

impl DecimalValue {
    fn to_atomic(&self) -> Result<Amount, AmountError> {
        match self {
            DecimalValue::Text(text) => parse_amount(text),
            DecimalValue::Number(number) => {
                parse_amount(&number.to_string()).or_else(|err| {
                    // Small or huge floats render in exponent form.
                    let value = number.as_f64().ok_or(err)?;
                    let scaled = (value * COIN as f64).round();
                    if scaled < 0.0 {
                        Err(AmountError::Negative)
                    } else if !scaled.is_finite() || scaled >= Amount::MAX as f64 {
                        Err(AmountError::Overflow)
                    } else {
                        Ok(scaled as Amount)
                    }
                })
            }
        }
    }
}

fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    DecimalValue::deserialize(deserializer)?
        .to_atomic()
        .map_err(D::Error::custom)
}

fn optional_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Amount>, D::Error> {
    Option::<DecimalValue>::deserialize(deserializer)?
        .map(|value| value.to_atomic().map_err(D::Error::custom))
        .transpose()
}

/// Remote indexer the wallet talks to. Calls are issued one at a time.
#[allow(async_fn_in_trait)]
pub trait IndexerClient {
    /// Confirmed balance in atomic units.
    async fn balance(&self, address: &str) -> Result<Amount, IndexerError>;

    async fn unspents(&self, address: &str) -> Result<Vec<UnspentRecord>, IndexerError>;

    async fn transaction(&self, txid: &str) -> Result<RawTransaction, IndexerError>;

    /// Most-recent-first history window selected by `cursor`.
    async fn transactions(
        &self,
        address: &str,
        cursor: &PageCursor,
        limit: usize,
    ) -> Result<RawHistoryPage, IndexerError>;

    /// Submits a signed transaction and returns the id the indexer reports.
    async fn broadcast(&self, raw_hex: &str) -> Result<String, IndexerError>;
}

/// Insight API client over `minreq`, run on the blocking pool.
#[derive(Clone, Debug)]
pub struct InsightClient {
    base_url: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    txid: String,
}

impl InsightClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(&self, request: minreq::Request) -> Result<String, IndexerError> {
        let request = request.with_timeout(self.timeout.as_secs().max(1));
        let response = tokio::task::spawn_blocking(move || request.send())
            .await
            .map_err(|err| IndexerError::Transport(format!("request task failed: {err}")))?
            .map_err(|err| IndexerError::Transport(err.to_string()))?;
        let body = response
            .as_str()
            .map_err(|err| IndexerError::Decode(err.to_string()))?
            .to_string();
        if !(200..300).contains(&response.status_code) {
            return Err(IndexerError::Status {
                code: response.status_code,
                body,
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, request: minreq::Request) -> Result<T, IndexerError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|err| IndexerError::Decode(err.to_string()))
    }
}

impl IndexerClient for InsightClient {
    async fn balance(&self, address: &str) -> Result<Amount, IndexerError> {
        let url = self.url(&format!("addr/{address}/balance"));
        log_trace!("GET {url}");
        let body = self.execute(minreq::get(url)).await?;
        body.trim()
            .parse::<Amount>()
            .map_err(|err| IndexerError::Decode(format!("balance '{}': {err}", body.trim())))
    }

    async fn unspents(&self, address: &str) -> Result<Vec<UnspentRecord>, IndexerError> {
        let url = self.url(&format!("addr/{address}/utxo"));
        log_trace!("GET {url}");
        self.get_json(minreq::get(url).with_param("noCache", "1"))
            .await
    }

    async fn transaction(&self, txid: &str) -> Result<RawTransaction, IndexerError> {
        let url = self.url(&format!("tx/{txid}"));
        log_trace!("GET {url}");
        self.get_json(minreq::get(url)).await
    }

    async fn transactions(
        &self,
        address: &str,
        cursor: &PageCursor,
        limit: usize,
    ) -> Result<RawHistoryPage, IndexerError> {
        // Insight pages by offset only; the synchronizer finds anchors in the window.
        let from = cursor.offset();
        let to = from + limit;
        let url = self.url(&format!("addrs/{address}/txs"));
        log_trace!("GET {url} from={from} to={to}");
        self.get_json(
            minreq::get(url)
                .with_param("from", from.to_string())
                .with_param("to", to.to_string()),
        )
        .await
    }

    async fn broadcast(&self, raw_hex: &str) -> Result<String, IndexerError> {
        let url = self.url("tx/send");
        log_trace!("POST {url}");
        let body = serde_json::json!({ "rawtx": raw_hex }).to_string();
        let request = minreq::post(url)
            .with_header("Content-Type", "application/json")
            .with_body(body);
        let response = match self.execute(request).await {
            Ok(response) => response,
            Err(IndexerError::Status { body, .. }) => return Err(IndexerError::Rejected(body)),
            Err(err) => return Err(err),
        };
        let parsed: BroadcastResponse = serde_json::from_str(&response)
            .map_err(|err| IndexerError::Decode(err.to_string()))?;
        Ok(parsed.txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insight_transaction() {
        let raw: RawTransaction = serde_json::from_str(
            r#"{
                "txid": "abc",
                "vin": [{"addr": "DSender"}, {}],
                "vout": [
                    {"value": "10.5", "scriptPubKey": {"addresses": ["DRecipient"]}},
                    {"value": 0.00000001, "scriptPubKey": {"addresses": null}},
                    {"value": "0"}
                ],
                "confirmations": 3,
                "time": 1700000000,
                "fees": 1
            }"#,
        )
        .expect("parse");
        assert_eq!(raw.vin[0].addr.as_deref(), Some("DSender"));
        assert!(raw.vin[1].addr.is_none());
        assert_eq!(raw.vout[0].value, 1_050_000_000);
        assert_eq!(raw.vout[1].value, 1);
        assert!(raw.vout[1].addresses().is_empty());
        assert!(raw.vout[2].addresses().is_empty());
        assert_eq!(raw.fees, Some(COIN));
    }

    #[test]
    fn decimal_strings_are_exact() {
        let raw: RawOutput =
            serde_json::from_str(r#"{"value": "0.29999999"}"#).expect("parse");
        assert_eq!(raw.value, 29_999_999);
        let float: RawOutput = serde_json::from_str(r#"{"value": 0.1}"#).expect("parse");
        assert_eq!(float.value, 10_000_000);
    }

    #[test]
    fn rejects_negative_values() {
        let err = serde_json::from_str::<RawOutput>(r#"{"value": "-1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn parses_history_page_and_utxos() {
        let page: RawHistoryPage = serde_json::from_str(
            r#"{"totalItems": 42, "from": 0, "to": 20, "items": [{"txid": "t1"}]}"#,
        )
        .expect("parse");
        assert_eq!(page.total_items, Some(42));
        assert_eq!(page.items[0].txid, "t1");
        assert_eq!(page.items[0].confirmations, 0);

        let utxos: Vec<UnspentRecord> = serde_json::from_str(
            r#"[{"txid": "aa", "vout": 1, "amount": 2.5, "satoshis": 250000000, "scriptPubKey": "76a9"}]"#,
        )
        .expect("parse");
        assert_eq!(utxos[0].vout, Some(1));
        assert_eq!(utxos[0].amount, Some(250_000_000));
        assert_eq!(utxos[0].satoshis, Some(250_000_000));
    }

    #[test]
    fn client_joins_paths() {
        let client = InsightClient::new("https://insight.example/api/", Duration::from_secs(5));
        assert_eq!(client.base_url(), "https://insight.example/api");
        assert_eq!(client.url("/tx/send"), "https://insight.example/api/tx/send");
    }
}
