use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::error::BotError;
use crate::models::{Candle, CandleInterval, OrderRequest, OrderSide, StopOrderKind, SymbolRules};
use crate::Result;

use super::ExchangeGateway;

const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";
const API_KEY_HEADER: &str = "X-MBX-APIKEY";
const RECV_WINDOW_MS: u32 = 10_000;

/// Exchange code for "position mode already matches the request".
const ERROR_NO_NEED_TO_CHANGE_POSITION: i64 = -4059;

type HmacSha256 = Hmac<Sha256>;

/// Binance USDⓈ-M futures REST client.
///
/// Mutating endpoints are signed: the query string gets a server-sourced
/// timestamp and a fixed recvWindow, then an HMAC-SHA256 signature over the
/// whole query is appended.
#[derive(Clone)]
pub struct BinanceFuturesClient {
    client: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    quote_volume: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfoRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfoRaw {
    symbol: String,
    price_precision: u32,
    quantity_precision: u32,
    #[serde(default)]
    filters: Vec<SymbolFilterRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolFilterRaw {
    filter_type: String,
    #[serde(default)]
    notional: Option<String>,
    #[serde(default)]
    step_size: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTime {
    server_time: i64,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    assets: Vec<AssetBalanceRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetBalanceRaw {
    asset: String,
    available_balance: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

// ============== Implementation ==============

impl BinanceFuturesClient {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            secret_key,
        }
    }

    /// Point the client at a different host (testnet, mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    async fn server_time(&self) -> Result<i64> {
        let url = format!("{}/fapi/v1/time", self.base_url);
        let response = check_status(self.client.get(&url).send().await?).await?;
        let time: ServerTime = response.json().await?;
        Ok(time.server_time)
    }

    async fn signed_url(&self, endpoint: &str, params: &str) -> Result<String> {
        let timestamp = self.server_time().await?;
        let query = if params.is_empty() {
            format!("timestamp={}&recvWindow={}", timestamp, RECV_WINDOW_MS)
        } else {
            format!(
                "{}&timestamp={}&recvWindow={}",
                params, timestamp, RECV_WINDOW_MS
            )
        };
        let signature = self.sign(&query);
        Ok(format!(
            "{}{}?{}&signature={}",
            self.base_url, endpoint, query, signature
        ))
    }

    async fn signed_get(&self, endpoint: &str, params: &str) -> Result<reqwest::Response> {
        let url = self.signed_url(endpoint, params).await?;
        Ok(self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?)
    }

    async fn signed_post(&self, endpoint: &str, params: &str) -> Result<reqwest::Response> {
        let url = self.signed_url(endpoint, params).await?;
        Ok(self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(BotError::Rejected(format!("{}: {}", status, body)))
}

fn candle_from_row(row: &[Value]) -> Result<Candle> {
    let malformed = || BotError::Rejected("malformed kline row".to_string());

    Ok(Candle {
        open_time: row.first().and_then(Value::as_i64).ok_or_else(malformed)?,
        open: string_field(row, 1).ok_or_else(malformed)?,
        high: string_field(row, 2).ok_or_else(malformed)?,
        low: string_field(row, 3).ok_or_else(malformed)?,
        close: string_field(row, 4).ok_or_else(malformed)?,
        volume: string_field(row, 5).ok_or_else(malformed)?,
        close_time: row.get(6).and_then(Value::as_i64).ok_or_else(malformed)?,
    })
}

fn string_field(row: &[Value], index: usize) -> Option<String> {
    row.get(index).and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl ExchangeGateway for BinanceFuturesClient {
    async fn get_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            symbol,
            interval.as_str(),
            limit
        );

        let response = check_status(self.client.get(&url).send().await?).await?;
        let rows: Vec<Vec<Value>> = response.json().await?;

        rows.iter().map(|row| candle_from_row(row)).collect()
    }

    async fn get_top_volume_symbols(&self, n: usize) -> Result<Vec<String>> {
        let url = format!("{}/fapi/v1/ticker/24hr", self.base_url);
        let response = check_status(self.client.get(&url).send().await?).await?;
        let tickers: Vec<Ticker24h> = response.json().await?;

        let mut ranked: Vec<(String, f64)> = tickers
            .into_iter()
            .filter(|ticker| ticker.symbol.ends_with("USDT"))
            .filter_map(|ticker| {
                ticker
                    .quote_volume
                    .parse::<f64>()
                    .ok()
                    .map(|volume| (ticker.symbol, volume))
            })
            .collect();

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(ranked
            .into_iter()
            .take(n)
            .map(|(symbol, _)| symbol)
            .collect())
    }

    async fn get_symbol_rules(&self, symbol: &str) -> Result<SymbolRules> {
        let url = format!("{}/fapi/v1/exchangeInfo", self.base_url);
        let response = check_status(self.client.get(&url).send().await?).await?;
        let info: ExchangeInfo = response.json().await?;

        let raw = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| BotError::SymbolNotFound(symbol.to_string()))?;

        let mut rules = SymbolRules {
            symbol: raw.symbol,
            price_precision: raw.price_precision,
            quantity_precision: raw.quantity_precision,
            min_notional: 0.0,
            step_size: 0.0,
        };

        for filter in raw.filters {
            match filter.filter_type.as_str() {
                "MIN_NOTIONAL" => {
                    rules.min_notional = filter
                        .notional
                        .as_deref()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0.0);
                }
                "LOT_SIZE" => {
                    rules.step_size = filter
                        .step_size
                        .as_deref()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0.0);
                }
                _ => {}
            }
        }

        Ok(rules)
    }

    async fn get_available_balance(&self, asset: &str) -> Result<f64> {
        let response = check_status(self.signed_get("/fapi/v2/account", "").await?).await?;
        let account: AccountInfo = response.json().await?;

        Ok(account
            .assets
            .iter()
            .find(|balance| balance.asset == asset)
            .and_then(|balance| balance.available_balance.parse().ok())
            .unwrap_or(0.0))
    }

    async fn set_hedge_mode(&self, enabled: bool) -> Result<()> {
        let params = format!("dualSidePosition={}", enabled);
        let response = self.signed_post("/fapi/v1/positionSide/dual", &params).await?;

        if response.status().is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
            if api_error.code == ERROR_NO_NEED_TO_CHANGE_POSITION {
                return Ok(());
            }
            return Err(BotError::Rejected(format!(
                "setting position mode failed ({}): {}",
                api_error.code, api_error.msg
            )));
        }

        Err(BotError::Rejected(format!(
            "setting position mode failed: {}",
            body
        )))
    }

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()> {
        let params = format!("symbol={}&leverage={}", symbol, leverage);
        let response = self.signed_post("/fapi/v1/leverage", &params).await?;
        check_status(response).await?;
        Ok(())
    }

    async fn place_market_order(&self, order: &OrderRequest) -> Result<()> {
        let params = format!(
            "symbol={}&side={}&positionSide={}&type=MARKET&quantity={}",
            order.symbol,
            order.side.as_str(),
            order.position_side.as_str(),
            order.quantity
        );
        let response = self.signed_post("/fapi/v1/order", &params).await?;
        check_status(response).await?;
        Ok(())
    }

    async fn place_stop_order(
        &self,
        symbol: &str,
        side: OrderSide,
        kind: StopOrderKind,
        stop_price: f64,
        quantity: f64,
    ) -> Result<()> {
        let params = format!(
            "symbol={}&side={}&type={}&stopPrice={}&quantity={}",
            symbol,
            side.as_str(),
            kind.as_str(),
            stop_price,
            quantity
        );
        let response = self.signed_post("/fapi/v1/order", &params).await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: String) -> BinanceFuturesClient {
        BinanceFuturesClient::new("test-key".to_string(), "test-secret".to_string())
            .with_base_url(base_url)
    }

    #[tokio::test]
    async fn test_get_candles_parses_kline_rows() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"[
            [1700000000000, "50000.0", "50100.0", "49900.0", "50050.0", "12.5", 1700000059999, "625625.0", 100, "6.0", "300300.0", "0"],
            [1700000060000, "50050.0", "50200.0", "50000.0", "50150.0", "10.0", 1700000119999, "501500.0", 80, "5.0", "250750.0", "0"]
        ]"#;
        let _mock = server
            .mock("GET", "/fapi/v1/klines")
            .match_query(mockito::Matcher::Any)
            .with_body(body)
            .create_async()
            .await;

        let client = test_client(server.url());
        let candles = client
            .get_candles("BTCUSDT", CandleInterval::OneMinute, 2)
            .await
            .unwrap();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert_eq!(candles[0].close, "50050.0");
        assert_eq!(candles[1].close_time, 1_700_000_119_999);
        assert_eq!(candles[1].close_price().unwrap(), 50150.0);
    }

    #[tokio::test]
    async fn test_get_top_volume_symbols_ranks_usdt_pairs() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"[
            {"symbol": "ETHUSDT", "quoteVolume": "200000.0"},
            {"symbol": "BTCUSDT", "quoteVolume": "900000.0"},
            {"symbol": "BTCBUSD", "quoteVolume": "800000.0"},
            {"symbol": "SOLUSDT", "quoteVolume": "not-a-number"},
            {"symbol": "XRPUSDT", "quoteVolume": "500000.0"}
        ]"#;
        let _mock = server
            .mock("GET", "/fapi/v1/ticker/24hr")
            .with_body(body)
            .create_async()
            .await;

        let client = test_client(server.url());
        let symbols = client.get_top_volume_symbols(2).await.unwrap();

        assert_eq!(symbols, vec!["BTCUSDT".to_string(), "XRPUSDT".to_string()]);
    }

    #[tokio::test]
    async fn test_get_symbol_rules_parses_filters() {
        let mut server = mockito::Server::new_async().await;
        let body = r#"{
            "symbols": [
                {
                    "symbol": "BTCUSDT",
                    "pricePrecision": 2,
                    "quantityPrecision": 3,
                    "filters": [
                        {"filterType": "PRICE_FILTER", "tickSize": "0.10"},
                        {"filterType": "LOT_SIZE", "stepSize": "0.001"},
                        {"filterType": "MIN_NOTIONAL", "notional": "100"}
                    ]
                }
            ]
        }"#;
        let _mock = server
            .mock("GET", "/fapi/v1/exchangeInfo")
            .with_body(body)
            .create_async()
            .await;

        let client = test_client(server.url());
        let rules = client.get_symbol_rules("BTCUSDT").await.unwrap();

        assert_eq!(rules.price_precision, 2);
        assert_eq!(rules.quantity_precision, 3);
        assert_eq!(rules.step_size, 0.001);
        assert_eq!(rules.min_notional, 100.0);
    }

    #[tokio::test]
    async fn test_get_symbol_rules_unknown_symbol() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/fapi/v1/exchangeInfo")
            .with_body(r#"{"symbols": []}"#)
            .create_async()
            .await;

        let client = test_client(server.url());
        let err = client.get_symbol_rules("DOGEUSDT").await.unwrap_err();

        assert!(matches!(err, BotError::SymbolNotFound(symbol) if symbol == "DOGEUSDT"));
    }

    #[tokio::test]
    async fn test_set_hedge_mode_suppresses_no_change_error() {
        let mut server = mockito::Server::new_async().await;
        let _time = server
            .mock("GET", "/fapi/v1/time")
            .with_body(r#"{"serverTime": 1700000000000}"#)
            .create_async()
            .await;
        let _mock = server
            .mock("POST", "/fapi/v1/positionSide/dual")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code": -4059, "msg": "No need to change position side."}"#)
            .create_async()
            .await;

        let client = test_client(server.url());
        assert!(client.set_hedge_mode(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_hedge_mode_propagates_other_errors() {
        let mut server = mockito::Server::new_async().await;
        let _time = server
            .mock("GET", "/fapi/v1/time")
            .with_body(r#"{"serverTime": 1700000000000}"#)
            .create_async()
            .await;
        let _mock = server
            .mock("POST", "/fapi/v1/positionSide/dual")
            .match_query(mockito::Matcher::Any)
            .with_status(400)
            .with_body(r#"{"code": -2015, "msg": "Invalid API-key."}"#)
            .create_async()
            .await;

        let client = test_client(server.url());
        let err = client.set_hedge_mode(true).await.unwrap_err();

        assert!(matches!(err, BotError::Rejected(msg) if msg.contains("-2015")));
    }

    #[tokio::test]
    async fn test_get_available_balance_missing_asset_is_zero() {
        let mut server = mockito::Server::new_async().await;
        let _time = server
            .mock("GET", "/fapi/v1/time")
            .with_body(r#"{"serverTime": 1700000000000}"#)
            .create_async()
            .await;
        let _mock = server
            .mock("GET", "/fapi/v2/account")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"{"assets": [{"asset": "USDT", "availableBalance": "1234.5"}]}"#)
            .create_async()
            .await;

        let client = test_client(server.url());
        assert_eq!(client.get_available_balance("USDT").await.unwrap(), 1234.5);
        assert_eq!(client.get_available_balance("BUSD").await.unwrap(), 0.0);
    }

    #[test]
    fn test_signature_is_stable_hex() {
        let client = BinanceFuturesClient::new("key".to_string(), "secret".to_string());
        let signature = client.sign("symbol=BTCUSDT&timestamp=1700000000000");

        assert_eq!(signature.len(), 64);
        assert_eq!(signature, client.sign("symbol=BTCUSDT&timestamp=1700000000000"));
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
