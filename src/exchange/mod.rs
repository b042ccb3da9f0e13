// Exchange gateway module
pub mod binance;
pub mod filters;

use async_trait::async_trait;

use crate::models::{Candle, CandleInterval, OrderRequest, OrderSide, StopOrderKind, SymbolRules};
use crate::Result;

pub use binance::BinanceFuturesClient;
pub use filters::{floor_to_step_size, precision_from_step_size};

/// Exchange operations the trading pipeline depends on.
///
/// The polling loop and the order orchestrator only see this trait; the
/// live implementation is [`BinanceFuturesClient`].
#[async_trait]
pub trait ExchangeGateway {
    /// Candle window for a symbol, ordered oldest first.
    async fn get_candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: usize,
    ) -> Result<Vec<Candle>>;

    /// The top `n` USDT-quoted symbols ranked by 24h quote volume.
    async fn get_top_volume_symbols(&self, n: usize) -> Result<Vec<String>>;

    async fn get_symbol_rules(&self, symbol: &str) -> Result<SymbolRules>;

    /// Free balance of the given asset; zero when the asset is absent.
    async fn get_available_balance(&self, asset: &str) -> Result<f64>;

    /// Enable or disable dual-side (hedge) position mode. Asking for the
    /// mode the account is already in counts as success.
    async fn set_hedge_mode(&self, enabled: bool) -> Result<()>;

    async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<()>;

    async fn place_market_order(&self, order: &OrderRequest) -> Result<()>;

    async fn place_stop_order(
        &self,
        symbol: &str,
        side: OrderSide,
        kind: StopOrderKind,
        stop_price: f64,
        quantity: f64,
    ) -> Result<()>;
}
