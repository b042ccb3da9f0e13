use serde::{Deserialize, Serialize};

use crate::error::BotError;

/// One kline as returned by the exchange, newest last in a window.
///
/// Numeric fields arrive as decimal strings and stay that way until the
/// indicator engine parses them. Times are epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub close_time: i64,
}

impl Candle {
    pub fn open_price(&self) -> Result<f64, BotError> {
        parse_price(&self.open, "open")
    }

    pub fn high_price(&self) -> Result<f64, BotError> {
        parse_price(&self.high, "high")
    }

    pub fn low_price(&self) -> Result<f64, BotError> {
        parse_price(&self.low, "low")
    }

    pub fn close_price(&self) -> Result<f64, BotError> {
        parse_price(&self.close, "close")
    }
}

fn parse_price(raw: &str, field: &'static str) -> Result<f64, BotError> {
    raw.parse::<f64>()
        .map_err(|source| BotError::Parse { field, source })
}

/// Classified trading direction for one evaluation cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
    None,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::None => write!(f, "NO SIGNAL"),
        }
    }
}

/// Indicator values computed over one candle window.
///
/// Only valid for windows of at least 300 candles; the engine refuses to
/// produce one otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema200: f64,
    pub macd_line: f64,
    pub signal_line: f64,
    pub parabolic_sar: f64,
}

/// Per-direction diagnostics: the three entry conditions plus the numbers
/// behind them. Kept for both directions regardless of which one fires.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalDetail {
    pub ema200_condition: bool,
    pub parabolic_sar_condition: bool,
    pub macd_condition: bool,
    pub ema200_value: f64,
    pub ema200_diff: f64,
    pub parabolic_sar_value: f64,
    pub parabolic_sar_diff: f64,
    pub macd_line: f64,
    pub signal_line: f64,
    pub macd_histogram: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalConditions {
    pub long: SignalDetail,
    pub short: SignalDetail,
}

/// Outcome of evaluating one symbol on one candle close.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalResult {
    pub symbol: String,
    pub direction: Direction,
    /// Close time of the evaluated candle, epoch milliseconds.
    pub timestamp: i64,
    pub price: f64,
    /// Zero when direction is None.
    pub stop_loss: f64,
    /// Zero when direction is None.
    pub take_profit: f64,
    pub conditions: SignalConditions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    /// The side that closes a position opened with this side.
    pub fn opposite(self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn as_str(self) -> &'static str {
        match self {
            PositionSide::Long => "LONG",
            PositionSide::Short => "SHORT",
        }
    }
}

/// Conditional order types used for bracket legs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopOrderKind {
    StopMarket,
    TakeProfitMarket,
}

impl StopOrderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StopOrderKind::StopMarket => "STOP_MARKET",
            StopOrderKind::TakeProfitMarket => "TAKE_PROFIT_MARKET",
        }
    }
}

/// A sized market entry derived from a signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub position_side: PositionSide,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Per-symbol trading constraints from exchange info.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolRules {
    pub symbol: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
    pub min_notional: f64,
    pub step_size: f64,
}

/// Supported kline intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandleInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl CandleInterval {
    /// Wire string understood by the klines endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::ThirtyMinutes => "30m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::OneDay => "1d",
        }
    }

    pub fn duration(self) -> chrono::Duration {
        match self {
            CandleInterval::OneMinute => chrono::Duration::minutes(1),
            CandleInterval::FiveMinutes => chrono::Duration::minutes(5),
            CandleInterval::FifteenMinutes => chrono::Duration::minutes(15),
            CandleInterval::ThirtyMinutes => chrono::Duration::minutes(30),
            CandleInterval::OneHour => chrono::Duration::hours(1),
            CandleInterval::FourHours => chrono::Duration::hours(4),
            CandleInterval::OneDay => chrono::Duration::days(1),
        }
    }
}

impl std::str::FromStr for CandleInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(CandleInterval::OneMinute),
            "5m" => Ok(CandleInterval::FiveMinutes),
            "15m" => Ok(CandleInterval::FifteenMinutes),
            "30m" => Ok(CandleInterval::ThirtyMinutes),
            "1h" => Ok(CandleInterval::OneHour),
            "4h" => Ok(CandleInterval::FourHours),
            "1d" => Ok(CandleInterval::OneDay),
            other => Err(format!("unsupported candle interval: {}", other)),
        }
    }
}
