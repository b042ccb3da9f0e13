use thiserror::Error;

/// Failure taxonomy for the signal pipeline and order flow.
///
/// Indicator and signal errors are scoped to one symbol in one cycle: the
/// polling loop logs them and moves on. Order errors abort only that
/// symbol's order sequence. Nothing here terminates the loop.
#[derive(Debug, Error)]
pub enum BotError {
    /// Candle window too short for a valid indicator snapshot.
    #[error("insufficient data: need at least {needed} candles, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Fewer than two candles; there is no previous value to compare.
    #[error("insufficient candles: got {got}, need at least 2")]
    InsufficientCandles { got: usize },

    /// A numeric candle field could not be parsed.
    #[error("error parsing {field} price: {source}")]
    Parse {
        field: &'static str,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Network-level failure talking to the exchange.
    #[error("exchange request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The exchange answered and said no.
    #[error("exchange rejected request: {0}")]
    Rejected(String),

    /// Order notional below the symbol minimum. Skipped, never rounded up.
    #[error("order size too small: notional {notional:.4} below minimum {min_notional:.4}")]
    OrderTooSmall { notional: f64, min_notional: f64 },

    /// Symbol missing from exchange info.
    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    /// No free quote-asset balance to size an order from.
    #[error("insufficient {asset} balance")]
    InsufficientBalance { asset: String },
}
