use crate::error::BotError;
use crate::models::{Candle, IndicatorSnapshot};

use super::{calculate_ema, calculate_macd, calculate_parabolic_sar};

/// Minimum window length for a valid snapshot.
pub const MIN_CANDLES: usize = 300;

const EMA_PERIOD: usize = 200;

/// Compute EMA200, MACD and Parabolic SAR over a full candle window.
///
/// The window must be ordered oldest first and hold at least
/// [`MIN_CANDLES`] entries; anything shorter is refused rather than
/// producing a snapshot the signal rules cannot trust.
pub fn compute_snapshot(candles: &[Candle]) -> Result<IndicatorSnapshot, BotError> {
    if candles.len() < MIN_CANDLES {
        return Err(BotError::InsufficientData {
            needed: MIN_CANDLES,
            got: candles.len(),
        });
    }

    let mut closes = Vec::with_capacity(candles.len());
    let mut highs = Vec::with_capacity(candles.len());
    let mut lows = Vec::with_capacity(candles.len());

    for candle in candles {
        closes.push(candle.close_price()?);
        highs.push(candle.high_price()?);
        lows.push(candle.low_price()?);
    }

    let insufficient = || BotError::InsufficientData {
        needed: MIN_CANDLES,
        got: candles.len(),
    };

    let ema200 = calculate_ema(&closes, EMA_PERIOD).ok_or_else(insufficient)?;
    let (macd_line, signal_line) = calculate_macd(&closes).ok_or_else(insufficient)?;
    let parabolic_sar = calculate_parabolic_sar(&highs, &lows).ok_or_else(insufficient)?;

    Ok(IndicatorSnapshot {
        ema200,
        macd_line,
        signal_line,
        parabolic_sar,
    })
}

/// MACD pair over the window with the newest candle excluded.
///
/// Feeds crossover detection against the current snapshot. The shortened
/// window is not re-gated at [`MIN_CANDLES`], so a 300-candle fetch still
/// yields a previous value to compare against.
pub fn previous_macd(candles: &[Candle]) -> Result<(f64, f64), BotError> {
    if candles.len() < 2 {
        return Err(BotError::InsufficientCandles {
            got: candles.len(),
        });
    }

    let mut closes = Vec::with_capacity(candles.len() - 1);
    for candle in &candles[..candles.len() - 1] {
        closes.push(candle.close_price()?);
    }

    calculate_macd(&closes).ok_or(BotError::InsufficientData {
        needed: MIN_CANDLES,
        got: candles.len(),
    })
}
