use crate::error::BotError;
use crate::models::{
    Candle, Direction, IndicatorSnapshot, SignalConditions, SignalDetail, SignalResult,
};

use super::MacdCross;

/// Widest stop distance allowed, as a fraction of entry price.
pub const MAX_STOP_DISTANCE_PCT: f64 = 0.007;

/// Classify a direction for one symbol from its indicator snapshot and the
/// MACD crossover state, and derive the risk levels for it.
///
/// A window shorter than two candles is degenerate, not an error: the
/// result carries direction None and a zero-valued condition pair. Both
/// condition bundles are always populated so a notification can show why a
/// direction did or did not fire.
pub fn evaluate_signal(
    symbol: &str,
    candles: &[Candle],
    snapshot: &IndicatorSnapshot,
    cross: &MacdCross,
) -> Result<SignalResult, BotError> {
    if candles.len() < 2 {
        return Ok(SignalResult {
            symbol: symbol.to_string(),
            direction: Direction::None,
            timestamp: candles.last().map(|c| c.close_time).unwrap_or(0),
            price: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            conditions: SignalConditions::default(),
        });
    }

    let last = &candles[candles.len() - 1];
    let last_close = last.close_price()?;
    let last_high = last.high_price()?;
    let last_low = last.low_price()?;

    let histogram = snapshot.macd_line - snapshot.signal_line;

    let long = SignalDetail {
        ema200_condition: last_close > snapshot.ema200,
        parabolic_sar_condition: snapshot.parabolic_sar < last_low,
        macd_condition: cross.is_up_cross(),
        ema200_value: snapshot.ema200,
        ema200_diff: last_close - snapshot.ema200,
        parabolic_sar_value: snapshot.parabolic_sar,
        parabolic_sar_diff: last_low - snapshot.parabolic_sar,
        macd_line: snapshot.macd_line,
        signal_line: snapshot.signal_line,
        macd_histogram: histogram,
    };

    let short = SignalDetail {
        ema200_condition: last_close < snapshot.ema200,
        parabolic_sar_condition: snapshot.parabolic_sar > last_high,
        macd_condition: cross.is_down_cross(),
        ema200_value: snapshot.ema200,
        ema200_diff: last_close - snapshot.ema200,
        parabolic_sar_value: snapshot.parabolic_sar,
        parabolic_sar_diff: snapshot.parabolic_sar - last_high,
        macd_line: snapshot.macd_line,
        signal_line: snapshot.signal_line,
        macd_histogram: histogram,
    };

    let (direction, stop_loss, take_profit) =
        if long.ema200_condition && long.parabolic_sar_condition && long.macd_condition {
            let (sl, tp) = long_risk_levels(last_close, snapshot.parabolic_sar);
            (Direction::Long, sl, tp)
        } else if short.ema200_condition && short.parabolic_sar_condition && short.macd_condition {
            let (sl, tp) = short_risk_levels(last_close, snapshot.parabolic_sar);
            (Direction::Short, sl, tp)
        } else {
            (Direction::None, 0.0, 0.0)
        };

    Ok(SignalResult {
        symbol: symbol.to_string(),
        direction,
        timestamp: last.close_time,
        price: last_close,
        stop_loss,
        take_profit,
        conditions: SignalConditions { long, short },
    })
}

/// Stop at the SAR, clipped upward so the distance never exceeds
/// [`MAX_STOP_DISTANCE_PCT`] of price; take-profit mirrors the stop
/// distance above price.
fn long_risk_levels(price: f64, raw_stop: f64) -> (f64, f64) {
    let max_distance = price * MAX_STOP_DISTANCE_PCT;
    let stop_loss = raw_stop.max(price - max_distance);
    let take_profit = price + (price - stop_loss);
    (stop_loss, take_profit)
}

fn short_risk_levels(price: f64, raw_stop: f64) -> (f64, f64) {
    let max_distance = price * MAX_STOP_DISTANCE_PCT;
    let stop_loss = raw_stop.min(price + max_distance);
    let take_profit = price - (stop_loss - price);
    (stop_loss, take_profit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candle(close: f64, high: f64, low: f64) -> Candle {
        Candle {
            open_time: 0,
            open: format!("{}", close),
            high: format!("{}", high),
            low: format!("{}", low),
            close: format!("{}", close),
            volume: "100.0".to_string(),
            close_time: 1_700_000_059_999,
        }
    }

    fn window_ending_with(close: f64, high: f64, low: f64) -> Vec<Candle> {
        vec![make_candle(close, high, low), make_candle(close, high, low)]
    }

    fn up_cross() -> MacdCross {
        MacdCross {
            prev_macd_line: -1.0,
            prev_signal_line: 1.0,
            current_macd_line: 2.0,
            current_signal_line: 1.0,
        }
    }

    fn down_cross() -> MacdCross {
        MacdCross {
            prev_macd_line: 1.0,
            prev_signal_line: -1.0,
            current_macd_line: -2.0,
            current_signal_line: -1.0,
        }
    }

    fn no_cross() -> MacdCross {
        MacdCross {
            prev_macd_line: 2.0,
            prev_signal_line: 1.0,
            current_macd_line: 2.0,
            current_signal_line: 1.0,
        }
    }

    #[test]
    fn test_long_signal_with_clipped_stop() {
        // SAR-derived stop of 49000 is 1000 away; the 0.7% clip allows 350.
        let candles = window_ending_with(50000.0, 50100.0, 49900.0);
        let snapshot = IndicatorSnapshot {
            ema200: 48000.0,
            macd_line: 2.0,
            signal_line: 1.0,
            parabolic_sar: 49000.0,
        };

        let result = evaluate_signal("BTCUSDT", &candles, &snapshot, &up_cross()).unwrap();

        assert_eq!(result.direction, Direction::Long);
        assert_eq!(result.stop_loss, 49650.0);
        assert_eq!(result.take_profit, 50350.0);
    }

    #[test]
    fn test_long_signal_with_unclipped_stop() {
        // SAR only 50 away, well inside the 350 budget: kept as-is.
        let candles = window_ending_with(50000.0, 50100.0, 49990.0);
        let snapshot = IndicatorSnapshot {
            ema200: 48000.0,
            macd_line: 2.0,
            signal_line: 1.0,
            parabolic_sar: 49950.0,
        };

        let result = evaluate_signal("BTCUSDT", &candles, &snapshot, &up_cross()).unwrap();

        assert_eq!(result.direction, Direction::Long);
        assert_eq!(result.stop_loss, 49950.0);
        assert_eq!(result.take_profit, 50050.0);
    }

    #[test]
    fn test_short_signal_with_clipped_stop() {
        let candles = window_ending_with(50000.0, 50100.0, 49900.0);
        let snapshot = IndicatorSnapshot {
            ema200: 52000.0,
            macd_line: -2.0,
            signal_line: -1.0,
            parabolic_sar: 51000.0,
        };

        let result = evaluate_signal("BTCUSDT", &candles, &snapshot, &down_cross()).unwrap();

        assert_eq!(result.direction, Direction::Short);
        assert_eq!(result.stop_loss, 50350.0);
        assert_eq!(result.take_profit, 49650.0);
    }

    #[test]
    fn test_no_signal_without_cross() {
        // Trend and SAR both allow a long, but no crossover happened.
        let candles = window_ending_with(50000.0, 50100.0, 49900.0);
        let snapshot = IndicatorSnapshot {
            ema200: 48000.0,
            macd_line: 2.0,
            signal_line: 1.0,
            parabolic_sar: 49000.0,
        };

        let result = evaluate_signal("BTCUSDT", &candles, &snapshot, &no_cross()).unwrap();

        assert_eq!(result.direction, Direction::None);
        assert_eq!(result.stop_loss, 0.0);
        assert_eq!(result.take_profit, 0.0);
        assert!(result.conditions.long.ema200_condition);
        assert!(result.conditions.long.parabolic_sar_condition);
        assert!(!result.conditions.long.macd_condition);
    }

    #[test]
    fn test_no_signal_below_trend_filter() {
        // Up-cross fires but price is under the EMA200: stay out.
        let candles = window_ending_with(47000.0, 47100.0, 46900.0);
        let snapshot = IndicatorSnapshot {
            ema200: 48000.0,
            macd_line: 2.0,
            signal_line: 1.0,
            parabolic_sar: 46000.0,
        };

        let result = evaluate_signal("BTCUSDT", &candles, &snapshot, &up_cross()).unwrap();

        assert_eq!(result.direction, Direction::None);
        assert!(!result.conditions.long.ema200_condition);
        assert!(result.conditions.long.macd_condition);
    }

    #[test]
    fn test_both_condition_bundles_populated() {
        let candles = window_ending_with(50000.0, 50100.0, 49900.0);
        let snapshot = IndicatorSnapshot {
            ema200: 48000.0,
            macd_line: 2.0,
            signal_line: 1.0,
            parabolic_sar: 49000.0,
        };

        let result = evaluate_signal("BTCUSDT", &candles, &snapshot, &up_cross()).unwrap();

        assert_eq!(result.conditions.long.ema200_value, 48000.0);
        assert_eq!(result.conditions.long.ema200_diff, 2000.0);
        assert_eq!(result.conditions.short.ema200_value, 48000.0);
        assert_eq!(result.conditions.short.ema200_diff, 2000.0);
        assert_eq!(result.conditions.short.parabolic_sar_diff, 49000.0 - 50100.0);
        assert!(!result.conditions.short.ema200_condition);
    }

    #[test]
    fn test_degenerate_window_returns_none() {
        let snapshot = IndicatorSnapshot {
            ema200: 48000.0,
            macd_line: 2.0,
            signal_line: 1.0,
            parabolic_sar: 49000.0,
        };

        let result = evaluate_signal("BTCUSDT", &[], &snapshot, &up_cross()).unwrap();

        assert_eq!(result.direction, Direction::None);
        assert_eq!(result.price, 0.0);
        assert_eq!(result.conditions, SignalConditions::default());
    }
}
