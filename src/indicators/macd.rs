use super::moving_average::calculate_ema_series;

const FAST_PERIOD: usize = 12;
const SLOW_PERIOD: usize = 26;
const SIGNAL_PERIOD: usize = 9;

/// MACD line and signal line for a closing-price series.
///
/// MACD line = EMA12 − EMA26; signal line = EMA9 of the MACD line series.
/// The signal line depends on the whole MACD history, so the full series is
/// built internally even though only the latest pair is returned.
///
/// Returns `None` for series shorter than 34 prices (26 to start the slow
/// EMA, 9 MACD values to start the signal EMA).
pub fn calculate_macd(prices: &[f64]) -> Option<(f64, f64)> {
    let fast_ema = calculate_ema_series(prices, FAST_PERIOD);
    let slow_ema = calculate_ema_series(prices, SLOW_PERIOD);
    if slow_ema.is_empty() {
        return None;
    }

    // Both EMA series end at the newest price; the fast one starts earlier.
    // Align them on the slow start.
    let offset = SLOW_PERIOD - FAST_PERIOD;
    let macd_series: Vec<f64> = slow_ema
        .iter()
        .enumerate()
        .map(|(i, slow)| fast_ema[i + offset] - slow)
        .collect();

    let signal_series = calculate_ema_series(&macd_series, SIGNAL_PERIOD);
    let signal_line = *signal_series.last()?;
    let macd_line = *macd_series.last()?;

    Some((macd_line, signal_line))
}
