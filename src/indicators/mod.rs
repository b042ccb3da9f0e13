// Technical indicators module
// Implements EMA, MACD and Parabolic SAR for trend analysis

pub mod macd;
pub mod moving_average;
pub mod parabolic_sar;
pub mod snapshot;

pub use macd::calculate_macd;
pub use moving_average::{calculate_ema, calculate_ema_series, calculate_sma};
pub use parabolic_sar::calculate_parabolic_sar;
pub use snapshot::{compute_snapshot, previous_macd, MIN_CANDLES};
