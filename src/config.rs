use anyhow::Context;

use crate::models::CandleInterval;

/// Runtime configuration, read once at startup and passed by reference.
///
/// Replaces any notion of process-wide mutable state: after construction
/// nothing here changes.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub secret_key: String,
    pub discord_webhook_url: String,
    pub discord_trade_webhook_url: String,
    pub interval: CandleInterval,
    pub top_symbol_count: usize,
    pub leverage: u32,
}

impl AppConfig {
    /// Load from the environment (`.env` is read by the caller first).
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("BINANCE_API_KEY").context("BINANCE_API_KEY not set")?;
        let secret_key =
            std::env::var("BINANCE_SECRET_KEY").context("BINANCE_SECRET_KEY not set")?;
        let discord_webhook_url =
            std::env::var("DISCORD_WEBHOOK_URL").context("DISCORD_WEBHOOK_URL not set")?;
        let discord_trade_webhook_url = std::env::var("DISCORD_TRADE_WEBHOOK_URL")
            .context("DISCORD_TRADE_WEBHOOK_URL not set")?;

        let interval = match std::env::var("CANDLE_INTERVAL") {
            Ok(raw) => raw
                .parse::<CandleInterval>()
                .map_err(|e| anyhow::anyhow!("CANDLE_INTERVAL invalid: {}", e))?,
            Err(_) => CandleInterval::OneMinute,
        };

        let top_symbol_count = parse_env_or("TOP_SYMBOL_COUNT", 5)?;
        let leverage = parse_env_or("LEVERAGE", 20)?;

        Ok(Self {
            api_key,
            secret_key,
            discord_webhook_url,
            discord_trade_webhook_url,
            interval,
            top_symbol_count,
            leverage,
        })
    }
}

fn parse_env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} invalid: {}", name, raw)),
        Err(_) => Ok(default),
    }
}
