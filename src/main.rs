use std::collections::HashSet;

use chrono::{DateTime, Utc};
use clap::Parser;
use tokio::sync::watch;

use trendbot::config::AppConfig;
use trendbot::exchange::{BinanceFuturesClient, ExchangeGateway};
use trendbot::execution::OrderOrchestrator;
use trendbot::indicators::{compute_snapshot, previous_macd};
use trendbot::models::{CandleInterval, Direction};
use trendbot::notify::{DiscordClient, NotificationSink};
use trendbot::strategy::{evaluate_signal, MacdCross, SymbolTracker};

const CANDLE_LIMIT: usize = 300;
const QUOTE_ASSET: &str = "USDT";

#[derive(Debug, Parser)]
#[command(name = "trendbot", about = "MACD-cross futures signal and order bot")]
struct Cli {
    /// Candle interval to poll (1m, 5m, 15m, 30m, 1h, 4h, 1d)
    #[arg(long)]
    interval: Option<CandleInterval>,

    /// Number of top-volume symbols to evaluate each cycle
    #[arg(long)]
    top: Option<usize>,
}

/// The wall-clock start of the next interval: truncate down, add one.
/// A timestamp exactly on a boundary moves a full interval ahead.
fn next_interval_start(now: DateTime<Utc>, interval: chrono::Duration) -> DateTime<Utc> {
    let interval_ms = interval.num_milliseconds();
    let now_ms = now.timestamp_millis();
    let next_ms = (now_ms.div_euclid(interval_ms) + 1) * interval_ms;

    DateTime::<Utc>::from_timestamp_millis(next_ms).unwrap_or(now + interval)
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter("trendbot=info")
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(interval) = cli.interval {
        config.interval = interval;
    }
    if let Some(top) = cli.top {
        config.top_symbol_count = top;
    }

    tracing::info!("🚀 trendbot starting");
    tracing::info!("  Interval: {}", config.interval.as_str());
    tracing::info!("  Symbols per cycle: {}", config.top_symbol_count);
    tracing::info!("  Leverage: {}x", config.leverage);

    let gateway = BinanceFuturesClient::new(config.api_key.clone(), config.secret_key.clone());
    let notifier = DiscordClient::new(
        config.discord_webhook_url.clone(),
        config.discord_trade_webhook_url.clone(),
    );
    let orchestrator = OrderOrchestrator::new(
        gateway.clone(),
        notifier.clone(),
        config.leverage,
        QUOTE_ASSET,
    );

    // Shutdown is observed between ticks and between symbol evaluations
    // only; an order sequence in flight always runs to completion.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
            let _ = shutdown_tx.send(true);
        }
    });

    signal_loop(&config, &gateway, &notifier, &orchestrator, shutdown_rx).await;

    tracing::info!("👋 trendbot stopped");
    Ok(())
}

/// One tick per interval boundary: rank symbols by volume, evaluate each
/// serially, then garbage-collect tracker entries for departed symbols.
/// Per-symbol failures are logged and skipped; only shutdown ends the loop.
async fn signal_loop(
    config: &AppConfig,
    gateway: &BinanceFuturesClient,
    notifier: &DiscordClient,
    orchestrator: &OrderOrchestrator<BinanceFuturesClient, DiscordClient>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut tracker = SymbolTracker::new();

    loop {
        let now = Utc::now();
        let next_tick = next_interval_start(now, config.interval.duration());
        let sleep_for = (next_tick - now).to_std().unwrap_or_default();

        tracing::info!(
            "Waiting {:?} until next tick at {}",
            sleep_for,
            next_tick.format("%H:%M:%S")
        );

        tokio::select! {
            _ = tokio::time::sleep(sleep_for) => {}
            _ = shutdown.changed() => {
                return;
            }
        }

        let symbols = match gateway.get_top_volume_symbols(config.top_symbol_count).await {
            Ok(symbols) => symbols,
            Err(e) => {
                tracing::error!("fetching top volume symbols: {}", e);
                continue;
            }
        };

        tracing::info!("🔄 Tick at {}: evaluating {} symbols", Utc::now().format("%H:%M:%S"), symbols.len());

        for symbol in &symbols {
            if *shutdown.borrow() {
                return;
            }
            evaluate_symbol(config, gateway, notifier, orchestrator, &mut tracker, symbol).await;
        }

        let active: HashSet<String> = symbols.into_iter().collect();
        tracker.retain_symbols(&active);
    }
}

async fn evaluate_symbol(
    config: &AppConfig,
    gateway: &BinanceFuturesClient,
    notifier: &DiscordClient,
    orchestrator: &OrderOrchestrator<BinanceFuturesClient, DiscordClient>,
    tracker: &mut SymbolTracker,
    symbol: &str,
) {
    let candles = match gateway
        .get_candles(symbol, config.interval, CANDLE_LIMIT)
        .await
    {
        Ok(candles) => candles,
        Err(e) => {
            tracing::warn!("  ✗ {} candle fetch failed: {}", symbol, e);
            return;
        }
    };

    let snapshot = match compute_snapshot(&candles) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("  ✗ {} skipped: {}", symbol, e);
            return;
        }
    };

    let (prev_macd_line, prev_signal_line) = match previous_macd(&candles) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!("  ✗ {} skipped: {}", symbol, e);
            return;
        }
    };

    let cross = MacdCross {
        prev_macd_line,
        prev_signal_line,
        current_macd_line: snapshot.macd_line,
        current_signal_line: snapshot.signal_line,
    };

    let signal = match evaluate_signal(symbol, &candles, &snapshot, &cross) {
        Ok(signal) => signal,
        Err(e) => {
            tracing::warn!("  ✗ {} signal evaluation failed: {}", symbol, e);
            return;
        }
    };

    if !tracker.should_process(symbol, signal.direction, signal.timestamp) {
        tracing::debug!(
            "  {} unchanged ({} @ {}), suppressed",
            symbol,
            signal.direction,
            signal.timestamp
        );
        return;
    }

    tracing::info!("  {} → {} @ ${:.4}", symbol, signal.direction, signal.price);

    if let Err(e) = notifier.send_signal_notification(&signal).await {
        tracing::warn!("  failed to send signal notification for {}: {}", symbol, e);
    }

    if signal.direction != Direction::None {
        if let Err(e) = orchestrator.execute(&signal).await {
            tracing::error!("  ✗ {} order sequence failed: {}", symbol, e);
        }
    }
}
