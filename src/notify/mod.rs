// Outbound notifications module
pub mod discord;

use async_trait::async_trait;

use crate::error::BotError;
use crate::models::SignalResult;
use crate::Result;

pub use discord::DiscordClient;

/// Sink for trade and signal notifications.
///
/// Delivery is best effort: callers log failures and carry on. A lost
/// notification never changes orchestration outcome and is never retried.
#[async_trait]
pub trait NotificationSink {
    /// One evaluation summary per new (direction, candle) pair.
    async fn send_signal_notification(&self, signal: &SignalResult) -> Result<()>;

    /// Terminal report of an order sequence: the signal it acted on, the
    /// quantized size, and the error that stopped it (none on success).
    async fn send_trade_notification(
        &self,
        signal: &SignalResult,
        order_size: f64,
        error: Option<&BotError>,
    ) -> Result<()>;
}
