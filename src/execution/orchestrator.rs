use crate::error::BotError;
use crate::exchange::{floor_to_step_size, ExchangeGateway};
use crate::models::{Direction, OrderRequest, OrderSide, PositionSide, SignalResult, StopOrderKind};
use crate::notify::NotificationSink;
use crate::Result;

/// Turns an actionable signal into exchange state through a fixed sequence:
/// hedge mode, symbol rules, leverage, balance, sizing, market entry,
/// bracket legs.
///
/// Failures before the entry abort the whole sequence with nothing placed;
/// a failed bracket leg is reported but the filled entry stays. Every
/// sequence ends with exactly one trade notification, aborted or complete.
pub struct OrderOrchestrator<G, N> {
    gateway: G,
    notifier: N,
    leverage: u32,
    quote_asset: String,
}

impl<G, N> OrderOrchestrator<G, N>
where
    G: ExchangeGateway + Sync,
    N: NotificationSink + Sync,
{
    pub fn new(gateway: G, notifier: N, leverage: u32, quote_asset: impl Into<String>) -> Self {
        Self {
            gateway,
            notifier,
            leverage,
            quote_asset: quote_asset.into(),
        }
    }

    /// Run the order sequence for a Long/Short signal and emit the terminal
    /// trade notification. A None signal is a no-op.
    pub async fn execute(&self, signal: &SignalResult) -> Result<()> {
        if signal.direction == Direction::None {
            return Ok(());
        }

        let mut order_size = 0.0;
        let outcome = self.run_sequence(signal, &mut order_size).await;

        if let Err(notify_err) = self
            .notifier
            .send_trade_notification(signal, order_size, outcome.as_ref().err())
            .await
        {
            tracing::warn!(
                "failed to send trade notification for {}: {}",
                signal.symbol,
                notify_err
            );
        }

        outcome
    }

    async fn run_sequence(&self, signal: &SignalResult, order_size: &mut f64) -> Result<()> {
        self.gateway.set_hedge_mode(true).await?;

        let rules = self.gateway.get_symbol_rules(&signal.symbol).await?;

        self.gateway
            .set_leverage(&signal.symbol, self.leverage)
            .await?;

        let balance = self.gateway.get_available_balance(&self.quote_asset).await?;
        if balance <= 0.0 {
            return Err(BotError::InsufficientBalance {
                asset: self.quote_asset.clone(),
            });
        }

        let quantity = floor_to_step_size(balance / signal.price, rules.step_size);
        *order_size = quantity;

        let notional = quantity * signal.price;
        if notional < rules.min_notional {
            return Err(BotError::OrderTooSmall {
                notional,
                min_notional: rules.min_notional,
            });
        }

        let (side, position_side) = match signal.direction {
            Direction::Long => (OrderSide::Buy, PositionSide::Long),
            Direction::Short => (OrderSide::Sell, PositionSide::Short),
            Direction::None => return Ok(()),
        };

        tracing::info!(
            "opening {} position for {}: qty {:.6} at {:.4} (SL {:.4}, TP {:.4})",
            signal.direction,
            signal.symbol,
            quantity,
            signal.price,
            signal.stop_loss,
            signal.take_profit
        );

        let order = OrderRequest {
            symbol: signal.symbol.clone(),
            side,
            position_side,
            quantity,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
        };
        self.gateway.place_market_order(&order).await?;

        // Bracket legs are independent network calls: a failed leg leaves
        // the filled entry in place and is only reported.
        let mut bracket_error = None;

        if signal.stop_loss > 0.0 {
            if let Err(e) = self
                .gateway
                .place_stop_order(
                    &signal.symbol,
                    side.opposite(),
                    StopOrderKind::StopMarket,
                    signal.stop_loss,
                    quantity,
                )
                .await
            {
                tracing::error!("placing stop loss for {}: {}", signal.symbol, e);
                bracket_error = Some(e);
            }
        }

        if signal.take_profit > 0.0 {
            if let Err(e) = self
                .gateway
                .place_stop_order(
                    &signal.symbol,
                    side.opposite(),
                    StopOrderKind::TakeProfitMarket,
                    signal.take_profit,
                    quantity,
                )
                .await
            {
                tracing::error!("placing take profit for {}: {}", signal.symbol, e);
                bracket_error.get_or_insert(e);
            }
        }

        match bracket_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
