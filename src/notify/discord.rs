use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;

use crate::error::BotError;
use crate::models::{Direction, SignalDetail, SignalResult};
use crate::Result;

use super::NotificationSink;

const COLOR_GREEN: u32 = 0x00FF00;
const COLOR_RED: u32 = 0xFF0000;
const COLOR_BLUE: u32 = 0x0000FF;
const FOOTER_TEXT: &str = "🤖 trendbot";

// ============== Webhook Payload Types ==============

#[derive(Debug, Clone, Serialize)]
struct Message {
    embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
struct Embed {
    title: String,
    description: String,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
    footer: EmbedFooter,
    timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedFooter {
    text: String,
}

// ============== Client ==============

/// Discord webhook client with separate hooks for signal summaries and
/// trade reports.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    webhook_url: String,
    trade_webhook_url: String,
}

impl DiscordClient {
    pub fn new(webhook_url: String, trade_webhook_url: String) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
            trade_webhook_url,
        }
    }

    async fn send(&self, url: &str, embed: Embed) -> Result<()> {
        let message = Message {
            embeds: vec![embed],
        };

        let response = self.client.post(url).json(&message).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Rejected(format!(
                "discord webhook returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

// ============== Embed Builders ==============

fn direction_style(direction: Direction) -> (u32, &'static str) {
    match direction {
        Direction::Long => (COLOR_GREEN, "🚀"),
        Direction::Short => (COLOR_RED, "🔻"),
        Direction::None => (COLOR_BLUE, "⏺️"),
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn rfc3339_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Stop-loss and take-profit as signed percentages of entry, from the
/// trader's point of view (loss negative, profit positive for both sides).
fn risk_percentages(signal: &SignalResult) -> (f64, f64) {
    let mut stop_pct = (signal.stop_loss - signal.price) / signal.price * 100.0;
    let mut profit_pct = (signal.take_profit - signal.price) / signal.price * 100.0;

    if signal.direction == Direction::Short {
        stop_pct = -stop_pct;
        profit_pct = -profit_pct;
    }

    (stop_pct, profit_pct)
}

fn condition_mark(condition: bool, label: &str) -> String {
    if condition {
        format!("✅ {}", label)
    } else {
        format!("❌ {}", label)
    }
}

fn detail_field(detail: &SignalDetail) -> String {
    format!(
        "```\n{}\n{}\n{}\n```\n```\n[EMA200]: {:.2} (diff: {:.2})\n[MACD Line]: {:.2}\n[Signal Line]: {:.2}\n[Histogram]: {:.2}\n[SAR]: {:.2} (diff: {:.2})\n```",
        condition_mark(detail.ema200_condition, "EMA200"),
        condition_mark(detail.macd_condition, "MACD"),
        condition_mark(detail.parabolic_sar_condition, "SAR"),
        detail.ema200_value,
        detail.ema200_diff,
        detail.macd_line,
        detail.signal_line,
        detail.macd_histogram,
        detail.parabolic_sar_value,
        detail.parabolic_sar_diff,
    )
}

fn signal_embed(signal: &SignalResult) -> Embed {
    let (color, emoji) = direction_style(signal.direction);

    let mut description = format!(
        "**Time**: {}\n**Price**: ${:.2}\n",
        format_timestamp(signal.timestamp),
        signal.price
    );

    if signal.direction != Direction::None {
        let (stop_pct, profit_pct) = risk_percentages(signal);
        description.push_str(&format!(
            "**Stop loss**: ${:.2} ({:.2}%)\n**Take profit**: ${:.2} ({:.2}%)\n",
            signal.stop_loss, stop_pct, signal.take_profit, profit_pct
        ));
    }

    Embed {
        title: format!("{} {} {}", emoji, signal.direction, signal.symbol),
        description,
        color,
        fields: vec![
            EmbedField {
                name: "📈 LONG".to_string(),
                value: detail_field(&signal.conditions.long),
                inline: true,
            },
            EmbedField {
                name: "📉 SHORT".to_string(),
                value: detail_field(&signal.conditions.short),
                inline: true,
            },
        ],
        footer: EmbedFooter {
            text: FOOTER_TEXT.to_string(),
        },
        timestamp: rfc3339_timestamp(signal.timestamp),
    }
}

fn trade_embed(signal: &SignalResult, order_size: f64, error: Option<&BotError>) -> Embed {
    match error {
        None => {
            let (color, emoji) = direction_style(signal.direction);
            let (stop_pct, profit_pct) = risk_percentages(signal);

            Embed {
                title: format!("{} Order filled", emoji),
                description: format!(
                    "**Time**: {}\n**Symbol**: {}\n**Position**: {}\n**Quantity**: {:.4}\n**Entry**: ${:.4}\n**Stop loss**: ${:.4} ({:.2}%)\n**Take profit**: ${:.4} ({:.2}%)",
                    format_timestamp(signal.timestamp),
                    signal.symbol,
                    signal.direction,
                    order_size,
                    signal.price,
                    signal.stop_loss,
                    stop_pct,
                    signal.take_profit,
                    profit_pct,
                ),
                color,
                fields: Vec::new(),
                footer: EmbedFooter {
                    text: FOOTER_TEXT.to_string(),
                },
                timestamp: rfc3339_timestamp(signal.timestamp),
            }
        }
        Some(err) => Embed {
            title: "⚠️ Order failed".to_string(),
            description: format!(
                "**Time**: {}\n**Symbol**: {}\n**Quantity**: {:.4}\n**Error**: {}",
                format_timestamp(signal.timestamp),
                signal.symbol,
                order_size,
                err,
            ),
            color: COLOR_RED,
            fields: Vec::new(),
            footer: EmbedFooter {
                text: FOOTER_TEXT.to_string(),
            },
            timestamp: rfc3339_timestamp(signal.timestamp),
        },
    }
}

#[async_trait]
impl NotificationSink for DiscordClient {
    async fn send_signal_notification(&self, signal: &SignalResult) -> Result<()> {
        self.send(&self.webhook_url, signal_embed(signal)).await
    }

    async fn send_trade_notification(
        &self,
        signal: &SignalResult,
        order_size: f64,
        error: Option<&BotError>,
    ) -> Result<()> {
        self.send(&self.trade_webhook_url, trade_embed(signal, order_size, error))
            .await
    }
}
