//! Notify Adapter - 通知渠道实现

mod discord_webhook;
mod message;
mod telegram_bot;

pub use discord_webhook::{DiscordWebhookConfig, DiscordWebhookSink};
pub use telegram_bot::{TelegramBotConfig, TelegramBotSink};
