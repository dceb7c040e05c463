//! Outbound Telegram notifications.
//!
//! # Responsibilities
//! - Build the subscription confirmation message and inline keyboard
//! - Deliver it through the Bot API `sendMessage` method
//!
//! # Design Decisions
//! - Delivery is best-effort; callers log failures and move on
//! - The bot token is never logged

pub mod client;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use client::TelegramNotifier;
pub use types::{InlineKeyboardButton, InlineKeyboardMarkup, SendMessage};

/// Errors that can occur while notifying a user.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bot API answered with a non-success status.
    #[error("Telegram API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// Sends user-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the user their subscription is active and offer to start a lesson.
    async fn send_subscription_confirmation(&self, chat_id: i64) -> Result<(), NotifyError>;
}

/// Notifier used when no bot token is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send_subscription_confirmation(&self, chat_id: i64) -> Result<(), NotifyError> {
        tracing::warn!(chat_id, "BOT_TOKEN not set, skipping Telegram notification");
        Ok(())
    }
}
