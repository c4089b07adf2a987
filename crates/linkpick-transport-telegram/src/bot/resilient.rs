//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! Every outgoing call is retried on failure using exponential backoff with
//! jitter. Messages are always sent in HTML parse mode.
//!
//! # Usage
//!
//! ```ignore
//! use linkpick_transport_telegram::bot::resilient::{send_message_resilient, edit_message_safe_resilient};
//!
//! let msg = send_message_resilient(&bot, chat_id, "Processing your request...", None).await?;
//! let success = edit_message_safe_resilient(&bot, chat_id, msg.id, "Done", None).await;
//! ```

use crate::config::{
    TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    TELEGRAM_MESSAGE_LIMIT,
};
use anyhow::Result;
use linkpick_core::utils::truncate_str;
use std::future::Future;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, Message, MessageId, ParseMode};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{debug, warn};

const ERROR_NOT_MODIFIED: &str = "message is not modified";
const ERROR_NOT_FOUND: &str = "message to edit not found";

/// Retry a Telegram API operation with exponential backoff and jitter.
///
/// - Initial delay: 500ms
/// - Max delay: 10s
/// - Retries: 3 (see constants in `config.rs`)
///
/// # Errors
///
/// Returns the last error if every attempt fails.
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Telegram API operation failed after {} retries: {}",
            TELEGRAM_API_MAX_RETRIES, e
        );
        e
    })
}

/// Send an HTML message with automatic retry on failures.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<Message> {
    let text = fit_message(&text.into());
    retry_telegram_operation(|| async {
        let mut req = bot
            .send_message(chat_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await
            .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
    })
    .await
}

/// Edit an HTML message with automatic retry on failures.
///
/// Returns `Ok(None)` when Telegram reports the content as unchanged.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn edit_message_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: impl Into<String>,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<Option<Message>> {
    let text = fit_message(&text.into());
    retry_telegram_operation(|| async {
        let mut req = bot
            .edit_message_text(chat_id, msg_id, text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        match req.await {
            Ok(msg) => Ok(Some(msg)),
            Err(e) if e.to_string().contains(ERROR_NOT_MODIFIED) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
        }
    })
    .await
}

/// Edit a message, falling back to a fresh message if the edit fails.
///
/// Returns `true` if the user ends up seeing `text`.
pub async fn edit_message_safe_resilient(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    text: &str,
    markup: Option<InlineKeyboardMarkup>,
) -> bool {
    match edit_message_resilient(bot, chat_id, msg_id, text, markup.clone()).await {
        Ok(Some(_)) => true,
        Ok(None) => {
            debug!("Message update skipped: message is not modified");
            true
        }
        Err(e) => {
            let err_msg = e.to_string();
            if err_msg.contains(ERROR_NOT_FOUND) {
                debug!("Message to edit is gone, sending a new one");
            } else {
                warn!("Failed to edit message after retries: {e}");
            }
            match send_message_resilient(bot, chat_id, text, markup).await {
                Ok(_) => true,
                Err(e) => {
                    warn!("Fallback send failed: {e}");
                    false
                }
            }
        }
    }
}

/// Truncate text to Telegram's message limit.
fn fit_message(text: &str) -> String {
    if text.chars().count() > TELEGRAM_MESSAGE_LIMIT {
        format!("{}...", truncate_str(text, TELEGRAM_MESSAGE_LIMIT - 3))
    } else {
        text.to_string()
    }
}
