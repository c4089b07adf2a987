use crate::bot::resilient::{edit_message_safe_resilient, send_message_resilient};
use crate::bot::views::{render_intent, DefaultSelectionView, RenderedMessage, SelectionView};
use anyhow::{anyhow, Result};
use linkpick_core::navigation::InboundEvent;
use linkpick_core::provider::YtdlpProvider;
use linkpick_core::utils::short_url;
use linkpick_core::{ConversationId, NavigationController};
use std::sync::Arc;
use teloxide::{prelude::*, types::ParseMode, utils::command::BotCommands};
use tracing::{info, warn};

// Helper function to get user name from Message
fn get_user_name(msg: &Message) -> String {
    if let Some(ref user) = msg.from {
        if let Some(ref username) = user.username {
            return username.clone();
        }
        if !user.first_name.is_empty() {
            return user.first_name.clone();
        }
    }
    "Unknown".to_string()
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Conversation a chat maps to
#[must_use]
pub fn conversation_id(chat_id: ChatId) -> ConversationId {
    ConversationId::from(chat_id.0)
}

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    /// Start the bot and show welcome message
    #[command(description = "Start the bot.")]
    Start,
    /// Explain how to use the bot
    #[command(description = "Show usage help.")]
    Help,
    /// Forget the current format list
    #[command(description = "Forget the current format list.")]
    Clear,
    /// Check bot health
    #[command(description = "Check bot health.")]
    Healthcheck,
    /// Show bot statistics
    #[command(description = "Show bot statistics.")]
    Stats,
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    let user_name = get_user_name(&msg);
    info!("User {user_id} ({user_name}) initiated /start command.");

    bot.send_message(msg.chat.id, DefaultSelectionView::welcome_message())
        .await?;
    Ok(())
}

/// Help handler
///
/// # Errors
///
/// Returns an error if the help message cannot be sent.
pub async fn help(bot: Bot, msg: Message) -> Result<()> {
    let text = format!(
        "{}\n\n{}",
        DefaultSelectionView::help_message(),
        Command::descriptions()
    );
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Clear handler: drops the chat's selection session
///
/// # Errors
///
/// Returns an error if the confirmation cannot be sent.
pub async fn clear(bot: Bot, msg: Message, controller: Arc<NavigationController>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!("User {user_id} cleared the format list.");

    controller.reset(conversation_id(msg.chat.id)).await;
    bot.send_message(msg.chat.id, DefaultSelectionView::session_cleared())
        .await?;
    Ok(())
}

/// Healthcheck handler: reports whether yt-dlp answers
///
/// # Errors
///
/// Returns an error if the healthcheck response cannot be sent.
pub async fn healthcheck(bot: Bot, msg: Message, provider: Arc<YtdlpProvider>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    info!("Healthcheck command received from user {user_id}.");

    let text = match provider.version().await {
        Ok(version) => DefaultSelectionView::healthcheck(Ok(&version)),
        Err(e) => {
            warn!("Healthcheck: yt-dlp is unavailable: {e}");
            DefaultSelectionView::healthcheck(Err(&e.to_string()))
        }
    };
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Stats handler - shows the number of live conversations
///
/// # Errors
///
/// Returns an error if the stats response cannot be sent.
pub async fn stats(bot: Bot, msg: Message, controller: Arc<NavigationController>) -> Result<()> {
    let active = controller.active_conversations().await;
    bot.send_message(msg.chat.id, DefaultSelectionView::stats(active))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// URL message handler.
///
/// Sends a processing placeholder, resolves the link and then replaces the
/// placeholder with the choice page or an error.
///
/// # Errors
///
/// Returns an error if the placeholder cannot be sent.
pub async fn handle_url(
    bot: Bot,
    msg: Message,
    controller: Arc<NavigationController>,
) -> Result<()> {
    let text = msg.text().unwrap_or_default().to_string();
    let chat_id = msg.chat.id;
    info!(
        "Received URL {} from user {}",
        short_url(&text),
        get_user_id_safe(&msg)
    );

    let placeholder =
        send_message_resilient(&bot, chat_id, DefaultSelectionView::processing(), None).await?;

    let reply = controller
        .handle(InboundEvent::UrlSubmitted {
            conversation_id: conversation_id(chat_id),
            text,
        })
        .await;
    info!(conversation_id = %chat_id, state = ?reply.state, "URL handled");

    let RenderedMessage { text, keyboard } = render_intent::<DefaultSelectionView>(&reply.intent);
    if !edit_message_safe_resilient(&bot, chat_id, placeholder.id, &text, keyboard).await {
        return Err(anyhow!("Could not deliver the result to chat {chat_id}"));
    }
    Ok(())
}

/// Inline keyboard handler for format and Back buttons.
///
/// Every query is answered first so the client stops its spinner; the
/// button's message is then edited in place.
///
/// # Errors
///
/// Returns an error if the callback carries no message or the edit fails.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    controller: Arc<NavigationController>,
) -> Result<()> {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!("Failed to answer callback query: {e}");
    }

    let message = q
        .message
        .as_ref()
        .ok_or_else(|| anyhow!("Callback query without a message"))?;
    let chat_id = message.chat().id;
    let payload = q.data.clone().unwrap_or_default();

    let reply = controller
        .handle(InboundEvent::ButtonPressed {
            conversation_id: conversation_id(chat_id),
            payload,
        })
        .await;
    info!(conversation_id = %chat_id, state = ?reply.state, "Button handled");

    let RenderedMessage { text, keyboard } = render_intent::<DefaultSelectionView>(&reply.intent);
    if !edit_message_safe_resilient(&bot, chat_id, message.id(), &text, keyboard).await {
        return Err(anyhow!("Could not update the selection message in chat {chat_id}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse() {
        assert!(matches!(Command::parse("/start", "bot"), Ok(Command::Start)));
        assert!(matches!(Command::parse("/help", "bot"), Ok(Command::Help)));
        assert!(matches!(Command::parse("/clear", "bot"), Ok(Command::Clear)));
        assert!(matches!(
            Command::parse("/healthcheck", "bot"),
            Ok(Command::Healthcheck)
        ));
        assert!(matches!(Command::parse("/stats", "bot"), Ok(Command::Stats)));
        assert!(Command::parse("https://youtu.be/x", "bot").is_err());
    }

    #[test]
    fn test_conversation_follows_chat() {
        assert_eq!(conversation_id(ChatId(-100_42)).as_i64(), -100_42);
    }
}
