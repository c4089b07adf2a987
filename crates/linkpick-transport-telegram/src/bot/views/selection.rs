//! Format selection UI components
//!
//! Contains keyboards, text messages, and formatters for the format picker.

use linkpick_core::media::size_in_mb;
use linkpick_core::navigation::{ChoiceOption, FailureKind, Notice, RenderIntent, SelectionEvent};
use reqwest::Url;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Trait definition
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for format picker view rendering
///
/// Provides all text messages shown around format selection.
pub trait SelectionView {
    /// Reply to /start
    fn welcome_message() -> &'static str;

    /// Reply to /help
    fn help_message() -> &'static str;

    /// Placeholder sent while a URL is being resolved
    fn processing() -> &'static str;

    /// Reply to /clear
    fn session_cleared() -> &'static str;

    /// Reply to /healthcheck
    fn healthcheck(provider_version: Result<&str, &str>) -> String;

    /// Reply to /stats
    fn stats(active_conversations: u64) -> String;

    /// Choice page body
    fn choices_message(title: &str, notice: Option<Notice>) -> String;

    /// Final link body
    fn download_message(title: &str, label: &str) -> String;

    /// Failure body
    fn error_message(failure: FailureKind) -> String;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Default English implementation of `SelectionView`
pub struct DefaultSelectionView;

impl SelectionView for DefaultSelectionView {
    fn welcome_message() -> &'static str {
        "Welcome! Send me a video URL to download."
    }

    fn help_message() -> &'static str {
        "Send a link to a video page and I will list the largest downloadable formats.\n\n\
         Pick one to get a direct download link. <b>Back</b> shows the list again.\n\n\
         /clear forgets the current list."
    }

    fn processing() -> &'static str {
        "Processing your request..."
    }

    fn session_cleared() -> &'static str {
        "Format list cleared. Send a new link."
    }

    fn healthcheck(provider_version: Result<&str, &str>) -> String {
        match provider_version {
            Ok(version) => format!("OK\nyt-dlp {}", html_escape::encode_text(version)),
            Err(e) => format!("Degraded\nyt-dlp unavailable: {}", html_escape::encode_text(e)),
        }
    }

    fn stats(active_conversations: u64) -> String {
        format!("<b>Bot Statistics</b>\n\nActive conversations: {active_conversations}")
    }

    fn choices_message(title: &str, notice: Option<Notice>) -> String {
        let body = format!(
            "Title: {}\n\nChoose a format to download:",
            html_escape::encode_text(title)
        );
        match notice {
            Some(notice) => format!("<i>{}</i>\n\n{body}", notice.user_message()),
            None => body,
        }
    }

    fn download_message(title: &str, label: &str) -> String {
        format!(
            "Title: {}\n\nFormat: {}\n\nClick the button below to download:",
            html_escape::encode_text(title),
            html_escape::encode_text(label)
        )
    }

    fn error_message(failure: FailureKind) -> String {
        failure.user_message().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Message body plus optional inline keyboard
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    /// HTML text
    pub text: String,
    /// Inline keyboard, if any
    pub keyboard: Option<InlineKeyboardMarkup>,
}

/// Turn a render intent into a Telegram message using view `V`
#[must_use]
pub fn render_intent<V: SelectionView>(intent: &RenderIntent) -> RenderedMessage {
    match intent {
        RenderIntent::ShowChoices {
            title,
            options,
            has_back,
            notice,
        } => RenderedMessage {
            text: V::choices_message(title, *notice),
            keyboard: Some(choices_keyboard(options, *has_back)),
        },
        RenderIntent::ShowDownloadLink { title, label, url } => {
            let Some(keyboard) = download_keyboard(url) else {
                // Telegram only accepts valid URLs on buttons; fall back to plain text
                let text = format!(
                    "{}\n\n{}",
                    V::download_message(title, label),
                    html_escape::encode_text(url)
                );
                return RenderedMessage {
                    text,
                    keyboard: Some(back_only_keyboard()),
                };
            };
            RenderedMessage {
                text: V::download_message(title, label),
                keyboard: Some(keyboard),
            }
        }
        RenderIntent::ShowError { failure } => RenderedMessage {
            text: V::error_message(*failure),
            keyboard: None,
        },
    }
}

/// Button caption: `"<label> (<size> MB)"` with one decimal
#[must_use]
pub fn button_text(option: &ChoiceOption) -> String {
    format!("{} ({:.1} MB)", option.label, size_in_mb(option.size_bytes))
}

// ─────────────────────────────────────────────────────────────────────────────
// Keyboards
// ─────────────────────────────────────────────────────────────────────────────

/// One button per option, then Back
#[must_use]
pub fn choices_keyboard(options: &[ChoiceOption], has_back: bool) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = options
        .iter()
        .filter_map(|option| match option.payload() {
            Ok(payload) => Some(vec![InlineKeyboardButton::callback(
                button_text(option),
                payload,
            )]),
            Err(e) => {
                warn!(index = option.index, "Skipping format button: {e}");
                None
            }
        })
        .collect();
    if has_back {
        rows.extend(back_row());
    }
    InlineKeyboardMarkup::new(rows)
}

/// Download link button plus Back; `None` if `url` is not a valid URL
#[must_use]
pub fn download_keyboard(url: &str) -> Option<InlineKeyboardMarkup> {
    let url = Url::parse(url).ok()?;
    let mut rows = vec![vec![InlineKeyboardButton::url("Download", url)]];
    rows.extend(back_row());
    Some(InlineKeyboardMarkup::new(rows))
}

fn back_only_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(back_row())
}

fn back_row() -> Option<Vec<InlineKeyboardButton>> {
    match SelectionEvent::Back.encode() {
        Ok(payload) => Some(vec![InlineKeyboardButton::callback("Back", payload)]),
        Err(e) => {
            warn!("Skipping Back button: {e}");
            None
        }
    }
}
