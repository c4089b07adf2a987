//! Render intents emitted by the navigation controller.
//!
//! Intents are transport-neutral: no markup, no keyboards. Each transport
//! decides how a choice list or a download link looks.

use super::event::{EventError, SelectionEvent};
use crate::media::Rendition;
use crate::session::SelectionSession;

/// One selectable entry on the choice page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    /// Position on the page
    pub index: usize,
    /// Rendition label
    pub label: String,
    /// Rendition size in bytes
    pub size_bytes: u64,
}

impl ChoiceOption {
    fn from_rendition(index: usize, rendition: &Rendition) -> Self {
        Self {
            index,
            label: rendition.label.clone(),
            size_bytes: rendition.size_bytes,
        }
    }

    /// Button payload that selects this option
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Encode`] if the payload cannot be serialized.
    pub fn payload(&self) -> Result<String, EventError> {
        SelectionEvent::Format { index: self.index }.encode()
    }
}

/// Inline notice shown above a re-rendered choice page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The previous pick stopped answering between listing and click
    PickExpired,
}

impl Notice {
    /// Plain-text notice
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::PickExpired => {
                "The selected format is not available anymore. Please choose a different one."
            }
        }
    }
}

/// User-visible failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Provider query failed after all retries
    Extraction,
    /// Resolution failed at the network layer
    NetworkUnavailable,
    /// Liveness filtering removed every rendition
    NoReachableFormats,
    /// Stale or out-of-range pick
    PickExpired,
    /// Undecodable button payload
    MalformedEvent,
    /// Message text is not an http(s) URL
    InvalidUrl,
}

impl FailureKind {
    /// Plain-text message for the user
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Extraction => {
                "Could not get formats for this link. Please try again with a different URL or contact the bot administrator."
            }
            Self::NetworkUnavailable => {
                "Network error occurred while fetching the video information. Please try again."
            }
            Self::NoReachableFormats => "No downloadable formats are available for this link.",
            Self::PickExpired => "Sorry, that format is no longer available.",
            Self::MalformedEvent => {
                "An error occurred. Please try again or contact the bot administrator."
            }
            Self::InvalidUrl => "Please send a link starting with http:// or https://.",
        }
    }
}

/// What the transport should show next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderIntent {
    /// The choice page
    ShowChoices {
        /// Media title
        title: String,
        /// Options on the page, in order
        options: Vec<ChoiceOption>,
        /// Whether a Back button accompanies the options
        has_back: bool,
        /// Optional notice shown above the options
        notice: Option<Notice>,
    },
    /// The final direct link
    ShowDownloadLink {
        /// Media title
        title: String,
        /// Chosen rendition label
        label: String,
        /// Direct media link
        url: String,
    },
    /// A failure message
    ShowError {
        /// Failure category
        failure: FailureKind,
    },
}

impl RenderIntent {
    /// Choice page for `session`
    #[must_use]
    pub fn choices(session: &SelectionSession, notice: Option<Notice>) -> Self {
        let options: Vec<ChoiceOption> = session
            .page()
            .iter()
            .enumerate()
            .map(|(index, rendition)| ChoiceOption::from_rendition(index, rendition))
            .collect();
        Self::ShowChoices {
            title: session.title().to_string(),
            has_back: !options.is_empty(),
            options,
            notice,
        }
    }

    /// Download affordance for a chosen rendition
    #[must_use]
    pub fn download(title: &str, rendition: &Rendition) -> Self {
        Self::ShowDownloadLink {
            title: title.to_string(),
            label: rendition.label.clone(),
            url: rendition.url.clone(),
        }
    }

    /// Failure message
    #[must_use]
    pub const fn error(failure: FailureKind) -> Self {
        Self::ShowError { failure }
    }
}
