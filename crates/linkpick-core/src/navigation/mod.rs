//! Navigation state machine
//!
//! Drives one conversation from a submitted URL to a direct download link:
//!
//! ```text
//! Idle --URL--> AwaitingResolution --ok--> PresentingChoices --pick ok--> Finalized
//!                        |                   |   ^      |
//!                        +--error--> Failed  |   +-Back-+ (also after an expired pick)
//!                                            +--stale pick--> Failed
//! ```
//!
//! `Failed` is the outcome of the event that failed; the conversation is
//! stored back as `Idle`. `Finalized` keeps its session, so Back and new
//! picks keep working until the next URL. A URL always restarts resolution.
//!
//! Events for one conversation must be delivered one at a time; different
//! conversations are handled concurrently.

/// Inbound events and the button payload codec
pub mod event;
/// Transport-neutral render intents
pub mod render;

pub use event::{EventError, InboundEvent, SelectionEvent};
pub use render::{ChoiceOption, FailureKind, Notice, RenderIntent};

use crate::config::ResolverSettings;
use crate::identity::ConversationId;
use crate::liveness::LivenessFilter;
use crate::resolver::{FormatResolver, ResolveError};
use crate::session::SelectionSession;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Where a conversation stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationState {
    /// Waiting for a URL
    #[default]
    Idle,
    /// Resolving and probing a submitted URL
    AwaitingResolution,
    /// The choice page is on screen
    PresentingChoices,
    /// A download link was handed out
    Finalized,
    /// The last event failed
    Failed,
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// State reached by this event
    pub state: NavigationState,
    /// What to show
    pub intent: RenderIntent,
}

#[derive(Debug, Clone, Default)]
struct Conversation {
    state: NavigationState,
    session: Option<Arc<SelectionSession>>,
}

/// Owns every conversation's state and selection session
#[derive(Clone)]
pub struct NavigationController {
    resolver: FormatResolver,
    liveness: LivenessFilter,
    conversations: Cache<ConversationId, Conversation>,
}

impl NavigationController {
    /// Create a controller; conversations idle for `session_ttl` are forgotten.
    #[must_use]
    pub fn new(
        resolver: FormatResolver,
        liveness: LivenessFilter,
        session_ttl: Duration,
        max_conversations: u64,
    ) -> Self {
        let conversations = Cache::builder()
            .max_capacity(max_conversations)
            .time_to_idle(session_ttl)
            .build();
        Self {
            resolver,
            liveness,
            conversations,
        }
    }

    /// Create a controller with the session limits from `settings`
    #[must_use]
    pub fn from_settings(
        resolver: FormatResolver,
        liveness: LivenessFilter,
        settings: &ResolverSettings,
    ) -> Self {
        Self::new(
            resolver,
            liveness,
            settings.session_ttl(),
            settings.session_max_capacity,
        )
    }

    /// Handle one inbound event. Never fails: errors become render intents.
    pub async fn handle(&self, event: InboundEvent) -> Reply {
        match event {
            InboundEvent::UrlSubmitted {
                conversation_id,
                text,
            } => self.submit_url(conversation_id, &text).await,
            InboundEvent::ButtonPressed {
                conversation_id,
                payload,
            } => self.press_button(conversation_id, &payload).await,
        }
    }

    /// Resolve a submitted URL and present its reachable renditions.
    ///
    /// Any previous session of the conversation is discarded first.
    pub async fn submit_url(&self, conversation_id: ConversationId, text: &str) -> Reply {
        let url = text.trim();
        if !is_http_url(url) {
            info!(conversation_id = %conversation_id, "Ignoring non-URL text");
            return Reply {
                state: self.state(conversation_id).await,
                intent: RenderIntent::error(FailureKind::InvalidUrl),
            };
        }

        info!(conversation_id = %conversation_id, "Resolving submitted URL");
        self.store(conversation_id, NavigationState::AwaitingResolution, None)
            .await;

        let media = match self.resolver.resolve(url).await {
            Ok(media) => media,
            Err(e) => {
                let failure = match e {
                    ResolveError::NetworkUnavailable { .. } => FailureKind::NetworkUnavailable,
                    ResolveError::Extraction { .. } => FailureKind::Extraction,
                };
                return self.fail(conversation_id, failure).await;
            }
        };

        let (title, renditions) = media.into_parts();
        let reachable = self.liveness.filter_reachable(renditions).await;
        if reachable.is_empty() {
            return self
                .fail(conversation_id, FailureKind::NoReachableFormats)
                .await;
        }

        let session = Arc::new(SelectionSession::new(title, reachable));
        let intent = RenderIntent::choices(&session, None);
        self.store(
            conversation_id,
            NavigationState::PresentingChoices,
            Some(session),
        )
        .await;
        Reply {
            state: NavigationState::PresentingChoices,
            intent,
        }
    }

    /// Apply a button press to the conversation's session.
    pub async fn press_button(&self, conversation_id: ConversationId, payload: &str) -> Reply {
        let event = match SelectionEvent::decode(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!(conversation_id = %conversation_id, "{e}");
                return Reply {
                    state: self.state(conversation_id).await,
                    intent: RenderIntent::error(FailureKind::MalformedEvent),
                };
            }
        };

        let Some(session) = self.session(conversation_id).await else {
            info!(conversation_id = %conversation_id, "Button pressed without a session");
            return self.fail(conversation_id, FailureKind::PickExpired).await;
        };

        match event {
            SelectionEvent::Back => self.present(conversation_id, session, None).await,
            SelectionEvent::Format { index } => {
                self.pick(conversation_id, session, index).await
            }
        }
    }

    async fn pick(
        &self,
        conversation_id: ConversationId,
        session: Arc<SelectionSession>,
        index: usize,
    ) -> Reply {
        let rendition = match session.select(index) {
            Ok(rendition) => rendition.clone(),
            Err(e) => {
                warn!(conversation_id = %conversation_id, "{e}");
                return self.fail(conversation_id, FailureKind::PickExpired).await;
            }
        };

        if !self.liveness.is_reachable(&rendition).await {
            return self
                .present(conversation_id, session, Some(Notice::PickExpired))
                .await;
        }

        info!(
            conversation_id = %conversation_id,
            format_id = %rendition.id,
            "Handing out download link"
        );
        let intent = RenderIntent::download(session.title(), &rendition);
        self.store(conversation_id, NavigationState::Finalized, Some(session))
            .await;
        Reply {
            state: NavigationState::Finalized,
            intent,
        }
    }

    async fn present(
        &self,
        conversation_id: ConversationId,
        session: Arc<SelectionSession>,
        notice: Option<Notice>,
    ) -> Reply {
        let intent = RenderIntent::choices(&session, notice);
        self.store(
            conversation_id,
            NavigationState::PresentingChoices,
            Some(session),
        )
        .await;
        Reply {
            state: NavigationState::PresentingChoices,
            intent,
        }
    }

    async fn fail(&self, conversation_id: ConversationId, failure: FailureKind) -> Reply {
        info!(conversation_id = %conversation_id, ?failure, "Conversation back to idle");
        self.store(conversation_id, NavigationState::Idle, None).await;
        Reply {
            state: NavigationState::Failed,
            intent: RenderIntent::error(failure),
        }
    }

    async fn store(
        &self,
        conversation_id: ConversationId,
        state: NavigationState,
        session: Option<Arc<SelectionSession>>,
    ) {
        self.conversations
            .insert(conversation_id, Conversation { state, session })
            .await;
    }

    /// Current state of a conversation (`Idle` if unknown)
    pub async fn state(&self, conversation_id: ConversationId) -> NavigationState {
        self.conversations
            .get(&conversation_id)
            .await
            .map(|conversation| conversation.state)
            .unwrap_or_default()
    }

    /// Current selection session of a conversation
    pub async fn session(&self, conversation_id: ConversationId) -> Option<Arc<SelectionSession>> {
        self.conversations
            .get(&conversation_id)
            .await
            .and_then(|conversation| conversation.session)
    }

    /// Forget a conversation; it starts over at `Idle`
    pub async fn reset(&self, conversation_id: ConversationId) {
        self.conversations.invalidate(&conversation_id).await;
    }

    /// Number of conversations currently tracked
    pub async fn active_conversations(&self) -> u64 {
        self.conversations.run_pending_tasks().await;
        self.conversations.entry_count()
    }
}

/// Whether `text` is an absolute http(s) URL
fn is_http_url(text: &str) -> bool {
    reqwest::Url::parse(text)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}
