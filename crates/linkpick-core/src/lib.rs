#![deny(missing_docs)]
//! linkpick core library.
//!
//! Turns a media URL into a ranked, liveness-checked set of downloadable
//! renditions and walks a conversation through picking one.

/// Configuration management.
pub mod config;
/// Conversation identity types.
pub mod identity;
/// Concurrent liveness filtering.
pub mod liveness;
/// Media data model.
pub mod media;
/// Conversation state machine and render intents.
pub mod navigation;
/// Reachability probing.
pub mod probe;
/// Extraction providers.
pub mod provider;
/// Format resolution with retries.
pub mod resolver;
/// Bounded retry policy.
pub mod retry;
/// Per-conversation selection session.
pub mod session;
/// Utility functions.
pub mod utils;

#[cfg(test)]
pub mod testing;

pub use identity::ConversationId;
pub use navigation::{NavigationController, NavigationState, Reply};
