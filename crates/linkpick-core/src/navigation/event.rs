//! Inbound events and the button payload codec.

use crate::identity::ConversationId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A button payload could not be encoded or decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The payload is not a recognised selection event
    #[error("Malformed button payload: {0}")]
    Malformed(String),
    /// The event could not be serialized
    #[error("Failed to encode button payload: {0}")]
    Encode(String),
}

/// What a button press asks for.
///
/// Encoded as compact JSON: `{"type":"format","id":2}` or `{"type":"back"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SelectionEvent {
    /// Pick the rendition at `index` on the visible page
    Format {
        /// Position on the page
        #[serde(rename = "id")]
        index: usize,
    },
    /// Reopen the choice page
    Back,
}

impl SelectionEvent {
    /// Serialize into a button payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkpick_core::navigation::SelectionEvent;
    /// let payload = SelectionEvent::Format { index: 3 }.encode().expect("encodable");
    /// assert_eq!(payload, r#"{"type":"format","id":3}"#);
    /// assert_eq!(SelectionEvent::decode(&payload), Ok(SelectionEvent::Format { index: 3 }));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String, EventError> {
        serde_json::to_string(self).map_err(|e| EventError::Encode(e.to_string()))
    }

    /// Parse a button payload.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Malformed`] for anything that is not a valid
    /// format or back event (bad JSON, unknown type, negative index, ...).
    pub fn decode(payload: &str) -> Result<Self, EventError> {
        serde_json::from_str(payload).map_err(|e| EventError::Malformed(e.to_string()))
    }
}

/// Event delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// The user sent text, expected to be a media URL
    UrlSubmitted {
        /// Conversation the text belongs to
        conversation_id: ConversationId,
        /// Raw message text
        text: String,
    },
    /// The user pressed an inline button
    ButtonPressed {
        /// Conversation the button belongs to
        conversation_id: ConversationId,
        /// Raw button payload
        payload: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_payload_shape() -> Result<(), EventError> {
        assert_eq!(SelectionEvent::Back.encode()?, r#"{"type":"back"}"#);
        Ok(())
    }

    #[test]
    fn test_decode_accepts_spaced_and_reordered_json() {
        assert_eq!(
            SelectionEvent::decode(r#"{"type": "format", "id": 0}"#),
            Ok(SelectionEvent::Format { index: 0 })
        );
        assert_eq!(
            SelectionEvent::decode(r#"{"id": 4, "type": "format"}"#),
            Ok(SelectionEvent::Format { index: 4 })
        );
        assert_eq!(
            SelectionEvent::decode(r#"{"type": "back"}"#),
            Ok(SelectionEvent::Back)
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for payload in [
            "",
            "back",
            "{",
            r#"{"type": "format"}"#,
            r#"{"type": "format", "id": -1}"#,
            r#"{"type": "format", "id": "2"}"#,
            r#"{"type": "download"}"#,
            r#"{"kind": "back"}"#,
        ] {
            assert!(
                matches!(SelectionEvent::decode(payload), Err(EventError::Malformed(_))),
                "payload {payload:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_payload_fits_telegram_callback_limit() -> Result<(), EventError> {
        // Telegram caps callback data at 64 bytes
        let payload = SelectionEvent::Format { index: usize::MAX }.encode()?;
        assert!(payload.len() <= 64);
        Ok(())
    }
}
