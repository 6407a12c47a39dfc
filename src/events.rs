//! Streaming events sent to the chat page.
//!
//! A turn is delivered to the browser as Server-Sent Events. Each
//! [`ChatEvent`] carries one step of the turn: its start, a reply fragment,
//! the finished assistant message, an error, or the end of the stream.
//!
//! # Example
//!
//! ```rust
//! use threadchat::events::{ChatEvent, sse_event};
//!
//! let event = ChatEvent::MessageDelta {
//!     text: "Hello".to_string(),
//! };
//! let sse = sse_event(&event);
//! assert!(sse.contains("message.delta"));
//! ```

use serde::{Deserialize, Serialize};

use crate::session::ChatMessage;

/// Events emitted while a turn streams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// The agent call for a turn is starting.
    #[serde(rename = "turn.start")]
    TurnStart {
        /// Thread the turn runs on.
        thread_id: String,
    },

    /// A reply fragment to append to the live bubble.
    #[serde(rename = "message.delta")]
    MessageDelta {
        /// The text fragment.
        text: String,
    },

    /// The full assistant message appended to the session.
    #[serde(rename = "message.complete")]
    MessageComplete {
        /// The stored message.
        message: ChatMessage,
    },

    /// The turn failed.
    #[serde(rename = "error")]
    Error {
        /// Error message.
        message: String,
    },

    /// Stream has ended.
    #[serde(rename = "done")]
    Done,
}

/// Get the SSE event name for a [`ChatEvent`].
pub fn event_name(evt: &ChatEvent) -> &'static str {
    match evt {
        ChatEvent::TurnStart { .. } => "turn.start",
        ChatEvent::MessageDelta { .. } => "message.delta",
        ChatEvent::MessageComplete { .. } => "message.complete",
        ChatEvent::Error { .. } => "error",
        ChatEvent::Done => "done",
    }
}

/// Convert a [`ChatEvent`] to an SSE-formatted string.
///
/// The output carries an `event:` line for `EventSource` listeners and a
/// `data:` line with the JSON payload.
pub fn sse_event(evt: &ChatEvent) -> String {
    let json = serde_json::to_string(evt).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "data": { "message": e.to_string() } }).to_string()
    });

    let event_name = event_name(evt);

    format!("event: {event_name}\ndata: {json}\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_serialization() {
        let event = ChatEvent::MessageDelta {
            text: "Hello".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"message.delta","data":{"text":"Hello"}}"#);
    }

    #[test]
    fn test_sse_event_format() {
        let sse = sse_event(&ChatEvent::Done);
        assert!(sse.starts_with("event: done\n"));
        assert!(sse.contains("data: "));
        assert!(sse.ends_with("\n\n"));
    }

    #[test]
    fn test_error_event_name() {
        let event = ChatEvent::Error {
            message: "agent unreachable".to_string(),
        };
        assert_eq!(event_name(&event), "error");
        assert!(sse_event(&event).contains("agent unreachable"));
    }
}
