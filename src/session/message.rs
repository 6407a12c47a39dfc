//! Display messages and thread titles.

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentMessage, MessageKind};

/// Maximum number of characters kept when deriving a title.
pub const TITLE_MAX_CHARS: usize = 40;

/// Display role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user.
    User,
    /// Reply from the agent.
    Assistant,
}

impl Role {
    /// Map an agent message kind to a display role.
    ///
    /// Only human messages are shown as the user; everything else the runtime
    /// stores (AI, tool, system output) renders as the assistant.
    #[must_use]
    pub fn from_kind(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Human => Self::User,
            _ => Self::Assistant,
        }
    }

    /// Lowercase role name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A message as shown in the chat pane and exported by "Download Chat".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display role.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Local `HH:MM` the message was created, empty when reloaded.
    #[serde(default)]
    pub time: String,
}

impl ChatMessage {
    /// A user message stamped with the current time.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            time: clock_time(),
        }
    }

    /// An assistant message stamped with the current time.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            time: clock_time(),
        }
    }

    /// Rebuild a display message from runtime state. Time is not stored
    /// externally, so it is left empty.
    #[must_use]
    pub fn from_agent(message: &AgentMessage) -> Self {
        Self {
            role: Role::from_kind(message.kind),
            content: message.content.as_text(),
            time: String::new(),
        }
    }
}

/// Current local time as `HH:MM`.
#[must_use]
pub fn clock_time() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Derive a thread title from the first user message.
///
/// Inputs longer than [`TITLE_MAX_CHARS`] characters are cut and suffixed
/// with `...`.
///
/// ```rust
/// use threadchat::session::title_from;
///
/// assert_eq!(title_from("short"), "short");
/// assert_eq!(title_from(&"x".repeat(41)), format!("{}...", "x".repeat(40)));
/// ```
#[must_use]
pub fn title_from(input: &str) -> String {
    if input.chars().count() > TITLE_MAX_CHARS {
        let head: String = input.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        input.to_string()
    }
}
