//! External agent runtime contract.
//!
//! The chat UI never reasons about conversations itself. Replies, memory and
//! durable per-thread history all live in an agent runtime reached through the
//! narrow [`AgentRuntime`] trait:
//!
//! - [`AgentRuntime::stream`]: run one turn and stream reply fragments
//! - [`AgentRuntime::get_state`]: fetch the stored state of a thread
//! - [`AgentRuntime::list_all_thread_ids`]: enumerate known threads
//!
//! # Runtimes
//!
//! - [`LangGraphRuntime`]: LangGraph server REST API over HTTP
//! - [`ScriptedRuntime`]: in-process runtime with canned replies
//!
//! # Example
//!
//! ```rust
//! use threadchat::agent::{AgentMessage, MessageKind, TurnRequest};
//!
//! let request = TurnRequest::human("Hello!");
//! assert_eq!(request.messages[0].kind, MessageKind::Human);
//! assert_eq!(request.messages[0].content.as_text(), "Hello!");
//! ```

pub mod langgraph;
pub mod scripted;

pub use langgraph::{AgentSettings, LangGraphRuntime};
pub use scripted::ScriptedRuntime;

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Run name attached to every turn sent to the runtime.
pub const TURN_RUN_NAME: &str = "chat_turn";

/// Stream of reply fragments produced by a single turn.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Type tag of a message stored by the agent runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Message written by the human user.
    Human,
    /// Message produced by the model.
    Ai,
    /// System instruction.
    System,
    /// Tool output.
    Tool,
    /// Any tag this UI does not know about.
    #[serde(other)]
    Other,
}

/// One typed content part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part type, e.g. `text` or `image_url`. Empty when the part has none.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Text payload for `text` parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// One entry of a content list: a bare string or a structured part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentItem {
    /// Bare string entry, always text.
    Text(String),
    /// Structured part.
    Part(ContentPart),
    /// Anything else the runtime sends.
    Other(serde_json::Value),
}

impl ContentItem {
    fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Part(part) if part.kind.is_empty() || part.kind == "text" => {
                part.text.as_deref()
            }
            Self::Part(_) | Self::Other(_) => None,
        }
    }
}

/// Message content as stored by the runtime: a string or a list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgentContent {
    /// Plain text content.
    Text(String),
    /// Multi-part content.
    Parts(Vec<ContentItem>),
    /// Content of an unexpected shape; carries no text.
    Other(serde_json::Value),
}

impl AgentContent {
    /// Flatten the content to text, concatenating all text items.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(items) => items.iter().filter_map(ContentItem::text).collect(),
            Self::Other(_) => String::new(),
        }
    }
}

impl Default for AgentContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for AgentContent {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for AgentContent {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A role-tagged message as exchanged with the agent runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Type tag (`human`, `ai`, ...).
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Message content.
    #[serde(default)]
    pub content: AgentContent,
}

impl AgentMessage {
    /// Create a human message.
    #[must_use]
    pub fn human(content: impl Into<AgentContent>) -> Self {
        Self {
            kind: MessageKind::Human,
            content: content.into(),
        }
    }

    /// Create an AI message.
    #[must_use]
    pub fn ai(content: impl Into<AgentContent>) -> Self {
        Self {
            kind: MessageKind::Ai,
            content: content.into(),
        }
    }
}

/// Input for one conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRequest {
    /// New messages to append to the thread before the run.
    pub messages: Vec<AgentMessage>,
}

impl TurnRequest {
    /// A turn carrying a single human message.
    #[must_use]
    pub fn human(content: impl Into<AgentContent>) -> Self {
        Self {
            messages: vec![AgentMessage::human(content)],
        }
    }
}

/// Per-call configuration identifying the thread a call applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Thread the call is scoped to.
    pub thread_id: String,
    /// Run name reported to the runtime.
    pub run_name: String,
}

impl RunConfig {
    /// Configuration for a chat turn on `thread_id`.
    #[must_use]
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_name: TURN_RUN_NAME.to_string(),
        }
    }

    /// `configurable` block sent to the runtime.
    #[must_use]
    pub fn configurable(&self) -> serde_json::Value {
        serde_json::json!({ "thread_id": self.thread_id })
    }

    /// Run metadata sent to the runtime.
    #[must_use]
    pub fn metadata(&self) -> serde_json::Value {
        serde_json::json!({
            "thread_id": self.thread_id,
            "run_name": self.run_name,
        })
    }
}

/// Stored state of a thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadState {
    /// Channel values of the thread's graph state.
    #[serde(default)]
    pub values: serde_json::Map<String, serde_json::Value>,
}

impl ThreadState {
    /// State whose `messages` channel holds `messages`.
    pub fn with_messages(messages: &[AgentMessage]) -> Result<Self> {
        let mut values = serde_json::Map::new();
        values.insert("messages".to_string(), serde_json::to_value(messages)?);
        Ok(Self { values })
    }

    /// Decode the `messages` channel. A missing channel is an empty history.
    pub fn messages(&self) -> Result<Vec<AgentMessage>> {
        match self.values.get("messages") {
            Some(value) => Ok(Vec::<AgentMessage>::deserialize(value)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Narrow contract to the external agent runtime.
#[async_trait::async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Run one turn and stream the reply as text fragments.
    ///
    /// # Errors
    ///
    /// Returns an error if the run cannot be started. Failures after the
    /// first fragment surface as `Err` items on the stream.
    async fn stream(&self, request: TurnRequest, config: &RunConfig) -> Result<FragmentStream>;

    /// Fetch the stored state of the configured thread.
    ///
    /// Unknown threads yield an empty [`ThreadState`].
    async fn get_state(&self, config: &RunConfig) -> Result<ThreadState>;

    /// List the ids of every thread the runtime knows.
    async fn list_all_thread_ids(&self) -> Result<Vec<String>>;
}
