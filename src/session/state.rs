//! Per-browser chat session state.

use uuid::Uuid;

use crate::agent::{AgentRuntime, RunConfig};
use crate::error::{ChatError, Result};

use super::message::{ChatMessage, title_from};
use super::registry::{NEW_THREAD_TITLE, OLD_THREAD_TITLE, ThreadRegistry};

/// A user turn recorded but not yet sent to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTurn {
    /// Thread the turn belongs to.
    pub thread_id: String,
    /// User input to forward.
    pub input: String,
}

/// State of one browser session: the active thread, its displayed messages,
/// and every thread known to the session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    thread_id: String,
    messages: Vec<ChatMessage>,
    threads: ThreadRegistry,
    pending: Option<PendingTurn>,
}

impl ChatSession {
    /// Create a session seeded with previously known thread ids.
    ///
    /// Known ids are registered as old conversations, then a fresh thread is
    /// started and made active.
    pub fn new<I, S>(known_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut threads = ThreadRegistry::new();
        for id in known_ids {
            threads.register(id, OLD_THREAD_TITLE);
        }

        let mut session = Self {
            thread_id: String::new(),
            messages: Vec::new(),
            threads,
            pending: None,
        };
        session.new_chat();
        session
    }

    /// Create a session seeded from the runtime's thread list.
    ///
    /// A failing listing still yields a usable session.
    pub async fn bootstrap(runtime: &dyn AgentRuntime) -> Self {
        match runtime.list_all_thread_ids().await {
            Ok(ids) => {
                tracing::debug!(known_threads = ids.len(), "Seeding session from runtime");
                Self::new(ids)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list agent threads, starting empty");
                Self::new(Vec::<String>::new())
            }
        }
    }

    /// Id of the active thread.
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Messages of the active thread.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Threads known to this session.
    #[must_use]
    pub fn threads(&self) -> &ThreadRegistry {
        &self.threads
    }

    /// Title of the active thread.
    #[must_use]
    pub fn active_title(&self) -> &str {
        self.threads
            .get(&self.thread_id)
            .map_or(NEW_THREAD_TITLE, |entry| entry.title.as_str())
    }

    /// Whether a turn is waiting to be streamed.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a new chat on a fresh thread id and return that id.
    pub fn new_chat(&mut self) -> &str {
        let mut id = Uuid::new_v4().to_string();
        while self.threads.contains(&id) {
            id = Uuid::new_v4().to_string();
        }
        self.threads.register(id.clone(), NEW_THREAD_TITLE);
        self.thread_id = id;
        self.messages.clear();
        self.pending = None;
        &self.thread_id
    }

    /// Make `thread_id` active and show `history`.
    ///
    /// The thread is registered first so the active id always has a registry
    /// entry.
    pub fn open_thread(&mut self, thread_id: impl Into<String>, history: Vec<ChatMessage>) {
        let thread_id = thread_id.into();
        self.threads.register(thread_id.clone(), OLD_THREAD_TITLE);
        self.thread_id = thread_id;
        self.messages = history;
        self.pending = None;
    }

    /// Empty the message list. The thread stays registered.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.pending = None;
    }

    /// Record user input and queue it for streaming.
    ///
    /// When the message list was empty, the thread is retitled from the
    /// input. Only one turn may wait for its stream at a time.
    pub fn begin_turn(&mut self, input: &str) -> Result<&ChatMessage> {
        if input.trim().is_empty() {
            return Err(ChatError::InvalidInput("message cannot be empty".into()));
        }
        if self.pending.is_some() {
            return Err(ChatError::InvalidInput(
                "a reply is still pending for the previous message".into(),
            ));
        }

        let first = self.messages.is_empty();
        self.messages.push(ChatMessage::user(input));
        if first {
            self.threads.set_title(&self.thread_id, title_from(input));
        }
        self.pending = Some(PendingTurn {
            thread_id: self.thread_id.clone(),
            input: input.to_string(),
        });

        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Take the queued turn, if any.
    pub fn take_pending(&mut self) -> Option<PendingTurn> {
        self.pending.take()
    }

    /// Append the finished assistant reply.
    ///
    /// Replies for a thread that is no longer active are dropped; the runtime
    /// already stores them and they reappear when the thread is reopened.
    pub fn complete_turn(&mut self, thread_id: &str, content: String) -> Option<ChatMessage> {
        if thread_id != self.thread_id {
            tracing::debug!(
                thread_id = %thread_id,
                active_thread_id = %self.thread_id,
                "Dropping reply for inactive thread"
            );
            return None;
        }
        let message = ChatMessage::assistant(content);
        self.messages.push(message.clone());
        Some(message)
    }

    /// Pretty-printed JSON export of the message list.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.messages)?)
    }
}

/// Fetch the stored history of `thread_id` as display messages.
pub async fn load_conversation(
    runtime: &dyn AgentRuntime,
    thread_id: &str,
) -> Result<Vec<ChatMessage>> {
    let state = runtime.get_state(&RunConfig::for_thread(thread_id)).await?;
    let messages = state.messages()?;
    Ok(messages.iter().map(ChatMessage::from_agent).collect())
}
