//! In-process agent runtime with scripted replies.
//!
//! Useful for running the UI without a LangGraph server and for tests. The
//! runtime keeps per-thread history in memory, so reloading a thread behaves
//! like a real runtime.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::{ChatError, Result};

use super::{
    AgentMessage, AgentRuntime, FragmentStream, MessageKind, RunConfig, ThreadState, TurnRequest,
};

/// How the scripted runtime answers a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    /// Echo the user input back.
    Echo,
    /// Always answer with the same text.
    Fixed(String),
    /// Emit the first fragment of an echo, then fail with the message.
    FailMidStream(String),
    /// Refuse to start the run.
    FailToStart(String),
}

#[derive(Debug, Default)]
struct Threads {
    order: Vec<String>,
    messages: HashMap<String, Vec<AgentMessage>>,
}

impl Threads {
    fn entry(&mut self, id: &str) -> &mut Vec<AgentMessage> {
        if !self.messages.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.messages.entry(id.to_string()).or_default()
    }
}

/// Agent runtime that answers from a [`Script`].
#[derive(Debug, Clone)]
pub struct ScriptedRuntime {
    script: Script,
    threads: Arc<RwLock<Threads>>,
}

impl Default for ScriptedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedRuntime {
    /// Create an echoing runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_script(Script::Echo)
    }

    /// Create a runtime answering from `script`.
    #[must_use]
    pub fn with_script(script: Script) -> Self {
        Self {
            script,
            threads: Arc::new(RwLock::new(Threads::default())),
        }
    }

    /// Create a runtime that always replies with `reply`.
    #[must_use]
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self::with_script(Script::Fixed(reply.into()))
    }

    /// Store `messages` as the history of `thread_id`.
    pub async fn seed_thread(&self, thread_id: impl Into<String>, messages: Vec<AgentMessage>) {
        let thread_id = thread_id.into();
        let mut guard = self.threads.write().await;
        *guard.entry(&thread_id) = messages;
    }

    /// History stored for `thread_id`.
    pub async fn history(&self, thread_id: &str) -> Vec<AgentMessage> {
        self.threads
            .read()
            .await
            .messages
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    fn reply_for(&self, input: &str) -> String {
        match &self.script {
            Script::Fixed(reply) => reply.clone(),
            Script::Echo | Script::FailMidStream(_) | Script::FailToStart(_) => {
                format!("You said: {input}")
            }
        }
    }
}

/// Split a reply into word-sized fragments, keeping separators.
fn fragments(reply: &str) -> Vec<String> {
    reply.split_inclusive(' ').map(ToString::to_string).collect()
}

#[async_trait::async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn stream(&self, request: TurnRequest, config: &RunConfig) -> Result<FragmentStream> {
        if let Script::FailToStart(message) = &self.script {
            return Err(ChatError::Agent {
                status: 503,
                message: message.clone(),
            });
        }

        let input: String = request
            .messages
            .iter()
            .filter(|m| m.kind == MessageKind::Human)
            .map(|m| m.content.as_text())
            .collect::<Vec<_>>()
            .join("\n");

        {
            let mut guard = self.threads.write().await;
            guard.entry(&config.thread_id).extend(request.messages);
        }

        let reply = self.reply_for(&input);
        let parts = fragments(&reply);
        let failure = match &self.script {
            Script::FailMidStream(message) => Some(message.clone()),
            _ => None,
        };
        let threads = Arc::clone(&self.threads);
        let thread_id = config.thread_id.clone();

        let out = async_stream::try_stream! {
            for (idx, part) in parts.into_iter().enumerate() {
                if idx == 1 {
                    if let Some(message) = &failure {
                        Err::<(), _>(ChatError::Stream(message.clone()))?;
                    }
                }
                yield part;
            }
            threads.write().await.entry(&thread_id).push(AgentMessage::ai(reply));
        };

        Ok(Box::pin(out))
    }

    async fn get_state(&self, config: &RunConfig) -> Result<ThreadState> {
        let guard = self.threads.read().await;
        match guard.messages.get(&config.thread_id) {
            Some(messages) => ThreadState::with_messages(messages),
            None => Ok(ThreadState::default()),
        }
    }

    async fn list_all_thread_ids(&self) -> Result<Vec<String>> {
        Ok(self.threads.read().await.order.clone())
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_echo_streams_fragments_and_records_history() {
        let rt = ScriptedRuntime::new();
        let config = RunConfig::for_thread("t1");
        let stream = rt.stream(TurnRequest::human("hi there"), &config).await.unwrap();
        let parts: Vec<String> = stream.map(|r| r.unwrap()).collect().await;

        assert_eq!(parts, vec!["You ", "said: ", "hi ", "there"]);
        assert_eq!(parts.concat(), "You said: hi there");

        let history = rt.get_state(&config).await.unwrap().messages().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, MessageKind::Human);
        assert_eq!(history[1].content.as_text(), "You said: hi there");
        assert_eq!(rt.list_all_thread_ids().await.unwrap(), vec!["t1"]);
    }

    #[tokio::test]
    async fn test_fail_mid_stream() {
        let rt = ScriptedRuntime::with_script(Script::FailMidStream("lost".into()));
        let config = RunConfig::for_thread("t1");
        let items: Vec<Result<String>> = rt
            .stream(TurnRequest::human("a b"), &config)
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "You ");
        assert!(matches!(items[1], Err(ChatError::Stream(_))));
        assert_eq!(rt.history("t1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_thread_is_empty() {
        let rt = ScriptedRuntime::new();
        let state = rt.get_state(&RunConfig::for_thread("missing")).await.unwrap();
        assert!(state.messages().unwrap().is_empty());
    }
}
