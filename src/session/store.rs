//! Browser-session storage.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::AgentRuntime;

use super::state::ChatSession;

/// A session shared between the handlers serving one browser.
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Thread-safe store mapping browser session ids to chat sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<String, SharedSession>>>,
}

impl SessionStore {
    /// Create a new session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `session` under a new id and return both.
    pub async fn insert(&self, session: ChatSession) -> (String, SharedSession) {
        let id = Uuid::new_v4().to_string();
        let shared = Arc::new(Mutex::new(session));
        self.inner
            .write()
            .await
            .insert(id.clone(), Arc::clone(&shared));
        (id, shared)
    }

    /// Get a session by id.
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.inner.read().await.get(id).cloned()
    }

    /// Resolve `id` to a session, bootstrapping a new one when it is missing
    /// or unknown.
    ///
    /// Returns the session id, the session, and whether it was created.
    pub async fn resolve(
        &self,
        id: Option<&str>,
        runtime: &dyn AgentRuntime,
    ) -> (String, SharedSession, bool) {
        if let Some(id) = id
            && let Some(session) = self.get(id).await
        {
            return (id.to_string(), session, false);
        }

        let session = ChatSession::bootstrap(runtime).await;
        let (id, shared) = self.insert(session).await;
        tracing::info!(session_id = %id, "Created chat session");
        (id, shared, true)
    }

    /// Remove a session by id.
    pub async fn remove(&self, id: &str) -> Option<SharedSession> {
        self.inner.write().await.remove(id)
    }

    /// Get the number of active sessions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if there are no sessions.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
