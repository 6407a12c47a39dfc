//! Threadchat
//!
//! A single-page chat UI that streams replies from an external agent runtime
//! and lets the user switch between persisted conversation threads.
//!
//! # Architecture
//!
//! - **Server**: Axum-based HTTP server with SSE streaming
//! - **Agent runtime**: LangGraph REST driver plus an in-process scripted runtime
//! - **Sessions**: per-browser thread registry and message list, cookie scoped
//! - **UI**: server-rendered HTML with a small streaming script
//!
//! # Modules
//!
//! - [`agent`]: runtime trait, wire types and drivers
//! - [`session`]: thread registry, chat session state and session store
//! - [`turn`]: streaming one user turn through the runtime
//! - [`events`]: streaming event model and SSE framing
//! - [`ui`]: HTML rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod turn;
pub mod ui;

use std::sync::Arc;

use crate::agent::AgentRuntime;
use crate::config::AppConfig;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Browser sessions keyed by cookie id.
    pub sessions: SessionStore,
    /// Agent runtime serving turns and thread history.
    pub runtime: Arc<dyn AgentRuntime>,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .field("config", &self.config)
            .finish()
    }
}
