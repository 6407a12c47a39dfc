//! Session state and conversation thread management.
//!
//! Each browser gets its own [`ChatSession`]: the active thread, the messages
//! shown for it, and the registry of threads known to that browser. Sessions
//! live only in memory; durable history belongs to the agent runtime.
//!
//! # Architecture
//!
//! - [`ChatMessage`]: a displayed message with its role and `HH:MM` time
//! - [`ThreadRegistry`]: unique `{id, title}` entries in insertion order
//! - [`ChatSession`]: state transitions (new chat, select, clear, turns)
//! - [`SessionStore`]: thread-safe map of browser sessions
//!
//! # Example
//!
//! ```rust
//! use threadchat::session::ChatSession;
//!
//! let mut session = ChatSession::new(Vec::<String>::new());
//! session.begin_turn("Hello!").unwrap();
//!
//! assert_eq!(session.messages().len(), 1);
//! assert_eq!(session.active_title(), "Hello!");
//! ```

mod message;
mod registry;
mod state;
mod store;

pub use message::{ChatMessage, Role, TITLE_MAX_CHARS, clock_time, title_from};
pub use registry::{NEW_THREAD_TITLE, OLD_THREAD_TITLE, ThreadEntry, ThreadRegistry};
pub use state::{ChatSession, PendingTurn, load_conversation};
pub use store::{SessionStore, SharedSession};
