//! Thread sidebar.

use std::fmt::Write;

use crate::session::ChatSession;

use super::{escape_html, path_segment};

/// Render the sidebar: app title, "New Chat", and one button per known
/// thread, newest first. The active thread is highlighted.
pub fn render_sidebar(session: &ChatSession) -> String {
    let mut threads = String::new();
    for entry in session.threads().newest_first() {
        let active = if entry.id == session.thread_id() {
            " active"
        } else {
            ""
        };
        let _ = write!(
            threads,
            r#"<form method="post" action="/threads/{path}/select"><button type="submit" class="thread-button{active}" title="{id}">{title}</button></form>"#,
            path = path_segment(&entry.id),
            id = escape_html(&entry.id),
            title = escape_html(&entry.title),
        );
    }

    format!(
        r#"<aside class="sidebar">
  <h1>LangGraph Chatbot</h1>
  <form method="post" action="/threads/new"><button type="submit" class="new-chat">➕ New Chat</button></form>
  <h2>My Conversations</h2>
  <nav class="thread-list">{threads}</nav>
</aside>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threads_listed_newest_first() {
        let session = ChatSession::new(vec!["older", "old"]);
        let html = render_sidebar(&session);

        let active = html.find(session.thread_id()).unwrap();
        let old = html.find(r#"title="old""#).unwrap();
        let older = html.find(r#"title="older""#).unwrap();
        assert!(active < old && old < older);
        assert_eq!(html.matches("thread-button active").count(), 1);
        assert!(html.contains("New Chat"));
        assert!(html.contains("My Conversations"));
    }

    #[test]
    fn test_titles_are_escaped() {
        let mut session = ChatSession::new(Vec::<String>::new());
        session.begin_turn("<i>hello</i>").unwrap();
        let html = render_sidebar(&session);
        assert!(html.contains("&lt;i&gt;hello&lt;/i&gt;"));
    }
}
