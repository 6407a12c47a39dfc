//! Chat bubbles.

use crate::session::{ChatMessage, Role};

use super::escape_html;

/// Render one message as a chat bubble.
///
/// User bubbles sit on the right, assistant bubbles on the left. Messages
/// loaded from the runtime have no time, so their timestamp line is empty.
pub fn render_bubble(message: &ChatMessage) -> String {
    let (side, class) = match message.role {
        Role::User => ("right", "user-bubble"),
        Role::Assistant => ("left", "assistant-bubble"),
    };
    format!(
        r#"<div class="chat-row {side}"><div class="chat-bubble {class}" data-role="{role}"><div class="content">{content}</div><div class="timestamp">{time}</div></div></div>"#,
        role = message.role.as_str(),
        content = escape_html(&message.content),
        time = escape_html(&message.time),
    )
}

/// Render every message in order.
pub fn render_messages(messages: &[ChatMessage]) -> String {
    messages.iter().map(render_bubble).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_bubble_is_right_aligned() {
        let html = render_bubble(&ChatMessage {
            role: Role::User,
            content: "hi".into(),
            time: "09:05".into(),
        });
        assert!(html.contains("chat-row right"));
        assert!(html.contains("user-bubble"));
        assert!(html.contains(r#"<div class="timestamp">09:05</div>"#));
    }

    #[test]
    fn test_assistant_content_is_escaped() {
        let html = render_bubble(&ChatMessage {
            role: Role::Assistant,
            content: "<script>alert(1)</script>".into(),
            time: String::new(),
        });
        assert!(html.contains("assistant-bubble"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
