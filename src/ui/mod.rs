//! Server-rendered HTML for the chat page.
//!
//! The page is plain HTML with a small inline script that drives the
//! two-step turn flow (`POST /api/chat`, then an `EventSource` on the
//! returned stream URL). All user and agent text goes through
//! [`escape_html`] before it is written into markup.
//!
//! # Structure
//!
//! - [`page`]: page shell, toolbar, message pane and input form
//! - [`sidebar`]: thread list and "New Chat" control
//! - [`bubble`]: one chat bubble per message

pub mod bubble;
pub mod page;
pub mod sidebar;

pub use bubble::render_bubble;
pub use page::render_page;
pub use sidebar::render_sidebar;

/// Escape text for safe insertion into HTML content and attribute values.
///
/// # Example
///
/// ```rust
/// use threadchat::ui::escape_html;
///
/// assert_eq!(escape_html("<b>\"hi\"</b>"), "&lt;b&gt;&quot;hi&quot;&lt;/b&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode a value for use as a single URL path segment.
pub(crate) fn path_segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
