//! Page shell and chat pane.

use crate::session::ChatSession;

use super::bubble::render_messages;
use super::escape_html;
use super::sidebar::render_sidebar;

const STYLES: &str = r"
body { margin: 0; font-family: system-ui, sans-serif; display: flex; height: 100vh; }
.sidebar { width: 260px; padding: 16px; background: #f4f4f8; overflow-y: auto; flex-shrink: 0; }
.sidebar h1 { font-size: 1.3rem; }
.sidebar h2 { font-size: 1rem; margin-top: 24px; }
.sidebar button { width: 100%; margin: 4px 0; padding: 8px; text-align: left; border: 1px solid #ddd; border-radius: 6px; background: white; cursor: pointer; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
.sidebar .new-chat { text-align: center; font-weight: 600; }
.sidebar .thread-button.active { background: #E6E6FA; border-color: #9a9ad0; }
main { flex: 1; display: flex; flex-direction: column; padding: 16px; min-width: 0; }
.toolbar { display: flex; gap: 8px; align-items: center; }
.toolbar h2 { flex: 1; margin: 0; font-size: 1.1rem; }
.toolbar form { margin: 0; }
.chat-container { flex: 1; overflow-y: auto; display: flex; flex-direction: column; padding: 10px 0; }
.chat-row { display: flex; }
.chat-row.right { justify-content: flex-end; }
.chat-row.left { justify-content: flex-start; }
.chat-bubble { max-width: 70%; padding: 10px; border-radius: 10px; margin: 5px; white-space: pre-wrap; word-wrap: break-word; }
.user-bubble { background-color: #DCF8C6; text-align: right; }
.assistant-bubble { background-color: #E6E6FA; text-align: left; }
.timestamp { font-size: 0.8em; color: gray; margin-top: 4px; }
.chat-input { display: flex; gap: 8px; }
.chat-input input { flex: 1; padding: 10px; border-radius: 8px; border: 1px solid #ccc; }
.error { color: #b00020; }
";

const SCRIPT: &str = r#"
(function () {
  const form = document.getElementById('chat-form');
  const input = form.querySelector('input[name=message]');
  const pane = document.getElementById('chat-container');

  function bubble(side, cls, text) {
    const row = document.createElement('div');
    row.className = 'chat-row ' + side;
    const b = document.createElement('div');
    b.className = 'chat-bubble ' + cls;
    const content = document.createElement('div');
    content.className = 'content';
    content.textContent = text;
    const ts = document.createElement('div');
    ts.className = 'timestamp';
    b.appendChild(content);
    b.appendChild(ts);
    row.appendChild(b);
    pane.appendChild(row);
    pane.scrollTop = pane.scrollHeight;
    return { content: content, timestamp: ts };
  }

  form.addEventListener('submit', async function (ev) {
    ev.preventDefault();
    const message = input.value;
    if (!message.trim()) return;
    input.value = '';
    input.disabled = true;

    const resp = await fetch('/api/chat', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ message: message }),
    });
    if (!resp.ok) {
      bubble('left', 'assistant-bubble error', await resp.text());
      input.disabled = false;
      return;
    }
    const body = await resp.json();
    bubble('right', 'user-bubble', message);
    const reply = bubble('left', 'assistant-bubble', 'Assistant is typing...');
    let started = false;

    const es = new EventSource(body.stream_url);
    es.addEventListener('message.delta', function (e) {
      const data = JSON.parse(e.data).data;
      if (!started) {
        reply.content.textContent = '';
        started = true;
      }
      reply.content.textContent += data.text;
      pane.scrollTop = pane.scrollHeight;
    });
    es.addEventListener('message.complete', function (e) {
      reply.timestamp.textContent = JSON.parse(e.data).data.message.time;
    });
    es.addEventListener('error', function (e) {
      if (e.data) {
        reply.content.textContent = JSON.parse(e.data).data.message;
        reply.content.classList.add('error');
      }
    });
    es.addEventListener('done', function () {
      es.close();
      window.location.reload();
    });
  });
})();
"#;

/// Render the full chat page for `session`.
///
/// The toolbar always offers "Clear Chat"; "Download Chat" appears only when
/// there is something to export.
pub fn render_page(session: &ChatSession) -> String {
    let download = if session.messages().is_empty() {
        String::new()
    } else {
        r#"<a class="button" href="/chat/download" download="chat_history.json">⬇️ Download Chat</a>"#
            .to_string()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} - Threadchat</title>
  <style>{STYLES}</style>
</head>
<body>
{sidebar}
<main>
  <div class="toolbar">
    <h2>{title}</h2>
    <form method="post" action="/chat/clear"><button type="submit">🗑️ Clear Chat</button></form>
    {download}
  </div>
  <div id="chat-container" class="chat-container">{messages}</div>
  <form id="chat-form" class="chat-input" autocomplete="off">
    <input type="text" name="message" placeholder="Type here" autofocus>
    <button type="submit">Send</button>
  </form>
</main>
<script>{SCRIPT}</script>
</body>
</html>"#,
        title = escape_html(session.active_title()),
        sidebar = render_sidebar(session),
        messages = render_messages(session.messages()),
    )
}
