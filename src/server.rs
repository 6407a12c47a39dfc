use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::agent::{AgentRuntime, LangGraphRuntime, ScriptedRuntime};
use crate::config::{AppConfig, RuntimeKind};
use crate::error::ChatError;
use crate::events::{ChatEvent, sse_event};
use crate::session::{ChatMessage, SessionStore, SharedSession, ThreadEntry, load_conversation};
use crate::turn::stream_turn;
use crate::ui::render_page;

/// Cookie carrying the browser session id.
pub const SESSION_COOKIE: &str = "threadchat_session";

/// Path the browser opens after `POST /api/chat`.
pub const STREAM_PATH: &str = "/api/chat/stream";

/// Build the agent runtime selected by the configuration.
pub fn build_runtime(config: &AppConfig) -> Result<Arc<dyn AgentRuntime>, ChatError> {
    let runtime: Arc<dyn AgentRuntime> = match config.agent.runtime {
        RuntimeKind::Langgraph => {
            let settings = config.agent_settings()?;
            info!(
                name: "agent.config.loaded",
                base_url = %settings.base_url,
                assistant_id = %settings.assistant_id,
                api_key_set = settings.api_key.is_some(),
                "LangGraph runtime configured"
            );
            Arc::new(LangGraphRuntime::new(settings))
        }
        RuntimeKind::Scripted => {
            info!(name: "agent.config.loaded", "Scripted runtime configured");
            Arc::new(ScriptedRuntime::new())
        }
    };
    Ok(runtime)
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // HTML page and form actions
        .route("/", get(index_handler))
        .route("/threads/new", post(new_thread))
        .route("/threads/{id}/select", post(select_thread))
        .route("/chat/clear", post(clear_chat))
        .route("/chat/download", get(download_chat))
        // API routes
        .route("/api/chat", post(api_chat))
        .route(STREAM_PATH, get(api_chat_stream))
        .route("/api/threads", get(api_threads))
        .route("/api/messages", get(api_messages))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let runtime = build_runtime(&config)?;

    let state = AppState {
        sessions: SessionStore::new(),
        runtime,
        config: Arc::clone(&config),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        runtime = config.agent.runtime.as_str(),
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Session helpers
// ─────────────────────────────────────────────────────────────────────────────

fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Resolve the caller's session, creating one (and its cookie) when needed.
async fn session_for(state: &AppState, jar: CookieJar) -> (CookieJar, SharedSession) {
    let cookie_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let (id, session, created) = state
        .sessions
        .resolve(cookie_id.as_deref(), state.runtime.as_ref())
        .await;

    if created {
        (jar.add(session_cookie(id)), session)
    } else {
        (jar, session)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Render the chat page.
async fn index_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = session_for(&state, jar).await;
    let html = render_page(&*session.lock().await);
    (jar, Html(html))
}

/// POST /threads/new - Start a fresh conversation.
async fn new_thread(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = session_for(&state, jar).await;
    let mut guard = session.lock().await;
    let thread_id = guard.new_chat();
    tracing::info!(thread_id = %thread_id, "Started new chat");
    (jar, Redirect::to("/"))
}

/// POST /threads/{id}/select - Switch to a thread and load its history.
async fn select_thread(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ChatError> {
    let (jar, session) = session_for(&state, jar).await;

    // Fetch before locking so the session stays usable during the call.
    let history = load_conversation(state.runtime.as_ref(), &id).await?;
    tracing::info!(
        thread_id = %id,
        message_count = history.len(),
        "Loaded thread history"
    );

    session.lock().await.open_thread(id, history);
    Ok((jar, Redirect::to("/")))
}

/// POST /chat/clear - Empty the visible message list.
async fn clear_chat(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = session_for(&state, jar).await;
    let mut guard = session.lock().await;
    guard.clear();
    tracing::info!(thread_id = %guard.thread_id(), "Cleared chat");
    (jar, Redirect::to("/"))
}

/// GET /chat/download - Export the message list as JSON.
async fn download_chat(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ChatError> {
    let (jar, session) = session_for(&state, jar).await;
    let guard = session.lock().await;
    if guard.messages().is_empty() {
        return Err(ChatError::NotFound("no messages to download".into()));
    }
    let body = guard.export_json()?;

    Ok((
        jar,
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"chat_history.json\"",
            ),
        ],
        body,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for chat API.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User message content.
    message: String,
}

/// Response from chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    /// Thread the message was added to.
    thread_id: String,
    /// URL for the SSE stream.
    stream_url: String,
}

/// POST /api/chat - Record a user message and get the stream URL.
async fn api_chat(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ChatError> {
    tracing::info!(message_length = req.message.len(), "Received chat request");

    let (jar, session) = session_for(&state, jar).await;
    let mut guard = session.lock().await;
    guard.begin_turn(&req.message)?;
    let thread_id = guard.thread_id().to_string();

    tracing::debug!(
        thread_id = %thread_id,
        message_count = guard.messages().len(),
        "Added user message to session"
    );

    Ok((
        jar,
        Json(ChatResponse {
            thread_id,
            stream_url: STREAM_PATH.to_string(),
        }),
    ))
}

/// GET /api/chat/stream - SSE stream for the pending turn.
async fn api_chat_stream(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (jar, session) = session_for(&state, jar).await;

    let pending = session.lock().await.take_pending();
    let Some(turn) = pending else {
        tracing::warn!("Stream requested without a pending message");
        return (jar, single_error_sse("No pending message")).into_response();
    };

    tracing::info!(thread_id = %turn.thread_id, "Starting SSE stream");

    let events = stream_turn(session, Arc::clone(&state.runtime), turn)
        .map(|event| Ok::<String, Infallible>(sse_event(&event)));

    (jar, build_sse_response(Body::from_stream(events))).into_response()
}

/// GET /api/threads - Known threads, newest first.
async fn api_threads(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = session_for(&state, jar).await;
    let threads: Vec<ThreadEntry> = session
        .lock()
        .await
        .threads()
        .newest_first()
        .cloned()
        .collect();
    (jar, Json(threads))
}

/// GET /api/messages - Messages of the active thread.
async fn api_messages(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, session) = session_for(&state, jar).await;
    let messages: Vec<ChatMessage> = session.lock().await.messages().to_vec();
    (jar, Json(messages))
}

/// GET /health - Liveness check.
async fn health() -> &'static str {
    "ok"
}

fn single_error_sse(message: &str) -> Response {
    let err = ChatEvent::Error {
        message: message.to_string(),
    };
    let done = ChatEvent::Done;

    let payload = format!("{}{}", sse_event(&err), sse_event(&done));
    build_sse_response(Body::from(payload))
}

fn build_sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let h = resp.headers_mut();
    h.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    h.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    h.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    h.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}
