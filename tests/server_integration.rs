use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use threadchat::AppState;
use threadchat::agent::{AgentMessage, ScriptedRuntime};
use threadchat::config::{AgentConfig, AppConfig, RuntimeKind, ServerConfig};
use threadchat::server::{SESSION_COOKIE, router};
use threadchat::session::SessionStore;

fn app(runtime: ScriptedRuntime) -> Router {
    let config = AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".into(),
        },
        agent: AgentConfig {
            runtime: RuntimeKind::Scripted,
            base_url: "http://127.0.0.1:2024".into(),
            assistant_id: "agent".into(),
            api_key: None,
            search_limit: 100,
        },
    };
    router(AppState {
        sessions: SessionStore::new(),
        runtime: Arc::new(runtime),
        config: Arc::new(config),
    })
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("body should be JSON")
    }
}

async fn send(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    Reply {
        status,
        headers,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, cookie: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_message(cookie: &str, message: &str) -> Request<Body> {
    Request::post("/api/chat")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "message": message }).to_string()))
        .unwrap()
}

/// Open the page and return the `name=value` pair of the session cookie.
async fn open_session(app: &Router) -> String {
    let resp = send(app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status, StatusCode::OK);
    let set_cookie = resp
        .headers
        .get(header::SET_COOKIE)
        .expect("new session should set a cookie")
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    let pair = set_cookie.split(';').next().unwrap().to_string();
    assert!(pair.starts_with(SESSION_COOKIE));
    pair
}

async fn run_turn(app: &Router, cookie: &str, message: &str) -> String {
    let resp = send(app, post_message(cookie, message)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let stream_url = resp.json()["stream_url"].as_str().unwrap().to_string();

    let stream = send(app, get(&stream_url, cookie)).await;
    assert_eq!(
        stream.headers.get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
    stream.body
}

#[tokio::test]
async fn test_fresh_page() {
    let app = app(ScriptedRuntime::new());
    let cookie = open_session(&app).await;

    let page = send(&app, get("/", &cookie)).await;
    assert!(page.headers.get(header::SET_COOKIE).is_none());
    assert!(page.body.contains("New Chat"));
    assert!(page.body.contains("My Conversations"));
    assert!(page.body.contains("Clear Chat"));
    assert!(!page.body.contains("Download Chat"));
    assert!(page.body.contains(r#"placeholder="Type here""#));
}

#[tokio::test]
async fn test_turn_streams_and_records_reply() {
    let app = app(ScriptedRuntime::new());
    let cookie = open_session(&app).await;

    let body = run_turn(&app, &cookie, "hello there").await;
    assert!(body.starts_with("event: turn.start\n"));
    assert!(body.contains("event: message.delta"));
    assert!(body.contains("event: message.complete"));
    assert!(body.ends_with("event: done\ndata: {\"type\":\"done\"}\n\n"));

    let messages = send(&app, get("/api/messages", &cookie)).await.json();
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[0]["content"], "hello there");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "You said: hello there");

    let threads = send(&app, get("/api/threads", &cookie)).await.json();
    assert_eq!(threads[0]["title"], "hello there");

    let page = send(&app, get("/", &cookie)).await;
    assert!(page.body.contains("Download Chat"));
}

#[tokio::test]
async fn test_failed_turn_keeps_only_user_message() {
    let app = app(ScriptedRuntime::with_script(
        threadchat::agent::scripted::Script::FailMidStream("upstream closed".into()),
    ));
    let cookie = open_session(&app).await;

    let body = run_turn(&app, &cookie, "will this work").await;
    assert!(body.contains("event: error"));
    assert!(body.contains("upstream closed"));
    assert!(!body.contains("message.complete"));

    let messages = send(&app, get("/api/messages", &cookie)).await.json();
    assert_eq!(messages.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stream_without_pending_message() {
    let app = app(ScriptedRuntime::new());
    let cookie = open_session(&app).await;

    let stream = send(&app, get("/api/chat/stream", &cookie)).await;
    assert_eq!(stream.status, StatusCode::OK);
    assert!(stream.body.starts_with("event: error\n"));
    assert!(stream.body.ends_with("event: done\ndata: {\"type\":\"done\"}\n\n"));
}

#[tokio::test]
async fn test_blank_message_rejected() {
    let app = app(ScriptedRuntime::new());
    let cookie = open_session(&app).await;

    let resp = send(&app, post_message(&cookie, "   ")).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let messages = send(&app, get("/api/messages", &cookie)).await.json();
    assert!(messages.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_second_message_rejected_until_streamed() {
    let app = app(ScriptedRuntime::new());
    let cookie = open_session(&app).await;

    let first = send(&app, post_message(&cookie, "first")).await;
    assert_eq!(first.status, StatusCode::OK);
    let second = send(&app, post_message(&cookie, "second")).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);

    let messages = send(&app, get("/api/messages", &cookie)).await.json();
    assert_eq!(messages.as_array().unwrap().len(), 1);

    let stream_url = first.json()["stream_url"].as_str().unwrap().to_string();
    let stream = send(&app, get(&stream_url, &cookie)).await;
    assert!(stream.body.contains("You said: first"));

    let third = send(&app, post_message(&cookie, "second")).await;
    assert_eq!(third.status, StatusCode::OK);
}

#[tokio::test]
async fn test_download() {
    let app = app(ScriptedRuntime::with_reply("fixed answer"));
    let cookie = open_session(&app).await;

    let empty = send(&app, get("/chat/download", &cookie)).await;
    assert_eq!(empty.status, StatusCode::NOT_FOUND);

    run_turn(&app, &cookie, "question").await;

    let resp = send(&app, get("/chat/download", &cookie)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(
        resp.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(
        resp.headers
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("chat_history.json")
    );
    let exported = resp.json();
    assert_eq!(exported[1]["content"], "fixed answer");
    assert_eq!(exported[1]["time"].as_str().unwrap().len(), 5);
}

#[tokio::test]
async fn test_clear_keeps_thread() {
    let app = app(ScriptedRuntime::new());
    let cookie = open_session(&app).await;
    run_turn(&app, &cookie, "something").await;

    let resp = send(&app, post("/chat/clear", &cookie)).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    assert_eq!(resp.headers.get(header::LOCATION).unwrap(), "/");

    let messages = send(&app, get("/api/messages", &cookie)).await.json();
    assert!(messages.as_array().unwrap().is_empty());
    let threads = send(&app, get("/api/threads", &cookie)).await.json();
    assert_eq!(threads.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_new_chat_and_select_old_thread() {
    let runtime = ScriptedRuntime::new();
    runtime
        .seed_thread(
            "thread-from-yesterday",
            vec![AgentMessage::human("Q1"), AgentMessage::ai("A1")],
        )
        .await;
    let app = app(runtime);
    let cookie = open_session(&app).await;

    let threads = send(&app, get("/api/threads", &cookie)).await.json();
    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["title"], "New Conversation");
    assert_eq!(threads[1]["id"], "thread-from-yesterday");
    assert_eq!(threads[1]["title"], "Old Conversation");

    let resp = send(&app, post("/threads/new", &cookie)).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);
    let threads = send(&app, get("/api/threads", &cookie)).await.json();
    assert_eq!(threads.as_array().unwrap().len(), 3);

    let resp = send(&app, post("/threads/thread-from-yesterday/select", &cookie)).await;
    assert_eq!(resp.status, StatusCode::SEE_OTHER);

    let messages = send(&app, get("/api/messages", &cookie)).await.json();
    let messages = messages.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "A1");
    assert_eq!(messages[1]["time"], "");
}

#[tokio::test]
async fn test_sessions_are_isolated_by_cookie() {
    let app = app(ScriptedRuntime::new());
    let alice = open_session(&app).await;
    let bob = open_session(&app).await;
    assert_ne!(alice, bob);

    run_turn(&app, &alice, "only for alice").await;

    let bob_messages = send(&app, get("/api/messages", &bob)).await.json();
    assert!(bob_messages.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_health() {
    let app = app(ScriptedRuntime::new());
    let resp = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");
}
