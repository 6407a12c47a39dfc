//! LangGraph server driver.
//!
//! This module implements [`AgentRuntime`] against the LangGraph server REST
//! API, streaming replies with `stream_mode = messages-tuple` and reading
//! thread state back for history reloads.

use std::collections::HashSet;

use futures::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::error::{ChatError, Result};

use super::{AgentContent, AgentRuntime, FragmentStream, RunConfig, ThreadState, TurnRequest};

/// Connection settings for a LangGraph server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    /// Base URL of the server (e.g., `http://127.0.0.1:2024`).
    pub base_url: String,
    /// Assistant (graph) id to run.
    pub assistant_id: String,
    /// Optional API key sent as `x-api-key`.
    pub api_key: Option<String>,
    /// Page size used when listing threads.
    pub search_limit: usize,
}

/// A single Server-Sent Events frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if present.
    pub event: Option<String>,
    /// Concatenated `data:` lines.
    pub data: String,
}

/// Incremental SSE decoder that tolerates frames split across chunks.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a network chunk and return every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        // Servers may frame with CRLF; JSON payloads never carry a raw CR.
        self.buf.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(pos) = find_double_newline(&self.buf) {
            let raw = self.buf.drain(..pos + 2).collect::<Vec<_>>();
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw)) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut data_lines = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        if let Some(value) = line.strip_prefix("event:") {
            frame.event = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if frame.event.is_none() && data_lines.is_empty() {
        return None;
    }
    frame.data = data_lines.join("\n");
    Some(frame)
}

/// Find the position of a double newline in the buffer.
fn find_double_newline(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

/// Extract the text fragment from a `messages` event payload.
///
/// The payload is a `[message_chunk, metadata]` tuple.
pub fn fragment_from_payload(data: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(data)?;
    let chunk = match &value {
        serde_json::Value::Array(items) => items.first().cloned().unwrap_or_default(),
        other => other.clone(),
    };
    let content = chunk
        .get("content")
        .cloned()
        .map(serde_json::from_value::<AgentContent>)
        .transpose()?
        .unwrap_or_default();
    Ok(content.as_text())
}

#[derive(Debug, Deserialize)]
struct ThreadSummary {
    thread_id: String,
}

/// Agent runtime backed by a LangGraph server.
#[derive(Clone)]
pub struct LangGraphRuntime {
    http: reqwest::Client,
    settings: AgentSettings,
}

impl std::fmt::Debug for LangGraphRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LangGraphRuntime")
            .field("base_url", &self.settings.base_url)
            .field("assistant_id", &self.settings.assistant_id)
            .finish_non_exhaustive()
    }
}

impl LangGraphRuntime {
    /// Create a new runtime with the given settings.
    #[must_use]
    pub fn new(settings: AgentSettings) -> Self {
        Self::with_client(settings, reqwest::Client::new())
    }

    /// Create a runtime that sends requests through `http`.
    #[must_use]
    pub fn with_client(settings: AgentSettings, http: reqwest::Client) -> Self {
        Self { http, settings }
    }

    /// Get the connection settings.
    #[must_use]
    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Endpoint URL for `segments`, each pushed as one encoded path segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|e| ChatError::Config(format!("invalid agent base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ChatError::Config("agent base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn search_page(&self, limit: usize, offset: usize) -> Result<Vec<ThreadSummary>> {
        let url = self.url(&["threads", "search"])?;
        let body = serde_json::json!({ "limit": limit, "offset": offset });
        let resp = self.authorize(self.http.post(url).json(&body)).send().await?;
        Ok(check_status(resp).await?.json::<Vec<ThreadSummary>>().await?)
    }

    fn authorize(&self, rb: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.settings.api_key {
            Some(key) => rb.header("x-api-key", key),
            None => rb,
        }
    }

    /// Body for `POST /threads/{id}/runs/stream`.
    #[must_use]
    pub fn run_body(&self, request: &TurnRequest, config: &RunConfig) -> serde_json::Value {
        serde_json::json!({
            "assistant_id": self.settings.assistant_id,
            "input": { "messages": request.messages },
            "stream_mode": ["messages-tuple"],
            "config": {
                "configurable": config.configurable(),
                "run_name": config.run_name,
            },
            "metadata": config.metadata(),
            "if_not_exists": "create",
        })
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp
        .text()
        .await
        .ok()
        .filter(|body| !body.trim().is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
    Err(ChatError::Agent {
        status: status.as_u16(),
        message,
    })
}

#[async_trait::async_trait]
impl AgentRuntime for LangGraphRuntime {
    async fn stream(&self, request: TurnRequest, config: &RunConfig) -> Result<FragmentStream> {
        let url = self.url(&["threads", config.thread_id.as_str(), "runs", "stream"])?;
        let body = self.run_body(&request, config);

        tracing::debug!(
            thread_id = %config.thread_id,
            assistant_id = %self.settings.assistant_id,
            "Starting agent run stream"
        );

        let resp = self.authorize(self.http.post(url).json(&body)).send().await?;
        let resp = check_status(resp).await?;
        let byte_stream = resp.bytes_stream();
        let thread_id = config.thread_id.clone();

        let out = async_stream::try_stream! {
            let mut decoder = SseDecoder::new();

            futures::pin_mut!(byte_stream);
            'outer: while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk?;
                for frame in decoder.push(&chunk) {
                    match frame.event.as_deref() {
                        Some("messages") => {
                            let text = fragment_from_payload(&frame.data)?;
                            if !text.is_empty() {
                                yield text;
                            }
                        }
                        Some("error") => {
                            Err::<(), _>(ChatError::Stream(frame.data))?;
                        }
                        Some("end") => {
                            tracing::debug!(thread_id = %thread_id, "Agent run stream ended");
                            break 'outer;
                        }
                        other => {
                            tracing::trace!(thread_id = %thread_id, event = ?other, "Ignoring stream event");
                        }
                    }
                }
            }
        };

        Ok(Box::pin(out))
    }

    async fn get_state(&self, config: &RunConfig) -> Result<ThreadState> {
        let url = self.url(&["threads", config.thread_id.as_str(), "state"])?;
        let resp = self.authorize(self.http.get(url)).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            tracing::debug!(thread_id = %config.thread_id, "Thread unknown to runtime, empty history");
            return Ok(ThreadState::default());
        }

        let state = check_status(resp).await?.json::<ThreadState>().await?;
        Ok(state)
    }

    /// Page through `threads/search` until a short page comes back.
    async fn list_all_thread_ids(&self) -> Result<Vec<String>> {
        let limit = self.settings.search_limit.max(1);
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.search_page(limit, offset).await?;
            let page_len = page.len();
            let mut fresh = 0;
            for thread in page {
                if seen.insert(thread.thread_id.clone()) {
                    ids.push(thread.thread_id);
                    fresh += 1;
                }
            }

            // A server that ignores `offset` repeats the first page.
            if page_len < limit || fresh == 0 {
                break;
            }
            offset += limit;
        }

        tracing::debug!(threads = ids.len(), "Listed agent threads");
        Ok(ids)
    }
}
