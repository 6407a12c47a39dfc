//! Turn handler.
//!
//! Streams one queued user turn through the agent runtime:
//! 1. Send the user input with a per-thread run config
//! 2. Forward every reply fragment as a [`ChatEvent::MessageDelta`]
//! 3. Append the accumulated reply to the session when the stream ends
//!
//! The session lock is only taken to record the result, never while waiting
//! on the agent.

use std::sync::Arc;

use futures::{Stream, StreamExt};

use crate::agent::{AgentRuntime, RunConfig, TurnRequest};
use crate::events::ChatEvent;
use crate::session::{PendingTurn, SharedSession};

/// Stream the reply to `turn`, recording it in `session` on success.
///
/// A failed run yields an [`ChatEvent::Error`] and leaves the session
/// without an assistant message. The stream always ends with
/// [`ChatEvent::Done`].
pub fn stream_turn(
    session: SharedSession,
    runtime: Arc<dyn AgentRuntime>,
    turn: PendingTurn,
) -> impl Stream<Item = ChatEvent> + Send {
    async_stream::stream! {
        let config = RunConfig::for_thread(turn.thread_id.clone());

        yield ChatEvent::TurnStart {
            thread_id: turn.thread_id.clone(),
        };

        tracing::info!(
            thread_id = %turn.thread_id,
            input_length = turn.input.len(),
            "Starting chat turn"
        );

        let fragments = match runtime.stream(TurnRequest::human(turn.input.as_str()), &config).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(thread_id = %turn.thread_id, error = %e, "Failed to start agent run");
                yield ChatEvent::Error { message: e.to_string() };
                yield ChatEvent::Done;
                return;
            }
        };

        let mut full_response = String::new();
        let mut fragment_count = 0usize;

        futures::pin_mut!(fragments);
        while let Some(item) = fragments.next().await {
            match item {
                Ok(text) => {
                    full_response.push_str(&text);
                    fragment_count += 1;
                    tracing::trace!(thread_id = %turn.thread_id, delta_length = text.len(), "Reply fragment");
                    yield ChatEvent::MessageDelta { text };
                }
                Err(e) => {
                    tracing::error!(
                        thread_id = %turn.thread_id,
                        fragments = fragment_count,
                        error = %e,
                        "Agent stream failed"
                    );
                    yield ChatEvent::Error { message: e.to_string() };
                    yield ChatEvent::Done;
                    return;
                }
            }
        }

        let stored = session.lock().await.complete_turn(&turn.thread_id, full_response);
        if let Some(message) = stored {
            tracing::info!(
                thread_id = %turn.thread_id,
                fragments = fragment_count,
                content_length = message.content.len(),
                "Saved assistant reply to session"
            );
            yield ChatEvent::MessageComplete { message };
        }

        yield ChatEvent::Done;
    }
}
