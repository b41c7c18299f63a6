//! Consuming streamed agent completions.
//!
//! Agent responses arrive as a sequence of byte chunks. They are concatenated
//! under a wall-clock deadline and the final text is parsed as JSON, falling
//! back to a text envelope when the agent did not answer in JSON.

use std::time::{Duration, Instant};

use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::AgentKind;
use crate::errors::AgentError;

/// Concatenates chunks until the stream ends.
///
/// The deadline is `started + limit`. It is checked before waiting for each
/// chunk and bounds the wait itself, so a stalled stream fails with
/// [`AgentError::Timeout`] instead of hanging.
///
/// # Errors
///
/// Returns the first chunk error, or a timeout once the deadline passes.
pub async fn collect_chunks<S>(
    agent: AgentKind,
    mut chunks: S,
    started: Instant,
    limit: Duration,
) -> Result<String, AgentError>
where
    S: Stream<Item = Result<Vec<u8>, AgentError>> + Unpin,
{
    let deadline = started + limit;
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk_count = 0usize;

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(AgentError::Timeout {
                agent,
                elapsed: started.elapsed(),
                limit,
            });
        }

        match tokio::time::timeout(deadline - now, chunks.next()).await {
            Err(_) => {
                return Err(AgentError::Timeout {
                    agent,
                    elapsed: started.elapsed(),
                    limit,
                });
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => return Err(e),
            Ok(Some(Ok(bytes))) => {
                chunk_count += 1;
                buffer.extend_from_slice(&bytes);
            }
        }
    }

    debug!(
        agent = %agent,
        chunks = chunk_count,
        bytes = buffer.len(),
        "Agent stream completed"
    );

    // Chunk boundaries may split a codepoint, so decode only once at the end.
    Ok(match String::from_utf8(buffer) {
        Ok(text) => text,
        Err(e) => {
            warn!(agent = %agent, "Agent output is not valid UTF-8; decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    })
}

/// Parses agent output text into JSON.
///
/// Accepts bare JSON, JSON wrapped in a Markdown code fence, or JSON embedded
/// in surrounding prose. Anything else is kept as
/// `{"response": text, "raw_output": text}` rather than discarded.
#[must_use]
pub fn parse_agent_output(text: &str) -> Value {
    let trimmed = text.trim();
    let unfenced = strip_code_fence(trimmed);

    if let Ok(value) = serde_json::from_str::<Value>(unfenced) {
        return value;
    }

    if let (Some(start), Some(end)) = (unfenced.find('{'), unfenced.rfind('}'))
        && start < end
        && let Ok(value) = serde_json::from_str::<Value>(&unfenced[start..=end])
    {
        return value;
    }

    json!({ "response": text, "raw_output": text })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
