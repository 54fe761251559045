use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{GenerateRequest, GenerateResponse};
use crate::core::client::ChatBackend;

#[derive(Clone, Debug)]
pub enum StreamMessage {
    Chunk(String),
    Error(String),
    End,
}

/// Channel-end handed to the backend for one send. Every event carries the
/// stream id so the UI can discard fragments from a superseded send.
#[derive(Clone)]
pub struct StreamSink {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
}

impl StreamSink {
    pub fn new(tx: mpsc::UnboundedSender<(StreamMessage, u64)>, stream_id: u64) -> Self {
        Self { tx, stream_id }
    }

    pub fn chunk(&self, text: String) {
        let _ = self.tx.send((StreamMessage::Chunk(text), self.stream_id));
    }

    pub fn error(&self, text: String) {
        let _ = self.tx.send((StreamMessage::Error(text), self.stream_id));
    }

    pub fn end(&self) {
        let _ = self.tx.send((StreamMessage::End, self.stream_id));
    }
}

pub fn extract_data_payload(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim_start)
}

/// Handle one SSE `data:` payload. Returns true when the stream is finished
/// and the task should stop reading.
fn handle_data_payload(payload: &str, sink: &StreamSink) -> bool {
    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(_) => {
            if payload.trim().is_empty() {
                return false;
            }
            sink.error(format_api_error(payload));
            sink.end();
            return true;
        }
    };

    // Error bodies would deserialize as an empty response, so they are
    // recognized by key before the payload is treated as a chunk.
    if value.get("error").is_some() {
        sink.error(format_api_error(payload));
        sink.end();
        return true;
    }

    match serde_json::from_value::<GenerateResponse>(value) {
        Ok(response) => {
            if let Some(reason) = response.block_reason() {
                sink.error(format!("Prompt was blocked by the API: {reason}"));
                sink.end();
                return true;
            }

            if let Some(text) = response.first_candidate_text() {
                sink.chunk(text);
            }

            // The final streamed chunk carries a finish reason; there is no
            // separate terminator event in this protocol.
            if response.finish_reason().is_some() {
                sink.end();
                return true;
            }
            false
        }
        Err(_) => {
            sink.error(format_api_error(payload));
            sink.end();
            true
        }
    }
}

pub fn process_sse_line(line: &str, sink: &StreamSink) -> bool {
    extract_data_payload(line)
        .map(|payload| handle_data_payload(payload, sink))
        .unwrap_or(false)
}

fn extract_error_summary(value: &serde_json::Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.trim().to_string()
    })
}

/// Turn a raw API error body into transcript-ready text: a one-line summary
/// when one can be extracted, with the raw body fenced below it.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {summary}\n```json\n{pretty_json}\n```");
                }
            }
            return format!("API Error:\n```json\n{pretty_json}\n```");
        }
    }

    format!("API Error:\n```\n{trimmed}\n```")
}

pub struct StreamParams {
    pub model: String,
    pub request: GenerateRequest,
    /// Incremental delivery when true; otherwise one blocking completion
    /// surfaced as a single chunk.
    pub streaming: bool,
    pub cancel_token: CancellationToken,
    pub stream_id: u64,
}

/// Owns the sending half of the stream channel and spawns one task per
/// send. The UI holds the receiving half and drains it between draws.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_send(&self, backend: Arc<dyn ChatBackend>, params: StreamParams) {
        let sink = StreamSink::new(self.tx.clone(), params.stream_id);
        tokio::spawn(async move {
            let StreamParams {
                model,
                request,
                streaming,
                cancel_token,
                stream_id: _,
            } = params;

            tokio::select! {
                _ = async {
                    if streaming {
                        backend.stream(&model, request, &sink, &cancel_token).await;
                    } else {
                        match backend.complete(&model, request).await {
                            Ok(text) => {
                                sink.chunk(text);
                                sink.end();
                            }
                            Err(e) => {
                                sink.error(e.display_message());
                                sink.end();
                            }
                        }
                    }
                } => {}
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    #[cfg(test)]
    pub fn sink_for_test(&self, stream_id: u64) -> StreamSink {
        StreamSink::new(self.tx.clone(), stream_id)
    }
}
