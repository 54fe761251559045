use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;
use futures_util::StreamExt;
use memchr::memchr;
use tokio_util::sync::CancellationToken;

use crate::api::{Content, GenerateRequest, GenerateResponse, SystemInstruction};
use crate::core::chat_stream::{format_api_error, process_sse_line, StreamSink};
use crate::core::personality::lookup_prompt;
use crate::core::settings::ChatSettings;
use crate::core::store::Session;
use crate::utils::url::model_endpoint;

#[derive(Debug)]
pub enum BackendError {
    Http(reqwest::Error),
    Api { status: u16, body: String },
    Blocked(String),
    EmptyReply,
}

impl BackendError {
    /// Transcript-ready rendering; API bodies get the summary-plus-fenced
    /// treatment shared with the streaming path.
    pub fn display_message(&self) -> String {
        match self {
            BackendError::Http(e) => format_api_error(&e.to_string()),
            BackendError::Api { body, .. } => format_api_error(body),
            BackendError::Blocked(reason) => {
                format!("Prompt was blocked by the API: {reason}")
            }
            BackendError::EmptyReply => "API Error:\n```\n<empty reply>\n```".to_string(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Http(e) => write!(f, "HTTP error: {e}"),
            BackendError::Api { status, .. } => write!(f, "API returned status {status}"),
            BackendError::Blocked(reason) => write!(f, "prompt blocked: {reason}"),
            BackendError::EmptyReply => write!(f, "API returned no candidates"),
        }
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BackendError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Http(e)
    }
}

/// The seam between the chat controller and the remote model. The
/// production implementation is [`GeminiClient`]; tests substitute a stub
/// with scripted fragments.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Blocking send: resolves to the full reply text.
    async fn complete(&self, model: &str, request: GenerateRequest)
        -> Result<String, BackendError>;

    /// Streaming send: forwards fragments to `sink` and terminates it with
    /// End (after an Error, when one occurs). Implementations perform no
    /// retries; any transport failure surfaces as a single Error event.
    async fn stream(
        &self,
        model: &str,
        request: GenerateRequest,
        sink: &StreamSink,
        cancel: &CancellationToken,
    );
}

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST client. `generateContent` for blocking sends,
/// `streamGenerateContent?alt=sse` for incremental ones.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn complete(
        &self,
        model: &str,
        request: GenerateRequest,
    ) -> Result<String, BackendError> {
        let url = model_endpoint(&self.base_url, model, "generateContent");
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        if let Some(reason) = parsed.block_reason() {
            return Err(BackendError::Blocked(reason.to_string()));
        }
        parsed
            .first_candidate_text()
            .filter(|text| !text.is_empty())
            .ok_or(BackendError::EmptyReply)
    }

    async fn stream(
        &self,
        model: &str,
        request: GenerateRequest,
        sink: &StreamSink,
        cancel: &CancellationToken,
    ) {
        let url = format!(
            "{}?alt=sse",
            model_endpoint(&self.base_url, model, "streamGenerateContent")
        );

        let response = match self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                sink.error(format_api_error(&e.to_string()));
                sink.end();
                return;
            }
        };

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            sink.error(format_api_error(&body));
            sink.end();
            return;
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = stream.next().await {
            if cancel.is_cancelled() {
                return;
            }

            let chunk_bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    sink.error(format_api_error(&e.to_string()));
                    sink.end();
                    return;
                }
            };

            buffer.extend_from_slice(&chunk_bytes);

            while let Some(newline_pos) = memchr(b'\n', &buffer) {
                let line_str = match std::str::from_utf8(&buffer[..newline_pos]) {
                    Ok(s) => s.trim(),
                    Err(e) => {
                        tracing::warn!("invalid UTF-8 in stream: {e}");
                        buffer.drain(..=newline_pos);
                        continue;
                    }
                };

                let should_end = process_sse_line(line_str, sink);
                buffer.drain(..=newline_pos);
                if should_end {
                    return;
                }
            }
        }

        // Natural close without a finish reason still ends the turn.
        sink.end();
    }
}

/// The live remote-conversation handle: one settings snapshot plus the
/// wire-format transcript it was seeded with. Never patched incrementally;
/// any dependency change makes it stale and the owner rebuilds it from the
/// session store.
pub struct LiveChat {
    settings: ChatSettings,
    session_name: String,
    system_prompt: String,
    history: Vec<Content>,
    /// Store length this handle is in sync with: the seed length plus one
    /// user/reply pair per recorded turn.
    synced_len: usize,
}

impl LiveChat {
    /// Seed a handle from the authoritative session transcript. Fails only
    /// when the configured personality is unknown; the caller treats that
    /// as an initialization failure and leaves prior state untouched.
    pub fn build(settings: &ChatSettings, session: &Session) -> Result<Self, String> {
        let system_prompt = lookup_prompt(&settings.personality)?.to_string();
        let history = session
            .messages
            .iter()
            .map(|m| Content::new(m.role.wire_role(), m.content.clone()))
            .collect();

        Ok(Self {
            settings: settings.clone(),
            session_name: session.name.clone(),
            system_prompt,
            history,
            synced_len: session.messages.len(),
        })
    }

    /// A handle is stale whenever its rebuild key (settings, session
    /// identity, transcript length it has tracked) no longer matches.
    pub fn is_stale(&self, settings: &ChatSettings, session: &Session) -> bool {
        self.settings != *settings
            || self.session_name != session.name
            || self.synced_len != session.messages.len()
    }

    /// Request for the next turn: seeded history, then the new user turn.
    pub fn request_for(&self, user_text: &str) -> GenerateRequest {
        let mut contents = self.history.clone();
        contents.push(Content::new("user", user_text));

        GenerateRequest {
            contents,
            generation_config: self.settings.generation_config(),
            system_instruction: Some(SystemInstruction::from_text(self.system_prompt.clone())),
        }
    }

    /// Fold a completed exchange into the handle so it tracks the store.
    /// Failed turns are never recorded; the length mismatch then forces a
    /// reseed on the next send.
    pub fn record_turn(&mut self, user_text: &str, reply_text: &str) {
        self.history.push(Content::new("user", user_text));
        self.history.push(Content::new("model", reply_text));
        self.synced_len += 2;
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    #[cfg(test)]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{Message, Role};
    use crate::core::store::SessionStore;

    fn store_with_turn() -> SessionStore {
        let mut store = SessionStore::new();
        store.append_to_current(Message::new(Role::User, "hi", "12:00 PM"));
        store.append_to_current(Message::new(Role::Assistant, "hello!", "12:00 PM"));
        store
    }

    #[test]
    fn build_seeds_wire_history_in_order() {
        let store = store_with_turn();
        let live = LiveChat::build(&ChatSettings::default(), store.current_session()).unwrap();

        let request = live.request_for("how are you?");
        let roles: Vec<&str> = request.contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, ["user", "model", "user"]);
        assert_eq!(request.contents[2].joined_text(), "how are you?");
        assert!(request.system_instruction.is_some());
    }

    #[test]
    fn build_rejects_unknown_personalities() {
        let store = SessionStore::new();
        let settings = ChatSettings::default().with_personality("nonexistent");
        assert!(LiveChat::build(&settings, store.current_session()).is_err());
    }

    #[test]
    fn handle_goes_stale_on_settings_change() {
        let store = store_with_turn();
        let settings = ChatSettings::default();
        let live = LiveChat::build(&settings, store.current_session()).unwrap();

        assert!(!live.is_stale(&settings, store.current_session()));
        let tweaked = settings.clone().with_temperature(1.5);
        assert!(live.is_stale(&tweaked, store.current_session()));
    }

    #[test]
    fn handle_goes_stale_on_session_switch_and_clear() {
        let mut store = store_with_turn();
        let settings = ChatSettings::default();
        let live = LiveChat::build(&settings, store.current_session()).unwrap();

        store.create_session();
        assert!(live.is_stale(&settings, store.current_session()));

        store.switch_session("Session 1").unwrap();
        assert!(!live.is_stale(&settings, store.current_session()));

        store.clear_session("Session 1").unwrap();
        assert!(live.is_stale(&settings, store.current_session()));
    }

    #[test]
    fn recorded_turns_keep_the_handle_fresh() {
        let mut store = store_with_turn();
        let settings = ChatSettings::default();
        let mut live = LiveChat::build(&settings, store.current_session()).unwrap();

        store.append_to_current(Message::new(Role::User, "next", "12:01 PM"));
        store.append_to_current(Message::new(Role::Assistant, "sure", "12:01 PM"));
        live.record_turn("next", "sure");

        assert!(!live.is_stale(&settings, store.current_session()));
        assert_eq!(live.history_len(), 4);
    }

    #[test]
    fn unrecorded_failures_force_a_reseed() {
        let mut store = store_with_turn();
        let settings = ChatSettings::default();
        let live = LiveChat::build(&settings, store.current_session()).unwrap();

        // A failed send still commits its user message and error reply.
        store.append_to_current(Message::new(Role::User, "next", "12:01 PM"));
        store.append_to_current(Message::new(Role::Assistant, "API Error: down", "12:01 PM"));

        assert!(live.is_stale(&settings, store.current_session()));
    }
}
