use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::GenerateRequest;
use crate::core::app::{App, UiState};
use crate::core::chat_stream::{format_api_error, ChatStreamService, StreamMessage, StreamSink};
use crate::core::client::{BackendError, ChatBackend};
use crate::core::settings::ChatSettings;
use crate::core::store::SessionStore;
use crate::utils::logging::LoggingState;

/// Deterministic backend: replies with scripted fragments, optionally
/// failing afterwards. The buffered reply is always the concatenation of
/// the fragments, so streaming/non-streaming comparisons are exact.
pub struct ScriptedBackend {
    fragments: Vec<String>,
    error: Option<String>,
}

impl ScriptedBackend {
    pub fn replying(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            error: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self::failing_after(&[], message)
    }

    pub fn failing_after(fragments: &[&str], message: &str) -> Self {
        Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            error: Some(message.to_string()),
        }
    }

    fn error_body(message: &str) -> String {
        format!(r#"{{"error":{{"message":"{message}"}}}}"#)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        _model: &str,
        _request: GenerateRequest,
    ) -> Result<String, BackendError> {
        match &self.error {
            Some(message) => Err(BackendError::Api {
                status: 429,
                body: Self::error_body(message),
            }),
            None => Ok(self.fragments.concat()),
        }
    }

    async fn stream(
        &self,
        _model: &str,
        _request: GenerateRequest,
        sink: &StreamSink,
        _cancel: &CancellationToken,
    ) {
        for fragment in &self.fragments {
            sink.chunk(fragment.clone());
        }
        if let Some(message) = &self.error {
            sink.error(format_api_error(&Self::error_body(message)));
        }
        sink.end();
    }
}

pub fn create_test_app(
    backend: ScriptedBackend,
) -> (App, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
    let (stream, rx) = ChatStreamService::new();
    let app = App {
        store: SessionStore::new(),
        settings: ChatSettings::default(),
        draft: ChatSettings::default(),
        live: None,
        backend: Arc::new(backend),
        stream,
        ui: UiState::new(false),
        logging: LoggingState::new(None),
        api_configured: true,
        cancel_token: None,
        current_stream_id: 0,
        in_flight_user_text: None,
    };
    (app, rx)
}
