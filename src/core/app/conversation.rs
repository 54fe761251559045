use crate::core::app::{App, NOT_CONFIGURED_STATUS};
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::message::Message;
use tokio_util::sync::CancellationToken;

/// Starter prompts offered while the active session is still empty:
/// (label, prompt text submitted on selection).
pub const STARTER_PROMPTS: &[(&str, &str)] = &[
    ("Say hello", "Hi! Tell me about yourself."),
    ("Get ideas", "Give me a creative idea"),
    ("Learn something", "Teach me something interesting"),
    ("Be creative", "Write me a short poem"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, nothing to do.
    Ignored,
    /// Rejected before any state change (not configured, busy, or the
    /// handle could not be built).
    Rejected,
    /// User message committed and a send is in flight.
    Sent,
}

impl App {
    /// One submitted user turn: commit the user message, then hand the
    /// send to the stream service. The reply (or an error) is applied
    /// incrementally through [`App::apply_stream_event`].
    pub fn submit_message(&mut self, text: &str) -> SubmitOutcome {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if !self.api_configured {
            self.ui.set_status(NOT_CONFIGURED_STATUS);
            return SubmitOutcome::Rejected;
        }
        if self.ui.awaiting_reply {
            self.ui.set_status("Still waiting for the previous reply.");
            return SubmitOutcome::Rejected;
        }

        self.ui.notice = None;
        self.ui.clear_status();

        // Handle construction happens before the user message is committed
        // so an initialization failure leaves the transcript untouched.
        if let Err(e) = self.ensure_live_chat() {
            self.ui.set_status(format!("Error initializing model: {e}"));
            return SubmitOutcome::Rejected;
        }
        let Some(live) = self.live.as_ref() else {
            return SubmitOutcome::Rejected;
        };
        let request = live.request_for(trimmed);

        let user_message = Message::user_now(trimmed);
        if let Err(e) = self
            .logging
            .log_message(&format!("You: {}", user_message.content))
        {
            tracing::warn!("failed to log message: {e}");
        }
        self.store.append_to_current(user_message);

        let cancel_token = CancellationToken::new();
        self.current_stream_id += 1;
        self.cancel_token = Some(cancel_token.clone());
        self.in_flight_user_text = Some(trimmed.to_string());
        self.ui.begin_turn(self.settings.streaming);

        self.stream.spawn_send(
            self.backend.clone(),
            StreamParams {
                model: self.settings.model.clone(),
                request,
                streaming: self.settings.streaming,
                cancel_token,
                stream_id: self.current_stream_id,
            },
        );

        SubmitOutcome::Sent
    }

    /// Apply one event drained from the stream channel. Events from a
    /// superseded stream id are dropped.
    pub fn apply_stream_event(&mut self, message: StreamMessage, stream_id: u64) {
        if stream_id != self.current_stream_id || !self.ui.awaiting_reply {
            return;
        }

        match message {
            StreamMessage::Chunk(text) => {
                // Empty fragments are legal; skip without ending the turn.
                if !text.is_empty() {
                    self.ui.current_response.push_str(&text);
                }
            }
            StreamMessage::Error(text) => {
                self.ui.pending_error = Some(text);
            }
            StreamMessage::End => self.commit_reply(),
        }
    }

    /// Turn the accumulated reply (or captured error) into a committed
    /// assistant message. Failures become part of the permanent transcript
    /// rather than aborting the conversation.
    fn commit_reply(&mut self) {
        let user_text = self.in_flight_user_text.take();
        let errored = self.ui.pending_error.is_some();
        let content = match self.ui.pending_error.take() {
            Some(error_text) => {
                // A mid-stream failure discards the partial reply, the way
                // the full turn would have been replaced by the error.
                self.ui.current_response.clear();
                error_text
            }
            None => std::mem::take(&mut self.ui.current_response),
        };

        if let Err(e) = self.logging.log_message(&content) {
            tracing::warn!("failed to log message: {e}");
        }

        let reply = Message::assistant_now(content);
        if !errored {
            if let (Some(live), Some(user_text)) = (self.live.as_mut(), user_text.as_deref()) {
                live.record_turn(user_text, &reply.content);
            }
        }
        // The handle is not advanced on error; the next send reseeds it
        // from the store, error text included.
        self.store.append_to_current(reply);

        self.cancel_token = None;
        self.ui.finish_turn();
    }

    /// True while the starter prompts should be offered.
    pub fn offers_starter_prompts(&self) -> bool {
        self.store.active_messages().is_empty() && !self.ui.awaiting_reply
    }

    /// Submit one of the starter prompts by index.
    pub fn submit_starter_prompt(&mut self, index: usize) -> SubmitOutcome {
        if !self.offers_starter_prompts() {
            return SubmitOutcome::Ignored;
        }
        match STARTER_PROMPTS.get(index) {
            Some((_, prompt)) => self.submit_message(prompt),
            None => SubmitOutcome::Ignored,
        }
    }
}
