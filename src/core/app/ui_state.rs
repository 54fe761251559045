/// Interface state that is not part of any transcript: the input line,
/// scroll position, transient status text, and the in-flight reply
/// accumulator. Nothing here survives into the session store until a turn
/// commits.
pub struct UiState {
    pub input: String,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub show_timestamps: bool,
    /// One-line transient feedback shown under the input area.
    pub status: Option<String>,
    /// Multi-line informational panel (help output, settings listing);
    /// cleared on the next submit.
    pub notice: Option<String>,
    /// Accumulator for the reply currently being received.
    pub current_response: String,
    /// Error text captured mid-turn; replaces the accumulator at commit.
    pub pending_error: Option<String>,
    pub awaiting_reply: bool,
    /// Whether the current turn renders incrementally (cursor marker) or
    /// shows a pending indicator until the full reply lands.
    pub streaming_turn: bool,
}

impl UiState {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            input: String::new(),
            scroll_offset: 0,
            auto_scroll: true,
            show_timestamps,
            status: None,
            notice: None,
            current_response: String::new(),
            pending_error: None,
            awaiting_reply: false,
            streaming_turn: false,
        }
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn begin_turn(&mut self, streaming: bool) {
        self.current_response.clear();
        self.pending_error = None;
        self.awaiting_reply = true;
        self.streaming_turn = streaming;
        self.auto_scroll = true;
    }

    pub fn finish_turn(&mut self) {
        self.current_response.clear();
        self.pending_error = None;
        self.awaiting_reply = false;
        self.streaming_turn = false;
    }
}
