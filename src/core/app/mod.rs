use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::auth::resolve_api_key;
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::client::{ChatBackend, GeminiClient, LiveChat, DEFAULT_BASE_URL};
use crate::core::config::Config;
use crate::core::personality::lookup_prompt;
use crate::core::settings::{ChatSettings, SettingsDelta};
use crate::core::store::SessionStore;
use crate::utils::logging::LoggingState;

pub mod conversation;
pub mod ui_state;

pub use ui_state::UiState;

pub const NOT_CONFIGURED_STATUS: &str =
    "Not configured: set GEMINI_API_KEY (or api_key in config.toml) and restart.";

/// Startup parameters gathered from the command line.
pub struct AppInitConfig {
    pub model: Option<String>,
    pub personality: Option<String>,
    pub log_file: Option<String>,
}

pub struct App {
    pub store: SessionStore,
    /// The applied settings every send runs under.
    pub settings: ChatSettings,
    /// Staged edits; committed only by `/apply`.
    pub draft: ChatSettings,
    pub live: Option<LiveChat>,
    pub backend: Arc<dyn ChatBackend>,
    pub stream: ChatStreamService,
    pub ui: UiState,
    pub logging: LoggingState,
    pub api_configured: bool,
    pub cancel_token: Option<CancellationToken>,
    pub current_stream_id: u64,
    pub in_flight_user_text: Option<String>,
}

/// Build the app from config and CLI flags. A missing credential is not an
/// error here: the app starts in a disabled state and every submit is
/// rejected before any network call.
pub fn bootstrap(
    init: AppInitConfig,
    config: &Config,
) -> Result<(App, mpsc::UnboundedReceiver<(StreamMessage, u64)>), Box<dyn std::error::Error>> {
    let api_key = resolve_api_key(config);
    let api_configured = api_key.is_some();

    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let backend: Arc<dyn ChatBackend> =
        Arc::new(GeminiClient::new(base_url, api_key.unwrap_or_default()));

    let mut settings = ChatSettings::default();
    if let Some(model) = config.default_model.clone() {
        settings = settings.with_model(model);
    }
    if let Some(personality) = config.default_personality.clone() {
        settings = settings.with_personality(personality);
    }
    if let Some(streaming) = config.streaming {
        settings = settings.with_streaming(streaming);
    }
    if let Some(model) = init.model {
        settings = settings.with_model(model);
    }
    if let Some(personality) = init.personality {
        settings = settings.with_personality(personality);
    }
    // Fail fast on a personality that cannot resolve to a system prompt.
    lookup_prompt(&settings.personality)?;

    let (stream, rx) = ChatStreamService::new();
    let ui = UiState::new(config.show_timestamps.unwrap_or(false));

    let mut app = App {
        store: SessionStore::new(),
        draft: settings.clone(),
        settings,
        live: None,
        backend,
        stream,
        ui,
        logging: LoggingState::new(init.log_file),
        api_configured,
        cancel_token: None,
        current_stream_id: 0,
        in_flight_user_text: None,
    };

    if !app.api_configured {
        app.ui.set_status(NOT_CONFIGURED_STATUS);
    }

    Ok((app, rx))
}

impl App {
    /// Rebuild the live chat handle from the authoritative store when it is
    /// absent or its rebuild key no longer matches.
    pub fn ensure_live_chat(&mut self) -> Result<(), String> {
        let needs_rebuild = match &self.live {
            Some(live) => live.is_stale(&self.settings, self.store.current_session()),
            None => true,
        };
        if needs_rebuild {
            self.live = Some(LiveChat::build(&self.settings, self.store.current_session())?);
        }
        Ok(())
    }

    fn rebuild_live_chat(&mut self) {
        match LiveChat::build(&self.settings, self.store.current_session()) {
            Ok(live) => self.live = Some(live),
            Err(e) => {
                // Leaves the previous handle discarded rather than stale.
                self.live = None;
                self.ui.set_status(format!("Error initializing model: {e}"));
            }
        }
    }

    /// Commit the staged settings. The handle is rebuilt even when nothing
    /// changed, reseeding it from the current session either way.
    pub fn apply_settings(&mut self) -> Result<SettingsDelta, String> {
        if self.ui.awaiting_reply {
            return Err("Wait for the current reply before applying settings.".into());
        }
        lookup_prompt(&self.draft.personality)?;
        if self.draft.model.trim().is_empty() {
            return Err("Model may not be empty.".into());
        }

        let delta = ChatSettings::apply(&self.settings, &self.draft);
        self.settings = delta.next.clone();
        self.draft = self.settings.clone();
        self.rebuild_live_chat();
        Ok(delta)
    }

    pub fn new_session(&mut self) -> Result<String, String> {
        if self.ui.awaiting_reply {
            return Err("Wait for the current reply before switching sessions.".into());
        }
        let name = self.store.create_session().to_string();
        self.rebuild_live_chat();
        Ok(name)
    }

    pub fn switch_session(&mut self, name: &str) -> Result<(), String> {
        if self.ui.awaiting_reply {
            return Err("Wait for the current reply before switching sessions.".into());
        }
        self.store.switch_session(name)?;
        self.rebuild_live_chat();
        Ok(())
    }

    /// Empty the current session's transcript; the session itself and the
    /// current pointer are untouched, and the handle reseeds empty.
    pub fn clear_current_session(&mut self) -> Result<(), String> {
        if self.ui.awaiting_reply {
            return Err("Wait for the current reply before clearing.".into());
        }
        let name = self.store.current_name().to_string();
        self.store.clear_session(&name)?;
        self.rebuild_live_chat();
        Ok(())
    }

    /// (user, assistant) message counts for the active session.
    pub fn message_stats(&self) -> (usize, usize) {
        let messages = self.store.active_messages();
        let user = messages.iter().filter(|m| m.is_user()).count();
        let assistant = messages.iter().filter(|m| m.is_assistant()).count();
        (user, assistant)
    }

    /// Cancel any in-flight send; used on shutdown only.
    pub fn shutdown(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}
