use std::error::Error as StdError;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::core::message::Message;
use crate::core::settings::ChatSettings;
use crate::core::store::Session;

/// One-shot export document. Serialize-only: there is no import path for
/// this format.
#[derive(Debug, Serialize, PartialEq)]
pub struct ChatExport {
    pub session: String,
    pub exported_at: String,
    pub model: String,
    pub personality: String,
    pub messages: Vec<Message>,
}

#[derive(Debug)]
pub enum ExportError {
    EmptySession,
    Io(std::io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::EmptySession => write!(f, "No messages to export"),
            ExportError::Io(e) => write!(f, "Export failed: {e}"),
            ExportError::Serialize(e) => write!(f, "Export failed: {e}"),
        }
    }
}

impl StdError for ExportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ExportError::EmptySession => None,
            ExportError::Io(e) => Some(e),
            ExportError::Serialize(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

/// Snapshot a session into an export document. Refuses empty sessions so
/// the caller can show a notice instead of writing an empty file.
pub fn build_export(
    session: &Session,
    settings: &ChatSettings,
    exported_at: DateTime<Utc>,
) -> Result<ChatExport, ExportError> {
    if session.messages.is_empty() {
        return Err(ExportError::EmptySession);
    }

    Ok(ChatExport {
        session: session.name.clone(),
        exported_at: exported_at.to_rfc3339(),
        model: settings.model.clone(),
        personality: settings.personality.clone(),
        messages: session.messages.clone(),
    })
}

/// Default export filename, stamped to the second: `chat_20240131_142502.json`.
pub fn default_filename(now: DateTime<Local>) -> String {
    format!("chat_{}.json", now.format("%Y%m%d_%H%M%S"))
}

pub fn write_export(export: &ChatExport, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, export).map_err(ExportError::Serialize)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{Message, Role};
    use crate::core::store::SessionStore;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn populated_store() -> SessionStore {
        let mut store = SessionStore::new();
        store.append_to_current(Message::new(Role::User, "hello", "09:15 AM"));
        store.append_to_current(Message::new(Role::Assistant, "hi there", "09:15 AM"));
        store
    }

    #[test]
    fn export_deep_equals_the_live_transcript() {
        let store = populated_store();
        let settings = ChatSettings::default();
        let stamp = Utc.with_ymd_and_hms(2024, 1, 31, 14, 25, 2).unwrap();

        let export = build_export(store.current_session(), &settings, stamp).unwrap();
        assert_eq!(export.session, "Session 1");
        assert_eq!(export.model, settings.model);
        assert_eq!(export.personality, "friendly");
        assert_eq!(export.messages, store.current_session().messages);
        assert_eq!(export.exported_at, "2024-01-31T14:25:02+00:00");
    }

    #[test]
    fn empty_sessions_refuse_to_export() {
        let store = SessionStore::new();
        let err = build_export(
            store.current_session(),
            &ChatSettings::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::EmptySession));
    }

    #[test]
    fn written_document_has_the_flat_layout() {
        let store = populated_store();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.json");
        let stamp = Utc.with_ymd_and_hms(2024, 1, 31, 14, 25, 2).unwrap();

        let export = build_export(store.current_session(), &ChatSettings::default(), stamp).unwrap();
        write_export(&export, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["session"], "Session 1");
        assert_eq!(value["model"], "gemini-flash-latest");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert_eq!(value["messages"][0]["timestamp"], "09:15 AM");
        assert_eq!(value["messages"][1]["role"], "assistant");
    }

    #[test]
    fn default_filenames_are_second_stamped() {
        let stamp = Local.with_ymd_and_hms(2024, 1, 31, 14, 25, 2).unwrap();
        assert_eq!(default_filename(stamp), "chat_20240131_142502.json");
    }
}
