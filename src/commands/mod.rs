mod registry;

pub use registry::{all_commands, find_command, CommandInvocation};

use chrono::{Local, Utc};
use std::path::Path;

use crate::core::app::App;
use crate::core::export::{build_export, default_filename, write_export, ExportError};
use crate::core::personality::{all_personalities, find_personality};
use crate::core::settings::{ChatSettings, KNOWN_MODELS, MAX_TOKENS_RANGE, TEMPERATURE_RANGE};

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation {
            input: trimmed,
            args,
        };
        (command.handler)(app, invocation)
    } else {
        app.ui
            .set_status(format!("Unknown command: /{command_name} (see /help)"));
        CommandResult::Continue
    }
}

fn usage_status(app: &mut App, usage: &str) -> CommandResult {
    app.ui.set_status(format!("Usage: {usage}"));
    CommandResult::Continue
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Commands:\n");
    for command in all_commands() {
        help.push_str(&format!("  {:<24} {}\n", command.usage, command.help));
    }
    help.push_str("\nKeys:\n");
    help.push_str("  Enter                    Send the message\n");
    help.push_str("  Up/Down, PgUp/PgDn       Scroll the transcript\n");
    help.push_str("  Alt+1..4                 Pick a starter prompt (empty session)\n");
    help.push_str("  Ctrl+C                   Quit\n");
    app.ui.set_notice(help);
    CommandResult::Continue
}

pub(super) fn handle_new(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.new_session() {
        Ok(name) => app.ui.set_status(format!("Created {name}")),
        Err(e) => app.ui.set_status(e),
    }
    CommandResult::Continue
}

pub(super) fn handle_session(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return usage_status(app, "/session <name>");
    }
    match app.switch_session(invocation.args) {
        Ok(()) => {
            let status = format!("Switched to {}", app.store.current_name());
            app.ui.set_status(status);
        }
        Err(e) => app.ui.set_status(e),
    }
    CommandResult::Continue
}

pub(super) fn handle_sessions(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let current = app.store.current_name().to_string();
    let mut listing = String::from("Sessions:\n");
    let names: Vec<String> = app.store.session_names().map(str::to_string).collect();
    for name in names {
        let count = app
            .store
            .session(&name)
            .map(|s| s.messages.len())
            .unwrap_or(0);
        let marker = if name == current { "*" } else { " " };
        listing.push_str(&format!("  {marker} {name} ({count} messages)\n"));
    }
    app.ui.set_notice(listing);
    CommandResult::Continue
}

pub(super) fn handle_personality(
    app: &mut App,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        let mut listing = String::from("Personalities:\n");
        for personality in all_personalities() {
            let marker = if personality.id == app.settings.personality {
                "*"
            } else {
                " "
            };
            listing.push_str(&format!("  {marker} {}\n", personality.id));
        }
        listing.push_str("\nStage one with /personality <id>, then /apply.\n");
        app.ui.set_notice(listing);
        return CommandResult::Continue;
    }

    match find_personality(invocation.args) {
        Some(personality) => {
            app.draft = app.draft.clone().with_personality(personality.id);
            app.ui.set_status(format!(
                "Staged personality '{}' (commit with /apply)",
                personality.id
            ));
        }
        None => app.ui.set_status(format!(
            "Unknown personality '{}'; see /personality",
            invocation.args
        )),
    }
    CommandResult::Continue
}

pub(super) fn handle_set(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let mut parts = invocation.args.splitn(2, ' ');
    let (Some(field), Some(value)) = (parts.next(), parts.next().map(str::trim)) else {
        return usage_status(app, "/set <field> <value>");
    };

    match field {
        "model" => {
            if KNOWN_MODELS.contains(&value) {
                app.draft = app.draft.clone().with_model(value);
                app.ui
                    .set_status(format!("Staged model '{value}' (commit with /apply)"));
            } else {
                app.ui.set_status(format!(
                    "Unknown model '{}'. Known models: {}",
                    value,
                    KNOWN_MODELS.join(", ")
                ));
            }
        }
        "temperature" => match value.parse::<f64>() {
            Ok(temperature)
                if (TEMPERATURE_RANGE.0..=TEMPERATURE_RANGE.1).contains(&temperature) =>
            {
                app.draft = app.draft.clone().with_temperature(temperature);
                app.ui
                    .set_status(format!("Staged temperature {temperature} (commit with /apply)"));
            }
            _ => app.ui.set_status(format!(
                "Temperature must be a number in [{}, {}]",
                TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1
            )),
        },
        "max-tokens" => match value.parse::<u32>() {
            Ok(tokens) if (MAX_TOKENS_RANGE.0..=MAX_TOKENS_RANGE.1).contains(&tokens) => {
                app.draft = app.draft.clone().with_max_output_tokens(tokens);
                app.ui
                    .set_status(format!("Staged max tokens {tokens} (commit with /apply)"));
            }
            _ => app.ui.set_status(format!(
                "Max tokens must be an integer in [{}, {}]",
                MAX_TOKENS_RANGE.0, MAX_TOKENS_RANGE.1
            )),
        },
        "personality" => {
            return handle_personality(
                app,
                CommandInvocation {
                    input: invocation.input,
                    args: value,
                },
            );
        }
        "streaming" => match value {
            "on" | "true" => {
                app.draft = app.draft.clone().with_streaming(true);
                app.ui.set_status("Staged streaming on (commit with /apply)");
            }
            "off" | "false" => {
                app.draft = app.draft.clone().with_streaming(false);
                app.ui
                    .set_status("Staged streaming off (commit with /apply)");
            }
            _ => app.ui.set_status("Streaming must be 'on' or 'off'"),
        },
        _ => {
            app.ui.set_status(
                "Unknown field; expected model, temperature, max-tokens, personality, or streaming",
            );
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_apply(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.apply_settings() {
        Ok(delta) if delta.changed => app.ui.set_status("Settings applied."),
        Ok(_) => app
            .ui
            .set_status("Settings unchanged; conversation reseeded."),
        Err(e) => app.ui.set_status(format!("Apply failed: {e}")),
    }
    CommandResult::Continue
}

fn settings_lines(settings: &ChatSettings) -> String {
    format!(
        "  model:        {}\n  temperature:  {}\n  max-tokens:   {}\n  personality:  {}\n  streaming:    {}\n",
        settings.model,
        settings.temperature,
        settings.max_output_tokens,
        settings.personality,
        if settings.streaming { "on" } else { "off" }
    )
}

pub(super) fn handle_settings(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut notice = String::from("Applied settings:\n");
    notice.push_str(&settings_lines(&app.settings));
    if app.draft != app.settings {
        notice.push_str("\nStaged (commit with /apply):\n");
        notice.push_str(&settings_lines(&app.draft));
    }
    app.ui.set_notice(notice);
    CommandResult::Continue
}

pub(super) fn handle_clear(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.clear_current_session() {
        Ok(()) => {
            let status = format!("Cleared {}", app.store.current_name());
            app.ui.set_status(status);
        }
        Err(e) => app.ui.set_status(e),
    }
    CommandResult::Continue
}

pub(super) fn handle_export(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let filename = if invocation.args.is_empty() {
        default_filename(Local::now())
    } else {
        invocation.args.to_string()
    };

    let export = match build_export(app.store.current_session(), &app.settings, Utc::now()) {
        Ok(export) => export,
        Err(ExportError::EmptySession) => {
            app.ui.set_status("No messages to export");
            return CommandResult::Continue;
        }
        Err(e) => {
            app.ui.set_status(format!("Export error: {e}"));
            return CommandResult::Continue;
        }
    };

    match write_export(&export, Path::new(&filename)) {
        Ok(()) => app.ui.set_status(format!("Exported: {filename}")),
        Err(e) => app.ui.set_status(format!("Export error: {e}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_timestamps(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    app.ui.show_timestamps = !app.ui.show_timestamps;
    if app.ui.show_timestamps {
        app.ui.set_status("Timestamps shown");
    } else {
        app.ui.set_status("Timestamps hidden");
    }
    CommandResult::Continue
}

pub(super) fn handle_stats(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let (user, assistant) = app.message_stats();
    let status = format!(
        "{}: you {user} · AI {assistant}",
        app.store.current_name()
    );
    app.ui.set_status(status);
    CommandResult::Continue
}

pub(super) fn handle_log(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        match app.logging.toggle_logging() {
            Ok(message) => app.ui.set_status(message),
            Err(e) => app.ui.set_status(format!("Log error: {e}")),
        }
    } else {
        match app.logging.set_log_file(invocation.args.to_string()) {
            Ok(message) => app.ui.set_status(message),
            Err(e) => app.ui.set_status(format!("Logfile error: {e}")),
        }
    }
    CommandResult::Continue
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{create_test_app, ScriptedBackend};

    #[test]
    fn non_commands_pass_through_as_messages() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        match process_input(&mut app, "hello there") {
            CommandResult::ProcessAsMessage(text) => assert_eq!(text, "hello there"),
            _ => panic!("expected pass-through"),
        }
    }

    #[test]
    fn unknown_commands_report_instead_of_sending() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        assert!(matches!(
            process_input(&mut app, "/frobnicate"),
            CommandResult::Continue
        ));
        assert!(app.ui.status.as_deref().unwrap().contains("/frobnicate"));
    }

    #[test]
    fn set_stages_without_touching_applied_settings() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));

        process_input(&mut app, "/set temperature 1.4");
        assert_eq!(app.draft.temperature, 1.4);
        assert_eq!(app.settings.temperature, 0.7);

        process_input(&mut app, "/apply");
        assert_eq!(app.settings.temperature, 1.4);
        assert!(app.live.is_some());
    }

    #[test]
    fn set_rejects_out_of_range_values() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));

        process_input(&mut app, "/set temperature 9.5");
        assert_eq!(app.draft.temperature, 0.7);

        process_input(&mut app, "/set max-tokens 10");
        assert_eq!(app.draft.max_output_tokens, 2000);

        process_input(&mut app, "/set model gpt-4o");
        assert_eq!(app.draft.model, "gemini-flash-latest");
    }

    #[test]
    fn personality_staging_requires_a_known_id() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));

        process_input(&mut app, "/personality creative");
        assert_eq!(app.draft.personality, "creative");
        assert_eq!(app.settings.personality, "friendly");

        process_input(&mut app, "/personality bogus");
        assert_eq!(app.draft.personality, "creative");
        assert!(app.ui.status.as_deref().unwrap().contains("bogus"));
    }

    #[test]
    fn session_commands_create_switch_and_list() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));

        process_input(&mut app, "/new");
        assert_eq!(app.store.current_name(), "Session 2");

        process_input(&mut app, "/session Session 1");
        assert_eq!(app.store.current_name(), "Session 1");

        process_input(&mut app, "/session Session 7");
        assert!(app.ui.status.as_deref().unwrap().contains("Session 7"));

        process_input(&mut app, "/sessions");
        let notice = app.ui.notice.as_deref().unwrap();
        assert!(notice.contains("* Session 1"));
        assert!(notice.contains("  Session 2"));
    }

    #[test]
    fn export_of_an_empty_session_is_a_notice_not_a_file() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("empty.json");

        process_input(&mut app, &format!("/export {}", path.display()));

        assert_eq!(app.ui.status.as_deref(), Some("No messages to export"));
        assert!(!path.exists());
    }

    #[test]
    fn export_writes_the_current_session() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        app.store
            .append_to_current(crate::core::message::Message::new(
                crate::core::message::Role::User,
                "hi",
                "10:00 AM",
            ));
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        process_input(&mut app, &format!("/export {}", path.display()));

        assert!(path.exists());
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["session"], "Session 1");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn timestamps_and_stats_report_through_status() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));

        process_input(&mut app, "/timestamps");
        assert!(app.ui.show_timestamps);

        process_input(&mut app, "/stats");
        assert!(app.ui.status.as_deref().unwrap().contains("you 0"));
    }

    #[test]
    fn quit_command_exits_the_loop() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        assert!(matches!(process_input(&mut app, "/quit"), CommandResult::Quit));
    }
}
