use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::core::app::conversation::STARTER_PROMPTS;
use crate::core::app::App;

/// Cursor marker appended to a reply while fragments are still arriving.
const STREAM_CURSOR: &str = "▌";

/// Rows taken by the input box and status line below the transcript.
pub const CHROME_HEIGHT: u16 = 4;

fn stamp_span(timestamp: &str) -> Span<'static> {
    Span::styled(
        format!("  {timestamp}"),
        Style::default().fg(Color::DarkGray),
    )
}

/// Flatten the app state into renderable transcript lines: committed
/// messages, then the in-flight reply, then the starter-prompt panel or
/// notice when they apply.
pub fn build_display_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if !app.api_configured {
        lines.push(Line::from(Span::styled(
            "API not configured — chat is disabled.",
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            "Set GEMINI_API_KEY (or api_key in config.toml) and restart.",
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(""));
    }

    if let Some(notice) = &app.ui.notice {
        for notice_line in notice.lines() {
            lines.push(Line::from(Span::styled(
                notice_line.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
    }

    for msg in app.store.active_messages() {
        if msg.is_user() {
            let mut spans = vec![
                Span::styled(
                    "You: ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(msg.content.clone(), Style::default().fg(Color::Cyan)),
            ];
            if app.ui.show_timestamps {
                spans.push(stamp_span(&msg.timestamp));
            }
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        } else {
            for content_line in msg.content.lines() {
                if content_line.trim().is_empty() {
                    lines.push(Line::from(""));
                } else {
                    lines.push(Line::from(Span::styled(
                        content_line.to_string(),
                        Style::default().fg(Color::White),
                    )));
                }
            }
            if app.ui.show_timestamps {
                lines.push(Line::from(stamp_span(&msg.timestamp)));
            }
            lines.push(Line::from(""));
        }
    }

    if app.ui.awaiting_reply {
        if app.ui.streaming_turn {
            let mut reply_lines: Vec<&str> = app.ui.current_response.lines().collect();
            let last = reply_lines.pop().unwrap_or("");
            for content_line in reply_lines {
                lines.push(Line::from(Span::styled(
                    content_line.to_string(),
                    Style::default().fg(Color::White),
                )));
            }
            lines.push(Line::from(vec![
                Span::styled(last.to_string(), Style::default().fg(Color::White)),
                Span::styled(STREAM_CURSOR, Style::default().fg(Color::Green)),
            ]));
        } else {
            lines.push(Line::from(Span::styled(
                "Thinking…",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::from(""));
    }

    if app.api_configured && app.offers_starter_prompts() && app.ui.notice.is_none() {
        lines.push(Line::from(Span::styled(
            "Start a conversation:",
            Style::default().fg(Color::DarkGray),
        )));
        for (index, (label, prompt)) in STARTER_PROMPTS.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  Alt+{}  ", index + 1),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(format!("{label} — "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("\"{prompt}\""),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }
        lines.push(Line::from(""));
    }

    lines
}

pub fn max_scroll_offset(app: &App, available_height: u16) -> u16 {
    let total_lines = build_display_lines(app).len() as u16;
    total_lines.saturating_sub(available_height)
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    let lines = build_display_lines(app);

    let available_height = chunks[0].height.saturating_sub(1);
    let total_lines = lines.len() as u16;
    let max_offset = total_lines.saturating_sub(available_height);
    let scroll_offset = if app.ui.auto_scroll {
        max_offset
    } else {
        app.ui.scroll_offset.min(max_offset)
    };

    let title = if app.api_configured {
        format!(
            "causerie — {} · {}",
            app.settings.personality, app.settings.model
        )
    } else {
        "causerie — not configured".to_string()
    };

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(title))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(transcript, chunks[0]);

    let input = Paragraph::new(app.ui.input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Type your message (Enter to send, /help for commands)"),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(input, chunks[1]);

    let (user_count, assistant_count) = app.message_stats();
    let status_text = match &app.ui.status {
        Some(status) => status.clone(),
        None => format!(
            "{} · you {} · AI {} · streaming {}",
            app.store.current_name(),
            user_count,
            assistant_count,
            if app.settings.streaming { "on" } else { "off" }
        ),
    };
    let status = Paragraph::new(status_text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(status, chunks[2]);

    f.set_cursor_position((
        chunks[1].x + app.ui.input.len() as u16 + 1,
        chunks[1].y + 1,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{create_test_app, ScriptedBackend};

    #[test]
    fn starter_prompts_render_only_on_an_empty_session() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        let rendered = |app: &App| {
            build_display_lines(app)
                .iter()
                .map(|l| {
                    l.spans
                        .iter()
                        .map(|s| s.content.clone().into_owned())
                        .collect::<String>()
                })
                .collect::<Vec<String>>()
                .join("\n")
        };

        assert!(rendered(&app).contains("Start a conversation:"));

        app.store
            .append_to_current(crate::core::message::Message::new(
                crate::core::message::Role::User,
                "hi",
                "10:00 AM",
            ));
        assert!(!rendered(&app).contains("Start a conversation:"));
    }

    #[test]
    fn streaming_turn_shows_the_cursor_marker() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        app.ui.begin_turn(true);
        app.ui.current_response.push_str("Hel");

        let lines = build_display_lines(&app);
        let flattened: String = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .map(|s| s.content.clone().into_owned())
            .collect();
        assert!(flattened.contains("Hel▌"));
    }

    #[test]
    fn non_streaming_turn_shows_the_pending_indicator() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        app.ui.begin_turn(false);

        let lines = build_display_lines(&app);
        let flattened: String = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .map(|s| s.content.clone().into_owned())
            .collect();
        assert!(flattened.contains("Thinking…"));
        assert!(!flattened.contains('▌'));
    }

    #[test]
    fn unconfigured_app_renders_the_banner() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        app.api_configured = false;

        let lines = build_display_lines(&app);
        let flattened: String = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .map(|s| s.content.clone().into_owned())
            .collect();
        assert!(flattened.contains("API not configured"));
        assert!(!flattened.contains("Start a conversation:"));
    }

    #[test]
    fn timestamps_render_only_when_enabled() {
        let (mut app, _rx) = create_test_app(ScriptedBackend::replying(&[]));
        app.store
            .append_to_current(crate::core::message::Message::new(
                crate::core::message::Role::User,
                "hi",
                "10:00 AM",
            ));

        let without: Vec<Line> = build_display_lines(&app);
        app.ui.show_timestamps = true;
        let with: Vec<Line> = build_display_lines(&app);

        let flatten = |lines: &[Line]| -> String {
            lines
                .iter()
                .flat_map(|l| l.spans.iter())
                .map(|s| s.content.clone().into_owned())
                .collect()
        };
        assert!(!flatten(&without).contains("10:00 AM"));
        assert!(flatten(&with).contains("10:00 AM"));
    }
}
