use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::commands::{self, CommandResult};
use crate::core::app::App;
use crate::core::chat_stream::StreamMessage;
use crate::ui::layout::{self, CHROME_HEIGHT};

type StreamReceiver = mpsc::UnboundedReceiver<(StreamMessage, u64)>;

/// Set up the terminal, run the event loop, and restore the terminal on
/// the way out regardless of how the loop ended.
pub async fn run_chat(
    mut app: App,
    mut rx: StreamReceiver,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &mut rx).await;

    app.shutdown();
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn transcript_height(terminal: &Terminal<CrosstermBackend<io::Stdout>>) -> u16 {
    let height = terminal.size().map(|size| size.height).unwrap_or_default();
    // Chrome below the transcript plus its title row.
    height.saturating_sub(CHROME_HEIGHT).saturating_sub(1)
}

fn scroll_up(app: &mut App, available_height: u16, step: u16) {
    let max = layout::max_scroll_offset(app, available_height);
    if app.ui.auto_scroll {
        app.ui.auto_scroll = false;
        app.ui.scroll_offset = max;
    }
    app.ui.scroll_offset = app.ui.scroll_offset.saturating_sub(step);
}

fn scroll_down(app: &mut App, available_height: u16, step: u16) {
    let max = layout::max_scroll_offset(app, available_height);
    app.ui.scroll_offset = app.ui.scroll_offset.saturating_add(step).min(max);
    if app.ui.scroll_offset >= max {
        app.ui.auto_scroll = true;
    }
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut StreamReceiver,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| layout::draw(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char(c)
                        if key.modifiers.contains(KeyModifiers::ALT)
                            && ('1'..='4').contains(&c) =>
                    {
                        let index = (c as u8 - b'1') as usize;
                        app.submit_starter_prompt(index);
                    }
                    KeyCode::Enter => {
                        let input = std::mem::take(&mut app.ui.input);
                        if input.trim().is_empty() {
                            continue;
                        }
                        match commands::process_input(app, &input) {
                            CommandResult::Continue => {}
                            CommandResult::ProcessAsMessage(text) => {
                                app.submit_message(&text);
                            }
                            CommandResult::Quit => return Ok(()),
                        }
                    }
                    KeyCode::Char(c) => {
                        app.ui.input.push(c);
                    }
                    KeyCode::Backspace => {
                        app.ui.input.pop();
                    }
                    KeyCode::Up => {
                        let height = transcript_height(terminal);
                        scroll_up(app, height, 1);
                    }
                    KeyCode::Down => {
                        let height = transcript_height(terminal);
                        scroll_down(app, height, 1);
                    }
                    KeyCode::PageUp => {
                        let height = transcript_height(terminal);
                        scroll_up(app, height, height.max(1));
                    }
                    KeyCode::PageDown => {
                        let height = transcript_height(terminal);
                        scroll_down(app, height, height.max(1));
                    }
                    _ => {}
                },
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => {
                        let height = transcript_height(terminal);
                        scroll_up(app, height, 3);
                    }
                    MouseEventKind::ScrollDown => {
                        let height = transcript_height(terminal);
                        scroll_down(app, height, 3);
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Drain every stream event that arrived since the last draw; each
        // fragment is applied before the next frame renders.
        let mut received_any = false;
        while let Ok((message, stream_id)) = rx.try_recv() {
            app.apply_stream_event(message, stream_id);
            received_any = true;
        }
        if received_any {
            continue;
        }
    }
}
