pub mod components;
pub mod theme;

use crate::app::{
    AppState,
    event::{handle_key_event, handle_mouse_event},
};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Write};
use std::time::Duration;
use tracing::info;

const TICK: Duration = Duration::from_millis(50);

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = disable_raw_mode();
        let _ = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen);
        let _ = stdout.flush();
    }
}

/// Run the page until the user quits.
///
/// The loop itself is synchronous; a tokio runtime is entered for its whole
/// duration so clipboard completions and label timers can run in the
/// background and post their results back to the page.
pub fn run_tui(mut state: AppState) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let _runtime_guard = runtime.enter();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("page opened");
    let result = run_app(&mut terminal, &mut state);
    terminal.show_cursor()?;
    info!("page closed");

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    loop {
        state.page.run_pending();

        terminal.draw(|f| {
            components::render(f, state);
        })?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(key, state);
                }
                Event::Mouse(mouse) => handle_mouse_event(mouse, state),
                _ => {}
            }
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
