use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use tracing::info;

use crate::tui::app::Mode;
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::App;

/// Guard that restores the terminal even on panic, so the user's shell
/// is never left in raw mode or on the alternate screen.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        let mut guard = Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: false,
        };
        execute!(io::stdout(), EnterAlternateScreen)?;
        guard.alternate_screen_enabled = true;
        Ok(guard)
    }

    /// Restore terminal state on normal exit; drop then has nothing left to do
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already cleaning up; errors have nowhere to go
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check terminal size before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    info!(tasks = app.total_count, "tui started");

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let area = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(area);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only Press events; Windows also reports releases
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    info!("tui stopped");
    Ok(())
}

/// Apply one key press. Returns `true` when the user asked to quit.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    // Ctrl+C always quits, whatever the mode
    if key_event.code == KeyCode::Char('c') && key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(true);
    }

    match app.mode {
        Mode::Create | Mode::Rename | Mode::Search => handle_input_mode(app, key_event),
        Mode::ConfirmDelete | Mode::ConfirmDeleteCompleted => handle_confirm_mode(app, key_event),
        Mode::View => handle_view_mode(app, key_event),
    }
}

/// Run a store-backed action; failures become a status message
fn attempt<F>(app: &mut App, action: &str, f: F)
where
    F: FnOnce(&mut App) -> Result<(), TuiError>,
{
    if let Err(e) = f(app) {
        app.report_error(action, e);
    }
}

fn handle_input_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Enter => attempt(app, "save", App::submit_input),
        KeyCode::Esc => attempt(app, "cancel", App::cancel),
        KeyCode::Backspace => attempt(app, "search", App::pop_input_char),
        KeyCode::Char(c) if !key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            attempt(app, "search", |app| app.push_input_char(c))
        }
        _ => {}
    }
    Ok(false)
}

fn handle_confirm_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => attempt(app, "delete", App::confirm),
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => attempt(app, "cancel", App::cancel),
        _ => {}
    }
    Ok(false)
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let bindings = app.bindings.clone();

    if bindings.quit.matches(&key_event) {
        return Ok(true);
    }
    if bindings.list_down.matches(&key_event) || key_event.code == KeyCode::Down {
        app.select_next();
    } else if bindings.list_up.matches(&key_event) || key_event.code == KeyCode::Up {
        app.select_previous();
    } else if bindings.new.matches(&key_event) {
        app.start_create();
    } else if bindings.rename.matches(&key_event) {
        app.start_rename();
    } else if bindings.delete_completed.matches(&key_event) {
        app.request_delete_completed();
    } else if bindings.delete.matches(&key_event) {
        app.request_delete();
    } else if bindings.undo.matches(&key_event) {
        attempt(app, "undo", App::undo_delete);
    } else if bindings.toggle_completed.matches(&key_event) {
        attempt(app, "update task", App::toggle_completed);
    } else if bindings.toggle_important.matches(&key_event) {
        attempt(app, "update task", App::toggle_important);
    } else if bindings.toggle_hide_completed.matches(&key_event) {
        attempt(app, "filter tasks", App::toggle_hide_completed);
    } else if bindings.cycle_sort.matches(&key_event) {
        attempt(app, "sort tasks", App::cycle_sort_order);
    } else if bindings.search.matches(&key_event) {
        app.start_search();
    } else if key_event.code == KeyCode::Esc {
        app.clear_status_message();
    }
    Ok(false)
}
