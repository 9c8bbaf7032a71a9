use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{parse_percent, scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

/// Share step for `+`/`-`; `<`/`>` move five steps.
const STEP: f64 = 1.0;
const BIG_STEP: f64 = 5.0;

pub(crate) fn as_tui(config: &Config, db: &mut Database) -> Result<()> {
    let mut app = App::new(config)?;
    app.refresh_all(db)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    info!("tui started");

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        app.sync_usage();
        terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if app.show_help {
                app.show_help = false;
                continue;
            }
            let handled = match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db),
                InputMode::Command => handle_command_input(key, app, db),
                InputMode::Editing => handle_editing_input(key, app, db),
                InputMode::Confirm => handle_confirm_input(key, app, db),
            };
            // Failed edits leave the planner as it was; report and keep going.
            if let Err(e) = handled {
                warn!(error = %e, "action failed");
                app.input_mode = InputMode::Normal;
                app.set_status(format!("Error: {e}"));
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('j') | KeyCode::Down => move_cursor(app, Motion::Down),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(app, Motion::Up),
        KeyCode::Char('1') => switch_screen(app, db, Screen::Planner)?,
        KeyCode::Char('2') => switch_screen(app, db, Screen::Expenses)?,
        KeyCode::Char('3') => switch_screen(app, db, Screen::Trips)?,
        KeyCode::Tab => cycle_screen(app, db, 1)?,
        KeyCode::BackTab => cycle_screen(app, db, Screen::all().len() - 1)?,
        KeyCode::Enter => handle_enter(app, db)?,
        KeyCode::Esc => app.set_status(""),
        KeyCode::Char('+') | KeyCode::Char('=') if app.screen == Screen::Planner => {
            app.adjust_selected(db, STEP)?;
        }
        KeyCode::Char('-') if app.screen == Screen::Planner => {
            app.adjust_selected(db, -STEP)?;
        }
        KeyCode::Char('>') if app.screen == Screen::Planner => {
            app.adjust_selected(db, BIG_STEP)?;
        }
        KeyCode::Char('<') if app.screen == Screen::Planner => {
            app.adjust_selected(db, -BIG_STEP)?;
        }
        KeyCode::Char('l') if app.screen == Screen::Planner => {
            app.toggle_selected_lock(db)?;
        }
        KeyCode::Char('e') if app.screen == Screen::Planner => start_editing(app),
        KeyCode::Char('g') => move_cursor(app, Motion::Top),
        KeyCode::Char('G') => move_cursor(app, Motion::Bottom),
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('D') if app.screen == Screen::Expenses => {
            commands::handle_command("delete-expense", app, db)?;
        }
        KeyCode::Char('D') if app.screen == Screen::Trips => {
            commands::handle_command("delete-trip", app, db)?;
        }
        _ => {}
    }
    Ok(())
}

fn start_editing(app: &mut App) {
    let Some(current) = app.selected_category().map(|c| c.percentage) else {
        return;
    };
    app.command_input = format!("{current:.1}");
    app.input_mode = InputMode::Editing;
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

/// Typing a share for the selected category.
fn handle_editing_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = std::mem::take(&mut app.command_input);
            app.input_mode = InputMode::Normal;
            let key = app.selected_category().map(|c| c.key.clone());
            match (key, parse_percent(&input)) {
                (Some(key), Ok(value)) => app.set_percentage(db, &key, value)?,
                (None, _) => {}
                (_, Err(e)) => app.set_status(e.to_string()),
            }
        }
        KeyCode::Esc => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            app.set_status("Edit cancelled");
        }
        KeyCode::Backspace => {
            app.command_input.pop();
        }
        KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '%' => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            if let Some(action) = app.pending_action.take() {
                commands::execute_pending(action, app, db)?;
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
    Ok(())
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    if screen == Screen::Trips {
        app.refresh_trips(db)?;
    }
    app.set_status(format!("{screen}"));
    Ok(())
}

/// Move `step` tabs to the right, wrapping around.
fn cycle_screen(app: &mut App, db: &mut Database, step: usize) -> Result<()> {
    let screens = Screen::all();
    let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
    switch_screen(app, db, screens[(idx + step) % screens.len()])
}

fn handle_enter(app: &mut App, db: &mut Database) -> Result<()> {
    match app.screen {
        Screen::Trips => {
            let Some((id, name)) = app
                .selected_trip()
                .and_then(|t| t.id.map(|id| (id, t.name.clone())))
            else {
                return Ok(());
            };
            app.open_trip(db, id)?;
            app.screen = Screen::Planner;
            app.set_status(format!("Opened {name}"));
        }
        Screen::Planner => start_editing(app),
        Screen::Expenses => {}
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Motion {
    Down,
    Up,
    Top,
    Bottom,
}

fn move_cursor(app: &mut App, motion: Motion) {
    let page = app.visible_rows;
    let (len, index, scroll) = match app.screen {
        Screen::Planner => {
            // The category table always fits; it has no scroll offset.
            let len = app.state().categories.len();
            app.category_index = match motion {
                Motion::Down if app.category_index + 1 < len => app.category_index + 1,
                Motion::Down => app.category_index,
                Motion::Up => app.category_index.saturating_sub(1),
                Motion::Top => 0,
                Motion::Bottom => len.saturating_sub(1),
            };
            return;
        }
        Screen::Expenses => (
            app.store.state().expenses.len(),
            &mut app.expense_index,
            &mut app.expense_scroll,
        ),
        Screen::Trips => (app.trips.len(), &mut app.trip_index, &mut app.trip_scroll),
    };
    match motion {
        Motion::Down => scroll_down(index, scroll, len, page),
        Motion::Up => scroll_up(index, scroll),
        Motion::Top => scroll_to_top(index, scroll),
        Motion::Bottom => scroll_to_bottom(index, scroll, len, page),
    }
}
