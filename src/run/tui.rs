use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::{debug, info};

use crate::config::Config;
use crate::db::Database;
use crate::ui::app::{App, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(db: &mut Database, config: &Config) -> Result<()> {
    let mut app = App::new(config.gate.clone());
    app.refresh_all(db)?;
    if !app.gate.is_configured() {
        app.set_status(format!(
            "Approvals disabled: set {} to enable them",
            crate::config::SECRET_VAR
        ));
    }
    info!(db = %config.db_path.display(), "Starting interactive session");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

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
        terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(3) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db)?,
                InputMode::Command => handle_command_input(key, app, db),
                InputMode::Search => handle_search_input(key, app, db)?,
                InputMode::Secret => handle_secret_input(key, app, db),
                InputMode::Confirm => handle_confirm_input(key, app, db),
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
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Search;
            app.screen = Screen::Budgets;
        }
        KeyCode::Char('q') | KeyCode::Char('c')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.running = false;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            for _ in 0..half_page {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half_page = app.visible_rows / 2;
            for _ in 0..half_page {
                handle_move_up(app);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('1') => switch_screen(app, db, Screen::Events)?,
        KeyCode::Char('2') => switch_screen(app, db, Screen::Budgets)?,
        KeyCode::Char('3') => switch_screen(app, db, Screen::Budget)?,
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = (idx + 1) % screens.len();
            switch_screen(app, db, screens[next])?;
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            switch_screen(app, db, screens[prev])?;
        }
        KeyCode::Enter if app.screen == Screen::Budgets => {
            if !app.open_selected_budget(db)? {
                app.set_status("No budget selected");
            }
        }
        KeyCode::Esc => handle_escape(app, db)?,
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Char('D') if app.screen == Screen::Budget => {
            commands::handle_command("delete", app, db);
        }
        KeyCode::Char('x') if app.screen == Screen::Budget => {
            commands::handle_command("cancel", app, db);
        }
        KeyCode::Char('P') if app.screen == Screen::Budget => {
            commands::handle_command("post", app, db);
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db);
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
}

/// Live filter of the budget list by linked event name.
fn handle_search_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input.clear();
            app.refresh_budgets(db)?;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            app.budget_index = 0;
            app.budget_scroll = 0;
            app.refresh_budgets(db)?;
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            app.budget_index = 0;
            app.budget_scroll = 0;
            app.refresh_budgets(db)?;
        }
        _ => {}
    }
    Ok(())
}

/// Collects the approval secret. The typed text is cleared on every exit path.
fn handle_secret_input(key: event::KeyEvent, app: &mut App, db: &mut Database) {
    match key.code {
        KeyCode::Enter => {
            let secret = std::mem::take(&mut app.secret_input);
            app.input_mode = InputMode::Normal;
            if let Some(approval) = app.pending_approval.take() {
                let id = approval.id;
                if let Err(e) = commands::submit_approval(approval, &secret, app, db) {
                    debug!(expense = id, error = %e, "Approval rejected");
                    app.set_status(format!("Error: {e}"));
                }
            }
        }
        KeyCode::Esc => {
            app.secret_input.clear();
            app.pending_approval = None;
            app.input_mode = InputMode::Normal;
            app.set_status("Approval cancelled");
        }
        KeyCode::Backspace => {
            app.secret_input.pop();
        }
        KeyCode::Char(c) => {
            app.secret_input.push(c);
        }
        _ => {}
    }
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, db: &mut Database) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(action) = app.pending_action.take() {
                let id = match &action {
                    PendingAction::DeleteExpense { id, .. }
                    | PendingAction::CancelExpense { id, .. } => *id,
                };
                if let Err(e) = commands::apply_pending(action, app, db) {
                    debug!(expense = id, error = %e, "Confirmed action failed");
                    app.set_status(format!("Error: {e}"));
                }
            }
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
        _ => {}
    }
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    match screen {
        Screen::Events => app.refresh_events(db)?,
        Screen::Budgets => app.refresh_budgets(db)?,
        Screen::Budget => app.refresh_budget(db)?,
    }
    app.set_status(format!("{screen}"));
    Ok(())
}

fn handle_move_down(app: &mut App) {
    let page = app.visible_rows;
    let expense_rows = expense_page(app);
    match app.screen {
        Screen::Events => scroll_down(
            &mut app.event_index,
            &mut app.event_scroll,
            app.events.len(),
            page,
        ),
        Screen::Budgets => scroll_down(
            &mut app.budget_index,
            &mut app.budget_scroll,
            app.budgets.len(),
            page,
        ),
        Screen::Budget => scroll_down(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expense_lines.len(),
            expense_rows,
        ),
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Events => scroll_up(&mut app.event_index, &mut app.event_scroll),
        Screen::Budgets => scroll_up(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Budget => scroll_up(&mut app.expense_index, &mut app.expense_scroll),
    }
}

fn handle_escape(app: &mut App, db: &mut Database) -> Result<()> {
    match app.screen {
        Screen::Budget => switch_screen(app, db, Screen::Budgets)?,
        Screen::Budgets if !app.search_input.is_empty() => {
            app.search_input.clear();
            app.refresh_budgets(db)?;
            app.set_status("Event filter cleared");
        }
        _ => {}
    }
    Ok(())
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Events => scroll_to_top(&mut app.event_index, &mut app.event_scroll),
        Screen::Budgets => scroll_to_top(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Budget => scroll_to_top(&mut app.expense_index, &mut app.expense_scroll),
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.visible_rows;
    let expense_rows = expense_page(app);
    match app.screen {
        Screen::Events => scroll_to_bottom(
            &mut app.event_index,
            &mut app.event_scroll,
            app.events.len(),
            page,
        ),
        Screen::Budgets => scroll_to_bottom(
            &mut app.budget_index,
            &mut app.budget_scroll,
            app.budgets.len(),
            page,
        ),
        Screen::Budget => scroll_to_bottom(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expense_lines.len(),
            expense_rows,
        ),
    }
}

/// Rows the expense table can show under the header, cards and revenue table.
fn expense_page(app: &App) -> usize {
    (app.visible_rows.saturating_sub(9) * 65 / 100)
        .saturating_sub(3)
        .max(1)
}
