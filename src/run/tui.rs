use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::ui::app::{App, AppLedger, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(ledger: &mut AppLedger, currency: &str) -> Result<()> {
    let mut app = App::new(currency.to_string());
    app.refresh(ledger);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, ledger);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "tui exited with error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    ledger: &mut AppLedger,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            // tab + status + command bars, two borders, one header row
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, ledger)?,
                InputMode::Command => handle_command_input(key, app, ledger)?,
                InputMode::Confirm => handle_confirm_input(key, app, ledger),
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(
    key: event::KeyEvent,
    app: &mut App,
    ledger: &mut AppLedger,
) -> Result<()> {
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
        KeyCode::Char('1') => switch_screen(app, ledger, Screen::Dashboard),
        KeyCode::Char('2') => switch_screen(app, ledger, Screen::Budgets),
        KeyCode::Char('3') => switch_screen(app, ledger, Screen::History),
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let next = (idx + 1) % screens.len();
            switch_screen(app, ledger, screens[next]);
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            switch_screen(app, ledger, screens[prev]);
        }
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Esc => app.status_message.clear(),
        KeyCode::Char('i') => app.prefill_command("income ".into()),
        KeyCode::Char('x') => app.prefill_command("expense ".into()),
        KeyCode::Char('n') if app.screen == Screen::Budgets => {
            app.prefill_command("budget ".into());
        }
        KeyCode::Char('e') if app.screen == Screen::History => {
            commands::handle_command("edit", app, ledger)?;
        }
        KeyCode::Char('e') if app.screen == Screen::Budgets => {
            commands::handle_command("edit-budget", app, ledger)?;
        }
        KeyCode::Char('D') if app.screen == Screen::History => {
            commands::handle_command("delete", app, ledger)?;
        }
        KeyCode::Char('D') if app.screen == Screen::Budgets => {
            commands::handle_command("delete-budget", app, ledger)?;
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(
    key: event::KeyEvent,
    app: &mut App,
    ledger: &mut AppLedger,
) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, ledger)?;
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

/// Only `y` confirms; any other key cancels.
fn handle_confirm_input(key: event::KeyEvent, app: &mut App, ledger: &mut AppLedger) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => commands::confirm_pending(app, ledger),
        _ => {
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
    }
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, ledger: &AppLedger, screen: Screen) {
    app.screen = screen;
    app.refresh(ledger);
    app.set_status(format!("{screen}"));
}

fn handle_move_down(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Budgets => scroll_down(
            &mut app.budget_index,
            &mut app.budget_scroll,
            app.budgets.len(),
            page,
        ),
        Screen::History => scroll_down(
            &mut app.history_index,
            &mut app.history_scroll,
            app.history.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Budgets => scroll_up(&mut app.budget_index, &mut app.budget_scroll),
        Screen::History => scroll_up(&mut app.history_index, &mut app.history_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Budgets => scroll_to_top(&mut app.budget_index, &mut app.budget_scroll),
        Screen::History => scroll_to_top(&mut app.history_index, &mut app.history_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Budgets => scroll_to_bottom(
            &mut app.budget_index,
            &mut app.budget_scroll,
            app.budgets.len(),
            page,
        ),
        Screen::History => scroll_to_bottom(
            &mut app.history_index,
            &mut app.history_scroll,
            app.history.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}
