//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    can_add_comment_char, can_add_password_char, can_add_username_char, App, AppState, ComposeTarget,
    Focus, Tab, PAGE_SCROLL_SIZE,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::EnteringLocation => return Ok(handle_location_input(app, key)),
        AppState::EnteringUsername => return Ok(handle_username_input(app, key)),
        AppState::Composing => return Ok(handle_compose_input(app, key)),
        AppState::AdminLogin => return Ok(handle_admin_login_input(app, key)),
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => app.switch_tab(Tab::Search),
        KeyCode::Char('2') => app.switch_tab(Tab::Results),
        KeyCode::Char('3') => app.switch_tab(Tab::Discussion),
        KeyCode::Char('4') => app.switch_tab(Tab::Admin),
        KeyCode::Left => app.switch_tab(app.current_tab.prev()),
        KeyCode::Right => app.switch_tab(app.current_tab.next()),
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
        _ => match app.current_tab {
            Tab::Search => handle_search_keys(app, key),
            Tab::Results => handle_results_keys(app, key),
            Tab::Discussion => handle_discussion_keys(app, key),
            Tab::Admin => handle_admin_keys(app, key),
        },
    }

    Ok(false)
}

fn handle_search_keys(app: &mut App, key: KeyEvent) {
    match (key.code, app.focus) {
        (KeyCode::Enter, Focus::List) => {
            app.choose_level(app.level_selection);
            if !app.subjects.is_empty() {
                app.focus = Focus::Detail;
            }
        }
        (KeyCode::Enter, Focus::Detail) => app.run_search(app.subject_selection),
        (KeyCode::Tab, Focus::List) if app.selected_level.is_some() => app.focus = Focus::Detail,
        (KeyCode::Tab, Focus::Detail) | (KeyCode::Esc, Focus::Detail) => app.focus = Focus::List,
        _ => {}
    }
}

fn handle_results_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('l') => app.start_location_input(),
        KeyCode::Char('g') => app.use_device_location(),
        KeyCode::Char('c') => app.clear_location(),
        KeyCode::Enter | KeyCode::Char('d') => app.open_discussion(),
        KeyCode::Esc => app.switch_tab(Tab::Search),
        _ => {}
    }
}

fn handle_discussion_keys(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('n') => app.start_compose(ComposeTarget::Comment),
        KeyCode::Char('r') => app.start_reply(),
        KeyCode::Char('v') => app.view_all_replies(),
        KeyCode::Char('m') => app.load_more_comments(),
        KeyCode::Char('u') => app.start_username_input(),
        KeyCode::Char('R') => app.reload_comments(),
        KeyCode::Esc => app.switch_tab(Tab::Results),
        _ => {}
    }
}

fn handle_admin_keys(app: &mut App, key: KeyEvent) {
    if !app.admin.is_unlocked() {
        if key.code == KeyCode::Enter && app.admin.is_configured() {
            app.start_admin_login();
        }
        return;
    }

    match key.code {
        KeyCode::Char('h') => app.toggle_selected_hidden(),
        KeyCode::Char('x') | KeyCode::Delete => app.request_delete_selected(),
        KeyCode::Char('r') => app.load_admin_comments(),
        KeyCode::Char('L') => app.lock_admin(),
        _ => {}
    }
}

fn handle_location_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => app.state = AppState::Normal,
        KeyCode::Enter => app.submit_location(),
        KeyCode::Down | KeyCode::Tab => app.next_prediction(),
        KeyCode::Up | KeyCode::BackTab => app.prev_prediction(),
        KeyCode::Backspace => app.pop_location_char(),
        KeyCode::Char(c) => app.push_location_char(c),
        _ => {}
    }
    false
}

fn handle_username_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => app.cancel_username(),
        KeyCode::Enter => app.submit_username(),
        KeyCode::Backspace => {
            app.username_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_username_char(app.username_input.chars().count(), c) {
                app.username_input.push(c);
            }
        }
        _ => {}
    }
    false
}

fn handle_compose_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc if !app.posting => {
            app.compose_input.clear();
            app.compose_error = None;
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.submit_comment(),
        KeyCode::Backspace => {
            app.compose_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_comment_char(app.compose_input.chars().count(), c) {
                app.compose_input.push(c);
            }
        }
        _ => {}
    }
    false
}

fn handle_admin_login_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.admin_password_input.clear();
            app.admin_error = None;
            app.state = AppState::Normal;
        }
        KeyCode::Enter => app.submit_admin_password(),
        KeyCode::Backspace => {
            app.admin_password_input.pop();
        }
        KeyCode::Char(c) => {
            if can_add_password_char(app.admin_password_input.chars().count(), c) {
                app.admin_password_input.push(c);
            }
        }
        _ => {}
    }
    false
}
