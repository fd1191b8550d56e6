//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Key behavior
//! depends on the focused panel; in the file input every printable key is text.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};
use crate::session::UploadTicket;

/// What the event loop should do after a key press.
#[derive(Debug)]
pub enum Action {
    /// Keep running
    None,
    /// Leave the TUI
    Quit,
    /// Run this upload in the background
    Upload(UploadTicket),
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Tab` / `Shift+Tab`: cycle focus between panels
/// - `Esc`: cancel a running upload, return to the file input
/// - `Ctrl+C`: quit from anywhere
/// - File input: typing edits the path, `Enter` uploads
/// - Other panels: `j`/`k` navigate, `c` toggles bar/pie, `e` exports the
///   CSV, `p` exports the chart PDF, `q` quits
///
/// # Examples
///
/// ```
/// use tagscope::tui::{App, event::{Action, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new("out");
/// app.next_focus();
/// let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
/// assert!(matches!(handle_key_event(&mut app, key), Action::Quit));
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    if key.code == KeyCode::Tab {
        app.next_focus();
        return Action::None;
    }
    if key.code == KeyCode::BackTab {
        app.prev_focus();
        return Action::None;
    }

    if key.code == KeyCode::Esc {
        app.cancel_upload();
        app.reset_focus();
        return Action::None;
    }

    match app.focus() {
        Focus::FileInput => handle_file_input(app, key),
        Focus::TagList | Focus::Records => handle_panel(app, key),
    }
}

/// Handles keyboard input when the file input is focused.
fn handle_file_input(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_input_char(c);
        }
        KeyCode::Backspace => {
            app.pop_input_char();
        }
        KeyCode::Enter => {
            if let Some(ticket) = app.submit_file() {
                return Action::Upload(ticket);
            }
        }
        _ => {}
    }

    Action::None
}

/// Handles keyboard input when the tag list or record table is focused.
fn handle_panel(app: &mut App, key: KeyEvent) -> Action {
    if !key.modifiers.is_empty() {
        return Action::None;
    }

    match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => match app.focus() {
            Focus::TagList => app.select_next_filter(),
            _ => app.select_next_record(),
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus() {
            Focus::TagList => app.select_previous_filter(),
            _ => app.select_previous_record(),
        },
        KeyCode::Char('c') => app.toggle_chart_kind(),
        KeyCode::Char('e') => app.export_csv(),
        KeyCode::Char('p') => app.export_chart(),
        _ => {}
    }

    Action::None
}
