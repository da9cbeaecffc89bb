//! Keybinding definitions for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Whether keystrokes drive commands or go into a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextTab,
    PrevTab,
    MoveUp,
    MoveDown,
    PrevOperator,
    NextOperator,
    CyclePriority,
    OpenSearch,
    Compose,
    Select,
    Resolve,
    Flag,
    Transfer,
    JoinChat,
    Refresh,
    Back,
    InsertChar(char),
    DeleteChar,
    Submit,
    Cancel,
}

pub fn map_key(event: KeyEvent, mode: InputMode) -> Option<Action> {
    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match mode {
        InputMode::Editing => match code {
            KeyCode::Enter => Some(Action::Submit),
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Backspace => Some(Action::DeleteChar),
            KeyCode::Char(c) => Some(Action::InsertChar(c)),
            _ => None,
        },
        InputMode::Normal => match code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Tab => Some(Action::NextTab),
            KeyCode::BackTab => Some(Action::PrevTab),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::PrevOperator),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::NextOperator),
            KeyCode::Char('f') => Some(Action::CyclePriority),
            KeyCode::Char('/') => Some(Action::OpenSearch),
            KeyCode::Char('i') => Some(Action::Compose),
            KeyCode::Enter => Some(Action::Select),
            KeyCode::Char('r') => Some(Action::Resolve),
            KeyCode::Char('g') => Some(Action::Flag),
            KeyCode::Char('t') => Some(Action::Transfer),
            KeyCode::Char('J') => Some(Action::JoinChat),
            KeyCode::Char('R') => Some(Action::Refresh),
            KeyCode::Esc => Some(Action::Back),
            _ => None,
        },
    }
}
