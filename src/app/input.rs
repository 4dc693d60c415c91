use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::selector::PAGE_SIZE_OPTIONS;

/// What a key press means in the host pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Choose,
    Remove,
    FocusPopup,
    Quit,
    None,
}

/// What a key press means while the selector popup has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupCommand {
    Type(char),
    Erase,
    Highlight(isize),
    NextPage,
    PreviousPage,
    CycleSort,
    CyclePageSize,
    Refresh,
    Pick,
    Dismiss,
    Blur,
    Quit,
    None,
}

pub fn classify_host(key: &KeyEvent) -> HostCommand {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Char('q') | KeyCode::Char('Q') => {
                HostCommand::Quit
            }
            _ => HostCommand::None,
        };
    }

    match key.code {
        KeyCode::Char('c') | KeyCode::Enter => HostCommand::Choose,
        KeyCode::Char('r') | KeyCode::Delete | KeyCode::Backspace => HostCommand::Remove,
        KeyCode::Tab => HostCommand::FocusPopup,
        KeyCode::Char('q') | KeyCode::Esc => HostCommand::Quit,
        _ => HostCommand::None,
    }
}

pub fn classify_popup(key: &KeyEvent) -> PopupCommand {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Char('q') | KeyCode::Char('Q') => {
                PopupCommand::Quit
            }
            KeyCode::Char('s') | KeyCode::Char('S') => PopupCommand::CycleSort,
            KeyCode::Char('p') | KeyCode::Char('P') => PopupCommand::CyclePageSize,
            KeyCode::Char('r') | KeyCode::Char('R') => PopupCommand::Refresh,
            _ => PopupCommand::None,
        };
    }

    match key.code {
        KeyCode::Char(ch) => PopupCommand::Type(ch),
        KeyCode::Backspace => PopupCommand::Erase,
        KeyCode::Up => PopupCommand::Highlight(-1),
        KeyCode::Down => PopupCommand::Highlight(1),
        KeyCode::PageDown | KeyCode::Right => PopupCommand::NextPage,
        KeyCode::PageUp | KeyCode::Left => PopupCommand::PreviousPage,
        KeyCode::F(5) => PopupCommand::Refresh,
        KeyCode::Enter => PopupCommand::Pick,
        KeyCode::Esc => PopupCommand::Dismiss,
        KeyCode::Tab | KeyCode::BackTab => PopupCommand::Blur,
        _ => PopupCommand::None,
    }
}

/// The page size offered after `current`, wrapping around.
pub fn next_page_size(current: usize) -> usize {
    let index = PAGE_SIZE_OPTIONS
        .iter()
        .position(|size| *size == current)
        .map_or(0, |index| (index + 1) % PAGE_SIZE_OPTIONS.len());
    PAGE_SIZE_OPTIONS[index]
}

pub const HOST_HELP: &str = "c choose • r remove • Tab focus popup • q quit";
pub const POPUP_HELP: &str =
    "type to search • ↑/↓ move • ←/→ page • Enter pick • Ctrl+S sort • Ctrl+P page size • Esc close";
