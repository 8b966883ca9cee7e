use super::state::AppState;
use crate::handler::COPY_CONTROL_ID;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) {
    if state.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            state.show_help = false;
        }
        return;
    }

    match (key.code, key.modifiers) {
        // Focus
        (KeyCode::Tab, KeyModifiers::NONE)
        | (KeyCode::Right, KeyModifiers::NONE)
        | (KeyCode::Char('l'), KeyModifiers::NONE) => state.focus_next(),
        (KeyCode::BackTab, _)
        | (KeyCode::Left, KeyModifiers::NONE)
        | (KeyCode::Char('h'), KeyModifiers::NONE) => state.focus_prev(),

        // Press the focused control
        (KeyCode::Enter, KeyModifiers::NONE) | (KeyCode::Char(' '), KeyModifiers::NONE) => {
            state.activate_focused();
        }

        // Shortcut for the copy control, wherever focus is
        (KeyCode::Char('c'), KeyModifiers::NONE) => state.click_by_id(COPY_CONTROL_ID),

        // Payload scrolling
        (KeyCode::Down, KeyModifiers::NONE) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
            state.scroll_down();
        }
        (KeyCode::Up, KeyModifiers::NONE) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
            state.scroll_up();
        }

        (KeyCode::Char('?'), KeyModifiers::NONE) => state.show_help = true,

        (KeyCode::Char('q'), KeyModifiers::NONE)
        | (KeyCode::Esc, _)
        | (KeyCode::Char('c'), KeyModifiers::CONTROL) => state.should_quit = true,

        _ => {}
    }
}

pub fn handle_mouse_event(mouse: MouseEvent, state: &mut AppState) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let target = state.hit_test(mouse.column, mouse.row);
            state.click(target);
        }
        MouseEventKind::ScrollDown => state.scroll_down(),
        MouseEventKind::ScrollUp => state.scroll_up(),
        _ => {}
    }
}
