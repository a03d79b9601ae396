use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply { ticket, result } => app.handle_reply(ticket, result),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
        InputMode::Filtering => handle_filter_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),

        // Modes
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.conversation.input().chars().count();
        }
        KeyCode::Char('/') => app.input_mode = InputMode::Filtering,

        // Actions
        KeyCode::Char('n') => app.new_conversation(),
        KeyCode::Char('e') => {
            if !app.is_loading() {
                app.export();
            }
        }
        KeyCode::Char('l') => app.cycle_language(),
        KeyCode::Char('t') => app.toggle_theme(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            if !app.is_loading() {
                app.submit();
            }
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let input = app.conversation.input_mut();
                let byte_pos = char_to_byte_index(input, app.input_cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let cursor = app.input_cursor;
            let input = app.conversation.input_mut();
            if cursor < input.chars().count() {
                let byte_pos = char_to_byte_index(input, cursor);
                input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.conversation.input().chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.conversation.input().chars().count();
        }
        KeyCode::Char(c) => {
            let cursor = app.input_cursor;
            let input = app.conversation.input_mut();
            let byte_pos = char_to_byte_index(input, cursor);
            input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_filter_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.conversation.view.filter.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Backspace => {
            app.conversation.view.filter.pop();
        }
        KeyCode::Char(c) => {
            app.conversation.view.filter.push(c);
        }
        _ => return,
    }
    // The visible set changed; jump back to the newest match
    app.scroll_to_bottom();
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::App;
    use async_trait::async_trait;
    use juridique_core::transport::Transport;
    use juridique_core::{
        ChatReply, ChatRequest, Conversation, Language, Theme, TransportError, ViewState,
    };
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Never answers, so a submitted request stays in flight
    struct SilentTransport;

    #[async_trait]
    impl Transport for SilentTransport {
        async fn send(&self, _request: &ChatRequest) -> Result<ChatReply, TransportError> {
            std::future::pending().await
        }
    }

    fn test_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let conversation = Conversation::new("test", ViewState::default());
        App::new(conversation, Arc::new(SilentTransport), std::env::temp_dir(), tx)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_char_to_byte_index_multibyte() {
        assert_eq!(char_to_byte_index("décret", 2), 3);
        assert_eq!(char_to_byte_index("فصل", 1), 2);
        assert_eq!(char_to_byte_index("abc", 10), 3);
    }

    #[tokio::test]
    async fn test_editing_inserts_at_cursor() {
        let mut app = test_app();
        type_str(&mut app, "lo 12");
        press(&mut app, KeyCode::Home);
        type_str(&mut app, "é");
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.conversation.input(), "élo 1");
        assert_eq!(app.input_cursor, 5);
    }

    #[tokio::test]
    async fn test_enter_ignored_while_awaiting_reply() {
        let mut app = test_app();
        type_str(&mut app, "Première");
        press(&mut app, KeyCode::Enter);
        assert!(app.is_loading());
        assert_eq!(app.conversation.transcript().len(), 2);

        type_str(&mut app, "Deuxième");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.conversation.transcript().len(), 2);
        assert_eq!(app.conversation.input(), "Deuxième");
    }

    #[tokio::test]
    async fn test_filter_mode_edits_view_filter() {
        let mut app = test_app();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Filtering);

        type_str(&mut app, "loi");
        assert_eq!(app.conversation.view.filter, "loi");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.conversation.view.filter, "loi");

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert!(app.conversation.view.filter.is_empty());
    }

    #[tokio::test]
    async fn test_normal_mode_toggles() {
        let mut app = test_app();
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.conversation.view.language, Language::French);
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.conversation.view.theme, Theme::Light);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_editing() {
        let mut app = test_app();
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
    }
}
