use std::path::PathBuf;
use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use juridique_core::export;
use juridique_core::transport::{self, ChatReply, Transport, TransportError};
use juridique_core::{tr, Conversation, Outcome, Ticket, UiText};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    /// Typing into the transcript search box
    Filtering,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Conversation (transcript, input buffer, view settings)
    pub conversation: Conversation,
    pub input_cursor: usize, // cursor position in the input buffer, in chars

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the chat pane, set during render
    pub follow_tail: bool, // Keep the newest message in view

    // Transient notice (export result, new conversation)
    pub notice: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Collaborators
    pub transport: Arc<dyn Transport>,
    pub export_dir: PathBuf,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        conversation: Conversation,
        transport: Arc<dyn Transport>,
        export_dir: PathBuf,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            conversation,
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            follow_tail: true,

            notice: None,

            animation_frame: 0,

            chat_area: None,

            transport,
            export_dir,
            events,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_awaiting_reply()
    }

    /// Send the input buffer. The request runs in its own task and comes
    /// back through the event channel as `AppEvent::Reply`.
    pub fn submit(&mut self) {
        let Some(pending) = self.conversation.begin_submit() else {
            return;
        };
        self.input_cursor = 0;
        self.notice = None;
        self.follow_tail = true;

        let transport = Arc::clone(&self.transport);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = transport::send_guarded(transport.as_ref(), &pending.request).await;
            if events
                .send(AppEvent::Reply { ticket: pending.ticket, result })
                .is_err()
            {
                tracing::debug!("event loop closed before reply was delivered");
            }
        });
    }

    pub fn handle_reply(&mut self, ticket: Ticket, result: Result<ChatReply, TransportError>) {
        if self.conversation.complete(ticket, result) != Outcome::Discarded {
            self.follow_tail = true;
        }
    }

    pub fn new_conversation(&mut self) {
        self.conversation.reset();
        self.chat_scroll = 0;
        self.follow_tail = true;
        self.notice = Some(tr(UiText::NewConversation, self.locale()).to_string());
    }

    pub fn export(&mut self) {
        let locale = self.locale();
        self.notice = Some(
            match export::export_to_dir(self.conversation.transcript(), locale, &self.export_dir) {
                Ok(path) => format!("{} {}", tr(UiText::ExportDone, locale), path.display()),
                Err(err) => {
                    tracing::error!(error = %err, "export failed");
                    format!("{} {}", tr(UiText::ExportFailed, locale), err)
                }
            },
        );
    }

    pub fn cycle_language(&mut self) {
        let view = &mut self.conversation.view;
        view.language = view.language.next();
        tracing::info!(language = view.language.as_str(), "language changed");
    }

    pub fn toggle_theme(&mut self) {
        let view = &mut self.conversation.view;
        view.theme = view.theme.toggle();
    }

    pub fn locale(&self) -> juridique_core::Locale {
        self.conversation.view.locale()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_tail = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    /// Clamp the scroll offset once the rendered height is known
    pub fn clamp_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_tail || self.chat_scroll >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_tail = true;
        }
    }
}
