pub mod config;
pub mod conversation;
pub mod export;
pub mod format;
pub mod i18n;
pub mod state;
pub mod transport;
pub mod view;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::{render, Conversation, Outcome, PendingRequest, RenderedMessage, Ticket};
pub use format::{Block, BlockKind, SpanKind, TextSpan};
pub use i18n::{tr, Locale, UiText};
pub use state::{Message, PendingState, Role};
pub use transport::{ChatReply, ChatRequest, HttpTransport, Transport, TransportError};
pub use view::{Language, Theme, ViewState};
