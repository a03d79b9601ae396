//! UI-agnostic conversation types
//!
//! These are shared by every front-end and don't depend on any specific UI
//! framework.

use serde::{Deserialize, Serialize};

/// A message in the transcript. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
}

/// Who a transcript entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Synthetic entries produced by the client itself (failed requests)
    System,
}

/// Whether a request is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingState {
    #[default]
    Idle,
    AwaitingReply,
}
