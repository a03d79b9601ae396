//! Writing a transcript out as plain text.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::i18n::{role_label, Locale};
use crate::state::Message;

pub const EXPORT_FILE_NAME: &str = "conversation-juridique.txt";

/// `<role>: <content>` per message, messages separated by a blank line.
pub fn transcript_text(transcript: &[Message], locale: Locale) -> String {
    transcript
        .iter()
        .map(|msg| format!("{}: {}", role_label(msg.role, locale), msg.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Write the transcript into `dir`, returning the file path.
pub fn export_to_dir(transcript: &[Message], locale: Locale, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Could not create export directory {}", dir.display()))?;

    let path = dir.join(EXPORT_FILE_NAME);
    fs::write(&path, transcript_text(transcript, locale))
        .with_context(|| format!("Could not write {}", path.display()))?;

    tracing::info!(path = %path.display(), messages = transcript.len(), "conversation exported");
    Ok(path)
}

/// The user's download directory, or the working directory without one
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
