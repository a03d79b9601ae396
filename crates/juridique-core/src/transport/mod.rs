pub mod http;

pub use http::HttpTransport;

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::i18n::{tr, Locale, UiText};
use crate::view::Language;

/// Body of the POST sent for every user turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    /// Always "user"
    pub role: String,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
}

impl ChatRequest {
    pub fn new(message: &str, conversation_id: &str, language: Option<Language>) -> Self {
        Self {
            message: message.to_string(),
            role: "user".to_string(),
            conversation_id: conversation_id.to_string(),
            language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// The three ways a request can fail. Each gets its own banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The server answered with a non-success status (or an unreadable body)
    #[error("server returned status {status}")]
    Server { status: u16, detail: Option<String> },
    /// The request went out but nothing came back
    #[error("no response from server: {0}")]
    NoResponse(String),
    /// The request could not be built or dispatched at all
    #[error("request could not be dispatched: {0}")]
    Dispatch(String),
}

impl TransportError {
    /// Human-readable banner text for this failure kind
    pub fn banner(&self, locale: Locale) -> String {
        let prefix = tr(UiText::ErrorPrefix, locale);
        match self {
            TransportError::Server { status, detail } => {
                let detail = detail
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| tr(UiText::GenericServerError, locale));
                format!("{} {}: {}", prefix, status, detail)
            }
            TransportError::NoResponse(_) => tr(UiText::NoResponse, locale).to_string(),
            TransportError::Dispatch(message) => format!("{}: {}", prefix, message),
        }
    }
}

/// Something that can deliver a user turn to the assistant service
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

/// Send through `transport`, turning a panic inside it into a dispatch
/// failure so the caller always gets an outcome back.
pub async fn send_guarded(
    transport: &dyn Transport,
    request: &ChatRequest,
) -> Result<ChatReply, TransportError> {
    match AssertUnwindSafe(transport.send(request)).catch_unwind().await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("transport panicked while sending a request");
            Err(TransportError::Dispatch("transport panicked".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_shape() {
        let request = ChatRequest::new("Bonjour", "abc", Some(Language::French));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "Bonjour",
                "role": "user",
                "conversation_id": "abc",
                "language": "french",
            })
        );
    }

    #[test]
    fn test_request_omits_missing_language() {
        let request = ChatRequest::new("Bonjour", "abc", None);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("language").is_none());
    }

    #[test]
    fn test_reply_ignores_extra_fields() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"message": "Response generated successfully!", "response": "ok", "conversation_id": "1"}"#,
        )
        .unwrap();
        assert_eq!(reply.response, "ok");
    }

    #[test]
    fn test_banners_are_distinct_per_kind() {
        let server = TransportError::Server { status: 500, detail: Some("boom".into()) };
        let no_response = TransportError::NoResponse("refused".into());
        let dispatch = TransportError::Dispatch("bad url".into());

        assert_eq!(server.banner(Locale::French), "Erreur 500: boom");
        assert_eq!(
            no_response.banner(Locale::French),
            "Aucune réponse du serveur. Vérifiez que le serveur est en cours d'exécution."
        );
        assert_eq!(dispatch.banner(Locale::French), "Erreur: bad url");
    }

    #[test]
    fn test_server_banner_without_detail() {
        let err = TransportError::Server { status: 502, detail: None };
        assert_eq!(err.banner(Locale::French), "Erreur 502: Une erreur s'est produite");
    }
}
