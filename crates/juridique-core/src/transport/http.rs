use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;

use super::{ChatReply, ChatRequest, Transport, TransportError};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/chat/";

/// POSTs each turn as JSON to the assistant service
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "assistant service returned an error");
            return Err(TransportError::Server {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        response.json::<ChatReply>().await.map_err(|err| {
            if err.is_decode() {
                TransportError::Server {
                    status: status.as_u16(),
                    detail: Some("invalid reply".to_string()),
                }
            } else {
                classify(err)
            }
        })
    }
}

/// Builder errors never left the machine; everything else did.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::Dispatch(err.to_string())
    } else {
        TransportError::NoResponse(err.to_string())
    }
}

/// Pulls the `detail` field out of an error body. FastAPI sends either a
/// string or a list of validation errors there.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
