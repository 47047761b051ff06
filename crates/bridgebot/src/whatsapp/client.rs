//! JSON client for the WhatsApp bridge gateway.

use crate::config;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Platform-storage descriptor returned by the gateway upload call.
///
/// Outgoing media messages reference these fields instead of carrying the
/// bytes; key material and hashes stay base64 as the gateway encodes them.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaDescriptor {
    pub url: String,
    pub direct_path: String,
    pub media_key: String,
    pub file_enc_sha256: String,
    pub file_sha256: String,
    pub file_length: u64,
}

/// Kind hint for uploads; the gateway picks storage routing from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Document,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Document => "document",
        }
    }
}

/// One inbound chat message from the gateway event feed.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub id: String,
    pub chat: String,
    pub sender: String,
    #[serde(default)]
    pub text: String,
}

/// A page of the event feed plus the cursor for the next poll.
#[derive(Debug, Clone, Deserialize)]
pub struct EventBatch {
    pub cursor: Option<String>,
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    chat: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Serialize)]
struct EditMessage<'a> {
    chat: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct RevokeMessage<'a> {
    chat: &'a str,
}

#[derive(Serialize)]
struct DocumentMessage<'a> {
    chat: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    url: &'a str,
    direct_path: &'a str,
    media_key: &'a str,
    file_enc_sha256: &'a str,
    file_sha256: &'a str,
    file_length: u64,
    mimetype: &'a str,
    file_name: &'a str,
    caption: &'a str,
}

#[derive(Deserialize)]
struct SentMessage {
    id: String,
}

pub struct WaClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl WaClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Build the client from WA_GATEWAY_URL / WA_GATEWAY_TOKEN.
    /// Returns `None` when no gateway is configured.
    pub fn from_env() -> Option<Self> {
        config::WA_GATEWAY_URL
            .as_ref()
            .map(|base| Self::new(base.clone(), config::WA_GATEWAY_TOKEN.clone()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Status { status, body })
    }

    /// Send a plain text message; returns the id for edits and revocation.
    pub async fn send_text(&self, chat: &str, text: &str, reply_to: Option<&str>) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(self.endpoint("/messages"))
            .bearer_auth(&self.token)
            .json(&TextMessage { chat, text, reply_to })
            .send()
            .await?;
        let sent: SentMessage = Self::check(response).await?.json().await?;
        Ok(sent.id)
    }

    /// Edit a previously sent text message in place.
    pub async fn edit_text(&self, chat: &str, id: &str, text: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.endpoint(&format!("/messages/{}/edit", id)))
            .bearer_auth(&self.token)
            .json(&EditMessage { chat, text })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Upload file bytes to platform-managed storage.
    ///
    /// The plaintext SHA-256 rides along so the gateway can verify the
    /// transfer; encryption happens gateway-side and the returned
    /// descriptor carries the resulting key material.
    pub async fn upload(&self, data: Vec<u8>, kind: MediaKind) -> Result<MediaDescriptor, GatewayError> {
        let digest = hex::encode(Sha256::digest(&data));
        let response = self
            .http
            .post(self.endpoint("/media"))
            .bearer_auth(&self.token)
            .header("x-media-kind", kind.as_str())
            .header("x-plaintext-sha256", digest)
            .body(data)
            .send()
            .await?;
        let descriptor = Self::check(response).await?.json().await?;
        Ok(descriptor)
    }

    /// Send a document message referencing an uploaded descriptor.
    pub async fn send_document(
        &self,
        chat: &str,
        reply_to: Option<&str>,
        descriptor: &MediaDescriptor,
        mimetype: &str,
        file_name: &str,
        caption: &str,
    ) -> Result<String, GatewayError> {
        let response = self
            .http
            .post(self.endpoint("/messages"))
            .bearer_auth(&self.token)
            .json(&DocumentMessage {
                chat,
                reply_to,
                url: &descriptor.url,
                direct_path: &descriptor.direct_path,
                media_key: &descriptor.media_key,
                file_enc_sha256: &descriptor.file_enc_sha256,
                file_sha256: &descriptor.file_sha256,
                file_length: descriptor.file_length,
                mimetype,
                file_name,
                caption,
            })
            .send()
            .await?;
        let sent: SentMessage = Self::check(response).await?.json().await?;
        Ok(sent.id)
    }

    /// Revoke a message for all participants. WhatsApp has no plain delete;
    /// revocation is the only removal primitive.
    pub async fn revoke(&self, chat: &str, id: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(self.endpoint(&format!("/messages/{}/revoke", id)))
            .bearer_auth(&self.token)
            .json(&RevokeMessage { chat })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Fetch the next page of inbound events.
    pub async fn poll_events(&self, cursor: Option<&str>) -> Result<EventBatch, GatewayError> {
        let mut request = self.http.get(self.endpoint("/events")).bearer_auth(&self.token);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        let response = request.send().await?;
        let batch = Self::check(response).await?.json().await?;
        Ok(batch)
    }
}
