//! WhatsApp realization of the chat adapter.
//!
//! Every attachment is a document message on the wire — WhatsApp renders
//! the mimetype, so audio and video differ only in the declared type. The
//! bytes go to platform storage first; the message references the returned
//! descriptor. Removal is revoke-for-everyone, the platform's only removal
//! primitive.

use super::client::{GatewayError, MediaKind, WaClient};
use async_trait::async_trait;
use bridgecore::adapter::{AdapterError, ChatAdapter, MessageHandle};
use bridgecore::storage::ResolvedFile;
use std::sync::Arc;

pub struct WhatsAppChatAdapter {
    client: Arc<WaClient>,
    chat: String,
    reply_to: String,
}

impl WhatsAppChatAdapter {
    pub fn new(client: Arc<WaClient>, chat: String, reply_to: String) -> Self {
        Self { client, chat, reply_to }
    }

    async fn send_media(&self, file: &ResolvedFile, mimetype: &str, caption: &str) -> Result<(), AdapterError> {
        let data = tokio::fs::read(&file.path)
            .await
            .map_err(|e| AdapterError::Api(format!("failed to read {}: {}", file.path.display(), e)))?;

        let descriptor = self
            .client
            .upload(data, MediaKind::Document)
            .await
            .map_err(|e| AdapterError::Upload(e.to_string()))?;

        self.client
            .send_document(
                &self.chat,
                Some(&self.reply_to),
                &descriptor,
                mimetype,
                &file.display_name,
                caption,
            )
            .await
            .map_err(|e| AdapterError::Send(e.to_string()))?;
        Ok(())
    }
}

/// Mimetype for the document presentation, derived from the filename.
fn document_mimetype(display_name: &str) -> &'static str {
    let lower = display_name.to_lowercase();
    if lower.ends_with(".mp3") {
        "audio/mpeg"
    } else if lower.ends_with(".mp4") {
        "video/mp4"
    } else {
        "application/octet-stream"
    }
}

fn api_error(e: GatewayError) -> AdapterError {
    AdapterError::Api(e.to_string())
}

#[async_trait]
impl ChatAdapter for WhatsAppChatAdapter {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn supports_large_files(&self) -> bool {
        false
    }

    async fn send_text(&self, text: &str) -> Result<MessageHandle, AdapterError> {
        let id = self
            .client
            .send_text(&self.chat, text, Some(&self.reply_to))
            .await
            .map_err(api_error)?;
        Ok(MessageHandle(id))
    }

    async fn edit_text(&self, message: &MessageHandle, text: &str) -> Result<(), AdapterError> {
        self.client
            .edit_text(&self.chat, &message.0, text)
            .await
            .map_err(api_error)
    }

    async fn send_audio(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError> {
        self.send_media(file, "audio/mpeg", caption).await
    }

    async fn send_video(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError> {
        self.send_media(file, "video/mp4", caption).await
    }

    async fn send_document(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError> {
        self.send_media(file, document_mimetype(&file.display_name), caption).await
    }

    async fn remove_message(&self, message: &MessageHandle) -> Result<(), AdapterError> {
        self.client.revoke(&self.chat, &message.0).await.map_err(api_error)
    }
}
