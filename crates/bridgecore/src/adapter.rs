//! Chat platform abstraction consumed by the pipeline.
//!
//! Each platform (Telegram, the WhatsApp gateway) implements [`ChatAdapter`]
//! once per request, bound to the originating chat and the command message
//! it replies to. The pipeline never sees a chat SDK type — only this trait.

use crate::storage::ResolvedFile;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Opaque per-platform message identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHandle(pub String);

impl fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What failed inside an adapter call.
///
/// The upload leg (platform-managed storage) is distinguished from the send
/// itself so the pipeline can report the right failure to the user.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Upload of file bytes to platform storage failed.
    #[error("{0}")]
    Upload(String),

    /// The outgoing message could not be sent.
    #[error("{0}")]
    Send(String),

    /// Any other platform API failure (edits, deletes, bad handles).
    #[error("{0}")]
    Api(String),
}

/// A chat platform bound to one chat and one reply target.
///
/// Adapters are stateless beyond that binding and safe for concurrent use
/// across in-flight requests.
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Platform name for logging (e.g. "telegram", "whatsapp").
    fn name(&self) -> &str;

    /// Whether attachments may exceed the normal size threshold
    /// (e.g. a self-hosted Bot API server with its 2 GB limit).
    fn supports_large_files(&self) -> bool;

    /// Send a text message replying to the command; returns its handle
    /// for later edits and removal.
    async fn send_text(&self, text: &str) -> Result<MessageHandle, AdapterError>;

    /// Edit a previously sent text message in place.
    async fn edit_text(&self, message: &MessageHandle, text: &str) -> Result<(), AdapterError>;

    /// Send the file as an audio attachment.
    async fn send_audio(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError>;

    /// Send the file as a video attachment.
    async fn send_video(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError>;

    /// Send the file as a generic document attachment.
    async fn send_document(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError>;

    /// Remove a message from the chat: delete where the platform supports
    /// it, revoke-for-everyone otherwise.
    async fn remove_message(&self, message: &MessageHandle) -> Result<(), AdapterError>;
}
