//! Telegram realization of the chat adapter.
//!
//! Bound to one chat and the command message it replies to. Attachments go
//! out as local files through the Bot API; the status message is a plain
//! text message edited in place and deleted at the end.

use super::Bot;
use crate::config;
use async_trait::async_trait;
use bridgecore::adapter::{AdapterError, ChatAdapter, MessageHandle};
use bridgecore::storage::ResolvedFile;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MessageId, ReplyParameters};

pub struct TelegramChatAdapter {
    bot: Bot,
    chat_id: ChatId,
    reply_to: MessageId,
}

impl TelegramChatAdapter {
    pub fn new(bot: Bot, chat_id: ChatId, reply_to: MessageId) -> Self {
        Self { bot, chat_id, reply_to }
    }
}

fn message_id(handle: &MessageHandle) -> Result<MessageId, AdapterError> {
    handle
        .0
        .parse::<i32>()
        .map(MessageId)
        .map_err(|e| AdapterError::Api(format!("bad message handle '{}': {}", handle, e)))
}

#[async_trait]
impl ChatAdapter for TelegramChatAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    fn supports_large_files(&self) -> bool {
        *config::SELF_HOSTED_API
    }

    async fn send_text(&self, text: &str) -> Result<MessageHandle, AdapterError> {
        let msg = self
            .bot
            .send_message(self.chat_id, text)
            .reply_parameters(ReplyParameters::new(self.reply_to))
            .await
            .map_err(|e| AdapterError::Api(e.to_string()))?;
        Ok(MessageHandle(msg.id.0.to_string()))
    }

    async fn edit_text(&self, message: &MessageHandle, text: &str) -> Result<(), AdapterError> {
        let id = message_id(message)?;
        match self.bot.edit_message_text(self.chat_id, id, text).await {
            Ok(_) => Ok(()),
            // The same text twice is not an error worth surfacing
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) => Err(AdapterError::Api(e.to_string())),
        }
    }

    async fn send_audio(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError> {
        self.bot
            .send_audio(self.chat_id, InputFile::file(&file.path))
            .caption(caption)
            .await
            .map_err(|e| AdapterError::Send(e.to_string()))?;
        Ok(())
    }

    async fn send_video(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError> {
        self.bot
            .send_video(self.chat_id, InputFile::file(&file.path))
            .caption(caption)
            .await
            .map_err(|e| AdapterError::Send(e.to_string()))?;
        Ok(())
    }

    async fn send_document(&self, file: &ResolvedFile, caption: &str) -> Result<(), AdapterError> {
        self.bot
            .send_document(self.chat_id, InputFile::file(&file.path))
            .caption(caption)
            .await
            .map_err(|e| AdapterError::Send(e.to_string()))?;
        Ok(())
    }

    async fn remove_message(&self, message: &MessageHandle) -> Result<(), AdapterError> {
        let id = message_id(message)?;
        self.bot
            .delete_message(self.chat_id, id)
            .await
            .map_err(|e| AdapterError::Api(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_roundtrip() {
        let handle = MessageHandle("42".to_string());
        assert_eq!(message_id(&handle).unwrap(), MessageId(42));
    }

    #[test]
    fn test_bad_handle_is_api_error() {
        let handle = MessageHandle("not-a-number".to_string());
        assert!(matches!(message_id(&handle), Err(AdapterError::Api(_))));
    }
}
