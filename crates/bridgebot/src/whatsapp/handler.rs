//! WhatsApp text-command handler.
//!
//! Polls the gateway event feed, picks out `/ytdlp` and `/ytdlpmp3`
//! commands, and spawns one pipeline run per accepted request.

use super::adapter::WhatsAppChatAdapter;
use super::client::{IncomingMessage, WaClient};
use crate::config;
use bridgecore::pipeline::{self, DeliveryOutcome, DownloadRequest};
use bridgecore::runner::DownloadMode;
use bridgecore::storage::OutputLayout;
use bridgecore::PipelineConfig;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const USAGE: &str = "Usage: /ytdlp <url> or /ytdlpmp3 <url>";

/// Delay before retrying a failed poll.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll the gateway for inbound messages and dispatch download commands.
/// Runs until the process exits.
pub async fn run_event_loop(client: Arc<WaClient>, pipeline_config: Arc<PipelineConfig>) {
    let mut cursor: Option<String> = None;
    loop {
        match client.poll_events(cursor.as_deref()).await {
            Ok(batch) => {
                if batch.cursor.is_some() {
                    cursor = batch.cursor;
                }
                for message in batch.messages {
                    handle_message(Arc::clone(&client), Arc::clone(&pipeline_config), message).await;
                }
            }
            Err(e) => {
                log::warn!("whatsapp: event poll failed: {}", e);
                tokio::time::sleep(POLL_RETRY_DELAY).await;
            }
        }
    }
}

/// Recognize a download command in message text.
/// Returns the mode and the (possibly missing) URL argument.
fn parse_command(text: &str) -> Option<(DownloadMode, Option<&str>)> {
    let mut parts = text.split_whitespace();
    let command = parts.next()?.to_lowercase();
    match command.as_str() {
        "/ytdlp" => Some((DownloadMode::Video, parts.next())),
        "/ytdlpmp3" => Some((DownloadMode::Audio, parts.next())),
        _ => None,
    }
}

fn is_authorized_sender(sender: &str) -> bool {
    config::WA_ALLOWED_SENDERS.is_empty() || config::WA_ALLOWED_SENDERS.iter().any(|s| s == sender)
}

async fn handle_message(client: Arc<WaClient>, pipeline_config: Arc<PipelineConfig>, message: IncomingMessage) {
    let Some((mode, url_arg)) = parse_command(&message.text) else {
        return;
    };

    if !is_authorized_sender(&message.sender) {
        log::warn!("whatsapp: unauthorized download command from {}", message.sender);
        return;
    }

    let url = match url_arg.map(Url::parse) {
        Some(Ok(url)) => url,
        _ => {
            if let Err(e) = client.send_text(&message.chat, USAGE, Some(&message.id)).await {
                log::warn!("whatsapp: failed to send usage reply: {}", e);
            }
            return;
        }
    };

    let adapter = Arc::new(WhatsAppChatAdapter::new(
        Arc::clone(&client),
        message.chat.clone(),
        message.id.clone(),
    ));
    let request = DownloadRequest {
        url,
        mode,
        token: message.id.clone(),
        layout: OutputLayout::TitledDir,
    };

    tokio::spawn(async move {
        if let DeliveryOutcome::Failed(e) = pipeline::run(request, adapter, &pipeline_config).await {
            log::error!("whatsapp: download for chat {} failed: {}", message.chat, e);
        }
    });
}
