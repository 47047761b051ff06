//! Telegram command handlers for `/ytdlp` and `/ytdlpmp3`.
//!
//! Validation (authorization, argument, URL shape) happens here; everything
//! after that is the platform-agnostic pipeline running on its own task so
//! the dispatcher stays responsive.

use super::{adapter::TelegramChatAdapter, Bot};
use crate::config;
use bridgecore::pipeline::{self, DeliveryOutcome, DownloadRequest};
use bridgecore::runner::DownloadMode;
use bridgecore::storage::OutputLayout;
use bridgecore::PipelineConfig;
use std::sync::Arc;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use teloxide::utils::command::BotCommands;
use url::Url;

const USAGE: &str = "Usage: /ytdlp <url> or /ytdlpmp3 <url>";

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "download a video from a URL")]
    Ytdlp(String),
    #[command(description = "download audio only (mp3) from a URL")]
    Ytdlpmp3(String),
}

/// True when the sender may issue download commands. An empty allow-list
/// admits everyone.
fn is_authorized(msg: &Message) -> bool {
    if config::ALLOWED_USER_IDS.is_empty() {
        return true;
    }
    msg.from
        .as_ref()
        .map(|user| config::ALLOWED_USER_IDS.contains(&user.id.0))
        .unwrap_or(false)
}

/// Extract the download request argument from a command.
fn parse_request_arg(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Url::parse(raw).ok()
}

/// Run the long-polling dispatcher until shutdown.
pub async fn run_dispatcher(config: Arc<PipelineConfig>) -> anyhow::Result<()> {
    let bot = Bot::from_env();

    let handler = Update::filter_message().branch(
        dptree::entry()
            .filter_command::<Command>()
            .endpoint(handle_command),
    );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, config: Arc<PipelineConfig>) -> ResponseResult<()> {
    if !is_authorized(&msg) {
        log::warn!(
            "telegram: unauthorized download command from {:?} in chat {}",
            msg.from.as_ref().map(|u| u.id),
            msg.chat.id
        );
        return Ok(());
    }

    let (raw_arg, mode) = match cmd {
        Command::Ytdlp(arg) => (arg, DownloadMode::Video),
        Command::Ytdlpmp3(arg) => (arg, DownloadMode::Audio),
    };

    let Some(url) = parse_request_arg(&raw_arg) else {
        bot.send_message(msg.chat.id, USAGE)
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    };

    let chat_id = msg.chat.id;
    let adapter = Arc::new(TelegramChatAdapter::new(bot.clone(), chat_id, msg.id));
    let request = DownloadRequest {
        url,
        mode,
        // Message ids are unique per chat; combined with the chat id the
        // token never collides across concurrent requests.
        token: format!("{}_{}", chat_id.0, msg.id.0),
        layout: OutputLayout::FlatToken,
    };

    tokio::spawn(async move {
        if let DeliveryOutcome::Failed(e) = pipeline::run(request, adapter, &config).await {
            log::error!("telegram: download for chat {} failed: {}", chat_id, e);
        }
    });

    Ok(())
}
