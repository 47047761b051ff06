//! mediabridge — dual-platform media download bot.
//!
//! `/ytdlp <url>` and `/ytdlpmp3 <url>` in Telegram or WhatsApp hand the
//! URL to yt-dlp and deliver the result back into the originating chat
//! with a live status message. The engine lives in `bridgecore`; this
//! binary wires the two platforms to it.

mod config;
mod telegram;
mod whatsapp;

use anyhow::Result;
use bridgecore::config as core_config;
use bridgecore::{logging, PipelineConfig};
use dotenvy::dotenv;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present, before the
    // Lazy statics read them
    let _ = dotenv();

    logging::init_logger(&core_config::LOG_FILE_PATH)?;
    log::info!("Starting mediabridge…");

    let pipeline_config = Arc::new(PipelineConfig::from_env());
    log::info!(
        "downloader: {} | temp root: {} | size threshold: {} MB",
        pipeline_config.ytdl_bin,
        pipeline_config.temp_root.display(),
        pipeline_config.size_threshold_bytes / (1024 * 1024)
    );

    // WhatsApp event loop runs alongside the Telegram dispatcher when a
    // gateway is configured.
    match whatsapp::WaClient::from_env() {
        Some(client) => {
            log::info!("WhatsApp gateway configured, starting event loop");
            tokio::spawn(whatsapp::run_event_loop(
                Arc::new(client),
                Arc::clone(&pipeline_config),
            ));
        }
        None => {
            log::warn!("WA_GATEWAY_URL not set — WhatsApp side disabled");
        }
    }

    telegram::run_dispatcher(pipeline_config).await
}
