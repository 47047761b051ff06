//! Pipeline orchestrator: one request from command to delivered file.
//!
//! Flow: status message → spawn downloader → drain stdout for progress
//! while awaiting exit → resolve output → uploading status → deliver →
//! clear status. Failures rewrite the status message and skip delivery.
//! Temp storage is reclaimed on every path through the `RequestStorage`
//! guard, so no artifact outlives its request.

use crate::adapter::ChatAdapter;
use crate::config::PipelineConfig;
use crate::deliver;
use crate::error::DownloadError;
use crate::progress;
use crate::runner::{self, DownloadMode};
use crate::status::{stderr_tail, DownloadStatus, StatusMessage};
use crate::storage::{OutputLayout, RequestStorage};
use std::sync::Arc;
use url::Url;

/// Longest stderr tail shown inside a failure status message.
const STDERR_TAIL_BYTES: usize = 800;

/// A single validated download command.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: Url,
    pub mode: DownloadMode,
    /// Unique per invocation (the platform message id); scopes temp storage
    /// and output matching.
    pub token: String,
    pub layout: OutputLayout,
}

/// How a request ended. `Delivered` is the only success; every failure
/// carries the terminal error already shown to the user.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(DownloadError),
}

/// Run one request to completion.
///
/// Never panics and never leaves temp files behind; the caller only needs
/// the outcome for logging.
pub async fn run(request: DownloadRequest, adapter: Arc<dyn ChatAdapter>, config: &PipelineConfig) -> DeliveryOutcome {
    log::info!(
        "{}: {} download of {} (request {})",
        adapter.name(),
        request.mode.label(),
        request.url,
        request.token
    );

    let mut status = StatusMessage::create(Arc::clone(&adapter)).await;

    let storage = match RequestStorage::create(&config.temp_root, &request.token, request.layout) {
        Ok(storage) => storage,
        Err(e) => {
            let err = DownloadError::Io(e);
            log::error!("{}: failed to create temp storage: {}", adapter.name(), err);
            status.finish_failed(&failure_text(&err)).await;
            return DeliveryOutcome::Failed(err);
        }
    };

    let result = run_stages(&request, adapter.as_ref(), &mut status, &storage, config).await;

    // Storage drops at the end of this function; both arms below run with
    // the request's files still on disk only until then.
    match result {
        Ok(()) => {
            log::info!("{}: request {} delivered", adapter.name(), request.token);
            status.finish_delivered().await;
            DeliveryOutcome::Delivered
        }
        Err(err) => {
            log::error!("{}: request {} failed: {}", adapter.name(), request.token, err);
            status.finish_failed(&failure_text(&err)).await;
            DeliveryOutcome::Failed(err)
        }
    }
}

async fn run_stages(
    request: &DownloadRequest,
    adapter: &dyn ChatAdapter,
    status: &mut StatusMessage,
    storage: &RequestStorage,
    config: &PipelineConfig,
) -> Result<(), DownloadError> {
    let template = storage.output_template();
    let mut running = runner::spawn(&config.ytdl_bin, request.mode, &template, &request.url)?;
    let mut lines = running.take_lines();

    // Two cooperating tasks per request: the blocking wait and this loop
    // draining stdout. The wait joins the readers, so nothing outlives it.
    let mut wait = tokio::spawn(running.wait(config.download_deadline));

    loop {
        tokio::select! {
            Some(line) = lines.recv() => {
                if let Some(token) = progress::percent_token(&line) {
                    status.update(&DownloadStatus::Downloading(token.to_string())).await;
                }
            }
            result = &mut wait => {
                result.map_err(|e| DownloadError::Start(format!("downloader task died: {}", e)))??;
                break;
            }
        }
    }

    let file = storage.resolve()?;
    log::info!(
        "resolved {} ({:.2} MB) for request {}",
        file.display_name,
        file.size_bytes as f64 / (1024.0 * 1024.0),
        request.token
    );

    status.update(&DownloadStatus::Uploading).await;
    deliver::deliver(adapter, &file, request.mode, config.size_threshold_bytes).await
}

/// User-facing text for a terminal failure, with the downloader's stderr
/// tail where one exists.
fn failure_text(err: &DownloadError) -> String {
    match err {
        DownloadError::Start(reason) => format!("Download failed to start: {}", reason),
        DownloadError::Failed { stderr } => {
            let tail = stderr_tail(stderr.trim_end(), STDERR_TAIL_BYTES);
            if tail.is_empty() {
                "Download failed.".to_string()
            } else {
                format!("Download failed.\n{}", tail)
            }
        }
        DownloadError::Timeout(secs) => format!("Download failed: timed out after {}s.", secs),
        DownloadError::MissingOutput => "File not found.".to_string(),
        DownloadError::Upload(reason) => format!("Failed to upload media: {}", reason),
        DownloadError::Send(reason) => format!("Failed to send file: {}", reason),
        DownloadError::Io(e) => format!("Download failed: {}", e),
    }
}
