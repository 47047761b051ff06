//! Delivery strategy: how a resolved file reaches the chat.
//!
//! Audio always goes out as an audio attachment. Video goes out as a video
//! attachment while it fits the platform; an oversized video on a platform
//! without large-file support falls back to a generic document — same
//! bytes, different presentation, still a success.

use crate::adapter::ChatAdapter;
use crate::error::DownloadError;
use crate::runner::DownloadMode;
use crate::storage::ResolvedFile;

/// Hand the resolved file to the platform.
pub async fn deliver(
    adapter: &dyn ChatAdapter,
    file: &ResolvedFile,
    mode: DownloadMode,
    size_threshold: u64,
) -> Result<(), DownloadError> {
    let result = match mode {
        DownloadMode::Audio => adapter.send_audio(file, "Downloaded MP3").await,
        DownloadMode::Video => {
            if adapter.supports_large_files() || file.size_bytes <= size_threshold {
                adapter.send_video(file, "Downloaded via yt-dlp").await
            } else {
                log::info!(
                    "{}: {} is {} bytes (> {}), sending as document",
                    adapter.name(),
                    file.display_name,
                    file.size_bytes,
                    size_threshold
                );
                adapter.send_document(file, "Video too large – sent as document").await
            }
        }
    };

    result.map_err(DownloadError::from)
}
