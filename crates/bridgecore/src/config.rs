use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Cached yt-dlp binary path.
/// Read once at startup from the YTDL_BIN environment variable, defaults to "yt-dlp".
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Root of the temporary download tree.
/// Read from TEMP_DIR, defaults to "temp". Supports tilde (~) expansion.
pub static TEMP_DIR: Lazy<String> = Lazy::new(|| env::var("TEMP_DIR").unwrap_or_else(|_| "temp".to_string()));

/// Log file path.
/// Read from LOG_FILE_PATH, defaults to mediabridge.log.
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "mediabridge.log".to_string()));

/// Upload size limit of the standard Telegram Bot API (50 MB).
/// Videos above this go out as documents unless a self-hosted API server
/// raises the limit.
pub const UPLOAD_SIZE_LIMIT: u64 = 50 * 1024 * 1024;

/// Download configuration
pub mod download {
    use super::Duration;

    /// Upper bound on one yt-dlp run (in seconds). The downloader has its
    /// own retry/stall behavior; this deadline keeps a wedged process from
    /// pinning a request forever.
    pub const YTDLP_DEADLINE_SECS: u64 = 900;

    /// yt-dlp run deadline duration
    pub fn deadline() -> Duration {
        Duration::from_secs(YTDLP_DEADLINE_SECS)
    }
}

/// Explicit configuration handed to the pipeline entry point.
///
/// The pipeline never reads process-wide state itself; everything it needs
/// arrives through this struct, which keeps it testable with scratch
/// binaries and scratch directories.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path of the downloader executable.
    pub ytdl_bin: String,
    /// Root directory for per-request temp storage.
    pub temp_root: PathBuf,
    /// Size above which videos fall back to document delivery.
    pub size_threshold_bytes: u64,
    /// Kill the downloader after this long. `None` disables the bound.
    pub download_deadline: Option<Duration>,
}

impl PipelineConfig {
    /// Assemble the config from the environment-backed defaults above.
    pub fn from_env() -> Self {
        let temp_root = PathBuf::from(shellexpand::tilde(TEMP_DIR.as_str()).into_owned());
        Self {
            ytdl_bin: YTDL_BIN.clone(),
            temp_root,
            size_threshold_bytes: env::var("UPLOAD_SIZE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(UPLOAD_SIZE_LIMIT),
            download_deadline: Some(
                env::var("YTDLP_DEADLINE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or_else(download::deadline),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        let config = PipelineConfig::from_env();
        assert!(!config.ytdl_bin.is_empty());
        assert!(config.size_threshold_bytes > 0);
        assert!(config.download_deadline.is_some());
    }
}
