use thiserror::Error;

/// Terminal failure modes of a download request.
///
/// Every variant ends the request — nothing here is retried; the user gets a
/// fresh command instead. The stderr captured from the downloader rides
/// along on `Failed` so the status message can show a diagnostic tail.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// The downloader binary could not be spawned at all.
    #[error("downloader failed to start: {0}")]
    Start(String),

    /// The downloader started but exited non-zero.
    #[error("download failed: {stderr}")]
    Failed {
        /// Accumulated stderr of the downloader run.
        stderr: String,
    },

    /// The downloader exceeded the configured deadline and was killed.
    #[error("download timed out after {0}s")]
    Timeout(u64),

    /// The downloader exited 0 but no output file matched the request.
    #[error("downloaded file not found")]
    MissingOutput,

    /// Uploading file bytes to platform-managed storage failed.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The send call itself failed.
    #[error("send failed: {0}")]
    Send(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with DownloadError
pub type DownloadResult<T> = Result<T, DownloadError>;

impl From<crate::adapter::AdapterError> for DownloadError {
    fn from(err: crate::adapter::AdapterError) -> Self {
        use crate::adapter::AdapterError;
        match err {
            AdapterError::Upload(msg) => DownloadError::Upload(msg),
            AdapterError::Send(msg) | AdapterError::Api(msg) => DownloadError::Send(msg),
        }
    }
}
