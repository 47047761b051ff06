//! Status-message lifecycle.
//!
//! One editable chat message tracks each request: created at acceptance,
//! edited in place as progress and stage change, removed on success, and
//! rewritten with the failure reason on error so the user keeps visible
//! diagnostics. All edits for a request flow through the pipeline's single
//! loop, so they are serialized per message; repeated renders of the same
//! text are skipped to spare platforms that penalize rapid edits.

use crate::adapter::{ChatAdapter, MessageHandle};
use std::sync::Arc;

/// Render states of the status message.
///
/// `Downloading` re-enters on every progress sample; `Uploading` always
/// appears between the last percent and delivery, even when delivery is
/// near-instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Request accepted, downloader not yet producing progress.
    Starting,
    /// Carries the raw display token scanned from downloader output.
    Downloading(String),
    /// Downloader finished, file on its way to the platform.
    Uploading,
    /// Terminal failure with a user-facing reason.
    Failed(String),
}

impl DownloadStatus {
    /// Message text shown for this state.
    pub fn render(&self) -> String {
        match self {
            DownloadStatus::Starting => "Downloading… 0%".to_string(),
            DownloadStatus::Downloading(token) => format!("Downloading… {}", token),
            DownloadStatus::Uploading => "Uploading…".to_string(),
            DownloadStatus::Failed(reason) => reason.clone(),
        }
    }
}

/// Last `limit` bytes of diagnostic text, cut on a char boundary.
pub fn stderr_tail(stderr: &str, limit: usize) -> &str {
    if stderr.len() <= limit {
        return stderr;
    }
    let mut start = stderr.len() - limit;
    while start < stderr.len() && !stderr.is_char_boundary(start) {
        start += 1;
    }
    &stderr[start..]
}

/// The single live status message of one request.
pub struct StatusMessage {
    adapter: Arc<dyn ChatAdapter>,
    handle: Option<MessageHandle>,
    last_rendered: String,
}

impl StatusMessage {
    /// Send the initial status text and remember the handle for edits.
    ///
    /// A failed send is logged and tolerated: the request still runs, the
    /// user just gets no live indicator.
    pub async fn create(adapter: Arc<dyn ChatAdapter>) -> Self {
        let text = DownloadStatus::Starting.render();
        let handle = match adapter.send_text(&text).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("{}: failed to send status message: {}", adapter.name(), e);
                None
            }
        };
        Self {
            adapter,
            handle,
            last_rendered: text,
        }
    }

    /// Edit the message in place for a state change or progress sample.
    ///
    /// Identical renders are skipped (idempotent on repeated percents).
    /// Edit failures are logged, never propagated — a dropped progress
    /// frame must not fail the download.
    pub async fn update(&mut self, status: &DownloadStatus) {
        let text = status.render();
        if text == self.last_rendered {
            return;
        }
        let Some(ref handle) = self.handle else { return };
        match self.adapter.edit_text(handle, &text).await {
            Ok(()) => self.last_rendered = text,
            Err(e) => log::warn!("{}: failed to edit status message: {}", self.adapter.name(), e),
        }
    }

    /// Terminal success: remove the status message from the chat (delete on
    /// Telegram, revoke-for-everyone on WhatsApp). Removal failures are
    /// logged and never block completion.
    pub async fn finish_delivered(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.adapter.remove_message(&handle).await {
                log::warn!("{}: failed to remove status message: {}", self.adapter.name(), e);
            }
        }
    }

    /// Terminal failure: the message stays in the chat, rewritten with the
    /// reason so the user retains the diagnostic text.
    pub async fn finish_failed(mut self, reason: &str) {
        self.update(&DownloadStatus::Failed(reason.to_string())).await;
        self.handle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterError;
    use crate::storage::ResolvedFile;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Adapter that records every call for assertions.
    #[derive(Default)]
    struct RecordingAdapter {
        calls: Mutex<Vec<String>>,
        fail_edits: bool,
    }

    impl RecordingAdapter {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ChatAdapter for RecordingAdapter {
        fn name(&self) -> &str {
            "recording"
        }
        fn supports_large_files(&self) -> bool {
            false
        }
        async fn send_text(&self, text: &str) -> Result<MessageHandle, AdapterError> {
            self.record(format!("send_text:{}", text));
            Ok(MessageHandle("1".to_string()))
        }
        async fn edit_text(&self, _message: &MessageHandle, text: &str) -> Result<(), AdapterError> {
            if self.fail_edits {
                return Err(AdapterError::Api("edit refused".to_string()));
            }
            self.record(format!("edit_text:{}", text));
            Ok(())
        }
        async fn send_audio(&self, _file: &ResolvedFile, _caption: &str) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn send_video(&self, _file: &ResolvedFile, _caption: &str) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn send_document(&self, _file: &ResolvedFile, _caption: &str) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn remove_message(&self, message: &MessageHandle) -> Result<(), AdapterError> {
            self.record(format!("remove:{}", message));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_create_sends_placeholder() {
        let adapter = Arc::new(RecordingAdapter::default());
        let _status = StatusMessage::create(adapter.clone()).await;
        assert_eq!(adapter.calls(), vec!["send_text:Downloading… 0%"]);
    }

    #[tokio::test]
    async fn test_repeated_percent_is_one_edit() {
        let adapter = Arc::new(RecordingAdapter::default());
        let mut status = StatusMessage::create(adapter.clone()).await;
        status.update(&DownloadStatus::Downloading("42%".to_string())).await;
        status.update(&DownloadStatus::Downloading("42%".to_string())).await;
        status.update(&DownloadStatus::Downloading("43%".to_string())).await;

        assert_eq!(
            adapter.calls(),
            vec![
                "send_text:Downloading… 0%",
                "edit_text:Downloading… 42%",
                "edit_text:Downloading… 43%",
            ]
        );
    }

    #[tokio::test]
    async fn test_delivered_removes_message() {
        let adapter = Arc::new(RecordingAdapter::default());
        let status = StatusMessage::create(adapter.clone()).await;
        status.finish_delivered().await;
        assert!(adapter.calls().contains(&"remove:1".to_string()));
    }

    #[tokio::test]
    async fn test_failed_rewrites_and_keeps_message() {
        let adapter = Arc::new(RecordingAdapter::default());
        let status = StatusMessage::create(adapter.clone()).await;
        status.finish_failed("Download failed.\nERROR: no formats").await;

        let calls = adapter.calls();
        assert!(calls.iter().any(|c| c.contains("ERROR: no formats")));
        assert!(!calls.iter().any(|c| c.starts_with("remove:")));
    }

    #[tokio::test]
    async fn test_edit_failure_is_swallowed() {
        let adapter = Arc::new(RecordingAdapter {
            fail_edits: true,
            ..Default::default()
        });
        let mut status = StatusMessage::create(adapter.clone()).await;
        // Must not panic or error out
        status.update(&DownloadStatus::Downloading("10%".to_string())).await;
    }

    #[test]
    fn test_stderr_tail_short_text_unchanged() {
        assert_eq!(stderr_tail("short", 100), "short");
    }

    #[test]
    fn test_stderr_tail_truncates_to_last_bytes() {
        let text = "a".repeat(50) + "KEEP";
        assert_eq!(stderr_tail(&text, 4), "KEEP");
    }

    #[test]
    fn test_stderr_tail_respects_char_boundary() {
        let text = "ééééé"; // 10 bytes
        let tail = stderr_tail(text, 3);
        assert_eq!(tail, "é");
    }
}
