//! Shared fixtures for pipeline integration tests: a recording chat adapter
//! and a fake downloader executable standing in for yt-dlp.

#![allow(dead_code)]

use async_trait::async_trait;
use bridgecore::adapter::{AdapterError, ChatAdapter, MessageHandle};
use bridgecore::storage::ResolvedFile;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One adapter call, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendText(String),
    EditText(String),
    SendAudio(String),
    SendVideo(String),
    SendDocument(String),
    Remove(String),
}

/// Chat adapter that records every call instead of talking to a platform.
#[derive(Default)]
pub struct RecordingAdapter {
    pub large_files: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingAdapter {
    pub fn with_large_files() -> Self {
        Self {
            large_files: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Text of the last send or edit, i.e. what the user currently sees.
    pub fn last_status_text(&self) -> Option<String> {
        self.calls().iter().rev().find_map(|c| match c {
            Call::SendText(t) | Call::EditText(t) => Some(t.clone()),
            _ => None,
        })
    }

    pub fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| f(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatAdapter for RecordingAdapter {
    fn name(&self) -> &str {
        "recording"
    }

    fn supports_large_files(&self) -> bool {
        self.large_files
    }

    async fn send_text(&self, text: &str) -> Result<MessageHandle, AdapterError> {
        self.record(Call::SendText(text.to_string()));
        Ok(MessageHandle("status-1".to_string()))
    }

    async fn edit_text(&self, _message: &MessageHandle, text: &str) -> Result<(), AdapterError> {
        self.record(Call::EditText(text.to_string()));
        Ok(())
    }

    async fn send_audio(&self, file: &ResolvedFile, _caption: &str) -> Result<(), AdapterError> {
        self.record(Call::SendAudio(file.display_name.clone()));
        Ok(())
    }

    async fn send_video(&self, file: &ResolvedFile, _caption: &str) -> Result<(), AdapterError> {
        self.record(Call::SendVideo(file.display_name.clone()));
        Ok(())
    }

    async fn send_document(&self, file: &ResolvedFile, _caption: &str) -> Result<(), AdapterError> {
        self.record(Call::SendDocument(file.display_name.clone()));
        Ok(())
    }

    async fn remove_message(&self, message: &MessageHandle) -> Result<(), AdapterError> {
        self.record(Call::Remove(message.to_string()));
        Ok(())
    }
}

/// Write an executable shell script that stands in for yt-dlp.
///
/// The script body runs after a preamble that extracts the `-o` template
/// into `$out` and the final URL into `$url`, mirroring how the real
/// downloader receives its arguments.
pub fn fake_downloader(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        "#!/bin/sh\n\
         out=\"\"\n\
         prev=\"\"\n\
         for a in \"$@\"; do\n\
         \x20\x20if [ \"$prev\" = \"-o\" ]; then out=\"$a\"; fi\n\
         \x20\x20prev=\"$a\"\n\
         \x20\x20url=\"$a\"\n\
         done\n\
         {}\n",
        body
    );

    let path = dir.join("fake-ytdlp");
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Files left in `dir` whose names contain `needle`.
pub fn leftover_files(dir: &Path, needle: &str) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.contains(needle))
            .collect(),
        Err(_) => Vec::new(),
    }
}
