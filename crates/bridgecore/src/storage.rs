//! Per-request temp storage and output resolution.
//!
//! Each request gets its own slice of the temp tree, keyed by the request
//! token, so concurrent requests never touch each other's files. Telegram
//! requests use flat token-prefixed filenames; WhatsApp requests get a
//! dedicated subdirectory so the title-derived filename survives. Cleanup
//! runs on every exit path through the `Drop` guard.

use crate::error::DownloadError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filename layout used for one request's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// Flat files under the temp root, prefixed `ytdlp_<token>.`.
    FlatToken,
    /// A dedicated `wa_<token>/` directory holding a title-derived filename.
    TitledDir,
}

/// A media file located on disk after a successful downloader run.
#[derive(Debug, Clone)]
pub struct ResolvedFile {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Filename shown to the recipient.
    pub display_name: String,
}

/// Suffixes yt-dlp leaves behind for unfinished downloads. Never resolved,
/// always swept by cleanup.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

fn is_partial(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn modified_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// The temp-storage slice owned by one pipeline invocation.
pub struct RequestStorage {
    root: PathBuf,
    token: String,
    layout: OutputLayout,
}

impl RequestStorage {
    /// Create the storage slice for one request.
    ///
    /// The token must be unique per invocation; it scopes both the output
    /// template and resolution, which is what keeps concurrent requests
    /// apart on disk.
    pub fn create(root: &Path, token: &str, layout: OutputLayout) -> std::io::Result<Self> {
        match layout {
            OutputLayout::FlatToken => fs::create_dir_all(root)?,
            OutputLayout::TitledDir => fs::create_dir_all(root.join(format!("wa_{}", token)))?,
        }
        Ok(Self {
            root: root.to_path_buf(),
            token: token.to_string(),
            layout,
        })
    }

    /// The `-o` template handed to the downloader.
    pub fn output_template(&self) -> String {
        match self.layout {
            OutputLayout::FlatToken => self
                .root
                .join(format!("ytdlp_{}.%(ext)s", self.token))
                .display()
                .to_string(),
            OutputLayout::TitledDir => self
                .root
                .join(format!("wa_{}", self.token))
                .join("%(title)s.%(ext)s")
                .display()
                .to_string(),
        }
    }

    fn candidates(&self) -> std::io::Result<Vec<PathBuf>> {
        let (dir, prefix) = match self.layout {
            // Trailing dot: token must match exactly, "1" never matches "10"'s files
            OutputLayout::FlatToken => (self.root.clone(), Some(format!("ytdlp_{}.", self.token))),
            OutputLayout::TitledDir => (self.root.join(format!("wa_{}", self.token)), None),
        };

        let mut found = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(ref prefix) = prefix {
                if !entry.file_name().to_string_lossy().starts_with(prefix.as_str()) {
                    continue;
                }
            }
            found.push(entry.path());
        }
        Ok(found)
    }

    /// Locate the downloaded file.
    ///
    /// Partial-download suffixes are filtered out and, when several files
    /// remain, the most recently modified one wins — resolution stays
    /// deterministic even when the downloader leaves more than one artifact
    /// behind. Zero matches is the missing-output failure, never success.
    pub fn resolve(&self) -> Result<ResolvedFile, DownloadError> {
        let mut files: Vec<PathBuf> = self.candidates()?.into_iter().filter(|p| !is_partial(p)).collect();

        files.sort_by_key(|p| std::cmp::Reverse(modified_time(p)));

        let path = files.into_iter().next().ok_or(DownloadError::MissingOutput)?;
        let size_bytes = fs::metadata(&path)?.len();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("ytdlp_{}", self.token));

        Ok(ResolvedFile {
            path,
            size_bytes,
            display_name,
        })
    }

    /// Remove every artifact belonging to this request, partials included.
    /// Safe to call more than once.
    pub fn cleanup(&self) {
        match self.layout {
            OutputLayout::FlatToken => {
                if let Ok(files) = self.candidates() {
                    for path in files {
                        if let Err(e) = fs::remove_file(&path) {
                            if e.kind() != std::io::ErrorKind::NotFound {
                                log::warn!("failed to delete {}: {}", path.display(), e);
                            }
                        }
                    }
                }
            }
            OutputLayout::TitledDir => {
                let dir = self.root.join(format!("wa_{}", self.token));
                if let Err(e) = fs::remove_dir_all(&dir) {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("failed to delete {}: {}", dir.display(), e);
                    }
                }
            }
        }
    }
}

impl Drop for RequestStorage {
    fn drop(&mut self) {
        self.cleanup();
    }
}
