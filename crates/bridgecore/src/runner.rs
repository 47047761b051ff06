//! yt-dlp subprocess lifecycle.
//!
//! Spawns the downloader with one of two fixed argument profiles, exposes
//! its stdout as a line stream while stderr accumulates in the background,
//! and reports the exit outcome. Stdout must be drained continuously —
//! a full pipe buffer stalls the downloader — so the readers start at spawn
//! time and are joined inside `wait`, never left running past it.

use crate::error::DownloadError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Requested output format for a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadMode {
    /// Best available video+audio merged into an mp4 container.
    Video,
    /// Audio extracted to mp3.
    Audio,
}

impl DownloadMode {
    /// Format label for logging and status messages.
    pub fn label(&self) -> &'static str {
        match self {
            DownloadMode::Video => "mp4",
            DownloadMode::Audio => "mp3",
        }
    }

    /// MIME type of the file this mode produces.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DownloadMode::Video => "video/mp4",
            DownloadMode::Audio => "audio/mpeg",
        }
    }
}

/// Fixed yt-dlp argument profile for a mode. The URL goes last.
///
/// `--newline` makes yt-dlp emit one progress line per update instead of
/// rewriting the terminal line, which is what the percent scan consumes.
pub fn build_args(mode: DownloadMode, output_template: &str, url: &url::Url) -> Vec<String> {
    let mut args: Vec<String> = match mode {
        DownloadMode::Audio => vec!["-x".into(), "--audio-format".into(), "mp3".into()],
        DownloadMode::Video => vec![
            "-f".into(),
            "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best".into(),
            "--merge-output-format".into(),
            "mp4".into(),
        ],
    };
    args.push("--newline".into());
    args.push("-o".into());
    args.push(output_template.to_string());
    args.push(url.as_str().to_string());
    args
}

/// A spawned downloader: the child process, its stdout line stream and the
/// background stderr accumulator.
pub struct RunningDownload {
    child: Child,
    lines: Option<mpsc::UnboundedReceiver<String>>,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<String>,
}

/// Spawn the downloader for a request.
///
/// A spawn error is reported immediately as [`DownloadError::Start`] —
/// distinct from a process that starts and later exits non-zero.
pub fn spawn(
    bin: &str,
    mode: DownloadMode,
    output_template: &str,
    url: &url::Url,
) -> Result<RunningDownload, DownloadError> {
    let args = build_args(mode, output_template, url);
    log::debug!("spawning downloader: {} {}", bin, args.join(" "));
    spawn_with_args(bin, &args)
}

fn spawn_with_args(bin: &str, args: &[String]) -> Result<RunningDownload, DownloadError> {
    let mut child = Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DownloadError::Start(format!("'{}': {}", bin, e)))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (tx, rx) = mpsc::unbounded_channel();
    let stdout_task = tokio::spawn(async move {
        if let Some(stdout) = stdout {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                log::trace!("downloader stdout: {}", line);
                if tx.send(line).is_err() {
                    break;
                }
            }
        }
    });

    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(stderr) = stderr {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                log::debug!("downloader stderr: {}", line);
                buf.push_str(&line);
                buf.push('\n');
            }
        }
        buf
    });

    Ok(RunningDownload {
        child,
        lines: Some(rx),
        stdout_task,
        stderr_task,
    })
}

impl RunningDownload {
    /// Take the stdout line stream. Yields lines as they arrive and closes
    /// when the process exits. Can be taken once.
    pub fn take_lines(&mut self) -> mpsc::UnboundedReceiver<String> {
        self.lines.take().unwrap_or_else(|| {
            let (_tx, rx) = mpsc::unbounded_channel();
            rx
        })
    }

    /// Wait for the child to exit and join both reader tasks.
    ///
    /// On a nonzero exit the accumulated stderr is returned inside the
    /// error. When a deadline is set and expires, the child is killed and
    /// the wait reports a timeout.
    pub async fn wait(mut self, deadline: Option<Duration>) -> Result<(), DownloadError> {
        let status = match deadline {
            Some(limit) => match tokio::time::timeout(limit, self.child.wait()).await {
                Ok(result) => result?,
                Err(_) => {
                    log::error!("downloader exceeded {}s deadline, killing", limit.as_secs());
                    let _ = self.child.kill().await;
                    self.stdout_task.abort();
                    self.stderr_task.abort();
                    return Err(DownloadError::Timeout(limit.as_secs()));
                }
            },
            None => self.child.wait().await?,
        };

        // Join the readers so no consumer outlives the wait.
        let _ = self.stdout_task.await;
        let stderr = self.stderr_task.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            log::error!("downloader exited with {}", status);
            Err(DownloadError::Failed { stderr })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_url(s: &str) -> url::Url {
        url::Url::parse(s).unwrap()
    }

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_build_args_audio_profile() {
        let url = parse_url("https://www.youtube.com/watch?v=abc123");
        let args = build_args(DownloadMode::Audio, "temp/ytdlp_42.%(ext)s", &url);
        assert_eq!(
            args,
            vec![
                "-x",
                "--audio-format",
                "mp3",
                "--newline",
                "-o",
                "temp/ytdlp_42.%(ext)s",
                "https://www.youtube.com/watch?v=abc123",
            ]
        );
    }

    #[test]
    fn test_build_args_video_profile() {
        let url = parse_url("https://youtu.be/abc123");
        let args = build_args(DownloadMode::Video, "temp/ytdlp_42.%(ext)s", &url);
        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best");
        assert_eq!(args[2], "--merge-output-format");
        assert_eq!(args[3], "mp4");
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc123");
    }

    #[test]
    fn test_url_is_final_argument() {
        let url = parse_url("https://soundcloud.com/artist/track");
        for mode in [DownloadMode::Audio, DownloadMode::Video] {
            let args = build_args(mode, "out.%(ext)s", &url);
            assert_eq!(args.last().unwrap(), url.as_str());
        }
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(DownloadMode::Audio.label(), "mp3");
        assert_eq!(DownloadMode::Video.label(), "mp4");
        assert_eq!(DownloadMode::Audio.mime_type(), "audio/mpeg");
        assert_eq!(DownloadMode::Video.mime_type(), "video/mp4");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_start_error() {
        let url = parse_url("https://example.com/v");
        let result = spawn("/nonexistent/downloader-bin", DownloadMode::Audio, "out.%(ext)s", &url);
        assert!(matches!(result, Err(DownloadError::Start(_))));
    }

    #[tokio::test]
    async fn test_lines_stream_and_clean_exit() {
        let mut running = spawn_with_args("sh", &sh("printf 'one\\ntwo\\n'")).unwrap();
        let mut lines = running.take_lines();
        running.wait(None).await.unwrap();

        let mut collected = Vec::new();
        while let Ok(line) = lines.try_recv() {
            collected.push(line);
        }
        assert_eq!(collected, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let running = spawn_with_args("sh", &sh("echo 'ERROR: boom' >&2; exit 3")).unwrap();
        match running.wait(None).await {
            Err(DownloadError::Failed { stderr }) => assert!(stderr.contains("ERROR: boom")),
            other => panic!("expected Failed, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_killed_process_reports_failure() {
        // SIGKILL'd child (exit 137 from a shell's point of view)
        let running = spawn_with_args("sh", &sh("kill -9 $$")).unwrap();
        assert!(matches!(running.wait(None).await, Err(DownloadError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_deadline_kills_and_reports_timeout() {
        let running = spawn_with_args("sh", &sh("sleep 30")).unwrap();
        let result = running.wait(Some(Duration::from_millis(200))).await;
        assert!(matches!(result, Err(DownloadError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_take_lines_twice_yields_closed_stream() {
        let mut running = spawn_with_args("sh", &sh("true")).unwrap();
        let _first = running.take_lines();
        let mut second = running.take_lines();
        assert!(second.try_recv().is_err());
        running.wait(None).await.unwrap();
    }
}
