//! Invoking the `ffmpeg` binary.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Lines of FFmpeg diagnostics kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One `ffmpeg -i <input> ... <output>` invocation.
///
/// Always overwrites the output, logs only errors and writes `-progress`
/// key/value pairs to stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    encode_args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            encode_args: Vec::new(),
        }
    }

    /// File FFmpeg reads from.
    pub fn input(&self) -> &Path {
        &self.input
    }

    fn flag(mut self, name: &str, value: impl ToString) -> Self {
        self.encode_args.push(name.to_string());
        self.encode_args.push(value.to_string());
        self
    }

    /// `-vf scale=W:H`
    pub fn scale(self, width: u32, height: u32) -> Self {
        self.flag("-vf", format!("scale={}:{}", width, height))
    }

    pub fn video_codec(self, codec: &str) -> Self {
        self.flag("-c:v", codec)
    }

    pub fn crf(self, crf: u8) -> Self {
        self.flag("-crf", crf)
    }

    pub fn preset(self, preset: &str) -> Self {
        self.flag("-preset", preset)
    }

    /// Strip audio streams.
    pub fn no_audio(mut self) -> Self {
        self.encode_args.push("-an".to_string());
        self
    }

    /// Full argument list, without the program name.
    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-v", "error", "-progress", "pipe:2", "-i"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(self.input.to_string_lossy().into_owned());
        args.extend(self.encode_args.iter().cloned());
        args.push(self.output.to_string_lossy().into_owned());
        args
    }
}

/// Spawns FFmpeg and waits for it, honoring cancel and an optional timeout.
#[derive(Debug, Default)]
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the process once the flag flips to `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Run `cmd`; a non-zero exit carries the last lines of FFmpeg's stderr.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        let program = check_ffmpeg()?;
        let args = cmd.build_args();
        debug!(program = %program.display(), args = %args.join(" "), "Spawning FFmpeg");

        let mut child = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::io(cmd.input(), e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;
        let diagnostics = tokio::spawn(collect_diagnostics(stderr));

        let outcome = self.wait(&mut child, cmd.input()).await;
        let tail = diagnostics.await.unwrap_or_default();

        match outcome {
            Err(MediaError::FfmpegFailed {
                path,
                message,
                exit_code,
                ..
            }) => Err(MediaError::ffmpeg_failed(
                path,
                format!("{}\nOutput: {}", message, tail),
                Some(tail),
                exit_code,
            )),
            other => other,
        }
    }

    async fn wait(&self, child: &mut Child, input: &Path) -> MediaResult<()> {
        let mut cancel_rx = self.cancel_rx.clone();

        let status = tokio::select! {
            biased;
            _ = wait_cancelled(cancel_rx.as_mut()) => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                return Err(MediaError::Cancelled);
            }
            _ = sleep_or_forever(self.timeout) => {
                let secs = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                warn!(secs, "FFmpeg timed out, killing process");
                let _ = child.kill().await;
                return Err(MediaError::Timeout(secs));
            }
            status = child.wait() => status.map_err(|e| MediaError::io(input, e))?,
        };

        if status.success() {
            return Ok(());
        }
        Err(MediaError::ffmpeg_failed(
            input,
            format!("ffmpeg exited with {}", status),
            None,
            status.code(),
        ))
    }
}

/// Logs progress snapshots and returns the non-progress tail of stderr.
async fn collect_diagnostics(stderr: tokio::process::ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut progress = FfmpegProgress::default();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    while let Ok(Some(line)) = lines.next_line().await {
        match progress.apply_line(&line) {
            (true, Some(snapshot)) => debug!(
                frame = snapshot.frame,
                out_time_ms = snapshot.out_time_ms,
                speed = snapshot.speed,
                "FFmpeg progress"
            ),
            (true, None) => {}
            (false, _) => {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
    }

    Vec::from(tail).join("\n")
}

/// Resolves once the cancel flag is raised; never without a live signal.
async fn wait_cancelled(rx: Option<&mut watch::Receiver<bool>>) {
    if let Some(rx) = rx {
        if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
            return;
        }
    }
    std::future::pending::<()>().await
}

async fn sleep_or_forever(duration: Option<Duration>) {
    match duration {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending::<()>().await,
    }
}

/// Locate `ffmpeg` on `PATH`.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_arguments_in_order() {
        let cmd = FfmpegCommand::new("input.mov", "output.mp4")
            .scale(1280, 720)
            .video_codec("libx264")
            .crf(23)
            .preset("fast")
            .no_audio();

        assert_eq!(
            cmd.build_args(),
            vec![
                "-y", "-v", "error", "-progress", "pipe:2", "-i", "input.mov", "-vf",
                "scale=1280:720", "-c:v", "libx264", "-crf", "23", "-preset", "fast", "-an",
                "output.mp4",
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_signal_resolves_wait() {
        let (tx, mut rx) = watch::channel(false);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), wait_cancelled(Some(&mut rx)))
            .await
            .expect("cancel should resolve immediately");
    }

    #[tokio::test]
    async fn test_dropped_sender_never_cancels() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        let waited =
            tokio::time::timeout(Duration::from_millis(20), wait_cancelled(Some(&mut rx))).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_no_signal_never_cancels() {
        let waited = tokio::time::timeout(Duration::from_millis(20), wait_cancelled(None)).await;
        assert!(waited.is_err());
    }
}
