//! Download destinations.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use scopeguard::ScopeGuard;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use sora_client::Download;
use sora_models::JobId;

use crate::error::GenerateResult;
use crate::reporter::StatusReporter;

/// `-o -` streams the video instead of saving it.
pub const STREAM_MARKER: &str = "-";

/// Where downloaded bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Saved via `<path>.part` and an atomic rename.
    File(PathBuf),
    /// Written to the stream sink (stdout in the binary).
    Stream,
}

impl OutputTarget {
    /// Parse an `--output` value. Empty means "not given".
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "" => None,
            STREAM_MARKER => Some(OutputTarget::Stream),
            path => Some(OutputTarget::File(PathBuf::from(path))),
        }
    }

    /// The requested target, or `{job_id}.mp4`.
    pub fn for_job(requested: Option<&OutputTarget>, job_id: &JobId) -> Self {
        requested
            .cloned()
            .unwrap_or_else(|| OutputTarget::File(PathBuf::from(job_id.default_filename())))
    }

    /// Value recorded as the history entry's output file.
    pub fn history_value(&self) -> String {
        match self {
            OutputTarget::File(path) => path.display().to_string(),
            OutputTarget::Stream => String::new(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, OutputTarget::File(_))
    }
}

/// Temp path a named download is written to first.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Write `download` to `target`, returning the byte count.
///
/// A named destination only appears once every byte is written and synced;
/// if the copy fails or the future is dropped, the `.part` file is removed.
pub async fn write_download<W>(
    download: Download,
    target: &OutputTarget,
    stream_sink: &mut W,
    reporter: &StatusReporter,
) -> GenerateResult<u64>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    match target {
        OutputTarget::Stream => copy_stream(download, stream_sink, reporter).await,
        OutputTarget::File(dest) => write_file(download, dest, reporter).await,
    }
}

async fn write_file(download: Download, dest: &Path, reporter: &StatusReporter) -> GenerateResult<u64> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let part = scopeguard::guard(part_path(dest), |path| {
        let _ = std::fs::remove_file(&path);
    });

    let mut file = fs::File::create(&*part).await?;
    let written = copy_stream(download, &mut file, reporter).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&*part, dest).await?;
    let part = ScopeGuard::into_inner(part);
    debug!(from = %part.display(), to = %dest.display(), bytes = written, "Download saved");
    Ok(written)
}

async fn copy_stream<W>(download: Download, sink: &mut W, reporter: &StatusReporter) -> GenerateResult<u64>
where
    W: AsyncWrite + Unpin + Send + ?Sized,
{
    let Download {
        content_length,
        mut stream,
    } = download;

    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        sink.write_all(&chunk).await?;
        written += chunk.len() as u64;
        reporter.download_progress(written, content_length);
    }
    sink.flush().await?;

    reporter.download_finished(written);
    Ok(written)
}
