//! User-facing status output.
//!
//! Everything here goes to the side channel (stderr in the binary) so a
//! video streamed to stdout is never mixed with text.

use std::fmt::Display;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
#[cfg(test)]
use std::sync::Arc;
use std::time::{Duration, Instant};

const BAR_WIDTH: usize = 40;
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

struct ReporterState {
    out: Box<dyn Write + Send>,
    bar_percent: Option<u8>,
    last_download_draw: Option<Instant>,
}

/// Writes status lines, the generation bar and download progress.
pub struct StatusReporter {
    state: Mutex<ReporterState>,
}

impl StatusReporter {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(ReporterState {
                out,
                bar_percent: None,
                last_download_draw: None,
            }),
        }
    }

    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    /// Discard everything.
    pub fn silent() -> Self {
        Self::new(Box::new(io::sink()))
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(state: &mut ReporterState, text: &str) {
        // status output is best effort
        let _ = state.out.write_all(text.as_bytes());
        let _ = state.out.flush();
    }

    /// One status line.
    pub fn line(&self, message: impl Display) {
        let mut state = self.lock();
        Self::emit(&mut state, &format!("{}\n", message));
    }

    pub fn warn(&self, message: impl Display) {
        self.line(format_args!("Warning: {}", message));
    }

    /// Redraw the generation bar when the percentage changes.
    pub fn generation_progress(&self, percent: u8) {
        let percent = percent.min(100);
        let mut state = self.lock();
        if state.bar_percent == Some(percent) {
            return;
        }
        state.bar_percent = Some(percent);
        Self::emit(&mut state, &format!("\r{}", render_bar(percent)));
    }

    /// Force the bar to 100% and end its line.
    pub fn generation_finished(&self) {
        let mut state = self.lock();
        state.bar_percent = Some(100);
        Self::emit(&mut state, &format!("\r{}\n", render_bar(100)));
    }

    /// Download progress, throttled.
    pub fn download_progress(&self, written: u64, total: Option<u64>) {
        let mut state = self.lock();
        let now = Instant::now();
        let complete = total.is_some_and(|t| written >= t);
        if let Some(last) = state.last_download_draw {
            if !complete && now.duration_since(last) < REDRAW_INTERVAL {
                return;
            }
        }
        state.last_download_draw = Some(now);

        let text = match total {
            Some(total) => format!(
                "\rDownloading: {} / {} ({:.1}%)",
                human_bytes(written),
                human_bytes(total),
                written as f64 / total as f64 * 100.0
            ),
            None => format!("\rDownloading: {}", human_bytes(written)),
        };
        Self::emit(&mut state, &text);
    }

    pub fn download_finished(&self, written: u64) {
        let mut state = self.lock();
        state.last_download_draw = None;
        Self::emit(&mut state, &format!("\rDownloaded {}\n", human_bytes(written)));
    }
}

fn render_bar(percent: u8) -> String {
    let filled = BAR_WIDTH * percent as usize / 100;
    format!(
        "Generating video [{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Size in binary units with one decimal, e.g. `1.5 MiB`.
pub fn human_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = n as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TiB", size * 1024.0)
}

/// `1h 2m 3s`, `2m 3s` or `45s`, rounded to the nearest second.
pub fn format_duration(d: Duration) -> String {
    let total = (d.as_millis() + 500) / 1000;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Cloneable in-memory writer for capturing reporter output.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
