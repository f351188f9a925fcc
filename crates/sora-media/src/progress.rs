//! FFmpeg progress parsing.

/// Progress information from FFmpeg's `-progress` output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FfmpegProgress {
    /// Current frame number
    pub frame: u64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Encoding speed (e.g., 1.5 = 1.5x realtime)
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Fold one `key=value` line into `self`.
    ///
    /// Returns `true` when the line was part of the progress protocol, and a
    /// snapshot is ready when the `progress` key arrives.
    pub fn apply_line(&mut self, line: &str) -> (bool, Option<FfmpegProgress>) {
        let Some((key, value)) = line.trim().split_once('=') else {
            return (false, None);
        };
        match key {
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<i64>() {
                    // both keys report microseconds in practice
                    self.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    self.frame = frame;
                }
            }
            "speed" => {
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    self.speed = speed;
                }
            }
            "progress" => {
                if value == "end" {
                    self.is_complete = true;
                }
                return (true, Some(self.clone()));
            }
            "fps" | "bitrate" | "total_size" | "out_time" | "dup_frames" | "drop_frames"
            | "stream_0_0_q" => {}
            _ => return (false, None),
        }
        (true, None)
    }
}
