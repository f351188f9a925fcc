//! Tracing setup and per-job structured logging.

use std::fmt::Display;

use tracing::{debug, info, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sora_models::JobId;

/// Install the global subscriber.
///
/// Logs always go to stderr. `RUST_LOG` overrides the default `warn` level and
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests, embedding) is not an error worth reporting.
    if use_json {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init();
    }
}

/// Logger carrying a job id and operation name on every event.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Lifecycle state change.
    pub fn transition(&self, from: impl Display, to: impl Display) {
        debug!(
            job_id = %self.job_id,
            operation = self.operation,
            from = %from,
            to = %to,
            "Lifecycle transition"
        );
    }

    pub fn status(&self, status: &str, progress: Option<u8>) {
        debug!(
            job_id = %self.job_id,
            operation = self.operation,
            status = %status,
            progress = ?progress,
            "Job status"
        );
    }

    /// A transient failure that will be retried.
    ///
    /// Logged at debug: the user already sees it through the status reporter.
    pub fn retry(&self, error: impl Display) {
        debug!(
            job_id = %self.job_id,
            operation = self.operation,
            "Poll failed, retrying: {}", error
        );
    }

    /// Record of a warning already shown to the user.
    pub fn warning(&self, message: impl Display) {
        debug!(
            job_id = %self.job_id,
            operation = self.operation,
            "{}", message
        );
    }

    pub fn completed(&self, message: impl Display) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            "Job completed: {}", message
        );
    }

    /// Span for everything done on behalf of this job.
    pub fn span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, operation = self.operation)
    }
}
