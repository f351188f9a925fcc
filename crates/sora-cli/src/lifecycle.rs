//! Job lifecycle controller.
//!
//! `Resolving -> Submitted -> Polling -> Downloading -> Recorded`, with
//! `Failed` reachable from every step. Every await after resolution races
//! the cancel signal and the overall deadline; cancel wins when both are
//! ready.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::Instrument;

use sora_client::{CreateVideoRequest, VideoApi};
use sora_history::HistoryStore;
use sora_media::MediaConformer;
use sora_models::{HistoryEntry, JobId, JobPhase, JobSnapshot};

use crate::config::GenerateConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::logging::JobLogger;
use crate::output::{write_download, OutputTarget};
use crate::reporter::{format_duration, StatusReporter};
use crate::request::{GenerationRequest, JobPlan};

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Resolving,
    Submitted,
    Polling,
    Downloading,
    Recorded,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Resolving => "resolving",
            LifecycleState::Submitted => "submitted",
            LifecycleState::Polling => "polling",
            LifecycleState::Downloading => "downloading",
            LifecycleState::Recorded => "recorded",
            LifecycleState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub job_id: JobId,
    pub output: OutputTarget,
    pub bytes_written: u64,
    /// Submission to finished download
    pub elapsed: Duration,
    /// `false` when the history append failed (the run still succeeded)
    pub history_recorded: bool,
}

/// Races work against cancellation and the run deadline.
struct RunGuard {
    cancel: watch::Receiver<bool>,
    deadline: Instant,
    timeout_secs: u64,
}

impl RunGuard {
    async fn run<F: Future>(&mut self, work: F) -> GenerateResult<F::Output> {
        tokio::select! {
            biased;
            _ = cancelled(&mut self.cancel) => Err(GenerateError::Cancelled),
            _ = tokio::time::sleep_until(self.deadline) => {
                Err(GenerateError::DeadlineExceeded(self.timeout_secs))
            }
            out = work => Ok(out),
        }
    }

    async fn sleep(&mut self, duration: Duration) -> GenerateResult<()> {
        self.run(tokio::time::sleep(duration)).await
    }
}

/// Resolves once cancel is raised; never if the sender is gone.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|cancel| *cancel).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Drives one generation from request to history entry.
pub struct JobLifecycle {
    api: Arc<dyn VideoApi>,
    history: Arc<dyn HistoryStore>,
    conformer: MediaConformer,
    config: GenerateConfig,
    reporter: Arc<StatusReporter>,
}

impl JobLifecycle {
    pub fn new(
        api: Arc<dyn VideoApi>,
        history: Arc<dyn HistoryStore>,
        conformer: MediaConformer,
        config: GenerateConfig,
        reporter: Arc<StatusReporter>,
    ) -> Self {
        Self {
            api,
            history,
            conformer,
            config,
            reporter,
        }
    }

    /// Run `request` to completion.
    ///
    /// Bytes for [`OutputTarget::Stream`] go to `stream_sink`; status text
    /// only ever goes to the reporter.
    pub async fn run<W>(
        &self,
        request: &GenerationRequest,
        stream_sink: &mut W,
        cancel: watch::Receiver<bool>,
    ) -> GenerateResult<GenerationOutcome>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut guard = RunGuard {
            cancel,
            deadline: Instant::now() + self.config.job_timeout,
            timeout_secs: self.config.job_timeout.as_secs(),
        };

        let result = self.drive(request, stream_sink, &mut guard).await;
        if let Err(e) = &result {
            tracing::debug!(state = %LifecycleState::Failed, error = %e, "Generation failed");
        }
        result
    }

    async fn drive<W>(
        &self,
        request: &GenerationRequest,
        stream_sink: &mut W,
        guard: &mut RunGuard,
    ) -> GenerateResult<GenerationOutcome>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        // Resolving happens before anything remote.
        let (job_id, remix_source) = match &request.plan {
            JobPlan::Remix { reference } => {
                let source = JobId::from(
                    self.history
                        .resolve(reference)
                        .await
                        .map_err(GenerateError::Resolution)?,
                );
                self.reporter
                    .line(format_args!("Remixing from video: {}", source));
                let job_id = guard.run(self.api.remix(&source, &request.prompt)).await??;
                (job_id, Some(source))
            }
            JobPlan::Create {
                model,
                size,
                seconds,
                input,
            } => {
                let asset = match input {
                    Some(path) => Some(
                        guard
                            .run(self.conformer.conform(path, size.dimensions()))
                            .await??,
                    ),
                    None => None,
                };
                let create = CreateVideoRequest::new(request.prompt.clone())
                    .model(*model)
                    .size(*size)
                    .seconds(*seconds)
                    .input_reference(asset);
                (guard.run(self.api.create(create)).await??, None)
            }
        };

        let logger = JobLogger::new(&job_id, "generate");
        logger.transition(LifecycleState::Resolving, LifecycleState::Submitted);
        self.reporter.line(format_args!("Created job: {}", job_id));
        let started = Instant::now();

        let finished = match self
            .poll_until_done(&job_id, guard, &logger)
            .instrument(logger.span())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(GenerateError::Job(message)) => {
                if self.config.record_failed_jobs {
                    let entry = self
                        .history_entry(request, &job_id, None, remix_source.as_ref(), None)
                        .failed_with(message.clone());
                    self.record(entry, &logger).await;
                }
                return Err(GenerateError::Job(message));
            }
            Err(e) => return Err(e),
        };

        logger.transition(LifecycleState::Polling, LifecycleState::Downloading);
        let target = OutputTarget::for_job(request.output.as_ref(), &job_id);
        let url = self.api.content_url(&job_id);
        let download = guard.run(self.api.download(&url)).await??;
        let bytes_written = guard
            .run(write_download(download, &target, stream_sink, &self.reporter))
            .await??;

        let elapsed = started.elapsed();
        if target.is_file() {
            self.reporter.line(format_args!(
                "Total generation time: {}",
                format_duration(elapsed)
            ));
        }

        let entry = self.history_entry(
            request,
            &job_id,
            Some(&target),
            remix_source.as_ref(),
            finished.model.as_deref(),
        );
        let history_recorded = self.record(entry, &logger).await;
        logger.transition(LifecycleState::Downloading, LifecycleState::Recorded);
        logger.completed(format_args!("{} bytes", bytes_written));

        Ok(GenerationOutcome {
            job_id,
            output: target,
            bytes_written,
            elapsed,
            history_recorded,
        })
    }

    async fn poll_until_done(
        &self,
        job_id: &JobId,
        guard: &mut RunGuard,
        logger: &JobLogger,
    ) -> GenerateResult<JobSnapshot> {
        logger.transition(LifecycleState::Submitted, LifecycleState::Polling);
        self.reporter.generation_progress(0);

        loop {
            guard.sleep(self.config.poll_interval).await?;

            let snapshot = match guard.run(self.api.status(job_id)).await? {
                Ok(snapshot) => snapshot,
                Err(e) if e.is_retryable() => {
                    logger.retry(&e);
                    self.reporter.line(format_args!("\npoll error: {}", e));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            logger.status(&snapshot.status, snapshot.progress);

            if let Some(message) = snapshot.error_message() {
                return Err(GenerateError::job(message));
            }

            if let Some(percent) = snapshot.progress_percent().filter(|p| *p > 0) {
                self.reporter.generation_progress(percent);
            }

            match snapshot.phase() {
                JobPhase::Succeeded => {
                    self.reporter.generation_finished();
                    return Ok(snapshot);
                }
                JobPhase::Failed => {
                    return Err(GenerateError::job(format!(
                        "Job failed (status: {})",
                        snapshot.status
                    )));
                }
                JobPhase::Queued | JobPhase::InProgress | JobPhase::Unknown(_) => {}
            }
        }
    }

    fn history_entry(
        &self,
        request: &GenerationRequest,
        job_id: &JobId,
        target: Option<&OutputTarget>,
        remix_source: Option<&JobId>,
        reported_model: Option<&str>,
    ) -> HistoryEntry {
        let model = reported_model
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| request.model().to_string());
        let input = match &request.plan {
            JobPlan::Create { input, .. } => input.as_ref().map(|p| p.display().to_string()),
            JobPlan::Remix { .. } => None,
        };

        HistoryEntry::new(job_id.as_str(), request.prompt.as_str(), model)
            .output_file(target.map(OutputTarget::history_value).unwrap_or_default())
            .image_input(input)
            .remixed_from(remix_source.map(JobId::to_string))
    }

    /// Append to history; failures only warn.
    async fn record(&self, entry: HistoryEntry, logger: &JobLogger) -> bool {
        match self.history.append(entry).await {
            Ok(()) => true,
            Err(e) => {
                logger.warning(format_args!("failed to save to history: {}", e));
                self.reporter
                    .warn(format_args!("failed to save to history: {}", e));
                false
            }
        }
    }
}
