//! Long-running video operation poller.
//!
//! A job moves `Submitted -> Polling(n) -> Done | Failed`, or ends early as
//! `TimedOut` / `Cancelled`. Every suspension point (submit, wait, poll,
//! fetch) races against the caller's [`CancellationToken`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::LabConfig;
use crate::errors::{LabError, LabResult};
use crate::media::{MediaHandle, MediaRegistry};
use crate::types::Operation;

/// Progress reported right after the job is accepted.
pub const SUBMITTED_PROGRESS: u8 = 5;
/// Ceiling while the job is still running.
pub const POLLING_CEILING: u8 = 95;
pub const DONE_PROGRESS: u8 = 100;

const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Remote side of a video job.
#[async_trait]
pub trait VideoService: Send + Sync {
    /// Creates the job. The returned operation is normally not done yet.
    async fn start_generation(&self, prompt: &str) -> LabResult<Operation>;

    /// Fetches the next state of `operation`. The returned handle replaces
    /// the previous one.
    async fn get_operation(&self, operation: &Operation) -> LabResult<Operation>;

    /// Downloads the media behind `uri`, adding authentication.
    async fn fetch_media(&self, uri: &str) -> LabResult<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Polling { polls: u32 },
    Done,
    Failed,
    TimedOut,
    Cancelled,
}

/// Timing knobs for a [`VideoPoller`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub poll_interval: Duration,
    /// Heuristic poll count used for the progress estimate, not a limit.
    pub expected_polls: u32,
    pub max_polls: Option<u32>,
    pub max_wait: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            expected_polls: 15,
            max_polls: None,
            max_wait: None,
        }
    }
}

impl From<&LabConfig> for PollerConfig {
    fn from(config: &LabConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            expected_polls: config.expected_polls.unwrap_or(15),
            max_polls: config.max_polls,
            max_wait: config.max_wait(),
        }
    }
}

impl PollerConfig {
    /// Rejects settings that would poll back to back or give up before
    /// the first status check.
    pub fn validate(&self) -> LabResult<()> {
        if self.poll_interval.is_zero() {
            return Err(LabError::Validation(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        if self.max_polls == Some(0) {
            return Err(LabError::Validation(
                "max_polls must be at least 1".to_string(),
            ));
        }
        if self.max_wait.is_some_and(|max| max.is_zero()) {
            return Err(LabError::Validation(
                "max_wait must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// `5 + min(round(polls / expected * 90), 90)`
pub fn estimate_progress(polls: u32, expected_polls: u32) -> u8 {
    let expected = expected_polls.max(1) as f64;
    let span = (POLLING_CEILING - SUBMITTED_PROGRESS) as f64;
    let step = (polls as f64 / expected * span).round().min(span);
    SUBMITTED_PROGRESS + step as u8
}

/// Forwards progress to the caller, never letting it go backwards.
struct ProgressReporter<F> {
    last: u8,
    sink: F,
}

impl<F: FnMut(u8)> ProgressReporter<F> {
    fn new(sink: F) -> Self {
        Self { last: 0, sink }
    }

    fn report(&mut self, percent: u8) {
        let percent = percent.min(DONE_PROGRESS).max(self.last);
        self.last = percent;
        (self.sink)(percent);
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = LabResult<T>>,
) -> LabResult<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LabError::Cancelled),
        result = fut => result,
    }
}

/// Like [`cancellable`], but gives up at `deadline` with `Ok(None)`.
async fn cancellable_until<T>(
    cancel: &CancellationToken,
    deadline: Option<Instant>,
    fut: impl Future<Output = LabResult<T>>,
) -> LabResult<Option<T>> {
    let expired = async {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LabError::Cancelled),
        _ = expired => Ok(None),
        result = fut => result.map(Some),
    }
}

/// Drives one video job from submission to a playable local blob.
pub struct VideoPoller<S> {
    service: S,
    registry: MediaRegistry,
    config: PollerConfig,
}

impl<S: VideoService> VideoPoller<S> {
    pub fn new(service: S, registry: MediaRegistry, config: PollerConfig) -> Self {
        Self {
            service,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &MediaRegistry {
        &self.registry
    }

    /// Runs the job. `on_progress` receives a non-decreasing percentage:
    /// 5 after submission, at most 95 while polling, 100 once done.
    pub async fn generate_video<F>(
        &self,
        prompt: &str,
        on_progress: F,
        cancel: &CancellationToken,
    ) -> LabResult<MediaHandle>
    where
        F: FnMut(u8) + Send,
    {
        let result = self.run(prompt, on_progress, cancel).await;
        let state = match &result {
            Ok(_) => JobState::Done,
            Err(LabError::Cancelled) => JobState::Cancelled,
            Err(LabError::Timeout { .. }) => JobState::TimedOut,
            Err(_) => JobState::Failed,
        };
        match &result {
            Ok(handle) => info!(?state, url = %handle, "Video job finished"),
            Err(e) => warn!(?state, error = %e, "Video job did not produce media"),
        }
        result
    }

    async fn run<F>(
        &self,
        prompt: &str,
        on_progress: F,
        cancel: &CancellationToken,
    ) -> LabResult<MediaHandle>
    where
        F: FnMut(u8) + Send,
    {
        self.config.validate()?;
        let mut progress = ProgressReporter::new(on_progress);

        let mut operation = cancellable(cancel, self.service.start_generation(prompt)).await?;
        info!(state = ?JobState::Submitted, operation = %operation.name, "Video job submitted");
        progress.report(SUBMITTED_PROGRESS);

        let started = Instant::now();
        let deadline = self.config.max_wait.map(|max| started + max);
        let timed_out = |polls: u32| LabError::Timeout {
            polls,
            elapsed: started.elapsed(),
        };
        let mut polls: u32 = 0;

        while !operation.done {
            let wait = async {
                tokio::time::sleep(self.config.poll_interval).await;
                Ok(())
            };
            if cancellable_until(cancel, deadline, wait).await?.is_none() {
                return Err(timed_out(polls));
            }

            // A stalled status request is bounded by the same deadline
            operation = cancellable_until(cancel, deadline, self.service.get_operation(&operation))
                .await?
                .ok_or_else(|| timed_out(polls))?;
            polls += 1;
            debug!(state = ?JobState::Polling { polls }, operation = %operation.name, done = operation.done, "Polled video job");
            progress.report(estimate_progress(polls, self.config.expected_polls));

            if operation.done {
                break;
            }
            let too_many = self.config.max_polls.is_some_and(|max| polls >= max);
            let too_long = deadline.is_some_and(|deadline| Instant::now() >= deadline);
            if too_many || too_long {
                return Err(timed_out(polls));
            }
        }

        progress.report(DONE_PROGRESS);

        if let Some(error) = &operation.error {
            return Err(LabError::Service(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }

        let uri = operation.media_uri().ok_or(LabError::EmptyResult)?;
        let bytes = cancellable(cancel, self.service.fetch_media(uri)).await?;

        self.registry.register(bytes, VIDEO_MIME_TYPE)
    }
}
