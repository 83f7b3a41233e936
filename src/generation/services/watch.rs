//! Cancellable watches that follow a job until it settles.
//!
//! A watch polls the job store at a fixed interval with a capped number of
//! attempts. When a [`JobChangeFeed`] is attached, a push notification for
//! the watched job wakes the watch early; polling stays the authority.

use crate::generation::{
    domain::{GenerationJob, JobId, JobStatus},
    ports::{JobChangeFeed, JobRepository},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

const EVENT_BUFFER: usize = 16;

/// Polling cadence and budget for job watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Delay between attempts, in milliseconds.
    pub interval_ms: u64,
    /// Number of reads before the watch reports a timeout.
    pub max_attempts: u32,
}

impl WatchConfig {
    /// Returns the delay between attempts.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            max_attempts: 15,
        }
    }
}

/// A status change observed by a watch.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEvent {
    /// The attempt on which the change was observed, starting at 1.
    pub attempt: u32,
    /// Snapshot of the job carrying the new status.
    pub job: GenerationJob,
}

impl JobEvent {
    /// Returns the status carried by the event.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        self.job.status()
    }
}

/// How a watch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    /// The job completed.
    Completed(GenerationJob),
    /// The job failed.
    Failed(GenerationJob),
    /// The attempt budget ran out while the job was still in flight.
    ///
    /// This is not a failure: the job keeps running upstream.
    TimedOut {
        /// Watched job.
        job_id: JobId,
        /// Reads performed.
        attempts: u32,
        /// Last status observed, if any read succeeded.
        last_status: Option<JobStatus>,
    },
    /// The caller stopped listening.
    Cancelled {
        /// Watched job.
        job_id: JobId,
    },
    /// The job does not exist.
    NotFound(JobId),
}

impl WatchOutcome {
    /// Returns the settled job for terminal outcomes.
    #[must_use]
    pub const fn job(&self) -> Option<&GenerationJob> {
        match self {
            Self::Completed(job) | Self::Failed(job) => Some(job),
            Self::TimedOut { .. } | Self::Cancelled { .. } | Self::NotFound(_) => None,
        }
    }
}

/// Starts watches over a job repository.
pub struct JobWatcher<R>
where
    R: JobRepository + 'static,
{
    repository: Arc<R>,
    feed: Option<Arc<dyn JobChangeFeed>>,
    config: WatchConfig,
}

impl<R> Clone for JobWatcher<R>
where
    R: JobRepository + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            feed: self.feed.clone(),
            config: self.config,
        }
    }
}

impl<R> JobWatcher<R>
where
    R: JobRepository + 'static,
{
    /// Creates a polling-only watcher.
    #[must_use]
    pub const fn new(repository: Arc<R>, config: WatchConfig) -> Self {
        Self {
            repository,
            feed: None,
            config,
        }
    }

    /// Attaches a change feed used to wake watches between polls.
    #[must_use]
    pub fn with_change_feed(mut self, feed: Arc<dyn JobChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Returns the polling configuration.
    #[must_use]
    pub const fn config(&self) -> WatchConfig {
        self.config
    }

    /// Starts watching a job.
    ///
    /// The watch runs on the current Tokio runtime. Each call starts an
    /// independent watch from scratch.
    #[must_use]
    pub fn watch(&self, job_id: JobId) -> JobWatch {
        let (sender, events) = mpsc::channel(EVENT_BUFFER);
        let token = CancellationToken::new();
        let changes = self.feed.as_ref().map(|feed| feed.subscribe());
        let task = WatchTask {
            job_id,
            repository: Arc::clone(&self.repository),
            config: self.config,
            sender,
            token: token.clone(),
            changes,
        };
        let handle = tokio::spawn(task.run());
        JobWatch {
            job_id,
            events,
            guard: token.clone().drop_guard(),
            token,
            handle,
        }
    }
}

/// Handle on a running watch.
///
/// Dropping the handle cancels the watch. Cancelling never writes to the
/// job store.
#[derive(Debug)]
pub struct JobWatch {
    job_id: JobId,
    events: mpsc::Receiver<JobEvent>,
    token: CancellationToken,
    guard: DropGuard,
    handle: JoinHandle<WatchOutcome>,
}

impl JobWatch {
    /// Returns the watched job.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Waits for the next status change.
    ///
    /// Returns `None` once the watch has ended.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Stops the watch.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns a token that cancels this watch when triggered.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Drains remaining events and waits for the watch to end.
    pub async fn outcome(self) -> WatchOutcome {
        let Self {
            job_id,
            mut events,
            guard,
            handle,
            ..
        } = self;
        while events.recv().await.is_some() {}
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(job_id = %job_id, error = %err, "job watch task ended abnormally");
                WatchOutcome::Cancelled { job_id }
            }
        };
        drop(guard.disarm());
        outcome
    }
}

struct WatchTask<R>
where
    R: JobRepository + 'static,
{
    job_id: JobId,
    repository: Arc<R>,
    config: WatchConfig,
    sender: mpsc::Sender<JobEvent>,
    token: CancellationToken,
    changes: Option<broadcast::Receiver<GenerationJob>>,
}

enum Emitted {
    Delivered,
    ReceiverGone,
}

impl<R> WatchTask<R>
where
    R: JobRepository + 'static,
{
    async fn run(mut self) -> WatchOutcome {
        let job_id = self.job_id;
        let mut last_status: Option<JobStatus> = None;
        let mut attempts: u32 = 0;

        loop {
            if self.token.is_cancelled() {
                return WatchOutcome::Cancelled { job_id };
            }
            attempts = attempts.saturating_add(1);

            match self.repository.find_by_id(job_id).await {
                Ok(Some(job)) => {
                    let status = job.status();
                    if last_status.is_none_or(|seen| status.rank() > seen.rank()) {
                        last_status = Some(status);
                        let event = JobEvent {
                            attempt: attempts,
                            job: job.clone(),
                        };
                        if matches!(self.emit(event).await, Emitted::ReceiverGone) {
                            return WatchOutcome::Cancelled { job_id };
                        }
                    }
                    match status {
                        JobStatus::Completed => return WatchOutcome::Completed(job),
                        JobStatus::Failed => return WatchOutcome::Failed(job),
                        JobStatus::Pending | JobStatus::Processing => {}
                    }
                }
                Ok(None) => return WatchOutcome::NotFound(job_id),
                Err(err) => {
                    tracing::warn!(job_id = %job_id, attempt = attempts, error = %err, "job watch read failed");
                }
            }

            if attempts >= self.config.max_attempts {
                tracing::info!(
                    job_id = %job_id,
                    attempts,
                    last_status = ?last_status,
                    "job watch exhausted its attempt budget"
                );
                return WatchOutcome::TimedOut {
                    job_id,
                    attempts,
                    last_status,
                };
            }

            let interval = self.config.interval();
            tokio::select! {
                () = self.token.cancelled() => return WatchOutcome::Cancelled { job_id },
                () = self.sender.closed() => return WatchOutcome::Cancelled { job_id },
                () = tokio::time::sleep(interval) => {}
                () = next_change(self.changes.as_mut(), job_id) => {}
            }
        }
    }

    async fn emit(&self, event: JobEvent) -> Emitted {
        tokio::select! {
            () = self.token.cancelled() => Emitted::ReceiverGone,
            sent = self.sender.send(event) => match sent {
                Ok(()) => Emitted::Delivered,
                Err(_) => Emitted::ReceiverGone,
            },
        }
    }
}

async fn next_change(changes: Option<&mut broadcast::Receiver<GenerationJob>>, job_id: JobId) {
    let Some(receiver) = changes else {
        return std::future::pending().await;
    };
    loop {
        match receiver.recv().await {
            Ok(job) if job.id() == job_id => return,
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => return,
            Err(broadcast::error::RecvError::Closed) => return std::future::pending().await,
        }
    }
}
