//! Bounded-concurrency upload pool.
//!
//! At most `concurrency` tasks are in flight; a settled task immediately lets the
//! next pending one start, in selection order. Each task retries against its own
//! destination through [`with_retry`]. Settlement (counter update and listener
//! notification) happens in a single completion loop.

use futures::stream::{self, StreamExt};
use showroom_core::models::{
    ProgressCounters, TaskState, UploadDestination, UploadTask, UploadedPhoto,
};
use showroom_core::{AppError, UploadConfig};
use showroom_infra::{with_retry, RetryError, RetryPolicy};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::progress::{ProgressListener, ProgressTracker};
use crate::traits::PhotoTransport;

/// Result of one orchestrator run
#[derive(Debug, Clone)]
pub struct OrchestratorOutcome {
    pub counters: ProgressCounters,
    /// Every task in selection order, with its final state
    pub tasks: Vec<UploadTask>,
    /// True when the run was aborted before all tasks settled
    pub cancelled: bool,
}

impl OrchestratorOutcome {
    /// One entry per successful upload, in original selection order
    pub fn uploaded_photos(&self) -> Vec<UploadedPhoto> {
        self.tasks.iter().filter_map(UploadedPhoto::from_task).collect()
    }
}

enum TaskResult {
    Settled(UploadTask),
    Abandoned,
}

#[derive(Debug, Clone)]
pub struct UploadOrchestrator {
    concurrency: usize,
    policy: RetryPolicy,
}

impl UploadOrchestrator {
    pub fn new(concurrency: usize, policy: RetryPolicy) -> Self {
        Self {
            concurrency: concurrency.max(1),
            policy,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.concurrency,
            RetryPolicy {
                max_retries: config.retries,
                base_delay: config.retry_base(),
                max_jitter: config.retry_jitter(),
                attempt_timeout: Some(config.attempt_timeout()),
                ..RetryPolicy::default()
            },
        )
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Drive every task to a terminal state, or until `cancel` fires.
    ///
    /// Per-file errors never escape: they are folded into the counters and the
    /// task's `last_error`. On cancellation, in-flight attempts are dropped,
    /// pending tasks never start, and unsettled tasks are returned as `Pending`.
    pub async fn run(
        &self,
        transport: &dyn PhotoTransport,
        tasks: Vec<UploadTask>,
        listener: &dyn ProgressListener,
        cancel: &CancellationToken,
    ) -> OrchestratorOutcome {
        let tracker = ProgressTracker::new(tasks.len());
        let mut outcome_tasks = tasks.clone();
        let mut cancelled = false;

        tracing::info!(
            total = tasks.len(),
            concurrency = self.concurrency,
            max_retries = self.policy.max_retries,
            "Starting photo uploads"
        );

        {
            let tracker = &tracker;
            let mut results = stream::iter(tasks)
                .map(|task| {
                    let span = tracing::info_span!(
                        "upload_task",
                        index = task.index,
                        name = %task.file.name,
                        presigned = task.destination.is_presigned()
                    );
                    self.run_task(transport, tracker, task, cancel)
                        .instrument(span)
                })
                .buffer_unordered(self.concurrency);

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    next = results.next() => next,
                };

                match next {
                    Some(TaskResult::Settled(task)) => {
                        let snapshot = tracker.settled(task.state == TaskState::Succeeded);
                        listener.on_upload_progress(&snapshot);
                        // Selection order is preserved regardless of completion order
                        let position = outcome_tasks
                            .iter()
                            .position(|t| t.index == task.index);
                        if let Some(position) = position {
                            outcome_tasks[position] = task;
                        }
                    }
                    Some(TaskResult::Abandoned) => {
                        cancelled = true;
                    }
                    None => break,
                }
            }
        }

        let counters = if cancelled {
            for task in outcome_tasks.iter_mut().filter(|t| !t.state.is_terminal()) {
                task.state = TaskState::Pending;
            }
            let counters = tracker.abandon_in_flight();
            tracing::warn!(
                completed = counters.completed,
                total = counters.total,
                "Photo uploads cancelled"
            );
            counters
        } else {
            tracker.snapshot()
        };

        tracing::info!(
            total = counters.total,
            success = counters.success,
            failed = counters.failed,
            "Photo uploads settled"
        );

        OrchestratorOutcome {
            counters,
            tasks: outcome_tasks,
            cancelled,
        }
    }

    async fn run_task(
        &self,
        transport: &dyn PhotoTransport,
        tracker: &ProgressTracker,
        mut task: UploadTask,
        cancel: &CancellationToken,
    ) -> TaskResult {
        if cancel.is_cancelled() {
            return TaskResult::Abandoned;
        }

        tracker.started();
        task.state = TaskState::InFlight;

        let result = with_retry(&self.policy, cancel, |_| upload_once(transport, &task)).await;

        match result {
            Ok(retried) => {
                task.attempt = retried.attempts;
                task.state = TaskState::Succeeded;
                task.public_url = retried.value;
                task.last_error = None;
                tracing::debug!(attempts = retried.attempts, "Photo uploaded");
                TaskResult::Settled(task)
            }
            Err(RetryError::Exhausted { attempts, last }) => {
                task.attempt = attempts;
                task.state = TaskState::Failed;
                task.last_error = Some(last.to_string());
                tracing::error!(attempts, error = %last, "Photo upload failed permanently");
                TaskResult::Settled(task)
            }
            Err(RetryError::Cancelled { .. }) => TaskResult::Abandoned,
        }
    }
}

/// One attempt against the task's fixed destination
async fn upload_once(
    transport: &dyn PhotoTransport,
    task: &UploadTask,
) -> Result<Option<String>, AppError> {
    match &task.destination {
        UploadDestination::Presigned(destination) => {
            transport.put_presigned(destination, &task.file).await?;
            Ok(Some(destination.public_url.clone()))
        }
        UploadDestination::Fallback { record_id } => {
            transport.post_fallback(record_id, &task.file).await
        }
    }
}
