//! Submission executor: claims ready jobs and runs attempts through the
//! worker, with retry and dead-letter handling.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use emisor_core::DocumentId;
use emisor_documents::SubmissionOutcome;

use super::queue::{JobQueue, QueueError};
use super::types::{JobStatus, RetryPolicy, SubmissionJob};
use crate::stores::{CredentialProvider, DocumentStore};
use crate::worker::{SubmissionError, SubmissionWorker};
use emisor_transport::BillService;

/// The unit of work the executor runs per claimed job.
pub type SubmissionHandler =
    Box<dyn Fn(DocumentId) -> Result<Option<SubmissionOutcome>, SubmissionError> + Send + Sync>;

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// How often to poll for ready jobs
    pub poll_interval: Duration,
    /// Name for logging
    pub name: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            name: "submission-executor".to_string(),
        }
    }
}

impl ExecutorConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Handle to control a running executor.
#[derive(Debug)]
pub struct ExecutorHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<ExecutorStats>>,
}

impl ExecutorHandle {
    /// Request graceful shutdown and wait for the loop to drain.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    /// Get current executor statistics.
    pub fn stats(&self) -> ExecutorStats {
        self.stats.lock().unwrap().clone()
    }
}

/// Executor runtime statistics.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ExecutorStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_dead_lettered: u64,
    pub uptime_secs: u64,
}

/// Background submission executor.
///
/// Polls the job queue for ready jobs and runs each through the handler,
/// one at a time. Serial execution is deliberate: the authority throttles
/// aggressively, and one slow exchange must not starve the backoff clock
/// of jobs scheduled behind it by more than its own duration.
pub struct SubmissionExecutor<Q: JobQueue> {
    queue: Q,
    handler: SubmissionHandler,
    default_policy: RetryPolicy,
}

impl<Q: JobQueue + 'static> SubmissionExecutor<Q> {
    pub fn new<F>(queue: Q, handler: F) -> Self
    where
        F: Fn(DocumentId) -> Result<Option<SubmissionOutcome>, SubmissionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            queue,
            handler: Box::new(handler),
            default_policy: RetryPolicy::default(),
        }
    }

    /// Build an executor whose handler is a submission worker.
    pub fn for_worker<S, C, B>(queue: Q, worker: Arc<SubmissionWorker<S, C, B>>) -> Self
    where
        S: DocumentStore + 'static,
        C: CredentialProvider + 'static,
        B: BillService + 'static,
    {
        Self::new(queue, move |document_id| worker.submit_document(document_id))
    }

    /// Override the policy applied by [`submit`](Self::submit).
    pub fn with_default_policy(mut self, policy: RetryPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    /// Enqueue a submission job for a document.
    pub fn submit(&self, document_id: DocumentId) -> Result<emisor_core::JobId, QueueError> {
        self.queue.enqueue(
            SubmissionJob::new(document_id).with_retry_policy(self.default_policy.clone()),
        )
    }

    /// Execute a single claimed job (for testing or synchronous use).
    pub fn execute_one(&self, job: &mut SubmissionJob) -> Result<(), String> {
        let started = Utc::now();

        match (self.handler)(job.document_id) {
            Ok(outcome) => {
                debug!(job_id = %job.id, document_id = %job.document_id, resolved = outcome.is_some(), "submission job completed");
                job.mark_completed(started);
                self.queue.update(job).map_err(|e| e.to_string())?;
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();
                job.mark_failed(message.clone(), started, error.is_retryable());
                self.queue.update(job).map_err(|e| e.to_string())?;

                if matches!(job.status, JobStatus::DeadLettered { .. }) {
                    warn!(job_id = %job.id, document_id = %job.document_id, error = %message, "submission job dead-lettered");
                }

                Err(message)
            }
        }
    }

    /// Spawn the executor in a background thread.
    pub fn spawn(self, config: ExecutorConfig) -> ExecutorHandle
    where
        Q: Send,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(ExecutorStats::default()));
        let stats_clone = stats.clone();

        let name = config.name.clone();
        let join = thread::Builder::new()
            .name(name)
            .spawn(move || {
                executor_loop(self, config, shutdown_rx, stats_clone);
            })
            .expect("failed to spawn submission executor thread");

        ExecutorHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        }
    }
}

fn executor_loop<Q: JobQueue + 'static>(
    executor: SubmissionExecutor<Q>,
    config: ExecutorConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<ExecutorStats>>,
) {
    info!(executor = %config.name, "submission executor started");
    let start_time = Instant::now();

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        {
            let mut s = stats.lock().unwrap();
            s.uptime_secs = start_time.elapsed().as_secs();
        }

        match executor.queue.claim_next() {
            Ok(Some(mut job)) => {
                debug!(
                    executor = %config.name,
                    job_id = %job.id,
                    document_id = %job.document_id,
                    attempt = job.attempt,
                    "claimed submission job"
                );

                let result = executor.execute_one(&mut job);

                let mut s = stats.lock().unwrap();
                s.jobs_processed += 1;
                match result {
                    Ok(()) => s.jobs_succeeded += 1,
                    Err(_) => {
                        s.jobs_failed += 1;
                        if matches!(job.status, JobStatus::DeadLettered { .. }) {
                            s.jobs_dead_lettered += 1;
                        }
                    }
                }
            }
            Ok(None) => {
                thread::sleep(config.poll_interval);
            }
            Err(e) => {
                error!(executor = %config.name, error = ?e, "failed to claim submission job");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(executor = %config.name, "submission executor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use emisor_documents::{AuthorityCode, SubmissionOutcome};
    use emisor_transport::TransportError;
    use emisor_ubl::BuildError;

    use crate::jobs::queue::InMemoryJobQueue;

    fn accepted_outcome() -> SubmissionOutcome {
        SubmissionOutcome::new(AuthorityCode::Accepted, "aceptada")
    }

    #[test]
    fn successful_job_completes() {
        let queue = InMemoryJobQueue::arc();
        let executor =
            SubmissionExecutor::new(queue.clone(), |_id| Ok(Some(accepted_outcome())));

        let job_id = executor.submit(DocumentId::new()).unwrap();
        let mut claimed = queue.claim_next().unwrap().unwrap();
        executor.execute_one(&mut claimed).unwrap();

        let job = queue.get(job_id).unwrap().unwrap();
        assert!(matches!(job.status, JobStatus::Completed));
        assert_eq!(job.history.len(), 1);
    }

    #[test]
    fn transport_failure_retries_then_dead_letters() {
        let queue = InMemoryJobQueue::arc();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_handler = calls.clone();

        let executor = SubmissionExecutor::new(queue.clone(), move |_id| {
            calls_in_handler.fetch_add(1, Ordering::SeqCst);
            Err(SubmissionError::Transport(TransportError::Connect(
                "refused".to_string(),
            )))
        })
        .with_default_policy(RetryPolicy {
            max_attempts: 2,
            ..Default::default()
        });

        let job_id = executor.submit(DocumentId::new()).unwrap();

        let mut claimed = queue.claim_next().unwrap().unwrap();
        executor.execute_one(&mut claimed).unwrap_err();
        assert!(matches!(
            queue.get(job_id).unwrap().unwrap().status,
            JobStatus::Failed { attempt: 1, .. }
        ));

        // Skip the backoff window for the test.
        let mut job = queue.get(job_id).unwrap().unwrap();
        job.scheduled_at = None;
        queue.update(&job).unwrap();

        let mut claimed = queue.claim_next().unwrap().unwrap();
        executor.execute_one(&mut claimed).unwrap_err();
        assert!(matches!(
            queue.get(job_id).unwrap().unwrap().status,
            JobStatus::DeadLettered { attempts: 2, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn validation_failure_dead_letters_without_retry() {
        let queue = InMemoryJobQueue::arc();
        let executor = SubmissionExecutor::new(queue.clone(), |_id| {
            Err(SubmissionError::Build(BuildError::Validation(
                "grand total does not match".to_string(),
            )))
        });

        let job_id = executor.submit(DocumentId::new()).unwrap();
        let mut claimed = queue.claim_next().unwrap().unwrap();
        executor.execute_one(&mut claimed).unwrap_err();

        assert!(matches!(
            queue.get(job_id).unwrap().unwrap().status,
            JobStatus::DeadLettered { attempts: 1, .. }
        ));
        assert!(queue.claim_next().unwrap().is_none());
    }

    #[test]
    fn spawned_executor_drains_the_queue() {
        let queue = InMemoryJobQueue::arc();
        let executor =
            SubmissionExecutor::new(queue.clone(), |_id| Ok(Some(accepted_outcome())));

        let job_id = executor.submit(DocumentId::new()).unwrap();
        let handle = executor.spawn(
            ExecutorConfig::default().with_poll_interval(Duration::from_millis(10)),
        );

        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let done = matches!(
                queue.get(job_id).unwrap().unwrap().status,
                JobStatus::Completed
            );
            if done || Instant::now() > deadline {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }

        handle.shutdown();
        assert!(matches!(
            queue.get(job_id).unwrap().unwrap().status,
            JobStatus::Completed
        ));
    }
}
