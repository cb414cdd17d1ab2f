//! Job queue implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use emisor_core::{DocumentId, JobId};

use super::types::{JobStatus, SubmissionJob};

/// Queue abstraction for submission jobs.
pub trait JobQueue: Send + Sync {
    /// Enqueue a new job.
    fn enqueue(&self, job: SubmissionJob) -> Result<JobId, QueueError>;

    /// Get a job by ID.
    fn get(&self, job_id: JobId) -> Result<Option<SubmissionJob>, QueueError>;

    /// Update a job.
    fn update(&self, job: &SubmissionJob) -> Result<(), QueueError>;

    /// Claim the next ready job (oldest first) and mark it running.
    /// Returns None if nothing is ready.
    fn claim_next(&self) -> Result<Option<SubmissionJob>, QueueError>;

    /// Cancel a job that has not started yet.
    fn cancel(&self, job_id: JobId) -> Result<(), QueueError>;

    /// List dead-lettered jobs for inspection.
    fn dead_letters(&self, limit: usize) -> Result<Vec<SubmissionJob>, QueueError>;
}

/// Queue failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error("document {document_id} already has a pending or running job")]
    DuplicateDocument { document_id: DocumentId },
    #[error("job {0} cannot be cancelled in its current state")]
    NotCancellable(JobId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// In-memory job queue for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    jobs: RwLock<HashMap<JobId, SubmissionJob>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl JobQueue for InMemoryJobQueue {
    fn enqueue(&self, job: SubmissionJob) -> Result<JobId, QueueError> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(QueueError::AlreadyExists(job.id));
        }
        // One live job per document; a second enqueue for the same document
        // would race it for the in-flight claim and always lose.
        let duplicate = jobs.values().any(|j| {
            j.document_id == job.document_id && !j.status.is_terminal()
        });
        if duplicate {
            return Err(QueueError::DuplicateDocument {
                document_id: job.document_id,
            });
        }
        let id = job.id;
        jobs.insert(id, job);
        Ok(id)
    }

    fn get(&self, job_id: JobId) -> Result<Option<SubmissionJob>, QueueError> {
        Ok(self.jobs.read().unwrap().get(&job_id).cloned())
    }

    fn update(&self, job: &SubmissionJob) -> Result<(), QueueError> {
        let mut jobs = self.jobs.write().unwrap();
        if !jobs.contains_key(&job.id) {
            return Err(QueueError::NotFound(job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    fn claim_next(&self) -> Result<Option<SubmissionJob>, QueueError> {
        let mut jobs = self.jobs.write().unwrap();

        let mut candidates: Vec<_> = jobs
            .values()
            .filter(|j| {
                matches!(j.status, JobStatus::Pending | JobStatus::Failed { .. }) && j.is_ready()
            })
            .collect();

        // FIFO by creation time
        candidates.sort_by_key(|j| j.created_at);

        if let Some(job) = candidates.first() {
            let job_id = job.id;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.mark_running();
                return Ok(Some(job.clone()));
            }
        }

        Ok(None)
    }

    fn cancel(&self, job_id: JobId) -> Result<(), QueueError> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(QueueError::NotFound(job_id))?;
        if !matches!(job.status, JobStatus::Pending) {
            return Err(QueueError::NotCancellable(job_id));
        }
        job.mark_cancelled();
        Ok(())
    }

    fn dead_letters(&self, limit: usize) -> Result<Vec<SubmissionJob>, QueueError> {
        let jobs = self.jobs.read().unwrap();
        let mut result: Vec<_> = jobs
            .values()
            .filter(|j| matches!(j.status, JobStatus::DeadLettered { .. }))
            .cloned()
            .collect();
        result.sort_by_key(|j| j.updated_at);
        result.truncate(limit);
        Ok(result)
    }
}

impl JobQueue for Arc<InMemoryJobQueue> {
    fn enqueue(&self, job: SubmissionJob) -> Result<JobId, QueueError> {
        (**self).enqueue(job)
    }

    fn get(&self, job_id: JobId) -> Result<Option<SubmissionJob>, QueueError> {
        (**self).get(job_id)
    }

    fn update(&self, job: &SubmissionJob) -> Result<(), QueueError> {
        (**self).update(job)
    }

    fn claim_next(&self) -> Result<Option<SubmissionJob>, QueueError> {
        (**self).claim_next()
    }

    fn cancel(&self, job_id: JobId) -> Result<(), QueueError> {
        (**self).cancel(job_id)
    }

    fn dead_letters(&self, limit: usize) -> Result<Vec<SubmissionJob>, QueueError> {
        (**self).dead_letters(limit)
    }
}
