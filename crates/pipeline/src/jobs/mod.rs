//! Background submission jobs with retry, backoff, and dead-lettering.
//!
//! A job carries a document id and a retry policy; the executor claims
//! ready jobs and runs submission attempts through the worker. Failures
//! the worker marks retryable are rescheduled with backoff; everything
//! else dead-letters immediately for operator inspection.

pub mod executor;
pub mod queue;
pub mod types;

pub use executor::{ExecutorConfig, ExecutorHandle, ExecutorStats, SubmissionExecutor};
pub use queue::{InMemoryJobQueue, JobQueue, QueueError};
pub use types::{AttemptRecord, BackoffStrategy, JobStatus, RetryPolicy, SubmissionJob};
