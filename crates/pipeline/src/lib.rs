//! `emisor-pipeline` — orchestration of the submission pipeline.
//!
//! Wires builder, signer, transport and interpreter into a single unit of
//! work per document, with the status reconciliation and failure-recovery
//! semantics the document lifecycle demands. Storage and credential access
//! are trait seams; the in-memory implementations back tests and the smoke
//! binary.

pub mod inflight;
pub mod jobs;
pub mod stores;
pub mod worker;

pub use inflight::{InFlight, InFlightGuard};
pub use jobs::{
    ExecutorConfig, ExecutorHandle, InMemoryJobQueue, JobQueue, JobStatus, RetryPolicy,
    SubmissionExecutor, SubmissionJob,
};
pub use stores::{
    CredentialProvider, DocumentStore, InMemoryCredentialProvider, InMemoryDocumentStore,
    StoreError,
};
pub use worker::{SubmissionError, SubmissionWorker};
