//! The submission unit of work.
//!
//! One invocation = one submission attempt for one document:
//! build → sign (only if no signed artifact exists) → mark `Sent` →
//! transport → interpret → reconcile + persist outcome.
//!
//! Failure semantics: anything that goes wrong before the `Sent` transition
//! (validation, credential or signing problems) propagates without touching
//! status or the outcome table — the document never left `Pending` and
//! there is nothing to audit. Anything after `Sent` reverts the document to
//! `Pending`, records an `Error` outcome, and re-raises so the external
//! retry policy decides whether the unit runs again.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use emisor_core::{DocumentId, DomainError};
use emisor_documents::status;
use emisor_documents::{SubmissionOutcome, SunatResponse, TaxDocument};
use emisor_signer::{CertificateMaterial, SignError};
use emisor_transport::client::SubmissionRequest;
use emisor_transport::{envelope, interpret, BillService, EndpointFamily, TransportError};
use emisor_ubl::BuildError;

use crate::inflight::InFlight;
use crate::stores::{CredentialProvider, DocumentStore, StoreError};

/// Submission attempt failure.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Another attempt holds the in-flight claim. Fail fast, never retry.
    #[error("document {0} already has a submission in flight")]
    AlreadyInFlight(DocumentId),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    State(#[from] DomainError),
}

impl SubmissionError {
    /// Only transport failures warrant another attempt; everything else
    /// needs upstream or operator correction first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmissionError::Transport(_))
    }
}

/// Executes submission attempts against the trait seams.
pub struct SubmissionWorker<S, C, B> {
    store: Arc<S>,
    credentials: Arc<C>,
    service: Arc<B>,
    in_flight: Arc<InFlight>,
}

impl<S, C, B> SubmissionWorker<S, C, B>
where
    S: DocumentStore,
    C: CredentialProvider,
    B: BillService,
{
    pub fn new(store: Arc<S>, credentials: Arc<C>, service: Arc<B>) -> Self {
        Self {
            store,
            credentials,
            service,
            in_flight: InFlight::arc(),
        }
    }

    /// Run one submission attempt.
    ///
    /// Returns `Ok(None)` when the document is already in a terminal state
    /// (the attempt is a no-op), `Ok(Some(outcome))` for a completed
    /// exchange — including unfavorable verdicts, which are still completed
    /// attempts — and `Err` for failures the external retry policy owns.
    pub fn submit_document(
        &self,
        id: DocumentId,
    ) -> Result<Option<SubmissionOutcome>, SubmissionError> {
        let _guard = self
            .in_flight
            .try_acquire(id)
            .ok_or(SubmissionError::AlreadyInFlight(id))?;

        let document = self.store.get(id)?;
        if document.status.is_final() {
            debug!(document_id = %id, status = ?document.status, "document already resolved, nothing to submit");
            return Ok(None);
        }

        let signed_xml = match document.signed_xml.clone() {
            // A signed artifact is never replaced; retries reuse it.
            Some(existing) => existing,
            None => {
                let raw = emisor_ubl::build(&document)?;
                let certificate = self.credentials.certificate(document.organization_id)?;
                let material = CertificateMaterial::load(&certificate)?;
                let signed = emisor_signer::sign(&raw, &material, Utc::now())?;
                self.store
                    .set_artifacts(id, raw, signed.xml.clone(), signed.digest)?;
                signed.xml
            }
        };

        // Visible `Sent` before the wire call: a crash mid-flight must not
        // leave the document silently stuck in `Pending`.
        let sent = status::on_job_start(document.status)?;
        self.store.update_status(id, sent)?;

        match self.exchange(&document, &signed_xml) {
            Ok(outcome) => {
                let next = status::apply_outcome(sent, outcome.code)?;
                self.store
                    .record_outcome(id, next, SunatResponse::from_outcome(id, &outcome))?;
                info!(
                    document_id = %id,
                    number = %document.full_number(),
                    code = ?outcome.code,
                    "submission attempt completed"
                );
                Ok(Some(outcome))
            }
            Err(error) => {
                let reverted = status::revert_after_failure(sent);
                self.store
                    .record_outcome(id, reverted, SunatResponse::error(id, error.to_string()))?;
                warn!(
                    document_id = %id,
                    number = %document.full_number(),
                    error = %error,
                    "submission attempt failed, document reverted to pending"
                );
                Err(error)
            }
        }
    }

    /// External cancellation request. Legal only for documents without a
    /// running attempt and outside `Rejected`/`Canceled`.
    pub fn cancel_document(&self, id: DocumentId) -> Result<(), SubmissionError> {
        let _guard = self
            .in_flight
            .try_acquire(id)
            .ok_or(SubmissionError::AlreadyInFlight(id))?;

        let document = self.store.get(id)?;
        let canceled = status::cancel(document.status)?;
        self.store.update_status(id, canceled)?;
        info!(document_id = %id, "document canceled");
        Ok(())
    }

    fn exchange(
        &self,
        document: &TaxDocument,
        signed_xml: &str,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let credentials = self
            .credentials
            .portal_credentials(document.organization_id)?;
        let zip = envelope::package(&document.file_stem(), signed_xml)?;
        let family = if document.doc_type.is_retention_family() {
            EndpointFamily::Retention
        } else {
            EndpointFamily::Billing
        };

        let raw = self.service.send_bill(&SubmissionRequest {
            file_stem: document.file_stem(),
            zip,
            credentials,
            family,
        })?;
        Ok(interpret(&raw))
    }
}
