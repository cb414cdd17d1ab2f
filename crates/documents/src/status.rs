//! Document lifecycle status and the reconciliation state machine.
//!
//! All status mutation performed by the submission pipeline goes through the
//! transition functions here, so the "normal" and "failure" code paths cannot
//! diverge. The table:
//!
//! | current  | event                   | next     |
//! |----------|-------------------------|----------|
//! | Pending  | job starts              | Sent     |
//! | Sent     | outcome Accepted        | Accepted |
//! | Sent     | outcome Rejected        | Rejected |
//! | Sent     | outcome Pending         | Sent     |
//! | Sent     | outcome Error / failure | Pending  |
//!
//! Cancellation is an external operation and is only legal from `Pending`,
//! `Sent` or `Accepted`.

use serde::{Deserialize, Serialize};

use emisor_core::{DomainError, DomainResult};

use crate::outcome::AuthorityCode;

/// Lifecycle status of a tax document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Initial state, and the landing state after a failed attempt.
    Pending,
    /// Marked before the transport call; a mid-flight crash leaves the
    /// document visibly `Sent` instead of silently stuck `Pending`.
    Sent,
    Accepted,
    Rejected,
    Canceled,
}

impl DocumentStatus {
    /// Terminal states: the submission job treats these as a no-op.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            DocumentStatus::Accepted | DocumentStatus::Rejected | DocumentStatus::Canceled
        )
    }
}

/// Transition taken when a submission attempt begins.
///
/// `Sent` is allowed as a starting point: a document whose last outcome was
/// an authority `Pending` verdict stays `Sent` and remains eligible for
/// re-submission.
pub fn on_job_start(current: DocumentStatus) -> DomainResult<DocumentStatus> {
    match current {
        DocumentStatus::Pending | DocumentStatus::Sent => Ok(DocumentStatus::Sent),
        other => Err(DomainError::conflict(format!(
            "cannot start submission from {other:?}"
        ))),
    }
}

/// Transition taken when an authority outcome is applied to a `Sent` document.
///
/// `Accepted`/`Rejected` are only reachable through `Sent`. An `Error`
/// outcome lands the document back on `Pending` so the external retry policy
/// can pick it up again.
pub fn apply_outcome(
    current: DocumentStatus,
    code: AuthorityCode,
) -> DomainResult<DocumentStatus> {
    match (current, code) {
        (DocumentStatus::Sent, AuthorityCode::Accepted) => Ok(DocumentStatus::Accepted),
        (DocumentStatus::Sent, AuthorityCode::Rejected) => Ok(DocumentStatus::Rejected),
        (DocumentStatus::Sent, AuthorityCode::Pending) => Ok(DocumentStatus::Sent),
        (DocumentStatus::Sent, AuthorityCode::Error) => Ok(DocumentStatus::Pending),
        (current, code) => Err(DomainError::conflict(format!(
            "outcome {code:?} is not applicable to status {current:?}"
        ))),
    }
}

/// Landing state after an uncaught failure inside the submission job.
pub fn revert_after_failure(_current: DocumentStatus) -> DocumentStatus {
    DocumentStatus::Pending
}

/// External cancellation. Rejected documents cannot be canceled.
pub fn cancel(current: DocumentStatus) -> DomainResult<DocumentStatus> {
    match current {
        DocumentStatus::Pending | DocumentStatus::Sent | DocumentStatus::Accepted => {
            Ok(DocumentStatus::Canceled)
        }
        other => Err(DomainError::conflict(format!("cannot cancel {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_start_moves_pending_to_sent() {
        assert_eq!(
            on_job_start(DocumentStatus::Pending).unwrap(),
            DocumentStatus::Sent
        );
    }

    #[test]
    fn job_start_keeps_sent_eligible() {
        assert_eq!(
            on_job_start(DocumentStatus::Sent).unwrap(),
            DocumentStatus::Sent
        );
    }

    #[test]
    fn job_start_rejects_final_states() {
        for status in [
            DocumentStatus::Accepted,
            DocumentStatus::Rejected,
            DocumentStatus::Canceled,
        ] {
            let err = on_job_start(status).unwrap_err();
            assert!(matches!(err, DomainError::Conflict(_)));
        }
    }

    #[test]
    fn transition_table_from_sent_matches_exactly() {
        let cases = [
            (AuthorityCode::Accepted, DocumentStatus::Accepted),
            (AuthorityCode::Rejected, DocumentStatus::Rejected),
            (AuthorityCode::Pending, DocumentStatus::Sent),
            (AuthorityCode::Error, DocumentStatus::Pending),
        ];
        for (code, expected) in cases {
            assert_eq!(apply_outcome(DocumentStatus::Sent, code).unwrap(), expected);
        }
    }

    #[test]
    fn accepted_and_rejected_only_reachable_via_sent() {
        for current in [
            DocumentStatus::Pending,
            DocumentStatus::Accepted,
            DocumentStatus::Rejected,
            DocumentStatus::Canceled,
        ] {
            for code in [
                AuthorityCode::Accepted,
                AuthorityCode::Rejected,
                AuthorityCode::Pending,
                AuthorityCode::Error,
            ] {
                assert!(apply_outcome(current, code).is_err());
            }
        }
    }

    #[test]
    fn failure_always_reverts_to_pending() {
        assert_eq!(
            revert_after_failure(DocumentStatus::Sent),
            DocumentStatus::Pending
        );
    }

    #[test]
    fn cancel_is_legal_from_pending_sent_accepted_only() {
        assert!(cancel(DocumentStatus::Pending).is_ok());
        assert!(cancel(DocumentStatus::Sent).is_ok());
        assert!(cancel(DocumentStatus::Accepted).is_ok());
        assert!(cancel(DocumentStatus::Rejected).is_err());
        assert!(cancel(DocumentStatus::Canceled).is_err());
    }
}
