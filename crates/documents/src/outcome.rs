//! Submission outcomes and their persisted form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emisor_core::DocumentId;

/// Normalized authority verdict for one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityCode {
    Accepted,
    Rejected,
    /// Receipt acknowledged but no synchronous verdict yet. A stable
    /// non-error outcome; resolving it would take a follow-up poll.
    Pending,
    /// The attempt failed before a verdict could be obtained.
    Error,
}

/// Result of one submission attempt. Transient; persisted as [`SunatResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub code: AuthorityCode,
    pub message: String,
    /// Decoded receipt document (CDR), when the response carried one.
    pub receipt_xml: Option<String>,
}

impl SubmissionOutcome {
    pub fn new(code: AuthorityCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            receipt_xml: None,
        }
    }

    pub fn with_receipt(mut self, xml: impl Into<String>) -> Self {
        self.receipt_xml = Some(xml.into());
        self
    }
}

/// Persisted outcome record, keyed uniquely by document id.
///
/// At most one record per document; each new attempt overwrites the prior
/// one (latest outcome wins). Never contains credential material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunatResponse {
    pub document_id: DocumentId,
    pub code: AuthorityCode,
    pub message: String,
    pub receipt_xml: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl SunatResponse {
    pub fn from_outcome(document_id: DocumentId, outcome: &SubmissionOutcome) -> Self {
        Self {
            document_id,
            code: outcome.code,
            message: outcome.message.clone(),
            receipt_xml: outcome.receipt_xml.clone(),
            received_at: Utc::now(),
        }
    }

    /// Record for an attempt that failed with an infrastructure error.
    pub fn error(document_id: DocumentId, message: impl Into<String>) -> Self {
        Self {
            document_id,
            code: AuthorityCode::Error,
            message: message.into(),
            receipt_xml: None,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_carries_receipt_when_attached() {
        let outcome = SubmissionOutcome::new(AuthorityCode::Accepted, "ok")
            .with_receipt("<ApplicationResponse/>");
        assert_eq!(outcome.receipt_xml.as_deref(), Some("<ApplicationResponse/>"));
    }

    #[test]
    fn error_record_uses_error_code() {
        let record = SunatResponse::error(DocumentId::new(), "timed out");
        assert_eq!(record.code, AuthorityCode::Error);
        assert_eq!(record.message, "timed out");
        assert!(record.receipt_xml.is_none());
    }
}
