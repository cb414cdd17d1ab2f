//! `emisor-transport` — the authenticated SOAP exchange with the tax
//! authority, and interpretation of its response envelope.
//!
//! The wire contract is fixed by the authority and cannot be renegotiated:
//! the signed XML travels as a zipped, base64-encoded attachment inside a
//! SOAP 1.1 `sendBill` body authenticated with a WS-Security UsernameToken;
//! the response optionally embeds a compressed receipt (CDR).
//!
//! Transport failures (connect, timeout, HTTP error, unparseable body) are
//! kept strictly apart from application-level outcomes: only the former are
//! retryable, a well-formed rejection is final.

pub mod client;
pub mod config;
pub mod envelope;
pub mod response;

use std::time::Duration;

use thiserror::Error;

pub use client::{BillService, RawResponse, SoapClient, SubmissionRequest};
pub use config::TransportConfig;
pub use response::interpret;

/// Authority endpoint family. Selected by document type, not per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointFamily {
    /// Invoices, credit notes, debit notes.
    Billing,
    /// Retention/perception receipts.
    Retention,
}

/// Portal credentials (SOL user) for the WS-Security header. Never logged.
#[derive(Clone)]
pub struct PortalCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for PortalCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalCredentials").finish_non_exhaustive()
    }
}

/// Transport-level failure. All variants are retryable by the external
/// job-retry policy.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("authority returned HTTP {0}")]
    Http(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("attachment packaging failed: {0}")]
    Packaging(String),
}
