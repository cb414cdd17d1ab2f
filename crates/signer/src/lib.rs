//! `emisor-signer` — applies the enveloped digital signature the authority
//! requires on submitted documents.
//!
//! Signing consumes the builder's rendered XML and the organization's
//! certificate material, and produces the signed artifact plus a content
//! hash. A signed artifact is written once per document and never replaced;
//! re-submission reuses it (enforced by the pipeline, not here).

pub mod certificate;
pub mod xmldsig;

use thiserror::Error;

pub use certificate::{Certificate, CertificateMaterial};
pub use xmldsig::{sign, Signed};

/// Signing failure. None of these are retryable without operator
/// intervention (bad credential material or expired certificate).
#[derive(Debug, Error)]
pub enum SignError {
    #[error("certificate parse failed: {0}")]
    CertificateParse(String),

    /// Key decryption failed; almost always a wrong passphrase.
    #[error("private key decrypt failed: {0}")]
    KeyDecrypt(String),

    #[error("certificate expired at {not_after}")]
    Expired { not_after: chrono::DateTime<chrono::Utc> },

    #[error("certificate not valid until {not_before}")]
    NotYetValid { not_before: chrono::DateTime<chrono::Utc> },

    /// The rendered document is missing the extension slot the signature
    /// is embedded into.
    #[error("document has no signature extension slot")]
    MissingExtensionSlot,

    #[error("signature computation failed: {0}")]
    Signature(String),
}
