//! `emisor-documents` — tax document model and lifecycle.
//!
//! The document here is the *fiscal* artifact sent to the tax authority, not
//! the commercial invoice it was issued from. It owns three things: the
//! structured data the XML builder renders, the raw/signed artifact slots,
//! and the lifecycle status driven by submission outcomes.

pub mod document;
pub mod outcome;
pub mod status;

pub use document::{DocumentType, LineItem, TaxDocument};
pub use outcome::{AuthorityCode, SubmissionOutcome, SunatResponse};
pub use status::DocumentStatus;
