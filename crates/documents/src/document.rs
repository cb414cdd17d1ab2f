//! Tax document data model.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emisor_core::{DocumentId, OrganizationId};

use crate::status::DocumentStatus;

/// Authority document-type code.
///
/// The two-digit codes are fixed by the authority's catalog and appear both
/// in the XML body and in the attachment file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Invoice,
    CreditNote,
    DebitNote,
    Retention,
}

impl DocumentType {
    /// Catalog code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "01",
            DocumentType::CreditNote => "07",
            DocumentType::DebitNote => "08",
            DocumentType::Retention => "20",
        }
    }

    /// Retention-family documents are submitted to a separate authority
    /// endpoint; everything else goes to the billing endpoint.
    pub fn is_retention_family(&self) -> bool {
        matches!(self, DocumentType::Retention)
    }
}

/// A single document line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    /// Unit-of-measure code (e.g. `NIU`, `ZZ`).
    pub unit_code: String,
    pub unit_price: Decimal,
    /// Tax affectation code from the authority catalog (e.g. `10` taxed).
    pub tax_code: String,
}

impl LineItem {
    /// Line total before tax.
    pub fn extension_amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

/// A fiscal document in its submission lifecycle.
///
/// Created in `Pending` by the issuing workflow; mutated only by the
/// submission job and the status reconciler. Invariant: `signed_xml` is
/// non-null whenever status is `Sent`, `Accepted` or `Rejected` (signing
/// always happens before the `Sent` transition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxDocument {
    pub id: DocumentId,
    pub organization_id: OrganizationId,
    pub doc_type: DocumentType,
    /// Series (e.g. `F001`). Together with `number`, the authority-visible
    /// identifier, unique per organization + type + series.
    pub series: String,
    pub number: u32,
    pub issue_date: NaiveDate,

    /// Issuer tax registration number (RUC).
    pub issuer_ruc: String,
    pub issuer_name: String,
    /// Customer identity document type code (e.g. `6` = RUC, `1` = DNI).
    pub customer_doc_type: String,
    pub customer_doc_number: String,
    pub customer_name: String,

    /// ISO 4217 currency code.
    pub currency: String,
    pub taxed_subtotal: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
    pub lines: Vec<LineItem>,

    pub raw_xml: Option<String>,
    pub signed_xml: Option<String>,
    /// Base64 digest of the signed content, set by the signer.
    pub content_hash: Option<String>,

    pub status: DocumentStatus,
}

impl TaxDocument {
    /// Authority-visible identifier, e.g. `F001-00000123`.
    pub fn full_number(&self) -> String {
        format!("{}-{:08}", self.series, self.number)
    }

    /// Attachment file stem mandated by the authority:
    /// `{ruc}-{type code}-{series}-{number}`.
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}-{}-{:08}",
            self.issuer_ruc,
            self.doc_type.code(),
            self.series,
            self.number
        )
    }

    /// Sum of line totals before tax.
    pub fn line_total(&self) -> Decimal {
        self.lines.iter().map(LineItem::extension_amount).sum()
    }
}
