//! `emisor-ubl` — renders tax documents into the authority's XML schema.
//!
//! The builder is deterministic: identical input produces byte-identical
//! output. That property is what makes content hashing stable and retries
//! idempotent, so nothing here may depend on clocks, randomness or map
//! iteration order.
//!
//! Every rendered document carries an empty `ext:ExtensionContent` slot;
//! the signer fills it with the enveloped signature later.

pub mod invoice;
pub mod retention;
pub mod validate;

use thiserror::Error;

use emisor_documents::{DocumentType, TaxDocument};

/// Declaration prepended to every rendered document.
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// The slot the signer replaces with the `ds:Signature` block.
pub const EXTENSION_SLOT: &str = "<ext:ExtensionContent/>";

/// Builder failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Document data is missing or inconsistent; not retryable, requires
    /// upstream correction.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl BuildError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Render a document into the authority schema for its type.
///
/// Validates required fields and totals reconciliation first; no side
/// effects beyond computation.
pub fn build(doc: &TaxDocument) -> Result<String, BuildError> {
    validate::validate(doc)?;

    let body = match doc.doc_type {
        DocumentType::Retention => {
            let view = retention::RetentionView::from_document(doc);
            quick_xml::se::to_string_with_root("Retention", &view)
        }
        DocumentType::Invoice => {
            let view = invoice::InvoiceView::from_document(doc);
            quick_xml::se::to_string_with_root("Invoice", &view)
        }
        DocumentType::CreditNote => {
            let view = invoice::InvoiceView::from_document(doc);
            quick_xml::se::to_string_with_root("CreditNote", &view)
        }
        DocumentType::DebitNote => {
            let view = invoice::InvoiceView::from_document(doc);
            quick_xml::se::to_string_with_root("DebitNote", &view)
        }
    }
    .map_err(|e| BuildError::Serialize(e.to_string()))?;

    Ok(format!("{XML_DECLARATION}{body}"))
}

/// Render a monetary amount with the fixed 2-decimal wire precision.
pub(crate) fn money(value: rust_decimal::Decimal) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use emisor_core::{DocumentId, OrganizationId};
    use emisor_documents::{DocumentStatus, LineItem};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn dec(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn test_document() -> TaxDocument {
        TaxDocument {
            id: DocumentId::new(),
            organization_id: OrganizationId::new(),
            doc_type: DocumentType::Invoice,
            series: "F001".to_string(),
            number: 1,
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            issuer_ruc: "20123456789".to_string(),
            issuer_name: "ACME SAC".to_string(),
            customer_doc_type: "6".to_string(),
            customer_doc_number: "20987654321".to_string(),
            customer_name: "CLIENTE SA".to_string(),
            currency: "PEN".to_string(),
            taxed_subtotal: dec(10000),
            tax_amount: dec(1800),
            grand_total: dec(11800),
            lines: vec![LineItem {
                description: "Servicio de consultoría".to_string(),
                quantity: Decimal::new(1, 0),
                unit_code: "ZZ".to_string(),
                unit_price: dec(10000),
                tax_code: "10".to_string(),
            }],
            raw_xml: None,
            signed_xml: None,
            content_hash: None,
            status: DocumentStatus::Pending,
        }
    }

    #[test]
    fn output_is_byte_identical_across_calls() {
        let doc = test_document();
        let first = build(&doc).unwrap();
        let second = build(&doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn output_carries_declaration_and_extension_slot() {
        let xml = build(&test_document()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(EXTENSION_SLOT));
    }

    #[test]
    fn output_carries_identifier_parties_and_totals() {
        let xml = build(&test_document()).unwrap();
        assert!(xml.contains("<cbc:ID>F001-00000001</cbc:ID>"));
        assert!(xml.contains("20123456789"));
        assert!(xml.contains("CLIENTE SA"));
        assert!(xml.contains(r#"<cbc:PayableAmount currencyID="PEN">118.00</cbc:PayableAmount>"#));
        assert!(xml.contains(r#"<cbc:TaxAmount currencyID="PEN">18.00</cbc:TaxAmount>"#));
    }

    #[test]
    fn root_element_follows_document_type() {
        let mut doc = test_document();
        assert!(build(&doc).unwrap().contains("<Invoice "));

        doc.doc_type = DocumentType::CreditNote;
        doc.series = "FC01".to_string();
        assert!(build(&doc).unwrap().contains("<CreditNote "));
    }

    #[test]
    fn retention_renders_its_own_schema_root() {
        let mut doc = test_document();
        doc.doc_type = DocumentType::Retention;
        doc.series = "R001".to_string();
        let xml = build(&doc).unwrap();
        assert!(xml.contains("<Retention "));
        assert!(xml.contains("<sac:SUNATTotalPaid"));
    }

    #[test]
    fn totals_off_by_five_fail_before_rendering() {
        let mut doc = test_document();
        doc.taxed_subtotal = dec(10500); // lines sum to 100.00
        doc.grand_total = dec(12300);
        let err = build(&doc).unwrap_err();
        assert!(matches!(err, BuildError::Validation(_)));
    }

    #[test]
    fn reconciliation_tolerance_is_one_cent() {
        let mut doc = test_document();
        doc.taxed_subtotal = dec(10001);
        doc.grand_total = dec(11801);
        assert!(build(&doc).is_ok());

        doc.taxed_subtotal = dec(10002);
        doc.grand_total = dec(11802);
        assert!(build(&doc).is_err());
    }

    #[test]
    fn missing_lines_fail_validation() {
        let mut doc = test_document();
        doc.lines.clear();
        assert!(matches!(build(&doc), Err(BuildError::Validation(_))));
    }

    proptest! {
        #[test]
        fn valid_documents_always_render_deterministically(
            line_specs in proptest::collection::vec((1i64..10, 1i64..10_000), 1..5),
            tax_rate in 0u32..30,
        ) {
            let mut doc = test_document();
            doc.lines = line_specs
                .iter()
                .enumerate()
                .map(|(i, (qty, price_cents))| LineItem {
                    description: format!("Item {i}"),
                    quantity: Decimal::new(*qty, 0),
                    unit_code: "NIU".to_string(),
                    unit_price: Decimal::new(*price_cents, 2),
                    tax_code: "10".to_string(),
                })
                .collect();
            doc.taxed_subtotal = doc.line_total();
            doc.tax_amount =
                (doc.taxed_subtotal * Decimal::new(tax_rate as i64, 2)).round_dp(2);
            doc.grand_total = doc.taxed_subtotal + doc.tax_amount;

            let first = build(&doc).unwrap();
            let second = build(&doc).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
