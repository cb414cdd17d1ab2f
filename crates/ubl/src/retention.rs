//! Retention-family rendering.
//!
//! Retention receipts use the authority's own schema rather than plain UBL,
//! and are submitted to the separate retention endpoint. The profile here is
//! the subset the submission pipeline needs.

use serde::Serialize;

use emisor_documents::TaxDocument;

use crate::invoice::{Amount, Party, UblExtensions};

#[derive(Debug, Serialize)]
pub(crate) struct RetentionView {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@xmlns:cac")]
    xmlns_cac: &'static str,
    #[serde(rename = "@xmlns:cbc")]
    xmlns_cbc: &'static str,
    #[serde(rename = "@xmlns:ds")]
    xmlns_ds: &'static str,
    #[serde(rename = "@xmlns:ext")]
    xmlns_ext: &'static str,
    #[serde(rename = "@xmlns:sac")]
    xmlns_sac: &'static str,

    #[serde(rename = "ext:UBLExtensions")]
    extensions: UblExtensions,
    #[serde(rename = "cbc:UBLVersionID")]
    ubl_version: &'static str,
    #[serde(rename = "cbc:CustomizationID")]
    customization: &'static str,
    #[serde(rename = "cbc:ID")]
    id: String,
    #[serde(rename = "cbc:IssueDate")]
    issue_date: String,
    #[serde(rename = "cac:AgentParty")]
    agent: Party,
    #[serde(rename = "cac:ReceiverParty")]
    receiver: Party,
    #[serde(rename = "sac:SUNATTotalPaid")]
    total_paid: Amount,
}

impl RetentionView {
    pub(crate) fn from_document(doc: &TaxDocument) -> Self {
        Self {
            xmlns: "urn:sunat:names:specification:ubl:peru:schema:xsd:Retention-1",
            xmlns_cac:
                "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2",
            xmlns_cbc: "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2",
            xmlns_ds: "http://www.w3.org/2000/09/xmldsig#",
            xmlns_ext:
                "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2",
            xmlns_sac:
                "urn:sunat:names:specification:ubl:peru:schema:xsd:SunatAggregateComponents-1",
            extensions: UblExtensions::slot(),
            ubl_version: "2.0",
            customization: "1.0",
            id: doc.full_number(),
            issue_date: doc.issue_date.format("%Y-%m-%d").to_string(),
            agent: Party::new("6", &doc.issuer_ruc, &doc.issuer_name),
            receiver: Party::new(
                &doc.customer_doc_type,
                &doc.customer_doc_number,
                &doc.customer_name,
            ),
            total_paid: Amount::new(&doc.currency, doc.grand_total),
        }
    }
}
