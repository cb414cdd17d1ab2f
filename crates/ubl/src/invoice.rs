//! UBL 2.1 invoice-family rendering (invoices, credit notes, debit notes).
//!
//! The view structs are serialization-only: every monetary field is
//! pre-formatted to the 2-decimal wire form so rounding happens in exactly
//! one place. Element order follows the schema and must not be reordered.

use serde::Serialize;

use emisor_documents::{LineItem, TaxDocument};

use crate::money;

/// Empty element the signer later fills.
#[derive(Debug, Serialize)]
pub(crate) struct ExtensionSlot;

#[derive(Debug, Serialize)]
pub(crate) struct UblExtensions {
    #[serde(rename = "ext:UBLExtension")]
    pub extension: UblExtension,
}

#[derive(Debug, Serialize)]
pub(crate) struct UblExtension {
    #[serde(rename = "ext:ExtensionContent")]
    pub content: ExtensionSlot,
}

impl UblExtensions {
    pub(crate) fn slot() -> Self {
        Self {
            extension: UblExtension {
                content: ExtensionSlot,
            },
        }
    }
}

/// Monetary amount with its currency attribute.
#[derive(Debug, Serialize)]
pub(crate) struct Amount {
    #[serde(rename = "@currencyID")]
    pub currency: String,
    #[serde(rename = "$text")]
    pub value: String,
}

impl Amount {
    pub(crate) fn new(currency: &str, value: rust_decimal::Decimal) -> Self {
        Self {
            currency: currency.to_string(),
            value: money(value),
        }
    }
}

#[derive(Debug, Serialize)]
struct Quantity {
    #[serde(rename = "@unitCode")]
    unit_code: String,
    #[serde(rename = "$text")]
    value: String,
}

#[derive(Debug, Serialize)]
struct SchemedId {
    #[serde(rename = "@schemeID")]
    scheme: String,
    #[serde(rename = "$text")]
    value: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Party {
    #[serde(rename = "cac:Party")]
    party: PartyBody,
}

#[derive(Debug, Serialize)]
struct PartyBody {
    #[serde(rename = "cac:PartyIdentification")]
    identification: PartyIdentification,
    #[serde(rename = "cac:PartyLegalEntity")]
    legal_entity: PartyLegalEntity,
}

#[derive(Debug, Serialize)]
struct PartyIdentification {
    #[serde(rename = "cbc:ID")]
    id: SchemedId,
}

#[derive(Debug, Serialize)]
struct PartyLegalEntity {
    #[serde(rename = "cbc:RegistrationName")]
    registration_name: String,
}

impl Party {
    pub(crate) fn new(scheme: &str, number: &str, name: &str) -> Self {
        Self {
            party: PartyBody {
                identification: PartyIdentification {
                    id: SchemedId {
                        scheme: scheme.to_string(),
                        value: number.to_string(),
                    },
                },
                legal_entity: PartyLegalEntity {
                    registration_name: name.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TaxTotal {
    #[serde(rename = "cbc:TaxAmount")]
    tax_amount: Amount,
}

#[derive(Debug, Serialize)]
struct MonetaryTotal {
    #[serde(rename = "cbc:LineExtensionAmount")]
    line_extension_amount: Amount,
    #[serde(rename = "cbc:PayableAmount")]
    payable_amount: Amount,
}

#[derive(Debug, Serialize)]
struct InvoiceLineView {
    #[serde(rename = "cbc:ID")]
    id: String,
    #[serde(rename = "cbc:InvoicedQuantity")]
    quantity: Quantity,
    #[serde(rename = "cbc:LineExtensionAmount")]
    line_extension_amount: Amount,
    #[serde(rename = "cac:Item")]
    item: Item,
    #[serde(rename = "cac:Price")]
    price: Price,
}

#[derive(Debug, Serialize)]
struct Item {
    #[serde(rename = "cbc:Description")]
    description: String,
    #[serde(rename = "cac:ClassifiedTaxCategory")]
    tax_category: ClassifiedTaxCategory,
}

#[derive(Debug, Serialize)]
struct ClassifiedTaxCategory {
    #[serde(rename = "cbc:ID")]
    id: String,
}

#[derive(Debug, Serialize)]
struct Price {
    #[serde(rename = "cbc:PriceAmount")]
    price_amount: Amount,
}

/// Serialization view of an invoice-family document.
#[derive(Debug, Serialize)]
pub(crate) struct InvoiceView {
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
    #[serde(rename = "cbc:InvoiceTypeCode")]
    type_code: String,
    #[serde(rename = "cbc:DocumentCurrencyCode")]
    currency: String,
    #[serde(rename = "cac:AccountingSupplierParty")]
    supplier: Party,
    #[serde(rename = "cac:AccountingCustomerParty")]
    customer: Party,
    #[serde(rename = "cac:TaxTotal")]
    tax_total: TaxTotal,
    #[serde(rename = "cac:LegalMonetaryTotal")]
    monetary_total: MonetaryTotal,
    #[serde(rename = "cac:InvoiceLine")]
    lines: Vec<InvoiceLineView>,
}

impl InvoiceView {
    pub(crate) fn from_document(doc: &TaxDocument) -> Self {
        Self {
            xmlns: "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2",
            xmlns_cac:
                "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2",
            xmlns_cbc: "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2",
            xmlns_ds: "http://www.w3.org/2000/09/xmldsig#",
            xmlns_ext:
                "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2",
            extensions: UblExtensions::slot(),
            ubl_version: "2.1",
            customization: "2.0",
            id: doc.full_number(),
            issue_date: doc.issue_date.format("%Y-%m-%d").to_string(),
            type_code: doc.doc_type.code().to_string(),
            currency: doc.currency.clone(),
            supplier: Party::new("6", &doc.issuer_ruc, &doc.issuer_name),
            customer: Party::new(
                &doc.customer_doc_type,
                &doc.customer_doc_number,
                &doc.customer_name,
            ),
            tax_total: TaxTotal {
                tax_amount: Amount::new(&doc.currency, doc.tax_amount),
            },
            monetary_total: MonetaryTotal {
                line_extension_amount: Amount::new(&doc.currency, doc.taxed_subtotal),
                payable_amount: Amount::new(&doc.currency, doc.grand_total),
            },
            lines: doc
                .lines
                .iter()
                .enumerate()
                .map(|(i, line)| line_view(doc, i + 1, line))
                .collect(),
        }
    }
}

fn line_view(doc: &TaxDocument, line_no: usize, line: &LineItem) -> InvoiceLineView {
    InvoiceLineView {
        id: line_no.to_string(),
        quantity: Quantity {
            unit_code: line.unit_code.clone(),
            value: line.quantity.to_string(),
        },
        line_extension_amount: Amount::new(&doc.currency, line.extension_amount()),
        item: Item {
            description: line.description.clone(),
            tax_category: ClassifiedTaxCategory {
                id: line.tax_code.clone(),
            },
        },
        price: Price {
            price_amount: Amount::new(&doc.currency, line.unit_price),
        },
    }
}
