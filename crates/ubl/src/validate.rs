//! Pre-render validation.
//!
//! Rejects documents the authority would bounce anyway, before any signing
//! or network work happens.

use rust_decimal::Decimal;

use emisor_documents::TaxDocument;

use crate::BuildError;

/// Reconciliation tolerance: one cent of the document currency.
const TOLERANCE_CENTS: i64 = 1;

pub fn validate(doc: &TaxDocument) -> Result<(), BuildError> {
    validate_series(&doc.series)?;
    if doc.number == 0 {
        return Err(BuildError::validation("document number must be positive"));
    }
    if doc.issuer_ruc.len() != 11 || !doc.issuer_ruc.bytes().all(|b| b.is_ascii_digit()) {
        return Err(BuildError::validation("issuer RUC must be 11 digits"));
    }
    if doc.lines.is_empty() {
        return Err(BuildError::validation(
            "document must have at least one line item",
        ));
    }

    for (i, line) in doc.lines.iter().enumerate() {
        if line.quantity <= Decimal::ZERO {
            return Err(BuildError::validation(format!(
                "line {}: quantity must be positive",
                i + 1
            )));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(BuildError::validation(format!(
                "line {}: unit price cannot be negative",
                i + 1
            )));
        }
        if line.description.trim().is_empty() {
            return Err(BuildError::validation(format!(
                "line {}: description is required",
                i + 1
            )));
        }
    }

    for (name, value) in [
        ("taxed subtotal", doc.taxed_subtotal),
        ("tax amount", doc.tax_amount),
        ("grand total", doc.grand_total),
    ] {
        if value < Decimal::ZERO {
            return Err(BuildError::validation(format!(
                "{name} cannot be negative"
            )));
        }
    }

    let tolerance = Decimal::new(TOLERANCE_CENTS, 2);

    let line_total = doc.line_total();
    if (doc.taxed_subtotal - line_total).abs() > tolerance {
        return Err(BuildError::validation(format!(
            "taxed subtotal {} does not reconcile with line total {}",
            doc.taxed_subtotal, line_total
        )));
    }

    if (doc.grand_total - (doc.taxed_subtotal + doc.tax_amount)).abs() > tolerance {
        return Err(BuildError::validation(format!(
            "grand total {} does not equal subtotal {} + tax {}",
            doc.grand_total, doc.taxed_subtotal, doc.tax_amount
        )));
    }

    Ok(())
}

/// Series format: one letter followed by three alphanumerics (e.g. `F001`,
/// `R001`, `FC01`).
fn validate_series(series: &str) -> Result<(), BuildError> {
    let bytes = series.as_bytes();
    let well_formed = bytes.len() == 4
        && bytes[0].is_ascii_alphabetic()
        && bytes[1..].iter().all(|b| b.is_ascii_alphanumeric());
    if !well_formed {
        return Err(BuildError::validation(format!(
            "series '{series}' must be a letter followed by three alphanumerics"
        )));
    }
    Ok(())
}
