//! Response envelope interpretation.
//!
//! The authority answers a `sendBill` in one of three shapes:
//!
//! - `applicationResponse`: base64 zip embedding the receipt document (CDR),
//!   whose `ResponseCode` carries the verdict (`0` = accepted);
//! - a SOAP Fault: a well-formed application-level rejection;
//! - an acknowledgement with neither: receipt noted, verdict pending.
//!
//! A CDR that cannot be decoded degrades to a `Pending` outcome instead of
//! failing the submission; the verdict can still be resolved later.

use std::io::{Cursor, Read};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::warn;

use emisor_documents::{AuthorityCode, SubmissionOutcome};

use crate::client::RawResponse;

/// Failure while decoding the embedded receipt. Non-fatal by contract.
#[derive(Debug, Error)]
enum DecodeError {
    #[error("invalid base64: {0}")]
    Base64(String),

    #[error("invalid zip archive: {0}")]
    Zip(String),

    #[error("no receipt document inside the archive")]
    MissingReceipt,

    #[error("receipt has no ResponseCode")]
    MissingResponseCode,
}

/// Decode a raw transport response into a normalized outcome.
pub fn interpret(response: &RawResponse) -> SubmissionOutcome {
    if let Some(encoded) = element_text(&response.body, "applicationResponse") {
        return match decode_receipt(&encoded) {
            Ok(receipt) => receipt.into_outcome(),
            Err(e) => {
                warn!(error = %e, "receipt decode failed, degrading to pending");
                // Keep the raw payload so the verdict can still be resolved
                // from the stored outcome later.
                SubmissionOutcome::new(
                    AuthorityCode::Pending,
                    format!(
                        "receipt acknowledged but not decodable ({e}); raw payload: {}",
                        snippet(&encoded)
                    ),
                )
            }
        };
    }

    if let Some(fault) = element_text(&response.body, "faultstring") {
        let code = element_text(&response.body, "faultcode").unwrap_or_default();
        let message = if code.is_empty() {
            fault
        } else {
            format!("{code}: {fault}")
        };
        return SubmissionOutcome::new(AuthorityCode::Rejected, message);
    }

    SubmissionOutcome::new(
        AuthorityCode::Pending,
        "authority acknowledged receipt without a verdict",
    )
}

/// Decoded CDR verdict.
struct Receipt {
    code: String,
    description: String,
    xml: String,
}

impl Receipt {
    fn into_outcome(self) -> SubmissionOutcome {
        let authority = if self.code == "0" {
            AuthorityCode::Accepted
        } else {
            AuthorityCode::Rejected
        };
        let message = if self.description.is_empty() {
            format!("response code {}", self.code)
        } else {
            self.description
        };
        SubmissionOutcome::new(authority, message).with_receipt(self.xml)
    }
}

fn decode_receipt(encoded: &str) -> Result<Receipt, DecodeError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DecodeError::Zip(e.to_string()))?;

    let mut xml = None;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| DecodeError::Zip(e.to_string()))?;
        if entry.name().ends_with(".xml") {
            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|e| DecodeError::Zip(e.to_string()))?;
            xml = Some(content);
            break;
        }
    }
    let xml = xml.ok_or(DecodeError::MissingReceipt)?;

    let code = element_text(&xml, "ResponseCode").ok_or(DecodeError::MissingResponseCode)?;
    let description = element_text(&xml, "Description").unwrap_or_default();

    Ok(Receipt {
        code,
        description,
        xml,
    })
}

/// Bound on how much raw payload an outcome message carries.
const RAW_SNIPPET_LEN: usize = 256;

fn snippet(payload: &str) -> String {
    let mut out: String = payload.chars().take(RAW_SNIPPET_LEN).collect();
    if out.len() < payload.len() {
        out.push_str("...");
    }
    out
}

/// Text content of the first element with the given local name, ignoring
/// namespace prefixes.
fn element_text(xml: &str, local_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == local_name.as_bytes() => {
                return reader
                    .read_text(e.name())
                    .ok()
                    .map(|text| text.trim().to_string());
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn cdr_zip(code: &str, description: &str) -> String {
        let xml = format!(
            r#"<?xml version="1.0"?><ar:ApplicationResponse xmlns:ar="urn:ar" xmlns:cbc="urn:cbc"><cac:DocumentResponse><cac:Response><cbc:ResponseCode>{code}</cbc:ResponseCode><cbc:Description>{description}</cbc:Description></cac:Response></cac:DocumentResponse></ar:ApplicationResponse>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("R-20123456789-01-F001-00000001.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        BASE64.encode(writer.finish().unwrap().into_inner())
    }

    fn soap_response(application_response: &str) -> RawResponse {
        RawResponse {
            body: format!(
                r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><br:sendBillResponse xmlns:br="http://service.sunat.gob.pe"><applicationResponse>{application_response}</applicationResponse></br:sendBillResponse></soap:Body></soap:Envelope>"#
            ),
        }
    }

    #[test]
    fn accepted_receipt_yields_accepted_with_cdr_attached() {
        let response = soap_response(&cdr_zip("0", "La Factura ha sido aceptada"));
        let outcome = interpret(&response);
        assert_eq!(outcome.code, AuthorityCode::Accepted);
        assert_eq!(outcome.message, "La Factura ha sido aceptada");
        assert!(outcome.receipt_xml.unwrap().contains("ApplicationResponse"));
    }

    #[test]
    fn nonzero_response_code_yields_rejected() {
        let response = soap_response(&cdr_zip("2324", "RUC no válido"));
        let outcome = interpret(&response);
        assert_eq!(outcome.code, AuthorityCode::Rejected);
        assert_eq!(outcome.message, "RUC no válido");
    }

    #[test]
    fn soap_fault_is_a_terminal_rejection() {
        let response = RawResponse {
            body: r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>soap:Client.1033</faultcode><faultstring>El comprobante fue registrado previamente</faultstring></soap:Fault></soap:Body></soap:Envelope>"#.to_string(),
        };
        let outcome = interpret(&response);
        assert_eq!(outcome.code, AuthorityCode::Rejected);
        assert!(outcome.message.contains("registrado previamente"));
        assert!(outcome.message.contains("1033"));
    }

    #[test]
    fn acknowledgement_without_verdict_is_pending() {
        let response = RawResponse {
            body: r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><br:sendBillResponse xmlns:br="http://service.sunat.gob.pe"/></soap:Body></soap:Envelope>"#.to_string(),
        };
        let outcome = interpret(&response);
        assert_eq!(outcome.code, AuthorityCode::Pending);
    }

    #[test]
    fn undecodable_receipt_degrades_to_pending_with_raw_payload() {
        let response = soap_response("!!!not-base64!!!");
        let outcome = interpret(&response);
        assert_eq!(outcome.code, AuthorityCode::Pending);
        assert!(outcome.message.contains("not decodable"));
        assert!(outcome.message.contains("!!!not-base64!!!"));
        assert!(outcome.receipt_xml.is_none());
    }

    #[test]
    fn preserved_raw_payload_is_bounded() {
        let payload = "A".repeat(10_000);
        let response = soap_response(&payload);
        let outcome = interpret(&response);
        assert_eq!(outcome.code, AuthorityCode::Pending);
        assert!(outcome.message.contains(&"A".repeat(256)));
        assert!(outcome.message.ends_with("..."));
        assert!(outcome.message.len() < 512);
    }

    #[test]
    fn valid_base64_with_corrupt_zip_degrades_to_pending() {
        let response = soap_response(&BASE64.encode(b"this is not a zip"));
        let outcome = interpret(&response);
        assert_eq!(outcome.code, AuthorityCode::Pending);
    }
}
