//! Request envelope assembly: zip attachment and SOAP body.

use std::io::{Cursor, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use zip::write::SimpleFileOptions;

use crate::{PortalCredentials, TransportError};

/// Package the signed XML into the zip archive the authority expects:
/// a single entry named `{file_stem}.xml`.
pub fn package(file_stem: &str, signed_xml: &str) -> Result<Vec<u8>, TransportError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    writer
        .start_file(format!("{file_stem}.xml"), options)
        .and_then(|_| {
            writer
                .write_all(signed_xml.as_bytes())
                .map_err(zip::result::ZipError::Io)
        })
        .map_err(|e| TransportError::Packaging(e.to_string()))?;

    let cursor = writer
        .finish()
        .map_err(|e| TransportError::Packaging(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// SOAP 1.1 `sendBill` envelope with a WS-Security UsernameToken header.
pub fn send_bill_envelope(
    credentials: &PortalCredentials,
    file_name: &str,
    zip_bytes: &[u8],
) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ser="http://service.sunat.gob.pe" xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd"><soapenv:Header><wsse:Security><wsse:UsernameToken><wsse:Username>{username}</wsse:Username><wsse:Password>{password}</wsse:Password></wsse:UsernameToken></wsse:Security></soapenv:Header><soapenv:Body><ser:sendBill><fileName>{file_name}</fileName><contentFile>{content}</contentFile></ser:sendBill></soapenv:Body></soapenv:Envelope>"#,
        username = xml_escape(&credentials.username),
        password = xml_escape(&credentials.password),
        file_name = xml_escape(file_name),
        content = BASE64.encode(zip_bytes),
    )
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn test_credentials() -> PortalCredentials {
        PortalCredentials {
            username: "20123456789MODDATOS".to_string(),
            password: "moddatos".to_string(),
        }
    }

    #[test]
    fn package_produces_single_named_entry() {
        let bytes = package("20123456789-01-F001-00000001", "<Invoice/>").unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "20123456789-01-F001-00000001.xml");
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "<Invoice/>");
    }

    #[test]
    fn envelope_carries_token_filename_and_content() {
        let envelope = send_bill_envelope(&test_credentials(), "doc.zip", b"zipbytes");
        assert!(envelope.contains("<wsse:Username>20123456789MODDATOS</wsse:Username>"));
        assert!(envelope.contains("<wsse:Password>moddatos</wsse:Password>"));
        assert!(envelope.contains("<fileName>doc.zip</fileName>"));
        assert!(envelope.contains(&format!("<contentFile>{}</contentFile>", BASE64.encode(b"zipbytes"))));
    }

    #[test]
    fn credentials_are_escaped() {
        let credentials = PortalCredentials {
            username: "user".to_string(),
            password: "p<&>w".to_string(),
        };
        let envelope = send_bill_envelope(&credentials, "doc.zip", b"");
        assert!(envelope.contains("p&lt;&amp;&gt;w"));
        assert!(!envelope.contains("p<&>w"));
    }
}
