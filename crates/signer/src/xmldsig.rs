//! Enveloped XMLDSig assembly.
//!
//! The builder's output is byte-stable and serialized in canonical form, so
//! the reference digest is computed over the rendered bytes directly (with
//! the extension slot still empty) instead of re-canonicalizing. The
//! resulting document carries the signature inside
//! `ext:UBLExtensions/ext:UBLExtension/ext:ExtensionContent`, which is where
//! the receiving party's verifier expects it.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};

use crate::SignError;
use crate::certificate::CertificateMaterial;

/// Empty slot emitted by the builder. Must stay in sync with the builder's
/// extension rendering.
const EXTENSION_SLOT: &str = "<ext:ExtensionContent/>";

/// Signed artifact plus its content hash (base64 SHA-256 of the document
/// the signature covers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signed {
    pub xml: String,
    pub digest: String,
}

/// Sign a rendered document.
///
/// `at` is the submission time the certificate validity window is checked
/// against. The digest is deterministic for identical input; the signature
/// value itself is not required to be.
pub fn sign(
    xml: &str,
    material: &CertificateMaterial,
    at: DateTime<Utc>,
) -> Result<Signed, SignError> {
    material.ensure_valid_at(at)?;

    if !xml.contains(EXTENSION_SLOT) {
        return Err(SignError::MissingExtensionSlot);
    }

    let digest = BASE64.encode(Sha256::digest(xml.as_bytes()));
    let signed_info = signed_info(&digest);

    let signed_info_digest = Sha256::digest(signed_info.as_bytes());
    let signature = material
        .key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &signed_info_digest)
        .map_err(|e| SignError::Signature(e.to_string()))?;

    let block = format!(
        r#"<ds:Signature Id="SignatureSP">{signed_info}<ds:SignatureValue>{signature}</ds:SignatureValue><ds:KeyInfo><ds:X509Data><ds:X509Certificate>{certificate}</ds:X509Certificate></ds:X509Data></ds:KeyInfo></ds:Signature>"#,
        signed_info = signed_info,
        signature = BASE64.encode(&signature),
        certificate = BASE64.encode(&material.certificate_der),
    );

    let xml = xml.replacen(
        EXTENSION_SLOT,
        &format!("<ext:ExtensionContent>{block}</ext:ExtensionContent>"),
        1,
    );

    Ok(Signed { xml, digest })
}

fn signed_info(digest: &str) -> String {
    format!(
        r#"<ds:SignedInfo><ds:CanonicalizationMethod Algorithm="http://www.w3.org/TR/2001/REC-xml-c14n-20010315"/><ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"/><ds:Reference URI=""><ds:Transforms><ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/></ds:Transforms><ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/><ds:DigestValue>{digest}</ds:DigestValue></ds:Reference></ds:SignedInfo>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rsa::RsaPrivateKey;

    fn test_key() -> RsaPrivateKey {
        // Small key: test-only, keeps generation fast.
        RsaPrivateKey::new(&mut rand::rngs::OsRng, 1024).unwrap()
    }

    fn test_material(not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> CertificateMaterial {
        CertificateMaterial::new_unchecked(b"test-cert-der".to_vec(), test_key(), not_before, not_after)
    }

    fn valid_material() -> CertificateMaterial {
        let now = Utc::now();
        test_material(now - Duration::days(1), now + Duration::days(365))
    }

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Invoice><ext:UBLExtensions><ext:UBLExtension><ext:ExtensionContent/></ext:UBLExtension></ext:UBLExtensions><cbc:ID>F001-00000001</cbc:ID></Invoice>"#;

    #[test]
    fn signature_fills_the_extension_slot() {
        let signed = sign(DOC, &valid_material(), Utc::now()).unwrap();
        assert!(!signed.xml.contains(EXTENSION_SLOT));
        assert!(signed.xml.contains("<ds:SignatureValue>"));
        assert!(signed.xml.contains("<ds:X509Certificate>"));
        // Rest of the document is untouched.
        assert!(signed.xml.contains("<cbc:ID>F001-00000001</cbc:ID>"));
    }

    #[test]
    fn digest_is_stable_for_identical_input() {
        let material = valid_material();
        let first = sign(DOC, &material, Utc::now()).unwrap();
        let second = sign(DOC, &material, Utc::now()).unwrap();
        assert_eq!(first.digest, second.digest);
    }

    #[test]
    fn expired_certificate_is_rejected() {
        let now = Utc::now();
        let material = test_material(now - Duration::days(730), now - Duration::days(365));
        let err = sign(DOC, &material, now).unwrap_err();
        assert!(matches!(err, SignError::Expired { .. }));
    }

    #[test]
    fn not_yet_valid_certificate_is_rejected() {
        let now = Utc::now();
        let material = test_material(now + Duration::days(1), now + Duration::days(365));
        let err = sign(DOC, &material, now).unwrap_err();
        assert!(matches!(err, SignError::NotYetValid { .. }));
    }

    #[test]
    fn document_without_slot_is_rejected() {
        let err = sign("<Invoice/>", &valid_material(), Utc::now()).unwrap_err();
        assert!(matches!(err, SignError::MissingExtensionSlot));
    }
}
