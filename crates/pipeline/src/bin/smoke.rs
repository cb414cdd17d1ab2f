//! Manual smoke run against the authority's beta environment.
//!
//! Seeds the in-memory stores with one demo invoice, submits it through the
//! real SOAP client, and prints the verdict. Configuration comes from the
//! environment:
//!
//! ```text
//! EMISOR_CERT_PATH         path to the PEM bundle (certificate + encrypted key)
//! EMISOR_CERT_PASSPHRASE   key passphrase
//! EMISOR_SOL_USER          portal username ({ruc}{user})
//! EMISOR_SOL_PASSWORD      portal password
//! EMISOR_BILL_ENDPOINT     optional endpoint override
//! EMISOR_RETENTION_ENDPOINT optional endpoint override
//! ```

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;

use emisor_core::{DocumentId, OrganizationId};
use emisor_documents::{DocumentStatus, DocumentType, LineItem, TaxDocument};
use emisor_pipeline::{InMemoryCredentialProvider, InMemoryDocumentStore, SubmissionWorker};
use emisor_signer::Certificate;
use emisor_transport::{PortalCredentials, SoapClient, TransportConfig};

fn env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("missing environment variable {name}"))
}

fn demo_document(organization: OrganizationId) -> TaxDocument {
    let subtotal = Decimal::new(10000, 2);
    let tax = Decimal::new(1800, 2);
    TaxDocument {
        id: DocumentId::new(),
        organization_id: organization,
        doc_type: DocumentType::Invoice,
        series: "F001".to_string(),
        number: 1,
        issue_date: Utc::now().date_naive(),
        issuer_ruc: "20000000001".to_string(),
        issuer_name: "EMPRESA DEMO SAC".to_string(),
        customer_doc_type: "6".to_string(),
        customer_doc_number: "20000000002".to_string(),
        customer_name: "CLIENTE DEMO SA".to_string(),
        currency: "PEN".to_string(),
        taxed_subtotal: subtotal,
        tax_amount: tax,
        grand_total: subtotal + tax,
        lines: vec![LineItem {
            description: "Servicio de prueba".to_string(),
            quantity: Decimal::ONE,
            unit_code: "ZZ".to_string(),
            unit_price: subtotal,
            tax_code: "10".to_string(),
        }],
        raw_xml: None,
        signed_xml: None,
        content_hash: None,
        status: DocumentStatus::Pending,
    }
}

fn main() -> anyhow::Result<()> {
    emisor_observability::init();

    let cert_path = env("EMISOR_CERT_PATH")?;
    let pem = std::fs::read(&cert_path)
        .with_context(|| format!("reading certificate bundle from {cert_path}"))?;
    let passphrase = env("EMISOR_CERT_PASSPHRASE")?;
    let sol_user = env("EMISOR_SOL_USER")?;
    let sol_password = env("EMISOR_SOL_PASSWORD")?;

    let mut config = TransportConfig::default();
    if let Ok(url) = std::env::var("EMISOR_BILL_ENDPOINT") {
        config = config.with_bill_endpoint(url);
    }
    if let Ok(url) = std::env::var("EMISOR_RETENTION_ENDPOINT") {
        config = config.with_retention_endpoint(url);
    }

    let organization = OrganizationId::new();
    let store = InMemoryDocumentStore::arc();
    let document = demo_document(organization);
    let document_id = document.id;
    let number = document.full_number();
    store.insert(document);

    let credentials = InMemoryCredentialProvider::arc();
    credentials.insert_certificate(organization, Certificate { pem, passphrase });
    credentials.insert_portal_credentials(
        organization,
        PortalCredentials {
            username: sol_user,
            password: sol_password,
        },
    );

    let client = Arc::new(SoapClient::new(config)?);
    let worker = SubmissionWorker::new(store.clone(), credentials, client);

    match worker.submit_document(document_id)? {
        Some(outcome) => {
            println!("{number}: {:?} - {}", outcome.code, outcome.message);
        }
        None => println!("{number}: already resolved"),
    }

    Ok(())
}
