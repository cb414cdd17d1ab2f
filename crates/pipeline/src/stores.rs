//! Storage and credential trait seams with in-memory implementations.
//!
//! The document store is the single point of coordination between
//! concurrent submission units. `record_outcome` is the atomic
//! status-update + outcome-upsert the reconciler requires; the outcome
//! table is keyed by document id, latest outcome wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use emisor_core::{DocumentId, OrganizationId};
use emisor_documents::{DocumentStatus, SunatResponse, TaxDocument};
use emisor_signer::Certificate;
use emisor_transport::PortalCredentials;

/// Store failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),
    #[error("no credentials for organization {0}")]
    CredentialsNotFound(OrganizationId),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Durable record of documents and their submission outcomes.
pub trait DocumentStore: Send + Sync {
    fn get(&self, id: DocumentId) -> Result<TaxDocument, StoreError>;

    fn update_status(&self, id: DocumentId, status: DocumentStatus) -> Result<(), StoreError>;

    /// Persist the rendered and signed artifacts. Called at most once per
    /// document; re-submission reuses the stored signed XML.
    fn set_artifacts(
        &self,
        id: DocumentId,
        raw_xml: String,
        signed_xml: String,
        content_hash: String,
    ) -> Result<(), StoreError>;

    /// Replace-if-exists/insert-if-absent, keyed by document id.
    fn upsert_outcome(&self, response: SunatResponse) -> Result<(), StoreError>;

    /// Status transition and outcome upsert applied atomically.
    fn record_outcome(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        response: SunatResponse,
    ) -> Result<(), StoreError>;

    fn outcome(&self, id: DocumentId) -> Result<Option<SunatResponse>, StoreError>;
}

/// Organization-scoped credential material. Read-only to the pipeline.
pub trait CredentialProvider: Send + Sync {
    fn certificate(&self, organization: OrganizationId) -> Result<Certificate, StoreError>;

    fn portal_credentials(
        &self,
        organization: OrganizationId,
    ) -> Result<PortalCredentials, StoreError>;
}

/// In-memory document store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, TaxDocument>>,
    responses: RwLock<HashMap<DocumentId, SunatResponse>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Seed a document (the issuing workflow in production).
    pub fn insert(&self, document: TaxDocument) {
        self.documents.write().unwrap().insert(document.id, document);
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get(&self, id: DocumentId) -> Result<TaxDocument, StoreError> {
        self.documents
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StoreError::DocumentNotFound(id))
    }

    fn update_status(&self, id: DocumentId, status: DocumentStatus) -> Result<(), StoreError> {
        let mut documents = self.documents.write().unwrap();
        let document = documents
            .get_mut(&id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        document.status = status;
        Ok(())
    }

    fn set_artifacts(
        &self,
        id: DocumentId,
        raw_xml: String,
        signed_xml: String,
        content_hash: String,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().unwrap();
        let document = documents
            .get_mut(&id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        document.raw_xml = Some(raw_xml);
        document.signed_xml = Some(signed_xml);
        document.content_hash = Some(content_hash);
        Ok(())
    }

    fn upsert_outcome(&self, response: SunatResponse) -> Result<(), StoreError> {
        self.responses
            .write()
            .unwrap()
            .insert(response.document_id, response);
        Ok(())
    }

    fn record_outcome(
        &self,
        id: DocumentId,
        status: DocumentStatus,
        response: SunatResponse,
    ) -> Result<(), StoreError> {
        // Both maps mutated while holding the documents lock, so readers
        // never observe the status without its outcome.
        let mut documents = self.documents.write().unwrap();
        let document = documents
            .get_mut(&id)
            .ok_or(StoreError::DocumentNotFound(id))?;
        document.status = status;
        self.upsert_outcome(response)?;
        Ok(())
    }

    fn outcome(&self, id: DocumentId) -> Result<Option<SunatResponse>, StoreError> {
        Ok(self.responses.read().unwrap().get(&id).cloned())
    }
}

/// In-memory credential provider for tests/dev.
#[derive(Default)]
pub struct InMemoryCredentialProvider {
    certificates: RwLock<HashMap<OrganizationId, Certificate>>,
    portals: RwLock<HashMap<OrganizationId, PortalCredentials>>,
}

impl InMemoryCredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn insert_certificate(&self, organization: OrganizationId, certificate: Certificate) {
        self.certificates
            .write()
            .unwrap()
            .insert(organization, certificate);
    }

    pub fn insert_portal_credentials(
        &self,
        organization: OrganizationId,
        credentials: PortalCredentials,
    ) {
        self.portals.write().unwrap().insert(organization, credentials);
    }
}

impl CredentialProvider for InMemoryCredentialProvider {
    fn certificate(&self, organization: OrganizationId) -> Result<Certificate, StoreError> {
        self.certificates
            .read()
            .unwrap()
            .get(&organization)
            .cloned()
            .ok_or(StoreError::CredentialsNotFound(organization))
    }

    fn portal_credentials(
        &self,
        organization: OrganizationId,
    ) -> Result<PortalCredentials, StoreError> {
        self.portals
            .read()
            .unwrap()
            .get(&organization)
            .cloned()
            .ok_or(StoreError::CredentialsNotFound(organization))
    }
}
