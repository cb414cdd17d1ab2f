//! Authority web-service client.

use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::envelope;
use crate::{EndpointFamily, PortalCredentials, TransportError};

/// One submission exchange, ready to go on the wire.
#[derive(Debug)]
pub struct SubmissionRequest {
    /// Attachment file stem (`{ruc}-{type}-{series}-{number}`).
    pub file_stem: String,
    /// Signed document, already zipped by [`envelope::package`].
    pub zip: Vec<u8>,
    pub credentials: PortalCredentials,
    pub family: EndpointFamily,
}

/// Raw response payload as received from the authority. Interpretation is
/// the response module's job.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub body: String,
}

/// Seam between the submission job and the wire.
///
/// The production implementation is [`SoapClient`]; tests substitute stubs.
pub trait BillService: Send + Sync {
    /// Perform a single network exchange. Errors are transport failures
    /// only; a well-formed response carrying a rejection is an `Ok`.
    fn send_bill(&self, request: &SubmissionRequest) -> Result<RawResponse, TransportError>;
}

/// Blocking SOAP client against the configured authority endpoints.
pub struct SoapClient {
    http: reqwest::blocking::Client,
    config: TransportConfig,
}

impl SoapClient {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn map_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.config.timeout)
        } else {
            TransportError::Connect(error.to_string())
        }
    }
}

impl BillService for SoapClient {
    fn send_bill(&self, request: &SubmissionRequest) -> Result<RawResponse, TransportError> {
        let endpoint = self.config.endpoint(request.family);
        let file_name = format!("{}.zip", request.file_stem);
        let body = envelope::send_bill_envelope(&request.credentials, &file_name, &request.zip);

        debug!(endpoint, file_name, "sending sendBill request");

        let response = self
            .http
            .post(endpoint)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "")
            .body(body)
            .send()
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http(status.as_u16()));
        }

        let body = response
            .text()
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;

        info!(endpoint, file_name, bytes = body.len(), "sendBill exchange completed");
        Ok(RawResponse { body })
    }
}
