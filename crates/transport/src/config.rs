//! Transport configuration.

use std::time::Duration;

use crate::EndpointFamily;

/// Endpoint URLs and request timeout. Externally configured values; the
/// defaults point at the authority's beta (homologation) environment.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Endpoint for invoice-family documents.
    pub bill_endpoint: String,
    /// Endpoint for retention-family documents.
    pub retention_endpoint: String,
    /// Bound on the whole request/response exchange so a hung remote
    /// endpoint cannot starve the worker pool.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            bill_endpoint: "https://e-beta.sunat.gob.pe/ol-ti-itcpfegem-beta/billService"
                .to_string(),
            retention_endpoint:
                "https://e-beta.sunat.gob.pe/ol-ti-itemision-otroscpe-gem-beta/billService"
                    .to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn with_bill_endpoint(mut self, url: impl Into<String>) -> Self {
        self.bill_endpoint = url.into();
        self
    }

    pub fn with_retention_endpoint(mut self, url: impl Into<String>) -> Self {
        self.retention_endpoint = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self, family: EndpointFamily) -> &str {
        match family {
            EndpointFamily::Billing => &self.bill_endpoint,
            EndpointFamily::Retention => &self.retention_endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_selection_follows_family() {
        let config = TransportConfig::default()
            .with_bill_endpoint("https://bill.example")
            .with_retention_endpoint("https://retention.example");
        assert_eq!(config.endpoint(EndpointFamily::Billing), "https://bill.example");
        assert_eq!(
            config.endpoint(EndpointFamily::Retention),
            "https://retention.example"
        );
    }
}
