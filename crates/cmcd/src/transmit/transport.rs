// Report transport: fire-and-forget delivery of encoded reports.

use std::sync::Arc;

use reqwest::Client;
use rustls::ClientConfig;
use rustls::crypto::aws_lc_rs;
use rustls_platform_verifier::BuilderVerifierExt;
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::CmcdError;
use crate::config::TransportConfig;

/// A fully encoded request for the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRequest {
    /// JSON batch: array body posted to the endpoint.
    Post { url: Url, body: String },
    /// Query report: data travels in the URL.
    Get { url: Url },
}

impl ReportRequest {
    pub fn url(&self) -> &Url {
        match self {
            ReportRequest::Post { url, .. } | ReportRequest::Get { url } => url,
        }
    }
}

/// Delivers report requests without blocking the caller.
///
/// Implementations must return immediately. Delivery outcome is only ever
/// logged; nothing is reported back.
pub trait ReportTransport: Send + Sync {
    fn dispatch(&self, request: ReportRequest);
}

/// Create a reqwest Client for the collector
pub fn create_client(config: &TransportConfig) -> Result<Client, CmcdError> {
    let provider = Arc::new(aws_lc_rs::default_provider());

    let tls_config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_platform_verifier()?
        .with_no_client_auth();

    let mut client_builder = Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .use_preconfigured_tls(tls_config);

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if config.use_system_proxy {
        info!("Using system proxy settings for CMCD reporting");
    } else {
        client_builder = client_builder.no_proxy();
        debug!("Proxy disabled for CMCD reporting");
    }

    client_builder.build().map_err(CmcdError::from)
}

/// Sends reports over HTTP on the tokio runtime it was created in.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    runtime: Handle,
}

impl HttpTransport {
    /// Must be called from within a tokio runtime.
    pub fn new(client: Client) -> Result<Self, CmcdError> {
        let runtime =
            Handle::try_current().map_err(|e| CmcdError::RuntimeUnavailable(e.to_string()))?;
        Ok(Self { client, runtime })
    }

    pub fn with_config(config: &TransportConfig) -> Result<Self, CmcdError> {
        Self::new(create_client(config)?)
    }

    /// Sends one request and waits for the collector's answer.
    ///
    /// A non-2xx status is returned as [`CmcdError::StatusCode`].
    pub async fn deliver(&self, request: ReportRequest) -> Result<(), CmcdError> {
        let response = match request {
            ReportRequest::Post { url, body } => {
                self.client
                    .post(url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
                    .await?
            }
            ReportRequest::Get { url } => self.client.get(url).send().await?,
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CmcdError::StatusCode(status))
        }
    }
}

impl ReportTransport for HttpTransport {
    fn dispatch(&self, request: ReportRequest) {
        let transport = self.clone();
        self.runtime.spawn(async move {
            let url = request.url().clone();
            match transport.deliver(request).await {
                Ok(()) => debug!(url = %url, "CMCD report delivered"),
                Err(CmcdError::StatusCode(status)) => {
                    warn!(url = %url, %status, "Collector rejected CMCD report")
                }
                Err(e) => error!(url = %url, error = %e, "Failed to send CMCD report"),
            }
        });
    }
}
